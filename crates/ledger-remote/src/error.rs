//! Errores del cliente y clasificación de respuestas HTTP.

use ledger_core::SourceError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errores de construcción/configuración del cliente.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("missing environment variable {0}")]
    MissingConfig(&'static str),
    #[error("invalid value for {var}: {value}")]
    InvalidConfig { var: &'static str, value: String },
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Resultado de clasificar un status HTTP no exitoso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusClass {
    /// 404: el recurso no existe para ese tenant; se trata como "sin datos".
    NoData,
    /// 401: reintentar una vez con token nuevo.
    Unauthorized,
    Failure(SourceError),
}

pub fn classify_status(status: StatusCode, body: &str) -> StatusClass {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, 300));
    match status {
        StatusCode::NOT_FOUND => StatusClass::NoData,
        StatusCode::UNAUTHORIZED => StatusClass::Unauthorized,
        StatusCode::FORBIDDEN => StatusClass::Failure(SourceError::Auth(detail)),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => StatusClass::Failure(SourceError::Transient(detail)),
        s if s.is_server_error() => StatusClass::Failure(SourceError::Transient(detail)),
        _ => StatusClass::Failure(SourceError::Data(detail)),
    }
}

/// Errores de transporte (conexión, timeout) son transitorios; fallos al
/// decodificar el cuerpo son de datos.
pub fn transport_error(err: &reqwest::Error) -> SourceError {
    if err.is_decode() {
        SourceError::Data(format!("decode: {err}"))
    } else {
        SourceError::Transient(format!("transport: {err}"))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
