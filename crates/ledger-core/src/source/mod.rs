//! Puerto hacia la fuente remota de datos.
//!
//! La fuente devuelve colecciones o una colección vacía ("sin datos"); los
//! fallos se clasifican en transitorios, de datos o de autenticación.

pub mod fixture;

use thiserror::Error;

use crate::model::RecordCollection;

pub use fixture::StaticSource;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// API inalcanzable, timeout, 5xx.
    #[error("transient source error: {0}")]
    Transient(String),
    /// Respuesta inválida o rechazada (4xx, JSON malformado).
    #[error("source data error: {0}")]
    Data(String),
    /// Credenciales rechazadas.
    #[error("source authentication error: {0}")]
    Auth(String),
}

impl SourceError {
    pub fn is_transient(&self) -> bool { matches!(self, SourceError::Transient(_)) }
}

/// Esquema de direccionamiento de un recurso remoto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// No depende de tenant (p.ej. el catálogo de compañías).
    Global,
    /// `companies({id})/<path>`
    ById,
    /// `Company('<name>')/<path>`
    ByName,
}

/// Recurso remoto: ruta relativa + direccionamiento.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    pub path: String,
    pub addressing: Addressing,
}

impl Resource {
    pub fn global(path: impl Into<String>) -> Self { Self { path: path.into(), addressing: Addressing::Global } }

    pub fn by_id(path: impl Into<String>) -> Self { Self { path: path.into(), addressing: Addressing::ById } }

    pub fn by_name(path: impl Into<String>) -> Self { Self { path: path.into(), addressing: Addressing::ByName } }
}

/// Alcance concreto de una llamada.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TenantKey {
    Global,
    Id(String),
    Name(String),
}

/// Fuente remota de colecciones.
pub trait RemoteSource {
    /// Obtiene la colección completa (todas las páginas) de `resource` para
    /// `tenant`. "Sin datos" es `Ok` con colección vacía.
    fn fetch_collection(&self, resource: &Resource, tenant: &TenantKey) -> Result<RecordCollection, SourceError>;
}
