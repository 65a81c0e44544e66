//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y de ahí a la
//! taxonomía del puerto (`StoreError`).

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use ledger_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not null violation: {0}")]
    NotNullViolation(String),
    /// Valor que no se puede convertir al tipo de la columna.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("table '{0}' already contains rows")]
    TableNotEmpty(String),
    #[error("relation '{0}' does not exist")]
    MissingTable(String),
    #[error("invalid request: {0}")]
    Configuration(String),
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

// Postgres no expone SQLSTATE vía Diesel; clasificamos por texto
// (best-effort) los errores de conversión de valores.
fn is_invalid_value(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("invalid input syntax")
    || m.contains("out of range")
    || m.contains("invalid input value")
    || m.contains("value too long")
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::NotNullViolation => Self::NotNullViolation(info.message().to_string()),
                DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::UnableToSendCommand => {
                    Self::TransientIo(info.message().to_string())
                }
                _ if is_invalid_value(info.message()) => Self::InvalidValue(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::NotFound => Self::Unknown("not found".into()),
            DieselError::DeserializationError(e) => Self::Unknown(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            DieselError::RollbackErrorOnCommit { rollback_error, commit_error } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<r2d2::Error> for PersistenceError {
    fn from(err: r2d2::Error) -> Self { Self::TransientIo(format!("pool error: {err}")) }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        let message = err.to_string();
        match err {
            PersistenceError::UniqueViolation(_)
            | PersistenceError::CheckViolation(_)
            | PersistenceError::ForeignKeyViolation(_)
            | PersistenceError::NotNullViolation(_)
            | PersistenceError::InvalidValue(_)
            | PersistenceError::TableNotEmpty(_) => StoreError::DataIntegrity(message),
            PersistenceError::TransientIo(_) => StoreError::Connection(message),
            PersistenceError::Configuration(_) => StoreError::Configuration(message),
            PersistenceError::MissingTable(_) | PersistenceError::Unknown(_) => StoreError::Query(message),
        }
    }
}
