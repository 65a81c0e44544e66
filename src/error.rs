use ledger_core::{PipelineError, StoreError};
use ledger_persistence::{ConfigError, PersistenceError};
use ledger_remote::RemoteError;
use thiserror::Error;

/// Errores de arranque de la aplicación (antes o fuera de la corrida).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database config: {0}")]
    Database(#[from] ConfigError),
    #[error("remote source: {0}")]
    Remote(#[from] RemoteError),
    #[error("store: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("profile: {0}")]
    Profile(#[from] StoreError),
    #[error("report encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}
