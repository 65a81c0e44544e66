//! Errores del motor y de los steps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::FlowState;
use crate::source::SourceError;
use crate::step::StepKind;
use crate::store::StoreError;

/// Error terminal de un step. La variante es la clasificación que ve el
/// usuario al final de la corrida.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StepError {
    #[error("connection error: {0}")] Connection(String),
    #[error("data integrity error: {0}")] DataIntegrity(String),
    #[error("configuration error: {0}")] Configuration(String),
    #[error("internal: {0}")] Internal(String),
}

impl StepError {
    /// Etiqueta corta estable (logs y eventos).
    pub fn class(&self) -> &'static str {
        match self {
            StepError::Connection(_) => "connection",
            StepError::DataIntegrity(_) => "data_integrity",
            StepError::Configuration(_) => "configuration",
            StepError::Internal(_) => "internal",
        }
    }
}

impl From<SourceError> for StepError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Transient(m) => StepError::Connection(m),
            SourceError::Data(m) => StepError::DataIntegrity(m),
            SourceError::Auth(m) => StepError::Configuration(format!("authentication: {m}")),
        }
    }
}

impl From<StoreError> for StepError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(m) => StepError::Connection(m),
            StoreError::DataIntegrity(m) => StepError::DataIntegrity(m),
            StoreError::Configuration(m) => StepError::Configuration(m),
            StoreError::Query(m) => StepError::Internal(format!("query: {m}")),
        }
    }
}

/// Errores del `Controller`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PipelineError {
    #[error("pipeline has no steps")]
    EmptyPipeline,
    #[error("controller is not ready (state {0:?})")]
    InvalidState(FlowState),
    #[error("step #{step_index} '{step_id}' ({kind:?}) failed: {source}")]
    StepFailed {
        step_index: usize,
        step_id: String,
        kind: StepKind,
        source: StepError,
    },
}

impl PipelineError {
    /// Error de step subyacente, si lo hay.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            PipelineError::StepFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
