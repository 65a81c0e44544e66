use crate::errors::StepError;

/// Resultado abstracto de ejecutar un step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRunResult {
    /// `outputs`: claves del contexto escritas por el step.
    Success { outputs: Vec<String> },
    Failure { error: StepError },
}

impl StepRunResult {
    /// Éxito sin claves nuevas (steps de store y checkpoint).
    pub fn done() -> Self { StepRunResult::Success { outputs: Vec::new() } }

    pub fn wrote(key: impl Into<String>) -> Self { StepRunResult::Success { outputs: vec![key.into()] } }

    pub fn is_success(&self) -> bool { matches!(self, StepRunResult::Success { .. }) }
}

impl From<Result<Vec<String>, StepError>> for StepRunResult {
    fn from(r: Result<Vec<String>, StepError>) -> Self {
        match r {
            Ok(outputs) => StepRunResult::Success { outputs },
            Err(error) => StepRunResult::Failure { error },
        }
    }
}
