use serde::{Deserialize, Serialize};

/// Estado de un Step dentro de una corrida.
///
/// Transiciones válidas:
/// - `Pending` -> `Running`
/// - `Running` -> `FinishedOk`
/// - `Running` -> `Failed`
/// - `Pending` -> `Skipped` (un step anterior falló)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Running,
    FinishedOk,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::FinishedOk | StepStatus::Failed | StepStatus::Skipped)
    }
}
