use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::event::RunEvent;
use crate::logging::IssueSummary;
use crate::model::Context;
use crate::step::StepStatus;

/// Estado del `Controller`.
///
/// `Ready` -> `Running` -> `Completed` | `Failed`. No hay vuelta atrás: un
/// controller terminado no puede volver a ejecutarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    Ready,
    Running,
    Completed,
    Failed,
}

/// Resultado resumido de la corrida, traducible a código de salida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitStatus {
    /// Sin warnings ni errores.
    Clean,
    /// Completó con warnings (datos degradados).
    Degraded,
    /// Hubo errores o un step falló.
    Failed,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Failed => 1,
            ExitStatus::Degraded => 2,
        }
    }
}

/// Reporte entregado al caller al final de `Controller::run`.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: FlowState,
    pub context: Context,
    pub issues: IssueSummary,
    pub events: Vec<RunEvent>,
    /// Estado final de cada step, en orden de ejecución.
    pub steps: Vec<(String, StepStatus)>,
    /// Error del step que abortó la corrida (solo si `state == Failed`).
    pub failure: Option<PipelineError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn exit_status(&self) -> ExitStatus {
        if self.failure.is_some() {
            return ExitStatus::Failed;
        }
        self.issues.exit_status()
    }

    pub fn is_completed(&self) -> bool { self.state == FlowState::Completed }

    pub fn step_status(&self, step_id: &str) -> Option<StepStatus> {
        self.steps.iter().find(|(id, _)| id == step_id).map(|(_, s)| *s)
    }

    /// Contexto final o el error que abortó la corrida.
    pub fn into_result(self) -> Result<Context, PipelineError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.context),
        }
    }
}
