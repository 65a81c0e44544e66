//! Tipos de evento y estructura `RunEvent`.
//!
//! El `Controller` emite un evento por transición observable. El orden de
//! `seq` es el orden real de ejecución; tras un `StepFailed` no aparece ningún
//! `StepStarted` posterior.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de toda corrida.
    RunStarted { step_count: usize },
    StepStarted { step_index: usize, step_id: String },
    /// `outputs`: claves del contexto escritas por el step.
    StepFinished { step_index: usize, step_id: String, outputs: Vec<String> },
    StepFailed { step_index: usize, step_id: String, error_class: String, message: String },
    /// Todos los steps corrieron; los contadores pueden ser no nulos.
    RunCompleted { errors: usize, warnings: usize },
    RunFailed { step_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64,
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>,
}
