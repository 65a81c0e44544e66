use chrono::Utc;
use uuid::Uuid;

use super::types::{RunEvent, RunEventKind};

/// Log en memoria de los eventos de una corrida.
#[derive(Debug, Clone)]
pub struct RunLog {
    run_id: Uuid,
    events: Vec<RunEvent>,
}

impl RunLog {
    pub fn new(run_id: Uuid) -> Self { Self { run_id, events: Vec::new() } }

    /// Agrega un evento asignando `seq` y timestamp.
    pub fn append_kind(&mut self, kind: RunEventKind) -> &RunEvent {
        let seq = self.events.len() as u64;
        self.events.push(RunEvent { seq, run_id: self.run_id, kind, ts: Utc::now() });
        &self.events[self.events.len() - 1]
    }

    pub fn run_id(&self) -> Uuid { self.run_id }

    pub fn events(&self) -> &[RunEvent] { &self.events }

    pub fn into_events(self) -> Vec<RunEvent> { self.events }

    /// Ids de los steps iniciados, en orden.
    pub fn started_steps(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match &e.kind {
                RunEventKind::StepStarted { step_id, .. } => Some(step_id.as_str()),
                _ => None,
            })
            .collect()
    }
}
