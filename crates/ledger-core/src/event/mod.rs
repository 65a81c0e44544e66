//! Eventos de una corrida (append-only).

pub mod log;
pub mod types;

pub use log::RunLog;
pub use types::{RunEvent, RunEventKind};
