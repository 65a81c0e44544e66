//! Controller del pipeline
//!
//! Ejecuta una lista ordenada de steps sobre un `Context` compartido,
//! registra eventos de la corrida y resume warnings/errores en un
//! `RunReport`.

pub mod builder;
pub mod core;
pub mod report;

pub use builder::ControllerBuilder;
pub use core::Controller;
pub use report::{ExitStatus, FlowState, RunReport};
