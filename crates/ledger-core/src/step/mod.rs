//! Contrato de steps del pipeline.

pub mod definition;
pub mod run_result;
pub mod status;

pub use definition::{Step, StepKind};
pub use run_result::StepRunResult;
pub use status::StepStatus;
