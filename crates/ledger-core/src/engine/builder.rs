//! Builder para `Controller`.
//!
//! ```ignore
//! let controller = Controller::builder()
//!     .step(ExtractStep::new(..))
//!     .step(StoreStep::new(..))
//!     .issue_counter(counter.clone())
//!     .build()?;
//! ```

use crate::engine::Controller;
use crate::errors::PipelineError;
use crate::logging::IssueCounter;
use crate::step::Step;

#[derive(Default)]
pub struct ControllerBuilder {
    steps: Vec<Box<dyn Step>>,
    issues: Option<IssueCounter>,
}

impl ControllerBuilder {
    pub fn new() -> Self { Self::default() }

    /// Añade un step al final de la secuencia.
    pub fn step<S: Step + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn steps<I>(mut self, steps: I) -> Self
        where I: IntoIterator<Item = Box<dyn Step>>
    {
        self.steps.extend(steps);
        self
    }

    /// Contador que debe estar registrado en el subscriber activo.
    pub fn issue_counter(mut self, counter: IssueCounter) -> Self {
        self.issues = Some(counter);
        self
    }

    /// Falla con `EmptyPipeline` si no se añadió ningún step.
    pub fn build(self) -> Result<Controller, PipelineError> {
        let controller = Controller::new(self.steps)?;
        Ok(match self.issues {
            Some(counter) => controller.with_issue_counter(counter),
            None => controller,
        })
    }
}
