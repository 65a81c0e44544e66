//! CheckConnectionStep (Checkpoint)
//!
//! Falla la corrida antes de extraer nada si el almacén no responde.

use std::rc::Rc;

use ledger_core::{Context, RelationalStore, Step, StepError, StepKind, StepRunResult};
use tracing::info;

pub struct CheckConnectionStep {
    id: String,
    store: Rc<dyn RelationalStore>,
}

impl CheckConnectionStep {
    pub fn new(id: impl Into<String>, store: Rc<dyn RelationalStore>) -> Self { Self { id: id.into(), store } }
}

impl Step for CheckConnectionStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Checkpoint }

    fn run(&self, _ctx: &mut Context) -> StepRunResult {
        match self.store.check_connectivity() {
            Ok(()) => {
                info!("conexión con el almacén verificada");
                StepRunResult::done()
            }
            Err(e) => StepRunResult::Failure { error: StepError::from(e) },
        }
    }
}
