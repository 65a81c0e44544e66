//! StoreStep (Store)
//!
//! Persiste la colección bajo `input_key` en `table`. Con `key_field` usa la
//! inserción incremental (solo claves nuevas); sin clave inserta el lote
//! completo según `InsertMode`. No escribe claves en el contexto.

use std::rc::Rc;

use ledger_core::store::write_batch;
use ledger_core::{Context, InsertMode, InsertReport, RelationalStore, Step, StepError, StepKind, StepRunResult,
                  StoreError};
use tracing::{info, warn};

pub struct StoreStep {
    id: String,
    store: Rc<dyn RelationalStore>,
    input_key: String,
    table: String,
    key_field: Option<String>,
    mode: InsertMode,
}

impl StoreStep {
    /// Escritura incremental por `key_field`.
    pub fn incremental(id: impl Into<String>,
                       store: Rc<dyn RelationalStore>,
                       input_key: impl Into<String>,
                       table: impl Into<String>,
                       key_field: impl Into<String>)
                       -> Self {
        Self { id: id.into(),
               store,
               input_key: input_key.into(),
               table: table.into(),
               key_field: Some(key_field.into()),
               mode: InsertMode::Append }
    }

    /// Escritura sin clave según `mode`.
    pub fn with_mode(id: impl Into<String>,
                     store: Rc<dyn RelationalStore>,
                     input_key: impl Into<String>,
                     table: impl Into<String>,
                     mode: InsertMode)
                     -> Self {
        Self { id: id.into(), store, input_key: input_key.into(), table: table.into(), key_field: None, mode }
    }

    pub fn table(&self) -> &str { &self.table }

    fn persist(&self, ctx: &Context) -> Result<Option<InsertReport>, StepError> {
        let collection = match ctx.collection(&self.input_key) {
            Ok(Some(c)) => c,
            Ok(None) => {
                warn!(key = %self.input_key, table = %self.table, "no hay datos en el contexto para almacenar");
                return Ok(None);
            }
            Err(e) => {
                return Err(StepError::DataIntegrity(format!("'{}' cannot be stored in '{}': {e}",
                                                            self.input_key, self.table)));
            }
        };
        if collection.is_empty() {
            info!(key = %self.input_key, table = %self.table, "colección vacía; nada que almacenar");
            return Ok(None);
        }

        let records = collection.records();
        let report: Result<InsertReport, StoreError> = match &self.key_field {
            Some(key) => self.store.incremental_insert(&self.table, records, key),
            None => write_batch(&*self.store, &self.table, records, self.mode),
        };
        Ok(Some(report?))
    }
}

impl Step for StoreStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Store }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        match self.persist(ctx) {
            Ok(Some(report)) => {
                info!(table = %self.table,
                      inserted = report.inserted,
                      skipped_existing = report.skipped_existing,
                      created_table = report.created_table,
                      "datos almacenados");
                StepRunResult::done()
            }
            Ok(None) => StepRunResult::done(),
            Err(error) => StepRunResult::Failure { error },
        }
    }
}
