//! ledgerflow
//!
//! Binario y librería de ensamblado del ETL multi-compañía:
//! - `config`: configuración de la aplicación (`.env` / variables de entorno).
//! - `pipeline`: catálogo de datasets y armado de la secuencia de steps.
//! - `error`: errores de arranque.
//!
//! La ejecución en sí vive en `ledger-core` (`Controller`); los adaptadores
//! concretos en `ledger-persistence` (Postgres) y `ledger-remote` (API).

pub mod config;
pub mod error;
pub mod pipeline;

use std::rc::Rc;

use ledger_core::{profile_tables, Context, Controller, IssueCounter, RelationalStore, RemoteSource, RunReport};

pub use config::{AppConfig, PipelineSettings};
pub use error::AppError;
pub use pipeline::{build_pipeline, DatasetSpec, DATASETS};

/// Arma el pipeline por defecto y lo ejecuta una vez.
///
/// `counter` debe ser el mismo cuyo layer está registrado en el subscriber
/// activo para que el `ExitStatus` refleje los warnings y errores.
pub fn execute(settings: &PipelineSettings,
               source: Rc<dyn RemoteSource>,
               store: Rc<dyn RelationalStore>,
               only: &[String],
               counter: &IssueCounter)
               -> Result<RunReport, AppError> {
    let steps = build_pipeline(settings, source, store, only)?;
    let mut controller = Controller::builder().steps(steps).issue_counter(counter.clone()).build()?;
    Ok(controller.run(Context::new())?)
}

/// Perfila las tablas pedidas (todas si `tables` está vacío) y devuelve el
/// resultado como JSON indentado.
pub fn profile_report(store: &dyn RelationalStore, tables: &[String], sample: Option<usize>) -> Result<String, AppError> {
    let profiles = profile_tables(store, tables, sample)?;
    Ok(serde_json::to_string_pretty(&profiles)?)
}
