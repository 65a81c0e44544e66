//! ledger-core: motor ETL secuencial
//!
//! Contiene el contrato de steps, el `Controller` que los ejecuta sobre un
//! `Context` compartido, el extractor multi-tenant (fan-out), las
//! transformaciones puras, el perfilado de tablas y los puertos hacia la fuente remota y el almacén
//! relacional (con el algoritmo de inserción incremental).
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod fanout;
pub mod logging;
pub mod model;
pub mod profile;
pub mod source;
pub mod step;
pub mod store;
pub mod transform;

pub use engine::{Controller, ControllerBuilder, ExitStatus, FlowState, RunReport};
pub use errors::{PipelineError, StepError};
pub use event::{RunEvent, RunEventKind, RunLog};
pub use fanout::{fan_out, FanOutReport, FanOutStep, TenantFetch};
pub use logging::{init_tracing, IssueCounter, IssueCounterLayer, IssueSummary};
pub use model::{key_text, Context, Record, RecordCollection, ShapeError, Tenant};
pub use profile::{profile_records, profile_table, profile_tables, ColumnProfile, TableProfile};
pub use source::{Addressing, RemoteSource, Resource, SourceError, StaticSource, TenantKey};
pub use step::{Step, StepKind, StepRunResult, StepStatus};
pub use store::{infer_schema, write_batch, ColumnDef, ColumnType, InMemoryStore, InsertMode, InsertReport, RelationalStore, StoreError};
