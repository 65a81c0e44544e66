//! ledger-adapters: steps concretos del pipeline ETL.
//!
//! - `steps::extract`: extracción simple y multi-compañía (fan-out).
//! - `steps::transform`: filtro por exclusión, eliminación y concatenación
//!   de columnas, left join entre colecciones.
//! - `steps::store`: persistencia incremental o por modo.
//! - `steps::check`: verificación de conectividad del almacén.

pub mod steps;

pub use steps::{CheckConnectionStep, ConcatColumnsStep, DropColumnsStep, ExtractCollectionStep, ExtractMultiCompanyStep,
                FilterStep, MergeLeftStep, StoreStep};
