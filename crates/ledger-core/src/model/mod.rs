//! Modelos neutrales (Context, Record, RecordCollection, Tenant)

pub mod context;
pub mod record;
pub mod tenant;

pub use context::Context;
pub use record::{key_text, Record, RecordCollection, ShapeError};
pub use tenant::Tenant;
