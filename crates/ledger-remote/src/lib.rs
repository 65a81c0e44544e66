//! ledger-remote
//!
//! Cliente HTTP bloqueante de la API de la plataforma contable
//! (Business Central) que implementa el `RemoteSource` de `ledger-core`:
//! token OAuth2 client-credentials cacheado, paginación OData
//! (`@odata.nextLink`) y clasificación de errores HTTP.

pub mod client;
pub mod config;
pub mod error;
pub mod url;

pub use client::BcClient;
pub use config::SourceConfig;
pub use error::RemoteError;
