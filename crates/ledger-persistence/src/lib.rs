//! ledger-persistence
//!
//! Implementación Postgres (Diesel + r2d2) del `RelationalStore` de
//! `ledger-core`. Las tablas se crean desde muestras de registros; no hay
//! migraciones: el esquema de cada dataset solo crece por columnas nuevas.
//!
//! Módulos:
//! - `pg`: pool, proveedor de conexiones y `PgStore`.
//! - `config`: carga de configuración desde variables de entorno / `.env`.
//! - `error`: mapeo de errores Diesel a variantes semánticas.

pub mod config;
pub mod error;
pub mod pg;

pub use config::{init_dotenv, ConfigError, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_config, ConnectionProvider, PgPool, PgStore, PoolProvider};
