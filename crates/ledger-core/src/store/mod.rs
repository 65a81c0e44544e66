//! Puerto hacia el almacén relacional.
//!
//! El trait expone primitivas (existencia, creación desde muestra, columnas,
//! claves existentes, inserción) y la inserción incremental por clave se
//! construye sobre ellas en `incremental`, igual para todo backend.

pub mod incremental;
pub mod memory;
pub mod schema;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Record;

pub use incremental::{ensure_columns, incremental_insert, write_batch};
pub use memory::InMemoryStore;
pub use schema::{infer_schema, ColumnDef, ColumnType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Base de datos inalcanzable / pool agotado.
    #[error("store connection error: {0}")]
    Connection(String),
    /// Violación de constraint, clave duplicada, valor no convertible.
    #[error("store data integrity error: {0}")]
    DataIntegrity(String),
    /// Configuración inválida (clave ausente del esquema, muestra vacía).
    #[error("store configuration error: {0}")]
    Configuration(String),
    #[error("store query error: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool { matches!(self, StoreError::Connection(_)) }

    pub fn is_data_integrity(&self) -> bool { matches!(self, StoreError::DataIntegrity(_)) }
}

/// Política de inserción sin clave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InsertMode {
    #[default]
    Append,
    /// Borra las filas existentes e inserta el lote (misma transacción).
    Replace,
    /// Falla si la tabla ya tiene filas.
    FailIfExists,
}

/// Conteos de una escritura.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReport {
    pub created_table: bool,
    pub inserted: usize,
    pub skipped_existing: usize,
    pub skipped_null_key: usize,
    pub skipped_duplicates: usize,
}

/// Almacén relacional.
///
/// Cada operación es una unidad de trabajo independiente: las
/// implementaciones no retienen conexiones entre llamadas.
pub trait RelationalStore {
    /// Sonda trivial (p.ej. `SELECT 1`).
    fn check_connectivity(&self) -> Result<(), StoreError>;

    fn table_exists(&self, table: &str) -> Result<bool, StoreError>;

    /// Crea `table` con el esquema inferido de `sample`. Con `key_field`
    /// agrega una constraint de unicidad (primary key); si esa constraint
    /// falla la tabla recién creada se elimina antes de retornar el error.
    fn create_table(&self, table: &str, sample: &[Record], key_field: Option<&str>) -> Result<(), StoreError>;

    /// Nombres de columnas en orden de definición.
    fn columns(&self, table: &str) -> Result<Vec<String>, StoreError>;

    fn add_columns(&self, table: &str, columns: &[ColumnDef]) -> Result<(), StoreError>;

    /// Valores de `key_field` presentes en la tabla, en forma textual.
    fn existing_keys(&self, table: &str, key_field: &str) -> Result<HashSet<String>, StoreError>;

    /// Inserta todos los registros según `mode`. Retorna filas insertadas.
    fn insert(&self, table: &str, records: &[Record], mode: InsertMode) -> Result<usize, StoreError>;

    /// Tablas existentes, ordenadas por nombre.
    fn list_tables(&self) -> Result<Vec<String>, StoreError>;

    /// Filas de `table` con todas sus columnas (`null` incluido), hasta
    /// `limit` si se indica.
    fn read_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Record>, StoreError>;

    /// Inserta solo los registros cuya clave no existe todavía.
    fn incremental_insert(&self, table: &str, records: &[Record], key_field: &str) -> Result<InsertReport, StoreError> {
        incremental_insert(self, table, records, key_field)
    }
}
