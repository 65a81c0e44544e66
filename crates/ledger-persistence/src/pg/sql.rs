//! Construcción de sentencias SQL dinámicas.
//!
//! Las tablas de datasets no tienen esquema Diesel declarado (se crean desde
//! muestras), así que las sentencias se arman como texto con identificadores
//! citados y todos los valores viajan como parámetros `Nullable<Text>` con
//! cast explícito al tipo de la columna destino.

use ledger_core::ColumnDef;
use serde_json::Value;

/// Límite de parámetros por sentencia del protocolo de Postgres.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Filas por sentencia `INSERT` por defecto.
pub const DEFAULT_CHUNK_ROWS: usize = 1_000;

/// Cita un identificador (`"nombre"`), duplicando comillas internas.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

pub fn create_table_sql(table: &str, columns: &[ColumnDef]) -> String {
    let defs: Vec<String> = columns.iter()
                                   .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_type()))
                                   .collect();
    format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
}

pub fn primary_key_sql(table: &str, key_field: &str) -> String {
    format!("ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            quote_ident(table),
            quote_ident(&format!("{table}_pkey")),
            quote_ident(key_field))
}

pub fn drop_table_sql(table: &str) -> String { format!("DROP TABLE IF EXISTS {}", quote_ident(table)) }

pub fn add_column_sql(table: &str, column: &ColumnDef) -> String {
    format!("ALTER TABLE {} ADD COLUMN {} {}",
            quote_ident(table),
            quote_ident(&column.name),
            column.column_type.sql_type())
}

pub fn select_keys_sql(table: &str, key_field: &str) -> String {
    format!("SELECT {}::text AS key FROM {}", quote_ident(key_field), quote_ident(table))
}

/// Tablas del schema actual.
pub fn list_tables_sql() -> &'static str {
    "SELECT tablename::text AS name FROM pg_tables WHERE schemaname = current_schema() ORDER BY tablename"
}

/// Filas como JSON textual, en orden físico, con `LIMIT` opcional.
pub fn select_rows_sql(table: &str, limit: Option<usize>) -> String {
    let base = format!("SELECT row_to_json(t)::text AS data FROM {} t", quote_ident(table));
    match limit {
        Some(n) => format!("{base} LIMIT {n}"),
        None => base,
    }
}

/// `INSERT` multi-fila con placeholders `$n::<tipo>`.
///
/// `columns` son pares (nombre, tipo Postgres tal como lo reporta
/// `format_type`).
pub fn insert_sql(table: &str, columns: &[(String, String)], rows: usize) -> String {
    let names: Vec<String> = columns.iter().map(|(n, _)| quote_ident(n)).collect();
    let mut tuples = Vec::with_capacity(rows);
    let mut param = 1usize;
    for _ in 0..rows {
        let mut slots = Vec::with_capacity(columns.len());
        for (_, data_type) in columns {
            slots.push(format!("${param}::{data_type}"));
            param += 1;
        }
        tuples.push(format!("({})", slots.join(", ")));
    }
    format!("INSERT INTO {} ({}) VALUES {}", quote_ident(table), names.join(", "), tuples.join(", "))
}

/// Filas por sentencia respetando el límite de parámetros.
pub fn rows_per_chunk(columns: usize, preferred: usize) -> usize {
    if columns == 0 {
        return preferred.max(1);
    }
    (MAX_BIND_PARAMS / columns).min(preferred).max(1)
}

/// Representación textual de un valor JSON para bind; `None` es `NULL`.
pub fn bind_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    }
}
