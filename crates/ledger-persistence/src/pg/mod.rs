//! Implementación Postgres (Diesel) del `RelationalStore` del core.
//!
//! - Cada operación del puerto toma una conexión del pool y la devuelve al
//!   terminar; nunca se retiene una conexión entre steps.
//! - Las escrituras (`insert`, `add_columns`) corren en una transacción
//!   `read_write`: si falla un chunk, no queda ninguna fila del lote.
//! - `create_table` con clave: si agregar la primary key falla, la tabla
//!   recién creada se elimina antes de propagar el error.
//! - Sin reintentos: los errores transitorios se propagan como
//!   `StoreError::Connection`.

pub mod sql;

use std::collections::HashSet;

use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::{Bool, Nullable, Text};
use ledger_core::{infer_schema, ColumnDef, InsertMode, Record, RelationalStore, StoreError};
use tracing::{debug, error, info, warn};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use sql::{add_column_sql, bind_text, create_table_sql, drop_table_sql, insert_sql, list_tables_sql, primary_key_sql,
          quote_ident, rows_per_chunk, select_keys_sql, select_rows_sql, DEFAULT_CHUNK_ROWS};

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

type PooledConn = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real (producción/tests de integración) o un
/// proveedor alternativo sin acoplar `PgStore` a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Obtiene una conexión lista para ejecutar consultas Diesel.
    fn connection(&self) -> Result<PooledConn, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PooledConn, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(QueryableByName, Debug)]
struct Presence {
    #[diesel(sql_type = Bool)]
    present: bool,
}

/// Columna tal como la reporta el catálogo (`format_type`).
#[derive(QueryableByName, Debug, Clone)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
}

#[derive(QueryableByName, Debug)]
struct TableRow {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Fila completa serializada por `row_to_json` (orden de columnas de la tabla).
#[derive(QueryableByName, Debug)]
struct JsonRow {
    #[diesel(sql_type = Text)]
    data: String,
}

#[derive(QueryableByName, Debug)]
struct KeyRow {
    #[diesel(sql_type = Nullable<Text>)]
    key: Option<String>,
}

const COLUMNS_SQL: &str = "SELECT a.attname::text AS name, format_type(a.atttypid, a.atttypmod) AS data_type \
                           FROM pg_attribute a \
                           WHERE a.attrelid = to_regclass($1) AND a.attnum > 0 AND NOT a.attisdropped \
                           ORDER BY a.attnum";

fn load_columns(conn: &mut PgConnection, table: &str) -> Result<Vec<ColumnRow>, PersistenceError> {
    let rows = diesel::sql_query(COLUMNS_SQL).bind::<Text, _>(quote_ident(table))
                                             .load::<ColumnRow>(conn)?;
    Ok(rows)
}

/// `RelationalStore` sobre Postgres.
pub struct PgStore<P: ConnectionProvider = PoolProvider> {
    provider: P,
    chunk_rows: usize,
}

impl PgStore<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self { Self::new(PoolProvider { pool }) }

    /// Construye el pool desde `cfg` y el store sobre él.
    pub fn from_config(cfg: &DbConfig) -> Result<Self, PersistenceError> {
        Ok(Self::from_pool(build_pool_from_config(cfg)?))
    }
}

impl<P: ConnectionProvider> PgStore<P> {
    pub fn new(provider: P) -> Self { Self { provider, chunk_rows: DEFAULT_CHUNK_ROWS } }

    /// Máximo de filas por sentencia `INSERT` (se ajusta además al límite
    /// de parámetros).
    pub fn with_chunk_rows(mut self, rows: usize) -> Self {
        self.chunk_rows = rows.max(1);
        self
    }

    fn try_check(&self) -> Result<(), PersistenceError> {
        let mut conn = self.provider.connection()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }

    fn try_table_exists(&self, table: &str) -> Result<bool, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let p: Presence = diesel::sql_query("SELECT to_regclass($1) IS NOT NULL AS present")
            .bind::<Text, _>(quote_ident(table))
            .get_result(&mut conn)?;
        Ok(p.present)
    }

    fn try_create_table(&self, table: &str, sample: &[Record], key_field: Option<&str>) -> Result<(), PersistenceError> {
        let columns = infer_schema(sample);
        if columns.is_empty() {
            return Err(PersistenceError::Configuration(format!("cannot create '{table}' from an empty sample")));
        }
        if let Some(k) = key_field {
            if !columns.iter().any(|c| c.name == k) {
                return Err(PersistenceError::Configuration(format!("key field '{k}' not present in sample for '{table}'")));
            }
        }

        let mut conn = self.provider.connection()?;
        diesel::sql_query(create_table_sql(table, &columns)).execute(&mut conn)?;
        info!(table, columns = columns.len(), "tabla creada");

        if let Some(k) = key_field {
            if let Err(e) = diesel::sql_query(primary_key_sql(table, k)).execute(&mut conn) {
                let err = PersistenceError::from(e);
                warn!(table, key_field = k, error = %err, "no se pudo agregar la primary key; se elimina la tabla");
                if let Err(drop_err) = diesel::sql_query(drop_table_sql(table)).execute(&mut conn) {
                    error!(table, error = %drop_err, "no se pudo eliminar la tabla tras fallar la primary key");
                }
                return Err(err);
            }
            debug!(table, key_field = k, "primary key agregada");
        }
        Ok(())
    }

    fn try_columns(&self, table: &str) -> Result<Vec<String>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let cols = load_columns(&mut conn, table)?;
        if cols.is_empty() {
            return Err(PersistenceError::MissingTable(table.to_string()));
        }
        Ok(cols.into_iter().map(|c| c.name).collect())
    }

    fn try_add_columns(&self, table: &str, columns: &[ColumnDef]) -> Result<(), PersistenceError> {
        if columns.is_empty() {
            return Ok(());
        }
        let mut conn = self.provider.connection()?;
        conn.build_transaction()
            .read_write()
            .run(|tx| {
                for c in columns {
                    diesel::sql_query(add_column_sql(table, c)).execute(tx)?;
                }
                Ok::<_, PersistenceError>(())
            })
    }

    fn try_existing_keys(&self, table: &str, key_field: &str) -> Result<HashSet<String>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let rows = diesel::sql_query(select_keys_sql(table, key_field)).load::<KeyRow>(&mut conn)?;
        Ok(rows.into_iter().filter_map(|r| r.key).collect())
    }

    fn try_list_tables(&self) -> Result<Vec<String>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        let rows = diesel::sql_query(list_tables_sql()).load::<TableRow>(&mut conn)?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    fn try_read_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Record>, PersistenceError> {
        let mut conn = self.provider.connection()?;
        if load_columns(&mut conn, table)?.is_empty() {
            return Err(PersistenceError::MissingTable(table.to_string()));
        }
        let rows = diesel::sql_query(select_rows_sql(table, limit)).load::<JsonRow>(&mut conn)?;
        debug!(table, rows = rows.len(), "filas leídas");
        rows.into_iter()
            .map(|r| {
                serde_json::from_str::<Record>(&r.data)
                    .map_err(|e| PersistenceError::Unknown(format!("row of '{table}' is not a JSON object: {e}")))
            })
            .collect()
    }

    fn try_insert(&self, table: &str, records: &[Record], mode: InsertMode) -> Result<usize, PersistenceError> {
        if records.is_empty() && mode != InsertMode::Replace {
            return Ok(0);
        }
        let mut conn = self.provider.connection()?;
        let table_columns = load_columns(&mut conn, table)?;
        if table_columns.is_empty() {
            return Err(PersistenceError::MissingTable(table.to_string()));
        }

        let present: HashSet<&str> = records.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
        let known: HashSet<&str> = table_columns.iter().map(|c| c.name.as_str()).collect();
        if let Some(unknown) = present.iter().find(|f| !known.contains(*f)) {
            return Err(PersistenceError::Unknown(format!("column \"{unknown}\" of relation \"{table}\" does not exist")));
        }
        // columnas del lote, en el orden de la tabla
        let columns: Vec<(String, String)> = table_columns.into_iter()
                                                          .filter(|c| present.contains(c.name.as_str()))
                                                          .map(|c| (c.name, c.data_type))
                                                          .collect();
        if columns.is_empty() && !records.is_empty() {
            return Err(PersistenceError::Configuration(format!("records for '{table}' carry no fields")));
        }
        let per_chunk = rows_per_chunk(columns.len(), self.chunk_rows);

        conn.build_transaction()
            .read_write()
            .run(|tx| {
                match mode {
                    InsertMode::Append => {}
                    InsertMode::Replace => {
                        let deleted = diesel::sql_query(format!("DELETE FROM {}", quote_ident(table))).execute(tx)?;
                        debug!(table, deleted, "filas previas eliminadas (replace)");
                    }
                    InsertMode::FailIfExists => {
                        let p: Presence =
                            diesel::sql_query(format!("SELECT EXISTS (SELECT 1 FROM {}) AS present", quote_ident(table)))
                                .get_result(tx)?;
                        if p.present {
                            return Err(PersistenceError::TableNotEmpty(table.to_string()));
                        }
                    }
                }

                let mut inserted = 0usize;
                for chunk in records.chunks(per_chunk) {
                    let mut query = diesel::sql_query(insert_sql(table, &columns, chunk.len())).into_boxed::<Pg>();
                    for record in chunk {
                        for (name, _) in &columns {
                            query = query.bind::<Nullable<Text>, _>(bind_text(record.get(name)));
                        }
                    }
                    inserted += query.execute(tx)?;
                }
                Ok(inserted)
            })
    }
}

impl<P: ConnectionProvider> RelationalStore for PgStore<P> {
    fn check_connectivity(&self) -> Result<(), StoreError> { Ok(self.try_check()?) }

    fn table_exists(&self, table: &str) -> Result<bool, StoreError> { Ok(self.try_table_exists(table)?) }

    fn create_table(&self, table: &str, sample: &[Record], key_field: Option<&str>) -> Result<(), StoreError> {
        Ok(self.try_create_table(table, sample, key_field)?)
    }

    fn columns(&self, table: &str) -> Result<Vec<String>, StoreError> { Ok(self.try_columns(table)?) }

    fn add_columns(&self, table: &str, columns: &[ColumnDef]) -> Result<(), StoreError> {
        Ok(self.try_add_columns(table, columns)?)
    }

    fn existing_keys(&self, table: &str, key_field: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self.try_existing_keys(table, key_field)?)
    }

    fn insert(&self, table: &str, records: &[Record], mode: InsertMode) -> Result<usize, StoreError> {
        Ok(self.try_insert(table, records, mode)?)
    }

    fn list_tables(&self) -> Result<Vec<String>, StoreError> { Ok(self.try_list_tables()?) }

    fn read_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Record>, StoreError> {
        Ok(self.try_read_rows(table, limit)?)
    }
}

/// Construye un pool r2d2.
///
/// - `min_size`/`max_size` en 0 se elevan a 1; si `min > max` se usa `max`.
/// - `build` establece las conexiones mínimas: una base inalcanzable falla
///   aquí como `TransientIo`.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    build_pool_with_timeout(database_url, min_size, max_size, std::time::Duration::from_secs(30))
}

pub fn build_pool_from_config(cfg: &DbConfig) -> Result<PgPool, PersistenceError> {
    build_pool_with_timeout(&cfg.url, cfg.min_connections, cfg.max_connections, cfg.connect_timeout)
}

fn build_pool_with_timeout(database_url: &str,
                           min_size: u32,
                           max_size: u32,
                           timeout: std::time::Duration)
                           -> Result<PgPool, PersistenceError> {
    let validated_min = if min_size == 0 { 1 } else { min_size };
    let validated_max = if max_size == 0 { 1 } else { max_size };
    if validated_min > validated_max {
        warn!("min_size > max_size ({} > {}), ajustando min=max", validated_min, validated_max);
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder().min_idle(Some(final_min))
                         .max_size(validated_max)
                         .connection_timeout(timeout)
                         .build(manager)
                         .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))
}
