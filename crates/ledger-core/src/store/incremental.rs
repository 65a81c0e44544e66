//! Escritura incremental por clave y escritura completa por modo.
//!
//! Ambos caminos crean la tabla desde la muestra si no existe y, si existe,
//! agregan primero las columnas nuevas del lote. Columnas existentes nunca
//! se eliminan ni cambian de tipo.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::schema::{infer_schema, ColumnDef};
use super::{InsertMode, InsertReport, RelationalStore, StoreError};
use crate::model::{key_text, Record};

/// Agrega a `table` las columnas de `records` que todavía no existen.
/// Retorna las columnas agregadas.
pub fn ensure_columns<S>(store: &S, table: &str, records: &[Record]) -> Result<Vec<ColumnDef>, StoreError>
    where S: RelationalStore + ?Sized
{
    let existing: HashSet<String> = store.columns(table)?.into_iter().collect();
    let missing: Vec<ColumnDef> = infer_schema(records).into_iter()
                                                       .filter(|c| !existing.contains(&c.name))
                                                       .collect();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|c| c.name.as_str()).collect();
        info!(table, columns = ?names, "ampliando esquema con columnas nuevas");
        store.add_columns(table, &missing)?;
    }
    Ok(missing)
}

/// Inserta en `table` solo los registros cuya `key_field` no existe aún.
///
/// - Lote vacío: no-op.
/// - Tabla ausente: se crea con `key_field` como primary key.
/// - Registros con clave nula/ausente se descartan con warning.
/// - Claves repetidas dentro del lote: se conserva la primera.
pub fn incremental_insert<S>(store: &S, table: &str, records: &[Record], key_field: &str) -> Result<InsertReport, StoreError>
    where S: RelationalStore + ?Sized
{
    let mut report = InsertReport::default();
    if records.is_empty() {
        info!(table, "lote vacío; nada que insertar");
        return Ok(report);
    }

    let existing = if store.table_exists(table)? {
        ensure_columns(store, table, records)?;
        let keys = store.existing_keys(table, key_field)?;
        debug!(table, existing = keys.len(), "claves existentes leídas");
        keys
    } else {
        info!(table, key_field, "tabla no existe; se crea desde la muestra");
        store.create_table(table, records, Some(key_field))?;
        report.created_table = true;
        HashSet::new()
    };

    let pending = select_new(records, key_field, &existing, &mut report);
    if report.skipped_null_key > 0 {
        warn!(table, key_field, count = report.skipped_null_key, "registros con clave nula descartados");
    }
    if report.skipped_duplicates > 0 {
        warn!(table, key_field, count = report.skipped_duplicates, "claves duplicadas en el lote; se conserva la primera");
    }

    if pending.is_empty() {
        info!(table, skipped_existing = report.skipped_existing, "no hay registros nuevos");
        return Ok(report);
    }
    report.inserted = store.insert(table, &pending, InsertMode::Append)?;
    info!(table,
          inserted = report.inserted,
          skipped_existing = report.skipped_existing,
          "inserción incremental completada");
    Ok(report)
}

fn select_new(records: &[Record], key_field: &str, existing: &HashSet<String>, report: &mut InsertReport) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending = Vec::new();
    for record in records {
        match record.get(key_field).and_then(key_text) {
            None => report.skipped_null_key += 1,
            Some(k) if existing.contains(&k) => report.skipped_existing += 1,
            Some(k) => {
                if seen.insert(k) {
                    pending.push(record.clone());
                } else {
                    report.skipped_duplicates += 1;
                }
            }
        }
    }
    pending
}

/// Escritura sin clave: crea la tabla si falta, amplía el esquema si existe
/// e inserta el lote completo según `mode`.
pub fn write_batch<S>(store: &S, table: &str, records: &[Record], mode: InsertMode) -> Result<InsertReport, StoreError>
    where S: RelationalStore + ?Sized
{
    let mut report = InsertReport::default();
    if records.is_empty() {
        info!(table, "lote vacío; nada que insertar");
        return Ok(report);
    }
    if store.table_exists(table)? {
        ensure_columns(store, table, records)?;
    } else {
        store.create_table(table, records, None)?;
        report.created_table = true;
    }
    report.inserted = store.insert(table, records, mode)?;
    info!(table, inserted = report.inserted, ?mode, "inserción completada");
    Ok(report)
}
