//! Perfil por columna de una tabla persistida.
//!
//! Métricas por columna sobre las filas leídas: conteos, porcentaje de
//! nulos y de ceros, unicidad, moda y estadísticos descriptivos para
//! columnas numéricas. Los porcentajes son fracciones en `[0, 1]` y quedan
//! en `None` cuando la tabla no tiene filas.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::model::Record;
use crate::store::{infer_schema, ColumnType, RelationalStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    pub data_type: ColumnType,
    pub row_count: usize,
    pub unique_values: usize,
    pub pct_unique: Option<f64>,
    pub pct_nulls: Option<f64>,
    /// Solo columnas numéricas.
    pub pct_zeros: Option<f64>,
    /// `true` si cada fila tiene un valor distinto y no nulo.
    pub is_unique: bool,
    pub most_common_value: Option<Value>,
    pub freq_most_common: Option<f64>,
    pub mean: Option<f64>,
    /// Desviación estándar poblacional.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub table: String,
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

fn ratio(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(part as f64 / total as f64)
    }
}

/// Perfila `rows`. Las columnas son la unión de campos en orden de primera
/// aparición; un campo ausente en una fila cuenta como nulo. La moda en
/// caso de empate es el valor que aparece primero.
pub fn profile_records(rows: &[Record]) -> Vec<ColumnProfile> {
    let row_count = rows.len();
    infer_schema(rows).into_iter()
                      .map(|def| {
                          let values: Vec<&Value> =
                              rows.iter().filter_map(|r| r.get(&def.name)).filter(|v| !v.is_null()).collect();
                          profile_column(def.name, def.column_type, row_count, &values)
                      })
                      .collect()
}

fn profile_column(column: String, data_type: ColumnType, row_count: usize, values: &[&Value]) -> ColumnProfile {
    // conteo por representación canónica, en orden de primera aparición
    let mut counts: IndexMap<String, (usize, &Value)> = IndexMap::new();
    for &v in values {
        counts.entry(v.to_string()).or_insert((0, v)).0 += 1;
    }
    let unique_values = counts.len();
    let mode = counts.values().fold(None::<(usize, &Value)>, |best, &(n, v)| match best {
                                      Some((m, _)) if m >= n => best,
                                      _ => Some((n, v)),
                                  });

    let numeric = matches!(data_type, ColumnType::BigInt | ColumnType::Double);
    let numbers: Vec<f64> = if numeric { values.iter().filter_map(|v| v.as_f64()).collect() } else { Vec::new() };
    let (mean, std, min, max) = describe(&numbers);
    let pct_zeros = if numeric { ratio(numbers.iter().filter(|n| **n == 0.0).count(), row_count) } else { None };

    ColumnProfile { column,
                    data_type,
                    row_count,
                    unique_values,
                    pct_unique: ratio(unique_values, row_count),
                    pct_nulls: ratio(row_count - values.len(), row_count),
                    pct_zeros,
                    is_unique: row_count > 0 && unique_values == row_count,
                    most_common_value: mode.map(|(_, v)| v.clone()),
                    freq_most_common: mode.and_then(|(n, _)| ratio(n, row_count)),
                    mean,
                    std,
                    min,
                    max }
}

fn describe(numbers: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    if numbers.is_empty() {
        return (None, None, None, None);
    }
    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (Some(mean), Some(variance.sqrt()), Some(min), Some(max))
}

/// Lee `table` (hasta `sample` filas) y la perfila. Una tabla inexistente es
/// un error de configuración.
pub fn profile_table<S>(store: &S, table: &str, sample: Option<usize>) -> Result<TableProfile, StoreError>
    where S: RelationalStore + ?Sized
{
    if !store.table_exists(table)? {
        return Err(StoreError::Configuration(format!("table '{table}' not found")));
    }
    let rows = store.read_rows(table, sample)?;
    let columns = profile_records(&rows);
    info!(table, rows = rows.len(), columns = columns.len(), "perfil de tabla calculado");
    Ok(TableProfile { table: table.to_string(), row_count: rows.len(), columns })
}

/// Perfila varias tablas; sin nombres, todas las del almacén.
pub fn profile_tables<S>(store: &S, tables: &[String], sample: Option<usize>) -> Result<Vec<TableProfile>, StoreError>
    where S: RelationalStore + ?Sized
{
    let names = if tables.is_empty() { store.list_tables()? } else { tables.to_vec() };
    let mut seen: HashSet<&str> = HashSet::new();
    names.iter()
         .filter(|n| seen.insert(n.as_str()))
         .map(|n| profile_table(store, n, sample))
         .collect()
}
