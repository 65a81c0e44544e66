//! Inferencia de esquema a partir de registros.
//!
//! Columnas = unión de los campos de la muestra en orden de primera
//! aparición. El tipo sale de los valores no nulos del campo; tipos
//! escalares en conflicto se ensanchan a `Text` (o `Json` si alguno es
//! objeto/arreglo). Un campo solo con `null` queda como `Text`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    BigInt,
    Double,
    Text,
    Json,
}

impl ColumnType {
    /// Tipo SQL (Postgres) equivalente.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::Json => "JSONB",
        }
    }

    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Number(n) if n.is_i64() => Some(ColumnType::BigInt),
            Value::Number(_) => Some(ColumnType::Double),
            Value::String(_) => Some(ColumnType::Text),
            Value::Array(_) | Value::Object(_) => Some(ColumnType::Json),
        }
    }

    fn widen(self, other: Self) -> Self {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (BigInt, Double) | (Double, BigInt) => Double,
            (Json, _) | (_, Json) => Json,
            _ => Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self { name: name.into(), column_type }
    }
}

pub fn infer_schema(records: &[Record]) -> Vec<ColumnDef> {
    let mut columns: IndexMap<&str, Option<ColumnType>> = IndexMap::new();
    for record in records {
        for (field, value) in record {
            let seen = columns.entry(field.as_str()).or_insert(None);
            *seen = match (*seen, ColumnType::of(value)) {
                (Some(a), Some(b)) => Some(a.widen(b)),
                (a, b) => a.or(b),
            };
        }
    }
    columns.into_iter()
           .map(|(name, t)| ColumnDef::new(name, t.unwrap_or(ColumnType::Text)))
           .collect()
}
