//! Registros y colecciones con envelope `{"value": [...]}`.
//!
//! Un `Record` es un objeto JSON con orden de campos preservado (el orden en
//! que llegaron desde la API). Las colecciones se serializan exactamente como
//! el envelope que devuelve la fuente remota.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::ENVELOPE_KEY;

/// Registro individual: campos heterogéneos con clave string.
pub type Record = Map<String, Value>;

/// Forma no reconocida al leer una colección.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ShapeError {
    #[error("envelope field 'value' is not an array")]
    ValueNotArray,
    #[error("item #{0} of the collection is not an object")]
    ItemNotObject(usize),
    #[error("unsupported collection shape: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordCollection {
    pub value: Vec<Record>,
}

impl RecordCollection {
    pub fn new(records: Vec<Record>) -> Self { Self { value: records } }

    pub fn empty() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.value.len() }

    pub fn is_empty(&self) -> bool { self.value.is_empty() }

    pub fn records(&self) -> &[Record] { &self.value }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> { self.value.iter() }

    pub fn push(&mut self, record: Record) { self.value.push(record); }

    pub fn extend(&mut self, other: RecordCollection) { self.value.extend(other.value); }

    pub fn into_records(self) -> Vec<Record> { self.value }

    /// Representación envelope (`{"value": [...]}`).
    pub fn to_value(&self) -> Value { self.clone().into_value() }

    pub fn into_value(self) -> Value {
        let mut envelope = Map::new();
        envelope.insert(ENVELOPE_KEY.to_string(),
                        Value::Array(self.value.into_iter().map(Value::Object).collect()));
        Value::Object(envelope)
    }

    /// Interpreta un valor JSON como colección.
    ///
    /// Formas aceptadas:
    /// - `{"value": [obj, ...]}` (envelope).
    /// - `[obj, ...]`.
    /// - un objeto sin envelope: colección de un único registro.
    ///
    /// `{"value": <no-array>}` como única clave, escalares y `null` son
    /// errores de forma.
    pub fn from_value(value: &Value) -> Result<Self, ShapeError> {
        match value {
            Value::Object(map) => match map.get(ENVELOPE_KEY) {
                Some(Value::Array(items)) => records_from_items(items),
                Some(_) if map.len() == 1 => Err(ShapeError::ValueNotArray),
                _ => Ok(Self::new(vec![map.clone()])),
            },
            Value::Array(items) => records_from_items(items),
            Value::Null => Err(ShapeError::Unsupported("null")),
            Value::Bool(_) => Err(ShapeError::Unsupported("boolean")),
            Value::Number(_) => Err(ShapeError::Unsupported("number")),
            Value::String(_) => Err(ShapeError::Unsupported("string")),
        }
    }
}

fn records_from_items(items: &[Value]) -> Result<RecordCollection, ShapeError> {
    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map.clone()),
            _ => return Err(ShapeError::ItemNotObject(i)),
        }
    }
    Ok(RecordCollection::new(records))
}

impl From<Vec<Record>> for RecordCollection {
    fn from(records: Vec<Record>) -> Self { Self::new(records) }
}

impl IntoIterator for RecordCollection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter { self.value.into_iter() }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter { self.value.iter() }
}

/// Representación textual canónica de una clave.
///
/// Coincide con el `::text` de Postgres para strings, enteros, booleanos y
/// flotantes integrales (`1.0` se lee de vuelta como `1`). `null` no es una
/// clave válida.
pub fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

// i64 cubre con holgura los enteros exactos de un f64 (2^53).
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}
