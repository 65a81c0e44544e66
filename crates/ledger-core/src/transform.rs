//! Transformaciones puras sobre colecciones.
//!
//! Ninguna función toca I/O ni el contexto; los steps de
//! `ledger-adapters` leen la colección, aplican la función y escriben el
//! resultado.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use serde_json::Value;

use crate::model::{key_text, Record, RecordCollection};

/// Descarta los registros cuyo `field` pertenece a `excluded`.
///
/// Registros sin el campo (o con `null`) se conservan. Idempotente:
/// aplicar el filtro dos veces equivale a aplicarlo una.
pub fn filter_excluded(collection: &RecordCollection, field: &str, excluded: &HashSet<String>) -> RecordCollection {
    if excluded.is_empty() {
        return collection.clone();
    }
    collection.iter()
              .filter(|r| match r.get(field).and_then(key_text) {
                  Some(k) => !excluded.contains(&k),
                  None => true,
              })
              .cloned()
              .collect::<Vec<_>>()
              .into()
}

/// Elimina `columns` de cada registro. Columnas inexistentes se ignoran.
pub fn drop_columns(collection: &RecordCollection, columns: &[String]) -> RecordCollection {
    collection.iter()
              .map(|r| {
                  let mut r = r.clone();
                  for c in columns {
                      r.shift_remove(c);
                  }
                  r
              })
              .collect::<Vec<_>>()
              .into()
}

/// Agrega `new_column` con la concatenación textual de `columns` unida por
/// `separator`. Si algún componente falta o es `null` el resultado es
/// `null`: una clave compuesta incompleta no es una clave. Si `new_column`
/// ya existe se sobrescribe en su posición.
pub fn concat_columns(collection: &RecordCollection,
                      columns: &[String],
                      separator: &str,
                      new_column: &str)
                      -> RecordCollection {
    collection.iter()
              .map(|r| {
                  let parts: Option<Vec<String>> = columns.iter().map(|c| r.get(c).and_then(key_text)).collect();
                  let joined = match parts {
                      Some(parts) => Value::String(parts.join(separator)),
                      None => Value::Null,
                  };
                  let mut r = r.clone();
                  r.insert(new_column.to_string(), joined);
                  r
              })
              .collect::<Vec<_>>()
              .into()
}

/// Proyecta cada registro sobre `columns`, en ese orden. Las columnas que
/// un registro no tiene se omiten de ese registro.
pub fn select_columns(collection: &RecordCollection, columns: &[String]) -> RecordCollection {
    collection.iter()
              .map(|r| {
                  columns.iter()
                         .filter_map(|c| r.get(c).map(|v| (c.clone(), v.clone())))
                         .collect::<Record>()
              })
              .collect::<Vec<_>>()
              .into()
}

fn column_names(collection: &RecordCollection) -> IndexSet<String> {
    collection.iter().flat_map(|r| r.keys().cloned()).collect()
}

/// Left join de `left` con `right` por la columna `on`.
///
/// Las claves se comparan por su texto canónico (`key_text`); una clave
/// `null` nunca empareja. Un registro izquierdo con varias coincidencias
/// produce una fila por coincidencia; sin coincidencia, las columnas de
/// `right` quedan en `null`. Las columnas presentes en ambos lados (salvo
/// `on`) se renombran con sufijos `_x` (izquierda) y `_y` (derecha).
pub fn merge_left(left: &RecordCollection, right: &RecordCollection, on: &str) -> RecordCollection {
    let left_cols = column_names(left);
    let right_cols: Vec<String> = column_names(right).into_iter().filter(|c| c != on).collect();
    let overlap: HashSet<&str> =
        right_cols.iter().filter(|c| left_cols.contains(c.as_str())).map(String::as_str).collect();

    let mut index: HashMap<String, Vec<&Record>> = HashMap::new();
    for r in right {
        if let Some(k) = r.get(on).and_then(key_text) {
            index.entry(k).or_default().push(r);
        }
    }

    let suffixed = |c: &str, suffix: &str| {
        if overlap.contains(c) {
            format!("{c}{suffix}")
        } else {
            c.to_string()
        }
    };
    let no_match = Record::new();
    let mut out = Vec::with_capacity(left.len());
    for l in left {
        let mut base = Record::new();
        for c in &left_cols {
            base.insert(suffixed(c.as_str(), "_x"), l.get(c).cloned().unwrap_or(Value::Null));
        }
        let matches: Vec<&Record> = l.get(on)
                                     .and_then(key_text)
                                     .and_then(|k| index.get(&k))
                                     .cloned()
                                     .unwrap_or_else(|| vec![&no_match]);
        for r in matches {
            let mut row = base.clone();
            for c in &right_cols {
                row.insert(suffixed(c.as_str(), "_y"), r.get(c).cloned().unwrap_or(Value::Null));
            }
            out.push(row);
        }
    }
    out.into()
}

/// Tras un `merge_left`: si `column_x` y `column_y` coinciden en todas las
/// filas, elimina `column_y` y devuelve `column_x` a su nombre `column` en
/// la misma posición. Si difieren en alguna fila la colección no cambia.
pub fn collapse_identical(collection: &RecordCollection, column: &str) -> RecordCollection {
    let (x, y) = (format!("{column}_x"), format!("{column}_y"));
    let present = collection.iter().any(|r| r.contains_key(&x) && r.contains_key(&y));
    if !present || collection.iter().any(|r| r.get(&x) != r.get(&y)) {
        return collection.clone();
    }
    collection.iter()
              .map(|r| {
                  r.iter()
                   .filter(|(k, _)| **k != y)
                   .map(|(k, v)| if *k == x { (column.to_string(), v.clone()) } else { (k.clone(), v.clone()) })
                   .collect::<Record>()
              })
              .collect::<Vec<_>>()
              .into()
}
