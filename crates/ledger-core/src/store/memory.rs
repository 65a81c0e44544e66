use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;

use super::schema::{infer_schema, ColumnDef};
use super::{InsertMode, RelationalStore, StoreError};
use crate::model::{key_text, Record};

#[derive(Debug, Clone)]
struct MemTable {
    columns: Vec<ColumnDef>,
    key: Option<String>,
    rows: Vec<Record>,
}

/// Almacén en memoria (tests y `--dry-run`).
///
/// Respeta el mismo contrato que el backend Postgres: columnas explícitas,
/// unicidad de la clave primaria, inserción atómica por llamada. Puede
/// marcarse `offline` para simular pérdida de conectividad.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RefCell<IndexMap<String, MemTable>>,
    offline: Cell<bool>,
    reject_constraints: Cell<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Toda operación posterior falla con `StoreError::Connection`.
    pub fn set_offline(&self, offline: bool) { self.offline.set(offline); }

    /// Simula que la base rechaza agregar constraints de clave.
    pub fn set_reject_constraints(&self, reject: bool) { self.reject_constraints.set(reject); }

    pub fn table_names(&self) -> Vec<String> { self.tables.borrow().keys().cloned().collect() }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables.borrow().get(table).map(|t| t.rows.clone()).unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.borrow().get(table).map_or(0, |t| t.rows.len())
    }

    pub fn primary_key(&self, table: &str) -> Option<String> {
        self.tables.borrow().get(table).and_then(|t| t.key.clone())
    }

    fn online(&self) -> Result<(), StoreError> {
        if self.offline.get() {
            return Err(StoreError::Connection("in-memory store is offline".into()));
        }
        Ok(())
    }
}

fn missing_table(table: &str) -> StoreError { StoreError::Query(format!("relation \"{table}\" does not exist")) }

impl RelationalStore for InMemoryStore {
    fn check_connectivity(&self) -> Result<(), StoreError> { self.online() }

    fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        self.online()?;
        Ok(self.tables.borrow().contains_key(table))
    }

    fn create_table(&self, table: &str, sample: &[Record], key_field: Option<&str>) -> Result<(), StoreError> {
        self.online()?;
        let columns = infer_schema(sample);
        if columns.is_empty() {
            return Err(StoreError::Configuration(format!("cannot create '{table}' from an empty sample")));
        }
        if let Some(k) = key_field {
            if !columns.iter().any(|c| c.name == k) {
                return Err(StoreError::Configuration(format!("key field '{k}' not present in sample for '{table}'")));
            }
        }
        let mut tables = self.tables.borrow_mut();
        if tables.contains_key(table) {
            return Err(StoreError::Query(format!("relation \"{table}\" already exists")));
        }
        tables.insert(table.to_string(), MemTable { columns, key: None, rows: Vec::new() });

        if let Some(k) = key_field {
            if self.reject_constraints.get() {
                tables.shift_remove(table);
                return Err(StoreError::DataIntegrity(format!("could not add primary key ({k}) to '{table}'")));
            }
            if let Some(t) = tables.get_mut(table) {
                t.key = Some(k.to_string());
            }
        }
        Ok(())
    }

    fn columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        self.online()?;
        let tables = self.tables.borrow();
        let t = tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(t.columns.iter().map(|c| c.name.clone()).collect())
    }

    fn add_columns(&self, table: &str, columns: &[ColumnDef]) -> Result<(), StoreError> {
        self.online()?;
        let mut tables = self.tables.borrow_mut();
        let t = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        for c in columns {
            if t.columns.iter().any(|e| e.name == c.name) {
                return Err(StoreError::Query(format!("column \"{}\" of relation \"{table}\" already exists", c.name)));
            }
            t.columns.push(c.clone());
        }
        Ok(())
    }

    fn existing_keys(&self, table: &str, key_field: &str) -> Result<HashSet<String>, StoreError> {
        self.online()?;
        let tables = self.tables.borrow();
        let t = tables.get(table).ok_or_else(|| missing_table(table))?;
        if !t.columns.iter().any(|c| c.name == key_field) {
            return Err(StoreError::Query(format!("column \"{key_field}\" does not exist")));
        }
        Ok(t.rows.iter().filter_map(|r| r.get(key_field).and_then(key_text)).collect())
    }

    fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        self.online()?;
        let mut names = self.table_names();
        names.sort();
        Ok(names)
    }

    fn read_rows(&self, table: &str, limit: Option<usize>) -> Result<Vec<Record>, StoreError> {
        self.online()?;
        let tables = self.tables.borrow();
        let t = tables.get(table).ok_or_else(|| missing_table(table))?;
        let rows = t.rows
                    .iter()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|r| {
                        t.columns
                         .iter()
                         .map(|c| (c.name.clone(), r.get(&c.name).cloned().unwrap_or(Value::Null)))
                         .collect::<Record>()
                    })
                    .collect();
        Ok(rows)
    }

    fn insert(&self, table: &str, records: &[Record], mode: InsertMode) -> Result<usize, StoreError> {
        self.online()?;
        let mut tables = self.tables.borrow_mut();
        let t = tables.get_mut(table).ok_or_else(|| missing_table(table))?;

        for r in records {
            if let Some(unknown) = r.keys().find(|f| !t.columns.iter().any(|c| &c.name == *f)) {
                return Err(StoreError::Query(format!("column \"{unknown}\" of relation \"{table}\" does not exist")));
            }
        }
        if mode == InsertMode::FailIfExists && !t.rows.is_empty() {
            return Err(StoreError::DataIntegrity(format!("table '{table}' already contains rows")));
        }

        let base: &[Record] = if mode == InsertMode::Replace { &[] } else { &t.rows };
        if let Some(k) = &t.key {
            let mut keys: HashSet<String> = base.iter().filter_map(|r| r.get(k).and_then(key_text)).collect();
            for r in records {
                match r.get(k).and_then(key_text) {
                    None => return Err(StoreError::DataIntegrity(format!("null value in column \"{k}\" violates not-null constraint"))),
                    Some(v) if !keys.insert(v.clone()) => {
                        return Err(StoreError::DataIntegrity(format!("duplicate key value violates unique constraint: ({k})=({v})")))
                    }
                    Some(_) => {}
                }
            }
        }

        if mode == InsertMode::Replace {
            t.rows.clear();
        }
        t.rows.extend(records.iter().cloned());
        Ok(records.len())
    }
}
