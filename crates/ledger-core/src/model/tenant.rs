use crate::constants::{TENANT_ID_FIELD, TENANT_NAME_FIELD};

use super::record::{key_text, Record};

/// Identidad mínima de un tenant (compañía) dentro del registro.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tenant {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Tenant {
    /// Extrae la identidad de un registro del catálogo de compañías. Ids
    /// numéricos se aceptan como texto; ids vacíos cuentan como ausentes.
    pub fn from_record(record: &Record) -> Self {
        let id = record.get(TENANT_ID_FIELD)
                       .and_then(key_text)
                       .filter(|s| !s.trim().is_empty());
        let name = record.get(TENANT_NAME_FIELD)
                         .and_then(|v| v.as_str())
                         .map(str::to_string)
                         .filter(|s| !s.is_empty());
        Self { id, name }
    }
}
