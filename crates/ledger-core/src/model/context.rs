use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{RecordCollection, ShapeError};
use super::tenant::Tenant;

/// Contexto compartido de una corrida.
///
/// Mapa ordenado clave → valor JSON que el `Controller` pasa por referencia
/// mutable a cada step. El orden de inserción se preserva para que el
/// contexto devuelto sea legible en el mismo orden en que se produjo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: IndexMap<String, Value>,
}

impl Context {
    pub fn new() -> Self { Self::default() }

    /// Variante encadenable de `insert` para sembrar contextos.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> { self.entries.get(key) }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> { self.entries.shift_remove(key) }

    pub fn contains_key(&self, key: &str) -> bool { self.entries.contains_key(key) }

    pub fn keys(&self) -> impl Iterator<Item = &str> { self.entries.keys().map(String::as_str) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Lee `key` como colección. `Ok(None)` si la clave no existe.
    pub fn collection(&self, key: &str) -> Result<Option<RecordCollection>, ShapeError> {
        self.entries.get(key).map(RecordCollection::from_value).transpose()
    }

    /// Escribe una colección como envelope.
    pub fn put_collection(&mut self, key: impl Into<String>, collection: RecordCollection) {
        self.entries.insert(key.into(), collection.into_value());
    }

    /// Busca en el registro de tenants bajo `registry_key` el nombre del
    /// tenant con id `tenant_id`.
    pub fn tenant_name(&self, registry_key: &str, tenant_id: &str) -> Option<String> {
        let registry = self.collection(registry_key).ok().flatten()?;
        registry.iter()
                .map(Tenant::from_record)
                .find(|t| t.id.as_deref() == Some(tenant_id))
                .and_then(|t| t.name)
    }

    pub fn into_inner(self) -> IndexMap<String, Value> { self.entries }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
