use std::cell::RefCell;
use std::collections::HashMap;

use super::{RemoteSource, Resource, SourceError, TenantKey};
use crate::model::RecordCollection;

type Key = (String, TenantKey);

/// Fuente en memoria con respuestas predefinidas por (ruta, tenant).
///
/// Una combinación sin respuesta registrada devuelve colección vacía. Lleva
/// registro de las llamadas recibidas.
#[derive(Debug, Default)]
pub struct StaticSource {
    responses: HashMap<Key, Result<RecordCollection, SourceError>>,
    calls: RefCell<Vec<Key>>,
}

impl StaticSource {
    pub fn new() -> Self { Self::default() }

    pub fn with_collection(mut self, path: &str, tenant: TenantKey, collection: RecordCollection) -> Self {
        self.responses.insert((path.to_string(), tenant), Ok(collection));
        self
    }

    pub fn with_failure(mut self, path: &str, tenant: TenantKey, error: SourceError) -> Self {
        self.responses.insert((path.to_string(), tenant), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<(String, TenantKey)> { self.calls.borrow().clone() }
}

impl RemoteSource for StaticSource {
    fn fetch_collection(&self, resource: &Resource, tenant: &TenantKey) -> Result<RecordCollection, SourceError> {
        let key = (resource.path.clone(), tenant.clone());
        self.calls.borrow_mut().push(key.clone());
        self.responses.get(&key).cloned().unwrap_or_else(|| Ok(RecordCollection::empty()))
    }
}
