//! Cliente bloqueante de la API.

use std::cell::RefCell;

use ledger_core::{RecordCollection, RemoteSource, Resource, SourceError, TenantKey};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::error::{classify_status, transport_error, RemoteError, StatusClass};
use crate::url::resource_url;

const NEXT_LINK: &str = "@odata.nextLink";
const CONTEXT_FIELD: &str = "@odata.context";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Cliente HTTP con token cacheado.
///
/// El token se pide la primera vez que hace falta y se renueva una sola vez
/// por request ante un 401.
pub struct BcClient {
    http: Client,
    config: SourceConfig,
    token: RefCell<Option<String>>,
}

impl BcClient {
    pub fn new(config: SourceConfig) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config, token: RefCell::new(None) })
    }

    pub fn config(&self) -> &SourceConfig { &self.config }

    fn access_token(&self) -> Result<String, SourceError> {
        if let Some(t) = self.token.borrow().as_ref() {
            return Ok(t.clone());
        }
        let token = self.request_token()?;
        self.token.replace(Some(token.clone()));
        Ok(token)
    }

    fn request_token(&self) -> Result<String, SourceError> {
        debug!(token_url = %self.config.token_url, "solicitando token");
        let form = [("grant_type", "client_credentials"),
                    ("client_id", self.config.client_id.as_str()),
                    ("client_secret", self.config.client_secret.as_str()),
                    ("scope", self.config.scope.as_str())];
        let resp = self.http
                       .post(&self.config.token_url)
                       .form(&form)
                       .send()
                       .map_err(|e| transport_error(&e))?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(SourceError::Transient(format!("token endpoint HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(SourceError::Auth(format!("token endpoint HTTP {}: {body}", status.as_u16())));
        }
        let parsed: TokenResponse = resp.json().map_err(|e| SourceError::Auth(format!("token response: {e}")))?;
        Ok(parsed.access_token)
    }

    /// GET autenticado. `Ok(None)` si el recurso no existe (404).
    fn get_json(&self, url: &str) -> Result<Option<Value>, SourceError> {
        let mut refreshed = false;
        loop {
            let token = self.access_token()?;
            let resp = self.http
                           .get(url)
                           .bearer_auth(&token)
                           .header(ACCEPT, "application/json")
                           .send()
                           .map_err(|e| transport_error(&e))?;
            let status = resp.status();
            if status.is_success() {
                let body: Value = resp.json().map_err(|e| transport_error(&e))?;
                return Ok(Some(body));
            }
            let body = resp.text().unwrap_or_default();
            match classify_status(status, &body) {
                StatusClass::NoData => {
                    debug!(url, "recurso no encontrado; se trata como sin datos");
                    return Ok(None);
                }
                StatusClass::Unauthorized if !refreshed => {
                    debug!("token rechazado; se renueva");
                    self.token.replace(None);
                    refreshed = true;
                }
                StatusClass::Unauthorized => {
                    return Err(SourceError::Auth(format!("HTTP 401 after token refresh: {url}")));
                }
                StatusClass::Failure(e) => return Err(e),
            }
        }
    }

    /// Descarga todas las páginas de una colección siguiendo
    /// `@odata.nextLink`.
    pub fn get_collection(&self, url: Url) -> Result<RecordCollection, SourceError> {
        let mut collection = RecordCollection::empty();
        let mut next = Some(url.to_string());
        let mut pages = 0usize;
        while let Some(current) = next.take() {
            let Some(body) = self.get_json(&current)? else {
                break;
            };
            let (page, link) = parse_page(body)?;
            pages += 1;
            collection.extend(page);
            match link {
                Some(l) if l == current => {
                    warn!(url = %current, "nextLink apunta a la misma página; se corta la paginación");
                }
                other => next = other,
            }
        }
        debug!(pages, records = collection.len(), "colección descargada");
        Ok(collection)
    }
}

/// Separa registros y enlace a la página siguiente de un cuerpo OData.
/// Un objeto sin `value` es una entidad única.
pub fn parse_page(mut body: Value) -> Result<(RecordCollection, Option<String>), SourceError> {
    let next = body.get(NEXT_LINK).and_then(Value::as_str).map(str::to_string);
    if let Value::Object(map) = &mut body {
        map.shift_remove(NEXT_LINK);
        map.shift_remove(CONTEXT_FIELD);
    }
    let collection = RecordCollection::from_value(&body)
        .map_err(|e| SourceError::Data(format!("unexpected payload shape: {e}")))?;
    Ok((collection, next))
}

impl RemoteSource for BcClient {
    fn fetch_collection(&self, resource: &Resource, tenant: &TenantKey) -> Result<RecordCollection, SourceError> {
        let url = resource_url(&self.config.environment_root(), resource, tenant)?;
        info!(resource = %resource.path, tenant = ?tenant, "consultando API");
        self.get_collection(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_page_with_next_link() {
        let (page, next) = parse_page(json!({
            "@odata.context": "ctx",
            "value": [{"id": "a"}, {"id": "b"}],
            "@odata.nextLink": "https://host/next?$skiptoken=2"
        })).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(next.as_deref(), Some("https://host/next?$skiptoken=2"));
    }

    #[test]
    fn single_entity_drops_odata_metadata() {
        let (page, next) = parse_page(json!({"@odata.context": "ctx", "id": "c1", "name": "Alpha"})).unwrap();
        assert_eq!(page.to_value(), json!({"value": [{"id": "c1", "name": "Alpha"}]}));
        assert_eq!(next, None);
    }

    #[test]
    fn scalar_payload_is_a_data_error() {
        assert!(matches!(parse_page(json!("oops")), Err(SourceError::Data(_))));
        assert!(matches!(parse_page(json!({"value": "oops"})), Err(SourceError::Data(_))));
    }
}
