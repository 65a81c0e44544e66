//! Construcción de URLs por esquema de direccionamiento.
//!
//! - Global: `{root}/api/v2.0/{path}`
//! - Por id: `{root}/api/v2.0/companies({id})/{path}`
//! - Por nombre: `{root}/ODataV4/Company('{name}')/{path}`

use ledger_core::{Addressing, Resource, SourceError, TenantKey};
use reqwest::Url;

const API_SEGMENT: [&str; 2] = ["api", "v2.0"];
const ODATA_SEGMENT: &str = "ODataV4";

/// Literal OData: comillas simples duplicadas.
fn odata_literal(name: &str) -> String { name.replace('\'', "''") }

pub fn resource_url(root: &str, resource: &Resource, tenant: &TenantKey) -> Result<Url, SourceError> {
    let mut url = Url::parse(root).map_err(|e| SourceError::Data(format!("invalid api root '{root}': {e}")))?;
    let tenant_segments: Vec<String> = match (resource.addressing, tenant) {
        (Addressing::Global, _) => API_SEGMENT.iter().map(|s| s.to_string()).collect(),
        (Addressing::ById, TenantKey::Id(id)) => {
            let mut s: Vec<String> = API_SEGMENT.iter().map(|s| s.to_string()).collect();
            s.push(format!("companies({id})"));
            s
        }
        (Addressing::ByName, TenantKey::Name(name)) => {
            vec![ODATA_SEGMENT.to_string(), format!("Company('{}')", odata_literal(name))]
        }
        (addressing, other) => {
            return Err(SourceError::Data(format!("resource '{}' is addressed {:?} but got tenant key {:?}",
                                                 resource.path, addressing, other)))
        }
    };
    {
        let mut segments = url.path_segments_mut()
                              .map_err(|_| SourceError::Data(format!("api root '{root}' cannot be a base url")))?;
        segments.pop_if_empty();
        segments.extend(tenant_segments.iter().map(String::as_str));
        segments.extend(resource.path.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url)
}
