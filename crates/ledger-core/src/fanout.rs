//! Extractor multi-tenant (fan-out).
//!
//! Recorre el registro de tenants en orden, invoca la función de fetch por
//! cada uno y combina los resultados en una única colección, etiquetando
//! cada registro con el id de su tenant. El fallo de un tenant se registra y
//! cuenta pero nunca aborta el lote.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::constants::{COMPANIES_KEY, DEFAULT_TENANT_TAG};
use crate::errors::StepError;
use crate::model::{Context, RecordCollection, Tenant};
use crate::source::SourceError;
use crate::step::{Step, StepKind, StepRunResult};

/// Resultado de un fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutReport {
    pub collection: RecordCollection,
    /// Tenants cuyo fetch terminó bien (aunque devolviera cero registros).
    pub processed: usize,
    /// Tenants omitidos por falta de id o por error de fetch.
    pub failed: usize,
    pub total_tenants: usize,
    pub total_records: usize,
}

/// Ejecuta `fetch` por cada tenant de `registry`.
///
/// El orden de salida es el orden del registro por el orden de cada
/// respuesta; no se reordena ni deduplica. El campo `tag_field` se
/// sobrescribe en cada registro con el id del tenant.
pub fn fan_out<F>(registry: &RecordCollection, tag_field: &str, ctx: &Context, mut fetch: F) -> FanOutReport
    where F: FnMut(&str, &Context) -> Result<RecordCollection, SourceError>
{
    let total_tenants = registry.len();
    let mut accumulated = RecordCollection::empty();
    let mut processed = 0usize;
    let mut failed = 0usize;

    for (position, record) in registry.iter().enumerate() {
        let tenant = Tenant::from_record(record);
        let Some(tenant_id) = tenant.id else {
            warn!(position, name = ?tenant.name, "tenant sin id en el registro; se omite");
            failed += 1;
            continue;
        };

        match fetch(&tenant_id, ctx) {
            Ok(fetched) => {
                debug!(tenant_id = %tenant_id, records = fetched.len(), "tenant procesado");
                for mut r in fetched {
                    r.insert(tag_field.to_string(), Value::String(tenant_id.clone()));
                    accumulated.push(r);
                }
                processed += 1;
            }
            Err(e) => {
                error!(tenant_id = %tenant_id, error = %e, "fallo extrayendo datos del tenant; se continúa");
                failed += 1;
            }
        }
    }

    let total_records = accumulated.len();
    info!(processed, failed, total_tenants, total_records, "fan-out finalizado");
    FanOutReport { collection: accumulated, processed, failed, total_tenants, total_records }
}

/// Función de fetch por tenant usada por `FanOutStep`.
pub type TenantFetch = Box<dyn Fn(&str, &Context) -> Result<RecordCollection, SourceError>>;

/// Step de extracción que aplica `fan_out` sobre el registro en contexto.
pub struct FanOutStep {
    id: String,
    registry_key: String,
    output_key: String,
    tag_field: String,
    fetch: TenantFetch,
}

impl FanOutStep {
    pub fn new<F>(id: impl Into<String>, output_key: impl Into<String>, fetch: F) -> Self
        where F: Fn(&str, &Context) -> Result<RecordCollection, SourceError> + 'static
    {
        Self { id: id.into(),
               registry_key: COMPANIES_KEY.to_string(),
               output_key: output_key.into(),
               tag_field: DEFAULT_TENANT_TAG.to_string(),
               fetch: Box::new(fetch) }
    }

    pub fn with_registry_key(mut self, key: impl Into<String>) -> Self {
        self.registry_key = key.into();
        self
    }

    pub fn with_tag_field(mut self, field: impl Into<String>) -> Self {
        self.tag_field = field.into();
        self
    }

    pub fn registry_key(&self) -> &str { &self.registry_key }

    pub fn output_key(&self) -> &str { &self.output_key }
}

impl Step for FanOutStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Extract }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        let registry = match ctx.collection(&self.registry_key) {
            Ok(Some(r)) if !r.is_empty() => r,
            Ok(_) => {
                warn!(registry_key = %self.registry_key, "no hay tenants en el registro; se escribe colección vacía");
                ctx.put_collection(self.output_key.clone(), RecordCollection::empty());
                return StepRunResult::wrote(self.output_key.clone());
            }
            Err(e) => {
                return StepRunResult::Failure { error: StepError::DataIntegrity(format!("registry '{}' malformed: {e}",
                                                                                       self.registry_key)) };
            }
        };

        let report = fan_out(&registry, &self.tag_field, ctx, |id, c| (self.fetch)(id, c));
        ctx.put_collection(self.output_key.clone(), report.collection);
        StepRunResult::wrote(self.output_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coll(v: Value) -> RecordCollection { RecordCollection::from_value(&v).unwrap() }

    #[test]
    fn tags_overwrite_existing_field() {
        let registry = coll(json!([{"id": "A"}]));
        let report = fan_out(&registry, "CompanyId", &Context::new(), |_, _| {
            Ok(coll(json!([{"id": 1, "CompanyId": "stale"}])))
        });
        assert_eq!(report.collection.to_value(), json!({"value": [{"id": 1, "CompanyId": "A"}]}));
    }

    #[test]
    fn tenant_without_id_is_counted_as_failed() {
        let registry = coll(json!([{"name": "sin id"}, {"id": "B"}]));
        let mut seen = Vec::new();
        let report = fan_out(&registry, "CompanyId", &Context::new(), |id, _| {
            seen.push(id.to_string());
            Ok(RecordCollection::empty())
        });
        assert_eq!(seen, vec!["B"]);
        assert_eq!((report.processed, report.failed, report.total_tenants), (1, 1, 2));
    }

    #[test]
    fn malformed_registry_fails_the_step() {
        let step = FanOutStep::new("x", "out", |_, _| Ok(RecordCollection::empty()));
        let mut ctx = Context::new().with("companies", json!({"value": 1}));
        assert!(!step.run(&mut ctx).is_success());
    }
}
