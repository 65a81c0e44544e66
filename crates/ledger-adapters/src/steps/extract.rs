//! Steps de extracción (Extract)
//!
//! - `ExtractCollectionStep`: una única consulta (p.ej. el catálogo global
//!   de compañías). Un error de la fuente aborta la corrida.
//! - `ExtractMultiCompanyStep`: la misma consulta por cada compañía del
//!   registro en contexto, vía `FanOutStep`. Errores por compañía se
//!   registran y no abortan.

use std::rc::Rc;

use ledger_core::constants::{COMPANIES_KEY, DEFAULT_TENANT_TAG};
use ledger_core::{Addressing, Context, FanOutStep, RecordCollection, RemoteSource, Resource, SourceError, Step,
                  StepError, StepKind, StepRunResult, TenantKey};
use tracing::info;

pub struct ExtractCollectionStep {
    id: String,
    source: Rc<dyn RemoteSource>,
    resource: Resource,
    tenant: TenantKey,
    output_key: String,
}

impl ExtractCollectionStep {
    pub fn new(id: impl Into<String>, source: Rc<dyn RemoteSource>, resource: Resource, output_key: impl Into<String>) -> Self {
        Self { id: id.into(), source, resource, tenant: TenantKey::Global, output_key: output_key.into() }
    }

    /// Consulta acotada a un tenant concreto.
    pub fn for_tenant(mut self, tenant: TenantKey) -> Self {
        self.tenant = tenant;
        self
    }
}

impl Step for ExtractCollectionStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Extract }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        match self.source.fetch_collection(&self.resource, &self.tenant) {
            Ok(collection) => {
                info!(resource = %self.resource.path, records = collection.len(), output_key = %self.output_key,
                      "colección extraída");
                ctx.put_collection(self.output_key.clone(), collection);
                StepRunResult::wrote(self.output_key.clone())
            }
            Err(e) => StepRunResult::Failure { error: StepError::from(e) },
        }
    }
}

/// Resuelve la clave de tenant según el direccionamiento del recurso.
/// Recursos por nombre buscan el nombre en el registro del contexto.
fn tenant_key(addressing: Addressing, tenant_id: &str, ctx: &Context, registry_key: &str) -> Result<TenantKey, SourceError> {
    match addressing {
        Addressing::Global => Ok(TenantKey::Global),
        Addressing::ById => Ok(TenantKey::Id(tenant_id.to_string())),
        Addressing::ByName => ctx.tenant_name(registry_key, tenant_id)
                                 .map(TenantKey::Name)
                                 .ok_or_else(|| SourceError::Data(format!("company '{tenant_id}' has no name in '{registry_key}'"))),
    }
}

pub struct ExtractMultiCompanyStep {
    id: String,
    source: Rc<dyn RemoteSource>,
    resource: Resource,
    output_key: String,
    registry_key: String,
    tag_field: String,
}

impl ExtractMultiCompanyStep {
    pub fn new(id: impl Into<String>, source: Rc<dyn RemoteSource>, resource: Resource, output_key: impl Into<String>) -> Self {
        Self { id: id.into(),
               source,
               resource,
               output_key: output_key.into(),
               registry_key: COMPANIES_KEY.to_string(),
               tag_field: DEFAULT_TENANT_TAG.to_string() }
    }

    pub fn with_registry_key(mut self, key: impl Into<String>) -> Self {
        self.registry_key = key.into();
        self
    }

    pub fn with_tag_field(mut self, field: impl Into<String>) -> Self {
        self.tag_field = field.into();
        self
    }

    fn fan_out_step(&self) -> FanOutStep {
        let source = Rc::clone(&self.source);
        let resource = self.resource.clone();
        let registry_key = self.registry_key.clone();
        let fetch = move |tenant_id: &str, ctx: &Context| -> Result<RecordCollection, SourceError> {
            let key = tenant_key(resource.addressing, tenant_id, ctx, &registry_key)?;
            source.fetch_collection(&resource, &key)
        };
        FanOutStep::new(self.id.clone(), self.output_key.clone(), fetch).with_registry_key(self.registry_key.clone())
                                                                         .with_tag_field(self.tag_field.clone())
    }
}

impl Step for ExtractMultiCompanyStep {
    fn id(&self) -> &str { &self.id }

    fn kind(&self) -> StepKind { StepKind::Extract }

    fn run(&self, ctx: &mut Context) -> StepRunResult {
        info!(resource = %self.resource.path, "extracción multi-compañía");
        self.fan_out_step().run(ctx)
    }
}
