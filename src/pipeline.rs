//! Pipeline por defecto: registro de compañías y datasets por compañía.

use std::rc::Rc;

use ledger_adapters::{CheckConnectionStep, ConcatColumnsStep, DropColumnsStep, ExtractCollectionStep,
                      ExtractMultiCompanyStep, FilterStep, MergeLeftStep, StoreStep};
use ledger_core::constants::{COMPANIES_KEY, TENANT_ID_FIELD};
use ledger_core::{Addressing, RelationalStore, RemoteSource, Resource, Step};

use crate::config::PipelineSettings;
use crate::error::AppError;

/// Metadato OData que no se persiste.
pub const ETAG_FIELD: &str = "@odata.etag";

/// Parte de una clave compuesta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    /// El campo de etiqueta de tenant configurado.
    TenantTag,
    Field(&'static str),
}

/// Clave compuesta construida concatenando columnas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeKey {
    pub columns: &'static [KeyPart],
    pub separator: &'static str,
    pub column: &'static str,
}

/// Segundo recurso unido por left join al recurso principal del dataset.
/// La etiqueta de tenant se agrega a `columns` y no a `with_columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment {
    pub path: &'static str,
    pub on: &'static str,
    pub columns: &'static [&'static str],
    pub with_columns: &'static [&'static str],
}

/// Un dataset extraído por compañía y persistido incrementalmente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub addressing: Addressing,
    pub path: &'static str,
    pub table: &'static str,
    pub key_field: &'static str,
    pub composite: Option<CompositeKey>,
    pub enrichment: Option<Enrichment>,
}

impl DatasetSpec {
    pub fn resource(&self) -> Resource { Resource { path: self.path.to_string(), addressing: self.addressing } }

    /// Clave del contexto donde queda la colección del dataset.
    pub fn context_key(&self) -> &'static str { self.name }
}

pub const DATASETS: &[DatasetSpec] = &[
    DatasetSpec { name: "projects",
                  addressing: Addressing::ById,
                  path: "projects",
                  table: "projects",
                  key_field: "id",
                  composite: None,
                  enrichment: None },
    DatasetSpec { name: "customers",
                  addressing: Addressing::ById,
                  path: "customers",
                  table: "customers",
                  key_field: "id",
                  composite: None,
                  enrichment: None },
    DatasetSpec { name: "general_ledger",
                  addressing: Addressing::ById,
                  path: "generalLedgerEntries",
                  table: "general_ledger_entries",
                  key_field: "id",
                  composite: None,
                  enrichment: None },
    DatasetSpec { name: "sales_invoices",
                  addressing: Addressing::ById,
                  path: "salesInvoices",
                  table: "sales_invoices",
                  key_field: "id",
                  composite: None,
                  enrichment: None },
    DatasetSpec { name: "project_ledger",
                  addressing: Addressing::ByName,
                  path: "JobLedgerEntries",
                  table: "project_ledger_entries",
                  key_field: "uid",
                  composite: Some(CompositeKey { columns: &[KeyPart::TenantTag, KeyPart::Field("Entry_No")],
                                                     separator: "_",
                                                     column: "uid" }),
                  enrichment: None },
    DatasetSpec { name: "customer_financial",
                  addressing: Addressing::ById,
                  path: "customers",
                  table: "customer_financial",
                  key_field: "id",
                  composite: None,
                  enrichment: Some(Enrichment { path: "customerFinancialDetails",
                                                on: "id",
                                                columns: &["id", "number", "displayName", "addressLine1", "city",
                                                           "state", "postalCode", "currencyId"],
                                                with_columns: &["id", "number", "balance", "totalSalesExcludingTax",
                                                                "overdueAmount"] }) },
];

pub fn dataset(name: &str) -> Option<&'static DatasetSpec> { DATASETS.iter().find(|d| d.name == name) }

/// Datasets a correr: todos si `only` está vacío; si no, los nombrados en
/// el orden del catálogo.
pub fn select_datasets(only: &[String]) -> Result<Vec<&'static DatasetSpec>, AppError> {
    if let Some(unknown) = only.iter().find(|n| dataset(n).is_none()) {
        return Err(AppError::UnknownDataset(unknown.clone()));
    }
    Ok(DATASETS.iter().filter(|d| only.is_empty() || only.iter().any(|n| n == d.name)).collect())
}

/// Steps de un dataset: extracción multi-compañía, limpieza, left join o
/// clave compuesta opcionales y escritura incremental.
pub fn dataset_steps(spec: &DatasetSpec,
                     settings: &PipelineSettings,
                     source: &Rc<dyn RemoteSource>,
                     store: &Rc<dyn RelationalStore>)
                     -> Vec<Box<dyn Step>> {
    let key = spec.context_key();
    let extract = |id: String, resource: Resource, output: String| -> Box<dyn Step> {
        Box::new(ExtractMultiCompanyStep::new(id, Rc::clone(source), resource, output)
                     .with_registry_key(COMPANIES_KEY)
                     .with_tag_field(settings.tenant_tag.clone()))
    };
    let mut steps: Vec<Box<dyn Step>> = Vec::new();
    steps.push(extract(format!("extract_{}", spec.name), spec.resource(), key.to_string()));
    steps.push(Box::new(DropColumnsStep::new(format!("clean_{}", spec.name), key, [ETAG_FIELD])));
    if let Some(enrichment) = spec.enrichment {
        let details = format!("{key}_details");
        let resource = Resource { path: enrichment.path.to_string(), addressing: spec.addressing };
        steps.push(extract(format!("extract_{details}"), resource, details.clone()));
        steps.push(Box::new(DropColumnsStep::new(format!("clean_{details}"), details.clone(), [ETAG_FIELD])));
        let mut columns: Vec<String> = enrichment.columns.iter().map(|c| c.to_string()).collect();
        columns.push(settings.tenant_tag.clone());
        steps.push(Box::new(MergeLeftStep::new(format!("merge_{}", spec.name), key, details, enrichment.on, key)
                                .with_left_columns(columns)
                                .with_right_columns(enrichment.with_columns.iter().copied())));
    }
    if let Some(composite) = spec.composite {
        let columns: Vec<String> = composite.columns
                                            .iter()
                                            .map(|part| match part {
                                                KeyPart::TenantTag => settings.tenant_tag.clone(),
                                                KeyPart::Field(f) => f.to_string(),
                                            })
                                            .collect();
        steps.push(Box::new(ConcatColumnsStep::new(format!("key_{}", spec.name),
                                                   key,
                                                   columns,
                                                   composite.separator,
                                                   composite.column)));
    }
    steps.push(Box::new(StoreStep::incremental(format!("store_{}", spec.name),
                                               Rc::clone(store),
                                               key,
                                               spec.table,
                                               spec.key_field)));
    steps
}

/// Arma la secuencia completa: verificación del almacén, registro de
/// compañías (extraído, filtrado y persistido) y los datasets elegidos.
pub fn build_pipeline(settings: &PipelineSettings,
                      source: Rc<dyn RemoteSource>,
                      store: Rc<dyn RelationalStore>,
                      only: &[String])
                      -> Result<Vec<Box<dyn Step>>, AppError> {
    let datasets = select_datasets(only)?;
    let mut steps: Vec<Box<dyn Step>> = vec![
        Box::new(CheckConnectionStep::new("check_store", Rc::clone(&store))),
        Box::new(ExtractCollectionStep::new("extract_companies",
                                            Rc::clone(&source),
                                            Resource::global(COMPANIES_KEY),
                                            COMPANIES_KEY)),
        Box::new(FilterStep::new("filter_companies",
                                 COMPANIES_KEY,
                                 TENANT_ID_FIELD,
                                 settings.excluded_company_ids.iter().cloned())),
        Box::new(StoreStep::incremental("store_companies", Rc::clone(&store), COMPANIES_KEY, "companies", TENANT_ID_FIELD)),
    ];
    for spec in datasets {
        steps.extend(dataset_steps(spec, settings, &source, &store));
    }
    Ok(steps)
}
