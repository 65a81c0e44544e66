use std::rc::Rc;

use ledger_core::{FlowState, InMemoryStore, IssueCounter, RecordCollection, RelationalStore, RemoteSource,
                  RunReport, SourceError, StaticSource, TenantKey};
use ledgerflow::{execute, AppError, PipelineSettings};
use serde_json::{json, Value};
use tracing_subscriber::layer::SubscriberExt;

fn coll(v: Value) -> RecordCollection { RecordCollection::from_value(&v).expect("collection") }

fn api() -> StaticSource {
    StaticSource::new()
        .with_collection("companies",
                         TenantKey::Global,
                         coll(json!({"value": [
                             {"@odata.etag": "W/c1", "id": "c1", "name": "Alpha"},
                             {"@odata.etag": "W/c9", "id": "c9", "name": "Sandbox"}
                         ]})))
        .with_collection("customers",
                         TenantKey::Id("c1".into()),
                         coll(json!([{"@odata.etag": "W/1", "id": "k1", "displayName": "Acme"},
                                     {"@odata.etag": "W/2", "id": "k1", "displayName": "Acme dup"},
                                     {"@odata.etag": "W/3", "id": null, "displayName": "sin id"}])))
        .with_collection("JobLedgerEntries",
                         TenantKey::Name("Alpha".into()),
                         coll(json!([{"Entry_No": 7, "Job_No": "J-1"}])))
        .with_failure("salesInvoices", TenantKey::Id("c1".into()), SourceError::Data("HTTP 400".into()))
}

fn settings() -> PipelineSettings {
    PipelineSettings { excluded_company_ids: ["c9".to_string()].into_iter().collect(), ..PipelineSettings::default() }
}

fn run(source: Rc<dyn RemoteSource>, store: Rc<dyn RelationalStore>, only: &[String]) -> Result<RunReport, AppError> {
    let counter = IssueCounter::new();
    let subscriber = tracing_subscriber::registry().with(counter.layer());
    tracing::subscriber::with_default(subscriber, || execute(&settings(), source, store, only, &counter))
}

#[test]
fn customers_and_project_ledger() {
    let store = Rc::new(InMemoryStore::new());
    let source = Rc::new(api());
    let only = vec!["customers".to_string(), "project_ledger".to_string()];

    let report = run(source.clone(), store.clone(), &only).unwrap();

    assert_eq!(report.state, FlowState::Completed);
    // excluida por configuración; nunca se consulta
    assert!(source.calls().iter().all(|(_, t)| *t != TenantKey::Id("c9".into())));
    assert_eq!(store.row_count("companies"), 1);

    let customers = store.rows("customers");
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["displayName"], json!("Acme"));
    assert_eq!(customers[0]["CompanyId"], json!("c1"));
    assert!(customers[0].get("@odata.etag").is_none());

    let entries = store.rows("project_ledger_entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["uid"], json!("c1_7"));
    assert_eq!(store.primary_key("project_ledger_entries").as_deref(), Some("uid"));

    // null key descartada con warning
    assert_eq!(report.issues.errors, 0);
    assert_eq!(report.exit_status().code(), 2);
}

#[test]
fn tenant_failure_counts_as_error() {
    let store = Rc::new(InMemoryStore::new());
    let report = run(Rc::new(api()), store.clone(), &["sales_invoices".to_string()]).unwrap();

    assert_eq!(report.state, FlowState::Completed);
    assert!(report.issues.errors >= 1);
    assert_eq!(report.exit_status().code(), 1);
    assert!(!store.table_names().contains(&"sales_invoices".to_string()));
}

#[test]
fn unknown_dataset_fails_before_running() {
    let store = Rc::new(InMemoryStore::new());
    let source = Rc::new(api());
    let err = run(source.clone(), store, &["inventory".to_string()]).unwrap_err();
    assert!(matches!(err, AppError::UnknownDataset(_)));
    assert!(source.calls().is_empty());
}

#[test]
fn offline_store_stops_the_run() {
    let store = Rc::new(InMemoryStore::new());
    store.set_offline(true);
    let report = run(Rc::new(api()), store, &[]).unwrap();
    assert_eq!(report.state, FlowState::Failed);
    assert_eq!(report.exit_status().code(), 1);
}

#[test]
fn customer_financial_joins_details_per_company() {
    let store = Rc::new(InMemoryStore::new());
    let source = api().with_collection("customers",
                                       TenantKey::Id("c1".into()),
                                       coll(json!([{"@odata.etag": "W/1", "id": "k1", "number": "C-1", "displayName": "Acme", "city": "Lima"},
                                                   {"@odata.etag": "W/2", "id": "k2", "number": "C-2", "displayName": "Beta"}])))
                      .with_collection("customerFinancialDetails",
                                       TenantKey::Id("c1".into()),
                                       coll(json!([{"@odata.etag": "W/f", "id": "k1", "number": "C-1", "balance": 10.5,
                                                    "totalSalesExcludingTax": 40, "overdueAmount": 0, "extra": true}])));

    let report = run(Rc::new(source), store.clone(), &["customer_financial".to_string()]).unwrap();
    assert_eq!(report.state, FlowState::Completed);

    let rows = store.rows("customer_financial");
    assert_eq!(rows.len(), 2);
    let acme = rows.iter().find(|r| r["id"] == json!("k1")).unwrap();
    assert_eq!(acme["balance"], json!(10.5));
    assert_eq!(acme["city"], json!("Lima"));
    assert_eq!(acme["CompanyId"], json!("c1"));
    assert!(acme.get("extra").is_none());
    assert!(acme.get("@odata.etag").is_none());
    // k2 no tiene detalle financiero, así que number_x y number_y difieren
    assert_eq!(acme["number_x"], json!("C-1"));
    let beta = rows.iter().find(|r| r["id"] == json!("k2")).unwrap();
    assert!(beta["balance"].is_null());
    assert!(beta["number_y"].is_null());
}
