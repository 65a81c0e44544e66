//! Fan-out multi-tenant contra una fuente en memoria.

use ledger_core::{fan_out, Context, FanOutStep, IssueCounter, RecordCollection, RemoteSource, Resource, SourceError,
                  StaticSource, Step, TenantKey};
use serde_json::{json, Value};
use tracing_subscriber::layer::SubscriberExt;

fn coll(v: Value) -> RecordCollection { RecordCollection::from_value(&v).expect("collection") }

#[test]
fn failing_tenant_is_isolated() {
    let registry = coll(json!({"value": [{"id": "A"}, {"id": "B"}]}));
    let report = fan_out(&registry, "CompanyId", &Context::new(), |id, _| match id {
        "A" => Ok(coll(json!({"value": [{"id": 1}]}))),
        _ => Err(SourceError::Transient("timeout".into())),
    });
    assert_eq!(report.collection.to_value(), json!({"value": [{"id": 1, "CompanyId": "A"}]}));
    assert_eq!(report.failed, 1);
    assert_eq!(report.processed, 1);
    assert_eq!(report.total_records, 1);
}

#[test]
fn output_follows_registry_order_and_tags_every_record() {
    let source = StaticSource::new()
        .with_collection("projects", TenantKey::Id("T1".into()), coll(json!([{"n": 1}, {"n": 2}])))
        .with_failure("projects", TenantKey::Id("T2".into()), SourceError::Data("bad json".into()))
        .with_collection("projects", TenantKey::Id("T3".into()), coll(json!([{"n": 3}])));
    let registry = coll(json!([{"id": "T1"}, {"id": "T2"}, {"id": "T3"}]));
    let resource = Resource::by_id("projects");

    let report = fan_out(&registry, "CompanyId", &Context::new(), |id, _| {
        source.fetch_collection(&resource, &TenantKey::Id(id.to_string()))
    });

    let got: Vec<(i64, String)> = report.collection
                                        .iter()
                                        .map(|r| (r["n"].as_i64().unwrap(), r["CompanyId"].as_str().unwrap().to_string()))
                                        .collect();
    assert_eq!(got, vec![(1, "T1".into()), (2, "T1".into()), (3, "T3".into())]);
    assert_eq!(report.failed, 1);
    assert_eq!(source.calls().len(), 3);
}

#[test]
fn empty_or_missing_registry_writes_empty_envelope() {
    let step = FanOutStep::new("extract_projects", "projects", |_, _| panic!("no fetch expected"));

    let mut missing = Context::new();
    assert!(step.run(&mut missing).is_success());
    assert_eq!(missing.get("projects"), Some(&json!({"value": []})));

    let mut empty = Context::new().with("companies", json!({"value": []}));
    assert!(step.run(&mut empty).is_success());
    assert_eq!(empty.get("projects"), Some(&json!({"value": []})));
}

#[test]
fn per_tenant_errors_feed_the_issue_counter() {
    let counter = IssueCounter::new();
    let step = FanOutStep::new("extract", "out", |id, _| {
        if id == "bad" {
            Err(SourceError::Transient("503".into()))
        } else {
            Ok(RecordCollection::empty())
        }
    });
    let mut ctx = Context::new().with("companies", json!({"value": [{"id": "ok"}, {"id": "bad"}, {"name": "x"}]}));

    let subscriber = tracing_subscriber::registry().with(counter.layer());
    let result = tracing::subscriber::with_default(subscriber, || step.run(&mut ctx));

    assert!(result.is_success());
    assert_eq!(counter.errors(), 1);
    assert_eq!(counter.warnings(), 1);
}
