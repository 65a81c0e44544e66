//! Inserción incremental sobre el almacén en memoria.

use ledger_core::store::incremental_insert;
use ledger_core::{InMemoryStore, InsertMode, Record, RelationalStore, StoreError};
use serde_json::{json, Value};

fn recs(v: Value) -> Vec<Record> {
    v.as_array().expect("array").iter().map(|r| r.as_object().cloned().expect("object")).collect()
}

#[test]
fn only_new_keys_are_inserted() {
    let store = InMemoryStore::new();
    store.create_table("projects", &recs(json!([{"id": 1}])), Some("id")).unwrap();
    store.insert("projects", &recs(json!([{"id": 1}, {"id": 2}])), InsertMode::Append).unwrap();

    let report = store.incremental_insert("projects", &recs(json!([{"id": 1}, {"id": 2}, {"id": 3}])), "id").unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped_existing, 2);
    assert_eq!(store.rows("projects").last(), Some(&recs(json!([{"id": 3}]))[0]));
}

#[test]
fn repeating_a_batch_does_not_duplicate_rows() {
    let store = InMemoryStore::new();
    let batch = recs(json!([{"id": "a", "v": 1}, {"id": "b", "v": 2}]));
    let first = incremental_insert(&store, "t", &batch, "id").unwrap();
    let second = incremental_insert(&store, "t", &batch, "id").unwrap();
    assert!(first.created_table);
    assert!(!second.created_table);
    assert_eq!(second.inserted, 0);
    assert_eq!(store.row_count("t"), 2);
    assert_eq!(store.primary_key("t").as_deref(), Some("id"));
}

#[test]
fn null_keys_are_never_inserted() {
    let store = InMemoryStore::new();
    let batch = recs(json!([{"id": null, "v": 1}, {"v": 2}, {"id": 7, "v": 3}]));
    let report = incremental_insert(&store, "t", &batch, "id").unwrap();
    assert_eq!(report.skipped_null_key, 2);
    assert_eq!(store.rows("t"), recs(json!([{"id": 7, "v": 3}])));
}

#[test]
fn duplicates_within_batch_keep_first() {
    let store = InMemoryStore::new();
    let batch = recs(json!([{"id": 1, "v": "first"}, {"id": 1, "v": "second"}]));
    let report = incremental_insert(&store, "t", &batch, "id").unwrap();
    assert_eq!(report.skipped_duplicates, 1);
    assert_eq!(store.rows("t"), recs(json!([{"id": 1, "v": "first"}])));
}

#[test]
fn empty_batch_is_a_noop() {
    let store = InMemoryStore::new();
    let report = incremental_insert(&store, "t", &[], "id").unwrap();
    assert_eq!(report, Default::default());
    assert!(store.table_names().is_empty());
}

#[test]
fn constraint_failure_drops_new_table() {
    let store = InMemoryStore::new();
    store.set_reject_constraints(true);
    let err = incremental_insert(&store, "t", &recs(json!([{"id": 1}])), "id").unwrap_err();
    assert!(err.is_data_integrity());
    assert!(!store.table_exists("t").unwrap());
}

#[test]
fn key_missing_from_sample_is_configuration_error() {
    let store = InMemoryStore::new();
    let err = incremental_insert(&store, "t", &recs(json!([{"other": 1}])), "id").unwrap_err();
    assert!(matches!(err, StoreError::Configuration(_)));
    assert!(store.table_names().is_empty());
}

#[test]
fn new_fields_widen_existing_table() {
    let store = InMemoryStore::new();
    incremental_insert(&store, "t", &recs(json!([{"id": 1, "a": "x"}])), "id").unwrap();
    let report = incremental_insert(&store, "t", &recs(json!([{"id": 2, "a": "y", "b": 2.5}])), "id").unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(store.columns("t").unwrap(), vec!["id", "a", "b"]);
}

#[test]
fn connectivity_loss_surfaces_as_connection_error() {
    let store = InMemoryStore::new();
    store.set_offline(true);
    let err = incremental_insert(&store, "t", &recs(json!([{"id": 1}])), "id").unwrap_err();
    assert!(err.is_connection());
}

#[test]
fn incomplete_composite_keys_are_dropped_not_claimed() {
    use ledger_core::transform::concat_columns;
    use ledger_core::RecordCollection;

    let cols = vec!["CompanyId".to_string(), "Entry_No".to_string()];
    let keyed = |v: Value| {
        let c = RecordCollection::from_value(&v).expect("collection");
        concat_columns(&c, &cols, "_", "uid").into_records()
    };
    let store = InMemoryStore::new();

    let first = keyed(json!([{"CompanyId": "C1", "Entry_No": 1},
                             {"CompanyId": "C1", "Entry_No": null},
                             {"CompanyId": "C1"}]));
    let report = incremental_insert(&store, "ledger", &first, "uid").unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped_null_key, 2);
    assert_eq!(report.skipped_duplicates, 0);

    // "C1_" no quedó tomada por un registro incompleto
    let later = keyed(json!([{"CompanyId": "C1", "Entry_No": ""}]));
    let report = incremental_insert(&store, "ledger", &later, "uid").unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped_existing, 0);
    assert_eq!(store.row_count("ledger"), 2);
}
