use shelter_core::{
    Column, Projection, ProviderError, RecordProvider, RecordStore, RecordValues, ResourceId,
    Selection, SortOrder,
};
use std::sync::Arc;

const MALFORMED: [&str; 6] = [
    "records/",
    "records/abc",
    "other",
    "records/1/extra",
    "records/99999999999999999999",
    "content://elsewhere/records",
];

fn provider() -> RecordProvider {
    RecordProvider::new(RecordStore::open_in_memory().unwrap())
}

fn assert_unsupported<T: std::fmt::Debug>(result: Result<T, ProviderError>, raw: &str) {
    match result {
        Err(ProviderError::UnsupportedIdentifier(text)) => assert_eq!(text, raw),
        other => panic!("`{raw}` should be unsupported, got {other:?}"),
    }
}

#[test]
fn malformed_identifiers_fail_every_operation() {
    let provider = provider();
    let values = RecordValues::new()
        .with(Column::Name, "Toto")
        .with(Column::Classifier, 1_i64);

    for raw in MALFORMED {
        assert_unsupported(
            provider.query(
                raw,
                &Projection::all(),
                &Selection::all(),
                &SortOrder::default(),
            ),
            raw,
        );
        assert_unsupported(provider.insert(raw, &values), raw);
        assert_unsupported(provider.update(raw, &values, &Selection::all()), raw);
        assert_unsupported(
            provider.update(raw, &RecordValues::new(), &Selection::all()),
            raw,
        );
        assert_unsupported(provider.delete(raw, &Selection::all()), raw);
        assert_unsupported(provider.type_of(raw), raw);
        assert_unsupported(
            provider.subscribe(raw, false, Arc::new(|_changed: ResourceId| {})),
            raw,
        );
    }
}

#[test]
fn identifier_errors_win_over_payload_errors() {
    let provider = provider();
    let err = provider
        .insert("records/abc", &RecordValues::new())
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnsupportedIdentifier(_)));
}

#[test]
fn authority_qualified_identifiers_are_accepted() {
    let provider = provider();
    let values = RecordValues::new()
        .with(Column::Name, "Toto")
        .with(Column::Classifier, 2_i64);

    let item = provider
        .insert("content://com.example.shelter/records", &values)
        .unwrap();
    let qualified = format!("content://com.example.shelter/{item}");
    let cursor = provider
        .query(
            &qualified,
            &Projection::all(),
            &Selection::all(),
            &SortOrder::default(),
        )
        .unwrap();
    assert_eq!(cursor.len(), 1);
    assert_eq!(cursor.notification_id(), item);
}

#[test]
fn resolve_classifies_without_store_access() {
    let provider = provider();
    assert!(provider.resolve("records").is_ok());
    assert!(provider.resolve("records/0").is_ok());
    assert!(provider.resolve("records/").is_err());
}
