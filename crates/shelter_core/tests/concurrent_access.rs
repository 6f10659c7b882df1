use shelter_core::{
    Classifier, Column, Projection, RecordProvider, RecordStore, RecordValues, Selection,
    SortOrder,
};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 4;
const ROUNDS: usize = 50;

fn assert_send_sync<T: Send + Sync>() {}

fn sample(worker: usize, round: usize) -> RecordValues {
    RecordValues::new()
        .with(Column::Name, format!("worker-{worker}-{round}"))
        .with(Column::Classifier, Classifier::B)
        .with(Column::Measure, round as i64)
}

/// Runs interleaved inserts and collection queries from several threads and
/// returns every error message seen.
fn run_mixed_load(provider: &Arc<RecordProvider>) -> Vec<String> {
    let workers = (0..THREADS)
        .map(|worker| {
            let provider = Arc::clone(provider);
            thread::spawn(move || {
                let mut errors = Vec::new();
                for round in 0..ROUNDS {
                    if let Err(err) = provider.insert("records", &sample(worker, round)) {
                        errors.push(format!("insert: {err}"));
                    }
                    if let Err(err) = provider.query(
                        "records",
                        &Projection::of(&[Column::Id]),
                        &Selection::all(),
                        &SortOrder::default(),
                    ) {
                        errors.push(format!("query: {err}"));
                    }
                }
                errors
            })
        })
        .collect::<Vec<_>>();

    workers
        .into_iter()
        .flat_map(|worker| worker.join().expect("worker thread panicked"))
        .collect()
}

fn record_count(provider: &RecordProvider) -> usize {
    provider
        .query(
            "records",
            &Projection::of(&[Column::Id]),
            &Selection::all(),
            &SortOrder::default(),
        )
        .unwrap()
        .len()
}

#[test]
fn provider_is_shareable_across_threads() {
    assert_send_sync::<RecordProvider>();
    assert_send_sync::<RecordStore>();
}

#[test]
fn memory_store_handles_concurrent_inserts_and_queries() {
    let provider = Arc::new(RecordProvider::new(RecordStore::open_in_memory().unwrap()));

    let errors = run_mixed_load(&provider);
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert_eq!(record_count(&provider), THREADS * ROUNDS);
}

#[test]
fn file_store_handles_concurrent_inserts_and_queries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shelter.db");
    let provider = Arc::new(RecordProvider::new(RecordStore::open_file(&path).unwrap()));

    let errors = run_mixed_load(&provider);
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert_eq!(record_count(&provider), THREADS * ROUNDS);
}

#[test]
fn concurrent_inserts_receive_distinct_ids() {
    let provider = Arc::new(RecordProvider::new(RecordStore::open_in_memory().unwrap()));

    let workers = (0..THREADS)
        .map(|worker| {
            let provider = Arc::clone(&provider);
            thread::spawn(move || {
                (0..ROUNDS)
                    .map(|round| {
                        provider
                            .insert("records", &sample(worker, round))
                            .unwrap()
                            .item_id()
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect::<Vec<_>>();

    let mut ids = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect::<Vec<_>>();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREADS * ROUNDS);
}
