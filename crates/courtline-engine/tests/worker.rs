//! Aggregation worker tests

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use courtline_core::{ConfigOracle, CourtId, EngineError, MemoryStore};
use courtline_engine::{AggregationWorker, Engine, Outcome, SharedStore, WorkerError};
use courtline_testkit::{
    arbitrable, assert_consistent, creator, init_test_tracing, juror, FeedBuilder, ScriptedOracle,
    STANDARD_TREE,
};
use std::sync::Arc;

fn oracle() -> Arc<ScriptedOracle> {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    oracle.set_dispute_court(1, 2);
    Arc::new(oracle)
}

fn feed() -> FeedBuilder {
    let mut feed = FeedBuilder::new();
    feed.stake(juror(1), 4, 100)
        .stake(juror(2), 6, 40)
        .create_dispute(1, arbitrable(1), creator(1))
        .draw(1, 0, 0, juror(1))
        .stake(juror(3), 77, 5)
        .stake(juror(1), 4, 0);
    feed
}

#[tokio::test]
async fn test_worker_matches_direct_replay() {
    init_test_tracing();
    let oracle = oracle();
    let feed = feed();

    let mut expected = MemoryStore::new();
    Engine::default().replay(&mut expected, oracle.as_ref(), feed.events());

    let store = SharedStore::default();
    let shared: Arc<dyn ConfigOracle> = oracle.clone();
    let handle = AggregationWorker::new(Engine::default(), store.clone(), shared).spawn();
    for event in feed.build() {
        handle.submit(event).await.unwrap();
    }
    let summary = handle.shutdown().await.unwrap();

    assert_eq!(summary.applied, 5);
    assert_eq!(summary.dropped, 1);
    assert_eq!(store.snapshot(), expected);
    assert_consistent(&store.read());
}

#[tokio::test]
async fn test_apply_reports_outcome() {
    init_test_tracing();
    let store = SharedStore::default();
    let handle = AggregationWorker::new(Engine::default(), store.clone(), oracle()).spawn();
    let events = feed().build();

    assert_eq!(handle.apply(events[0].clone()).await.unwrap(), Outcome::Applied);
    assert_eq!(
        handle.apply(events[0].clone()).await.unwrap(),
        Outcome::AlreadyApplied
    );
    assert_matches!(
        handle.apply(events[4].clone()).await.unwrap(),
        Outcome::Dropped(EngineError::UnknownCourt { court }) if court == CourtId::new(77)
    );
    assert_eq!(store.read().all::<courtline_core::Court>().len(), 4);

    let summary = handle.shutdown().await.unwrap();
    assert_eq!((summary.applied, summary.skipped, summary.dropped), (1, 1, 1));
}

#[test]
fn test_apply_one_without_runtime_task() {
    let store = SharedStore::default();
    let worker = AggregationWorker::new(Engine::default(), store.clone(), oracle());
    for event in feed().events() {
        worker.apply_one(event);
    }
    assert_consistent(&store.read());
}

#[test]
fn test_closed_error_message() {
    assert_eq!(WorkerError::Closed.to_string(), "aggregation worker is closed");
}
