//! Aggregation worker
//!
//! A single task owns all writes. Events arrive over a bounded channel; each
//! one is staged under a read lock and committed under one write lock, so a
//! reader holding `SharedStore::read` always sees whole events.

use crate::engine::{Engine, Outcome, ReplaySummary};
use courtline_core::{ConfigOracle, EntityStore, EventEnvelope, MemoryStore};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Errors from talking to a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker stopped and no longer accepts events.
    #[error("aggregation worker is closed")]
    Closed,

    /// The worker task panicked or was cancelled.
    #[error("aggregation worker task failed: {0}")]
    Join(String),
}

/// Store shared between the worker and readers.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<RwLock<MemoryStore>>);

impl SharedStore {
    /// Wrap an existing store
    pub fn new(store: MemoryStore) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// Read access between events.
    pub fn read(&self) -> RwLockReadGuard<'_, MemoryStore> {
        self.0.read()
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> MemoryStore {
        self.0.read().clone()
    }
}

struct Submission {
    event: EventEnvelope,
    ack: Option<oneshot::Sender<Outcome>>,
}

/// Single-writer event applier.
pub struct AggregationWorker {
    engine: Engine,
    store: SharedStore,
    oracle: Arc<dyn ConfigOracle>,
}

impl AggregationWorker {
    /// Create a worker over `store`.
    pub fn new(engine: Engine, store: SharedStore, oracle: Arc<dyn ConfigOracle>) -> Self {
        Self {
            engine,
            store,
            oracle,
        }
    }

    /// Apply one event: stage under the read lock, commit under the write lock.
    pub fn apply_one(&self, event: &EventEnvelope) -> Outcome {
        let staged = {
            let guard = self.store.0.read();
            self.engine.stage(&*guard, self.oracle.as_ref(), event)
        };
        if let Some(batch) = staged.batch {
            self.store.0.write().commit(batch);
        }
        staged.outcome
    }

    /// Run the worker on the current tokio runtime.
    pub fn spawn(self) -> WorkerHandle {
        let (sender, receiver) = mpsc::channel(self.engine.config().channel_capacity);
        let task = tokio::spawn(self.run(receiver));
        WorkerHandle { sender, task }
    }

    async fn run(self, mut receiver: mpsc::Receiver<Submission>) -> ReplaySummary {
        let mut summary = ReplaySummary::default();
        while let Some(Submission { event, ack }) = receiver.recv().await {
            let outcome = self.apply_one(&event);
            summary.record(&outcome);
            if let Some(ack) = ack {
                // the submitter may have stopped waiting
                let _ = ack.send(outcome);
            }
        }
        info!(
            applied = summary.applied,
            skipped = summary.skipped,
            dropped = summary.dropped,
            "aggregation worker stopped"
        );
        summary
    }
}

/// Handle to a running worker.
pub struct WorkerHandle {
    sender: mpsc::Sender<Submission>,
    task: JoinHandle<ReplaySummary>,
}

impl WorkerHandle {
    /// Queue an event without waiting for it to apply.
    pub async fn submit(&self, event: EventEnvelope) -> Result<(), WorkerError> {
        self.sender
            .send(Submission { event, ack: None })
            .await
            .map_err(|_| WorkerError::Closed)
    }

    /// Queue an event and wait for its outcome.
    pub async fn apply(&self, event: EventEnvelope) -> Result<Outcome, WorkerError> {
        let (ack, outcome) = oneshot::channel();
        self.sender
            .send(Submission {
                event,
                ack: Some(ack),
            })
            .await
            .map_err(|_| WorkerError::Closed)?;
        outcome.await.map_err(|_| WorkerError::Closed)
    }

    /// Stop accepting events, drain the queue and return the totals.
    pub async fn shutdown(self) -> Result<ReplaySummary, WorkerError> {
        drop(self.sender);
        let summary = self
            .task
            .await
            .map_err(|err| WorkerError::Join(err.to_string()))?;
        debug!(applied = summary.applied, "worker drained");
        Ok(summary)
    }
}
