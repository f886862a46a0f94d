//! # Courtline Engine - Incremental Court Aggregation
//!
//! **Purpose**: Fold an ordered stream of arbitration events into courts,
//! jurors, stakes, disputes, rounds, votes, arbitrables and global counters,
//! keeping every roll-up consistent after each event.
//!
//! Each event runs in its own `Aggregation` context over a staged overlay.
//! Handlers:
//!
//! - **`StakeAggregator`**: stake changes, juror status and stake roll-ups
//! - **`DisputeLifecycle`**: creation, draws, votes, periods and appeals
//! - **`RewardLedger`**: token and ETH shifts
//! - **`CourtAdministration`**: court creation, parameters, policies and
//!   governance refreshes
//!
//! `CourtHierarchy` resolves courts lazily and propagates deltas upward.
//! `Engine` dispatches events and checkpoints them; `AggregationWorker`
//! serializes application on a tokio task behind a shared store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Juror status classification
pub mod classifier;

/// Per-event aggregation context
pub mod context;

/// Guarded counter arithmetic
pub mod counters;

/// Dispute lifecycle handlers
pub mod dispute;

/// Event dispatch and checkpointing
pub mod engine;

/// Court creation, parameters, policies and governance
pub mod governance;

/// Court tree resolution and roll-ups
pub mod hierarchy;

/// Reward and penalty shifts
pub mod rewards;

/// Stake aggregation
pub mod stake;

/// Single-writer aggregation worker
pub mod worker;

pub use classifier::{JurorStatusClassifier, StakeObservation, StatusClass};
pub use context::Aggregation;
pub use counters::CounterScope;
pub use dispute::DisputeLifecycle;
pub use engine::{Engine, Outcome, ReplaySummary, StagedEvent};
pub use governance::CourtAdministration;
pub use hierarchy::{CourtHierarchy, JurorDelta};
pub use rewards::RewardLedger;
pub use stake::StakeAggregator;
pub use worker::{AggregationWorker, SharedStore, WorkerError, WorkerHandle};
