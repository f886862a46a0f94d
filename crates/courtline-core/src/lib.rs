//! # Courtline Core - Domain Types
//!
//! **Purpose**: Define the derived entities, the event vocabulary and the
//! collaborator seams used by the aggregation engine.
//!
//! This crate holds no aggregation logic. It provides:
//!
//! - **Identifiers**: `CourtId`, `DisputeId`, `Address`, `H256`
//! - **Entities**: `Court`, `Juror`, `CourtStake`, `Dispute`, `Round`, `Vote`,
//!   `Arbitrable`, `GlobalCounters` and the audit records
//! - **Events**: `EventEnvelope` carrying `EventMeta` and an `EventKind`
//! - **Store**: the `EntityStore` trait, `MemoryStore` and the per-event
//!   `StagedStore` overlay
//! - **Oracle**: the read-only `ConfigOracle` trait
//! - **Configuration**: `EngineConfig` loaded from TOML
//!
//! ## What's NOT in this crate
//!
//! - Event handlers and invariant maintenance (belong in `courtline-engine`)
//! - Test doubles (belong in `courtline-testkit`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Engine configuration
pub mod config;

/// Derived entity records
pub mod entities;

/// Error taxonomy shared by the engine
pub mod error;

/// Event vocabulary consumed by the engine
pub mod events;

/// JSON-lines event feeds
pub mod feed;

/// Identifier newtypes
pub mod ids;

/// Read-only configuration oracle seam
pub mod oracle;

/// Dispute periods
pub mod period;

/// Keyed entity storage
pub mod store;

pub use config::{ConfigError, EngineConfig};
pub use entities::{
    Arbitrable, Checkpoint, Court, CourtSettings, CourtStake, Dispute, DisputeCounts, Draw,
    GlobalCounters, Juror, PhaseChange, PolicyUpdate, RewardShift, Round, StakeSet, Vote,
    PENDING_CHOICE,
};
pub use error::{EngineError, Result};
pub use events::{CourtParameter, EventEnvelope, EventKind, EventMeta, EventPosition};
pub use feed::{EventFeed, FeedError};
pub use ids::{Address, CourtId, DisputeId, IdParseError, H256};
pub use oracle::{ConfigOracle, CourtConfig, DisputeSnapshot, OracleError};
pub use period::Period;
pub use store::{Entity, EntityKey, EntityStore, MemoryStore, StagedStore, StoredEntity, WriteBatch};
