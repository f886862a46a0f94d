//! Read-only configuration oracle
//!
//! The oracle answers point-in-time questions about the arbitrator contract
//! that events do not carry: court configuration and parentage, dispute
//! snapshots, current rulings and round outcomes. Implementations are expected
//! to answer for the block of the event being applied.

use crate::entities::CourtSettings;
use crate::ids::{CourtId, DisputeId};
use thiserror::Error;

/// Errors returned by an oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The arbitrator has no such court.
    #[error("unknown court {0}")]
    UnknownCourt(CourtId),

    /// The oracle could not answer right now.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Court parent and configuration.
///
/// The root court reports itself as its own parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtConfig {
    /// Parent court id
    pub parent: CourtId,
    /// Configuration fields
    pub settings: CourtSettings,
}

/// Dispute state read at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeSnapshot {
    /// Owning court
    pub court: CourtId,
    /// Number of ruling options
    pub number_of_choices: u64,
    /// Numeric period
    pub period: u8,
    /// Block time of the last period change
    pub last_period_change: u64,
    /// Whether the dispute is ruled
    pub ruled: bool,
}

impl DisputeSnapshot {
    /// Snapshot used when the oracle cannot answer: owned by `root`, no
    /// choices, last changed at `at`.
    pub fn neutral(root: CourtId, at: u64) -> Self {
        Self {
            court: root,
            number_of_choices: 0,
            period: 0,
            last_period_change: at,
            ruled: false,
        }
    }
}

/// Read-only view of the arbitrator contract.
pub trait ConfigOracle: Send + Sync {
    /// Parent and configuration of a court.
    fn court_config(&self, court: CourtId) -> Result<CourtConfig, OracleError>;

    /// Snapshot of a dispute.
    fn dispute_snapshot(&self, dispute: DisputeId) -> Result<DisputeSnapshot, OracleError>;

    /// Ruling the arbitrator currently reports for a dispute.
    fn current_ruling(&self, dispute: DisputeId) -> Result<u64, OracleError>;

    /// Winning choice of a round; 0 while pending.
    fn round_winning_choice(&self, dispute: DisputeId, round: u64) -> Result<u64, OracleError>;
}
