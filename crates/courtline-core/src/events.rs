//! Event vocabulary
//!
//! Events arrive from an ordered feed. Each carries its block metadata and a
//! typed payload. The total order is `(block_number, log_index)`.
//!
//! Stake events carry the juror's new stake in the court and the new total
//! across all courts, both as absolute values reported by the arbitrator.

use crate::ids::{Address, CourtId, DisputeId, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total-order position of an event in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventPosition {
    /// Block number
    pub block_number: u64,
    /// Position within the block
    pub log_index: u32,
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}

/// Block and transaction metadata of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Block number
    pub block_number: u64,
    /// Position within the block
    pub log_index: u32,
    /// Block timestamp in seconds
    pub block_time: u64,
    /// Emitting transaction
    pub tx_hash: H256,
}

impl EventMeta {
    /// Total-order position
    pub fn position(&self) -> EventPosition {
        EventPosition {
            block_number: self.block_number,
            log_index: self.log_index,
        }
    }
}

/// A court configuration field changed by governance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtParameter {
    /// Minimum stake
    MinStake(u128),
    /// Stake-at-risk coefficient
    Alpha(u64),
    /// Fee per juror
    FeeForJuror(u128),
    /// Juror threshold for jumping to the parent court
    JurorsForCourtJump(u64),
    /// Seconds per period
    TimesPerPeriod([u64; 4]),
}

/// Typed event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A juror set its stake in a court
    StakeChanged {
        /// Juror address
        juror: Address,
        /// Court id
        court: CourtId,
        /// Stake in this court after the change
        new_stake: u128,
        /// Juror total across all courts after the change
        new_total: u128,
    },
    /// A dispute was created
    DisputeCreated {
        /// Dispute id
        dispute: DisputeId,
        /// Arbitrable contract
        arbitrable: Address,
        /// Transaction sender
        creator: Address,
    },
    /// A juror was drawn into a round
    JurorDrawn {
        /// Dispute id
        dispute: DisputeId,
        /// Round number
        round: u64,
        /// Vote slot
        slot: u64,
        /// Drawn juror
        juror: Address,
    },
    /// Hidden votes were committed
    VoteCommitted {
        /// Dispute id
        dispute: DisputeId,
        /// Vote slots in the current round
        slots: Vec<u64>,
        /// Commitment hash
        commit: H256,
    },
    /// Votes were cast or revealed
    VoteCast {
        /// Dispute id
        dispute: DisputeId,
        /// Vote slots in the current round
        slots: Vec<u64>,
        /// Chosen ruling
        choice: u64,
        /// Reveal salt
        salt: H256,
    },
    /// A dispute entered a new period
    PeriodChanged {
        /// Dispute id
        dispute: DisputeId,
        /// Numeric period (0-4)
        period: u8,
    },
    /// A ruling was appealed
    DisputeAppealed {
        /// Dispute id
        dispute: DisputeId,
    },
    /// A court was created
    CourtCreated {
        /// New court id
        court: CourtId,
    },
    /// A court configuration field changed
    CourtParameterChanged {
        /// Court id
        court: CourtId,
        /// Changed field and its new value
        parameter: CourtParameter,
    },
    /// Tokens and ETH were shifted to or from a juror
    RewardsDistributed {
        /// Dispute id
        dispute: DisputeId,
        /// Juror address
        juror: Address,
        /// Token amount; negative for penalties
        token_amount: i128,
        /// ETH amount
        eth_amount: u128,
    },
    /// A court policy document was registered
    PolicyUpdated {
        /// Court id
        court: CourtId,
        /// Policy URI
        policy: String,
    },
    /// A governance transaction list executed; court settings may have changed
    GovernanceExecuted,
}

impl EventKind {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::StakeChanged { .. } => "stake_changed",
            EventKind::DisputeCreated { .. } => "dispute_created",
            EventKind::JurorDrawn { .. } => "juror_drawn",
            EventKind::VoteCommitted { .. } => "vote_committed",
            EventKind::VoteCast { .. } => "vote_cast",
            EventKind::PeriodChanged { .. } => "period_changed",
            EventKind::DisputeAppealed { .. } => "dispute_appealed",
            EventKind::CourtCreated { .. } => "court_created",
            EventKind::CourtParameterChanged { .. } => "court_parameter_changed",
            EventKind::RewardsDistributed { .. } => "rewards_distributed",
            EventKind::PolicyUpdated { .. } => "policy_updated",
            EventKind::GovernanceExecuted => "governance_executed",
        }
    }
}

/// An event with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Block and transaction metadata
    pub meta: EventMeta,
    /// Payload
    pub kind: EventKind,
}

impl EventEnvelope {
    /// Create an envelope
    pub fn new(meta: EventMeta, kind: EventKind) -> Self {
        Self { meta, kind }
    }

    /// Total-order position
    pub fn position(&self) -> EventPosition {
        self.meta.position()
    }
}
