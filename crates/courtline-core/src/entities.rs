//! Derived entity records
//!
//! Every record here is materialized by the engine from the event stream and
//! persisted through an `EntityStore`. Records reference each other by id
//! only; a court does not own its parent and a vote does not own its round.

use crate::events::EventPosition;
use crate::ids::{Address, CourtId, DisputeId, H256};
use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Winning-choice value meaning "no ruling yet".
pub const PENDING_CHOICE: u64 = 0;

/// Dispute counters kept per court, per arbitrable and globally.
///
/// `evidence`..`appeal` are the open disputes currently in that period;
/// executed disputes only appear in `closed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeCounts {
    /// Disputes ever attributed here
    pub total: u64,
    /// Disputes not yet executed
    pub open: u64,
    /// Executed disputes
    pub closed: u64,
    /// Open disputes in the evidence period
    pub evidence: u64,
    /// Open disputes in the commit period
    pub commit: u64,
    /// Open disputes in the vote period
    pub vote: u64,
    /// Open disputes in the appeal period
    pub appeal: u64,
}

impl DisputeCounts {
    /// Counter for an open period; `None` for execution.
    pub fn bucket(&self, period: Period) -> Option<u64> {
        match period {
            Period::Evidence => Some(self.evidence),
            Period::Commit => Some(self.commit),
            Period::Vote => Some(self.vote),
            Period::Appeal => Some(self.appeal),
            Period::Execution => None,
        }
    }

    /// Mutable counter for an open period; `None` for execution.
    pub fn bucket_mut(&mut self, period: Period) -> Option<&mut u64> {
        match period {
            Period::Evidence => Some(&mut self.evidence),
            Period::Commit => Some(&mut self.commit),
            Period::Vote => Some(&mut self.vote),
            Period::Appeal => Some(&mut self.appeal),
            Period::Execution => None,
        }
    }

    /// Sum of the per-period buckets.
    pub fn in_periods(&self) -> u64 {
        self.evidence + self.commit + self.vote + self.appeal
    }
}

/// Court configuration snapshot taken from the oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtSettings {
    /// Whether votes are committed before being revealed
    pub hidden_votes: bool,
    /// Minimum stake to be drawn in this court
    pub min_stake: u128,
    /// Basis points of stake at risk per vote
    pub alpha: u64,
    /// Fee paid per juror
    pub fee_for_juror: u128,
    /// Juror count at which an appeal jumps to the parent court
    pub jurors_for_court_jump: u64,
    /// Seconds per period for evidence, commit, vote and appeal
    pub time_periods: [u64; 4],
}

/// A node of the court tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    /// Court id
    pub id: CourtId,
    /// Parent court; `None` only for the root
    pub parent: Option<CourtId>,
    /// Child court ids in materialization order
    pub children: Vec<CourtId>,
    /// Disputes owned by this court
    pub disputes: DisputeCounts,
    /// Distinct jurors with positive stake anywhere in this subtree
    pub active_jurors: u64,
    /// Stake held in this court and all descendants
    pub token_staked: u128,
    /// Stake held directly in this court
    pub direct_staked: u128,
    /// ETH paid out for disputes in this court
    pub total_eth_fees: u128,
    /// Positive token shifts for disputes in this court
    pub total_token_redistributed: u128,
    /// Linked policy record, keyed by court id
    pub policy: Option<CourtId>,
    /// Configuration snapshot
    pub settings: CourtSettings,
}

impl Court {
    /// Create an empty court
    pub fn new(id: CourtId, parent: Option<CourtId>, settings: CourtSettings) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            disputes: DisputeCounts::default(),
            active_jurors: 0,
            token_staked: 0,
            direct_staked: 0,
            total_eth_fees: 0,
            total_token_redistributed: 0,
            policy: None,
            settings,
        }
    }

    /// Whether this is the root of the tree
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A juror account.
///
/// Also created for dispute creators and drawn accounts that never staked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Juror {
    /// Account address
    pub id: Address,
    /// Total stake across all courts, as last reported
    pub total_staked: u128,
    /// Whether any stake event has been applied for this account
    pub has_staked: bool,
    /// Disputes created by this account
    pub disputes_created: u64,
    /// Distinct disputes this account was drawn into
    pub disputes_as_juror: u64,
    /// ETH rewards received
    pub eth_rewards: u128,
    /// Net token rewards (penalties are negative)
    pub token_rewards: i128,
    /// Courts where this juror currently holds stake
    pub courts: BTreeSet<CourtId>,
}

impl Juror {
    /// Create a juror with no history
    pub fn new(id: Address) -> Self {
        Self {
            id,
            total_staked: 0,
            has_staked: false,
            disputes_created: 0,
            disputes_as_juror: 0,
            eth_rewards: 0,
            token_rewards: 0,
            courts: BTreeSet::new(),
        }
    }

    /// A juror is active while it has stake anywhere.
    pub fn is_active(&self) -> bool {
        self.total_staked > 0
    }
}

/// Stake of one juror in one court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtStake {
    /// Juror address
    pub juror: Address,
    /// Court id
    pub court: CourtId,
    /// Current stake
    pub stake: u128,
    /// Block time of the last update
    pub timestamp: u64,
    /// Block number of the last update
    pub block_number: u64,
    /// Transaction of the last update
    pub tx_hash: H256,
}

/// An arbitration case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Dispute id
    pub id: DisputeId,
    /// Court currently ruling on the dispute
    pub court: CourtId,
    /// Contract that raised the dispute
    pub arbitrable: Address,
    /// Account that created the dispute
    pub creator: Address,
    /// Number of ruling options
    pub number_of_choices: u64,
    /// Current period
    pub period: Period,
    /// Ruling the arbitrator currently reports
    pub current_ruling: u64,
    /// Whether the ruling reached execution
    pub ruled: bool,
    /// Block time of creation
    pub start_time: u64,
    /// Block time of the last period change
    pub last_period_change: u64,
    /// Creation transaction
    pub tx_hash: H256,
    /// Jurors ever drawn into any round
    pub jurors_involved: BTreeSet<Address>,
    /// Number of rounds; the current round is `rounds - 1`
    pub rounds: u64,
}

impl Dispute {
    /// Highest round number.
    pub fn current_round(&self) -> u64 {
        self.rounds.saturating_sub(1)
    }
}

/// One voting cycle of a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Owning dispute
    pub dispute: DisputeId,
    /// Round number, starting at 0
    pub number: u64,
    /// Block time the round started
    pub start_time: u64,
    /// Winning choice, `PENDING_CHOICE` until known
    pub winning_choice: u64,
}

/// A juror's vote slot in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Owning dispute
    pub dispute: DisputeId,
    /// Round number
    pub round: u64,
    /// Slot within the round
    pub slot: u64,
    /// Drawn juror
    pub juror: Address,
    /// Whether a commitment was recorded
    pub committed: bool,
    /// Commitment hash
    pub commit: Option<H256>,
    /// Revealed or cast choice
    pub choice: Option<u64>,
    /// Reveal salt
    pub salt: Option<H256>,
    /// Whether the vote was cast
    pub voted: bool,
    /// Block time of the last update
    pub timestamp: u64,
}

impl Vote {
    /// Placeholder written when a juror is drawn.
    pub fn drawn(dispute: DisputeId, round: u64, slot: u64, juror: Address, timestamp: u64) -> Self {
        Self {
            dispute,
            round,
            slot,
            juror,
            committed: false,
            commit: None,
            choice: None,
            salt: None,
            voted: false,
            timestamp,
        }
    }
}

/// An external contract that raises disputes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arbitrable {
    /// Contract address
    pub id: Address,
    /// Disputes raised by this contract
    pub disputes: DisputeCounts,
    /// ETH fees paid for its disputes
    pub eth_fees: u128,
}

impl Arbitrable {
    /// Create an arbitrable with no disputes
    pub fn new(id: Address) -> Self {
        Self {
            id,
            disputes: DisputeCounts::default(),
            eth_fees: 0,
        }
    }
}

/// System-wide roll-up counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCounters {
    /// Materialized courts
    pub courts_count: u64,
    /// Disputes by lifecycle state
    pub disputes: DisputeCounts,
    /// Jurors with positive total stake
    pub active_jurors: u64,
    /// Jurors that staked and later withdrew everything
    pub inactive_jurors: u64,
    /// Jurors drawn at least once
    pub drawn_jurors: u64,
    /// Arbitrable contracts seen
    pub arbitrables_count: u64,
    /// Stake across all courts
    pub token_staked: u128,
    /// ETH paid out to jurors
    pub total_eth_fees: u128,
    /// Positive token shifts
    pub total_token_redistributed: u128,
}

/// Policy document registered for a court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    /// Court the policy applies to
    pub court: CourtId,
    /// Policy URI
    pub policy: String,
    /// Block time of the update
    pub timestamp: u64,
    /// Block number of the update
    pub block_number: u64,
}

/// Audit record of a stake event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeSet {
    /// Event position
    pub position: EventPosition,
    /// Juror address
    pub juror: Address,
    /// Court id
    pub court: CourtId,
    /// Stake in the court after the event
    pub stake: u128,
    /// Juror total after the event
    pub new_total: u128,
    /// Block time
    pub timestamp: u64,
}

/// Audit record of a juror draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    /// Dispute id
    pub dispute: DisputeId,
    /// Round number
    pub round: u64,
    /// Vote slot
    pub slot: u64,
    /// Drawn juror
    pub juror: Address,
    /// Block time
    pub timestamp: u64,
}

/// Audit record of a period change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    /// Event position
    pub position: EventPosition,
    /// Dispute id
    pub dispute: DisputeId,
    /// Period entered
    pub period: Period,
}

/// Audit record of a reward or penalty shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardShift {
    /// Event position
    pub position: EventPosition,
    /// Dispute id
    pub dispute: DisputeId,
    /// Juror address
    pub juror: Address,
    /// Token amount; negative for penalties
    pub token_amount: i128,
    /// ETH amount
    pub eth_amount: u128,
    /// Block time
    pub timestamp: u64,
}

/// Position of the last consumed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last consumed position
    pub position: EventPosition,
    /// Events consumed so far, applied or dropped
    pub consumed: u64,
}
