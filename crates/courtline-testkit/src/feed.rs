//! Event feed builder
//!
//! Assigns each event its own block so positions are strictly increasing,
//! and tracks juror stakes so stake events carry a consistent total.

use courtline_core::{
    Address, CourtId, CourtParameter, DisputeId, EventEnvelope, EventKind, EventMeta, Period, H256,
};
use std::collections::BTreeMap;

/// Block time of block 0.
pub const GENESIS_TIME: u64 = 1_600_000_000;

/// Seconds between blocks.
pub const BLOCK_INTERVAL: u64 = 15;

/// Metadata for the event in block `block_number`.
pub fn meta_at(block_number: u64) -> EventMeta {
    let mut tx = [0u8; 32];
    tx[24..].copy_from_slice(&block_number.to_be_bytes());
    EventMeta {
        block_number,
        log_index: 0,
        block_time: GENESIS_TIME + BLOCK_INTERVAL * block_number,
        tx_hash: H256::from_bytes(tx),
    }
}

/// Builds an ordered event list.
#[derive(Debug, Clone)]
pub struct FeedBuilder {
    next_block: u64,
    stakes: BTreeMap<(Address, CourtId), u128>,
    events: Vec<EventEnvelope>,
}

impl Default for FeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedBuilder {
    /// Start at block 1.
    pub fn new() -> Self {
        Self {
            next_block: 1,
            stakes: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Append an event in the next block.
    pub fn push(&mut self, kind: EventKind) -> &mut Self {
        let meta = meta_at(self.next_block);
        self.next_block += 1;
        self.events.push(EventEnvelope::new(meta, kind));
        self
    }

    /// Total stake of a juror across courts, as tracked so far.
    pub fn total_of(&self, juror: Address) -> u128 {
        self.stakes
            .iter()
            .filter(|((owner, _), _)| *owner == juror)
            .map(|(_, stake)| *stake)
            .sum()
    }

    /// Set a juror's stake in a court; the total is derived.
    pub fn stake(&mut self, juror: Address, court: impl Into<CourtId>, amount: u128) -> &mut Self {
        let court = court.into();
        self.stakes.insert((juror, court), amount);
        let new_total = self.total_of(juror);
        self.push(EventKind::StakeChanged {
            juror,
            court,
            new_stake: amount,
            new_total,
        })
    }

    /// Create a dispute.
    pub fn create_dispute(
        &mut self,
        dispute: impl Into<DisputeId>,
        arbitrable: Address,
        creator: Address,
    ) -> &mut Self {
        self.push(EventKind::DisputeCreated {
            dispute: dispute.into(),
            arbitrable,
            creator,
        })
    }

    /// Draw a juror.
    pub fn draw(
        &mut self,
        dispute: impl Into<DisputeId>,
        round: u64,
        slot: u64,
        juror: Address,
    ) -> &mut Self {
        self.push(EventKind::JurorDrawn {
            dispute: dispute.into(),
            round,
            slot,
            juror,
        })
    }

    /// Commit hidden votes.
    pub fn commit(&mut self, dispute: impl Into<DisputeId>, slots: &[u64], commit: H256) -> &mut Self {
        self.push(EventKind::VoteCommitted {
            dispute: dispute.into(),
            slots: slots.to_vec(),
            commit,
        })
    }

    /// Cast votes.
    pub fn cast(&mut self, dispute: impl Into<DisputeId>, slots: &[u64], choice: u64) -> &mut Self {
        self.push(EventKind::VoteCast {
            dispute: dispute.into(),
            slots: slots.to_vec(),
            choice,
            salt: H256::repeat_byte(0x5a),
        })
    }

    /// Enter a period.
    pub fn period(&mut self, dispute: impl Into<DisputeId>, period: Period) -> &mut Self {
        self.raw_period(dispute, period.number())
    }

    /// Enter a period by raw number.
    pub fn raw_period(&mut self, dispute: impl Into<DisputeId>, number: u8) -> &mut Self {
        self.push(EventKind::PeriodChanged {
            dispute: dispute.into(),
            period: number,
        })
    }

    /// Appeal a dispute.
    pub fn appeal(&mut self, dispute: impl Into<DisputeId>) -> &mut Self {
        self.push(EventKind::DisputeAppealed {
            dispute: dispute.into(),
        })
    }

    /// Create a court.
    pub fn court_created(&mut self, court: impl Into<CourtId>) -> &mut Self {
        self.push(EventKind::CourtCreated {
            court: court.into(),
        })
    }

    /// Change a court parameter.
    pub fn parameter(&mut self, court: impl Into<CourtId>, parameter: CourtParameter) -> &mut Self {
        self.push(EventKind::CourtParameterChanged {
            court: court.into(),
            parameter,
        })
    }

    /// Shift tokens and ETH to a juror.
    pub fn reward(
        &mut self,
        dispute: impl Into<DisputeId>,
        juror: Address,
        token_amount: i128,
        eth_amount: u128,
    ) -> &mut Self {
        self.push(EventKind::RewardsDistributed {
            dispute: dispute.into(),
            juror,
            token_amount,
            eth_amount,
        })
    }

    /// Register a court policy.
    pub fn policy(&mut self, court: impl Into<CourtId>, policy: &str) -> &mut Self {
        self.push(EventKind::PolicyUpdated {
            court: court.into(),
            policy: policy.to_owned(),
        })
    }

    /// Signal a governance execution.
    pub fn governance(&mut self) -> &mut Self {
        self.push(EventKind::GovernanceExecuted)
    }

    /// Events built so far.
    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Copy of the events built so far.
    pub fn build(&self) -> Vec<EventEnvelope> {
        self.events.clone()
    }
}
