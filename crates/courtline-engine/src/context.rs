//! Per-event aggregation context
//!
//! One `Aggregation` exists per event. It owns the staged overlay and a
//! working copy of the global counters; handlers read and write through it
//! and never touch the base store.

use courtline_core::{
    Address, Arbitrable, ConfigOracle, Court, CourtId, CourtStake, Dispute, DisputeId,
    DisputeSnapshot, EngineConfig, EntityKey, EntityStore, EventMeta, GlobalCounters, Juror, Round,
    StagedStore, StoredEntity, Vote, WriteBatch, PENDING_CHOICE,
};
use tracing::warn;

/// Working state for one event.
pub struct Aggregation<'a> {
    pub(crate) store: StagedStore<'a>,
    pub(crate) oracle: &'a dyn ConfigOracle,
    pub(crate) config: &'a EngineConfig,
    pub(crate) meta: &'a EventMeta,
    pub(crate) counters: GlobalCounters,
}

impl<'a> Aggregation<'a> {
    /// Open a context over `base` for the event described by `meta`.
    pub fn begin(
        base: &'a dyn EntityStore,
        oracle: &'a dyn ConfigOracle,
        config: &'a EngineConfig,
        meta: &'a EventMeta,
    ) -> Self {
        let store = StagedStore::new(base);
        let counters = store
            .get::<GlobalCounters>(&EntityKey::Counters)
            .unwrap_or_default();
        Self {
            store,
            oracle,
            config,
            meta,
            counters,
        }
    }

    /// Write the counters back and hand over the staged writes.
    pub fn finish(mut self) -> WriteBatch {
        let counters = std::mem::take(&mut self.counters);
        self.store.put(counters);
        self.store.into_batch()
    }

    /// Current working counters
    pub fn counters(&self) -> &GlobalCounters {
        &self.counters
    }

    /// Metadata of the event being applied
    pub fn meta(&self) -> &EventMeta {
        self.meta
    }

    pub(crate) fn put<T: StoredEntity>(&mut self, value: T) {
        self.store.put(value);
    }

    pub(crate) fn court(&self, id: CourtId) -> Option<Court> {
        self.store.get(&EntityKey::Court(id))
    }

    pub(crate) fn juror(&self, id: Address) -> Option<Juror> {
        self.store.get(&EntityKey::Juror(id))
    }

    pub(crate) fn juror_or_new(&self, id: Address) -> Juror {
        self.juror(id).unwrap_or_else(|| Juror::new(id))
    }

    pub(crate) fn court_stake(&self, juror: Address, court: CourtId) -> Option<CourtStake> {
        self.store.get(&EntityKey::court_stake(juror, court))
    }

    pub(crate) fn dispute(&self, id: DisputeId) -> Option<Dispute> {
        self.store.get(&EntityKey::Dispute(id))
    }

    pub(crate) fn round(&self, dispute: DisputeId, number: u64) -> Option<Round> {
        self.store.get(&EntityKey::round(dispute, number))
    }

    pub(crate) fn vote(&self, dispute: DisputeId, round: u64, slot: u64) -> Option<Vote> {
        self.store.get(&EntityKey::vote(dispute, round, slot))
    }

    pub(crate) fn arbitrable(&self, id: Address) -> Option<Arbitrable> {
        self.store.get(&EntityKey::Arbitrable(id))
    }

    /// Dispute snapshot, or the neutral snapshot rooted at the configured
    /// root court when the oracle cannot answer.
    pub(crate) fn dispute_snapshot(&self, dispute: DisputeId) -> DisputeSnapshot {
        match self.oracle.dispute_snapshot(dispute) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(dispute = %dispute, error = %err, "dispute snapshot unavailable, using neutral default");
                DisputeSnapshot::neutral(self.config.root_court, self.meta.block_time)
            }
        }
    }

    /// Current ruling, 0 when the oracle cannot answer.
    pub(crate) fn current_ruling(&self, dispute: DisputeId) -> u64 {
        self.oracle.current_ruling(dispute).unwrap_or_else(|err| {
            warn!(dispute = %dispute, error = %err, "current ruling unavailable");
            0
        })
    }

    /// Winning choice of a round, pending when the oracle cannot answer.
    pub(crate) fn winning_choice(&self, dispute: DisputeId, round: u64) -> u64 {
        self.oracle
            .round_winning_choice(dispute, round)
            .unwrap_or_else(|err| {
                warn!(dispute = %dispute, round, error = %err, "winning choice unavailable");
                PENDING_CHOICE
            })
    }
}
