//! Event fold
//!
//! `Engine::apply` is one step of `state' = apply(state, event)`. The event is
//! dispatched to exactly one handler running against a staged overlay; the
//! overlay is committed as one batch on success and discarded on failure.
//! Either way the checkpoint advances, so a replay sees the same drops.

use crate::context::Aggregation;
use crate::dispute::DisputeLifecycle;
use crate::governance::CourtAdministration;
use crate::rewards::RewardLedger;
use crate::stake::StakeAggregator;
use courtline_core::{
    Checkpoint, ConfigOracle, EngineConfig, EngineError, EntityKey, EntityStore, EventEnvelope,
    EventKind, Result, StoredEntity, WriteBatch,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event's writes were committed
    Applied,
    /// The event is at or before the checkpoint
    AlreadyApplied,
    /// The event failed; only the checkpoint advanced
    Dropped(EngineError),
}

impl Outcome {
    /// Whether the event's writes were committed
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// Counts of outcomes over a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Events committed
    pub applied: u64,
    /// Events skipped by the checkpoint
    pub skipped: u64,
    /// Events dropped by an error
    pub dropped: u64,
}

impl ReplaySummary {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::AlreadyApplied => self.skipped += 1,
            Outcome::Dropped(_) => self.dropped += 1,
        }
    }
}

/// An evaluated event whose writes have not been committed yet.
#[derive(Debug)]
pub struct StagedEvent {
    /// What happened
    pub outcome: Outcome,
    /// Writes to commit; `None` when nothing changes
    pub batch: Option<WriteBatch>,
}

/// The aggregation engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stored replay checkpoint, if any event was consumed.
    pub fn checkpoint(store: &dyn EntityStore) -> Option<Checkpoint> {
        store
            .load(&EntityKey::Checkpoint)
            .and_then(Checkpoint::from_entity)
    }

    /// Evaluate an event against `store` without writing to it.
    pub fn stage(
        &self,
        store: &dyn EntityStore,
        oracle: &dyn ConfigOracle,
        event: &EventEnvelope,
    ) -> StagedEvent {
        let position = event.position();
        let checkpoint = Self::checkpoint(store);

        if let Some(checkpoint) = checkpoint {
            if self.config.skip_applied && position <= checkpoint.position {
                debug!(position = %position, checkpoint = %checkpoint.position, "event already applied");
                return StagedEvent {
                    outcome: Outcome::AlreadyApplied,
                    batch: None,
                };
            }
        }

        let next_checkpoint = Checkpoint {
            position: checkpoint.map_or(position, |c| c.position.max(position)),
            consumed: checkpoint.map_or(0, |c| c.consumed).saturating_add(1),
        };

        let mut ctx = Aggregation::begin(store, oracle, &self.config, &event.meta);
        match Self::dispatch(&mut ctx, &event.kind) {
            Ok(()) => {
                ctx.put(next_checkpoint);
                debug!(position = %position, event = event.kind.name(), "event applied");
                StagedEvent {
                    outcome: Outcome::Applied,
                    batch: Some(ctx.finish()),
                }
            }
            Err(err) => {
                warn!(
                    position = %position,
                    event = event.kind.name(),
                    error_kind = err.kind(),
                    error = %err,
                    "event dropped"
                );
                let mut batch = WriteBatch::new();
                batch.put(next_checkpoint);
                StagedEvent {
                    outcome: Outcome::Dropped(err),
                    batch: Some(batch),
                }
            }
        }
    }

    /// Apply one event to `store`.
    pub fn apply(
        &self,
        store: &mut dyn EntityStore,
        oracle: &dyn ConfigOracle,
        event: &EventEnvelope,
    ) -> Outcome {
        let staged = self.stage(&*store, oracle, event);
        if let Some(batch) = staged.batch {
            store.commit(batch);
        }
        staged.outcome
    }

    /// Apply events in order.
    pub fn replay(
        &self,
        store: &mut dyn EntityStore,
        oracle: &dyn ConfigOracle,
        events: &[EventEnvelope],
    ) -> ReplaySummary {
        let mut summary = ReplaySummary::default();
        for event in events {
            let outcome = self.apply(store, oracle, event);
            summary.record(&outcome);
        }
        debug!(
            applied = summary.applied,
            skipped = summary.skipped,
            dropped = summary.dropped,
            "replay finished"
        );
        summary
    }

    fn dispatch(ctx: &mut Aggregation<'_>, kind: &EventKind) -> Result<()> {
        match kind {
            EventKind::StakeChanged {
                juror,
                court,
                new_stake,
                new_total,
            } => StakeAggregator::apply_stake(ctx, *juror, *court, *new_stake, *new_total)
                .map(|_| ()),
            EventKind::DisputeCreated {
                dispute,
                arbitrable,
                creator,
            } => DisputeLifecycle::create(ctx, *dispute, *arbitrable, *creator),
            EventKind::JurorDrawn {
                dispute,
                round,
                slot,
                juror,
            } => DisputeLifecycle::draw(ctx, *dispute, *round, *slot, *juror),
            EventKind::VoteCommitted {
                dispute,
                slots,
                commit,
            } => DisputeLifecycle::commit(ctx, *dispute, slots, *commit),
            EventKind::VoteCast {
                dispute,
                slots,
                choice,
                salt,
            } => DisputeLifecycle::cast(ctx, *dispute, slots, *choice, *salt),
            EventKind::PeriodChanged { dispute, period } => {
                DisputeLifecycle::change_period(ctx, *dispute, *period)
            }
            EventKind::DisputeAppealed { dispute } => DisputeLifecycle::appeal(ctx, *dispute),
            EventKind::CourtCreated { court } => CourtAdministration::court_created(ctx, *court),
            EventKind::CourtParameterChanged { court, parameter } => {
                CourtAdministration::parameter_changed(ctx, *court, parameter)
            }
            EventKind::RewardsDistributed {
                dispute,
                juror,
                token_amount,
                eth_amount,
            } => RewardLedger::distribute(ctx, *dispute, *juror, *token_amount, *eth_amount),
            EventKind::PolicyUpdated { court, policy } => {
                CourtAdministration::policy_updated(ctx, *court, policy)
            }
            EventKind::GovernanceExecuted => CourtAdministration::governance_executed(ctx),
        }
    }
}
