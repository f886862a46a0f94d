//! Court hierarchy
//!
//! Courts are materialized lazily. Resolving an unknown court pulls its
//! configuration from the oracle and walks up the parent chain until it
//! reaches a known court or the root, whose parent is itself. Missing
//! ancestors are created from the top down so every child list stays linked.
//!
//! Aggregates flow upward: a stake delta in a court touches that court and
//! every ancestor.

use crate::context::Aggregation;
use crate::counters::{self, CounterScope};
use courtline_core::{Court, CourtConfig, CourtId, EngineError, EntityKey, Juror, Result};
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

/// Effect of a stake event on a juror's presence in a court subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JurorDelta {
    /// Stake went from zero to positive
    Joined,
    /// Stake went from positive to zero
    Left,
    /// Presence unchanged
    Unchanged,
}

impl JurorDelta {
    /// Derive from the stake before and after the event.
    pub fn from_transition(old_stake: u128, new_stake: u128) -> Self {
        match (old_stake > 0, new_stake > 0) {
            (false, true) => JurorDelta::Joined,
            (true, false) => JurorDelta::Left,
            _ => JurorDelta::Unchanged,
        }
    }
}

/// Resolution and roll-up over the court tree.
pub struct CourtHierarchy;

impl CourtHierarchy {
    /// Return the court, materializing it and any missing ancestors.
    ///
    /// Fails without touching the overlay when the oracle rejects any court
    /// in the chain, when the chain is cyclic, or when it is deeper than
    /// `max_court_depth`.
    pub fn get_or_create(ctx: &mut Aggregation<'_>, id: CourtId) -> Result<Court> {
        if let Some(court) = ctx.court(id) {
            return Ok(court);
        }

        let missing = Self::resolve_missing_chain(ctx, id)?;
        for (court_id, config) in missing.into_iter().rev() {
            Self::materialize(ctx, court_id, config)?;
        }

        ctx.court(id)
            .ok_or_else(|| EngineError::reference_missing(format!("court {id}")))
    }

    /// Oracle configs of `id` and its unknown ancestors, child first.
    fn resolve_missing_chain(
        ctx: &Aggregation<'_>,
        id: CourtId,
    ) -> Result<Vec<(CourtId, CourtConfig)>> {
        let mut visited = BTreeSet::new();
        let mut chain = Vec::new();
        let mut cursor = id;

        loop {
            if !visited.insert(cursor) {
                return Err(EngineError::invariant(format!(
                    "court cycle through {cursor} while resolving {id}"
                )));
            }
            if visited.len() > ctx.config.max_court_depth {
                return Err(EngineError::invariant(format!(
                    "court {id} is deeper than {} levels",
                    ctx.config.max_court_depth
                )));
            }

            let config = ctx
                .oracle
                .court_config(cursor)
                .map_err(|err| EngineError::from_oracle(format!("court_config({cursor})"), err))?;
            let parent = config.parent;
            chain.push((cursor, config));

            if parent == cursor {
                return Ok(chain);
            }
            if ctx.store.contains(&EntityKey::Court(parent)) {
                let depth = chain.len() + Self::lineage(ctx, parent)?.len();
                if depth > ctx.config.max_court_depth {
                    return Err(EngineError::invariant(format!(
                        "court {id} is deeper than {} levels",
                        ctx.config.max_court_depth
                    )));
                }
                return Ok(chain);
            }
            cursor = parent;
        }
    }

    fn materialize(ctx: &mut Aggregation<'_>, id: CourtId, config: CourtConfig) -> Result<()> {
        let parent = (config.parent != id).then_some(config.parent);
        let mut court = Court::new(id, parent, config.settings);
        if ctx.store.contains(&EntityKey::Policy(id)) {
            court.policy = Some(id);
        }

        if let Some(parent_id) = parent {
            let mut parent_court = ctx.court(parent_id).ok_or_else(|| {
                EngineError::reference_missing(format!("parent court {parent_id} of {id}"))
            })?;
            if !parent_court.children.contains(&id) {
                parent_court.children.push(id);
            }
            ctx.put(parent_court);
        }

        ctx.put(court);
        counters::increment(&mut ctx.counters.courts_count);
        debug!(court = %id, parent = ?parent, "materialized court");
        Ok(())
    }

    /// The court and its ancestors, starting at `id` and ending at the root.
    pub fn lineage(ctx: &Aggregation<'_>, id: CourtId) -> Result<Vec<CourtId>> {
        let mut lineage = Vec::new();
        let mut seen = BTreeSet::new();
        let mut cursor = Some(id);

        while let Some(court_id) = cursor {
            if !seen.insert(court_id) || lineage.len() >= ctx.config.max_court_depth {
                return Err(EngineError::invariant(format!(
                    "parent chain of court {id} does not terminate"
                )));
            }
            let court = ctx
                .court(court_id)
                .ok_or_else(|| EngineError::reference_missing(format!("court {court_id}")))?;
            lineage.push(court_id);
            cursor = court.parent;
        }
        Ok(lineage)
    }

    /// Courts where the juror stays counted through a stake other than the
    /// one in `excluding`.
    pub fn coverage(
        ctx: &Aggregation<'_>,
        juror: &Juror,
        excluding: CourtId,
    ) -> Result<BTreeSet<CourtId>> {
        let mut covered = BTreeSet::new();
        for &court in juror.courts.iter().filter(|&&court| court != excluding) {
            covered.extend(Self::lineage(ctx, court)?);
        }
        Ok(covered)
    }

    /// Materialized courts reachable from the configured root, parents
    /// before children.
    pub fn known_courts(ctx: &Aggregation<'_>) -> Vec<CourtId> {
        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([ctx.config.root_court]);

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let Some(court) = ctx.court(id) else {
                continue;
            };
            order.push(id);
            queue.extend(court.children);
        }
        order
    }

    /// Apply a stake delta to the court's own stake total.
    pub fn adjust_direct(ctx: &mut Aggregation<'_>, id: CourtId, stake_delta: i128) -> Result<()> {
        let mut court = ctx
            .court(id)
            .ok_or_else(|| EngineError::reference_missing(format!("court {id}")))?;
        counters::apply_signed(
            &mut court.direct_staked,
            stake_delta,
            "direct_staked",
            CounterScope::Court(id),
        );
        ctx.put(court);
        Ok(())
    }

    /// Apply a stake delta and a juror delta to the court and every ancestor.
    ///
    /// Courts in `covered` keep their juror count; the juror is still present
    /// in their subtree through another stake.
    pub fn propagate_delta(
        ctx: &mut Aggregation<'_>,
        id: CourtId,
        stake_delta: i128,
        juror_delta: JurorDelta,
        covered: &BTreeSet<CourtId>,
    ) -> Result<()> {
        for court_id in Self::lineage(ctx, id)? {
            let mut court = ctx
                .court(court_id)
                .ok_or_else(|| EngineError::reference_missing(format!("court {court_id}")))?;
            let scope = CounterScope::Court(court_id);

            counters::apply_signed(&mut court.token_staked, stake_delta, "token_staked", scope);
            if !covered.contains(&court_id) {
                match juror_delta {
                    JurorDelta::Joined => counters::increment(&mut court.active_jurors),
                    JurorDelta::Left => {
                        counters::decrement(&mut court.active_jurors, "active_jurors", scope)
                    }
                    JurorDelta::Unchanged => {}
                }
            }
            ctx.put(court);
        }
        Ok(())
    }

    /// Re-read a known court's configuration. Returns whether it changed.
    pub fn refresh_config(ctx: &mut Aggregation<'_>, id: CourtId) -> bool {
        let Some(mut court) = ctx.court(id) else {
            debug!(court = %id, "refresh skipped for unknown court");
            return false;
        };
        match ctx.oracle.court_config(id) {
            Ok(config) if config.settings != court.settings => {
                court.settings = config.settings;
                ctx.put(court);
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!(court = %id, error = %err, "court config refresh failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use courtline_core::{Address, EngineConfig, EventMeta, MemoryStore, H256};
    use courtline_testkit::{ScriptedOracle, STANDARD_TREE};

    fn meta() -> EventMeta {
        EventMeta {
            block_number: 1,
            log_index: 0,
            block_time: 1_600_000_015,
            tx_hash: H256::zero(),
        }
    }

    #[test]
    fn test_lazy_ancestor_chain() {
        let base = MemoryStore::new();
        let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
        let config = EngineConfig::default();
        let meta = meta();
        let mut ctx = Aggregation::begin(&base, &oracle, &config, &meta);

        let court = CourtHierarchy::get_or_create(&mut ctx, CourtId::new(4)).unwrap();
        assert_eq!(court.parent, Some(CourtId::new(2)));
        assert_eq!(ctx.counters().courts_count, 4);

        let root = ctx.court(CourtId::new(0)).unwrap();
        assert!(root.is_root());
        assert_eq!(root.children, vec![CourtId::new(1)]);
        assert_eq!(
            CourtHierarchy::lineage(&ctx, CourtId::new(4)).unwrap(),
            vec![CourtId::new(4), CourtId::new(2), CourtId::new(1), CourtId::new(0)]
        );

        // resolving a sibling reuses the known ancestors
        CourtHierarchy::get_or_create(&mut ctx, CourtId::new(3)).unwrap();
        assert_eq!(ctx.counters().courts_count, 5);
        let parent = ctx.court(CourtId::new(1)).unwrap();
        assert_eq!(parent.children, vec![CourtId::new(2), CourtId::new(3)]);
    }

    #[test]
    fn test_cycle_detected() {
        let base = MemoryStore::new();
        let oracle = ScriptedOracle::with_tree(&[(10, 11), (11, 10)]);
        let config = EngineConfig::default();
        let meta = meta();
        let mut ctx = Aggregation::begin(&base, &oracle, &config, &meta);

        let err = CourtHierarchy::get_or_create(&mut ctx, CourtId::new(10)).unwrap_err();
        assert_matches!(err, EngineError::InvariantViolation { .. });
        assert_eq!(ctx.counters().courts_count, 0);
    }

    #[test]
    fn test_coverage_excludes_changed_court() {
        let base = MemoryStore::new();
        let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
        let config = EngineConfig::default();
        let meta = meta();
        let mut ctx = Aggregation::begin(&base, &oracle, &config, &meta);
        CourtHierarchy::get_or_create(&mut ctx, CourtId::new(3)).unwrap();
        CourtHierarchy::get_or_create(&mut ctx, CourtId::new(6)).unwrap();

        let mut juror = Juror::new(Address::repeat_byte(1));
        juror.courts.insert(CourtId::new(3));
        juror.courts.insert(CourtId::new(6));

        let covered = CourtHierarchy::coverage(&ctx, &juror, CourtId::new(6)).unwrap();
        let expected: BTreeSet<CourtId> = [3, 1, 0].into_iter().map(CourtId::new).collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn test_refresh_leaves_court_on_outage() {
        let base = MemoryStore::new();
        let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
        let config = EngineConfig::default();
        let meta = meta();
        let mut ctx = Aggregation::begin(&base, &oracle, &config, &meta);
        CourtHierarchy::get_or_create(&mut ctx, CourtId::new(1)).unwrap();

        oracle.set_offline(true);
        assert!(!CourtHierarchy::refresh_config(&mut ctx, CourtId::new(1)));
        assert!(!CourtHierarchy::refresh_config(&mut ctx, CourtId::new(5)));
    }
}
