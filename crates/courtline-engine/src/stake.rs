//! Stake aggregation
//!
//! A stake event reports absolute values: the juror's new stake in one court
//! and its new total across all courts. The court stake is overwritten, the
//! juror total is set, and only the difference to the previous court stake
//! flows into the court tree and the global counters.

use crate::classifier::{JurorStatusClassifier, StakeObservation, StatusClass};
use crate::context::Aggregation;
use crate::counters::{self, CounterScope};
use crate::hierarchy::{CourtHierarchy, JurorDelta};
use courtline_core::{Address, CourtId, CourtStake, EngineError, Juror, Result, StakeSet};
use std::collections::BTreeSet;
use tracing::debug;

/// Applies stake events.
pub struct StakeAggregator;

impl StakeAggregator {
    /// Apply one stake event and return its transition class.
    pub fn apply_stake(
        ctx: &mut Aggregation<'_>,
        juror_id: Address,
        court_id: CourtId,
        new_stake: u128,
        new_total: u128,
    ) -> Result<StatusClass> {
        CourtHierarchy::get_or_create(ctx, court_id)?;

        let existing = ctx.juror(juror_id);
        let old_stake = ctx
            .court_stake(juror_id, court_id)
            .map_or(0, |stake| stake.stake);
        let class = JurorStatusClassifier::classify(&StakeObservation {
            known_staker: existing.as_ref().is_some_and(|juror| juror.has_staked),
            stake_in_court: old_stake,
            prior_total: existing.as_ref().map_or(0, |juror| juror.total_staked),
            new_stake,
            new_total,
        });

        let meta = *ctx.meta();
        ctx.put(StakeSet {
            position: meta.position(),
            juror: juror_id,
            court: court_id,
            stake: new_stake,
            new_total,
            timestamp: meta.block_time,
        });

        let mut juror = existing.unwrap_or_else(|| Juror::new(juror_id));
        if old_stake == 0 && new_stake == 0 {
            debug!(juror = %juror_id, court = %court_id, "zero stake on empty position");
            ctx.put(juror);
            return Ok(class);
        }

        ctx.put(CourtStake {
            juror: juror_id,
            court: court_id,
            stake: new_stake,
            timestamp: meta.block_time,
            block_number: meta.block_number,
            tx_hash: meta.tx_hash,
        });

        let stake_delta = signed_delta(old_stake, new_stake)?;
        counters::apply_juror_transition(&mut ctx.counters, class);
        counters::apply_signed(
            &mut ctx.counters.token_staked,
            stake_delta,
            "token_staked",
            CounterScope::Global,
        );

        let juror_delta = JurorDelta::from_transition(old_stake, new_stake);
        let covered = match juror_delta {
            JurorDelta::Unchanged => BTreeSet::new(),
            _ => CourtHierarchy::coverage(ctx, &juror, court_id)?,
        };

        juror.total_staked = new_total;
        juror.has_staked = true;
        if new_stake > 0 {
            juror.courts.insert(court_id);
        } else {
            juror.courts.remove(&court_id);
        }
        ctx.put(juror);

        CourtHierarchy::adjust_direct(ctx, court_id, stake_delta)?;
        CourtHierarchy::propagate_delta(ctx, court_id, stake_delta, juror_delta, &covered)?;

        debug!(
            juror = %juror_id,
            court = %court_id,
            old_stake,
            new_stake,
            class = ?class,
            "applied stake"
        );
        Ok(class)
    }
}

fn signed_delta(old_stake: u128, new_stake: u128) -> Result<i128> {
    let old = i128::try_from(old_stake);
    let new = i128::try_from(new_stake);
    match (old, new) {
        (Ok(old), Ok(new)) => Ok(new - old),
        _ => Err(EngineError::invariant(format!(
            "stake change {old_stake} -> {new_stake} exceeds the signed range"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(10, 4).unwrap(), -6);
        assert_eq!(signed_delta(0, 4).unwrap(), 4);
        assert!(signed_delta(u128::MAX, 0).is_err());
    }
}
