//! Dispute lifecycle
//!
//! Creation, juror draws, commits and casts, period changes and appeals.
//! Each dispute is counted in three places (its court, its arbitrable and the
//! global counters) and every transition moves it between the same buckets
//! in all three, except on a court jump where only the court changes.

use crate::context::Aggregation;
use crate::counters::{self, CounterScope};
use crate::hierarchy::CourtHierarchy;
use courtline_core::{
    Address, Arbitrable, Court, CourtId, Dispute, DisputeId, Draw, EngineError, Period, PhaseChange,
    Result, Round, Vote, H256, PENDING_CHOICE,
};
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

/// Handlers for dispute events.
pub struct DisputeLifecycle;

impl DisputeLifecycle {
    /// Create a dispute in evidence with its first round.
    pub fn create(
        ctx: &mut Aggregation<'_>,
        id: DisputeId,
        arbitrable_id: Address,
        creator: Address,
    ) -> Result<()> {
        if ctx.dispute(id).is_some() {
            warn!(dispute = %id, "duplicate dispute creation ignored");
            return Ok(());
        }

        let snapshot = ctx.dispute_snapshot(id);
        let mut court = CourtHierarchy::get_or_create(ctx, snapshot.court)?;
        let meta = *ctx.meta();
        if snapshot.period != Period::Evidence.number() {
            warn!(
                dispute = %id,
                period = snapshot.period,
                "new dispute reported outside evidence, counted in evidence"
            );
        }

        let first_round = Round {
            dispute: id,
            number: 0,
            start_time: meta.block_time,
            winning_choice: ctx.winning_choice(id, 0),
        };
        ctx.put(first_round);

        ctx.put(Dispute {
            id,
            court: court.id,
            arbitrable: arbitrable_id,
            creator,
            number_of_choices: snapshot.number_of_choices,
            period: Period::Evidence,
            current_ruling: 0,
            ruled: snapshot.ruled,
            start_time: meta.block_time,
            last_period_change: snapshot.last_period_change,
            tx_hash: meta.tx_hash,
            jurors_involved: BTreeSet::new(),
            rounds: 1,
        });

        let mut juror = ctx.juror_or_new(creator);
        counters::increment(&mut juror.disputes_created);
        ctx.put(juror);

        counters::record_new_dispute(&mut court.disputes);
        let court_id = court.id;
        ctx.put(court);

        let mut arbitrable = match ctx.arbitrable(arbitrable_id) {
            Some(arbitrable) => arbitrable,
            None => {
                counters::increment(&mut ctx.counters.arbitrables_count);
                Arbitrable::new(arbitrable_id)
            }
        };
        counters::record_new_dispute(&mut arbitrable.disputes);
        ctx.put(arbitrable);

        counters::record_new_dispute(&mut ctx.counters.disputes);
        debug!(dispute = %id, court = %court_id, arbitrable = %arbitrable_id, "created dispute");
        Ok(())
    }

    /// Record a juror drawn into a round slot.
    pub fn draw(
        ctx: &mut Aggregation<'_>,
        id: DisputeId,
        round: u64,
        slot: u64,
        juror_id: Address,
    ) -> Result<()> {
        let mut dispute = Self::require(ctx, id)?;
        if ctx.round(id, round).is_none() {
            return Err(EngineError::reference_missing(format!("round {id}/{round}")));
        }
        if ctx.vote(id, round, slot).is_some() {
            debug!(dispute = %id, round, slot, "draw slot already recorded");
            return Ok(());
        }

        let timestamp = ctx.meta().block_time;
        ctx.put(Vote::drawn(id, round, slot, juror_id, timestamp));
        ctx.put(Draw {
            dispute: id,
            round,
            slot,
            juror: juror_id,
            timestamp,
        });

        let mut juror = ctx.juror_or_new(juror_id);
        if !dispute.jurors_involved.contains(&juror_id) {
            if juror.disputes_as_juror == 0 {
                counters::increment(&mut ctx.counters.drawn_jurors);
            }
            counters::increment(&mut juror.disputes_as_juror);
            dispute.jurors_involved.insert(juror_id);
            ctx.put(dispute);
        }
        ctx.put(juror);
        Ok(())
    }

    /// Record hidden-vote commitments in the current round.
    pub fn commit(
        ctx: &mut Aggregation<'_>,
        id: DisputeId,
        slots: &[u64],
        commit: H256,
    ) -> Result<()> {
        let dispute = Self::require(ctx, id)?;
        let round = dispute.current_round();
        let timestamp = ctx.meta().block_time;

        for &slot in slots {
            let Some(mut vote) = ctx.vote(id, round, slot) else {
                warn!(dispute = %id, round, slot, "commit for unknown vote slot skipped");
                continue;
            };
            vote.committed = true;
            vote.commit = Some(commit);
            vote.timestamp = timestamp;
            ctx.put(vote);
        }
        Ok(())
    }

    /// Record cast votes in the current round and refresh the ruling.
    pub fn cast(
        ctx: &mut Aggregation<'_>,
        id: DisputeId,
        slots: &[u64],
        choice: u64,
        salt: H256,
    ) -> Result<()> {
        let mut dispute = Self::require(ctx, id)?;
        let round = dispute.current_round();
        let timestamp = ctx.meta().block_time;

        for &slot in slots {
            let Some(mut vote) = ctx.vote(id, round, slot) else {
                warn!(dispute = %id, round, slot, "vote for unknown slot skipped");
                continue;
            };
            vote.voted = true;
            vote.choice = Some(choice);
            vote.salt = Some(salt);
            vote.timestamp = timestamp;
            ctx.put(vote);
        }

        dispute.current_ruling = ctx.current_ruling(id);
        ctx.put(dispute);
        Ok(())
    }

    /// Move a dispute into the period with the given number.
    pub fn change_period(ctx: &mut Aggregation<'_>, id: DisputeId, number: u8) -> Result<()> {
        let period = Period::from_number(number).ok_or(EngineError::UnknownPeriod(number))?;
        let mut dispute = Self::require(ctx, id)?;
        let meta = *ctx.meta();

        ctx.put(PhaseChange {
            position: meta.position(),
            dispute: id,
            period,
        });

        let previous = dispute.period;
        if previous == period {
            debug!(dispute = %id, period = %period, "period unchanged");
            return Ok(());
        }
        if previous == Period::Execution {
            error!(dispute = %id, to = %period, "invariant violation: dispute left execution, ignored");
            return Ok(());
        }

        if period == Period::Evidence && previous != Period::Appeal {
            warn!(dispute = %id, from = %previous, "evidence re-entered outside appeal, counters untouched");
        } else {
            Self::shift_everywhere(ctx, &dispute, previous, period)?;
        }

        if period == Period::Execution {
            dispute.ruled = true;
            let last = dispute.current_round();
            match ctx.round(id, last) {
                Some(mut round) => {
                    round.winning_choice = ctx.winning_choice(id, last);
                    ctx.put(round);
                }
                None => warn!(dispute = %id, round = last, "final round missing"),
            }
        }

        dispute.period = period;
        dispute.last_period_change = meta.block_time;
        dispute.current_ruling = ctx.current_ruling(id);
        debug!(dispute = %id, from = %previous, to = %period, "period changed");
        ctx.put(dispute);
        Ok(())
    }

    /// Open a new round after an appeal, following a court jump if any.
    pub fn appeal(ctx: &mut Aggregation<'_>, id: DisputeId) -> Result<()> {
        let mut dispute = Self::require(ctx, id)?;
        let meta = *ctx.meta();

        let previous_round = dispute.current_round();
        match ctx.round(id, previous_round) {
            Some(mut round) => {
                round.winning_choice = ctx.winning_choice(id, previous_round);
                ctx.put(round);
            }
            None => warn!(dispute = %id, round = previous_round, "appealed round missing"),
        }

        let next_round = dispute.rounds;
        ctx.put(Round {
            dispute: id,
            number: next_round,
            start_time: meta.block_time,
            winning_choice: PENDING_CHOICE,
        });
        dispute.rounds = dispute.rounds.saturating_add(1);

        let owning_court = match ctx.oracle.dispute_snapshot(id) {
            Ok(snapshot) => snapshot.court,
            Err(err) => {
                warn!(dispute = %id, error = %err, "dispute snapshot unavailable, assuming no court jump");
                dispute.court
            }
        };

        let previous_period = dispute.period;
        if owning_court != dispute.court {
            let mut new_court = CourtHierarchy::get_or_create(ctx, owning_court)?;
            let mut old_court = Self::require_court(ctx, dispute.court)?;
            counters::remove_dispute(
                &mut old_court.disputes,
                previous_period,
                CounterScope::Court(old_court.id),
            );
            counters::record_new_dispute(&mut new_court.disputes);
            debug!(dispute = %id, from = %old_court.id, to = %new_court.id, "court jump");
            ctx.put(old_court);
            ctx.put(new_court);
            dispute.court = owning_court;
        } else {
            let mut court = Self::require_court(ctx, dispute.court)?;
            counters::shift_period(
                &mut court.disputes,
                previous_period,
                Period::Evidence,
                CounterScope::Court(court.id),
            );
            ctx.put(court);
        }

        Self::shift_arbitrable(ctx, &dispute, previous_period, Period::Evidence);
        counters::shift_period(
            &mut ctx.counters.disputes,
            previous_period,
            Period::Evidence,
            CounterScope::Global,
        );

        dispute.period = Period::Evidence;
        dispute.last_period_change = meta.block_time;
        debug!(dispute = %id, round = next_round, "appeal opened round");
        ctx.put(dispute);
        Ok(())
    }

    fn shift_everywhere(
        ctx: &mut Aggregation<'_>,
        dispute: &Dispute,
        from: Period,
        to: Period,
    ) -> Result<()> {
        let mut court = Self::require_court(ctx, dispute.court)?;
        counters::shift_period(&mut court.disputes, from, to, CounterScope::Court(court.id));
        ctx.put(court);

        Self::shift_arbitrable(ctx, dispute, from, to);
        counters::shift_period(&mut ctx.counters.disputes, from, to, CounterScope::Global);
        Ok(())
    }

    fn shift_arbitrable(ctx: &mut Aggregation<'_>, dispute: &Dispute, from: Period, to: Period) {
        match ctx.arbitrable(dispute.arbitrable) {
            Some(mut arbitrable) => {
                counters::shift_period(
                    &mut arbitrable.disputes,
                    from,
                    to,
                    CounterScope::Arbitrable(arbitrable.id),
                );
                ctx.put(arbitrable);
            }
            None => warn!(dispute = %dispute.id, arbitrable = %dispute.arbitrable, "arbitrable missing"),
        }
    }

    fn require(ctx: &Aggregation<'_>, id: DisputeId) -> Result<Dispute> {
        ctx.dispute(id)
            .ok_or_else(|| EngineError::reference_missing(format!("dispute {id}")))
    }

    fn require_court(ctx: &Aggregation<'_>, id: CourtId) -> Result<Court> {
        ctx.court(id)
            .ok_or_else(|| EngineError::reference_missing(format!("court {id}")))
    }
}
