//! Guarded counter arithmetic
//!
//! Counters never go negative. A decrement below zero clamps to zero and is
//! logged as an invariant violation; the event still applies.

use crate::classifier::StatusClass;
use courtline_core::{Address, CourtId, DisputeCounts, GlobalCounters, Period};
use std::fmt;
use tracing::error;

/// Which aggregate a counter belongs to, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterScope {
    /// The global counters
    Global,
    /// A court
    Court(CourtId),
    /// An arbitrable contract
    Arbitrable(Address),
}

impl fmt::Display for CounterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterScope::Global => f.write_str("global"),
            CounterScope::Court(id) => write!(f, "court {id}"),
            CounterScope::Arbitrable(id) => write!(f, "arbitrable {id}"),
        }
    }
}

/// Increment a count, saturating at the maximum.
pub fn increment(value: &mut u64) {
    *value = value.saturating_add(1);
}

/// Decrement a count, clamping at zero.
pub fn decrement(value: &mut u64, field: &'static str, scope: CounterScope) {
    match value.checked_sub(1) {
        Some(next) => *value = next,
        None => {
            error!(scope = %scope, field, "invariant violation: counter would go negative, clamped to zero");
            *value = 0;
        }
    }
}

/// Add an amount, saturating at the maximum.
pub fn add_amount(value: &mut u128, amount: u128, field: &'static str, scope: CounterScope) {
    match value.checked_add(amount) {
        Some(next) => *value = next,
        None => {
            error!(scope = %scope, field, amount, "invariant violation: amount overflow, saturated");
            *value = u128::MAX;
        }
    }
}

/// Apply a signed delta to an amount, clamping at zero.
pub fn apply_signed(value: &mut u128, delta: i128, field: &'static str, scope: CounterScope) {
    let magnitude = delta.unsigned_abs();
    if delta >= 0 {
        add_amount(value, magnitude, field, scope);
        return;
    }
    match value.checked_sub(magnitude) {
        Some(next) => *value = next,
        None => {
            error!(scope = %scope, field, delta, current = *value, "invariant violation: amount would go negative, clamped to zero");
            *value = 0;
        }
    }
}

/// Count a newly created dispute: it starts open, in evidence.
pub fn record_new_dispute(counts: &mut DisputeCounts) {
    increment(&mut counts.total);
    increment(&mut counts.open);
    increment(&mut counts.evidence);
}

/// Remove an open dispute in `period` from these counts (court jump).
pub fn remove_dispute(counts: &mut DisputeCounts, period: Period, scope: CounterScope) {
    decrement(&mut counts.total, "total", scope);
    leave_period(counts, period, scope);
}

/// Move one dispute from `from` to `to`.
///
/// Leaving execution reopens the dispute; entering execution closes it.
pub fn shift_period(counts: &mut DisputeCounts, from: Period, to: Period, scope: CounterScope) {
    if from == to {
        return;
    }
    leave_period(counts, from, scope);
    enter_period(counts, to);
}

fn leave_period(counts: &mut DisputeCounts, period: Period, scope: CounterScope) {
    match counts.bucket_mut(period) {
        Some(bucket) => {
            decrement(bucket, period.as_str(), scope);
            decrement(&mut counts.open, "open", scope);
        }
        None => decrement(&mut counts.closed, "closed", scope),
    }
}

fn enter_period(counts: &mut DisputeCounts, period: Period) {
    match counts.bucket_mut(period) {
        Some(bucket) => {
            increment(bucket);
            increment(&mut counts.open);
        }
        None => increment(&mut counts.closed),
    }
}

/// Apply a juror status transition to the global active/inactive counts.
pub fn apply_juror_transition(counters: &mut GlobalCounters, class: StatusClass) {
    let scope = CounterScope::Global;
    match class {
        StatusClass::BrandNew => increment(&mut counters.active_jurors),
        StatusClass::Reactivating => {
            increment(&mut counters.active_jurors);
            decrement(&mut counters.inactive_jurors, "inactive_jurors", scope);
        }
        StatusClass::LeavingAllCourts => {
            decrement(&mut counters.active_jurors, "active_jurors", scope);
            increment(&mut counters.inactive_jurors);
        }
        StatusClass::StakeChangeSameCourt
        | StatusClass::LeavingThisCourtOnly
        | StatusClass::FirstTimeInThisCourt => {}
    }
}
