//! Property test strategies
//!
//! Stake operations over `STANDARD_TREE` with a handful of jurors and small
//! amounts, so sequences revisit the same positions often.

use crate::feed::FeedBuilder;
use crate::fixtures::juror;
use courtline_core::EventEnvelope;
use proptest::prelude::*;

pub use proptest;

/// One stake change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeOp {
    /// Juror seed
    pub juror: u8,
    /// Court id in the standard tree
    pub court: u64,
    /// New stake in the court
    pub amount: u128,
}

/// Strategy for one stake change; a third of them withdraw.
pub fn arb_stake_op() -> impl Strategy<Value = StakeOp> {
    (1u8..=5, 0u64..=6, prop_oneof![1 => Just(0u128), 2 => 1u128..=5_000])
        .prop_map(|(juror, court, amount)| StakeOp {
            juror,
            court,
            amount,
        })
}

/// Strategy for a sequence of stake changes.
pub fn arb_stake_ops(max_len: usize) -> impl Strategy<Value = Vec<StakeOp>> {
    prop::collection::vec(arb_stake_op(), 1..=max_len)
}

/// Feed applying the given stake changes in order.
pub fn stake_feed(ops: &[StakeOp]) -> Vec<EventEnvelope> {
    let mut feed = FeedBuilder::new();
    for op in ops {
        feed.stake(juror(op.juror), op.court, op.amount);
    }
    feed.build()
}
