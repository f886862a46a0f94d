//! Property tests for stake aggregation
//!
//! Random stake sequences over the standard tree must leave every roll-up
//! consistent after each event, and replay must be deterministic.

#![allow(clippy::unwrap_used)]

use courtline_core::{EntityKey, GlobalCounters, Juror, MemoryStore};
use courtline_engine::Engine;
use courtline_testkit::{arb_stake_ops, stake_feed, violations, ScriptedOracle, StakeOp, STANDARD_TREE};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn replay(ops: &[StakeOp]) -> MemoryStore {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut store = MemoryStore::new();
    Engine::default().replay(&mut store, &oracle, &stake_feed(ops));
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_after_every_event(ops in arb_stake_ops(40)) {
        let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
        let engine = Engine::default();
        let mut store = MemoryStore::new();

        for event in stake_feed(&ops) {
            prop_assert!(engine.apply(&mut store, &oracle, &event).is_applied());
            let report = violations(&store);
            prop_assert!(report.is_empty(), "after {}: {:?}", event.position(), report);
        }
    }

    #[test]
    fn prop_juror_totals_match_last_stakes(ops in arb_stake_ops(40)) {
        let store = replay(&ops);

        let mut expected: BTreeMap<(u8, u64), u128> = BTreeMap::new();
        for op in &ops {
            expected.insert((op.juror, op.court), op.amount);
        }
        let staked: u128 = expected.values().sum();
        let counters = store
            .get_ref::<GlobalCounters>(&EntityKey::Counters)
            .cloned()
            .unwrap_or_default();
        prop_assert_eq!(counters.token_staked, staked);

        let jurors = store.all::<Juror>();
        let active = jurors.iter().filter(|juror| juror.is_active()).count() as u64;
        let inactive = jurors
            .iter()
            .filter(|juror| juror.has_staked && !juror.is_active())
            .count() as u64;
        prop_assert_eq!(counters.active_jurors, active);
        prop_assert_eq!(counters.inactive_jurors, inactive);
    }

    #[test]
    fn prop_replay_is_idempotent(ops in arb_stake_ops(30)) {
        let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
        let engine = Engine::default();
        let feed = stake_feed(&ops);
        let mut store = MemoryStore::new();
        engine.replay(&mut store, &oracle, &feed);
        let first = store.clone();

        let summary = engine.replay(&mut store, &oracle, &feed);
        prop_assert_eq!(summary.skipped, feed.len() as u64);
        prop_assert_eq!(store, first);
    }

    #[test]
    fn prop_split_replay_matches_single_pass(ops in arb_stake_ops(30), split in 0usize..30) {
        let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
        let engine = Engine::default();
        let feed = stake_feed(&ops);
        let split = split.min(feed.len());

        let mut store = MemoryStore::new();
        engine.replay(&mut store, &oracle, &feed[..split]);
        engine.replay(&mut store, &oracle, &feed[split..]);

        prop_assert_eq!(store, replay(&ops));
    }
}
