//! Court administration and reward tests

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use courtline_core::{
    Arbitrable, Court, CourtId, CourtParameter, CourtSettings, EngineError, EntityKey,
    GlobalCounters, Juror, MemoryStore, PolicyUpdate, RewardShift,
};
use courtline_engine::{Engine, Outcome};
use courtline_testkit::{
    arbitrable, creator, init_test_tracing, juror, FeedBuilder, ScriptedOracle, STANDARD_TREE,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn court(store: &MemoryStore, id: u64) -> Court {
    store
        .get_ref::<Court>(&EntityKey::Court(CourtId::new(id)))
        .cloned()
        .unwrap()
}

fn counters(store: &MemoryStore) -> GlobalCounters {
    store
        .get_ref::<GlobalCounters>(&EntityKey::Counters)
        .cloned()
        .unwrap_or_default()
}

fn run(oracle: &ScriptedOracle, feed: &FeedBuilder) -> MemoryStore {
    init_test_tracing();
    let mut store = MemoryStore::new();
    Engine::default().replay(&mut store, oracle, feed.events());
    store
}

fn tree_with_dispute() -> ScriptedOracle {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    oracle.set_dispute_court(7, 2);
    oracle
}

// ============================================================================
// Rewards
// ============================================================================

#[test]
fn test_rewards_and_penalties() {
    let oracle = tree_with_dispute();
    let mut feed = FeedBuilder::new();
    feed.create_dispute(7, arbitrable(1), creator(1))
        .reward(7, juror(1), 50, 1_000)
        .reward(7, juror(2), -20, 500);
    let store = run(&oracle, &feed);

    let winner = store.get_ref::<Juror>(&EntityKey::Juror(juror(1))).unwrap();
    assert_eq!(winner.token_rewards, 50);
    assert_eq!(winner.eth_rewards, 1_000);
    let loser = store.get_ref::<Juror>(&EntityKey::Juror(juror(2))).unwrap();
    assert_eq!(loser.token_rewards, -20);
    assert_eq!(loser.eth_rewards, 500);

    let totals = counters(&store);
    assert_eq!(totals.total_eth_fees, 1_500);
    assert_eq!(totals.total_token_redistributed, 50);
    assert_eq!(court(&store, 2).total_eth_fees, 1_500);
    assert_eq!(court(&store, 2).total_token_redistributed, 50);
    assert_eq!(court(&store, 1).total_eth_fees, 0);

    let arb = store
        .get_ref::<Arbitrable>(&EntityKey::Arbitrable(arbitrable(1)))
        .unwrap();
    assert_eq!(arb.eth_fees, 1_500);
    assert_eq!(store.all::<RewardShift>().len(), 2);
}

#[test]
fn test_reward_for_unknown_dispute_is_dropped() {
    init_test_tracing();
    let oracle = tree_with_dispute();
    let mut feed = FeedBuilder::new();
    feed.reward(9, juror(1), 50, 1_000);

    let mut store = MemoryStore::new();
    let outcome = Engine::default().apply(&mut store, &oracle, &feed.events()[0]);
    assert_matches!(outcome, Outcome::Dropped(EngineError::ReferenceMissing { .. }));
    assert!(store.all::<RewardShift>().is_empty());
    assert!(store.all::<Juror>().is_empty());
}

// ============================================================================
// Courts and policies
// ============================================================================

#[test]
fn test_court_created_materializes_chain() {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut feed = FeedBuilder::new();
    feed.court_created(6);
    let store = run(&oracle, &feed);

    assert_eq!(counters(&store).courts_count, 3);
    assert_eq!(court(&store, 6).parent, Some(CourtId::new(5)));
    assert_eq!(court(&store, 5).children, vec![CourtId::new(6)]);
    assert!(court(&store, 0).is_root());
}

#[test]
fn test_policy_before_court_is_linked_on_creation() {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut feed = FeedBuilder::new();
    feed.policy(3, "/ipfs/QmPolicy3");
    let store = run(&oracle, &feed);

    let policy = store
        .get_ref::<PolicyUpdate>(&EntityKey::Policy(CourtId::new(3)))
        .unwrap();
    assert_eq!(policy.policy, "/ipfs/QmPolicy3");
    assert!(store.get_ref::<Court>(&EntityKey::Court(CourtId::new(3))).is_none());

    feed.court_created(3);
    let store = run(&oracle, &feed);
    assert_eq!(court(&store, 3).policy, Some(CourtId::new(3)));
    assert_eq!(court(&store, 1).policy, None);
}

#[test]
fn test_policy_for_known_court_links_immediately() {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut feed = FeedBuilder::new();
    feed.court_created(2).policy(2, "/ipfs/QmFirst").policy(2, "/ipfs/QmSecond");
    let store = run(&oracle, &feed);

    assert_eq!(court(&store, 2).policy, Some(CourtId::new(2)));
    let policy = store
        .get_ref::<PolicyUpdate>(&EntityKey::Policy(CourtId::new(2)))
        .unwrap();
    assert_eq!(policy.policy, "/ipfs/QmSecond");
}

#[test]
fn test_parameter_change_updates_one_field() {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut feed = FeedBuilder::new();
    feed.court_created(2)
        .parameter(2, CourtParameter::MinStake(700))
        .parameter(2, CourtParameter::JurorsForCourtJump(511));
    let store = run(&oracle, &feed);

    let settings = court(&store, 2).settings;
    assert_eq!(settings.min_stake, 700);
    assert_eq!(settings.jurors_for_court_jump, 511);
    assert_eq!(settings.alpha, 0);
    assert_eq!(court(&store, 1).settings, CourtSettings::default());
}

// ============================================================================
// Governance refresh
// ============================================================================

#[test]
fn test_governance_refreshes_known_courts() {
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut feed = FeedBuilder::new();
    feed.court_created(2);
    let fresh = CourtSettings {
        hidden_votes: true,
        min_stake: 1_200,
        alpha: 5_000,
        fee_for_juror: 25,
        jurors_for_court_jump: 63,
        time_periods: [60, 120, 120, 240],
    };

    init_test_tracing();
    let engine = Engine::default();
    let mut store = MemoryStore::new();
    engine.replay(&mut store, &oracle, feed.events());

    oracle.set_settings(2, fresh.clone());
    oracle.set_settings(4, fresh.clone());
    feed.governance();
    let outcome = engine.apply(&mut store, &oracle, &feed.events()[1]);
    assert_eq!(outcome, Outcome::Applied);

    assert_eq!(court(&store, 2).settings, fresh);
    assert_eq!(court(&store, 1).settings, CourtSettings::default());
    assert!(store.get_ref::<Court>(&EntityKey::Court(CourtId::new(4))).is_none());
}

#[test]
fn test_governance_with_oracle_offline_keeps_settings() {
    init_test_tracing();
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut feed = FeedBuilder::new();
    feed.parameter(2, CourtParameter::Alpha(3_100)).governance();

    let engine = Engine::default();
    let mut store = MemoryStore::new();
    assert_eq!(engine.apply(&mut store, &oracle, &feed.events()[0]), Outcome::Applied);
    oracle.set_offline(true);
    assert_eq!(engine.apply(&mut store, &oracle, &feed.events()[1]), Outcome::Applied);
    assert_eq!(court(&store, 2).settings.alpha, 3_100);
}

#[test]
fn test_governance_refreshes_courts_with_sparse_ids() {
    init_test_tracing();
    let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
    let mut feed = FeedBuilder::new();
    feed.court_created(6);

    let engine = Engine::default();
    let mut store = MemoryStore::new();
    engine.replay(&mut store, &oracle, feed.events());
    assert_eq!(counters(&store).courts_count, 3);

    let fresh = CourtSettings {
        min_stake: 999,
        ..CourtSettings::default()
    };
    oracle.set_settings(5, fresh.clone());
    oracle.set_settings(6, fresh.clone());
    feed.governance();
    assert_eq!(engine.apply(&mut store, &oracle, &feed.events()[1]), Outcome::Applied);

    assert_eq!(court(&store, 5).settings, fresh);
    assert_eq!(court(&store, 6).settings, fresh);
    assert_eq!(court(&store, 0).settings, CourtSettings::default());
}
