//! Dispute lifecycle tests
//!
//! Walks a dispute from creation through draws, hidden votes, an appeal
//! with a court jump and final execution, checking the court, arbitrable
//! and global counters at each step.

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use courtline_core::{
    Arbitrable, Court, CourtId, Dispute, DisputeCounts, DisputeId, Draw, EngineError, EntityKey,
    EntityStore, GlobalCounters, Juror, MemoryStore, Period, PhaseChange, Round, Vote, WriteBatch,
    H256,
};
use courtline_engine::{Engine, Outcome};
use courtline_testkit::{
    arbitrable, assert_consistent, creator, init_test_tracing, juror, meta_at, FeedBuilder,
    ScriptedOracle, STANDARD_TREE,
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

fn dispute(store: &MemoryStore, id: u64) -> Dispute {
    store
        .get_ref::<Dispute>(&EntityKey::Dispute(DisputeId::new(id)))
        .cloned()
        .unwrap()
}

fn round(store: &MemoryStore, id: u64, number: u64) -> Option<Round> {
    store
        .get_ref::<Round>(&EntityKey::round(DisputeId::new(id), number))
        .cloned()
}

fn vote(store: &MemoryStore, id: u64, round: u64, slot: u64) -> Vote {
    store
        .get_ref::<Vote>(&EntityKey::vote(DisputeId::new(id), round, slot))
        .cloned()
        .unwrap()
}

fn counters(store: &MemoryStore) -> GlobalCounters {
    store
        .get_ref::<GlobalCounters>(&EntityKey::Counters)
        .cloned()
        .unwrap()
}

fn counts(total: u64, open: u64, closed: u64, buckets: [u64; 4]) -> DisputeCounts {
    DisputeCounts {
        total,
        open,
        closed,
        evidence: buckets[0],
        commit: buckets[1],
        vote: buckets[2],
        appeal: buckets[3],
    }
}

/// Applies feed events one at a time, remembering how far it got.
struct Harness {
    engine: Engine,
    oracle: ScriptedOracle,
    store: MemoryStore,
    feed: FeedBuilder,
    applied: usize,
}

impl Harness {
    fn new() -> Self {
        init_test_tracing();
        let oracle = ScriptedOracle::with_tree(&STANDARD_TREE);
        oracle.set_dispute_court(7, 2);
        Self {
            engine: Engine::default(),
            oracle,
            store: MemoryStore::new(),
            feed: FeedBuilder::new(),
            applied: 0,
        }
    }

    fn step(&mut self, build: impl FnOnce(&mut FeedBuilder)) -> Outcome {
        build(&mut self.feed);
        let mut last = Outcome::AlreadyApplied;
        for event in &self.feed.events()[self.applied..] {
            last = self.engine.apply(&mut self.store, &self.oracle, event);
        }
        self.applied = self.feed.events().len();
        last
    }
}

fn created() -> Harness {
    let mut harness = Harness::new();
    let outcome = harness.step(|feed| {
        feed.create_dispute(7, arbitrable(1), creator(1));
    });
    assert_eq!(outcome, Outcome::Applied);
    harness
}

// ============================================================================
// Full lifecycle
// ============================================================================

#[test]
fn test_dispute_lifecycle_with_court_jump() {
    let mut h = created();

    let d = dispute(&h.store, 7);
    assert_eq!(d.court, CourtId::new(2));
    assert_eq!(d.period, Period::Evidence);
    assert_eq!(d.rounds, 1);
    assert_eq!(d.number_of_choices, 2);
    assert!(round(&h.store, 7, 0).is_some());
    assert_eq!(court(&h.store, 2).disputes, counts(1, 1, 0, [1, 0, 0, 0]));
    assert_eq!(counters(&h.store).disputes, counts(1, 1, 0, [1, 0, 0, 0]));
    assert_eq!(counters(&h.store).arbitrables_count, 1);
    let maker = h.store.get_ref::<Juror>(&EntityKey::Juror(creator(1))).unwrap();
    assert_eq!(maker.disputes_created, 1);

    // three slots, two distinct jurors
    h.step(|feed| {
        feed.draw(7, 0, 0, juror(1))
            .draw(7, 0, 1, juror(2))
            .draw(7, 0, 2, juror(1));
    });
    assert_eq!(counters(&h.store).drawn_jurors, 2);
    assert_eq!(dispute(&h.store, 7).jurors_involved.len(), 2);
    let drawn = h.store.get_ref::<Juror>(&EntityKey::Juror(juror(1))).unwrap();
    assert_eq!(drawn.disputes_as_juror, 1);
    assert_eq!(h.store.all::<Draw>().len(), 3);

    h.step(|feed| {
        feed.period(7, Period::Commit)
            .commit(7, &[0, 2], H256::repeat_byte(3));
    });
    assert_eq!(court(&h.store, 2).disputes, counts(1, 1, 0, [0, 1, 0, 0]));
    assert!(vote(&h.store, 7, 0, 0).committed);
    assert!(!vote(&h.store, 7, 0, 0).voted);
    assert_eq!(vote(&h.store, 7, 0, 2).commit, Some(H256::repeat_byte(3)));
    assert!(!vote(&h.store, 7, 0, 1).committed);

    h.oracle.set_ruling(7, 1);
    h.step(|feed| {
        feed.period(7, Period::Vote).cast(7, &[0, 1, 2], 1);
    });
    assert!(vote(&h.store, 7, 0, 1).voted);
    assert_eq!(vote(&h.store, 7, 0, 1).choice, Some(1));
    assert_eq!(dispute(&h.store, 7).current_ruling, 1);

    h.step(|feed| {
        feed.period(7, Period::Appeal);
    });
    assert_eq!(counters(&h.store).disputes, counts(1, 1, 0, [0, 0, 0, 1]));

    // appeal jumps from court 2 to court 5
    h.oracle.set_winning_choice(7, 0, 1);
    h.oracle.set_dispute_court(7, 5);
    h.step(|feed| {
        feed.appeal(7);
    });
    let d = dispute(&h.store, 7);
    assert_eq!(d.court, CourtId::new(5));
    assert_eq!(d.period, Period::Evidence);
    assert_eq!(d.rounds, 2);
    assert_eq!(round(&h.store, 7, 0).unwrap().winning_choice, 1);
    assert_eq!(round(&h.store, 7, 1).unwrap().winning_choice, 0);
    assert_eq!(court(&h.store, 2).disputes, counts(0, 0, 0, [0, 0, 0, 0]));
    assert_eq!(court(&h.store, 5).disputes, counts(1, 1, 0, [1, 0, 0, 0]));
    assert_eq!(counters(&h.store).disputes, counts(1, 1, 0, [1, 0, 0, 0]));
    let arb = h
        .store
        .get_ref::<Arbitrable>(&EntityKey::Arbitrable(arbitrable(1)))
        .unwrap();
    assert_eq!(arb.disputes, counts(1, 1, 0, [1, 0, 0, 0]));

    // the appeal already moved the dispute to evidence
    h.step(|feed| {
        feed.period(7, Period::Evidence).draw(7, 1, 0, juror(3));
    });
    assert_eq!(counters(&h.store).disputes, counts(1, 1, 0, [1, 0, 0, 0]));
    assert_eq!(counters(&h.store).drawn_jurors, 3);

    h.oracle.set_winning_choice(7, 1, 2);
    h.step(|feed| {
        feed.period(7, Period::Commit)
            .period(7, Period::Vote)
            .period(7, Period::Appeal)
            .period(7, Period::Execution);
    });
    let d = dispute(&h.store, 7);
    assert!(d.ruled);
    assert_eq!(d.period, Period::Execution);
    assert_eq!(round(&h.store, 7, 1).unwrap().winning_choice, 2);
    assert_eq!(court(&h.store, 5).disputes, counts(1, 0, 1, [0, 0, 0, 0]));
    assert_eq!(counters(&h.store).disputes, counts(1, 0, 1, [0, 0, 0, 0]));
    assert_consistent(&h.store);
}

#[test]
fn test_appeal_without_jump_shifts_court_bucket() {
    let mut h = created();
    h.step(|feed| {
        feed.period(7, Period::Commit)
            .period(7, Period::Vote)
            .period(7, Period::Appeal)
            .appeal(7);
    });
    assert_eq!(dispute(&h.store, 7).court, CourtId::new(2));
    assert_eq!(court(&h.store, 2).disputes, counts(1, 1, 0, [1, 0, 0, 0]));
    assert_consistent(&h.store);
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn test_duplicate_creation_is_ignored() {
    let mut h = created();
    let outcome = h.step(|feed| {
        feed.create_dispute(7, arbitrable(2), creator(2));
    });
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(counters(&h.store).disputes.total, 1);
    assert_eq!(counters(&h.store).arbitrables_count, 1);
    assert_eq!(dispute(&h.store, 7).arbitrable, arbitrable(1));
}

#[test]
fn test_unknown_period_drops_event() {
    let mut h = created();
    let outcome = h.step(|feed| {
        feed.raw_period(7, 9);
    });
    assert_matches!(outcome, Outcome::Dropped(EngineError::UnknownPeriod(9)));
    assert!(h.store.all::<PhaseChange>().is_empty());
    assert_eq!(dispute(&h.store, 7).period, Period::Evidence);
}

#[test]
fn test_leaving_execution_is_ignored() {
    let mut h = created();
    h.step(|feed| {
        feed.period(7, Period::Execution);
    });
    let before = counters(&h.store).disputes;
    let outcome = h.step(|feed| {
        feed.period(7, Period::Vote);
    });
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(dispute(&h.store, 7).period, Period::Execution);
    assert_eq!(counters(&h.store).disputes, before);
    assert_eq!(h.store.all::<PhaseChange>().len(), 2);
}

#[test]
fn test_evidence_outside_appeal_leaves_counters() {
    let mut h = created();
    h.step(|feed| {
        feed.period(7, Period::Commit).period(7, Period::Evidence);
    });
    assert_eq!(dispute(&h.store, 7).period, Period::Evidence);
    assert_eq!(court(&h.store, 2).disputes, counts(1, 1, 0, [0, 1, 0, 0]));
}

#[test]
fn test_draw_for_unknown_dispute_is_dropped() {
    let mut h = Harness::new();
    let outcome = h.step(|feed| {
        feed.draw(99, 0, 0, juror(1));
    });
    assert_matches!(outcome, Outcome::Dropped(EngineError::ReferenceMissing { .. }));
    assert!(h.store.all::<Vote>().is_empty());
}

#[test]
fn test_duplicate_draw_slot_is_noop() {
    let mut h = created();
    h.step(|feed| {
        feed.draw(7, 0, 0, juror(1)).draw(7, 0, 0, juror(2));
    });
    assert_eq!(vote(&h.store, 7, 0, 0).juror, juror(1));
    assert_eq!(counters(&h.store).drawn_jurors, 1);
    assert!(h.store.get_ref::<Juror>(&EntityKey::Juror(juror(2))).is_none());
}

#[test]
fn test_commit_skips_unknown_slots() {
    let mut h = created();
    let outcome = h.step(|feed| {
        feed.draw(7, 0, 0, juror(1))
            .commit(7, &[0, 5], H256::repeat_byte(1));
    });
    assert_eq!(outcome, Outcome::Applied);
    assert!(vote(&h.store, 7, 0, 0).committed);
    assert_eq!(h.store.all::<Vote>().len(), 1);
}

#[test]
fn test_unscripted_dispute_defaults_to_root_court() {
    let mut h = Harness::new();
    h.step(|feed| {
        feed.create_dispute(8, arbitrable(1), creator(1));
    });
    let d = dispute(&h.store, 8);
    assert_eq!(d.court, CourtId::new(0));
    assert_eq!(d.number_of_choices, 0);
    assert_eq!(d.last_period_change, meta_at(1).block_time);
    assert!(!d.ruled);
    assert_eq!(court(&h.store, 0).disputes.total, 1);
}

#[test]
fn test_creation_copies_snapshot_state() {
    let mut h = Harness::new();
    h.oracle.set_dispute_state(7, 1_234, true);
    h.step(|feed| {
        feed.create_dispute(7, arbitrable(1), creator(1));
    });
    let d = dispute(&h.store, 7);
    assert_eq!(d.last_period_change, 1_234);
    assert!(d.ruled);
    assert_eq!(d.start_time, meta_at(1).block_time);
    assert_eq!(d.period, Period::Evidence);
}

#[test]
fn test_drifted_court_counter_clamps_at_zero() {
    let mut h = created();

    // court 2 lost track of its open dispute
    let mut drifted = court(&h.store, 2);
    drifted.disputes = counts(1, 0, 0, [0, 0, 0, 0]);
    let mut batch = WriteBatch::new();
    batch.put(drifted);
    h.store.commit(batch);

    let outcome = h.step(|feed| {
        feed.period(7, Period::Execution);
    });
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(court(&h.store, 2).disputes, counts(1, 0, 1, [0, 0, 0, 0]));
    assert_eq!(counters(&h.store).disputes, counts(1, 0, 1, [0, 0, 0, 0]));
    assert!(dispute(&h.store, 7).ruled);
}

#[test]
fn test_oracle_outage_keeps_court_on_appeal() {
    let mut h = created();
    h.step(|feed| {
        feed.period(7, Period::Appeal);
    });
    h.oracle.set_offline(true);
    let outcome = h.step(|feed| {
        feed.appeal(7);
    });
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(dispute(&h.store, 7).court, CourtId::new(2));
    assert_eq!(court(&h.store, 2).disputes, counts(1, 1, 0, [1, 0, 0, 0]));
}
