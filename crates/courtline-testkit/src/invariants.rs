//! Aggregate invariant checks
//!
//! Recomputes every roll-up from the leaf records of a store and reports
//! each aggregate that disagrees. An empty report means the store is
//! consistent.

use courtline_core::{
    Address, Court, CourtId, CourtStake, Dispute, EntityKey, GlobalCounters, Juror, MemoryStore,
};
use std::collections::{BTreeMap, BTreeSet};

/// All invariant violations found in `store`.
pub fn violations(store: &MemoryStore) -> Vec<String> {
    let mut report = Vec::new();
    report.extend(stake_sum_violations(store));
    report.extend(rollup_violations(store));
    report.extend(active_juror_violations(store));
    report.extend(global_violations(store));
    report.extend(dispute_count_violations(store));
    report
}

/// Panic with the full report if the store is inconsistent.
pub fn assert_consistent(store: &MemoryStore) {
    let report = violations(store);
    assert!(report.is_empty(), "invariant violations:\n{}", report.join("\n"));
}

fn courts(store: &MemoryStore) -> BTreeMap<CourtId, Court> {
    store
        .all::<Court>()
        .into_iter()
        .map(|court| (court.id, court))
        .collect()
}

/// `direct_staked` equals the sum of the court's own stakes.
pub fn stake_sum_violations(store: &MemoryStore) -> Vec<String> {
    let mut sums: BTreeMap<CourtId, u128> = BTreeMap::new();
    for stake in store.all::<CourtStake>() {
        *sums.entry(stake.court).or_default() += stake.stake;
    }
    courts(store)
        .values()
        .filter_map(|court| {
            let expected = sums.get(&court.id).copied().unwrap_or(0);
            (court.direct_staked != expected).then(|| {
                format!(
                    "court {}: direct_staked {} != stake sum {}",
                    court.id, court.direct_staked, expected
                )
            })
        })
        .collect()
}

/// `token_staked` equals own stake plus children's subtree stake, and every
/// parent lists its children.
pub fn rollup_violations(store: &MemoryStore) -> Vec<String> {
    let courts = courts(store);
    let mut report = Vec::new();
    for court in courts.values() {
        let children: u128 = court
            .children
            .iter()
            .filter_map(|child| courts.get(child))
            .map(|child| child.token_staked)
            .sum();
        if court.token_staked != court.direct_staked + children {
            report.push(format!(
                "court {}: token_staked {} != direct {} + children {}",
                court.id, court.token_staked, court.direct_staked, children
            ));
        }
        if let Some(parent) = court.parent.and_then(|parent| courts.get(&parent)) {
            if !parent.children.contains(&court.id) {
                report.push(format!(
                    "court {} missing from children of {}",
                    court.id, parent.id
                ));
            }
        }
    }
    report
}

fn subtree(courts: &BTreeMap<CourtId, Court>, root: CourtId) -> BTreeSet<CourtId> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if seen.insert(id) {
            if let Some(court) = courts.get(&id) {
                stack.extend(court.children.iter().copied());
            }
        }
    }
    seen
}

/// `active_jurors` equals the distinct positive stakers in the subtree.
pub fn active_juror_violations(store: &MemoryStore) -> Vec<String> {
    let courts = courts(store);
    let stakes = store.all::<CourtStake>();
    courts
        .values()
        .filter_map(|court| {
            let members = subtree(&courts, court.id);
            let distinct: BTreeSet<Address> = stakes
                .iter()
                .filter(|stake| stake.stake > 0 && members.contains(&stake.court))
                .map(|stake| stake.juror)
                .collect();
            let expected = distinct.len() as u64;
            (court.active_jurors != expected).then(|| {
                format!(
                    "court {}: active_jurors {} != distinct stakers {}",
                    court.id, court.active_jurors, expected
                )
            })
        })
        .collect()
}

/// Global stake and juror counts agree with the leaf records.
pub fn global_violations(store: &MemoryStore) -> Vec<String> {
    let counters = store
        .get_ref::<GlobalCounters>(&EntityKey::Counters)
        .cloned()
        .unwrap_or_default();
    let mut report = Vec::new();

    let staked: u128 = store.all::<CourtStake>().iter().map(|s| s.stake).sum();
    if counters.token_staked != staked {
        report.push(format!(
            "global token_staked {} != stake sum {}",
            counters.token_staked, staked
        ));
    }

    let active = store
        .all::<Juror>()
        .iter()
        .filter(|juror| juror.is_active())
        .count() as u64;
    if counters.active_jurors != active {
        report.push(format!(
            "global active_jurors {} != active jurors {}",
            counters.active_jurors, active
        ));
    }

    let courts = store.all::<Court>().len() as u64;
    if counters.courts_count != courts {
        report.push(format!(
            "global courts_count {} != courts {}",
            counters.courts_count, courts
        ));
    }

    let disputes = store.all::<Dispute>().len() as u64;
    if counters.disputes.total != disputes {
        report.push(format!(
            "global disputes.total {} != disputes {}",
            counters.disputes.total, disputes
        ));
    }
    report
}

/// Period buckets add up to the open count and open plus closed to total.
pub fn dispute_count_violations(store: &MemoryStore) -> Vec<String> {
    let mut report = Vec::new();
    let mut check = |scope: String, counts: &courtline_core::DisputeCounts| {
        if counts.in_periods() != counts.open {
            report.push(format!(
                "{scope}: period buckets {} != open {}",
                counts.in_periods(),
                counts.open
            ));
        }
        if counts.open + counts.closed != counts.total {
            report.push(format!(
                "{scope}: open {} + closed {} != total {}",
                counts.open, counts.closed, counts.total
            ));
        }
    };

    for court in store.all::<Court>() {
        check(format!("court {}", court.id), &court.disputes);
    }
    if let Some(counters) = store.get_ref::<GlobalCounters>(&EntityKey::Counters) {
        check("global".to_owned(), &counters.disputes);
    }
    report
}
