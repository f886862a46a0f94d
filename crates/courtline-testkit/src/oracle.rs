//! Scripted configuration oracle
//!
//! Answers from tables the test fills in. Interior mutability lets a test
//! change answers between events while the engine holds a shared reference.

use courtline_core::{
    ConfigOracle, CourtConfig, CourtId, CourtSettings, DisputeId, DisputeSnapshot, OracleError,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct Script {
    courts: BTreeMap<CourtId, CourtConfig>,
    disputes: BTreeMap<DisputeId, DisputeSnapshot>,
    rulings: BTreeMap<DisputeId, u64>,
    winning: BTreeMap<(DisputeId, u64), u64>,
    failing_courts: BTreeSet<CourtId>,
    offline: bool,
}

/// Oracle backed by in-memory tables.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: RwLock<Script>,
}

impl ScriptedOracle {
    /// Oracle that knows only the root court 0.
    pub fn new() -> Self {
        let oracle = Self::default();
        oracle.add_court(0, 0);
        oracle
    }

    /// Oracle that knows the root court and every `(child, parent)` edge.
    pub fn with_tree(edges: &[(u64, u64)]) -> Self {
        let oracle = Self::new();
        for &(child, parent) in edges {
            oracle.add_court(child, parent);
        }
        oracle
    }

    /// Add or replace a court with default settings.
    pub fn add_court(&self, id: impl Into<CourtId>, parent: impl Into<CourtId>) {
        self.script.write().courts.insert(
            id.into(),
            CourtConfig {
                parent: parent.into(),
                settings: CourtSettings::default(),
            },
        );
    }

    /// Replace a known court's settings.
    pub fn set_settings(&self, id: impl Into<CourtId>, settings: CourtSettings) {
        if let Some(config) = self.script.write().courts.get_mut(&id.into()) {
            config.settings = settings;
        }
    }

    /// Make `court_config` report the court as unavailable.
    pub fn fail_court(&self, id: impl Into<CourtId>) {
        self.script.write().failing_courts.insert(id.into());
    }

    /// Make every query report unavailable.
    pub fn set_offline(&self, offline: bool) {
        self.script.write().offline = offline;
    }

    /// Set the court a dispute currently belongs to.
    pub fn set_dispute_court(&self, dispute: impl Into<DisputeId>, court: impl Into<CourtId>) {
        let court = court.into();
        self.script
            .write()
            .disputes
            .entry(dispute.into())
            .and_modify(|snapshot| snapshot.court = court)
            .or_insert_with(|| DisputeSnapshot {
                court,
                number_of_choices: 2,
                period: 0,
                last_period_change: 0,
                ruled: false,
            });
    }

    /// Set the last period change and ruled flag of a scripted dispute.
    pub fn set_dispute_state(
        &self,
        dispute: impl Into<DisputeId>,
        last_period_change: u64,
        ruled: bool,
    ) {
        if let Some(snapshot) = self.script.write().disputes.get_mut(&dispute.into()) {
            snapshot.last_period_change = last_period_change;
            snapshot.ruled = ruled;
        }
    }

    /// Set the current ruling of a dispute.
    pub fn set_ruling(&self, dispute: impl Into<DisputeId>, ruling: u64) {
        self.script.write().rulings.insert(dispute.into(), ruling);
    }

    /// Set the winning choice of a round.
    pub fn set_winning_choice(&self, dispute: impl Into<DisputeId>, round: u64, choice: u64) {
        self.script
            .write()
            .winning
            .insert((dispute.into(), round), choice);
    }

    fn check_online(script: &Script) -> Result<(), OracleError> {
        if script.offline {
            return Err(OracleError::unavailable("oracle offline"));
        }
        Ok(())
    }
}

impl ConfigOracle for ScriptedOracle {
    fn court_config(&self, court: CourtId) -> Result<CourtConfig, OracleError> {
        let script = self.script.read();
        Self::check_online(&script)?;
        if script.failing_courts.contains(&court) {
            return Err(OracleError::unavailable(format!("court {court} query reverted")));
        }
        script
            .courts
            .get(&court)
            .cloned()
            .ok_or(OracleError::UnknownCourt(court))
    }

    fn dispute_snapshot(&self, dispute: DisputeId) -> Result<DisputeSnapshot, OracleError> {
        let script = self.script.read();
        Self::check_online(&script)?;
        script
            .disputes
            .get(&dispute)
            .cloned()
            .ok_or_else(|| OracleError::unavailable(format!("no dispute {dispute}")))
    }

    fn current_ruling(&self, dispute: DisputeId) -> Result<u64, OracleError> {
        let script = self.script.read();
        Self::check_online(&script)?;
        Ok(script.rulings.get(&dispute).copied().unwrap_or(0))
    }

    fn round_winning_choice(&self, dispute: DisputeId, round: u64) -> Result<u64, OracleError> {
        let script = self.script.read();
        Self::check_online(&script)?;
        Ok(script.winning.get(&(dispute, round)).copied().unwrap_or(0))
    }
}
