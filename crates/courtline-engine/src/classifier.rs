//! Juror status classification
//!
//! Pure function of the juror's state before a stake event and the values the
//! event reports. Computed before any entity is touched.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Transition class of a stake event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// First stake of an account that never staked
    BrandNew,
    /// Stake changed where the juror is already active, or a zero stake
    /// where it was not
    StakeChangeSameCourt,
    /// Left this court, still staked elsewhere
    LeavingThisCourtOnly,
    /// Left this court and holds no stake anywhere
    LeavingAllCourts,
    /// Joined this court while active elsewhere
    FirstTimeInThisCourt,
    /// Staked again after leaving every court
    Reactivating,
}

impl StatusClass {
    /// Whether the juror becomes globally active
    pub fn activates(self) -> bool {
        matches!(self, StatusClass::BrandNew | StatusClass::Reactivating)
    }
}

/// Inputs of the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeObservation {
    /// Whether the juror has staked before
    pub known_staker: bool,
    /// Stake in this court before the event
    pub stake_in_court: u128,
    /// Total stake before the event
    pub prior_total: u128,
    /// Stake in this court reported by the event
    pub new_stake: u128,
    /// Total stake reported by the event
    pub new_total: u128,
}

/// Juror status state machine.
pub struct JurorStatusClassifier;

impl JurorStatusClassifier {
    /// Classify a stake event.
    pub fn classify(observation: &StakeObservation) -> StatusClass {
        if !observation.known_staker {
            return StatusClass::BrandNew;
        }

        let active_in_court = observation.stake_in_court > 0;
        let active_elsewhere = observation.prior_total > observation.stake_in_court;
        let staking = observation.new_stake > 0;

        match (active_in_court, staking) {
            (true, true) => {
                if observation.new_total == 0 {
                    warn!(
                        new_stake = observation.new_stake,
                        "positive court stake reported with zero total"
                    );
                }
                StatusClass::StakeChangeSameCourt
            }
            (true, false) if observation.new_total > 0 => StatusClass::LeavingThisCourtOnly,
            (true, false) => StatusClass::LeavingAllCourts,
            (false, true) if active_elsewhere => StatusClass::FirstTimeInThisCourt,
            (false, true) => StatusClass::Reactivating,
            (false, false) => StatusClass::StakeChangeSameCourt,
        }
    }
}
