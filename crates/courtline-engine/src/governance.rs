//! Court administration
//!
//! Court creation, single-field parameter changes, policy registration and
//! the full configuration refresh that follows a governance execution.

use crate::context::Aggregation;
use crate::hierarchy::CourtHierarchy;
use courtline_core::{CourtId, CourtParameter, CourtSettings, PolicyUpdate, Result};
use tracing::{debug, info};

/// Handlers for court administration events.
pub struct CourtAdministration;

impl CourtAdministration {
    /// Materialize a newly created court.
    pub fn court_created(ctx: &mut Aggregation<'_>, id: CourtId) -> Result<()> {
        CourtHierarchy::get_or_create(ctx, id)?;
        Ok(())
    }

    /// Update one configuration field.
    pub fn parameter_changed(
        ctx: &mut Aggregation<'_>,
        id: CourtId,
        parameter: &CourtParameter,
    ) -> Result<()> {
        let mut court = CourtHierarchy::get_or_create(ctx, id)?;
        apply_parameter(&mut court.settings, parameter);
        debug!(court = %id, parameter = ?parameter, "court parameter changed");
        ctx.put(court);
        Ok(())
    }

    /// Register a policy document and link it to the court if known.
    pub fn policy_updated(ctx: &mut Aggregation<'_>, id: CourtId, policy: &str) -> Result<()> {
        let meta = *ctx.meta();
        ctx.put(PolicyUpdate {
            court: id,
            policy: policy.to_owned(),
            timestamp: meta.block_time,
            block_number: meta.block_number,
        });

        if let Some(mut court) = ctx.court(id) {
            court.policy = Some(id);
            ctx.put(court);
        }
        debug!(court = %id, policy, "policy updated");
        Ok(())
    }

    /// Refresh the configuration of every known court.
    pub fn governance_executed(ctx: &mut Aggregation<'_>) -> Result<()> {
        let courts = CourtHierarchy::known_courts(ctx);
        let refreshed = courts
            .iter()
            .filter(|&&id| CourtHierarchy::refresh_config(ctx, id))
            .count();
        info!(courts = courts.len(), refreshed, "governance execution refreshed court settings");
        Ok(())
    }
}

/// Write one parameter into a settings snapshot.
pub fn apply_parameter(settings: &mut CourtSettings, parameter: &CourtParameter) {
    match parameter {
        CourtParameter::MinStake(value) => settings.min_stake = *value,
        CourtParameter::Alpha(value) => settings.alpha = *value,
        CourtParameter::FeeForJuror(value) => settings.fee_for_juror = *value,
        CourtParameter::JurorsForCourtJump(value) => settings.jurors_for_court_jump = *value,
        CourtParameter::TimesPerPeriod(value) => settings.time_periods = *value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_parameter() {
        let mut settings = CourtSettings::default();
        apply_parameter(&mut settings, &CourtParameter::MinStake(500));
        apply_parameter(&mut settings, &CourtParameter::TimesPerPeriod([1, 2, 3, 4]));
        assert_eq!(settings.min_stake, 500);
        assert_eq!(settings.time_periods, [1, 2, 3, 4]);
        assert_eq!(settings.alpha, 0);
    }
}
