//! Reward and penalty shifts
//!
//! Token amounts are signed: penalties are negative and only positive shifts
//! count as redistributed tokens. ETH amounts are fees paid to jurors.

use crate::context::Aggregation;
use crate::counters::{self, CounterScope};
use courtline_core::{Address, DisputeId, EngineError, Result, RewardShift};
use tracing::{debug, warn};

/// Applies reward events.
pub struct RewardLedger;

impl RewardLedger {
    /// Apply one token and ETH shift to a juror.
    pub fn distribute(
        ctx: &mut Aggregation<'_>,
        dispute_id: DisputeId,
        juror_id: Address,
        token_amount: i128,
        eth_amount: u128,
    ) -> Result<()> {
        let dispute = ctx
            .dispute(dispute_id)
            .ok_or_else(|| EngineError::reference_missing(format!("dispute {dispute_id}")))?;
        let meta = *ctx.meta();

        ctx.put(RewardShift {
            position: meta.position(),
            dispute: dispute_id,
            juror: juror_id,
            token_amount,
            eth_amount,
            timestamp: meta.block_time,
        });

        let mut juror = ctx.juror_or_new(juror_id);
        juror.eth_rewards = juror.eth_rewards.saturating_add(eth_amount);
        juror.token_rewards = juror.token_rewards.saturating_add(token_amount);
        ctx.put(juror);

        let redistributed = u128::try_from(token_amount).unwrap_or(0);

        let global = CounterScope::Global;
        counters::add_amount(&mut ctx.counters.total_eth_fees, eth_amount, "total_eth_fees", global);
        counters::add_amount(
            &mut ctx.counters.total_token_redistributed,
            redistributed,
            "total_token_redistributed",
            global,
        );

        match ctx.court(dispute.court) {
            Some(mut court) => {
                let scope = CounterScope::Court(court.id);
                counters::add_amount(&mut court.total_eth_fees, eth_amount, "total_eth_fees", scope);
                counters::add_amount(
                    &mut court.total_token_redistributed,
                    redistributed,
                    "total_token_redistributed",
                    scope,
                );
                ctx.put(court);
            }
            None => warn!(dispute = %dispute_id, court = %dispute.court, "court of rewarded dispute missing"),
        }

        match ctx.arbitrable(dispute.arbitrable) {
            Some(mut arbitrable) => {
                let scope = CounterScope::Arbitrable(arbitrable.id);
                counters::add_amount(&mut arbitrable.eth_fees, eth_amount, "eth_fees", scope);
                ctx.put(arbitrable);
            }
            None => warn!(dispute = %dispute_id, arbitrable = %dispute.arbitrable, "arbitrable of rewarded dispute missing"),
        }

        debug!(dispute = %dispute_id, juror = %juror_id, token_amount, eth_amount, "distributed rewards");
        Ok(())
    }
}
