//! Validation round outcome handling.
//!
//! Turns the per-pair results of one round into ticks and payout credits.
//! Every dispatched pair yields exactly one tick, whether it was answered or
//! timed out.

use crate::domain::config::PayoutPolicy;
use chrono::{DateTime, Utc};
use shared_types::{Tick, TickStatus, ValidatorId, WebsiteId};
use std::collections::BTreeMap;
use um_02_pending_calls::CallOutcome;

/// A verified reply delivered to a waiting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReply {
    pub status: TickStatus,
    pub latency_ms: u64,
}

/// How one (website, validator) check of a round ended.
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub website_id: WebsiteId,
    pub validator_id: ValidatorId,
    pub outcome: CallOutcome<CheckReply>,
    pub observed_at: DateTime<Utc>,
}

impl PairOutcome {
    /// Build the tick for this pair. A timeout becomes a `Bad` tick carrying
    /// `penalty_latency_ms` and is never marked verified.
    pub fn to_tick(&self, penalty_latency_ms: u64) -> Tick {
        let (status, latency_ms, verified) = match &self.outcome {
            CallOutcome::Resolved(reply) => (reply.status, reply.latency_ms, true),
            CallOutcome::TimedOut => (TickStatus::Bad, penalty_latency_ms, false),
        };
        Tick {
            website_id: self.website_id.clone(),
            validator_id: self.validator_id.clone(),
            status,
            latency_ms,
            observed_at: self.observed_at,
            verified,
        }
    }
}

/// Sum the credits each validator earned this round.
///
/// Validators with nothing to credit are left out.
pub fn aggregate_payouts(
    ticks: &[Tick],
    policy: PayoutPolicy,
    reward_per_check: u64,
) -> BTreeMap<ValidatorId, u64> {
    let mut payouts = BTreeMap::new();
    for tick in ticks {
        let rewarded = match policy {
            PayoutPolicy::VerifiedOnly => tick.verified,
            PayoutPolicy::PayForAttempt => true,
        };
        if rewarded && reward_per_check > 0 {
            *payouts.entry(tick.validator_id.clone()).or_insert(0u64) += reward_per_check;
        }
    }
    payouts
}

/// Summary of one completed round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub websites: usize,
    pub validators: usize,
    /// Checks dispatched (websites × validators).
    pub dispatched: usize,
    pub answered: usize,
    pub timed_out: usize,
    /// Ticks the store reported as written.
    pub ticks_persisted: usize,
    /// Total credited across all validators.
    pub payout_total: u64,
    /// Store calls that failed this round.
    pub store_errors: usize,
}

impl RoundReport {
    /// `true` when there was nothing to check.
    pub fn is_idle(&self) -> bool {
        self.dispatched == 0
    }
}
