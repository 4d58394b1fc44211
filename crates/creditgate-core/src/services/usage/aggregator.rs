//! Per-period usage aggregation

use chrono::{DateTime, Utc};

use super::error::UsageError;
use super::ledger::LedgerStore;
use super::period::period_start;
use super::subscription::PlanResolver;
use super::types::{Feature, UsageSnapshot};

/// Sums ledger entries for the current billing period
#[derive(Clone)]
pub struct UsageAggregator {
    ledger: LedgerStore,
    plans: PlanResolver,
}

impl UsageAggregator {
    pub fn new(ledger: LedgerStore, plans: PlanResolver) -> Self {
        Self { ledger, plans }
    }

    /// Usage and limits for the calendar month (UTC) containing `now`
    ///
    /// Every known feature is present in both maps. Pure read.
    pub async fn get_usage(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UsageSnapshot, UsageError> {
        let plan = self.plans.resolve_plan(user_id).await?;
        let start = period_start(now);
        let totals = self.ledger.sum_by_feature(user_id, start).await?;

        let usage = Feature::ALL
            .iter()
            .map(|f| (*f, totals.get(f).copied().unwrap_or(0)))
            .collect();

        Ok(UsageSnapshot {
            user_id: user_id.to_string(),
            plan: plan.id,
            period_start: start,
            usage,
            limits: plan.limits.to_map(),
        })
    }
}
