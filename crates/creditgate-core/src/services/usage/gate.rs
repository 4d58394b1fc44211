//! Quota gate
//!
//! Decides whether an operation costing N credits may run. The gate only
//! reads: it reserves nothing, so a check followed later by a ledger write
//! is not atomic.

use chrono::{DateTime, Utc};

use super::aggregator::UsageAggregator;
use super::error::UsageError;
use super::types::{Feature, FeatureLimit, UsageSnapshot};

#[derive(Clone)]
pub struct QuotaGate {
    aggregator: UsageAggregator,
}

impl QuotaGate {
    pub fn new(aggregator: UsageAggregator) -> Self {
        Self { aggregator }
    }

    /// Check against the current period
    pub async fn check_limit(
        &self,
        user_id: &str,
        feature: Feature,
        cost: i64,
    ) -> Result<(), UsageError> {
        self.check_limit_at(user_id, feature, cost, Utc::now()).await
    }

    /// Check against the period containing `now`
    pub async fn check_limit_at(
        &self,
        user_id: &str,
        feature: Feature,
        cost: i64,
        now: DateTime<Utc>,
    ) -> Result<(), UsageError> {
        validate_cost(cost)?;

        let snapshot = self.aggregator.get_usage(user_id, now).await?;
        let decision = evaluate(&snapshot, feature, cost);

        if let Err(err) = &decision {
            log::warn!("[usage:gate] Denied user {}: {}", user_id, err);
        } else {
            log::debug!(
                "[usage:gate] Allowed {} credit(s) of {} for user {}",
                cost,
                feature,
                user_id
            );
        }

        decision
    }
}

pub(crate) fn validate_cost(cost: i64) -> Result<(), UsageError> {
    if cost <= 0 {
        return Err(UsageError::invalid_argument(format!(
            "cost must be positive, got {}",
            cost
        )));
    }
    Ok(())
}

/// Gate decision for a snapshot, without touching the store
pub fn evaluate(snapshot: &UsageSnapshot, feature: Feature, cost: i64) -> Result<(), UsageError> {
    validate_cost(cost)?;

    let current = snapshot.usage_of(feature);
    match snapshot.limit_of(feature) {
        FeatureLimit::Unbounded => Ok(()),
        limit @ FeatureLimit::Limited(max) => {
            if limit.allows(current, cost) {
                Ok(())
            } else {
                Err(UsageError::QuotaExceeded {
                    feature,
                    current,
                    limit: max,
                })
            }
        }
    }
}
