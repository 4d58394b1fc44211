//! Subscription lookup and plan resolution

use chrono::Utc;
use sqlx::SqlitePool;

use super::error::UsageError;
use super::types::{Plan, PlanId};
use crate::models::{Subscription, SubscriptionStatus};

/// Read/write access to the `subscriptions` table
///
/// Writes belong to the billing side (payment webhooks, the CLI). The quota
/// path only ever calls [`SubscriptionStore::get`].
#[derive(Clone)]
pub struct SubscriptionStore {
    pool: SqlitePool,
}

impl SubscriptionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current subscription row for a user, if any
    pub async fn get(&self, user_id: &str) -> Result<Option<Subscription>, UsageError> {
        let row = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT user_id, plan, status, created_at, updated_at
            FROM subscriptions
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UsageError::store_unavailable(format!("Failed to read subscription: {}", e)))?;

        Ok(row)
    }

    /// Create or replace a user's subscription plan and status
    pub async fn set_plan(
        &self,
        user_id: &str,
        plan: PlanId,
        status: SubscriptionStatus,
    ) -> Result<Subscription, UsageError> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, plan, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                plan = excluded.plan,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(plan.as_str())
        .bind(status.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| UsageError::store_unavailable(format!("Failed to save subscription: {}", e)))?;

        log::info!(
            "[usage:subscription] User {} is now on {} ({})",
            user_id,
            plan,
            status
        );

        self.get(user_id).await?.ok_or_else(|| {
            UsageError::store_unavailable(format!("Subscription for {} vanished after write", user_id))
        })
    }
}

/// Maps a user's subscription (or its absence) to a plan
#[derive(Clone)]
pub struct PlanResolver {
    subscriptions: SubscriptionStore,
}

impl PlanResolver {
    pub fn new(subscriptions: SubscriptionStore) -> Self {
        Self { subscriptions }
    }

    /// Resolve the plan that currently applies to a user
    ///
    /// Missing rows, unrecognized plan identifiers and non-entitled statuses
    /// all resolve to FREE. Only a store failure is an error.
    pub async fn resolve_plan(&self, user_id: &str) -> Result<Plan, UsageError> {
        let subscription = self.subscriptions.get(user_id).await?;
        let plan = plan_for_subscription(subscription.as_ref());

        log::debug!("[usage:plan] Resolved {} for user {}", plan.id, user_id);

        Ok(plan)
    }
}

/// Plan implied by a subscription row
pub fn plan_for_subscription(subscription: Option<&Subscription>) -> Plan {
    let Some(sub) = subscription else {
        return Plan::free();
    };

    if !sub.status().is_entitled() {
        log::debug!(
            "[usage:plan] Subscription for {} is {}, falling back to FREE",
            sub.user_id,
            sub.status
        );
        return Plan::free();
    }

    match sub.plan.parse::<PlanId>() {
        Ok(id) => Plan::for_id(id),
        Err(_) => {
            log::warn!(
                "[usage:plan] Unrecognized plan '{}' for user {}, falling back to FREE",
                sub.plan,
                sub.user_id
            );
            Plan::free()
        }
    }
}
