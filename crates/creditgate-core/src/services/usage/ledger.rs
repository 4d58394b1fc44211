//! Ledger storage layer
//!
//! Append-only persistence of usage records to SQLite. Nothing here updates
//! or deletes a row; the table's triggers reject both.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::error::UsageError;
use super::types::{Feature, UsageRecord};

// ============================================================================
// Database Row Types
// ============================================================================

/// Database row representation of a usage record
///
/// This struct maps directly to the `usage_records` table schema.
#[derive(Debug, Clone, FromRow)]
pub struct StoredUsageRecord {
    pub id: String,
    pub user_id: String,
    pub feature: String,
    pub credits: i64,
    /// Milliseconds since the Unix epoch
    pub occurred_at: i64,
}

impl StoredUsageRecord {
    /// Convert database row to UsageRecord
    ///
    /// A row that does not parse means the ledger cannot be trusted, so this
    /// fails instead of skipping it.
    pub fn to_usage_record(&self) -> Result<UsageRecord, UsageError> {
        let feature = parse_stored_feature(&self.feature)?;
        let occurred_at = DateTime::<Utc>::from_timestamp_millis(self.occurred_at).ok_or_else(|| {
            UsageError::store_unavailable(format!(
                "usage record {} has invalid timestamp {}",
                self.id, self.occurred_at
            ))
        })?;

        Ok(UsageRecord {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            feature,
            credits: self.credits,
            occurred_at,
        })
    }
}

fn parse_stored_feature(raw: &str) -> Result<Feature, UsageError> {
    raw.parse::<Feature>().map_err(|_| {
        log::error!("[usage:ledger] Unrecognized feature in ledger: {}", raw);
        UsageError::store_unavailable(format!("unrecognized feature in ledger: {}", raw))
    })
}

// ============================================================================
// LedgerStore
// ============================================================================

/// Append-only store of usage records
#[derive(Clone)]
pub struct LedgerStore {
    pool: SqlitePool,
}

impl LedgerStore {
    /// Create a new LedgerStore with the given database pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one usage record
    ///
    /// Does not look at quota; callers gate before recording.
    ///
    /// # Errors
    /// `InvalidArgument` for non-positive credits, `StoreUnavailable` if the
    /// insert fails.
    pub async fn append(
        &self,
        user_id: &str,
        feature: Feature,
        credits: i64,
        occurred_at: DateTime<Utc>,
    ) -> Result<UsageRecord, UsageError> {
        if credits <= 0 {
            return Err(UsageError::invalid_argument(format!(
                "credits must be positive, got {}",
                credits
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        // Stored at millisecond precision; return what a read would return
        let occurred_ms = occurred_at.timestamp_millis();
        let occurred_at = DateTime::<Utc>::from_timestamp_millis(occurred_ms).unwrap_or(occurred_at);

        sqlx::query(
            r#"
            INSERT INTO usage_records (id, user_id, feature, credits, occurred_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(feature.as_str())
        .bind(credits)
        .bind(occurred_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| UsageError::store_unavailable(format!("Failed to append usage record: {}", e)))?;

        log::info!(
            "[usage:ledger] Recorded {} credit(s) of {} for user {}",
            credits,
            feature,
            user_id
        );

        Ok(UsageRecord {
            id,
            user_id: user_id.to_string(),
            feature,
            credits,
            occurred_at,
        })
    }

    /// Sum credits per feature for records at or after `since`
    ///
    /// Only features with at least one record appear in the result.
    pub async fn sum_by_feature(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<BTreeMap<Feature, i64>, UsageError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT feature, SUM(credits) AS credits
            FROM usage_records
            WHERE user_id = ? AND occurred_at >= ?
            GROUP BY feature
            "#,
        )
        .bind(user_id)
        .bind(since.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UsageError::store_unavailable(format!("Failed to aggregate usage: {}", e)))?;

        let mut totals = BTreeMap::new();
        for (feature, credits) in rows {
            totals.insert(parse_stored_feature(&feature)?, credits);
        }

        log::debug!(
            "[usage:ledger] Aggregated {} feature(s) for user {} since {}",
            totals.len(),
            user_id,
            since.to_rfc3339()
        );

        Ok(totals)
    }

    /// List a user's records, oldest first
    ///
    /// # Arguments
    /// * `user_id` - The user whose records to list
    /// * `since` - Only records at or after this instant; `None` lists all
    pub async fn list_records(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<UsageRecord>, UsageError> {
        let since_ms = since.map(|dt| dt.timestamp_millis()).unwrap_or(i64::MIN);

        let rows = sqlx::query_as::<_, StoredUsageRecord>(
            r#"
            SELECT id, user_id, feature, credits, occurred_at
            FROM usage_records
            WHERE user_id = ? AND occurred_at >= ?
            ORDER BY occurred_at ASC, rowid ASC
            "#,
        )
        .bind(user_id)
        .bind(since_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UsageError::store_unavailable(format!("Failed to list usage records: {}", e)))?;

        rows.iter().map(|row| row.to_usage_record()).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
