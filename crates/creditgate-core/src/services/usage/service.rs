//! Usage service
//!
//! Facade wiring the plan resolver, aggregator, gate and ledger writer over
//! one database, plus the gated-execution flow route handlers use:
//!
//! ```text
//! [Request] --check_limit--> (Allowed) --op--> (Success) --record_usage--> [Done]
//!                 |                        |
//!           (QuotaExceeded)         (OperationFailed)
//!                 |                        |
//!             [Rejected]          [Rejected, no charge]
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::aggregator::UsageAggregator;
use super::error::{GatedError, UsageError};
use super::gate::QuotaGate;
use super::ledger::LedgerStore;
use super::period::period_start;
use super::provider::{GenerationError, GenerationOutput, GenerationProvider, GenerationRequest};
use super::subscription::{PlanResolver, SubscriptionStore};
use super::types::{AdmissionMode, Feature, Plan, UsageRecord, UsageSnapshot};
use crate::db::Database;

type LockKey = (String, Feature);
type LockMap = Arc<Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>>;

/// Entry point for everything quota related
#[derive(Clone)]
pub struct UsageService {
    subscriptions: SubscriptionStore,
    plans: PlanResolver,
    aggregator: UsageAggregator,
    gate: QuotaGate,
    ledger: LedgerStore,
    mode: AdmissionMode,
    locks: LockMap,
}

impl UsageService {
    pub fn new(db: &Database) -> Self {
        let subscriptions = SubscriptionStore::new(db.pool.clone());
        let ledger = LedgerStore::new(db.pool.clone());
        let plans = PlanResolver::new(subscriptions.clone());
        let aggregator = UsageAggregator::new(ledger.clone(), plans.clone());
        let gate = QuotaGate::new(aggregator.clone());

        Self {
            subscriptions,
            plans,
            aggregator,
            gate,
            ledger,
            mode: AdmissionMode::default(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_mode(mut self, mode: AdmissionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> AdmissionMode {
        self.mode
    }

    /// Billing-side access to subscription rows
    pub fn subscriptions(&self) -> &SubscriptionStore {
        &self.subscriptions
    }

    pub async fn resolve_plan(&self, user_id: &str) -> Result<Plan, UsageError> {
        self.plans.resolve_plan(user_id).await
    }

    pub async fn get_usage(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UsageSnapshot, UsageError> {
        self.aggregator.get_usage(user_id, now).await
    }

    pub async fn check_limit(
        &self,
        user_id: &str,
        feature: Feature,
        cost: i64,
    ) -> Result<(), UsageError> {
        self.gate.check_limit(user_id, feature, cost).await
    }

    /// Append a usage record stamped with the current time
    ///
    /// Never consults the quota. Call only after the billable operation has
    /// succeeded.
    pub async fn record_usage(
        &self,
        user_id: &str,
        feature: Feature,
        credits: i64,
    ) -> Result<UsageRecord, UsageError> {
        self.ledger.append(user_id, feature, credits, Utc::now()).await
    }

    /// Records in the current period, oldest first
    pub async fn list_period_records(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>, UsageError> {
        self.ledger
            .list_records(user_id, Some(period_start(now)))
            .await
    }

    /// Every record for a user, oldest first
    pub async fn list_all_records(&self, user_id: &str) -> Result<Vec<UsageRecord>, UsageError> {
        self.ledger.list_records(user_id, None).await
    }

    /// Run a billable operation behind the gate
    ///
    /// The operation only runs if the check passes, and usage is recorded
    /// only if it returns `Ok`. In [`AdmissionMode::Serialized`] the whole
    /// sequence holds a per-(user, feature) lock.
    pub async fn run_gated<T, E, F, Fut>(
        &self,
        user_id: &str,
        feature: Feature,
        cost: i64,
        op: F,
    ) -> Result<T, GatedError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Held until this future completes or is dropped
        let _lease = match self.mode {
            AdmissionMode::Serialized => Some(self.acquire(user_id, feature).await),
            AdmissionMode::CheckThenAct => None,
        };

        self.run_gated_inner(user_id, feature, cost, op).await
    }

    async fn run_gated_inner<T, E, F, Fut>(
        &self,
        user_id: &str,
        feature: Feature,
        cost: i64,
        op: F,
    ) -> Result<T, GatedError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.gate.check_limit(user_id, feature, cost).await?;

        let output = match op().await {
            Ok(output) => output,
            Err(err) => {
                log::info!(
                    "[usage:service] {} for user {} failed, nothing charged",
                    feature,
                    user_id
                );
                return Err(GatedError::Operation(err));
            }
        };

        if let Err(err) = self.record_usage(user_id, feature, cost).await {
            // The operation already happened; the caller decides what to do
            log::error!(
                "[usage:service] {} for user {} succeeded but was not recorded: {}",
                feature,
                user_id,
                err
            );
            return Err(err.into());
        }

        Ok(output)
    }

    /// Run a generation through the gate, charging the request's credits
    pub async fn generate(
        &self,
        provider: &dyn GenerationProvider,
        user_id: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GatedError<GenerationError>> {
        request.validate()?;
        if !provider.supports(request.feature) {
            return Err(UsageError::invalid_argument(format!(
                "provider {} does not support {}",
                provider.provider_id(),
                request.feature
            ))
            .into());
        }

        self.run_gated(user_id, request.feature, request.credits, || {
            provider.generate(request)
        })
        .await
    }

    async fn acquire(&self, user_id: &str, feature: Feature) -> LockLease {
        let key = (user_id.to_string(), feature);
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        LockLease {
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.locks),
            key,
        }
    }
}

/// Serialized-mode hold on one (user, feature) lock
///
/// Dropping it unlocks the mutex and prunes the map entry once nobody else
/// holds or waits on it, including when the gated future is cancelled.
struct LockLease {
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
    key: LockKey,
}

impl Drop for LockLease {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_service() -> (UsageService, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(temp_dir.path().join("service.db"))
            .await
            .expect("Failed to create test database");
        (UsageService::new(&db), temp_dir)
    }

    #[tokio::test]
    async fn test_failed_operation_is_not_charged() {
        let (service, _dir) = create_service().await;

        let result: Result<(), GatedError<String>> = service
            .run_gated("u1", Feature::HookGeneration, 1, || async {
                Err("provider down".to_string())
            })
            .await;
        assert!(matches!(result, Err(GatedError::Operation(_))));

        let snapshot = service.get_usage("u1", Utc::now()).await.unwrap();
        assert_eq!(snapshot.usage_of(Feature::HookGeneration), 0);
    }

    #[tokio::test]
    async fn test_denied_operation_never_runs() {
        let (service, _dir) = create_service().await;
        let mut ran = false;

        let result: Result<(), GatedError<String>> = service
            .run_gated("u1", Feature::VideoGeneration, 1, || {
                ran = true;
                async { Ok(()) }
            })
            .await;

        assert!(result.unwrap_err().is_quota_exceeded());
        assert!(!ran);
    }

    #[tokio::test]
    async fn test_successful_operation_is_charged_once() {
        let (service, _dir) = create_service().await;

        let value = service
            .run_gated("u1", Feature::AssetGeneration, 2, || async {
                Ok::<_, String>("banner.png")
            })
            .await
            .unwrap();
        assert_eq!(value, "banner.png");

        let records = service.list_period_records("u1", Utc::now()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].credits, 2);
    }

    #[tokio::test]
    async fn test_serialized_lock_entries_are_released() {
        let (service, _dir) = create_service().await;
        let service = service.with_mode(AdmissionMode::Serialized);

        service
            .run_gated("u1", Feature::HookGeneration, 1, || async { Ok::<_, String>(()) })
            .await
            .unwrap();

        assert!(service.locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_serialized_run_releases_lock_entry() {
        let (service, _dir) = create_service().await;
        let service = service.with_mode(AdmissionMode::Serialized);

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            service.run_gated("u1", Feature::HookGeneration, 1, || {
                std::future::pending::<Result<(), String>>()
            }),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(service.locks.lock().unwrap().is_empty());

        // The key is usable again and the cancelled run charged nothing
        service
            .run_gated("u1", Feature::HookGeneration, 1, || async { Ok::<_, String>(()) })
            .await
            .unwrap();
        let records = service.list_period_records("u1", Utc::now()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(service.locks.lock().unwrap().is_empty());
    }
}
