//! Usage ledger and quota enforcement
//!
//! Gates billable operations (hook, asset and video generation) by a monthly
//! credit allowance that depends on the user's plan.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ UsageService                                            │
//! │   - run_gated() / generate()                            │
//! └─────────────────────────────────────────────────────────┘
//!          │                                   │
//!          ▼                                   ▼
//! ┌──────────────────┐                ┌──────────────────┐
//! │ QuotaGate        │                │ LedgerStore      │
//! │   - check_limit()│                │   - append()     │
//! └──────────────────┘                └──────────────────┘
//!          │                                   ▲
//!          ▼                                   │
//! ┌──────────────────┐   sum_by_feature()      │
//! │ UsageAggregator  │─────────────────────────┘
//! │   - get_usage()  │
//! └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐      ┌───────────────────┐
//! │ PlanResolver     │─────▶│ SubscriptionStore │
//! │   - resolve_plan │      │   (billing-owned) │
//! └──────────────────┘      └───────────────────┘
//! ```
//!
//! The ledger table is the only source of truth: usage is always the sum of
//! its rows for the calendar month (UTC), never a cached counter.
//!
//! # Concurrency
//!
//! `check_limit` followed by `record_usage` is check-then-act. Two concurrent
//! requests that both see one credit left are both admitted, and the period
//! ends one credit over the limit. [`AdmissionMode::Serialized`] closes that
//! gap for callers within a single process only.
//!
//! # Usage
//!
//! ```ignore
//! use creditgate_core::services::usage::{Feature, GatedError, UsageService};
//!
//! let service = UsageService::new(&db);
//! match service.run_gated(&user_id, Feature::HookGeneration, 1, || provider.hooks(&brief)).await {
//!     Ok(hooks) => respond(hooks),
//!     Err(err) if err.is_quota_exceeded() => upgrade_prompt(),
//!     Err(err) => fail(err),
//! }
//! ```

pub mod aggregator;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod period;
pub mod provider;
pub mod service;
pub mod subscription;
pub mod types;

pub use aggregator::UsageAggregator;
pub use error::{GatedError, UsageError};
pub use gate::{evaluate, QuotaGate};
pub use ledger::{LedgerStore, StoredUsageRecord};
pub use period::{period_start, previous_period_start};
pub use provider::{GenerationError, GenerationOutput, GenerationProvider, GenerationRequest};
pub use service::UsageService;
pub use subscription::{plan_for_subscription, PlanResolver, SubscriptionStore};
pub use types::{
    AdmissionMode, Feature, FeatureLimit, Plan, PlanId, PlanLimits, UsageRecord, UsageSnapshot,
};
