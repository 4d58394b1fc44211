//! # creditgate-core
//!
//! Usage ledger and quota enforcement for Creditgate - shared between the CLI
//! and the HTTP route handlers.
//!
//! This crate provides:
//! - Database operations (`db` module)
//! - Data models (`models` module)
//! - Plan resolution, usage aggregation, the quota gate and the ledger
//!   writer (`services::usage` module)
//! - Unified error handling (`error` module)

pub mod db;
pub mod error;
pub mod models;
pub mod services;

// Re-exports for convenience
pub use db::Database;
pub use error::{Error, Result};

pub use models::{Subscription, SubscriptionStatus};

pub use services::{
    AdmissionMode, Feature, FeatureLimit, GatedError, GenerationError, GenerationOutput,
    GenerationProvider, GenerationRequest, Plan, PlanId, PlanLimits, UsageError, UsageRecord,
    UsageService, UsageSnapshot,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_version_format() {
        let v = version();
        // Should be semver format: x.y.z
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "Version should be in x.y.z format");
    }
}
