//! Usage ledger error types

use thiserror::Error;

use super::types::Feature;

/// Errors surfaced by the plan resolver, aggregator, gate and ledger writer.
///
/// Nothing in the usage module recovers locally: every failure reaches the
/// caller, which decides whether to retry the whole gated operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// The requested cost would push usage past the plan limit
    #[error("Quota exceeded for {feature}: {current} of {limit} credits used")]
    QuotaExceeded {
        feature: Feature,
        current: i64,
        limit: i64,
    },

    /// Bad call site input (non-positive cost, unknown feature or plan name)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The ledger or subscription store could not be read or written
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl UsageError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        UsageError::InvalidArgument(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        UsageError::StoreUnavailable(msg.into())
    }

    /// Whether the route layer should render an upgrade prompt for this error
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, UsageError::QuotaExceeded { .. })
    }
}

impl From<sqlx::Error> for UsageError {
    fn from(err: sqlx::Error) -> Self {
        UsageError::StoreUnavailable(err.to_string())
    }
}

/// Failure of a gated operation: either the gate/ledger refused, or the
/// billable operation itself failed (in which case nothing was charged).
#[derive(Error, Debug)]
pub enum GatedError<E> {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("Operation failed: {0}")]
    Operation(E),
}

impl<E> GatedError<E> {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, GatedError::Usage(err) if err.is_quota_exceeded())
    }

    /// The usage error, if the gate or ledger caused the failure
    pub fn usage_error(&self) -> Option<&UsageError> {
        match self {
            GatedError::Usage(err) => Some(err),
            GatedError::Operation(_) => None,
        }
    }
}
