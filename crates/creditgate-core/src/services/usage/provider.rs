//! Generation provider trait and request types
//!
//! The generative backend (text, image, video) is an external collaborator.
//! Route handlers hand a provider to [`UsageService::generate`] so the call
//! runs behind the quota gate and is only charged on success.
//!
//! [`UsageService::generate`]: super::service::UsageService::generate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::UsageError;
use super::types::Feature;

// ============================================================================
// Error Types
// ============================================================================

/// Errors a generation provider can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Provider rejected the prompt (safety filter, malformed options)
    #[error("Rejected by provider: {0}")]
    Rejected(String),

    /// Provider did not answer in time
    #[error("Provider timed out")]
    Timeout,

    /// Any other provider-side failure
    #[error("Provider error: {0}")]
    Provider(String),
}

// ============================================================================
// Request / Output
// ============================================================================

/// Typed request for one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub feature: Feature,
    pub prompt: String,
    /// Number of variants to produce
    pub variants: u32,
    /// Credits charged on success
    pub credits: i64,
}

impl GenerationRequest {
    pub fn new(feature: Feature, prompt: impl Into<String>) -> Self {
        Self {
            feature,
            prompt: prompt.into(),
            variants: 1,
            credits: Feature::DEFAULT_COST,
        }
    }

    pub fn with_variants(mut self, variants: u32) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_credits(mut self, credits: i64) -> Self {
        self.credits = credits;
        self
    }

    /// Reject malformed requests before they reach the gate
    pub fn validate(&self) -> Result<(), UsageError> {
        if self.prompt.trim().is_empty() {
            return Err(UsageError::invalid_argument("prompt must not be empty"));
        }
        if self.variants == 0 {
            return Err(UsageError::invalid_argument("variants must be at least 1"));
        }
        if self.credits <= 0 {
            return Err(UsageError::invalid_argument(format!(
                "credits must be positive, got {}",
                self.credits
            )));
        }
        Ok(())
    }
}

/// Content produced by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub feature: Feature,
    /// Generated text, or a URL for media outputs
    pub items: Vec<String>,
    pub provider: String,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Trait for generative backends
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Unique identifier for this provider, e.g. "openai"
    fn provider_id(&self) -> &'static str;

    /// Whether this provider can serve a feature at all
    fn supports(&self, feature: Feature) -> bool {
        let _ = feature;
        true
    }

    /// Run one generation
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req = GenerationRequest::new(Feature::HookGeneration, "coffee brand hooks");
        assert_eq!(req.variants, 1);
        assert_eq!(req.credits, 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_every_feature_defaults_to_one_credit() {
        assert_eq!(Feature::DEFAULT_COST, 1);
        for feature in Feature::ALL {
            let req = GenerationRequest::new(feature, "launch teaser");
            assert_eq!(req.credits, Feature::DEFAULT_COST);
            assert!(req.validate().is_ok());
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(GenerationRequest::new(Feature::HookGeneration, "   ")
            .validate()
            .is_err());
        assert!(GenerationRequest::new(Feature::HookGeneration, "x")
            .with_variants(0)
            .validate()
            .is_err());
        assert!(GenerationRequest::new(Feature::HookGeneration, "x")
            .with_credits(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_generation_error_display() {
        assert_eq!(GenerationError::Timeout.to_string(), "Provider timed out");
        assert_eq!(
            GenerationError::Rejected("nsfw".to_string()).to_string(),
            "Rejected by provider: nsfw"
        );
    }
}
