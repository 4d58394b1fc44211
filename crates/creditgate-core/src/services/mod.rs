//! Services module

pub mod usage;

pub use usage::{
    AdmissionMode, Feature, FeatureLimit, GatedError, GenerationError, GenerationOutput,
    GenerationProvider, GenerationRequest, Plan, PlanId, PlanLimits, UsageError, UsageRecord,
    UsageService, UsageSnapshot,
};
