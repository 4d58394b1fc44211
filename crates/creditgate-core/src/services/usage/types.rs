//! Usage ledger types
//!
//! Features, plans and their limits, ledger records and usage snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::UsageError;

// ============================================================================
// Features
// ============================================================================

/// A gated operation category with its own monthly credit limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    /// Short-form hook copy generation (text)
    HookGeneration,
    /// Marketing asset generation (images)
    AssetGeneration,
    /// Video generation
    VideoGeneration,
}

impl Feature {
    /// Every feature known to this deployment
    pub const ALL: [Feature; 3] = [
        Feature::HookGeneration,
        Feature::AssetGeneration,
        Feature::VideoGeneration,
    ];

    /// Credits charged for one successful operation of any feature
    pub const DEFAULT_COST: i64 = 1;

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::HookGeneration => "HOOK_GENERATION",
            Feature::AssetGeneration => "ASSET_GENERATION",
            Feature::VideoGeneration => "VIDEO_GENERATION",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Feature {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "HOOK_GENERATION" | "HOOKS" | "HOOK" => Ok(Feature::HookGeneration),
            "ASSET_GENERATION" | "ASSETS" | "ASSET" | "IMAGE" => Ok(Feature::AssetGeneration),
            "VIDEO_GENERATION" | "VIDEOS" | "VIDEO" => Ok(Feature::VideoGeneration),
            _ => Err(UsageError::invalid_argument(format!("Unknown feature: {}", s))),
        }
    }
}

// ============================================================================
// Plans
// ============================================================================

/// Subscription tier identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanId {
    #[default]
    Free,
    Pro,
    CreatorPro,
}

impl PlanId {
    pub const ALL: [PlanId; 3] = [PlanId::Free, PlanId::Pro, PlanId::CreatorPro];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Free => "FREE",
            PlanId::Pro => "PRO",
            PlanId::CreatorPro => "CREATOR_PRO",
        }
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanId {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "FREE" => Ok(PlanId::Free),
            "PRO" => Ok(PlanId::Pro),
            "CREATOR_PRO" | "CREATORPRO" => Ok(PlanId::CreatorPro),
            _ => Err(UsageError::invalid_argument(format!("Unknown plan: {}", s))),
        }
    }
}

/// Monthly credit limit for one feature
///
/// Serializes as a number, or `null` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureLimit {
    /// At most this many credits per billing period; 0 disables the feature
    Limited(i64),
    /// No cap
    Unbounded,
}

impl FeatureLimit {
    /// Whether `cost` more credits fit on top of `current`
    pub fn allows(&self, current: i64, cost: i64) -> bool {
        match self {
            FeatureLimit::Unbounded => true,
            FeatureLimit::Limited(limit) => current.saturating_add(cost) <= *limit,
        }
    }

    /// Credits left in the period, `None` when unbounded
    pub fn remaining(&self, current: i64) -> Option<i64> {
        match self {
            FeatureLimit::Unbounded => None,
            FeatureLimit::Limited(limit) => Some((limit - current).max(0)),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, FeatureLimit::Unbounded)
    }
}

impl std::fmt::Display for FeatureLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureLimit::Limited(limit) => write!(f, "{}", limit),
            FeatureLimit::Unbounded => write!(f, "unlimited"),
        }
    }
}

/// Per-feature monthly limits of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub hook_generation: FeatureLimit,
    pub asset_generation: FeatureLimit,
    pub video_generation: FeatureLimit,
}

impl PlanLimits {
    /// Static limit table for a plan
    pub fn for_plan(plan: PlanId) -> Self {
        match plan {
            PlanId::Free => Self {
                hook_generation: FeatureLimit::Limited(5),
                asset_generation: FeatureLimit::Limited(3),
                video_generation: FeatureLimit::Limited(0),
            },
            PlanId::Pro => Self {
                hook_generation: FeatureLimit::Limited(100),
                asset_generation: FeatureLimit::Limited(50),
                video_generation: FeatureLimit::Limited(10),
            },
            PlanId::CreatorPro => Self {
                hook_generation: FeatureLimit::Unbounded,
                asset_generation: FeatureLimit::Limited(500),
                video_generation: FeatureLimit::Limited(50),
            },
        }
    }

    pub fn get(&self, feature: Feature) -> FeatureLimit {
        match feature {
            Feature::HookGeneration => self.hook_generation,
            Feature::AssetGeneration => self.asset_generation,
            Feature::VideoGeneration => self.video_generation,
        }
    }

    /// Limits keyed by feature, every feature present
    pub fn to_map(&self) -> BTreeMap<Feature, FeatureLimit> {
        Feature::ALL.iter().map(|f| (*f, self.get(*f))).collect()
    }
}

/// A named tier and its limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub limits: PlanLimits,
}

impl Plan {
    pub fn for_id(id: PlanId) -> Self {
        Self {
            id,
            limits: PlanLimits::for_plan(id),
        }
    }

    pub fn free() -> Self {
        Self::for_id(PlanId::Free)
    }

    pub fn all() -> Vec<Plan> {
        PlanId::ALL.iter().map(|id| Plan::for_id(*id)).collect()
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Immutable fact that a user consumed credits of a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub user_id: String,
    pub feature: Feature,
    pub credits: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Decision-ready view of one user's consumption in the current period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub user_id: String,
    pub plan: PlanId,
    /// Start of the calendar month (UTC) the snapshot covers
    pub period_start: DateTime<Utc>,
    pub usage: BTreeMap<Feature, i64>,
    pub limits: BTreeMap<Feature, FeatureLimit>,
}

impl UsageSnapshot {
    pub fn usage_of(&self, feature: Feature) -> i64 {
        self.usage.get(&feature).copied().unwrap_or(0)
    }

    pub fn limit_of(&self, feature: Feature) -> FeatureLimit {
        self.limits
            .get(&feature)
            .copied()
            .unwrap_or_else(|| PlanLimits::for_plan(self.plan).get(feature))
    }

    /// Credits left for a feature, `None` when unbounded
    pub fn remaining(&self, feature: Feature) -> Option<i64> {
        self.limit_of(feature).remaining(self.usage_of(feature))
    }
}

// ============================================================================
// Admission
// ============================================================================

/// How gated operations are admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    /// Check, run, then record. Concurrent calls may over-admit.
    #[default]
    CheckThenAct,
    /// Hold a per-(user, feature) lock across check, run and record.
    /// Only serializes callers within one process.
    Serialized,
}

impl std::fmt::Display for AdmissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionMode::CheckThenAct => write!(f, "check_then_act"),
            AdmissionMode::Serialized => write!(f, "serialized"),
        }
    }
}

impl std::str::FromStr for AdmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "check_then_act" | "soft" => Ok(AdmissionMode::CheckThenAct),
            "serialized" | "strict" => Ok(AdmissionMode::Serialized),
            _ => Err(format!("Unknown admission mode: {}", s)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
