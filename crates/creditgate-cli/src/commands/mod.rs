//! CLI commands module
//!
//! Contains all CLI command implementations.

pub mod ledger;
pub mod plan;
pub mod subscription;
pub mod usage;

use crate::output::OutputFormat;
use creditgate_core::UsageService;

/// Shared context for all commands
pub struct Context {
    pub service: UsageService,
    pub format: OutputFormat,
    pub quiet: bool,
}
