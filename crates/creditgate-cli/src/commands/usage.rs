//! Usage commands
//!
//! Show the current period's usage, run the quota gate, and append usage.

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use creditgate_core::{Feature, UsageError, UsageSnapshot};
use tabled::Tabled;

use super::Context;
use crate::output::{print_info, print_rows, print_success, print_warning, OutputFormat};

#[derive(Subcommand)]
pub enum UsageAction {
    /// Show usage and limits for the current billing month
    Show {
        /// User ID
        #[arg(long)]
        user: String,
    },

    /// Check whether an operation may run (exits non-zero when denied)
    Check {
        /// User ID
        #[arg(long)]
        user: String,

        /// Feature: HOOK_GENERATION, ASSET_GENERATION, VIDEO_GENERATION
        #[arg(long)]
        feature: Feature,

        /// Credits the operation would cost
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        cost: i64,
    },

    /// Append a usage record for a completed operation
    Record {
        /// User ID
        #[arg(long)]
        user: String,

        /// Feature: HOOK_GENERATION, ASSET_GENERATION, VIDEO_GENERATION
        #[arg(long)]
        feature: Feature,

        /// Credits consumed
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        credits: i64,
    },
}

/// Usage row for table display
#[derive(Debug, Tabled)]
pub struct UsageRow {
    #[tabled(rename = "Feature")]
    pub feature: String,
    #[tabled(rename = "Used")]
    pub used: i64,
    #[tabled(rename = "Limit")]
    pub limit: String,
    #[tabled(rename = "Remaining")]
    pub remaining: String,
}

pub fn usage_rows(snapshot: &UsageSnapshot) -> Vec<UsageRow> {
    Feature::ALL
        .iter()
        .map(|feature| UsageRow {
            feature: feature.to_string(),
            used: snapshot.usage_of(*feature),
            limit: snapshot.limit_of(*feature).to_string(),
            remaining: snapshot
                .remaining(*feature)
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unlimited".to_string()),
        })
        .collect()
}

pub async fn execute(ctx: &Context, action: UsageAction) -> Result<()> {
    match action {
        UsageAction::Show { user } => show_usage(ctx, &user).await,
        UsageAction::Check { user, feature, cost } => check_usage(ctx, &user, feature, cost).await,
        UsageAction::Record {
            user,
            feature,
            credits,
        } => record_usage(ctx, &user, feature, credits).await,
    }
}

async fn show_usage(ctx: &Context, user: &str) -> Result<()> {
    let snapshot = ctx.service.get_usage(user, Utc::now()).await?;
    if ctx.format == OutputFormat::Table {
        print_info(
            &format!(
                "{} on {} since {}",
                snapshot.user_id,
                snapshot.plan,
                snapshot.period_start.format("%Y-%m-%d")
            ),
            ctx.quiet,
        );
    }
    print_rows(&usage_rows(&snapshot), &snapshot, ctx.format, "")
}

async fn check_usage(ctx: &Context, user: &str, feature: Feature, cost: i64) -> Result<()> {
    match ctx.service.check_limit(user, feature, cost).await {
        Ok(()) => {
            print_success(&format!("Allowed: {} x{} for {}", feature, cost, user), ctx.quiet);
            Ok(())
        }
        Err(err @ UsageError::QuotaExceeded { .. }) => {
            print_warning("Upgrade the plan to raise this limit.");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

async fn record_usage(ctx: &Context, user: &str, feature: Feature, credits: i64) -> Result<()> {
    let record = ctx.service.record_usage(user, feature, credits).await?;
    print_success(
        &format!(
            "Recorded {} credit(s) of {} for {} ({})",
            record.credits, record.feature, record.user_id, record.id
        ),
        ctx.quiet,
    );
    Ok(())
}
