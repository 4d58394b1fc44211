//! Ledger commands
//!
//! Read-only listing of usage records.

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use creditgate_core::UsageRecord;
use tabled::Tabled;

use super::Context;
use crate::output::print_rows;

#[derive(Subcommand)]
pub enum LedgerAction {
    /// List a user's usage records (current month unless --all)
    List {
        /// User ID
        #[arg(long)]
        user: String,

        /// Include records from previous billing periods
        #[arg(long)]
        all: bool,
    },
}

/// Ledger row for table display
#[derive(Debug, Tabled)]
pub struct LedgerRow {
    #[tabled(rename = "When (UTC)")]
    pub occurred_at: String,
    #[tabled(rename = "Feature")]
    pub feature: String,
    #[tabled(rename = "Credits")]
    pub credits: i64,
    #[tabled(rename = "ID")]
    pub id: String,
}

impl From<&UsageRecord> for LedgerRow {
    fn from(record: &UsageRecord) -> Self {
        Self {
            occurred_at: record.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            feature: record.feature.to_string(),
            credits: record.credits,
            id: record.id.clone(),
        }
    }
}

pub async fn execute(ctx: &Context, action: LedgerAction) -> Result<()> {
    match action {
        LedgerAction::List { user, all } => list_records(ctx, &user, all).await,
    }
}

async fn list_records(ctx: &Context, user: &str, all: bool) -> Result<()> {
    let records = if all {
        ctx.service.list_all_records(user).await?
    } else {
        ctx.service.list_period_records(user, Utc::now()).await?
    };

    let rows: Vec<LedgerRow> = records.iter().map(LedgerRow::from).collect();
    print_rows(&rows, &records, ctx.format, "No usage records found.")
}
