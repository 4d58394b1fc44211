//! Subscription commands
//!
//! Stand-in for the billing side: assigns plans to users. The quota path
//! never writes subscriptions.

use anyhow::Result;
use clap::Subcommand;
use creditgate_core::{PlanId, Subscription, SubscriptionStatus};
use tabled::Tabled;

use super::Context;
use crate::output::{print_rows, print_success};

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// Set a user's plan
    Set {
        /// User ID
        #[arg(long)]
        user: String,

        /// Plan: FREE, PRO or CREATOR_PRO
        #[arg(long)]
        plan: PlanId,

        /// Billing status: active, trialing, canceled, past_due
        #[arg(long, default_value = "active")]
        status: SubscriptionStatus,
    },

    /// Show a user's stored subscription row
    Show {
        /// User ID
        #[arg(long)]
        user: String,
    },
}

/// Subscription row for table display
#[derive(Debug, Tabled)]
pub struct SubscriptionRow {
    #[tabled(rename = "User")]
    pub user_id: String,
    #[tabled(rename = "Plan")]
    pub plan: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Updated")]
    pub updated_at: String,
}

impl From<&Subscription> for SubscriptionRow {
    fn from(sub: &Subscription) -> Self {
        Self {
            user_id: sub.user_id.clone(),
            plan: sub.plan.clone(),
            status: sub.status.clone(),
            updated_at: sub.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub async fn execute(ctx: &Context, action: SubscriptionAction) -> Result<()> {
    match action {
        SubscriptionAction::Set { user, plan, status } => {
            set_subscription(ctx, &user, plan, status).await
        }
        SubscriptionAction::Show { user } => show_subscription(ctx, &user).await,
    }
}

async fn set_subscription(
    ctx: &Context,
    user: &str,
    plan: PlanId,
    status: SubscriptionStatus,
) -> Result<()> {
    let sub = ctx
        .service
        .subscriptions()
        .set_plan(user, plan, status)
        .await?;
    print_success(
        &format!("{} is now on {} ({})", sub.user_id, sub.plan, sub.status),
        ctx.quiet,
    );
    Ok(())
}

async fn show_subscription(ctx: &Context, user: &str) -> Result<()> {
    let sub = ctx.service.subscriptions().get(user).await?;
    let rows: Vec<SubscriptionRow> = sub.iter().map(SubscriptionRow::from).collect();
    print_rows(
        &rows,
        &sub,
        ctx.format,
        &format!("No subscription for {} (resolves to FREE).", user),
    )
}
