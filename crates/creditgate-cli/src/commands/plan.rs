//! Plan commands
//!
//! Show the static plan table and the plan a user resolves to.

use anyhow::Result;
use clap::Subcommand;
use creditgate_core::{Feature, Plan};
use tabled::Tabled;

use super::Context;
use crate::output::print_rows;

#[derive(Subcommand)]
pub enum PlanAction {
    /// List every plan and its monthly limits
    List,

    /// Show the plan that applies to a user
    Show {
        /// User ID
        #[arg(long)]
        user: String,
    },
}

/// Plan row for table display
#[derive(Debug, Tabled)]
pub struct PlanRow {
    #[tabled(rename = "Plan")]
    pub plan: String,
    #[tabled(rename = "Hooks / month")]
    pub hooks: String,
    #[tabled(rename = "Assets / month")]
    pub assets: String,
    #[tabled(rename = "Videos / month")]
    pub videos: String,
}

impl From<&Plan> for PlanRow {
    fn from(plan: &Plan) -> Self {
        Self {
            plan: plan.id.to_string(),
            hooks: plan.limits.get(Feature::HookGeneration).to_string(),
            assets: plan.limits.get(Feature::AssetGeneration).to_string(),
            videos: plan.limits.get(Feature::VideoGeneration).to_string(),
        }
    }
}

pub async fn execute(ctx: &Context, action: PlanAction) -> Result<()> {
    match action {
        PlanAction::List => list_plans(ctx),
        PlanAction::Show { user } => show_plan(ctx, &user).await,
    }
}

fn list_plans(ctx: &Context) -> Result<()> {
    let plans = Plan::all();
    let rows: Vec<PlanRow> = plans.iter().map(PlanRow::from).collect();
    print_rows(&rows, &plans, ctx.format, "No plans configured.")
}

async fn show_plan(ctx: &Context, user: &str) -> Result<()> {
    let plan = ctx.service.resolve_plan(user).await?;
    print_rows(&[PlanRow::from(&plan)], &plan, ctx.format, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditgate_core::PlanId;

    #[test]
    fn test_plan_row_renders_unbounded() {
        let row = PlanRow::from(&Plan::for_id(PlanId::CreatorPro));
        assert_eq!(row.plan, "CREATOR_PRO");
        assert_eq!(row.hooks, "unlimited");
        assert_eq!(row.videos, "50");
    }

    #[test]
    fn test_plan_row_renders_disabled_feature_as_zero() {
        let row = PlanRow::from(&Plan::free());
        assert_eq!(row.videos, "0");
    }
}
