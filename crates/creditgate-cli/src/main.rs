//! Creditgate CLI - plans, usage and the credit ledger
//!
//! A command-line interface for inspecting and operating the usage ledger:
//! resolving plans, checking quota, recording usage and assigning
//! subscriptions on behalf of the billing side.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use creditgate_core::AdmissionMode;

#[derive(Parser)]
#[command(name = "creditgate")]
#[command(author, version, about = "Credit ledger and quota CLI", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: table (default) or json
    #[arg(long, global = true, default_value = "table")]
    format: output::OutputFormat,

    /// Suppress progress messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Override database path (or set CREDITGATE_DB_PATH env var)
    #[arg(long, env = "CREDITGATE_DB_PATH", global = true)]
    db: Option<String>,

    /// Admission mode for gated runs: check_then_act (default) or serialized
    #[arg(
        long,
        env = "CREDITGATE_ADMISSION",
        global = true,
        default_value = "check_then_act"
    )]
    admission: AdmissionMode,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect plans and their limits
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },

    /// Assign plans to users (billing side)
    Subscription {
        #[command(subcommand)]
        action: commands::subscription::SubscriptionAction,
    },

    /// Check, record and show credit usage
    Usage {
        #[command(subcommand)]
        action: commands::usage::UsageAction,
    },

    /// Browse the append-only usage ledger
    Ledger {
        #[command(subcommand)]
        action: commands::ledger::LedgerAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Set up database path if provided
    if let Some(db_path) = &cli.db {
        std::env::set_var(creditgate_core::db::DB_PATH_ENV, db_path);
    }

    // Initialize database
    let db = creditgate_core::Database::new().await?;
    let service = creditgate_core::UsageService::new(&db).with_mode(cli.admission);
    log::debug!("Admission mode: {}", service.mode());

    // Create context for commands
    let ctx = commands::Context {
        service,
        format: cli.format,
        quiet: cli.quiet,
    };

    // Execute command
    match cli.command {
        Commands::Plan { action } => commands::plan::execute(&ctx, action).await,
        Commands::Subscription { action } => commands::subscription::execute(&ctx, action).await,
        Commands::Usage { action } => commands::usage::execute(&ctx, action).await,
        Commands::Ledger { action } => commands::ledger::execute(&ctx, action).await,
    }
}
