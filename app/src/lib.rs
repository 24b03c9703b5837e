//! Cinder - headless shell around the automation runner.
//!
//! Parses the command line, loads configuration, opens the database and
//! drives a platform's [`cinder_runner::JobRunner`] to completion.

pub mod archive;
pub mod cli;
pub mod drive;
pub mod dry_run;
pub mod signals;

pub use cli::{Cli, Commands, PlatformArg, RunArgs};

use anyhow::{Context, Result};
use cinder_core::{AccountId, AppConfig};
use cinder_db::Database;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cinder=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Run(args) => drive::run_command(&config, &args).await,
        Commands::Status { account } => {
            let db = open_database(&config).await?;
            let outcome = status(&db, account.as_deref()).await;
            db.close().await;
            outcome
        }
        Commands::Reset { account } => {
            let account_id = AccountId::new(account).context("invalid account id")?;
            let db = open_database(&config).await?;
            cinder_db::runner_state::clear_runner_state(db.pool(), &account_id).await?;
            db.close().await;
            println!("Cleared saved state for {account_id}");
            Ok(())
        }
    }
}

async fn open_database(config: &AppConfig) -> Result<Database> {
    let path = config.database_path()?;
    Database::open(&path)
        .await
        .with_context(|| format!("failed to open database at {}", path.display()))
}

async fn status(db: &Database, account: Option<&str>) -> Result<()> {
    let Some(account) = account else {
        let accounts = cinder_db::accounts::list_accounts(db.pool()).await?;
        if accounts.is_empty() {
            println!("No accounts yet");
        }
        for account in accounts {
            println!(
                "{}  {}  {}",
                account.id,
                account.platform,
                account.username.as_deref().unwrap_or("-")
            );
        }
        return Ok(());
    };

    let account_id = AccountId::new(account).context("invalid account id")?;
    let saved = cinder_db::runner_state::load_runner_state(db.pool(), &account_id).await?;
    match saved.as_ref().and_then(|s| s.get("state")) {
        Some(state) => println!("State: {state}"),
        None => println!("State: none saved"),
    }
    if let Some(action) = saved
        .as_ref()
        .and_then(|s| s.get("actionString"))
        .and_then(|a| a.as_str())
        .filter(|a| !a.is_empty())
    {
        println!("Action: {action}");
    }

    let jobs = cinder_db::jobs::list_jobs(db.pool(), &account_id).await?;
    for (n, job) in jobs.iter().enumerate() {
        match &job.error {
            Some(error) => println!(
                "{n:>3}. {:<20} {:<9} {error}",
                job.job_type,
                job.status.as_str()
            ),
            None => println!("{n:>3}. {:<20} {}", job.job_type, job.status.as_str()),
        }
    }
    Ok(())
}
