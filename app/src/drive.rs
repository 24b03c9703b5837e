//! The `run` subcommand: wire collaborators, then drive the runner.

use crate::archive;
use crate::cli::{PlatformArg, RunArgs};
use crate::dry_run;
use crate::signals;
use anyhow::{bail, Context, Result};
use cinder_browser::{BrowserSurface, ChromiumSurface};
use cinder_core::{AccountId, AppConfig, JobStatus, PlatformKind};
use cinder_db::Database;
use cinder_facebook::{FacebookOptions, FacebookPlatform};
use cinder_runner::{
    run_succeeded, AutomationSession, BroadcastEventBus, Capabilities, JobRunner, Platform,
    SharedRateLimitOracle, TracingReporter, WizardInput, WizardState, WizardStep,
};
use cinder_x::{XOptions, XPlatform};
use std::sync::Arc;

/// Final job table of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub jobs: Vec<JobLine>,
    /// Every job finished or was canceled
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
pub struct JobLine {
    pub job_type: String,
    pub status: JobStatus,
    pub error: Option<String>,
}

impl RunSummary {
    fn of<P: Platform>(runner: &JobRunner<P>) -> Self {
        let state = runner.state();
        Self {
            jobs: state
                .jobs
                .iter()
                .map(|job| JobLine {
                    job_type: job.job_type.to_string(),
                    status: job.status,
                    error: job.error.clone(),
                })
                .collect(),
            succeeded: run_succeeded(&state.jobs),
        }
    }

    pub fn print(&self) {
        for line in &self.jobs {
            match &line.error {
                Some(error) => println!(
                    "  {:<20} {:<9} {error}",
                    line.job_type,
                    line.status.as_str()
                ),
                None => println!("  {:<20} {}", line.job_type, line.status.as_str()),
            }
        }
        if self.succeeded {
            println!("All done.");
        } else {
            println!("Finished with errors.");
        }
    }
}

pub fn x_options(args: &RunArgs) -> XOptions {
    let mut options = if args.delete {
        XOptions::delete_all()
    } else {
        XOptions::default()
    };
    if args.archive {
        let archive = XOptions::archive_all();
        options.archive_tweets = archive.archive_tweets;
        options.archive_likes = archive.archive_likes;
        options.archive_bookmarks = archive.archive_bookmarks;
    }
    options
}

pub fn facebook_options(args: &RunArgs) -> FacebookOptions {
    FacebookOptions {
        delete_wall_posts: args.delete,
    }
}

pub async fn run_command(config: &AppConfig, args: &RunArgs) -> Result<()> {
    let account_id = AccountId::new(args.account.clone()).context("invalid account id")?;
    let kind = PlatformKind::from(args.platform);

    let db = if args.dry_run {
        let db = Database::in_memory().await?;
        db.run_migrations().await?;
        db
    } else {
        let path = config.database_path()?;
        Database::open(&path)
            .await
            .with_context(|| format!("failed to open database at {}", path.display()))?
    };

    let archive_dir = match &args.archive_dir {
        Some(dir) => dir.clone(),
        None => config.data_dir()?.join("archives"),
    };
    let oracle = Arc::new(SharedRateLimitOracle::new());
    let events = Arc::new(BroadcastEventBus::default());
    let writer = archive::spawn_writer(events.subscribe(), archive_dir, account_id.clone());
    let caps = Capabilities::new(
        Arc::new(db.clone()),
        oracle.clone(),
        events.clone(),
        Arc::new(TracingReporter),
    );

    let (surface, chromium): (Arc<dyn BrowserSurface>, _) = if args.dry_run {
        tracing::info!(platform = %kind, "dry run against a scripted page");
        let surface: Arc<dyn BrowserSurface> = dry_run::surface(kind);
        (surface, None)
    } else {
        let chromium = Arc::new(
            ChromiumSurface::launch(&config.browser)
                .await
                .context("failed to launch the browser")?,
        );
        chromium
            .observe_rate_limits(oracle.sink(account_id.clone()))
            .await?;
        let surface: Arc<dyn BrowserSurface> = chromium.clone();
        (surface, Some(chromium))
    };

    let session = AutomationSession::new(
        account_id,
        kind,
        surface,
        config.automation_settings(),
        caps,
    );
    let outcome = match args.platform {
        PlatformArg::X => {
            let mut runner = JobRunner::new(XPlatform::default(), session);
            drive(&mut runner, x_options(args)).await
        }
        PlatformArg::Facebook => {
            let mut runner = JobRunner::new(FacebookPlatform::default(), session);
            drive(&mut runner, facebook_options(args)).await
        }
    };

    if let Some(chromium) = chromium {
        if let Err(e) = chromium.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
    }
    drop(events);
    match writer.await {
        Ok(written) => {
            for path in written {
                println!("Archive written to {}", path.display());
            }
        }
        Err(e) => tracing::warn!(error = %e, "archive writer stopped"),
    }
    db.close().await;

    let summary = outcome?;
    summary.print();
    if !summary.succeeded {
        bail!("run finished with errors");
    }
    Ok(())
}

/// Resume or start a run and answer every display state until it finishes.
///
/// A saved run that is mid-`RunJobs` keeps its own options. A saved run that
/// already finished is reset so the new options apply.
pub async fn drive<P: Platform>(
    runner: &mut JobRunner<P>,
    options: P::Options,
) -> Result<RunSummary> {
    if runner.restore_from_persistence().await?
        && matches!(
            runner.state().state,
            WizardState::FinishedRunningJobs | WizardState::FinishedRunningJobsDisplay
        )
    {
        runner.reset().await?;
    }
    if runner.state().state == WizardState::RunJobs {
        tracing::info!(
            current_job_index = runner.state().current_job_index,
            current_job = ?runner.state().current_job().map(|job| job.job_type),
            "resuming saved run"
        );
    } else {
        *runner.options_mut() = options;
    }

    let listener = signals::spawn(
        runner.session().pause_controller().clone(),
        runner.cancel_handle(),
    );
    let outcome = answer_until_finished(runner).await;
    listener.abort();
    outcome?;

    Ok(RunSummary::of(runner))
}

async fn answer_until_finished<P: Platform>(runner: &mut JobRunner<P>) -> Result<()> {
    loop {
        runner.run_until_display().await?;
        let current = runner.state().state;
        match current {
            WizardState::WizardDisplay(WizardStep::Review) => {
                tracing::info!(instructions = %runner.state().instructions, "starting run");
                runner.submit(WizardInput::StartRun);
            }
            WizardState::WizardDisplay(_) => {
                tracing::debug!(state = %current, "skipping wizard page");
                runner.submit(WizardInput::Next);
            }
            WizardState::FinishedRunningJobsDisplay => return Ok(()),
            other => bail!("runner stopped in unexpected state {other}"),
        }
    }
}
