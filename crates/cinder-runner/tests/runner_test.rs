//! Integration tests for the job runner state machine
//!
//! Drives a scripted platform through the wizard and the RunJobs loop against
//! a fake automation surface and in-memory collaborators.

use async_trait::async_trait;
use cinder_browser::FakeSurface;
use cinder_core::{AccountId, AutomationSettings, Job, JobStatus, PlatformKind};
use cinder_runner::{
    AutomationSession, BroadcastEventBus, Capabilities, FailureKind, JobContext, JobKind,
    JobRunner, MemoryPersistence, Persistence, Platform, RecordingReporter, RunJobsState, RunnerError,
    RunnerState, SharedRateLimitOracle, WizardInput, WizardState, WizardStep,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum TestJob {
    Login,
    IndexTweets,
    ArchiveBuild,
    SaveUserLang,
    RestoreUserLang,
}

impl fmt::Display for TestJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::IndexTweets => "indexTweets",
            Self::ArchiveBuild => "archiveBuild",
            Self::SaveUserLang => "saveUserLang",
            Self::RestoreUserLang => "restoreUserLang",
        };
        f.write_str(name)
    }
}

impl FromStr for TestJob {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "indexTweets" => Ok(Self::IndexTweets),
            "archiveBuild" => Ok(Self::ArchiveBuild),
            "saveUserLang" => Ok(Self::SaveUserLang),
            "restoreUserLang" => Ok(Self::RestoreUserLang),
            other => Err(other.to_string()),
        }
    }
}

impl JobKind for TestJob {
    fn describe(&self) -> String {
        format!("running {self}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Page {
    Delete,
    Archive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TestOptions {
    jobs: Vec<TestJob>,
    pages: Vec<Page>,
    panic_on: Option<TestJob>,
    fail_on: Option<TestJob>,
    offline_on: Option<TestJob>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TestProgress {
    ran: Vec<String>,
}

#[derive(Debug)]
struct DialogMissing;

impl FailureKind for DialogMissing {
    fn code(&self) -> &'static str {
        "dialog_did_not_appear"
    }

    fn message(&self) -> String {
        "dialog did not appear".to_string()
    }
}

#[derive(Default)]
struct TestPlatform {
    executed: Arc<Mutex<Vec<TestJob>>>,
}

#[async_trait]
impl Platform for TestPlatform {
    type JobType = TestJob;
    type Progress = TestProgress;
    type OptionsPage = Page;
    type Options = TestOptions;

    fn kind(&self) -> PlatformKind {
        PlatformKind::X
    }

    fn options_pages(&self, options: &TestOptions) -> Vec<Page> {
        options.pages.clone()
    }

    fn instructions(&self, step: &WizardStep<Page>, _options: &TestOptions) -> String {
        format!("{step:?}")
    }

    fn define_jobs(&self, options: &TestOptions) -> Vec<TestJob> {
        options.jobs.clone()
    }

    async fn login(&self, session: &AutomationSession) -> cinder_runner::Result<()> {
        session
            .load_url_with_rate_limit("https://x.com/login", &["https://x.com/home"], false)
            .await
    }

    async fn run_job(&self, ctx: &mut JobContext<'_, Self>) -> cinder_runner::Result<()> {
        let job_type = ctx.job_type();
        self.executed.lock().expect("lock").push(job_type);
        ctx.progress_mut().ran.push(job_type.to_string());

        if ctx.options().panic_on == Some(job_type) {
            panic!("unexpected page layout");
        }
        if ctx.options().fail_on == Some(job_type) {
            return Err(RunnerError::job(job_type, &DialogMissing));
        }
        if ctx.options().offline_on == Some(job_type) {
            return Err(RunnerError::InternetDown);
        }
        if job_type == TestJob::SaveUserLang {
            ctx.cancel_pending_jobs(|j| j == TestJob::RestoreUserLang)
                .await?;
        }
        ctx.checkpoint().await
    }
}

struct Harness {
    runner: JobRunner<TestPlatform>,
    executed: Arc<Mutex<Vec<TestJob>>>,
    persistence: Arc<MemoryPersistence>,
    reporter: Arc<RecordingReporter>,
    events: Arc<BroadcastEventBus>,
}

impl Harness {
    fn executed(&self) -> Vec<TestJob> {
        self.executed.lock().expect("lock").clone()
    }

    fn statuses(&self) -> Vec<JobStatus> {
        self.runner.state().jobs.iter().map(|j| j.status).collect()
    }
}

fn account() -> AccountId {
    AccountId::new("acct-1").expect("valid id")
}

/// Helper to build a runner over a fake surface that redirects login to home.
fn harness(options: TestOptions) -> Harness {
    let surface = Arc::new(FakeSurface::new("about:blank"));
    surface.redirect("https://x.com/login", "https://x.com/home");
    let mut h = harness_with_surface(surface);
    *h.runner.options_mut() = options;
    h
}

/// Helper to build a runner over a caller-provided surface.
fn harness_with_surface(surface: Arc<FakeSurface>) -> Harness {
    let persistence = Arc::new(MemoryPersistence::new());
    let reporter = Arc::new(RecordingReporter::new());
    let events = Arc::new(BroadcastEventBus::default());
    let caps = Capabilities::new(
        persistence.clone(),
        Arc::new(SharedRateLimitOracle::new()),
        events.clone(),
        reporter.clone(),
    );
    let session = AutomationSession::new(
        account(),
        PlatformKind::X,
        surface,
        AutomationSettings::default(),
        caps,
    );
    let platform = TestPlatform::default();
    let executed = platform.executed.clone();
    Harness {
        runner: JobRunner::new(platform, session),
        executed,
        persistence,
        reporter,
        events,
    }
}

/// Helper to walk the wizard from Login to a finished run.
async fn walk_wizard_and_run(runner: &mut JobRunner<TestPlatform>) {
    runner.run_until_display().await.expect("login");
    while runner.state().state != WizardState::WizardDisplay(WizardStep::Review) {
        runner.submit(WizardInput::Next);
        runner.run_until_display().await.expect("wizard step");
    }
    runner.submit(WizardInput::StartRun);
    runner.run().await.expect("start run");
    assert_eq!(runner.state().state, WizardState::RunJobs);
    runner.run().await.expect("run jobs");
}

#[tokio::test]
async fn test_unanticipated_failure_stops_run_before_next_job() {
    let mut h = harness(TestOptions {
        jobs: vec![TestJob::Login, TestJob::IndexTweets, TestJob::ArchiveBuild],
        panic_on: Some(TestJob::IndexTweets),
        ..TestOptions::default()
    });

    walk_wizard_and_run(&mut h.runner).await;

    let state = h.runner.state();
    assert_eq!(state.state, WizardState::FinishedRunningJobs);
    assert_eq!(
        h.statuses(),
        vec![JobStatus::Finished, JobStatus::Error, JobStatus::Pending]
    );
    assert_eq!(h.executed(), vec![TestJob::Login, TestJob::IndexTweets]);
    assert!(state.jobs[1]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("unexpected page layout")));
    assert!(state.finished_with_errors());

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].error_type, "unknown_job_error");
    assert_eq!(reports[0].context.job_index, Some(1));
    assert_eq!(reports[0].context.job_type.as_deref(), Some("indexTweets"));
    assert!(!reports[0].recoverable);

    h.runner.run().await.expect("finish");
    assert_eq!(h.runner.state().state, WizardState::FinishedRunningJobsDisplay);
    assert_eq!(h.runner.state().instructions, "Finished with errors.");
}

#[tokio::test]
async fn test_successful_run_persists_jobs_and_snapshots() {
    let mut h = harness(TestOptions {
        jobs: vec![TestJob::Login, TestJob::IndexTweets],
        pages: vec![Page::Delete, Page::Archive],
        ..TestOptions::default()
    });

    walk_wizard_and_run(&mut h.runner).await;

    assert_eq!(h.statuses(), vec![JobStatus::Finished, JobStatus::Finished]);
    let stored = h.persistence.jobs(&account());
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|j| j.status == JobStatus::Finished));
    assert_eq!(
        stored[1].progress_snapshot.as_ref().expect("snapshot")["ran"],
        serde_json::json!(["login", "indexTweets"])
    );
    assert_eq!(h.runner.state().action, RunJobsState::Finished);
    assert!(h.reporter.reports().is_empty());

    let saved = h
        .persistence
        .runner_state(&account())
        .expect("state saved");
    assert_eq!(saved["state"], "FinishedRunningJobs");
}

#[tokio::test]
async fn test_anticipated_failure_reports_catalog_code() {
    let mut h = harness(TestOptions {
        jobs: vec![TestJob::Login, TestJob::IndexTweets, TestJob::ArchiveBuild],
        fail_on: Some(TestJob::IndexTweets),
        ..TestOptions::default()
    });

    walk_wizard_and_run(&mut h.runner).await;

    assert_eq!(
        h.statuses(),
        vec![JobStatus::Finished, JobStatus::Error, JobStatus::Pending]
    );
    let reports = h.reporter.reports();
    assert_eq!(reports[0].error_type, "dialog_did_not_appear");
    assert_eq!(reports[0].data["jobType"], "indexTweets");
    assert!(reports[0].recoverable);
}

#[tokio::test]
async fn test_job_cancels_downstream_job_mid_run() {
    let mut h = harness(TestOptions {
        jobs: vec![
            TestJob::SaveUserLang,
            TestJob::IndexTweets,
            TestJob::RestoreUserLang,
        ],
        ..TestOptions::default()
    });

    walk_wizard_and_run(&mut h.runner).await;

    assert_eq!(
        h.statuses(),
        vec![JobStatus::Finished, JobStatus::Finished, JobStatus::Canceled]
    );
    assert_eq!(h.executed(), vec![TestJob::SaveUserLang, TestJob::IndexTweets]);
    assert!(!h.runner.state().finished_with_errors());
}

#[tokio::test]
async fn test_internet_down_cancels_session() {
    let mut h = harness(TestOptions {
        jobs: vec![TestJob::Login, TestJob::IndexTweets, TestJob::ArchiveBuild],
        offline_on: Some(TestJob::IndexTweets),
        ..TestOptions::default()
    });
    let mut rx = h.events.subscribe();

    walk_wizard_and_run(&mut h.runner).await;

    assert_eq!(
        h.statuses(),
        vec![JobStatus::Finished, JobStatus::Error, JobStatus::Canceled]
    );
    assert_eq!(h.runner.state().state, WizardState::FinishedRunningJobs);

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name);
    }
    assert!(names.contains(&"cancel-automation-acct-1".to_string()));
    assert!(names.contains(&"submit-progress-acct-1".to_string()));

    let reports = h.reporter.reports();
    assert_eq!(reports[0].error_type, "internet_down");
    assert!(!reports[0].recoverable);
}

#[tokio::test]
async fn test_external_cancel_cancels_remaining_jobs() {
    let mut h = harness(TestOptions {
        jobs: vec![TestJob::Login, TestJob::IndexTweets],
        ..TestOptions::default()
    });

    h.runner.run_until_display().await.expect("login");
    while h.runner.state().state != WizardState::WizardDisplay(WizardStep::Review) {
        h.runner.submit(WizardInput::Next);
        h.runner.run_until_display().await.expect("wizard");
    }
    h.runner.submit(WizardInput::StartRun);
    h.runner.run().await.expect("start");

    h.runner.cancel_handle().cancel();
    h.runner.run().await.expect("run jobs");

    assert!(h.executed().is_empty());
    assert_eq!(h.statuses(), vec![JobStatus::Canceled, JobStatus::Canceled]);
}

/// Helper to build a mid-run state with the cursor at `index`.
fn saved_state(jobs: Vec<Job<TestJob>>, index: usize) -> RunnerState<TestPlatform> {
    RunnerState {
        state: WizardState::RunJobs,
        current_job_index: index,
        jobs,
        ..RunnerState::default()
    }
}

fn job(job_type: TestJob, status: JobStatus) -> Job<TestJob> {
    let mut job = Job::new(job_type);
    job.status = status;
    job
}

#[tokio::test]
async fn test_resume_never_reruns_jobs_before_cursor() {
    let mut h = harness(TestOptions::default());
    // Jobs before the cursor are left pending on purpose: only the cursor decides
    h.runner.restore_state(saved_state(
        vec![
            job(TestJob::Login, JobStatus::Pending),
            job(TestJob::IndexTweets, JobStatus::Finished),
            job(TestJob::ArchiveBuild, JobStatus::Pending),
        ],
        2,
    ));

    h.runner.run().await.expect("run jobs");

    assert_eq!(h.executed(), vec![TestJob::ArchiveBuild]);
    assert_eq!(h.runner.state().state, WizardState::FinishedRunningJobs);
}

#[tokio::test]
async fn test_running_job_at_restart_is_reattempted() {
    let mut h = harness(TestOptions::default());
    h.runner.restore_state(saved_state(
        vec![
            job(TestJob::Login, JobStatus::Finished),
            job(TestJob::IndexTweets, JobStatus::Running),
            job(TestJob::ArchiveBuild, JobStatus::Pending),
        ],
        1,
    ));

    h.runner.run().await.expect("run jobs");

    assert_eq!(
        h.executed(),
        vec![TestJob::IndexTweets, TestJob::ArchiveBuild]
    );
    assert_eq!(
        h.statuses(),
        vec![JobStatus::Finished, JobStatus::Finished, JobStatus::Finished]
    );
}

#[tokio::test]
async fn test_restore_from_persistence_round_trip() {
    let mut h = harness(TestOptions::default());
    h.runner.restore_state(saved_state(
        vec![
            job(TestJob::Login, JobStatus::Finished),
            job(TestJob::ArchiveBuild, JobStatus::Pending),
        ],
        1,
    ));
    h.runner.save_state().await.expect("save");

    let mut fresh = harness(TestOptions::default());
    let state = h
        .persistence
        .runner_state(&account())
        .expect("saved state");
    fresh
        .persistence
        .save_runner_state(&account(), &state)
        .await
        .expect("seed state");
    assert!(fresh
        .runner
        .restore_from_persistence()
        .await
        .expect("restore"));
    assert_eq!(fresh.runner.state().current_job_index, 1);

    fresh.runner.run().await.expect("run jobs");
    assert_eq!(fresh.executed(), vec![TestJob::ArchiveBuild]);
}

#[tokio::test]
async fn test_wizard_back_and_cancel() {
    let mut h = harness(TestOptions {
        jobs: vec![TestJob::Login],
        pages: vec![Page::Delete, Page::Archive],
        ..TestOptions::default()
    });

    h.runner.run_until_display().await.expect("login");
    assert_eq!(
        h.runner.state().state,
        WizardState::WizardDisplay(WizardStep::Prestart)
    );

    for expected in [
        WizardStep::Start,
        WizardStep::Options(Page::Delete),
        WizardStep::Options(Page::Archive),
        WizardStep::Review,
    ] {
        h.runner.submit(WizardInput::Next);
        h.runner.run_until_display().await.expect("next");
        assert_eq!(h.runner.state().state, WizardState::WizardDisplay(expected));
    }

    h.runner.submit(WizardInput::Back);
    h.runner.run_until_display().await.expect("back");
    assert_eq!(
        h.runner.state().state,
        WizardState::WizardDisplay(WizardStep::Options(Page::Archive))
    );
    assert_eq!(h.runner.state().instructions, "Options(Archive)");

    h.runner.submit(WizardInput::StartRun);
    h.runner.run_until_display().await.expect("premature start");
    assert_eq!(
        h.runner.state().state,
        WizardState::WizardDisplay(WizardStep::Options(Page::Archive))
    );

    h.runner.submit(WizardInput::Cancel);
    h.runner.run_until_display().await.expect("cancel");
    assert_eq!(
        h.runner.state().state,
        WizardState::WizardDisplay(WizardStep::Start)
    );
}

#[tokio::test]
async fn test_reset_returns_to_login_and_clears_saved_state() {
    let mut h = harness(TestOptions {
        jobs: vec![TestJob::Login],
        ..TestOptions::default()
    });
    walk_wizard_and_run(&mut h.runner).await;
    assert!(h.persistence.runner_state(&account()).is_some());

    h.runner.submit(WizardInput::Reset);
    h.runner.run().await.expect("reset");

    assert_eq!(h.runner.state().state, WizardState::Login);
    assert!(h.runner.state().jobs.is_empty());
    assert_eq!(h.runner.state().options.jobs, vec![TestJob::Login]);
    assert!(h.persistence.runner_state(&account()).is_none());
}

#[tokio::test]
async fn test_login_redirect_elsewhere_is_reported() {
    let surface = Arc::new(FakeSurface::new("about:blank"));
    surface.redirect("https://x.com/login", "https://x.com/explore");
    let mut h = harness_with_surface(surface);

    let err = h.runner.run().await.expect_err("url changed");
    assert!(
        matches!(err, RunnerError::UrlChanged { ref actual, .. } if actual == "https://x.com/explore")
    );
    assert_eq!(h.runner.state().state, WizardState::Login);
    assert_eq!(h.reporter.reports()[0].error_type, "url_changed");
    assert!(h.reporter.reports()[0].recoverable);
    assert_eq!(
        h.reporter.reports()[0].data["validAlternatives"],
        serde_json::json!(["https://x.com/home"])
    );
}
