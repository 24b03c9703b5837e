//! Integration tests for the Facebook job table
//!
//! Covers the language save/switch/restore jobs, including the mid-run
//! cancellation of the switch jobs, and the manage-posts delete rounds.

use cinder_browser::FakeSurface;
use cinder_core::{AccountId, AutomationSettings, Job, JobStatus, PlatformKind};
use cinder_facebook::{FacebookJobType, FacebookPlatform, FacebookProgress, USER_LANG_KEY};
use cinder_runner::{
    AutomationSession, BroadcastEventBus, Capabilities, JobRunner, MemoryPersistence,
    Persistence, RecordingReporter, RunnerState, SharedRateLimitOracle, WizardState,
};
use serde_json::json;
use std::sync::Arc;

use FacebookJobType::{DeleteWallPosts, RestoreUserLang, SaveUserLang, SetLangToEnglish};

struct Harness {
    runner: JobRunner<FacebookPlatform>,
    surface: Arc<FakeSurface>,
    persistence: Arc<MemoryPersistence>,
    reporter: Arc<RecordingReporter>,
}

impl Harness {
    fn statuses(&self) -> Vec<JobStatus> {
        self.runner.state().jobs.iter().map(|j| j.status).collect()
    }
}

fn account() -> AccountId {
    AccountId::new("fb-1").expect("valid id")
}

/// Helper to build a runner resting at the start of `jobs`.
fn harness(jobs: &[FacebookJobType]) -> Harness {
    let surface = Arc::new(FakeSurface::new("https://www.facebook.com/"));
    surface.respond("navigator.onLine", json!(true));

    let persistence = Arc::new(MemoryPersistence::new());
    let reporter = Arc::new(RecordingReporter::new());
    let caps = Capabilities::new(
        persistence.clone(),
        Arc::new(SharedRateLimitOracle::new()),
        Arc::new(BroadcastEventBus::default()),
        reporter.clone(),
    );
    let session = AutomationSession::new(
        account(),
        PlatformKind::Facebook,
        surface.clone(),
        AutomationSettings::default(),
        caps,
    );
    let mut runner = JobRunner::new(FacebookPlatform::default(), session);
    runner.restore_state(RunnerState {
        state: WizardState::RunJobs,
        jobs: jobs.iter().copied().map(Job::new).collect(),
        progress: FacebookProgress::default(),
        ..RunnerState::default()
    });
    Harness {
        runner,
        surface,
        persistence,
        reporter,
    }
}

#[tokio::test(start_paused = true)]
async fn test_english_account_cancels_language_switch_mid_run() {
    let mut h = harness(&[SaveUserLang, SetLangToEnglish, RestoreUserLang]);
    h.surface.respond("documentElement.lang", json!("en"));

    h.runner.run().await.expect("run jobs");

    assert_eq!(
        h.statuses(),
        vec![JobStatus::Finished, JobStatus::Canceled, JobStatus::Canceled]
    );
    assert_eq!(h.surface.scripts_containing("save_locale"), 0);
    assert!(!h.runner.state().finished_with_errors());

    let saved = h
        .persistence
        .get_config(&account(), USER_LANG_KEY)
        .await
        .expect("get config");
    assert_eq!(saved.as_deref(), Some("en"));

    // The cancellations were persisted, not just applied in memory
    let stored = h.persistence.jobs(&account());
    assert!(stored
        .iter()
        .any(|j| j.job_type == "restoreUserLang" && j.status == JobStatus::Canceled));
}

#[tokio::test(start_paused = true)]
async fn test_other_language_is_switched_and_restored() {
    let mut h = harness(&[SaveUserLang, SetLangToEnglish, RestoreUserLang]);
    h.surface
        .respond_sequence("documentElement.lang", vec![json!("de"), json!("en")]);
    h.surface.respond("save_locale", json!(200));

    h.runner.run().await.expect("run jobs");

    assert_eq!(h.statuses(), vec![JobStatus::Finished; 3]);
    assert_eq!(
        h.runner.state().progress.user_lang.as_deref(),
        Some("de")
    );

    let locale_posts: Vec<String> = h
        .surface
        .executed_scripts()
        .into_iter()
        .filter(|s| s.contains("save_locale"))
        .collect();
    assert_eq!(locale_posts.len(), 2);
    assert!(locale_posts[0].contains(r#""en_US""#));
    assert!(locale_posts[1].contains(r#"loc: "de""#));
}

#[tokio::test(start_paused = true)]
async fn test_language_that_does_not_change_fails_the_switch() {
    let mut h = harness(&[SetLangToEnglish, DeleteWallPosts]);
    h.surface.respond("documentElement.lang", json!("de"));
    h.surface.respond("save_locale", json!(200));

    h.runner.run().await.expect("run jobs");

    assert_eq!(h.statuses(), vec![JobStatus::Error, JobStatus::Pending]);
    assert_eq!(h.reporter.reports()[0].error_type, "language_not_changed");
}

#[tokio::test(start_paused = true)]
async fn test_delete_wall_posts_runs_rounds_until_dialog_is_empty() {
    let mut h = harness(&[DeleteWallPosts]);
    h.surface.respond("document.evaluate", json!(true));
    h.surface.respond("!== null", json!(true));
    h.surface
        .respond_sequence("aria-checked", vec![json!(3), json!(2), json!(0)]);

    h.runner.run().await.expect("run jobs");

    let state = h.runner.state();
    assert_eq!(state.jobs[0].status, JobStatus::Finished);
    assert_eq!(state.progress.wall_posts_deleted, 5);
    assert_eq!(state.progress.delete_rounds, 2);
    assert_eq!(h.surface.loaded_urls().len(), 3);
    assert_eq!(h.surface.scripts_containing("Delete posts"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_missing_manage_posts_button() {
    let mut h = harness(&[DeleteWallPosts]);

    h.runner.run().await.expect("run jobs");

    let job = &h.runner.state().jobs[0];
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(
        job.error.as_deref(),
        Some("deleteWallPosts failed: failed to click Manage-posts button")
    );
    // Bounded DOM step retries
    assert_eq!(h.surface.scripts_containing("Manage posts"), 3);
    assert_eq!(
        h.reporter.reports()[0].error_type,
        "failed_to_click_manage_posts_button"
    );
}

#[tokio::test(start_paused = true)]
async fn test_dialog_that_never_opens() {
    let mut h = harness(&[DeleteWallPosts]);
    h.surface.respond("document.evaluate", json!(true));

    h.runner.run().await.expect("run jobs");

    assert_eq!(h.runner.state().jobs[0].status, JobStatus::Error);
    assert_eq!(h.reporter.reports()[0].error_type, "dialog_did_not_appear");
}
