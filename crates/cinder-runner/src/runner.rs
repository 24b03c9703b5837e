//! The per-account job runner and its wizard state machine.

use crate::error::{Result, RunnerError};
use crate::events::cancel_automation_event;
use crate::platform::{JobContext, JobKind, Platform};
use crate::session::{AutomationSession, CancelHandle};
use crate::state::{RunJobsState, RunnerState, WizardInput, WizardState, WizardStep};
use cinder_core::{Job, JobStatus};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Drives one platform's wizard and job list for one account.
///
/// [`JobRunner::run`] advances the state machine by one step. `RunJobs` is
/// the only step that loops: it executes every remaining job before
/// returning.
pub struct JobRunner<P: Platform> {
    platform: P,
    session: AutomationSession,
    state: RunnerState<P>,
    pending_input: Option<WizardInput>,
}

impl<P: Platform> JobRunner<P> {
    pub fn new(platform: P, session: AutomationSession) -> Self {
        Self {
            platform,
            session,
            state: RunnerState::default(),
            pending_input: None,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn session(&self) -> &AutomationSession {
        &self.session
    }

    pub fn state(&self) -> &RunnerState<P> {
        &self.state
    }

    pub fn options_mut(&mut self) -> &mut P::Options {
        &mut self.state.options
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.session.cancel_handle()
    }

    /// Queue the UI's answer for the next [`JobRunner::run`] step.
    pub fn submit(&mut self, input: WizardInput) {
        tracing::debug!(?input, state = %self.state.state, "wizard input");
        self.pending_input = Some(input);
    }

    pub async fn save_state(&self) -> Result<()> {
        self.session.persist_state(&self.state).await
    }

    /// Rehydrate a saved state. A run resumes at `current_job_index`.
    pub fn restore_state(&mut self, state: RunnerState<P>) {
        tracing::info!(
            state = %state.state,
            current_job_index = state.current_job_index,
            jobs = state.jobs.len(),
            "restoring runner state"
        );
        self.state = state;
        self.pending_input = None;
    }

    /// Restore the state saved for this account, if any.
    pub async fn restore_from_persistence(&mut self) -> Result<bool> {
        let saved = self
            .session
            .capabilities()
            .persistence
            .load_runner_state(self.session.account_id())
            .await?;
        let Some(value) = saved else {
            return Ok(false);
        };
        let state: RunnerState<P> = serde_json::from_value(value)?;
        self.restore_state(state);
        Ok(true)
    }

    /// Forget the run and start over at `Login`, keeping the options.
    pub async fn reset(&mut self) -> Result<()> {
        let options = std::mem::take(&mut self.state.options);
        self.state = RunnerState {
            options,
            ..RunnerState::default()
        };
        self.pending_input = None;
        self.session.reset_cancel();
        self.session
            .capabilities()
            .persistence
            .clear_runner_state(self.session.account_id())
            .await?;
        tracing::info!(account_id = %self.session.account_id(), "runner reset");
        Ok(())
    }

    /// Step until the runner rests in a display state with no queued input.
    pub async fn run_until_display(&mut self) -> Result<()> {
        loop {
            self.run().await?;
            if self.state.state.is_display() && self.pending_input.is_none() {
                return Ok(());
            }
        }
    }

    /// Advance the state machine by one step.
    pub async fn run(&mut self) -> Result<()> {
        let input = self.pending_input.take();
        if input == Some(WizardInput::Reset) {
            return self.reset().await;
        }
        self.session.set_report_state(self.state.state);

        match self.state.state {
            WizardState::Login => self.login().await,
            WizardState::Wizard(step) => {
                self.state.instructions = self.platform.instructions(&step, &self.state.options);
                self.state.state = WizardState::WizardDisplay(step);
                self.save_state().await
            }
            WizardState::WizardDisplay(step) => self.answer(step, input).await,
            WizardState::RunJobs => self.run_jobs().await,
            WizardState::FinishedRunningJobs => {
                self.state.instructions = if self.state.finished_with_errors() {
                    "Finished with errors.".to_string()
                } else {
                    "All done.".to_string()
                };
                self.state.state = WizardState::FinishedRunningJobsDisplay;
                self.save_state().await
            }
            WizardState::FinishedRunningJobsDisplay => {
                if input.is_some() {
                    self.state.state = WizardState::Wizard(WizardStep::Start);
                }
                Ok(())
            }
        }
    }

    async fn login(&mut self) -> Result<()> {
        self.session.log("logging in");
        if let Err(err) = self.platform.login(&self.session).await {
            self.session.report(&err, err.is_recoverable()).await;
            return Err(err);
        }
        self.state.state = WizardState::Wizard(WizardStep::Prestart);
        self.save_state().await
    }

    async fn answer(
        &mut self,
        step: WizardStep<P::OptionsPage>,
        input: Option<WizardInput>,
    ) -> Result<()> {
        let next = match input {
            None | Some(WizardInput::Reset) => return Ok(()),
            Some(WizardInput::Cancel) => WizardStep::Start,
            Some(WizardInput::Back) => self.previous_step(step),
            Some(WizardInput::Next | WizardInput::StartRun) if step == WizardStep::Review => {
                return self.start_run().await;
            }
            Some(WizardInput::StartRun) => {
                tracing::warn!(state = %self.state.state, "start requested before review");
                return Ok(());
            }
            Some(WizardInput::Next) => self.next_step(step),
        };
        self.state.state = WizardState::Wizard(next);
        Ok(())
    }

    fn next_step(&self, step: WizardStep<P::OptionsPage>) -> WizardStep<P::OptionsPage> {
        let pages = self.platform.options_pages(&self.state.options);
        match step {
            WizardStep::Prestart => WizardStep::Start,
            WizardStep::Start => pages
                .first()
                .map_or(WizardStep::Review, |page| WizardStep::Options(*page)),
            WizardStep::Options(current) => pages
                .iter()
                .skip_while(|page| **page != current)
                .nth(1)
                .map_or(WizardStep::Review, |page| WizardStep::Options(*page)),
            WizardStep::Review => WizardStep::Review,
        }
    }

    fn previous_step(&self, step: WizardStep<P::OptionsPage>) -> WizardStep<P::OptionsPage> {
        let pages = self.platform.options_pages(&self.state.options);
        match step {
            WizardStep::Prestart | WizardStep::Start => WizardStep::Prestart,
            WizardStep::Options(current) => pages
                .iter()
                .take_while(|page| **page != current)
                .last()
                .map_or(WizardStep::Start, |page| WizardStep::Options(*page)),
            WizardStep::Review => pages
                .last()
                .map_or(WizardStep::Start, |page| WizardStep::Options(*page)),
        }
    }

    /// Define the jobs for the current options and enter `RunJobs`.
    async fn start_run(&mut self) -> Result<()> {
        let job_types = self.platform.define_jobs(&self.state.options);
        let names: Vec<String> = job_types.iter().map(ToString::to_string).collect();
        tracing::info!(account_id = %self.session.account_id(), jobs = ?names, "defining jobs");

        let jobs: Vec<Job<P::JobType>> = match self
            .session
            .capabilities()
            .persistence
            .create_jobs(self.session.account_id(), &names)
            .await
        {
            Ok(stored) if stored.len() == job_types.len() => stored
                .into_iter()
                .zip(job_types)
                .map(|(job, job_type)| job.map_type(|_| job_type))
                .collect(),
            Ok(_) | Err(_) => {
                tracing::warn!("job storage unavailable, running with unsaved jobs");
                job_types.into_iter().map(Job::new).collect()
            }
        };

        self.session.reset_cancel();
        self.state.progress = P::Progress::default();
        self.state.jobs = jobs;
        self.state.current_job_index = 0;
        self.state.action = RunJobsState::Idle;
        self.state.action_string.clear();
        self.state.state = WizardState::RunJobs;
        self.save_state().await
    }

    /// Run every job from the cursor on.
    ///
    /// The job list length is re-read on every iteration: a job may cancel
    /// downstream jobs while it runs.
    async fn run_jobs(&mut self) -> Result<()> {
        let mut index = self.state.current_job_index;
        while index < self.state.jobs.len() {
            self.state.current_job_index = index;

            if self.session.is_canceled() {
                self.session.log("run canceled");
                self.cancel_from(index).await;
                break;
            }
            if self.state.jobs[index].status.is_terminal() {
                index += 1;
                continue;
            }

            let job_type = self.state.jobs[index].job_type;
            self.session.logs().clear();
            self.session
                .set_report_job(Some(index), Some(job_type.to_string()));
            if let Err(e) = self.state.jobs[index].begin() {
                tracing::warn!(error = %e, job_index = index, "job could not be started");
            }
            self.state.action = RunJobsState::Running(job_type);
            self.state.action_string = job_type.describe();
            self.record(index).await;
            tracing::info!(job_index = index, job_type = %job_type, "running job");

            let outcome = {
                let mut ctx = JobContext::new(&self.session, &mut self.state);
                AssertUnwindSafe(self.platform.run_job(&mut ctx))
                    .catch_unwind()
                    .await
            };
            let snapshot = serde_json::to_value(&self.state.progress).ok();

            match outcome {
                Ok(Ok(())) => {
                    if let Err(e) = self.state.jobs[index].finish(snapshot) {
                        tracing::warn!(error = %e, job_index = index, "job could not be finished");
                    }
                    self.record(index).await;
                    self.session.emit_progress(&self.state.progress);
                    index += 1;
                }
                Ok(Err(RunnerError::Canceled)) => {
                    self.session.log("job canceled");
                    self.cancel_from(index).await;
                    break;
                }
                Ok(Err(RunnerError::InternetDown)) => {
                    let err = RunnerError::InternetDown;
                    self.session.report(&err, false).await;
                    self.fail(index, &err, snapshot).await;
                    self.cancel_from(index + 1).await;
                    self.session.emit(
                        cancel_automation_event(self.session.account_id()),
                        serde_json::Value::Null,
                    );
                    break;
                }
                Ok(Err(err)) => {
                    self.session.report(&err, err.is_recoverable()).await;
                    self.fail(index, &err, snapshot).await;
                    break;
                }
                Err(panic) => {
                    let err = RunnerError::Unknown(panic_message(panic.as_ref()));
                    tracing::error!(job_index = index, job_type = %job_type, error = %err, "job panicked");
                    self.session.report(&err, false).await;
                    self.fail(index, &err, snapshot).await;
                    break;
                }
            }
        }

        self.session.set_report_job(None, None);
        self.state.action = RunJobsState::Finished;
        self.state.action_string.clear();
        self.state.state = WizardState::FinishedRunningJobs;
        self.session.emit_progress(&self.state.progress);
        self.save_state().await
    }

    async fn fail(&mut self, index: usize, err: &RunnerError, snapshot: Option<serde_json::Value>) {
        if let Err(e) = self.state.jobs[index].fail(err.to_string(), snapshot) {
            tracing::warn!(error = %e, job_index = index, "job could not be marked failed");
        }
        self.record(index).await;
    }

    /// Cancel every non-terminal job from `start` on.
    async fn cancel_from(&mut self, start: usize) {
        for index in start..self.state.jobs.len() {
            if self.state.jobs[index].cancel() {
                self.record(index).await;
            }
        }
    }

    /// Best-effort write of one job plus the runner state.
    async fn record(&self, index: usize) {
        if let Err(e) = self.session.update_job(&self.state.jobs[index]).await {
            tracing::warn!(error = %e, job_index = index, "job update not persisted");
        }
        if let Err(e) = self.save_state().await {
            tracing::warn!(error = %e, "runner state not persisted");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "job panicked".to_string()
    }
}

/// Whether every job of a finished run ended `finished` or `canceled`.
pub fn run_succeeded<J>(jobs: &[Job<J>]) -> bool {
    jobs.iter()
        .all(|job| matches!(job.status, JobStatus::Finished | JobStatus::Canceled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(boxed.as_ref()), "owned boom");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "job panicked");
    }

    #[test]
    fn test_run_succeeded() {
        let mut done = Job::new("login");
        done.begin().expect("begin");
        done.finish(None).expect("finish");
        let mut skipped = Job::new("restoreUserLang");
        skipped.cancel();
        assert!(run_succeeded(&[done.clone(), skipped]));

        let mut failed = Job::new("indexTweets");
        failed.begin().expect("begin");
        failed.fail("boom", None).expect("fail");
        assert!(!run_succeeded(&[done, failed]));
    }
}
