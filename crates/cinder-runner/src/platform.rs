//! The job-table seam between the shared runtime and each platform.

use crate::error::Result;
use crate::session::AutomationSession;
use crate::state::{RunnerState, WizardStep};
use async_trait::async_trait;
use cinder_core::{Job, PlatformKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::str::FromStr;

/// A platform's closed set of job types.
pub trait JobKind:
    Copy + Eq + Debug + Display + FromStr + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Action string shown while a job of this type runs.
    fn describe(&self) -> String;
}

/// Everything the runner needs to know about one platform.
///
/// `run_job` is the job table: it dispatches on [`JobContext::job_type`] to
/// the step function for that tag.
#[async_trait]
pub trait Platform: Sized + Send + Sync + 'static {
    type JobType: JobKind;
    type Progress: Serialize + DeserializeOwned + Default + Clone + Debug + Send + Sync;
    type OptionsPage: Copy + Eq + Debug + Serialize + DeserializeOwned + Send + Sync;
    type Options: Serialize + DeserializeOwned + Default + Clone + Debug + Send + Sync;

    fn kind(&self) -> PlatformKind;

    /// Options pages to walk through for the current options, in order.
    fn options_pages(&self, options: &Self::Options) -> Vec<Self::OptionsPage>;

    /// Instructions shown in the display twin of `step`.
    fn instructions(&self, step: &WizardStep<Self::OptionsPage>, options: &Self::Options)
        -> String;

    /// Ordered job list for a run with `options`.
    fn define_jobs(&self, options: &Self::Options) -> Vec<Self::JobType>;

    /// Bring the surface to a logged-in page before the wizard starts.
    async fn login(&self, session: &AutomationSession) -> Result<()>;

    /// Run the step function for the current job.
    async fn run_job(&self, ctx: &mut JobContext<'_, Self>) -> Result<()>;
}

/// What a step function sees of the run.
pub struct JobContext<'a, P: Platform> {
    pub session: &'a AutomationSession,
    state: &'a mut RunnerState<P>,
}

impl<'a, P: Platform> JobContext<'a, P> {
    pub(crate) fn new(session: &'a AutomationSession, state: &'a mut RunnerState<P>) -> Self {
        Self { session, state }
    }

    pub fn index(&self) -> usize {
        self.state.current_job_index
    }

    /// Tag of the job being run.
    ///
    /// # Panics
    /// Never while the runner owns the context: the cursor is in bounds.
    pub fn job_type(&self) -> P::JobType {
        self.state.jobs[self.state.current_job_index].job_type
    }

    pub fn jobs(&self) -> &[Job<P::JobType>] {
        &self.state.jobs
    }

    pub fn options(&self) -> &P::Options {
        &self.state.options
    }

    pub fn progress(&self) -> &P::Progress {
        &self.state.progress
    }

    pub fn progress_mut(&mut self) -> &mut P::Progress {
        &mut self.state.progress
    }

    pub fn set_action_string(&mut self, action: impl Into<String>) {
        self.state.action_string = action.into();
    }

    /// Cancel every still-pending job after the current one that matches
    /// `predicate`. The run loop sees the change on its next iteration.
    pub async fn cancel_pending_jobs(
        &mut self,
        predicate: impl Fn(P::JobType) -> bool + Send,
    ) -> Result<usize> {
        let start = self.state.current_job_index + 1;
        let mut canceled = 0;
        for job in self.state.jobs.iter_mut().skip(start) {
            if job.status == cinder_core::JobStatus::Pending
                && predicate(job.job_type)
                && job.cancel()
            {
                tracing::info!(job_type = %job.job_type, "canceling downstream job");
                self.session.update_job(job).await?;
                canceled += 1;
            }
        }
        Ok(canceled)
    }

    /// Persist the runner state and publish the progress.
    pub async fn checkpoint(&self) -> Result<()> {
        self.session.persist_state(&*self.state).await?;
        self.session.emit_progress(&self.state.progress);
        Ok(())
    }
}
