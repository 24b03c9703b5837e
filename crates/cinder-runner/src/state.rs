//! Wizard state machine types and the persisted runner state.
//!
//! Wizard position, run sub-state and failure catalogs are separate types so
//! one can never be assigned where another is expected.

use crate::platform::Platform;
use cinder_core::Job;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position inside the options wizard. `E` names a platform options page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep<E> {
    Prestart,
    Start,
    Options(E),
    Review,
}

/// Top-level runner state.
///
/// Each `Wizard` state pairs with a `WizardDisplay` twin: the runner computes
/// instructions in the former, then rests in the latter until the UI answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardState<E> {
    Login,
    Wizard(WizardStep<E>),
    WizardDisplay(WizardStep<E>),
    RunJobs,
    FinishedRunningJobs,
    FinishedRunningJobsDisplay,
}

impl<E> WizardState<E> {
    /// States where `run()` hands control to the UI.
    pub fn is_display(&self) -> bool {
        matches!(
            self,
            Self::WizardDisplay(_) | Self::FinishedRunningJobsDisplay
        )
    }
}

impl<E: fmt::Debug> fmt::Display for WizardState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("Login"),
            Self::Wizard(step) => write!(f, "Wizard{}", StepName(step)),
            Self::WizardDisplay(step) => write!(f, "Wizard{}Display", StepName(step)),
            Self::RunJobs => f.write_str("RunJobs"),
            Self::FinishedRunningJobs => f.write_str("FinishedRunningJobs"),
            Self::FinishedRunningJobsDisplay => f.write_str("FinishedRunningJobsDisplay"),
        }
    }
}

struct StepName<'a, E>(&'a WizardStep<E>);

impl<E: fmt::Debug> fmt::Display for StepName<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            WizardStep::Prestart => f.write_str("Prestart"),
            WizardStep::Start => f.write_str("Start"),
            WizardStep::Options(page) => write!(f, "{page:?}Options"),
            WizardStep::Review => f.write_str("Review"),
        }
    }
}

/// What the run loop is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunJobsState<J> {
    #[default]
    Idle,
    Running(J),
    Finished,
}

/// Answers the UI gives to a display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardInput {
    Next,
    Back,
    StartRun,
    Cancel,
    Reset,
}

/// Everything needed to resume a run after a restart.
///
/// `current_job_index` always points at the job last attempted or about to be
/// attempted.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct RunnerState<P: Platform> {
    pub state: WizardState<P::OptionsPage>,
    pub action: RunJobsState<P::JobType>,
    pub action_string: String,
    pub progress: P::Progress,
    pub jobs: Vec<Job<P::JobType>>,
    pub current_job_index: usize,
    #[serde(default)]
    pub options: P::Options,
    /// Wizard instructions for the current display state
    #[serde(default)]
    pub instructions: String,
}

impl<P: Platform> Default for RunnerState<P> {
    fn default() -> Self {
        Self {
            state: WizardState::Login,
            action: RunJobsState::Idle,
            action_string: String::new(),
            progress: P::Progress::default(),
            jobs: Vec::new(),
            current_job_index: 0,
            options: P::Options::default(),
            instructions: String::new(),
        }
    }
}

impl<P: Platform> Clone for RunnerState<P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            action: self.action,
            action_string: self.action_string.clone(),
            progress: self.progress.clone(),
            jobs: self.jobs.clone(),
            current_job_index: self.current_job_index,
            options: self.options.clone(),
            instructions: self.instructions.clone(),
        }
    }
}

impl<P: Platform> fmt::Debug for RunnerState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerState")
            .field("state", &self.state)
            .field("action", &self.action)
            .field("action_string", &self.action_string)
            .field("jobs", &self.jobs.len())
            .field("current_job_index", &self.current_job_index)
            .finish_non_exhaustive()
    }
}

impl<P: Platform> RunnerState<P> {
    /// The job the cursor points at, if any.
    pub fn current_job(&self) -> Option<&Job<P::JobType>> {
        self.jobs.get(self.current_job_index)
    }

    /// Whether any job of the run ended in error.
    pub fn finished_with_errors(&self) -> bool {
        self.jobs
            .iter()
            .any(|job| job.status == cinder_core::JobStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    enum Page {
        Delete,
    }

    #[test]
    fn test_state_names() {
        assert_eq!(WizardState::<Page>::Login.to_string(), "Login");
        assert_eq!(
            WizardState::Wizard(WizardStep::<Page>::Start).to_string(),
            "WizardStart"
        );
        assert_eq!(
            WizardState::WizardDisplay(WizardStep::Options(Page::Delete)).to_string(),
            "WizardDeleteOptionsDisplay"
        );
    }

    #[test]
    fn test_display_states() {
        assert!(WizardState::WizardDisplay(WizardStep::<Page>::Review).is_display());
        assert!(WizardState::<Page>::FinishedRunningJobsDisplay.is_display());
        assert!(!WizardState::<Page>::RunJobs.is_display());
    }

    #[test]
    fn test_wizard_state_serde() {
        let state = WizardState::Wizard(WizardStep::Options(Page::Delete));
        let json = serde_json::to_string(&state).expect("serialize");
        let back: WizardState<Page> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, state);
    }
}
