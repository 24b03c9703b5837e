//! Durability collaborator.
//!
//! The runner treats storage as at-least-once and fire-and-forget: no call
//! assumes a transaction spanning another.

use async_trait::async_trait;
use cinder_core::{Account, AccountId, Job, JobId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// A storage call failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct PersistenceError(pub String);

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Job, account, per-account config and saved runner state storage.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Create one pending job per type, in order, and return them with ids.
    async fn create_jobs(
        &self,
        account_id: &AccountId,
        job_types: &[String],
    ) -> PersistenceResult<Vec<Job>>;

    async fn update_job(&self, account_id: &AccountId, job: &Job) -> PersistenceResult<()>;

    async fn get_config(&self, account_id: &AccountId, key: &str)
        -> PersistenceResult<Option<String>>;

    async fn set_config(&self, account_id: &AccountId, key: &str, value: &str)
        -> PersistenceResult<()>;

    async fn save_account(&self, account: &Account) -> PersistenceResult<()>;

    /// Store the serialized `RunnerState`, replacing any previous one.
    async fn save_runner_state(
        &self,
        account_id: &AccountId,
        state: &serde_json::Value,
    ) -> PersistenceResult<()>;

    async fn load_runner_state(
        &self,
        account_id: &AccountId,
    ) -> PersistenceResult<Option<serde_json::Value>>;

    async fn clear_runner_state(&self, account_id: &AccountId) -> PersistenceResult<()>;
}

#[derive(Debug, Default)]
struct MemoryStore {
    jobs: HashMap<AccountId, Vec<Job>>,
    config: HashMap<(AccountId, String), String>,
    accounts: HashMap<AccountId, Account>,
    states: HashMap<AccountId, serde_json::Value>,
    next_job_id: u64,
}

/// In-process [`Persistence`] used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    store: Mutex<MemoryStore>,
    failing: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn jobs(&self, account_id: &AccountId) -> Vec<Job> {
        self.store().jobs.get(account_id).cloned().unwrap_or_default()
    }

    pub fn account(&self, account_id: &AccountId) -> Option<Account> {
        self.store().accounts.get(account_id).cloned()
    }

    pub fn runner_state(&self, account_id: &AccountId) -> Option<serde_json::Value> {
        self.store().states.get(account_id).cloned()
    }

    fn store(&self) -> MutexGuard<'_, MemoryStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> PersistenceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PersistenceError::new("storage unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn create_jobs(
        &self,
        account_id: &AccountId,
        job_types: &[String],
    ) -> PersistenceResult<Vec<Job>> {
        self.check()?;
        let mut store = self.store();
        let mut created = Vec::with_capacity(job_types.len());
        for job_type in job_types {
            store.next_job_id += 1;
            let mut job = Job::new(job_type.clone());
            job.id = Some(JobId::new(store.next_job_id.to_string()));
            created.push(job);
        }
        store
            .jobs
            .entry(account_id.clone())
            .or_default()
            .extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_job(&self, account_id: &AccountId, job: &Job) -> PersistenceResult<()> {
        self.check()?;
        let mut store = self.store();
        let jobs = store.jobs.entry(account_id.clone()).or_default();
        match jobs
            .iter_mut()
            .find(|stored| stored.id.is_some() && stored.id == job.id)
        {
            Some(stored) => *stored = job.clone(),
            None => jobs.push(job.clone()),
        }
        Ok(())
    }

    async fn get_config(
        &self,
        account_id: &AccountId,
        key: &str,
    ) -> PersistenceResult<Option<String>> {
        self.check()?;
        Ok(self
            .store()
            .config
            .get(&(account_id.clone(), key.to_string()))
            .cloned())
    }

    async fn set_config(
        &self,
        account_id: &AccountId,
        key: &str,
        value: &str,
    ) -> PersistenceResult<()> {
        self.check()?;
        self.store()
            .config
            .insert((account_id.clone(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn save_account(&self, account: &Account) -> PersistenceResult<()> {
        self.check()?;
        self.store()
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn save_runner_state(
        &self,
        account_id: &AccountId,
        state: &serde_json::Value,
    ) -> PersistenceResult<()> {
        self.check()?;
        self.store().states.insert(account_id.clone(), state.clone());
        Ok(())
    }

    async fn load_runner_state(
        &self,
        account_id: &AccountId,
    ) -> PersistenceResult<Option<serde_json::Value>> {
        self.check()?;
        Ok(self.store().states.get(account_id).cloned())
    }

    async fn clear_runner_state(&self, account_id: &AccountId) -> PersistenceResult<()> {
        self.check()?;
        self.store().states.remove(account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::{JobStatus, PlatformKind};

    fn account() -> AccountId {
        AccountId::new("acct-1").expect("valid id")
    }

    #[tokio::test]
    async fn test_create_jobs_assigns_ids_in_order() {
        let store = MemoryPersistence::new();
        let jobs = store
            .create_jobs(&account(), &["login".to_string(), "indexTweets".to_string()])
            .await
            .expect("create");

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_type, "login");
        assert_eq!(jobs[1].job_type, "indexTweets");
        assert!(jobs.iter().all(|j| j.id.is_some() && j.status == JobStatus::Pending));
        assert_ne!(jobs[0].id, jobs[1].id);
    }

    #[tokio::test]
    async fn test_update_job_replaces_by_id() {
        let store = MemoryPersistence::new();
        let mut jobs = store
            .create_jobs(&account(), &["login".to_string()])
            .await
            .expect("create");
        jobs[0].begin().expect("begin");
        store.update_job(&account(), &jobs[0]).await.expect("update");

        let stored = store.jobs(&account());
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, JobStatus::Running);
    }

    #[tokio::test]
    async fn test_config_round_trip_and_failure_switch() {
        let store = MemoryPersistence::new();
        store
            .set_config(&account(), "lang", "de")
            .await
            .expect("set");
        assert_eq!(
            store.get_config(&account(), "lang").await.expect("get"),
            Some("de".to_string())
        );

        store.set_failing(true);
        assert!(store.get_config(&account(), "lang").await.is_err());
        assert!(store
            .save_account(&Account::new(account(), PlatformKind::X))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_runner_state_save_load_clear() {
        let store = MemoryPersistence::new();
        let state = serde_json::json!({"currentJobIndex": 2});
        store
            .save_runner_state(&account(), &state)
            .await
            .expect("save");
        assert_eq!(
            store.load_runner_state(&account()).await.expect("load"),
            Some(state)
        );
        store.clear_runner_state(&account()).await.expect("clear");
        assert_eq!(store.load_runner_state(&account()).await.expect("load"), None);
    }
}
