//! [`Persistence`] backed by the database.

use crate::error::DatabaseError;
use crate::{accounts, config, jobs, runner_state, Database};
use async_trait::async_trait;
use cinder_core::{Account, AccountId, Job};
use cinder_runner::{Persistence, PersistenceError, PersistenceResult};
use serde_json::Value;

impl From<DatabaseError> for PersistenceError {
    fn from(err: DatabaseError) -> Self {
        Self::new(err.to_string())
    }
}

#[async_trait]
impl Persistence for Database {
    async fn create_jobs(
        &self,
        account_id: &AccountId,
        job_types: &[String],
    ) -> PersistenceResult<Vec<Job>> {
        Ok(jobs::create_jobs(self.pool(), account_id, job_types).await?)
    }

    async fn update_job(&self, account_id: &AccountId, job: &Job) -> PersistenceResult<()> {
        Ok(jobs::update_job(self.pool(), account_id, job).await?)
    }

    async fn get_config(
        &self,
        account_id: &AccountId,
        key: &str,
    ) -> PersistenceResult<Option<String>> {
        Ok(config::get_config(self.pool(), account_id, key).await?)
    }

    async fn set_config(
        &self,
        account_id: &AccountId,
        key: &str,
        value: &str,
    ) -> PersistenceResult<()> {
        Ok(config::set_config(self.pool(), account_id, key, value).await?)
    }

    async fn save_account(&self, account: &Account) -> PersistenceResult<()> {
        Ok(accounts::save_account(self.pool(), account).await?)
    }

    async fn save_runner_state(
        &self,
        account_id: &AccountId,
        state: &Value,
    ) -> PersistenceResult<()> {
        Ok(runner_state::save_runner_state(self.pool(), account_id, state).await?)
    }

    async fn load_runner_state(&self, account_id: &AccountId) -> PersistenceResult<Option<Value>> {
        Ok(runner_state::load_runner_state(self.pool(), account_id).await?)
    }

    async fn clear_runner_state(&self, account_id: &AccountId) -> PersistenceResult<()> {
        Ok(runner_state::clear_runner_state(self.pool(), account_id).await?)
    }
}
