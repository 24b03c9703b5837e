//! Cinder Database Layer
//!
//! `SQLite` storage for automated accounts, their job lists, per-account
//! configuration and the last saved runner state. [`Database`] implements
//! the runner's [`cinder_runner::Persistence`] collaborator.
//!
//! # Example
//!
//! ```ignore
//! use cinder_db::Database;
//!
//! let db = Database::new("cinder.db").await?;
//! db.run_migrations().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod accounts;
pub mod config;
pub mod connection;
pub mod error;
pub mod jobs;
pub mod migrations;
pub mod persistence;
pub mod runner_state;

pub use error::{DatabaseError, Result};

use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Pooled database handle with embedded migrations.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the database file at `path`.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::new(connection::IN_MEMORY).await
    }

    /// Open the database at `path` and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::new(path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Apply pending migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Highest applied migration version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// The underlying pool, for the query modules.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
