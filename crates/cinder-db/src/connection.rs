//! `SQLite` connection pool setup.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const MAX_CONNECTIONS: u32 = 5;

/// Open (creating if needed) the database at `path`.
///
/// Parent directories are created for file databases. An in-memory database
/// is pinned to a single long-lived connection, since every new `SQLite`
/// connection to `:memory:` would otherwise see an empty database.
pub async fn open_pool(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| DatabaseError::Open("invalid database path: not valid UTF-8".to_string()))?;

    let in_memory = path_str == IN_MEMORY;
    if !in_memory {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut connect_options = SqliteConnectOptions::from_str(path_str)
        .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
        .foreign_keys(true)
        .create_if_missing(true);
    if !in_memory {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
    };

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to initialize pool: {e}")))?;

    tracing::info!("Database pool created at {}", path_str);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_shares_one_database() {
        let pool = open_pool(IN_MEMORY).await.expect("open pool");
        sqlx::query("CREATE TABLE t (x INTEGER)")
            .execute(&pool)
            .await
            .expect("create table");

        // A second query must see the table created by the first.
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t")
            .fetch_one(&pool)
            .await
            .expect("query table");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_file_pool_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("cinder.db");

        let pool = open_pool(&path).await.expect("open pool");
        pool.close().await;

        assert!(path.exists());
    }
}
