//! Embedded schema migrations.

use crate::error::{DatabaseError, Result};
use sqlx::{Pool, Sqlite};

/// Apply every migration in `migrations/` that has not run yet.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration execution failed: {e}")))?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Highest applied migration version, or 0 on a fresh database.
pub async fn get_schema_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let table_exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?
        > 0;

    if !table_exists {
        return Ok(0);
    }

    let version =
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(version), 0) FROM _sqlx_migrations")
            .fetch_optional(pool)
            .await?
            .unwrap_or(0);

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{open_pool, IN_MEMORY};

    #[tokio::test]
    async fn test_fresh_database_has_version_zero() {
        let pool = open_pool(IN_MEMORY).await.expect("open pool");
        assert_eq!(get_schema_version(&pool).await.expect("version"), 0);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = open_pool(IN_MEMORY).await.expect("open pool");
        run_migrations(&pool).await.expect("first run");
        run_migrations(&pool).await.expect("second run");
        assert_eq!(get_schema_version(&pool).await.expect("version"), 4);
    }
}
