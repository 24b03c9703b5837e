//! Per-account key/value configuration.
//!
//! Platforms keep small facts here between runs, such as the UI language
//! saved before switching an account to English.

use crate::error::Result;
use cinder_core::AccountId;
use sqlx::SqlitePool;

/// Set a config value for an account, replacing any previous value.
pub async fn set_config(
    pool: &SqlitePool,
    account_id: &AccountId,
    key: &str,
    value: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO account_config (account_id, key, value, updated_at)
        VALUES (?, ?, ?, datetime('now'))
        ON CONFLICT(account_id, key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        ",
    )
    .bind(account_id.as_str())
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a config value for an account
pub async fn get_config(
    pool: &SqlitePool,
    account_id: &AccountId,
    key: &str,
) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>(
        r"
        SELECT value
        FROM account_config
        WHERE account_id = ? AND key = ?
        ",
    )
    .bind(account_id.as_str())
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value)
}

/// Delete a config value for an account
pub async fn delete_config(pool: &SqlitePool, account_id: &AccountId, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM account_config WHERE account_id = ? AND key = ?")
        .bind(account_id.as_str())
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}
