//! Saved runner state, one JSON document per account.

use crate::error::Result;
use cinder_core::AccountId;
use serde_json::Value;
use sqlx::SqlitePool;

/// Store the state, replacing the previous one.
pub async fn save_runner_state(
    pool: &SqlitePool,
    account_id: &AccountId,
    state: &Value,
) -> Result<()> {
    let state_str = serde_json::to_string(state)?;

    sqlx::query(
        r"
        INSERT INTO runner_state (account_id, state, saved_at)
        VALUES (?, ?, datetime('now'))
        ON CONFLICT(account_id) DO UPDATE SET
            state = excluded.state,
            saved_at = datetime('now')
        ",
    )
    .bind(account_id.as_str())
    .bind(state_str)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the last saved state.
pub async fn load_runner_state(
    pool: &SqlitePool,
    account_id: &AccountId,
) -> Result<Option<Value>> {
    let row =
        sqlx::query_scalar::<_, String>("SELECT state FROM runner_state WHERE account_id = ?")
            .bind(account_id.as_str())
            .fetch_optional(pool)
            .await?;

    Ok(row.as_deref().map(serde_json::from_str).transpose()?)
}

/// Forget the saved state.
pub async fn clear_runner_state(pool: &SqlitePool, account_id: &AccountId) -> Result<()> {
    sqlx::query("DELETE FROM runner_state WHERE account_id = ?")
        .bind(account_id.as_str())
        .execute(pool)
        .await?;

    Ok(())
}
