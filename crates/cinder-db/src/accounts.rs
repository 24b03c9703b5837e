//! Account records.

use crate::error::Result;
use cinder_core::{Account, AccountId, PlatformKind, Timestamp};
use sqlx::SqlitePool;

type AccountRow = (String, String, Option<String>, String, String);

fn account_from_row(row: AccountRow) -> Result<Account> {
    let (id, platform, username, created_at, updated_at) = row;
    Ok(Account {
        id: AccountId::new(id)?,
        platform: platform.parse::<PlatformKind>()?,
        username,
        created_at: Timestamp::from_rfc3339(&created_at)?,
        updated_at: Timestamp::from_rfc3339(&updated_at)?,
    })
}

/// Insert or update an account. `created_at` is kept from the first save.
pub async fn save_account(pool: &SqlitePool, account: &Account) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO accounts (id, platform, username, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            platform = excluded.platform,
            username = excluded.username,
            updated_at = excluded.updated_at
        ",
    )
    .bind(account.id.as_str())
    .bind(account.platform.as_str())
    .bind(&account.username)
    .bind(account.created_at.to_rfc3339())
    .bind(account.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    tracing::debug!(account_id = %account.id, platform = %account.platform, "account saved");
    Ok(())
}

/// Look up an account by id.
pub async fn get_account(pool: &SqlitePool, id: &AccountId) -> Result<Option<Account>> {
    let row: Option<AccountRow> = sqlx::query_as(
        r"
        SELECT id, platform, username, created_at, updated_at
        FROM accounts
        WHERE id = ?
        ",
    )
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(account_from_row).transpose()
}

/// All accounts, oldest first.
pub async fn list_accounts(pool: &SqlitePool) -> Result<Vec<Account>> {
    let rows: Vec<AccountRow> = sqlx::query_as(
        r"
        SELECT id, platform, username, created_at, updated_at
        FROM accounts
        ORDER BY created_at ASC
        ",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(account_from_row).collect()
}
