//! Verification and password-reset token records.
//!
//! Issuing never invalidates prior outstanding tokens of the same kind; each
//! stays independently consumable until its own expiry or use. Consumption is
//! guarded by `used_at IS NULL` so a concurrent duplicate attempt loses.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::models::{AuthToken, TokenKind};

/// Insert a fresh token row for an account.
pub async fn issue<'e, E>(
    executor: E,
    kind: TokenKind,
    account_id: &str,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<AuthToken, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let record = AuthToken {
        id: Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        token: token.to_string(),
        expires_at,
        used_at: None,
    };

    let sql = format!(
        "INSERT INTO {} (id, account_id, token, expires_at, used_at) \
         VALUES (?1, ?2, ?3, ?4, NULL)",
        kind.table()
    );
    sqlx::query(&sql)
        .bind(&record.id)
        .bind(&record.account_id)
        .bind(&record.token)
        .bind(record.expires_at)
        .execute(executor)
        .await?;

    Ok(record)
}

/// Look a token up by its opaque value. Used and expired rows are returned
/// too; the orchestrator decides what to tell the user.
pub async fn find_by_value<'e, E>(
    executor: E,
    kind: TokenKind,
    token: &str,
) -> Result<Option<AuthToken>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT id, account_id, token, expires_at, used_at FROM {} WHERE token = ?1",
        kind.table()
    );
    sqlx::query_as::<_, AuthToken>(&sql)
        .bind(token)
        .fetch_optional(executor)
        .await
}

/// Stamp `used_at`, once. Returns `false` when the token was already used,
/// which a concurrent duplicate consumption observes instead of re-applying
/// the side effect. Callers pair this with the account mutation in one
/// transaction.
pub async fn consume<'e, E>(
    executor: E,
    kind: TokenKind,
    token_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE {} SET used_at = ?1 WHERE id = ?2 AND used_at IS NULL",
        kind.table()
    );
    let result = sqlx::query(&sql)
        .bind(now)
        .bind(token_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}
