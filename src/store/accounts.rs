//! Account records, keyed by normalized email.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Account;

/// Insert a new account. The caller supplies an already-normalized email and
/// a digest from the credential hasher.
///
/// Concurrent registrations with the same email race on the unique constraint:
/// exactly one wins, the rest get `DuplicateEmail`.
pub async fn create<'e, E>(
    executor: E,
    email: &str,
    password_hash: &str,
    is_verified: bool,
) -> Result<Account, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let account = Account {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        is_verified,
        created_at: Utc::now(),
        last_login: None,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, is_verified, created_at, last_login)
        VALUES (?1, ?2, ?3, ?4, ?5, NULL)
        "#,
    )
    .bind(&account.id)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(account.is_verified)
    .bind(account.created_at)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(account),
        Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateEmail),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Account>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Account>(
        "SELECT id, email, password_hash, is_verified, created_at, last_login \
         FROM accounts WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, id: &str) -> Result<Option<Account>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Account>(
        "SELECT id, email, password_hash, is_verified, created_at, last_login \
         FROM accounts WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Flip the verified flag. Runs inside the same transaction as the
/// verification-token consumption that triggered it.
pub async fn mark_verified<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE accounts SET is_verified = 1 WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Replace the stored digest. Runs inside the same transaction as the
/// reset-token consumption that triggered it.
pub async fn update_password_hash<'e, E>(
    executor: E,
    id: &str,
    password_hash: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE accounts SET password_hash = ?1 WHERE id = ?2")
        .bind(password_hash)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn touch_last_login<'e, E>(
    executor: E,
    id: &str,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE accounts SET last_login = ?1 WHERE id = ?2")
        .bind(at)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed")
    )
}
