//! Owner-scoped scenario snapshots.
//!
//! Every operation filters on `account_id`; there is no cross-account path.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::models::Scenario;

pub async fn list(pool: &SqlitePool, account_id: &str) -> Result<Vec<Scenario>, sqlx::Error> {
    sqlx::query_as::<_, Scenario>(
        "SELECT id, account_id, name, base_currency, overrides, created_at, updated_at \
         FROM scenarios WHERE account_id = ?1",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await
}

pub async fn find(
    pool: &SqlitePool,
    account_id: &str,
    name: &str,
) -> Result<Option<Scenario>, sqlx::Error> {
    sqlx::query_as::<_, Scenario>(
        "SELECT id, account_id, name, base_currency, overrides, created_at, updated_at \
         FROM scenarios WHERE account_id = ?1 AND name = ?2",
    )
    .bind(account_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

/// Insert or replace by `(account_id, name)` in one statement, so concurrent
/// saves of the same name converge on a single row holding the latest data.
/// `updated_at` is stamped only when an existing row is replaced.
pub async fn upsert(
    pool: &SqlitePool,
    account_id: &str,
    name: &str,
    overrides: &str,
    base_currency: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO scenarios (id, account_id, name, base_currency, overrides, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
        ON CONFLICT(account_id, name) DO UPDATE SET
            base_currency = excluded.base_currency,
            overrides = excluded.overrides,
            updated_at = ?6
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(account_id)
    .bind(name)
    .bind(base_currency)
    .bind(overrides)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a scenario if the given account owns it. Returns whether a row was
/// removed; someone else's scenario with the same name is untouched.
pub async fn delete(pool: &SqlitePool, account_id: &str, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM scenarios WHERE account_id = ?1 AND name = ?2")
        .bind(account_id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
