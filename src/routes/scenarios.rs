//! Scenario routes, always scoped to the authenticated account.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

use crate::error::{AppError, ValidationError};
use crate::models::Scenario;
use crate::session::Session;
use crate::store::scenarios;

#[derive(Deserialize)]
pub struct UpsertScenarioRequest {
    /// Opaque override mapping, stored as-is.
    pub overrides: serde_json::Value,
    #[serde(default = "default_currency")]
    pub base_currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Serialize)]
pub struct ScenarioResponse {
    pub name: String,
    pub base_currency: String,
    pub overrides: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Scenario> for ScenarioResponse {
    fn from(scenario: Scenario) -> Self {
        Self {
            overrides: scenario.overrides_json(),
            name: scenario.name,
            base_currency: scenario.base_currency,
            created_at: scenario.created_at,
            updated_at: scenario.updated_at,
        }
    }
}

/// GET /api/scenarios
pub async fn list_scenarios(
    session: web::ReqData<Session>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let rows = scenarios::list(pool.get_ref(), &session.account_id).await?;
    let body: Vec<ScenarioResponse> = rows.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(body))
}

/// PUT /api/scenarios/{name}
///
/// Idempotent upsert by name within the account; saving the same name twice
/// leaves one scenario holding the latest overrides.
pub async fn upsert_scenario(
    name: web::Path<String>,
    form: web::Json<UpsertScenarioRequest>,
    session: web::ReqData<Session>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::EmptyField("name").into());
    }

    scenarios::upsert(
        pool.get_ref(),
        &session.account_id,
        &name,
        &form.overrides.to_string(),
        &form.base_currency,
    )
    .await?;

    let stored = scenarios::find(pool.get_ref(), &session.account_id, &name)
        .await?
        .ok_or_else(|| AppError::Internal("Scenario missing after upsert".to_string()))?;

    Ok(HttpResponse::Ok().json(ScenarioResponse::from(stored)))
}

/// DELETE /api/scenarios/{name}
///
/// Deletes only a scenario the caller owns; 404 otherwise.
pub async fn delete_scenario(
    name: web::Path<String>,
    session: web::ReqData<Session>,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, AppError> {
    let removed = scenarios::delete(pool.get_ref(), &session.account_id, &name).await?;

    if removed {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "No scenario with this name",
            "code": "SCENARIO_NOT_FOUND"
        })))
    }
}
