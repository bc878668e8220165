mod auth;
mod health_check;
mod scenarios;

pub use auth::{
    current_session, forgot_password, inspect_reset_token, login, logout, refresh_session,
    register, resend_verification, reset_password, verify_email,
};
pub use health_check::health_check;
pub use scenarios::{delete_scenario, list_scenarios, upsert_scenario};
