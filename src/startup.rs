use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::sqlite::SqlitePool;

use crate::configuration::SecuritySettings;
use crate::email::EmailCapability;
use crate::middleware::{RequestLog, SessionGuard};
use crate::orchestrator::Authenticator;
use crate::routes::{
    current_session, delete_scenario, forgot_password, health_check, inspect_reset_token,
    list_scenarios, login, logout, refresh_session, register, resend_verification, reset_password,
    upsert_scenario, verify_email,
};

pub fn run(
    listener: TcpListener,
    pool: SqlitePool,
    security: SecuritySettings,
    mailer: Arc<dyn EmailCapability>,
) -> Result<Server, std::io::Error> {
    let email_configured = mailer.is_configured();
    let authenticator = Authenticator::new(pool.clone(), mailer, security.clone());

    let pool_data = web::Data::new(pool.clone());
    let authenticator_data = web::Data::new(authenticator);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLog)
            .app_data(pool_data.clone())
            .app_data(authenticator_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/verify", web::get().to(verify_email))
                    .route("/resend", web::post().to(resend_verification))
                    .route("/forgot", web::post().to(forgot_password))
                    .route("/reset", web::get().to(inspect_reset_token))
                    .route("/reset", web::post().to(reset_password)),
            )
            // Protected routes: every entry point behind the session gate
            .service(
                web::scope("/api")
                    .wrap(SessionGuard::new(
                        pool.clone(),
                        security.clone(),
                        email_configured,
                    ))
                    .route("/me", web::get().to(current_session))
                    .route("/session/refresh", web::post().to(refresh_session))
                    .route("/logout", web::post().to(logout))
                    .route("/scenarios", web::get().to(list_scenarios))
                    .route("/scenarios/{name}", web::put().to(upsert_scenario))
                    .route("/scenarios/{name}", web::delete().to(delete_scenario)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
