use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use parkview_auth::configuration::{DatabaseSettings, SecuritySettings};
use parkview_auth::email::{EmailCapability, EmailDisabled};
use parkview_auth::error::EmailError;
use parkview_auth::startup::run;
use parkview_auth::store::{connect_pool, init_schema};

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
}

async fn spawn_app(mailer: Arc<dyn EmailCapability>) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // The in-memory database lives on a single connection.
    let database = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        acquire_timeout_secs: 5,
        idle_timeout_secs: 600,
        max_lifetime_secs: 1800,
        test_before_acquire: false,
    };
    let pool = connect_pool(&database).await.expect("Failed to create pool");
    init_schema(&pool).await.expect("Failed to initialize schema");

    let security = SecuritySettings {
        session_secret: "test-secret-key-at-least-32-characters-long".to_string(),
        session_expiry_hours: 1,
        issuer: "parkview-auth-test".to_string(),
        // Minimum bcrypt cost keeps the suite fast.
        bcrypt_cost: 4,
        token_expiry_hours: 24,
    };

    let server = run(listener, pool.clone(), security, mailer).expect("Failed to start server");
    let _ = tokio::spawn(server);

    TestApp { address, pool }
}

#[derive(Clone)]
struct SentMail {
    to: String,
    token: String,
    kind: &'static str,
}

/// Records every send instead of delivering, so tests can read the tokens
/// that would have gone out by email.
#[derive(Default)]
struct StubMailer {
    fail_sends: bool,
    outbox: Mutex<Vec<SentMail>>,
}

impl StubMailer {
    fn tokens(&self, kind: &str) -> Vec<String> {
        self.outbox
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.token.clone())
            .collect()
    }

    fn last_mail(&self) -> Option<SentMail> {
        self.outbox.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl EmailCapability for StubMailer {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send_verification(&self, to: &str, token: &str) -> Result<(), EmailError> {
        if self.fail_sends {
            return Err(EmailError::SendFailed("stub failure".to_string()));
        }
        self.outbox.lock().unwrap().push(SentMail {
            to: to.to_string(),
            token: token.to_string(),
            kind: "verification",
        });
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), EmailError> {
        if self.fail_sends {
            return Err(EmailError::SendFailed("stub failure".to_string()));
        }
        self.outbox.lock().unwrap().push(SentMail {
            to: to.to_string(),
            token: token.to_string(),
            kind: "reset",
        });
        Ok(())
    }
}

async fn register(client: &reqwest::Client, app: &TestApp, email: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "email": email,
            "password": password,
            "confirm_password": password
        }))
        .send()
        .await
        .expect("Failed to execute request")
}

async fn login_token(client: &reqwest::Client, app: &TestApp, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["session_token"].as_str().expect("Missing session token").to_string()
}

// --- Basic plumbing ---

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health_check", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
}

// --- Registration ---

#[tokio::test]
async fn register_without_email_capability_auto_verifies() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    let response = register(&client, &app, "alice@example.com", "Passw0rd").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["verification_pending"], json!(false));
    assert_eq!(body["feedback"]["severity"], json!("success"));

    let row = sqlx::query("SELECT is_verified FROM accounts WHERE email = 'alice@example.com'")
        .fetch_one(&app.pool)
        .await
        .expect("Account not created");
    assert!(row.get::<bool, _>("is_verified"));

    // Login works immediately, no token step required.
    let token = login_token(&client, &app, "alice@example.com", "Passw0rd").await;
    let me = client
        .get(format!("{}/api/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(200, me.status().as_u16());
}

#[tokio::test]
async fn register_with_email_capability_issues_a_verification_token() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    let response = register(&client, &app, "bob@example.com", "Passw0rd").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["verification_pending"], json!(true));

    let row = sqlx::query("SELECT id, is_verified FROM accounts WHERE email = 'bob@example.com'")
        .fetch_one(&app.pool)
        .await
        .expect("Account not created");
    assert!(!row.get::<bool, _>("is_verified"));

    let sent = mailer.last_mail().expect("No verification mail recorded");
    assert_eq!(sent.to, "bob@example.com");
    assert_eq!(sent.kind, "verification");
    assert_eq!(sent.token.len(), 64);

    // The stored token matches the mailed one and expires ~24h out.
    let token_row = sqlx::query("SELECT token, expires_at FROM verification_tokens")
        .fetch_one(&app.pool)
        .await
        .expect("Token not stored");
    assert_eq!(token_row.get::<String, _>("token"), sent.token);
    let expires_at: DateTime<Utc> = token_row.get("expires_at");
    assert!(expires_at > Utc::now() + Duration::hours(23));
    assert!(expires_at <= Utc::now() + Duration::hours(24));
}

#[tokio::test]
async fn duplicate_registration_conflicts_including_case_variants() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    let first = register(&client, &app, "carol@example.com", "Passw0rd").await;
    assert_eq!(201, first.status().as_u16());

    for variant in ["carol@example.com", "Carol@Example.COM", "  carol@example.com  "] {
        let response = register(&client, &app, variant, "Passw0rd").await;
        assert_eq!(409, response.status().as_u16(), "variant: {:?}", variant);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], json!("DUPLICATE_EMAIL"));
    }

    let count = sqlx::query("SELECT COUNT(*) AS n FROM accounts")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<i64, _>("n");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn register_rejects_invalid_input_with_the_first_violated_rule() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    for bad_email in ["notanemail", "user@", "@example.com", "a@b@c.com", "user@nodot"] {
        let response = register(&client, &app, bad_email, "Passw0rd").await;
        assert_eq!(400, response.status().as_u16(), "email: {:?}", bad_email);
    }

    for bad_password in ["Sh0rt", "passwords", "12345678"] {
        let response = register(&client, &app, "dave@example.com", bad_password).await;
        assert_eq!(400, response.status().as_u16(), "password: {:?}", bad_password);
    }

    let response = client
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "email": "dave@example.com",
            "password": "Passw0rd",
            "confirm_password": "Passw0rd2"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let count = sqlx::query("SELECT COUNT(*) AS n FROM accounts")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<i64, _>("n");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn register_survives_email_send_failure() {
    let mailer = Arc::new(StubMailer {
        fail_sends: true,
        ..Default::default()
    });
    let app = spawn_app(mailer).await;
    let client = reqwest::Client::new();

    let response = register(&client, &app, "erin@example.com", "Passw0rd").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["feedback"]["severity"], json!("warning"));

    // Account and token committed despite the transport failure.
    let accounts = sqlx::query("SELECT COUNT(*) AS n FROM accounts")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<i64, _>("n");
    let tokens = sqlx::query("SELECT COUNT(*) AS n FROM verification_tokens")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<i64, _>("n");
    assert_eq!((accounts, tokens), (1, 1));
}

// --- Login ---

#[tokio::test]
async fn login_is_uniform_for_unknown_account_and_wrong_password() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    register(&client, &app, "frank@example.com", "Passw0rd").await;

    let mut bodies = Vec::new();
    for (email, password) in [
        ("frank@example.com", "WrongPassw0rd"),
        ("nobody@example.com", "Passw0rd"),
    ] {
        let response = client
            .post(format!("{}/auth/login", app.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(401, response.status().as_u16());

        let mut body: Value = response.json().await.unwrap();
        // error_id and timestamp differ per response by design.
        body["error_id"] = json!(null);
        body["timestamp"] = json!(null);
        bodies.push(body);
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn login_stamps_last_login() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    register(&client, &app, "grace@example.com", "Passw0rd").await;

    let before = sqlx::query("SELECT last_login FROM accounts WHERE email = 'grace@example.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<Option<DateTime<Utc>>, _>("last_login");
    assert!(before.is_none());

    login_token(&client, &app, "grace@example.com", "Passw0rd").await;

    let after = sqlx::query("SELECT last_login FROM accounts WHERE email = 'grace@example.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<Option<DateTime<Utc>>, _>("last_login");
    assert!(after.is_some());
}

// --- Verification gate ---

#[tokio::test]
async fn unverified_account_is_gated_until_the_token_is_consumed() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    register(&client, &app, "heidi@example.com", "Passw0rd").await;

    // Login succeeds without verification...
    let token = login_token(&client, &app, "heidi@example.com", "Passw0rd").await;

    // ...but the gate forces Verify-Required on protected routes.
    let me = client
        .get(format!("{}/api/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(403, me.status().as_u16());
    let body: Value = me.json().await.unwrap();
    assert_eq!(body["code"], json!("VERIFY_REQUIRED"));

    // Consume the mailed token.
    let raw = mailer.last_mail().unwrap().token;
    let verify = client
        .get(format!("{}/auth/verify?token={}", app.address, raw))
        .send()
        .await
        .unwrap();
    assert_eq!(200, verify.status().as_u16());
    let body: Value = verify.json().await.unwrap();
    assert_eq!(body["verified"], json!(true));

    // The old session token still works: the gate re-reads the store when
    // the cached snapshot says unverified.
    let me = client
        .get(format!("{}/api/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(200, me.status().as_u16());
    let body: Value = me.json().await.unwrap();
    assert_eq!(body["is_verified"], json!(true));
}

#[tokio::test]
async fn requests_without_a_session_are_rejected() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    let response = client
        .get(format!("{}/api/me", app.address))
        .bearer_auth("not.a.valid.token")
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    // Guard rejections carry the same structured body as every other error.
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], json!("SESSION_INVALID"));
    assert_eq!(body["status"], json!(401));
    assert!(body["error_id"].as_str().is_some());
    assert!(body["timestamp"].as_str().is_some());
}

// --- Verification token lifecycle ---

#[tokio::test]
async fn verification_token_is_single_use_and_idempotent_in_effect() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    register(&client, &app, "ivan@example.com", "Passw0rd").await;
    let raw = mailer.last_mail().unwrap().token;

    let first = client
        .get(format!("{}/auth/verify?token={}", app.address, raw))
        .send()
        .await
        .unwrap();
    assert_eq!(200, first.status().as_u16());
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["feedback"]["severity"], json!("success"));

    let used_at = sqlx::query("SELECT used_at FROM verification_tokens WHERE token = ?1")
        .bind(&raw)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<Option<DateTime<Utc>>, _>("used_at");
    let used_at = used_at.expect("Token not stamped used");

    // Every subsequent call is informational, and the stamp never moves.
    for _ in 0..2 {
        let again = client
            .get(format!("{}/auth/verify?token={}", app.address, raw))
            .send()
            .await
            .unwrap();
        assert_eq!(200, again.status().as_u16());
        let body: Value = again.json().await.unwrap();
        assert_eq!(body["feedback"]["severity"], json!("info"));
    }

    let stamp = sqlx::query("SELECT used_at FROM verification_tokens WHERE token = ?1")
        .bind(&raw)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<Option<DateTime<Utc>>, _>("used_at");
    assert_eq!(stamp, Some(used_at));
}

#[tokio::test]
async fn expired_verification_token_is_refused_and_leaves_state_unchanged() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    register(&client, &app, "judy@example.com", "Passw0rd").await;
    let raw = mailer.last_mail().unwrap().token;

    sqlx::query("UPDATE verification_tokens SET expires_at = ?1 WHERE token = ?2")
        .bind(Utc::now() - Duration::hours(1))
        .bind(&raw)
        .execute(&app.pool)
        .await
        .unwrap();

    let response = client
        .get(format!("{}/auth/verify?token={}", app.address, raw))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["verified"], json!(false));

    // Unused and unconsumed: the account stays unverified.
    let row = sqlx::query(
        "SELECT a.is_verified, t.used_at FROM accounts a \
         JOIN verification_tokens t ON t.account_id = a.id WHERE t.token = ?1",
    )
    .bind(&raw)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert!(!row.get::<bool, _>("is_verified"));
    assert!(row.get::<Option<DateTime<Utc>>, _>("used_at").is_none());
}

#[tokio::test]
async fn unknown_verification_token_is_invalid() {
    let app = spawn_app(Arc::new(StubMailer::default())).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/auth/verify?token={}", app.address, "0".repeat(64)))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
}

// --- Resend verification ---

#[tokio::test]
async fn resend_discloses_missing_accounts_and_reissues_for_unverified() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/auth/resend", app.address))
        .json(&json!({ "email": "nobody@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());

    register(&client, &app, "kim@example.com", "Passw0rd").await;

    let response = client
        .post(format!("{}/auth/resend", app.address))
        .json(&json!({ "email": "kim@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    // Both outstanding tokens are independently consumable; the first-issued
    // one still verifies.
    let tokens = mailer.tokens("verification");
    assert_eq!(tokens.len(), 2);
    let verify = client
        .get(format!("{}/auth/verify?token={}", app.address, tokens[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(200, verify.status().as_u16());

    let response = client
        .post(format!("{}/auth/resend", app.address))
        .json(&json!({ "email": "kim@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["feedback"]["severity"], json!("info"));
}

// --- Password reset ---

#[tokio::test]
async fn forgot_password_is_externally_indistinguishable() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    register(&client, &app, "lena@example.com", "Passw0rd").await;

    let mut bodies = Vec::new();
    for email in ["lena@example.com", "nobody@example.com"] {
        let response = client
            .post(format!("{}/auth/forgot", app.address))
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status().as_u16());
        bodies.push(response.json::<Value>().await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);

    // Only the existing account got a token.
    assert_eq!(mailer.tokens("reset").len(), 1);
    let count = sqlx::query("SELECT COUNT(*) AS n FROM password_reset_tokens")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<i64, _>("n");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn forgot_password_without_email_capability_stays_indistinguishable() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    register(&client, &app, "quinn@example.com", "Passw0rd").await;

    let mut bodies = Vec::new();
    for email in ["quinn@example.com", "nobody@example.com"] {
        let response = client
            .post(format!("{}/auth/forgot", app.address))
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status().as_u16(), "email: {:?}", email);
        bodies.push(response.json::<Value>().await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);

    // No token is issued when none could ever be delivered.
    let count = sqlx::query("SELECT COUNT(*) AS n FROM password_reset_tokens")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<i64, _>("n");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn resend_without_email_capability_is_uniformly_unavailable() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    register(&client, &app, "rita@example.com", "Passw0rd").await;

    // Existing and missing accounts get the same 503; the usual 404
    // disclosure only applies while a transport is configured.
    for email in ["rita@example.com", "nobody@example.com"] {
        let response = client
            .post(format!("{}/auth/resend", app.address))
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(503, response.status().as_u16(), "email: {:?}", email);
    }

    let count = sqlx::query("SELECT COUNT(*) AS n FROM verification_tokens")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get::<i64, _>("n");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn reset_flow_changes_the_password_exactly_once() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    register(&client, &app, "mallory@example.com", "Passw0rd").await;
    let verify_token = mailer.last_mail().unwrap().token;
    client
        .get(format!("{}/auth/verify?token={}", app.address, verify_token))
        .send()
        .await
        .unwrap();

    client
        .post(format!("{}/auth/forgot", app.address))
        .json(&json!({ "email": "mallory@example.com" }))
        .send()
        .await
        .unwrap();
    let reset_token = mailer.tokens("reset").pop().unwrap();

    // Non-consuming inspection says the token is usable.
    let inspect = client
        .get(format!("{}/auth/reset?token={}", app.address, reset_token))
        .send()
        .await
        .unwrap();
    let body: Value = inspect.json().await.unwrap();
    assert_eq!(body["usable"], json!(true));

    let response = client
        .post(format!("{}/auth/reset", app.address))
        .json(&json!({
            "token": reset_token,
            "new_password": "N3wPassword",
            "confirm_password": "N3wPassword"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    // Old password is dead, new one works; no auto-login happened.
    let old = client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({ "email": "mallory@example.com", "password": "Passw0rd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(401, old.status().as_u16());
    login_token(&client, &app, "mallory@example.com", "N3wPassword").await;

    // The token is spent: inspection flips and a second consumption conflicts.
    let inspect = client
        .get(format!("{}/auth/reset?token={}", app.address, reset_token))
        .send()
        .await
        .unwrap();
    let body: Value = inspect.json().await.unwrap();
    assert_eq!(body["usable"], json!(false));

    let again = client
        .post(format!("{}/auth/reset", app.address))
        .json(&json!({
            "token": reset_token,
            "new_password": "0therPassword",
            "confirm_password": "0therPassword"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(409, again.status().as_u16());

    // And the second attempt changed nothing.
    login_token(&client, &app, "mallory@example.com", "N3wPassword").await;
}

#[tokio::test]
async fn reset_validates_the_new_password_before_touching_the_token() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    register(&client, &app, "nina@example.com", "Passw0rd").await;
    client
        .post(format!("{}/auth/forgot", app.address))
        .json(&json!({ "email": "nina@example.com" }))
        .send()
        .await
        .unwrap();
    let reset_token = mailer.tokens("reset").pop().unwrap();

    let response = client
        .post(format!("{}/auth/reset", app.address))
        .json(&json!({
            "token": reset_token,
            "new_password": "weak",
            "confirm_password": "weak"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    // The token survived the rejected attempt.
    let inspect = client
        .get(format!("{}/auth/reset?token={}", app.address, reset_token))
        .send()
        .await
        .unwrap();
    let body: Value = inspect.json().await.unwrap();
    assert_eq!(body["usable"], json!(true));
}

// --- Session refresh and logout ---

#[tokio::test]
async fn session_refresh_returns_an_updated_snapshot() {
    let mailer = Arc::new(StubMailer::default());
    let app = spawn_app(mailer.clone()).await;
    let client = reqwest::Client::new();

    register(&client, &app, "oscar@example.com", "Passw0rd").await;
    let raw = mailer.last_mail().unwrap().token;
    client
        .get(format!("{}/auth/verify?token={}", app.address, raw))
        .send()
        .await
        .unwrap();

    let token = login_token(&client, &app, "oscar@example.com", "Passw0rd").await;

    let response = client
        .post(format!("{}/api/session/refresh", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["account"]["is_verified"], json!(true));
    assert!(body["session_token"].as_str().is_some());
}

#[tokio::test]
async fn logout_answers_no_content() {
    let app = spawn_app(Arc::new(EmailDisabled)).await;
    let client = reqwest::Client::new();

    register(&client, &app, "peggy@example.com", "Passw0rd").await;
    let token = login_token(&client, &app, "peggy@example.com", "Passw0rd").await;

    let response = client
        .post(format!("{}/api/logout", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(204, response.status().as_u16());
}
