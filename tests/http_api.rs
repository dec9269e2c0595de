//! HTTP surface tests: the documented routes wired to in-memory collaborators.

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use twostep::activity::memory::InMemoryActivitySink;
use twostep::api::{self, AuthState};
use twostep::identity::memory::InMemoryIdentityStore;
use twostep::token::EphemeralTokenIssuer;

fn app() -> (Arc<InMemoryIdentityStore>, Router) {
    let store = Arc::new(InMemoryIdentityStore::new());
    let state = Arc::new(AuthState::new(
        Arc::clone(&store) as Arc<dyn twostep::identity::IdentityStore>,
        Arc::new(InMemoryActivitySink::new()),
        Arc::new(EphemeralTokenIssuer),
        "Twostep".to_string(),
    ));
    let (router, _openapi) = api::router().split_for_parts();
    (store, router.layer(Extension(state)))
}

fn post_json(path: &str, body: &serde_json::Value) -> Result<Request<Body>> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))
        .context("failed to build request")
}

async fn json_body(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .context("failed to read body")?;
    serde_json::from_slice(&bytes).context("body is not JSON")
}

#[tokio::test]
async fn login_route_authenticates_and_rejects() -> Result<()> {
    let (store, app) = app();
    store.seed_identity("u1@x.com", "correct")?;

    let ok = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({"email": "u1@x.com", "password": "correct"}),
        )?)
        .await?;
    assert_eq!(ok.status(), StatusCode::OK);
    let body = json_body(ok).await?;
    assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("ok"));
    assert!(body.get("token").is_some());

    let rejected = app
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({"email": "u1@x.com", "password": "wrong"}),
        )?)
        .await?;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn enrollment_routes_drive_the_full_state_machine() -> Result<()> {
    let (store, app) = app();
    let id = store.seed_identity("u1@x.com", "correct")?;

    let started = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/mfa/enroll/start",
            &json!({"identity_id": id}),
        )?)
        .await?;
    assert_eq!(started.status(), StatusCode::OK);
    let body = json_body(started).await?;
    let secret = body
        .get("secret")
        .and_then(|v| v.as_str())
        .context("secret missing")?
        .to_string();
    assert!(
        body.get("provisioning_uri")
            .and_then(|v| v.as_str())
            .is_some_and(|uri| uri.starts_with("otpauth://totp/"))
    );

    // Wrong code: still pending, retry allowed.
    let refused = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/mfa/enroll/finish",
            &json!({"identity_id": id, "secret": secret, "code": "000000"}),
        )?)
        .await?;
    assert_eq!(refused.status(), StatusCode::UNAUTHORIZED);

    let code = current_code(&secret)?;
    let finished = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/mfa/enroll/finish",
            &json!({"identity_id": id, "secret": secret, "code": code}),
        )?)
        .await?;
    assert_eq!(finished.status(), StatusCode::OK);
    let body = json_body(finished).await?;
    let codes = body
        .get("backup_codes")
        .and_then(|v| v.as_array())
        .context("backup codes missing")?;
    assert_eq!(codes.len(), 10);

    // Login now requires a second step, completed with a backup code.
    let challenged = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/login",
            &json!({"email": "u1@x.com", "password": "correct"}),
        )?)
        .await?;
    let body = json_body(challenged).await?;
    assert_eq!(
        body.get("status").and_then(|v| v.as_str()),
        Some("mfa_required")
    );
    let pending = body
        .get("pending_identity_id")
        .and_then(|v| v.as_str())
        .context("pending id missing")?
        .to_string();

    let backup_code = codes[0].as_str().context("code is a string")?;
    let completed = app
        .oneshot(post_json(
            "/v1/auth/login/mfa",
            &json!({
                "pending_identity_id": pending,
                "code": backup_code,
                "is_backup_code": true,
            }),
        )?)
        .await?;
    assert_eq!(completed.status(), StatusCode::OK);
    let body = json_body(completed).await?;
    assert!(body.get("token").is_some());
    Ok(())
}

#[tokio::test]
async fn disable_route_requires_enrollment() -> Result<()> {
    let (store, app) = app();
    let id = store.seed_identity("u1@x.com", "correct")?;

    let response = app
        .oneshot(post_json(
            "/v1/auth/mfa/disable",
            &json!({"identity_id": id, "code": "123456"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn unknown_identity_enrollment_is_not_found() -> Result<()> {
    let (_store, app) = app();
    let response = app
        .oneshot(post_json(
            "/v1/auth/mfa/enroll/start",
            &json!({"identity_id": Uuid::new_v4()}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn backup_verify_route_consumes_on_success() -> Result<()> {
    let (store, app) = app();
    let id = store.seed_identity("u1@x.com", "correct")?;

    // Enroll over HTTP to obtain codes.
    let started = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/mfa/enroll/start",
            &json!({"identity_id": id}),
        )?)
        .await?;
    let body = json_body(started).await?;
    let secret = body
        .get("secret")
        .and_then(|v| v.as_str())
        .context("secret missing")?
        .to_string();
    let finished = app
        .clone()
        .oneshot(post_json(
            "/v1/auth/mfa/enroll/finish",
            &json!({"identity_id": id, "secret": secret, "code": current_code(&secret)?}),
        )?)
        .await?;
    let body = json_body(finished).await?;
    let code = body
        .get("backup_codes")
        .and_then(|v| v.as_array())
        .and_then(|codes| codes.first())
        .and_then(|v| v.as_str())
        .context("backup code missing")?
        .to_string();

    let verify = |code: String, app: Router| async move {
        let response = app
            .oneshot(post_json(
                "/v1/auth/mfa/backup-codes/verify",
                &json!({"identity_id": id, "code": code}),
            )?)
            .await?;
        json_body(response).await
    };

    let first = verify(code.clone(), app.clone()).await?;
    assert_eq!(first.get("valid").and_then(|v| v.as_bool()), Some(true));

    let second = verify(code, app).await?;
    assert_eq!(second.get("valid").and_then(|v| v.as_bool()), Some(false));
    Ok(())
}

/// Derive the current code from a base32 secret like an authenticator app.
fn current_code(secret_base32: &str) -> Result<String> {
    use std::time::{SystemTime, UNIX_EPOCH};
    use totp_rs::{Algorithm, Secret, TOTP};

    let secret = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|err| anyhow::anyhow!("secret decode error: {err:?}"))?;
    let totp = TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some("Twostep".to_string()),
        "test".to_string(),
    )
    .map_err(|err| anyhow::anyhow!("TOTP init error: {err}"))?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    Ok(totp.generate(now))
}
