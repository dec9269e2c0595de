//! MFA management endpoints: enrollment, disablement, backup codes.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use super::AuthState;
use super::types::{
    BackupCodeVerifyRequest, BackupCodeVerifyResponse, BackupCodesResponse, DisableMfaRequest,
    EnrollFinishRequest, EnrollStartRequest, EnrollStartResponse, RegenerateBackupCodesRequest,
};
use super::utils::client_info;

/// Begin enrollment: provision a candidate secret.
///
/// Nothing is persisted until the identity confirms a code, so calling this
/// repeatedly is harmless and cannot flip MFA on.
#[utoipa::path(
    post,
    path = "/v1/auth/mfa/enroll/start",
    request_body = EnrollStartRequest,
    responses(
        (status = 200, description = "Candidate secret provisioned", body = EnrollStartResponse),
        (status = 404, description = "Identity not found"),
        (status = 409, description = "MFA already enabled")
    ),
    tag = "mfa"
)]
pub async fn enroll_start(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<EnrollStartRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    match state.mfa().enroll_begin(request.identity_id).await {
        Ok(provisioned) => (
            StatusCode::OK,
            Json(EnrollStartResponse {
                secret: provisioned.secret_base32,
                provisioning_uri: provisioned.provisioning_uri,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Finish enrollment: prove possession of the authenticator, activate MFA,
/// and return the plaintext backup codes exactly once.
#[utoipa::path(
    post,
    path = "/v1/auth/mfa/enroll/finish",
    request_body = EnrollFinishRequest,
    responses(
        (status = 200, description = "MFA enabled; backup codes returned once", body = BackupCodesResponse),
        (status = 401, description = "Invalid code"),
        (status = 404, description = "Identity not found"),
        (status = 409, description = "MFA already enabled")
    ),
    tag = "mfa"
)]
pub async fn enroll_finish(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<EnrollFinishRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let client = client_info(&headers);
    match state
        .mfa()
        .enroll_confirm(request.identity_id, &request.secret, &request.code, &client)
        .await
    {
        Ok(backup_codes) => {
            (StatusCode::OK, Json(BackupCodesResponse { backup_codes })).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Disable MFA. Requires a valid current code.
#[utoipa::path(
    post,
    path = "/v1/auth/mfa/disable",
    request_body = DisableMfaRequest,
    responses(
        (status = 204, description = "MFA disabled"),
        (status = 401, description = "Invalid code"),
        (status = 404, description = "Identity not found"),
        (status = 409, description = "MFA not enabled")
    ),
    tag = "mfa"
)]
pub async fn disable(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<DisableMfaRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let client = client_info(&headers);
    match state
        .mfa()
        .disable(request.identity_id, &request.code, &client)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Administrative backup-code check. Consuming: a valid code is spent by the
/// act of checking it, the same as during login.
#[utoipa::path(
    post,
    path = "/v1/auth/mfa/backup-codes/verify",
    request_body = BackupCodeVerifyRequest,
    responses(
        (status = 200, description = "Validity of the submitted code", body = BackupCodeVerifyResponse)
    ),
    tag = "mfa"
)]
pub async fn backup_verify(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<BackupCodeVerifyRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    match state
        .mfa()
        .consume_backup_code(request.identity_id, &request.code)
        .await
    {
        Ok(valid) => (StatusCode::OK, Json(BackupCodeVerifyResponse { valid })).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Replace the backup-code set with a fresh batch.
#[utoipa::path(
    post,
    path = "/v1/auth/mfa/backup-codes/regenerate",
    request_body = RegenerateBackupCodesRequest,
    responses(
        (status = 200, description = "Fresh backup codes returned once", body = BackupCodesResponse),
        (status = 401, description = "Invalid code"),
        (status = 404, description = "Identity not found"),
        (status = 409, description = "MFA not enabled")
    ),
    tag = "mfa"
)]
pub async fn backup_regenerate(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegenerateBackupCodesRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    match state
        .mfa()
        .regenerate_backup_codes(request.identity_id, &request.code)
        .await
    {
        Ok(backup_codes) => {
            (StatusCode::OK, Json(BackupCodesResponse { backup_codes })).into_response()
        }
        Err(err) => err.into_response(),
    }
}
