//! Login endpoints: the credentials step and the second-factor step.

pub(crate) mod mfa;
pub(crate) mod types;
pub(crate) mod utils;

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    activity::ActivitySink,
    error::AuthError,
    identity::IdentityStore,
    login::{LoginOutcome, LoginService},
    mfa::MfaService,
    token::TokenIssuer,
};

use self::types::{
    IdentityBody, LoginRequest, LoginResponse, MfaLoginRequest, MfaLoginResponse,
};
use self::utils::{client_info, valid_email};

/// Injected collaborators wired into the two service facades.
///
/// Construction takes the store, sink, and issuer explicitly so tests build a
/// fresh state over in-memory collaborators instead of sharing a singleton.
pub struct AuthState {
    login: LoginService,
    mfa: MfaService,
}

impl AuthState {
    #[must_use]
    pub fn new(
        store: Arc<dyn IdentityStore>,
        activity: Arc<dyn ActivitySink>,
        tokens: Arc<dyn TokenIssuer>,
        issuer: String,
    ) -> Self {
        let mfa = MfaService::new(Arc::clone(&store), Arc::clone(&activity), issuer);
        let login = LoginService::new(store, activity, tokens, mfa.clone());
        Self { login, mfa }
    }

    #[must_use]
    pub fn login(&self) -> &LoginService {
        &self.login
    }

    #[must_use]
    pub fn mfa(&self) -> &MfaService {
        &self.mfa
    }
}

/// Dummy schema anchor so error bodies show up in the OpenAPI document.
#[derive(ToSchema)]
#[allow(dead_code)]
pub(crate) struct ErrorMessage(String);

/// Submit email and password.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated or second factor required", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorMessage)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    // Anything that cannot be an account email gets the same answer as a
    // wrong password.
    if !valid_email(&request.email) {
        return AuthError::InvalidCredentials.into_response();
    }

    let client = client_info(&headers);
    match state
        .login()
        .submit_credentials(&request.email, &request.password, &client)
        .await
    {
        Ok(LoginOutcome::Authenticated(authenticated)) => (
            StatusCode::OK,
            Json(LoginResponse::Ok {
                token: authenticated.token,
                identity: IdentityBody::from(&authenticated.identity),
            }),
        )
            .into_response(),
        Ok(LoginOutcome::MfaRequired {
            pending_identity_id,
        }) => (
            StatusCode::OK,
            Json(LoginResponse::MfaRequired {
                pending_identity_id,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Complete a pending login with a one-time code or a backup code.
#[utoipa::path(
    post,
    path = "/v1/auth/login/mfa",
    request_body = MfaLoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = MfaLoginResponse),
        (status = 401, description = "Invalid code", body = ErrorMessage)
    ),
    tag = "auth"
)]
pub async fn mfa_login(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<MfaLoginRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let client = client_info(&headers);
    match state
        .login()
        .submit_second_factor(
            request.pending_identity_id,
            &request.code,
            request.is_backup_code,
            &client,
        )
        .await
    {
        Ok(authenticated) => (
            StatusCode::OK,
            Json(MfaLoginResponse {
                token: authenticated.token,
                identity: IdentityBody::from(&authenticated.identity),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
