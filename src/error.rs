//! Error taxonomy for the authentication surface.
//!
//! Wrong-email, wrong-password, and factor failures against a since-disabled
//! identity all collapse into `InvalidCredentials`/`InvalidCode` so that the
//! externally visible message never reveals which check failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid code")]
    InvalidCode,

    #[error("identity not found")]
    IdentityNotFound,

    #[error("multi-factor authentication is not enabled")]
    MfaNotEnabled,

    #[error("multi-factor authentication is already enabled")]
    AlreadyEnabled,

    /// Collaborator failure (identity store, token issuer). Fatal to the call.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
            }
            Self::InvalidCode => (StatusCode::UNAUTHORIZED, "Invalid code").into_response(),
            Self::IdentityNotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            Self::MfaNotEnabled => (
                StatusCode::CONFLICT,
                "Multi-factor authentication is not enabled",
            )
                .into_response(),
            Self::AlreadyEnabled => (
                StatusCode::CONFLICT,
                "Multi-factor authentication is already enabled",
            )
                .into_response(),
            Self::Store(err) => {
                error!("Store error: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
