//! Request/response types for auth endpoints.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::identity::Identity;

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

/// Public view of an identity. The password hash never leaves the store layer.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IdentityBody {
    pub id: Uuid,
    pub email: String,
}

impl From<&Identity> for IdentityBody {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Ok {
        token: String,
        identity: IdentityBody,
    },
    MfaRequired {
        pending_identity_id: Uuid,
    },
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct MfaLoginRequest {
    pub pending_identity_id: Uuid,
    pub code: String,
    #[serde(default)]
    pub is_backup_code: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MfaLoginResponse {
    pub token: String,
    pub identity: IdentityBody,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct EnrollStartRequest {
    pub identity_id: Uuid,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EnrollStartResponse {
    pub secret: String,
    pub provisioning_uri: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct EnrollFinishRequest {
    pub identity_id: Uuid,
    pub secret: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BackupCodesResponse {
    pub backup_codes: Vec<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct DisableMfaRequest {
    pub identity_id: Uuid,
    pub code: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct BackupCodeVerifyRequest {
    pub identity_id: Uuid,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct BackupCodeVerifyResponse {
    pub valid: bool,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegenerateBackupCodesRequest {
    pub identity_id: Uuid,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use secrecy::ExposeSecret;

    #[test]
    fn login_request_deserializes_with_secret_password() -> Result<()> {
        let request: LoginRequest = serde_json::from_value(serde_json::json!({
            "email": "alice@example.com",
            "password": "hunter2",
        }))?;
        assert_eq!(request.email, "alice@example.com");
        assert_eq!(request.password.expose_secret(), "hunter2");
        Ok(())
    }

    #[test]
    fn login_response_is_status_tagged() -> Result<()> {
        let response = LoginResponse::MfaRequired {
            pending_identity_id: Uuid::nil(),
        };
        let value = serde_json::to_value(&response)?;
        let status = value
            .get("status")
            .and_then(serde_json::Value::as_str)
            .context("missing status")?;
        assert_eq!(status, "mfa_required");
        assert!(value.get("pending_identity_id").is_some());
        Ok(())
    }

    #[test]
    fn mfa_login_request_defaults_to_totp() -> Result<()> {
        let request: MfaLoginRequest = serde_json::from_value(serde_json::json!({
            "pending_identity_id": Uuid::nil(),
            "code": "123456",
        }))?;
        assert!(!request.is_backup_code);
        Ok(())
    }

    #[test]
    fn backup_codes_response_round_trips() -> Result<()> {
        let response = BackupCodesResponse {
            backup_codes: vec!["A1B2-C3D4".to_string()],
        };
        let value = serde_json::to_value(&response)?;
        let decoded: BackupCodesResponse = serde_json::from_value(value)?;
        assert_eq!(decoded.backup_codes.len(), 1);
        Ok(())
    }
}
