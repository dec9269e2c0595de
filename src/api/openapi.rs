use super::handlers::{auth, health};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Generated OpenAPI document for the served routes.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the OpenAPI document.
///
/// New endpoints go through `.routes(routes!(...))` so they are served and
/// documented from the same `#[utoipa::path]` annotation.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Two-step login and session issuance".to_string());

    let mut mfa_tag = Tag::new("mfa");
    mfa_tag.description = Some("Enrollment, disablement, and backup codes".to_string());

    let mut openapi = cargo_openapi();
    openapi.tags = Some(vec![auth_tag, mfa_tag]);

    OpenApiRouter::with_openapi(openapi)
        .routes(routes!(health::health))
        .routes(routes!(auth::login))
        .routes(routes!(auth::mfa_login))
        .routes(routes!(auth::mfa::enroll_start))
        .routes(routes!(auth::mfa::enroll_finish))
        .routes(routes!(auth::mfa::disable))
        .routes(routes!(auth::mfa::backup_verify))
        .routes(routes!(auth::mfa::backup_regenerate))
}

/// Seed the document info from Cargo.toml metadata instead of the
/// utoipa-axum defaults.
fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    // Cargo authors are `;` separated "Name <email>" entries; take the first.
    if let Some(author) = env!("CARGO_PKG_AUTHORS").split(';').next() {
        let (name, email) = match author.split_once('<') {
            Some((name, email)) => (name.trim(), Some(email.trim_end_matches('>').trim())),
            None => (author.trim(), None),
        };
        if !name.is_empty() {
            let mut contact = Contact::new();
            contact.name = Some(name.to_string());
            contact.email = email.filter(|email| !email.is_empty()).map(str::to_string);
            info.contact = Some(contact);
        }
    }

    let license_id = env!("CARGO_PKG_LICENSE");
    if !license_id.is_empty() {
        let mut license = License::new(license_id);
        license.identifier = Some(license_id.to_string());
        info.license = Some(license);
    }

    OpenApiBuilder::new().info(info).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );
        assert_eq!(
            spec.info.contact.as_ref().and_then(|c| c.name.as_deref()),
            Some("Team Twostep")
        );
        assert_eq!(
            spec.info.license.as_ref().map(|l| l.name.as_str()),
            Some("BSD-3-Clause")
        );
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "mfa"));

        for path in [
            "/health",
            "/v1/auth/login",
            "/v1/auth/login/mfa",
            "/v1/auth/mfa/enroll/start",
            "/v1/auth/mfa/enroll/finish",
            "/v1/auth/mfa/disable",
            "/v1/auth/mfa/backup-codes/verify",
            "/v1/auth/mfa/backup-codes/regenerate",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path: {path}");
        }
    }
}
