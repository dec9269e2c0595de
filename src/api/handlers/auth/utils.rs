//! Small helpers shared by the auth handlers.

use regex::Regex;

use crate::activity::ClientInfo;

/// Basic email format check before the store is consulted. Reveals nothing
/// about accounts; it only rejects input no account could have.
pub(super) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email.trim()))
}

/// Extract client metadata for activity records from common proxy headers.
pub(super) fn client_info(headers: &axum::http::HeaderMap) -> ClientInfo {
    ClientInfo {
        ip: extract_client_ip(headers),
        agent: headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    }
}

fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
