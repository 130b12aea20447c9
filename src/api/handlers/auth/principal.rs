//! Authenticated principal extraction and authorization helpers.
//!
//! Reads the access token from the `Authorization` header or the access
//! cookie and resolves it against the credential store. Role checks happen
//! against the stored role, never the token claim.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use uuid::Uuid;

use super::error::AuthError;
use super::state::AuthState;
use super::store::Profile;
use super::token::Role;

pub(crate) const ACCESS_COOKIE_NAME: &str = "lectoria_access";

/// Authenticated identity hydrated from the store on every request.
#[derive(Clone, Debug)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
    pub profile: Option<Profile>,
}

/// Resolve the request's access token into a principal.
///
/// # Errors
/// [`AuthError::Unauthenticated`] when no token is presented;
/// [`AuthError::InvalidToken`] when one is presented and fails.
pub async fn require_auth(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<Principal, AuthError> {
    let token = extract_access_token(headers).ok_or(AuthError::Unauthenticated)?;
    auth_state.service().authenticate(&token).await
}

/// Like [`require_auth`], but a missing token is an anonymous visitor
/// rather than a failure. A presented token that fails still errors.
///
/// # Errors
/// [`AuthError::InvalidToken`] when a token is presented and rejected.
pub async fn optional_auth(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<Option<Principal>, AuthError> {
    let Some(token) = extract_access_token(headers) else {
        return Ok(None);
    };
    auth_state.service().authenticate(&token).await.map(Some)
}

/// Require the principal to hold a role.
///
/// # Errors
/// [`AuthError::Forbidden`] when the role does not match.
pub fn require_role(principal: &Principal, role: Role) -> Result<(), AuthError> {
    if principal.role == role {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

pub(super) fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == ACCESS_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
