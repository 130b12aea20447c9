//! Administrative account management, gated on the admin role.
//!
//! The role check runs against the stored role on every request, so a
//! demoted admin loses access immediately regardless of token claims.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthState;
use super::auth::error::AuthError;
use super::auth::principal::{require_auth, require_role};
use super::auth::token::Role;
use super::auth::types::{AccountResponse, RevokedSessionsResponse, RoleUpdateRequest};

async fn require_admin(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<super::auth::principal::Principal, AuthError> {
    let principal = require_auth(headers, auth_state).await?;
    require_role(&principal, Role::Admin)?;
    Ok(principal)
}

#[utoipa::path(
    get,
    path = "/v1/admin/accounts",
    responses(
        (status = 200, description = "All accounts", body = [AccountResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    ),
    tag = "admin"
)]
pub async fn list_accounts(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Err(err) = require_admin(&headers, &auth_state).await {
        return err.into_response();
    }
    match auth_state.service().list_accounts().await {
        Ok(accounts) => {
            let body: Vec<AccountResponse> = accounts.iter().map(AccountResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/admin/accounts/{id}/role",
    request_body = RoleUpdateRequest,
    params(
        ("id" = String, Path, description = "Account id")
    ),
    responses(
        (status = 204, description = "Role updated"),
        (status = 400, description = "Malformed id or payload"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "No such account")
    ),
    tag = "admin"
)]
pub async fn set_role(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<String>,
    payload: Option<Json<RoleUpdateRequest>>,
) -> impl IntoResponse {
    if let Err(err) = require_admin(&headers, &auth_state).await {
        return err.into_response();
    }
    let Ok(account_id) = Uuid::parse_str(&id) else {
        return AuthError::InvalidRequest("Malformed account id").into_response();
    };
    let Some(Json(request)) = payload else {
        return AuthError::InvalidRequest("Missing payload").into_response();
    };
    match auth_state.service().set_role(account_id, request.role).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "No such account").into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/admin/accounts/{id}/revoke-sessions",
    params(
        ("id" = String, Path, description = "Account id")
    ),
    responses(
        (status = 200, description = "Sessions revoked", body = RevokedSessionsResponse),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    ),
    tag = "admin"
)]
pub async fn revoke_sessions(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if let Err(err) = require_admin(&headers, &auth_state).await {
        return err.into_response();
    }
    let Ok(account_id) = Uuid::parse_str(&id) else {
        return AuthError::InvalidRequest("Malformed account id").into_response();
    };
    match auth_state.service().sign_out_all(account_id).await {
        Ok(revoked) => {
            (StatusCode::OK, Json(RevokedSessionsResponse { revoked })).into_response()
        }
        Err(err) => err.into_response(),
    }
}
