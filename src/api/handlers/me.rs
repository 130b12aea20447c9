//! Authenticated self-service endpoint.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::principal::require_auth;
use super::auth::types::MeResponse;
use super::auth::AuthState;

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated identity and profile.", body = MeResponse),
        (status = 401, description = "Missing or invalid access token."),
    ),
    tag = "me"
)]
pub async fn get_me(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    match require_auth(&headers, &auth_state).await {
        Ok(principal) => (StatusCode::OK, Json(MeResponse::from(&principal))).into_response(),
        Err(err) => err.into_response(),
    }
}
