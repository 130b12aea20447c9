//! Session endpoints: register, login, refresh, logout, password change.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use std::sync::Arc;

use super::{
    error::AuthError,
    principal::{ACCESS_COOKIE_NAME, optional_auth, require_auth},
    state::{AuthConfig, AuthState},
    types::{
        IdentityResponse, LoginRequest, LoginResponse, LogoutRequest, MeResponse,
        PasswordChangeRequest, ProfileResponse, RefreshRequest, RefreshResponse, RegisterRequest,
        RevokedSessionsResponse,
    },
};

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = MeResponse),
        (status = 204, description = "No session presented"),
        (status = 401, description = "Presented token is invalid")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Anonymous visitors get 204; only a presented-but-bad token is an error.
    match optional_auth(&headers, &auth_state).await {
        Ok(Some(principal)) => {
            (StatusCode::OK, Json(MeResponse::from(&principal))).into_response()
        }
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = IdentityResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Account already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::InvalidRequest("Missing payload").into_response();
    };
    match auth_state
        .service()
        .register(&request.email, &request.password)
        .await
    {
        Ok(identity) => {
            (StatusCode::CREATED, Json(IdentityResponse::from(&identity))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::InvalidRequest("Missing payload").into_response();
    };
    match auth_state
        .service()
        .sign_in(&request.email, &request.password)
        .await
    {
        Ok(signed_in) => {
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = access_cookie(&auth_state, &signed_in.tokens.access_token) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            let response = LoginResponse {
                account_id: signed_in.identity.account_id.to_string(),
                email: signed_in.identity.email,
                role: signed_in.identity.role,
                profile: signed_in.profile.as_ref().map(ProfileResponse::from),
                access_token: signed_in.tokens.access_token,
                refresh_token: signed_in.tokens.refresh_token,
            };
            (StatusCode::OK, response_headers, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = RefreshResponse),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Invalid token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::InvalidRequest("Missing payload").into_response();
    };
    match auth_state.service().refresh(&request.refresh_token).await {
        Ok(tokens) => {
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = access_cookie(&auth_state, &tokens.access_token) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            let response = RefreshResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            };
            (StatusCode::OK, response_headers, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LogoutRequest>>,
) -> impl IntoResponse {
    if let Some(Json(request)) = payload {
        auth_state.service().sign_out(&request.refresh_token).await;
    }

    // Always clear the cookie, even when no token was presented.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_access_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout-all",
    responses(
        (status = 200, description = "All sessions revoked", body = RevokedSessionsResponse),
        (status = 401, description = "Not authenticated")
    ),
    tag = "auth"
)]
pub async fn logout_all(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    match auth_state.service().sign_out_all(principal.account_id).await {
        Ok(revoked) => {
            let mut response_headers = HeaderMap::new();
            if let Ok(cookie) = clear_access_cookie(auth_state.config()) {
                response_headers.insert(SET_COOKIE, cookie);
            }
            (
                StatusCode::OK,
                response_headers,
                Json(RevokedSessionsResponse { revoked }),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed, all sessions revoked"),
        (status = 400, description = "Invalid new password"),
        (status = 401, description = "Not authenticated or wrong current password")
    ),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<PasswordChangeRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };
    let Some(Json(request)) = payload else {
        return AuthError::InvalidRequest("Missing payload").into_response();
    };
    match auth_state
        .service()
        .change_password(
            principal.account_id,
            &request.current_password,
            &request.new_password,
        )
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Build a secure `HttpOnly` cookie carrying the access token.
pub(super) fn access_cookie(
    auth_state: &AuthState,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = auth_state.config().access_ttl_seconds();
    // Only mark cookies secure when the frontend is served over HTTPS.
    let secure = auth_state.config().cookie_secure();
    let mut cookie = format!(
        "{ACCESS_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_access_cookie(auth_config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = auth_config.cookie_secure();
    let mut cookie = format!("{ACCESS_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
