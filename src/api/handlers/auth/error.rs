//! Error taxonomy for the session and credential lifecycle.
//!
//! Credential failures collapse into a single opaque response so that the
//! HTTP surface never distinguishes an unknown email from a wrong password.

use super::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown account or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token failed signature, expiry, class, or ledger checks.
    #[error("invalid token")]
    InvalidToken,

    /// No credentials were presented at all.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated but lacking the required role.
    #[error("not permitted")]
    Forbidden,

    /// An account with this email already exists.
    #[error("account already exists")]
    DuplicateAccount,

    /// The request payload failed validation.
    #[error("{0}")]
    InvalidRequest(&'static str),

    /// The backing store could not be reached.
    #[error("store unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// Unexpected internal failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::DuplicateAccount,
            other => Self::StoreUnavailable(other),
        }
    }
}

impl AuthError {
    /// Map the error to the status and body sent over the wire.
    #[must_use]
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Not permitted"),
            Self::DuplicateAccount => (StatusCode::CONFLICT, "Account already exists"),
            Self::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::StoreUnavailable(err) => {
                error!(error = %err, "store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service unavailable, try again",
                )
            }
            Self::Internal(err) => {
                error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, message).into_response()
    }
}
