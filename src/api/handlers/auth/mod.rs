//! Session and credential lifecycle.
//!
//! This module coordinates password hashing, dual-token issuance, the
//! refresh token ledger, and role-gated authorization.
//!
//! ## Token model
//!
//! - Access tokens are short-lived JWTs verified statelessly on every
//!   request; the account is re-read so role and status stay current.
//! - Refresh tokens are long-lived JWTs whose liveness is governed by the
//!   ledger: one use rotates them, and revocation kills them before expiry.
//!
//! Only SHA-256 hashes of refresh tokens are stored. A database leak never
//! yields replayable tokens.

pub(crate) mod error;
pub(crate) mod ledger;
pub(crate) mod password;
pub(crate) mod principal;
pub(crate) mod service;
pub(crate) mod session;
mod state;
pub(crate) mod store;
pub(crate) mod token;
pub(crate) mod types;
mod utils;

pub use ledger::PostgresRefreshTokenLedger;
pub use password::PasswordService;
pub use service::SessionService;
pub use state::{AuthConfig, AuthState};
pub use store::PostgresCredentialStore;
pub use token::TokenCodec;
