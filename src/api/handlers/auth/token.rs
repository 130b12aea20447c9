//! JWT minting and verification for the dual-token model.
//!
//! Access and refresh tokens are signed with separate secrets and carry a
//! `class` claim. A token presented at the wrong checkpoint fails closed:
//! verification never reveals whether the signature, expiry, or class was
//! at fault.

use super::state::AuthConfig;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Which checkpoint a token is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

/// The identity a token is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    role: Role,
    class: TokenClass,
    iat: i64,
    exp: i64,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signature, expiry, class, or subject checks failed. Deliberately opaque.
    #[error("invalid token")]
    Invalid,

    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies both token classes with their separate secrets.
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let access_secret = config.access_secret().expose_secret().as_bytes();
        let refresh_secret = config.refresh_secret().expose_secret().as_bytes();
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            access_ttl_seconds: config.access_ttl_seconds(),
            refresh_ttl_seconds: config.refresh_ttl_seconds(),
        }
    }

    #[must_use]
    pub const fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    /// Mint a short-lived access token.
    ///
    /// # Errors
    /// Returns [`TokenError::Signing`] if encoding fails.
    pub fn sign_access(&self, identity: &Identity) -> Result<String, TokenError> {
        self.sign(
            identity,
            TokenClass::Access,
            self.access_ttl_seconds,
            &self.access_encoding,
        )
    }

    /// Mint a refresh token. The caller records its hash in the ledger.
    ///
    /// # Errors
    /// Returns [`TokenError::Signing`] if encoding fails.
    pub fn sign_refresh(&self, identity: &Identity) -> Result<String, TokenError> {
        self.sign(
            identity,
            TokenClass::Refresh,
            self.refresh_ttl_seconds,
            &self.refresh_encoding,
        )
    }

    fn sign(
        &self,
        identity: &Identity,
        class: TokenClass,
        ttl_seconds: i64,
        key: &EncodingKey,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.account_id.to_string(),
            email: identity.email.clone(),
            role: identity.role,
            class,
            iat: now,
            exp: now + ttl_seconds,
        };
        encode(&Header::default(), &claims, key).map_err(TokenError::Signing)
    }

    /// Verify an access token.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] on any verification failure.
    pub fn verify_access(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify(token, TokenClass::Access, &self.access_decoding)
    }

    /// Verify a refresh token's signature and claims.
    ///
    /// Ledger state is checked separately; a token passing here may still be
    /// revoked or already rotated.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] on any verification failure.
    pub fn verify_refresh(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify(token, TokenClass::Refresh, &self.refresh_decoding)
    }

    fn verify(
        &self,
        token: &str,
        expected_class: TokenClass,
        key: &DecodingKey,
    ) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, key, &validation).map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        if claims.class != expected_class {
            return Err(TokenError::Invalid);
        }

        let account_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::Invalid)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Invalid)?;

        Ok(VerifiedToken {
            account_id,
            email: claims.email,
            role: claims.role,
            expires_at,
        })
    }
}
