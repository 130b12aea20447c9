//! Request and response bodies for the auth endpoints.

use super::principal::Principal;
use super::store::{AccountSummary, Profile};
use super::token::{Identity, Role};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub account_id: String,
    pub email: String,
    pub role: Role,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            account_id: identity.account_id.to_string(),
            email: identity.email.clone(),
            role: identity.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub display_name: Option<String>,
    pub program: Option<String>,
    pub cohort: Option<String>,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            program: profile.program.clone(),
            cohort: profile.cohort.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub account_id: String,
    pub email: String,
    pub role: Role,
    pub profile: Option<ProfileResponse>,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub account_id: String,
    pub email: String,
    pub role: Role,
    pub profile: Option<ProfileResponse>,
}

impl From<&Principal> for MeResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            account_id: principal.account_id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            profile: principal.profile.as_ref().map(ProfileResponse::from),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&AccountSummary> for AccountResponse {
    fn from(summary: &AccountSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            email: summary.email.clone(),
            role: summary.role,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevokedSessionsResponse {
    pub revoked: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn role_round_trips_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn identity_response_from_identity() {
        let identity = Identity {
            account_id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            role: Role::User,
        };
        let response = IdentityResponse::from(&identity);
        assert_eq!(response.account_id, identity.account_id.to_string());
        assert_eq!(response.email, "a@x.com");
    }

    #[test]
    fn login_request_deserializes() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"secret123"}"#).unwrap();
        assert_eq!(request.email, "a@x.com");
        assert_eq!(request.password, "secret123");
    }
}
