//! Session lifecycle orchestration.
//!
//! Every operation composes the credential store, the refresh token ledger,
//! the password service, and the token codec. Handlers stay thin; all
//! security-relevant sequencing lives here.

use super::error::AuthError;
use super::ledger::RefreshTokenLedger;
use super::password::PasswordService;
use super::principal::Principal;
use super::store::{AccountSummary, CredentialStore, NewAccount, Profile};
use super::token::{Identity, Role, TokenCodec, TokenError};
use super::utils::{hash_refresh_token, normalize_email, valid_email};
use anyhow::Context;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Fixed input hashed once at startup. Sign-in verifies against this hash
/// when the account does not exist, so both outcomes cost one Argon2 pass.
const DUMMY_PASSWORD: &str = "lectoria-timing-equalizer";

/// Both tokens minted for a session.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    pub identity: Identity,
    pub profile: Option<Profile>,
    pub tokens: TokenPair,
}

pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    ledger: Arc<dyn RefreshTokenLedger>,
    codec: TokenCodec,
    hasher: PasswordService,
    dummy_hash: String,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::InvalidToken,
            TokenError::Signing(err) => Self::Internal(anyhow::Error::new(err)),
        }
    }
}

impl SessionService {
    /// Build the service, precomputing the dummy hash for absent accounts.
    ///
    /// # Errors
    /// Returns an error if the dummy hash cannot be computed.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        ledger: Arc<dyn RefreshTokenLedger>,
        codec: TokenCodec,
        hasher: PasswordService,
    ) -> anyhow::Result<Self> {
        let dummy_hash = hasher
            .hash(DUMMY_PASSWORD)
            .context("failed to precompute dummy password hash")?;
        Ok(Self {
            store,
            ledger,
            codec,
            hasher,
            dummy_hash,
        })
    }

    /// Create a new account with the default role.
    ///
    /// # Errors
    /// Rejects malformed emails, short passwords, and duplicate accounts.
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email_normalized = normalize_email(email);
        if !valid_email(&email_normalized) {
            return Err(AuthError::InvalidRequest("Invalid email address"));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidRequest(
                "Password must be at least 8 characters",
            ));
        }

        let password_hash = self
            .hasher
            .hash(password)
            .context("failed to hash password")?;
        let account = self
            .store
            .create_account(&NewAccount {
                email: email.trim().to_string(),
                email_normalized,
                password_hash,
                role: Role::User,
            })
            .await?;

        Ok(Identity {
            account_id: account.id,
            email: account.email,
            role: account.role,
        })
    }

    /// Verify credentials and mint a token pair.
    ///
    /// # Errors
    /// Unknown email and wrong password both return
    /// [`AuthError::InvalidCredentials`]; the absent-account path still runs
    /// one password verification against the dummy hash.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email_normalized = normalize_email(email);
        let account = self.store.find_by_email(&email_normalized).await?;

        let Some(account) = account else {
            let _ = self.hasher.verify(password, &self.dummy_hash);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            account_id: account.id,
            email: account.email,
            role: account.role,
        };
        let tokens = self.issue_pair(&identity).await?;
        let profile = self.best_effort_profile(identity.account_id).await;

        Ok(SignedIn {
            identity,
            profile,
            tokens,
        })
    }

    /// Rotate a refresh token, returning a fresh pair.
    ///
    /// The account is re-read so revoked accounts and stale role claims die
    /// here rather than riding the old token to expiry.
    ///
    /// # Errors
    /// Any failure along the way collapses to [`AuthError::InvalidToken`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let verified = self
            .codec
            .verify_refresh(refresh_token)
            .map_err(|_| AuthError::InvalidToken)?;

        // Cheap ledger probe first; the rotation below re-checks under the
        // claim so a concurrent winner still invalidates this path.
        let old_hash = hash_refresh_token(refresh_token);
        if self.ledger.lookup_active(&old_hash).await?.is_none() {
            return Err(AuthError::InvalidToken);
        }

        let account = self
            .store
            .find_by_id(verified.account_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let identity = Identity {
            account_id: account.id,
            email: account.email,
            role: account.role,
        };
        let access_token = self.codec.sign_access(&identity)?;
        let new_refresh_token = self.codec.sign_refresh(&identity)?;

        let rotated = self
            .ledger
            .rotate(
                &old_hash,
                identity.account_id,
                &hash_refresh_token(&new_refresh_token),
                self.codec.refresh_ttl_seconds(),
            )
            .await?;

        if !rotated {
            return Err(AuthError::InvalidToken);
        }

        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh_token,
        })
    }

    /// Revoke one refresh token. Always succeeds from the caller's view;
    /// unknown or garbage tokens are a no-op.
    pub async fn sign_out(&self, refresh_token: &str) {
        if let Err(err) = self.ledger.revoke(&hash_refresh_token(refresh_token)).await {
            error!(error = %err, "failed to revoke refresh token");
        }
    }

    /// Revoke every refresh token for an account.
    ///
    /// # Errors
    /// Returns an error if the ledger is unreachable.
    pub async fn sign_out_all(&self, account_id: Uuid) -> Result<u64, AuthError> {
        Ok(self.ledger.revoke_all(account_id).await?)
    }

    /// Replace the password after verifying the current one, then revoke all
    /// outstanding refresh tokens for the account.
    ///
    /// # Errors
    /// Wrong current password returns [`AuthError::InvalidCredentials`].
    pub async fn change_password(
        &self,
        account_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !self.hasher.verify(current_password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidRequest(
                "Password must be at least 8 characters",
            ));
        }

        let password_hash = self
            .hasher
            .hash(new_password)
            .context("failed to hash new password")?;
        let updated = self.store.update_password(account_id, &password_hash).await?;
        if !updated {
            return Err(AuthError::Unauthenticated);
        }

        self.ledger.revoke_all(account_id).await?;
        Ok(())
    }

    /// Resolve an access token to a live principal.
    ///
    /// Role and status come from the store, not the token, so a demoted or
    /// disabled account is cut off at the next request.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidToken`] for any dead token or account.
    pub async fn authenticate(&self, access_token: &str) -> Result<Principal, AuthError> {
        let verified = self
            .codec
            .verify_access(access_token)
            .map_err(|_| AuthError::InvalidToken)?;

        let account = self
            .store
            .find_by_id(verified.account_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let profile = self.best_effort_profile(account.id).await;

        Ok(Principal {
            account_id: account.id,
            email: account.email,
            role: account.role,
            profile,
        })
    }

    /// List every account for the admin surface.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AuthError> {
        Ok(self.store.list_accounts().await?)
    }

    /// Change an account's role. Returns false when the account is gone.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    pub async fn set_role(&self, account_id: Uuid, role: Role) -> Result<bool, AuthError> {
        Ok(self.store.set_role(account_id, role).await?)
    }

    async fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let access_token = self.codec.sign_access(identity)?;
        let refresh_token = self.codec.sign_refresh(identity)?;

        self.ledger
            .record(
                identity.account_id,
                &hash_refresh_token(&refresh_token),
                self.codec.refresh_ttl_seconds(),
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Profiles enrich the identity but never block it.
    async fn best_effort_profile(&self, account_id: Uuid) -> Option<Profile> {
        match self.store.load_profile(account_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "failed to load profile");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::ledger::RefreshTokenRecord;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::api::handlers::auth::store::{Account, AccountSummary, StoreError};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use secrecy::SecretString;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        accounts: Mutex<HashMap<Uuid, Account>>,
        profiles: Mutex<HashMap<Uuid, Profile>>,
    }

    impl MemoryStore {
        fn seed(&self, account: Account) {
            self.accounts
                .lock()
                .unwrap()
                .insert(account.id, account);
        }

        fn remove(&self, account_id: Uuid) {
            self.accounts.lock().unwrap().remove(&account_id);
        }

        fn seed_profile(&self, account_id: Uuid, profile: Profile) {
            self.profiles.lock().unwrap().insert(account_id, profile);
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn create_account(&self, new_account: &NewAccount) -> Result<Account, StoreError> {
            let mut accounts = self.accounts.lock().unwrap();
            let duplicate = accounts.values().any(|account| {
                normalize_email(&account.email) == new_account.email_normalized
            });
            if duplicate {
                return Err(StoreError::Duplicate);
            }
            let account = Account {
                id: Uuid::new_v4(),
                email: new_account.email.clone(),
                password_hash: new_account.password_hash.clone(),
                role: new_account.role,
            };
            accounts.insert(account.id, account.clone());
            Ok(account)
        }

        async fn find_by_email(
            &self,
            email_normalized: &str,
        ) -> Result<Option<Account>, StoreError> {
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .values()
                .find(|account| normalize_email(&account.email) == email_normalized)
                .cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
            Ok(self.accounts.lock().unwrap().get(&id).cloned())
        }

        async fn load_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError> {
            Ok(self.profiles.lock().unwrap().get(&account_id).cloned())
        }

        async fn update_password(
            &self,
            id: Uuid,
            password_hash: &str,
        ) -> Result<bool, StoreError> {
            let mut accounts = self.accounts.lock().unwrap();
            match accounts.get_mut(&id) {
                Some(account) => {
                    account.password_hash = password_hash.to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn set_role(&self, id: Uuid, role: Role) -> Result<bool, StoreError> {
            let mut accounts = self.accounts.lock().unwrap();
            match accounts.get_mut(&id) {
                Some(account) => {
                    account.role = role;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn list_accounts(&self) -> Result<Vec<AccountSummary>, StoreError> {
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .values()
                .map(|account| AccountSummary {
                    id: account.id,
                    email: account.email.clone(),
                    role: account.role,
                    created_at: Utc::now(),
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct MemoryLedger {
        records: Mutex<HashMap<Vec<u8>, RefreshTokenRecord>>,
    }

    impl MemoryLedger {
        fn expire(&self, token_hash: &[u8]) {
            if let Some(record) = self.records.lock().unwrap().get_mut(token_hash) {
                record.expires_at = Utc::now() - Duration::seconds(1);
            }
        }

        fn live_count(&self, account_id: Uuid) -> usize {
            let now = Utc::now();
            self.records
                .lock()
                .unwrap()
                .values()
                .filter(|record| record.account_id == account_id && record.is_active(now))
                .count()
        }
    }

    #[async_trait]
    impl RefreshTokenLedger for MemoryLedger {
        async fn record(
            &self,
            account_id: Uuid,
            token_hash: &[u8],
            ttl_seconds: i64,
        ) -> Result<(), StoreError> {
            let now = Utc::now();
            self.records.lock().unwrap().insert(
                token_hash.to_vec(),
                RefreshTokenRecord {
                    account_id,
                    issued_at: now,
                    expires_at: now + Duration::seconds(ttl_seconds),
                    revoked: false,
                },
            );
            Ok(())
        }

        async fn lookup_active(
            &self,
            token_hash: &[u8],
        ) -> Result<Option<RefreshTokenRecord>, StoreError> {
            let now = Utc::now();
            Ok(self
                .records
                .lock()
                .unwrap()
                .get(token_hash)
                .filter(|record| record.is_active(now))
                .cloned())
        }

        async fn rotate(
            &self,
            old_hash: &[u8],
            account_id: Uuid,
            new_hash: &[u8],
            ttl_seconds: i64,
        ) -> Result<bool, StoreError> {
            // Single lock held across claim and insert mirrors the
            // transactional claim in the Postgres ledger.
            let mut records = self.records.lock().unwrap();
            let now = Utc::now();
            let claimed = match records.get_mut(old_hash) {
                Some(record)
                    if record.account_id == account_id && record.is_active(now) =>
                {
                    record.revoked = true;
                    true
                }
                _ => false,
            };
            if !claimed {
                return Ok(false);
            }
            records.insert(
                new_hash.to_vec(),
                RefreshTokenRecord {
                    account_id,
                    issued_at: now,
                    expires_at: now + Duration::seconds(ttl_seconds),
                    revoked: false,
                },
            );
            Ok(true)
        }

        async fn revoke(&self, token_hash: &[u8]) -> Result<(), StoreError> {
            if let Some(record) = self.records.lock().unwrap().get_mut(token_hash) {
                record.revoked = true;
            }
            Ok(())
        }

        async fn revoke_all(&self, account_id: Uuid) -> Result<u64, StoreError> {
            let mut revoked = 0;
            for record in self.records.lock().unwrap().values_mut() {
                if record.account_id == account_id && !record.revoked {
                    record.revoked = true;
                    revoked += 1;
                }
            }
            Ok(revoked)
        }
    }

    struct Fixture {
        service: SessionService,
        store: Arc<MemoryStore>,
        ledger: Arc<MemoryLedger>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let ledger = Arc::new(MemoryLedger::default());
        let config = AuthConfig::new(
            SecretString::from("access-test-secret"),
            SecretString::from("refresh-test-secret"),
        );
        let service = SessionService::new(
            store.clone(),
            ledger.clone(),
            TokenCodec::new(&config),
            PasswordService,
        )
        .expect("service should build");
        Fixture {
            service,
            store,
            ledger,
        }
    }

    fn seed_admin(fixture: &Fixture, email: &str, password: &str) -> Uuid {
        let hash = PasswordService.hash(password).expect("hash should succeed");
        let id = Uuid::new_v4();
        fixture.store.seed(Account {
            id,
            email: email.to_string(),
            password_hash: hash,
            role: Role::Admin,
        });
        id
    }

    #[tokio::test]
    async fn register_then_sign_in_claims_match() {
        let fx = fixture();
        let identity = fx
            .service
            .register("Student@Example.com", "secret123")
            .await
            .expect("register should succeed");
        assert_eq!(identity.role, Role::User);

        let signed_in = fx
            .service
            .sign_in("student@example.com", "secret123")
            .await
            .expect("sign in should succeed");
        assert_eq!(signed_in.identity.account_id, identity.account_id);

        let principal = fx
            .service
            .authenticate(&signed_in.tokens.access_token)
            .await
            .expect("authenticate should succeed");
        assert_eq!(principal.account_id, identity.account_id);
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn register_rejects_invalid_email_and_short_password() {
        let fx = fixture();
        let err = fx
            .service
            .register("not-an-email", "secret123")
            .await
            .expect_err("should reject");
        assert_eq!(err.status_and_message().0, StatusCode::BAD_REQUEST);

        let err = fx
            .service
            .register("a@x.com", "short")
            .await
            .expect_err("should reject");
        assert_eq!(err.status_and_message().0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_register_conflicts() {
        let fx = fixture();
        fx.service
            .register("a@x.com", "secret123")
            .await
            .expect("first register should succeed");
        let err = fx
            .service
            .register(" A@X.COM ", "secret456")
            .await
            .expect_err("duplicate should fail");
        assert_eq!(err.status_and_message().0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_identical() {
        let fx = fixture();
        fx.service
            .register("a@x.com", "secret123")
            .await
            .expect("register should succeed");

        let absent = fx
            .service
            .sign_in("nobody@x.com", "secret123")
            .await
            .expect_err("unknown email should fail");
        let mismatch = fx
            .service
            .sign_in("a@x.com", "wrong-password")
            .await
            .expect_err("wrong password should fail");

        assert_eq!(absent.status_and_message(), mismatch.status_and_message());
        assert_eq!(
            absent.status_and_message(),
            (StatusCode::UNAUTHORIZED, "Invalid credentials")
        );
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_replay() {
        let fx = fixture();
        seed_admin(&fx, "a@x.com", "secret123");

        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");
        assert_eq!(signed_in.identity.role, Role::Admin);
        assert_ne!(
            signed_in.tokens.access_token,
            signed_in.tokens.refresh_token
        );

        let rotated = fx
            .service
            .refresh(&signed_in.tokens.refresh_token)
            .await
            .expect("refresh should succeed");
        assert_ne!(rotated.refresh_token, signed_in.tokens.refresh_token);

        let replay = fx
            .service
            .refresh(&signed_in.tokens.refresh_token)
            .await
            .expect_err("replay should fail");
        assert_eq!(replay.status_and_message().0, StatusCode::UNAUTHORIZED);

        fx.service
            .refresh(&rotated.refresh_token)
            .await
            .expect("successor should remain valid");
    }

    #[tokio::test]
    async fn concurrent_refresh_has_exactly_one_winner() {
        let fx = fixture();
        seed_admin(&fx, "a@x.com", "secret123");
        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");

        let token = signed_in.tokens.refresh_token;
        let (first, second) = tokio::join!(fx.service.refresh(&token), fx.service.refresh(&token));

        let winners = usize::from(first.is_ok()) + usize::from(second.is_ok());
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn sign_out_kills_refresh_and_is_idempotent() {
        let fx = fixture();
        seed_admin(&fx, "a@x.com", "secret123");
        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");

        fx.service.sign_out(&signed_in.tokens.refresh_token).await;
        fx.service.sign_out(&signed_in.tokens.refresh_token).await;
        fx.service.sign_out("garbage-token").await;

        let err = fx
            .service
            .refresh(&signed_in.tokens.refresh_token)
            .await
            .expect_err("refresh after sign out should fail");
        assert_eq!(err.status_and_message().0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_out_all_revokes_every_session() {
        let fx = fixture();
        let account_id = seed_admin(&fx, "a@x.com", "secret123");

        let first = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");
        let second = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("second sign in should succeed");
        assert_eq!(fx.ledger.live_count(account_id), 2);

        let revoked = fx
            .service
            .sign_out_all(account_id)
            .await
            .expect("sign out all should succeed");
        assert_eq!(revoked, 2);

        assert!(fx.service.refresh(&first.tokens.refresh_token).await.is_err());
        assert!(fx.service.refresh(&second.tokens.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn expired_ledger_entry_rejects_refresh() {
        let fx = fixture();
        seed_admin(&fx, "a@x.com", "secret123");
        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");

        fx.ledger
            .expire(&hash_refresh_token(&signed_in.tokens.refresh_token));

        let err = fx
            .service
            .refresh(&signed_in.tokens.refresh_token)
            .await
            .expect_err("expired token should fail");
        assert_eq!(err.status_and_message().0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn change_password_revokes_sessions_and_swaps_credential() {
        let fx = fixture();
        let account_id = seed_admin(&fx, "a@x.com", "secret123");
        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");

        let err = fx
            .service
            .change_password(account_id, "wrong", "new-secret-456")
            .await
            .expect_err("wrong current password should fail");
        assert_eq!(err.status_and_message().0, StatusCode::UNAUTHORIZED);

        fx.service
            .change_password(account_id, "secret123", "new-secret-456")
            .await
            .expect("change password should succeed");

        assert!(fx
            .service
            .refresh(&signed_in.tokens.refresh_token)
            .await
            .is_err());
        assert!(fx.service.sign_in("a@x.com", "secret123").await.is_err());
        fx.service
            .sign_in("a@x.com", "new-secret-456")
            .await
            .expect("new password should sign in");
    }

    #[tokio::test]
    async fn authenticate_reads_current_role() {
        let fx = fixture();
        let identity = fx
            .service
            .register("a@x.com", "secret123")
            .await
            .expect("register should succeed");
        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");

        let principal = fx
            .service
            .authenticate(&signed_in.tokens.access_token)
            .await
            .expect("authenticate should succeed");
        assert_eq!(principal.role, Role::User);

        let updated = fx
            .service
            .set_role(identity.account_id, Role::Admin)
            .await
            .expect("set role should succeed");
        assert!(updated);

        let principal = fx
            .service
            .authenticate(&signed_in.tokens.access_token)
            .await
            .expect("authenticate should succeed");
        assert_eq!(principal.role, Role::Admin);
    }

    #[tokio::test]
    async fn removed_account_invalidates_live_tokens() {
        let fx = fixture();
        let account_id = seed_admin(&fx, "a@x.com", "secret123");
        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");

        fx.store.remove(account_id);

        assert!(fx
            .service
            .authenticate(&signed_in.tokens.access_token)
            .await
            .is_err());
        assert!(fx
            .service
            .refresh(&signed_in.tokens.refresh_token)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn profile_attached_when_present() {
        let fx = fixture();
        let account_id = seed_admin(&fx, "a@x.com", "secret123");
        fx.store.seed_profile(
            account_id,
            Profile {
                display_name: Some("Ada".to_string()),
                program: Some("CS".to_string()),
                cohort: Some("2026".to_string()),
            },
        );

        let signed_in = fx
            .service
            .sign_in("a@x.com", "secret123")
            .await
            .expect("sign in should succeed");
        assert_eq!(
            signed_in.profile.as_ref().and_then(|p| p.display_name.as_deref()),
            Some("Ada")
        );
    }
}
