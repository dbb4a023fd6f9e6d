//! Token issuer — login, registration, and refresh-with-rotation flows.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine as _;
use rand::RngCore;
use tracing::{info, warn};

use staffdesk_core::config::auth::AuthConfig;
use staffdesk_core::error::AppError;
use staffdesk_core::result::AppResult;
use staffdesk_entity::user::User;

use crate::jwt::JwtEncoder;
use crate::password::PasswordPolicy;
use crate::store::{CredentialStore, NewUser};

/// Number of random bytes behind an opaque refresh-token value.
const REFRESH_TOKEN_BYTES: usize = 32;

/// An access + refresh token pair returned by login and refresh.
///
/// Immutable once issued; a later login or refresh supersedes it with a new
/// pair rather than mutating it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived signed access token.
    pub access_token: String,
    /// Opaque refresh token, single-use per rotation.
    pub refresh_token: String,
    /// Access token validity window in seconds.
    pub expires_in: u64,
}

/// Mints and rotates token pairs against the credential store.
#[derive(Clone)]
pub struct TokenIssuer {
    /// Account and refresh-token persistence.
    store: Arc<dyn CredentialStore>,
    /// Access token signer.
    encoder: JwtEncoder,
    /// Password policy applied at registration.
    policy: PasswordPolicy,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("encoder", &self.encoder)
            .field("policy", &self.policy)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates a new issuer from auth configuration and a credential store.
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> AppResult<Self> {
        Ok(Self {
            store,
            encoder: JwtEncoder::new(config)?,
            policy: PasswordPolicy::new(config),
        })
    }

    /// Performs the login flow:
    ///
    /// 1. Verify the password through the credential store
    /// 2. Load the account record
    /// 3. Generate and return a token pair
    ///
    /// The unauthorized message never distinguishes an unknown account from
    /// a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let password_valid = self.store.verify_password(email, password).await?;

        if !password_valid {
            warn!(email = %email, "Login rejected: invalid credentials");
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        // The account can disappear between the password check and this
        // lookup (deleted mid-flow); that case is NotFound, not Unauthorized.
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("Account not found"))?;

        let pair = self.issue_pair(&user).await?;

        let _ = self.store.touch_last_login(user.id).await;
        info!(user_id = %user.id, "Login successful");

        Ok(pair)
    }

    /// Registers a new account. Does not log the account in.
    ///
    /// Policy violations and store-side validation failures are reported as
    /// a field-keyed error map.
    pub async fn register(&self, email: &str, password: &str, employee_id: &str) -> AppResult<()> {
        let violations = self.policy.violations(password);
        if !violations.is_empty() {
            let mut fields = BTreeMap::new();
            fields.insert("password".to_string(), violations);
            return Err(AppError::validation_fields(fields));
        }

        let user = self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                password: password.to_string(),
                employee_id: employee_id.to_string(),
            })
            .await?;

        info!(user_id = %user.id, "Account registered");
        Ok(())
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// The lookup is keyed by token value; a successful exchange rotates the
    /// stored value, so replaying the old one fails.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let user = self
            .store
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                warn!("Refresh rejected: unknown token value");
                AppError::unauthorized("Invalid refresh token")
            })?;

        let pair = self.issue_pair(&user).await?;
        info!(user_id = %user.id, "Token pair refreshed");

        Ok(pair)
    }

    /// Signs an access token and rotates the refresh token for `user`.
    async fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        let (access_token, expires_in) = self.encoder.encode_access_token(&user.email)?;
        let refresh_token = generate_refresh_token();

        self.store
            .store_refresh_token(user.id, &refresh_token)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in,
        })
    }
}

/// Generates an opaque, URL-safe refresh-token value.
fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtDecoder;
    use crate::store::MemoryCredentialStore;
    use chrono::Utc;
    use staffdesk_core::error::ErrorKind;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-signing-key-0123456789".to_string(),
            token_issuer: "staffdesk-api".to_string(),
            token_audience: "staffdesk-client".to_string(),
            access_ttl_seconds: 900,
            password_min_length: 8,
        }
    }

    async fn issuer_with_account(email: &str, password: &str) -> (TokenIssuer, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let issuer = TokenIssuer::new(&test_config(), store.clone()).unwrap();
        issuer.register(email, password, "E-1001").await.unwrap();
        (issuer, store)
    }

    #[tokio::test]
    async fn login_issues_claims_with_subject_and_fixed_window() {
        let (issuer, _) = issuer_with_account("a@b.com", "Secret123").await;

        let before = Utc::now().timestamp();
        let pair = issuer.login("a@b.com", "Secret123").await.unwrap();
        let after = Utc::now().timestamp();

        assert_eq!(pair.expires_in, 900);

        let decoder = JwtDecoder::new(&test_config()).unwrap();
        let claims = decoder.decode_access_token(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "a@b.com");
        assert!(claims.exp >= before + 900 && claims.exp <= after + 900);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized_and_mutates_nothing() {
        let (issuer, store) = issuer_with_account("a@b.com", "Secret123").await;
        let user = store.find_by_email("a@b.com").await.unwrap().unwrap();

        let err = issuer.login("a@b.com", "nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        // No refresh-token record was created for the failed attempt.
        assert!(store.current_refresh_token(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_with_unknown_account_is_unauthorized() {
        let (issuer, _) = issuer_with_account("a@b.com", "Secret123").await;

        let err = issuer.login("nobody@b.com", "Secret123").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn refresh_with_never_issued_value_is_unauthorized() {
        let (issuer, _) = issuer_with_account("a@b.com", "Secret123").await;

        let err = issuer.refresh("not-a-real-token").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_replayed_value() {
        let (issuer, _) = issuer_with_account("a@b.com", "Secret123").await;

        let first = issuer.login("a@b.com", "Secret123").await.unwrap();
        let second = issuer.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        // The rotated-out value is single-use.
        let err = issuer.refresh(&first.refresh_token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        // The current value still works.
        issuer.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn register_reports_policy_violations_field_keyed() {
        let store = Arc::new(MemoryCredentialStore::new());
        let issuer = TokenIssuer::new(&test_config(), store).unwrap();

        let err = issuer.register("a@b.com", "short", "E-1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let fields = err.fields.unwrap();
        assert!(!fields.get("password").unwrap().is_empty());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (issuer, _) = issuer_with_account("a@b.com", "Secret123").await;

        let err = issuer
            .register("A@B.com", "Secret123", "E-2")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.fields.unwrap().contains_key("email"));
    }

    #[tokio::test]
    async fn issuer_requires_a_signing_key() {
        let mut config = test_config();
        config.jwt_secret = String::new();

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let err = TokenIssuer::new(&config, store).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
