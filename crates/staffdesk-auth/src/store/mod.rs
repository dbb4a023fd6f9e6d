//! The credential store seam consulted by the token issuer.
//!
//! The issuer never touches account or refresh-token records directly; it
//! goes through [`CredentialStore`]. The production implementation lives in
//! `staffdesk-store` (PostgreSQL); [`MemoryCredentialStore`] backs tests and
//! ephemeral deployments.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use staffdesk_core::result::AppResult;
use staffdesk_entity::token::RefreshTokenRecord;
use staffdesk_entity::user::User;

pub use memory::MemoryCredentialStore;

/// Data required to create a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address; doubles as the login identifier and username.
    pub email: String,
    /// Plaintext password. Hashed by the store, never persisted as-is.
    pub password: String,
    /// Company employee number.
    pub employee_id: String,
}

/// Account and refresh-token persistence consulted by the issuer.
///
/// Refresh-token records are keyed by value: `find_by_refresh_token` is a
/// direct indexed lookup, and `store_refresh_token` supersedes the user's
/// previous value, which makes rotated values single-use.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Verifies a plaintext password against the stored hash for `email`.
    ///
    /// Returns `Ok(false)` both for a wrong password and for an unknown
    /// account so callers cannot distinguish the two.
    async fn verify_password(&self, email: &str, password: &str) -> AppResult<bool>;

    /// Finds an account by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Creates a new account.
    ///
    /// Field-keyed validation failures (duplicate email, malformed fields)
    /// surface as `ErrorKind::Validation` with a populated field map.
    async fn create_user(&self, new_user: NewUser) -> AppResult<User>;

    /// Resolves the account currently holding `token`, if any.
    async fn find_by_refresh_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Persists `token` as the user's current refresh token, superseding
    /// any previous value.
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()>;

    /// Returns the user's current refresh-token record, if one exists.
    async fn current_refresh_token(&self, user_id: Uuid) -> AppResult<Option<RefreshTokenRecord>>;

    /// Records a successful login.
    async fn touch_last_login(&self, user_id: Uuid) -> AppResult<()>;
}
