//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use staffdesk_auth::issuer::TokenIssuer;
use staffdesk_auth::jwt::JwtDecoder;
use staffdesk_auth::store::CredentialStore;
use staffdesk_core::config::AppConfig;
use staffdesk_core::result::AppResult;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Token issuer (login, register, refresh).
    pub issuer: Arc<TokenIssuer>,
    /// Access token validator.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Account persistence, consulted by the user-info endpoint.
    pub credential_store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("issuer", &self.issuer)
            .field("jwt_decoder", &self.jwt_decoder)
            .finish()
    }
}

impl AppState {
    /// Builds the state from configuration and a credential store.
    pub fn new(config: AppConfig, credential_store: Arc<dyn CredentialStore>) -> AppResult<Self> {
        let issuer = Arc::new(TokenIssuer::new(&config.auth, credential_store.clone())?);
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth)?);

        Ok(Self {
            config: Arc::new(config),
            issuer,
            jwt_decoder,
            credential_store,
        })
    }
}
