//! The token agent — owns the client session slot and its lifecycle.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use staffdesk_core::config::client::ClientConfig;
use staffdesk_core::error::{AppError, FieldErrors};
use staffdesk_core::result::AppResult;

use crate::session::{SessionState, StoredSession, UserInfo};
use crate::storage::SessionStorage;

/// The authentication state visible to consumers.
///
/// Agent failures never surface as errors here; everything that cannot be
/// recovered collapses to `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// A session is present and an identity is known.
    Authenticated(UserInfo),
    /// No usable session.
    Anonymous,
}

/// Token pair as returned by the login and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
struct TokenPairBody {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
}

/// Error body as returned by the API.
#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    error: String,
    message: String,
    #[serde(default)]
    fields: Option<FieldErrors>,
}

/// Client-side token agent.
///
/// Holds the current token pair in durable storage, decides whether the
/// cached token is usable, refreshes it when it is not, and forces logout
/// on irrecoverable auth failure. Auth-state transitions are broadcast on a
/// watch channel so a UI shell can route back to its login entry point when
/// the session dies underneath it.
pub struct TokenAgent {
    /// Plain HTTP client for the auth endpoints themselves.
    http: reqwest::Client,
    /// API base URL without a trailing slash.
    base_url: String,
    /// Durable session slot.
    storage: Arc<dyn SessionStorage>,
    /// Single-flight gate: concurrent callers share one in-flight refresh
    /// instead of racing rotations that would invalidate each other.
    refresh_gate: Mutex<()>,
    /// Auth-state broadcast.
    state_tx: watch::Sender<AuthState>,
}

impl std::fmt::Debug for TokenAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAgent")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TokenAgent {
    /// Creates an agent from client configuration and a storage backend.
    pub fn new(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::network(format!("Failed to build HTTP client: {e}")))?;

        let (state_tx, _) = watch::channel(AuthState::Anonymous);

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            storage,
            refresh_gate: Mutex::new(()),
            state_tx,
        })
    }

    /// Subscribes to auth-state transitions.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Logs in and stores the returned token pair.
    ///
    /// On success the identity cache is (re)populated from the user-info
    /// endpoint and `Authenticated` is broadcast.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<()> {
        let response = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::network(format!("Login request failed: {e}")))?;

        let pair: TokenPairBody = decode_or_error(response).await?;
        self.store_pair(pair, None).await?;

        // Populate the identity cache and broadcast the new state.
        self.authentication_state().await;
        Ok(())
    }

    /// Registers a new account. Does not log in.
    pub async fn register(&self, email: &str, password: &str, employee_id: &str) -> AppResult<()> {
        let response = self
            .http
            .post(format!("{}/api/auth/register", self.base_url))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "employee_id": employee_id,
            }))
            .send()
            .await
            .map_err(|e| AppError::network(format!("Register request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Logs out: clears the whole session slot and broadcasts `Anonymous`.
    pub async fn logout(&self) -> AppResult<()> {
        self.storage.clear().await?;
        self.state_tx.send_replace(AuthState::Anonymous);
        Ok(())
    }

    /// Forced logout path used when a refresh fails or the server answers
    /// 401: the session is gone, consumers get routed to login.
    pub async fn force_logout(&self) {
        warn!("Forcing logout: session is no longer honored");
        if let Err(e) = self.storage.clear().await {
            warn!(error = %e, "Failed to clear session during forced logout");
        }
        self.state_tx.send_replace(AuthState::Anonymous);
    }

    /// Returns the cached access token if it is non-empty and unexpired.
    pub async fn bearer_token(&self) -> Option<String> {
        let session = self.storage.load().await.ok().flatten()?;
        match session.state() {
            SessionState::Valid => Some(session.access_token),
            _ => None,
        }
    }

    /// Exchanges the stored refresh token for a new pair and returns the new
    /// access token.
    ///
    /// Single-flight: if two callers race while the session is expired, one
    /// performs the rotation and the other reuses its result. Any refresh
    /// failure clears the session; a cancelled call leaves it untouched
    /// because storage is only written after a complete pair has arrived.
    pub async fn refresh(&self) -> AppResult<String> {
        let _gate = self.refresh_gate.lock().await;

        // A concurrent caller may have refreshed while we waited on the gate.
        if let Ok(Some(session)) = self.storage.load().await {
            if session.state() == SessionState::Valid {
                debug!("Reusing token refreshed by a concurrent caller");
                return Ok(session.access_token);
            }
        }

        let session = self
            .storage
            .load()
            .await?
            .ok_or_else(|| AppError::session_expired("No stored session to refresh"))?;

        if session.refresh_token.is_empty() {
            self.force_logout().await;
            return Err(AppError::session_expired("No refresh token stored"));
        }

        let response = self
            .http
            .post(format!("{}/api/auth/refresh", self.base_url))
            .query(&[("refresh_token", session.refresh_token.as_str())])
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(_) | Err(_) => {
                // Refresh failures are terminal for this session; retrying
                // with the same rejected token would loop.
                self.force_logout().await;
                return Err(AppError::session_expired("Session refresh was rejected"));
            }
        };

        let pair: TokenPairBody = match response.json().await {
            Ok(pair) => pair,
            Err(e) => {
                self.force_logout().await;
                return Err(AppError::with_source(
                    staffdesk_core::error::ErrorKind::SessionExpired,
                    "Malformed refresh response",
                    e,
                ));
            }
        };

        let access_token = pair.access_token.clone();
        self.store_pair(pair, session.user.clone()).await?;

        if let Some(user) = session.user {
            self.state_tx.send_replace(AuthState::Authenticated(user));
        }

        Ok(access_token)
    }

    /// Computes the current authentication state.
    ///
    /// Never fails: a cached identity short-circuits the network entirely;
    /// otherwise the user-info endpoint is consulted with the current access
    /// token and every failure degrades to `Anonymous` with the session
    /// cleared.
    pub async fn authentication_state(&self) -> AuthState {
        let session = match self.storage.load().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.state_tx.send_replace(AuthState::Anonymous);
                return AuthState::Anonymous;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load session; treating as anonymous");
                self.state_tx.send_replace(AuthState::Anonymous);
                return AuthState::Anonymous;
            }
        };

        // Cached identity: no network call needed.
        if let Some(user) = &session.user {
            let state = AuthState::Authenticated(user.clone());
            self.state_tx.send_replace(state.clone());
            return state;
        }

        // No cached identity: fetch it with a usable access token.
        let access_token = match session.state() {
            SessionState::Valid => session.access_token,
            _ => match self.refresh().await {
                Ok(token) => token,
                Err(_) => return AuthState::Anonymous,
            },
        };

        match self.fetch_user_info(&access_token).await {
            Ok(user) => {
                if let Err(e) = self.cache_user(&user).await {
                    warn!(error = %e, "Failed to cache user identity");
                }
                let state = AuthState::Authenticated(user);
                self.state_tx.send_replace(state.clone());
                state
            }
            Err(e) => {
                debug!(error = %e, "User-info fetch failed; degrading to anonymous");
                self.force_logout().await;
                AuthState::Anonymous
            }
        }
    }

    /// Fetches identity from the user-info endpoint.
    async fn fetch_user_info(&self, access_token: &str) -> AppResult<UserInfo> {
        let response = self
            .http
            .get(format!("{}/api/auth/me", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::network(format!("User-info request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::unauthorized("User-info request was rejected"));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::with_source(
                staffdesk_core::error::ErrorKind::Serialization,
                "Malformed user-info response",
                e,
            ))
    }

    /// Writes a freshly issued pair to storage in one atomic step.
    async fn store_pair(&self, pair: TokenPairBody, user: Option<UserInfo>) -> AppResult<()> {
        let session = StoredSession {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: Utc::now() + Duration::seconds(pair.expires_in as i64),
            user,
        };
        self.storage.store(&session).await
    }

    /// Adds the identity to the stored session, keeping the tokens as-is.
    async fn cache_user(&self, user: &UserInfo) -> AppResult<()> {
        if let Some(mut session) = self.storage.load().await? {
            session.user = Some(user.clone());
            self.storage.store(&session).await?;
        }
        Ok(())
    }
}

/// Decodes a successful body, or converts the API error body into `AppError`.
async fn decode_or_error<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> AppResult<T> {
    if response.status().is_success() {
        response.json().await.map_err(|e| {
            AppError::with_source(
                staffdesk_core::error::ErrorKind::Serialization,
                "Malformed response body",
                e,
            )
        })
    } else {
        Err(error_from_response(response).await)
    }
}

/// Maps a non-success API response to `AppError`, preserving field-keyed
/// validation messages when the server sent them.
async fn error_from_response(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body: Option<ErrorBody> = response.json().await.ok();

    match (status.as_u16(), body) {
        (401, _) => AppError::unauthorized("Invalid email or password"),
        (404, _) => AppError::not_found("Account not found"),
        (400, Some(body)) => match body.fields {
            Some(fields) => AppError::validation_fields(fields),
            None => AppError::validation(body.message),
        },
        (_, Some(body)) => AppError::network(body.message),
        (_, None) => AppError::network(format!("Request failed with status {status}")),
    }
}
