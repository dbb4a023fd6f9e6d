//! Middleware that injects a bearer token into outgoing requests.
//!
//! If a request already carries an `Authorization` header by the time the
//! middleware executes, the existing value is left in place, allowing
//! per-call overrides. Otherwise the agent supplies a cached token or
//! refreshes one; when neither is possible the request is failed without
//! ever being sent unauthenticated, and the agent forces logout so the
//! caller is routed back to login.

use std::sync::Arc;

use http::Extensions;
use reqwest::header::{self, HeaderValue};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next, Result};

use crate::agent::TokenAgent;

/// A middleware that attaches the agent's access token to outgoing requests
/// and reacts to 401 responses by forcing logout.
#[derive(Clone)]
pub struct BearerAuthMiddleware {
    agent: Arc<TokenAgent>,
}

impl std::fmt::Debug for BearerAuthMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthMiddleware").finish()
    }
}

impl BearerAuthMiddleware {
    /// Constructs the middleware over a shared token agent.
    pub fn new(agent: Arc<TokenAgent>) -> Self {
        Self { agent }
    }

    async fn resolve_token(&self) -> Result<String> {
        if let Some(token) = self.agent.bearer_token().await {
            return Ok(token);
        }

        match self.agent.refresh().await {
            Ok(token) => Ok(token),
            Err(e) => {
                self.agent.force_logout().await;
                Err(reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                    "session expired and could not be refreshed: {e}"
                )))
            }
        }
    }
}

#[async_trait::async_trait]
impl Middleware for BearerAuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if req.headers().get(header::AUTHORIZATION).is_none() {
            let token = self.resolve_token().await?;

            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                    "access token is not a valid header value: {e}"
                ))
            })?;
            value.set_sensitive(true);

            req.headers_mut().insert(header::AUTHORIZATION, value);
        }

        let response = next.run(req, extensions).await?;

        // The terminal signal that the server no longer honors the token.
        // Not retried: replaying a 401 with the same stale token would loop.
        if response.status() == StatusCode::UNAUTHORIZED {
            self.agent.force_logout().await;
        }

        Ok(response)
    }
}
