//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use staffdesk_api::router::build_router;
use staffdesk_api::state::AppState;
use staffdesk_auth::store::{MemoryCredentialStore, NewUser};
use staffdesk_auth::CredentialStore;
use staffdesk_core::config::auth::AuthConfig;
use staffdesk_core::config::AppConfig;
use staffdesk_entity::user::User;

/// Signing key used by every test app.
pub const TEST_JWT_SECRET: &str = "integration-test-signing-key-0123456789";

/// Builds a complete in-code configuration for tests.
pub fn test_config() -> AppConfig {
    AppConfig {
        server: Default::default(),
        database: None,
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            token_issuer: "staffdesk-api".to_string(),
            token_audience: "staffdesk-client".to_string(),
            access_ttl_seconds: 900,
            password_min_length: 8,
        },
        client: Default::default(),
        logging: Default::default(),
    }
}

/// Test application context wired with the in-memory credential store.
pub struct TestApp {
    /// The Axum router for making test requests.
    pub router: Router,
    /// Direct handle on the credential store for assertions.
    pub store: Arc<MemoryCredentialStore>,
}

impl TestApp {
    /// Create a new test application.
    pub fn new() -> Self {
        let store = Arc::new(MemoryCredentialStore::new());
        let state = AppState::new(test_config(), store.clone()).expect("Failed to build app state");
        let router = build_router(state);

        Self { router, store }
    }

    /// Create a test account and return it.
    pub async fn create_test_user(&self, email: &str, password: &str) -> User {
        self.store
            .create_user(NewUser {
                email: email.to_string(),
                password: password.to_string(),
                employee_id: "E-1001".to_string(),
            })
            .await
            .expect("Failed to create test user")
    }

    /// Login and return the JWT access token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .request("POST", "/api/auth/login", Some(body), None)
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        response
            .body
            .get("access_token")
            .and_then(|v| v.as_str())
            .expect("No access_token in login response")
            .to_string()
    }

    /// Make an HTTP request to the test app.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the router on an ephemeral local port and return its base URL.
    pub async fn spawn_server(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local addr");

        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server crashed");
        });

        format!("http://{}", addr)
    }
}

/// Response from a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Parsed JSON body.
    pub body: Value,
}
