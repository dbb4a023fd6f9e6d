//! Integration tests for the client token agent and its request middleware,
//! driven against a real server on an ephemeral port.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use http::StatusCode;

use staffdesk_client::{
    AuthState, BearerAuthMiddleware, MemorySessionStorage, SessionStorage, StoredSession,
    TokenAgent, UserInfo,
};
use staffdesk_core::config::client::ClientConfig;

fn client_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_base_url: base_url.to_string(),
        session_file: String::new(),
    }
}

fn agent_over(base_url: &str) -> (Arc<TokenAgent>, Arc<MemorySessionStorage>) {
    let storage = Arc::new(MemorySessionStorage::new());
    let agent = Arc::new(
        TokenAgent::new(&client_config(base_url), storage.clone()).expect("Failed to build agent"),
    );
    (agent, storage)
}

fn middleware_client(agent: Arc<TokenAgent>) -> reqwest_middleware::ClientWithMiddleware {
    reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
        .with(BearerAuthMiddleware::new(agent))
        .build()
}

#[tokio::test]
async fn login_stores_session_and_fetches_identity() {
    let app = common::TestApp::new();
    app.create_test_user("agent@b.com", "Secret123").await;
    let base_url = app.spawn_server().await;

    let (agent, storage) = agent_over(&base_url);
    agent.login("agent@b.com", "Secret123").await.unwrap();

    let session = storage.load().await.unwrap().expect("No session stored");
    assert!(!session.access_token.is_empty());
    assert!(!session.refresh_token.is_empty());
    assert!(session.expires_at > Utc::now());
    assert_eq!(session.user.as_ref().unwrap().email, "agent@b.com");

    match agent.authentication_state().await {
        AuthState::Authenticated(user) => assert_eq!(user.email, "agent@b.com"),
        AuthState::Anonymous => panic!("Expected an authenticated state"),
    }
}

#[tokio::test]
async fn login_with_bad_password_leaves_session_empty() {
    let app = common::TestApp::new();
    app.create_test_user("agent2@b.com", "Secret123").await;
    let base_url = app.spawn_server().await;

    let (agent, storage) = agent_over(&base_url);
    let err = agent.login("agent2@b.com", "wrong").await.unwrap_err();

    assert_eq!(err.kind, staffdesk_core::error::ErrorKind::Unauthorized);
    assert!(storage.load().await.unwrap().is_none());
}

#[tokio::test]
async fn cached_identity_short_circuits_the_network() {
    // The base URL is unroutable: any network call would fail and degrade
    // the state to anonymous, so an authenticated result proves the cached
    // identity was used without a request.
    let (agent, storage) = agent_over("http://127.0.0.1:1");

    storage
        .store(&StoredSession {
            access_token: "cached-access".to_string(),
            refresh_token: "cached-refresh".to_string(),
            expires_at: Utc::now() + Duration::seconds(600),
            user: Some(UserInfo {
                id: uuid::Uuid::new_v4(),
                email: "cached@b.com".to_string(),
                username: "cached@b.com".to_string(),
                role_names: vec!["employee".to_string()],
            }),
        })
        .await
        .unwrap();

    match agent.authentication_state().await {
        AuthState::Authenticated(user) => assert_eq!(user.email, "cached@b.com"),
        AuthState::Anonymous => panic!("Cached identity should not require the network"),
    }
}

#[tokio::test]
async fn middleware_refreshes_when_no_access_token_is_cached() {
    let app = common::TestApp::new();
    app.create_test_user("mw@b.com", "Secret123").await;
    let base_url = app.spawn_server().await;

    let (agent, storage) = agent_over(&base_url);
    agent.login("mw@b.com", "Secret123").await.unwrap();

    // Drop the access token but keep the valid refresh token.
    let mut session = storage.load().await.unwrap().unwrap();
    session.access_token = String::new();
    storage.store(&session).await.unwrap();

    let client = middleware_client(agent);
    let response = client
        .get(format!("{}/api/auth/me", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // The outgoing request carried a freshly refreshed token, now stored.
    let refreshed = storage.load().await.unwrap().unwrap();
    assert!(!refreshed.access_token.is_empty());
    assert_ne!(refreshed.refresh_token, session.refresh_token);
}

#[tokio::test]
async fn unauthorized_response_clears_the_whole_session() {
    let app = common::TestApp::new();
    let base_url = app.spawn_server().await;

    let (agent, storage) = agent_over(&base_url);
    let mut state_rx = agent.subscribe();

    // A token the server will reject, still inside its claimed window.
    storage
        .store(&StoredSession {
            access_token: "garbage-token".to_string(),
            refresh_token: "garbage-refresh".to_string(),
            expires_at: Utc::now() + Duration::seconds(600),
            user: Some(UserInfo {
                id: uuid::Uuid::new_v4(),
                email: "stale@b.com".to_string(),
                username: "stale@b.com".to_string(),
                role_names: vec![],
            }),
        })
        .await
        .unwrap();

    let client = middleware_client(agent);
    let response = client
        .get(format!("{}/api/auth/me", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Every stored field is gone, and subscribers saw the forced logout.
    assert!(storage.load().await.unwrap().is_none());
    state_rx.changed().await.unwrap();
    assert_eq!(*state_rx.borrow(), AuthState::Anonymous);
}

#[tokio::test]
async fn concurrent_requests_share_a_single_refresh() {
    let app = common::TestApp::new();
    app.create_test_user("race@b.com", "Secret123").await;
    let base_url = app.spawn_server().await;

    let (agent, storage) = agent_over(&base_url);
    agent.login("race@b.com", "Secret123").await.unwrap();

    // Expire the access token so both requests need a refresh.
    let mut session = storage.load().await.unwrap().unwrap();
    session.expires_at = Utc::now() - Duration::seconds(10);
    storage.store(&session).await.unwrap();

    let client = middleware_client(agent);
    let url = format!("{}/api/auth/me", base_url);

    let (first, second) = tokio::join!(client.get(&url).send(), client.get(&url).send());

    // Had each caller rotated independently, one rotation would have
    // invalidated the other's refresh token and failed its request.
    assert_eq!(first.unwrap().status(), StatusCode::OK);
    assert_eq!(second.unwrap().status(), StatusCode::OK);

    // The pre-refresh token value was consumed by exactly one rotation.
    let replay = reqwest::Client::new()
        .post(format!("{}/api/auth/refresh", base_url))
        .query(&[("refresh_token", session.refresh_token.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_failure_forces_logout() {
    let app = common::TestApp::new();
    let base_url = app.spawn_server().await;

    let (agent, storage) = agent_over(&base_url);

    storage
        .store(&StoredSession {
            access_token: String::new(),
            refresh_token: "never-issued".to_string(),
            expires_at: Utc::now() - Duration::seconds(10),
            user: None,
        })
        .await
        .unwrap();

    let err = agent.refresh().await.unwrap_err();
    assert_eq!(err.kind, staffdesk_core::error::ErrorKind::SessionExpired);

    assert!(storage.load().await.unwrap().is_none());
    assert_eq!(agent.authentication_state().await, AuthState::Anonymous);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let app = common::TestApp::new();
    app.create_test_user("out@b.com", "Secret123").await;
    let base_url = app.spawn_server().await;

    let (agent, storage) = agent_over(&base_url);
    agent.login("out@b.com", "Secret123").await.unwrap();

    agent.logout().await.unwrap();
    assert!(storage.load().await.unwrap().is_none());

    // Clearing an already-empty session is a no-op.
    agent.logout().await.unwrap();
    assert_eq!(agent.authentication_state().await, AuthState::Anonymous);
}
