//! # staffdesk-api
//!
//! HTTP API layer for StaffDesk built on Axum.
//!
//! Provides the auth endpoints (login, register, refresh, me), the health
//! endpoint, middleware (CORS, request logging), extractors, DTOs, and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::run_server;
pub use state::AppState;
