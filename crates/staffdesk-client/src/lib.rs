//! # staffdesk-client
//!
//! Client-side token agent for StaffDesk.
//!
//! The agent owns one durable session slot (access token, refresh token,
//! absolute expiry, cached identity), decides whether the cached token is
//! usable, refreshes it against the API when it is not, and forces logout
//! when the server stops honoring it. [`BearerAuthMiddleware`] hooks the
//! agent into a `reqwest` middleware stack so every outgoing request carries
//! a bearer credential without the caller thinking about it.

pub mod agent;
pub mod middleware;
pub mod session;
pub mod storage;

pub use agent::{AuthState, TokenAgent};
pub use middleware::BearerAuthMiddleware;
pub use session::{SessionState, StoredSession, UserInfo};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
