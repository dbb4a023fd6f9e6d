//! # staffdesk-auth
//!
//! Token issuing and credential handling for StaffDesk.
//!
//! ## Modules
//!
//! - `jwt` — access token creation and validation
//! - `password` — Argon2id password hashing and policy enforcement
//! - `store` — the credential store seam plus an in-memory implementation
//! - `issuer` — the token issuer: login, register, refresh with rotation

pub mod issuer;
pub mod jwt;
pub mod password;
pub mod store;

pub use issuer::{TokenIssuer, TokenPair};
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordPolicy};
pub use store::{CredentialStore, MemoryCredentialStore, NewUser};
