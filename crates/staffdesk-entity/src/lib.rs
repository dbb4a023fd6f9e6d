//! # staffdesk-entity
//!
//! Domain entity models for StaffDesk. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod token;
pub mod user;

pub use token::RefreshTokenRecord;
pub use user::User;
