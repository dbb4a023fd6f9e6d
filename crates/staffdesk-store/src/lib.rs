//! # staffdesk-store
//!
//! PostgreSQL-backed credential store for StaffDesk. Implements the
//! `CredentialStore` seam defined in `staffdesk-auth` on top of sqlx,
//! and owns pool construction and schema migrations.

pub mod connection;
pub mod migration;
pub mod postgres;

pub use connection::DatabasePool;
pub use postgres::PgCredentialStore;
