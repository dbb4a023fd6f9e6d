//! Refresh token record entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The current refresh token held by a user.
///
/// One record per user: issuing a new token for the same user supersedes
/// the previous record, which is what makes rotated values single-use.
/// The token column carries a unique index so the issuer resolves
/// `token value → account` directly instead of scanning accounts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// Owning user.
    pub user_id: Uuid,
    /// Opaque token value.
    pub token: String,
    /// When this value was issued.
    pub issued_at: DateTime<Utc>,
}
