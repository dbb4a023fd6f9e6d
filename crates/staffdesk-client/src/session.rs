//! The durable client session document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity fields cached from the user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub username: String,
    /// Names of granted roles.
    pub role_names: Vec<String>,
}

/// Everything the agent persists between runs, as one document.
///
/// Storing the fields together means a clear removes all of them or none;
/// there is no path that drops the tokens but leaves stale identity fields
/// behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// Current access token.
    pub access_token: String,
    /// Current refresh token.
    pub refresh_token: String,
    /// Absolute access token expiry.
    pub expires_at: DateTime<Utc>,
    /// Cached identity, if the user-info endpoint has been consulted.
    pub user: Option<UserInfo>,
}

/// Lifecycle state of the session slot at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session is stored.
    Empty,
    /// The access token is still inside its validity window.
    Valid,
    /// The access token's absolute expiry has passed.
    Expired,
}

impl StoredSession {
    /// Returns the session state at `now`.
    ///
    /// A session counts as expired strictly when `now` exceeds the absolute
    /// expiry; at the exact boundary instant it is still valid.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.access_token.is_empty() || now > self.expires_at {
            SessionState::Expired
        } else {
            SessionState::Valid
        }
    }

    /// Returns the session state right now.
    pub fn state(&self) -> SessionState {
        self.state_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: DateTime<Utc>) -> StoredSession {
        StoredSession {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            user: None,
        }
    }

    #[test]
    fn valid_until_expiry_passes() {
        let now = Utc::now();
        assert_eq!(
            session(now + Duration::seconds(60)).state_at(now),
            SessionState::Valid
        );
        // Expiry is strict: the boundary instant itself is still valid.
        assert_eq!(session(now).state_at(now), SessionState::Valid);
        assert_eq!(
            session(now - Duration::seconds(1)).state_at(now),
            SessionState::Expired
        );
    }

    #[test]
    fn empty_access_token_is_never_usable() {
        let now = Utc::now();
        let mut s = session(now + Duration::seconds(60));
        s.access_token.clear();
        assert_eq!(s.state_at(now), SessionState::Expired);
    }
}
