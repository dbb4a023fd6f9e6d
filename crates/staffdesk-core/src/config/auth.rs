//! Token issuing configuration.

use serde::{Deserialize, Serialize};

/// Token issuing and password policy configuration.
///
/// `jwt_secret` deliberately has no default: the signing key must be
/// supplied externally (config file or `STAFFDESK_AUTH__JWT_SECRET`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256). Required.
    pub jwt_secret: String,
    /// Value of the `iss` claim on issued access tokens.
    #[serde(default = "default_issuer")]
    pub token_issuer: String,
    /// Value of the `aud` claim on issued access tokens.
    #[serde(default = "default_audience")]
    pub token_audience: String,
    /// Access token TTL in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: u64,
    /// Minimum password length accepted at registration.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
}

fn default_issuer() -> String {
    "staffdesk-api".to_string()
}

fn default_audience() -> String {
    "staffdesk-client".to_string()
}

fn default_access_ttl() -> u64 {
    900
}

fn default_password_min() -> usize {
    8
}
