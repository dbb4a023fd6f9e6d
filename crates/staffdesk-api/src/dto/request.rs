//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Account email.
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// Password; policy is enforced by the issuer.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Company employee number.
    #[validate(length(min = 1, message = "Employee id is required"))]
    pub employee_id: String,
}

/// Token refresh query parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshQuery {
    /// Refresh token value. The original camelCase spelling is accepted
    /// for wire compatibility.
    #[serde(alias = "refreshToken")]
    pub refresh_token: String,
}
