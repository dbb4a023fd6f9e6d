//! Password policy enforcement for new passwords.

use staffdesk_core::config::auth::AuthConfig;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Minimum password length.
    min_length: usize,
}

impl PasswordPolicy {
    /// Creates a new policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Returns every policy violation for the candidate password.
    ///
    /// An empty vector means the password is acceptable. Violations are
    /// returned together so registration can report them field-keyed in
    /// one response.
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut violations = Vec::new();

        if password.len() < self.min_length {
            violations.push(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            violations.push("Password must contain at least one uppercase letter".to_string());
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            violations.push("Password must contain at least one lowercase letter".to_string());
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push("Password must contain at least one digit".to_string());
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PasswordPolicy {
        PasswordPolicy { min_length: 8 }
    }

    #[test]
    fn accepts_conforming_password() {
        assert!(policy().violations("Sup3rSafe").is_empty());
    }

    #[test]
    fn reports_all_violations_at_once() {
        let violations = policy().violations("ab");
        assert_eq!(violations.len(), 3); // length, uppercase, digit
    }
}
