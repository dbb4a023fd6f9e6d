//! `whoami` — show the identity behind the stored session.

use staffdesk_client::AuthState;
use staffdesk_core::config::AppConfig;
use staffdesk_core::error::AppError;
use staffdesk_core::result::AppResult;

use crate::output;

/// Execute the whoami command.
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let agent = super::build_agent(config)?;

    match agent.authentication_state().await {
        AuthState::Authenticated(user) => {
            println!("Email:       {}", user.email);
            println!("Username:    {}", user.username);
            println!("User id:     {}", user.id);
            println!("Roles:       {}", user.role_names.join(", "));
            Ok(())
        }
        AuthState::Anonymous => {
            output::print_error("Not logged in");
            Err(AppError::session_expired("No stored session"))
        }
    }
}
