//! `login` — authenticate and store a session.

use clap::Args;

use staffdesk_client::AuthState;
use staffdesk_core::config::AppConfig;
use staffdesk_core::error::AppError;
use staffdesk_core::result::AppResult;

use crate::output;

/// Arguments for the login command.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email.
    pub email: String,
    /// Password; prompted interactively when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

/// Execute the login command.
pub async fn execute(config: &AppConfig, args: LoginArgs) -> AppResult<()> {
    let password = match args.password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };

    let agent = super::build_agent(config)?;
    agent.login(&args.email, &password).await?;

    match agent.authentication_state().await {
        AuthState::Authenticated(user) => {
            output::print_success(&format!("Logged in as {}", user.email));
        }
        AuthState::Anonymous => {
            output::print_success("Logged in");
        }
    }

    Ok(())
}
