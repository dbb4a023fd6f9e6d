//! `register` — create a new account.

use clap::Args;

use staffdesk_core::config::AppConfig;
use staffdesk_core::error::AppError;
use staffdesk_core::result::AppResult;

use crate::output;

/// Arguments for the register command.
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account email.
    pub email: String,
    /// Company employee number.
    #[arg(long)]
    pub employee_id: String,
    /// Password; prompted interactively when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

/// Execute the register command.
pub async fn execute(config: &AppConfig, args: RegisterArgs) -> AppResult<()> {
    let password = match args.password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };

    let agent = super::build_agent(config)?;

    match agent
        .register(&args.email, &password, &args.employee_id)
        .await
    {
        Ok(()) => {
            output::print_success(&format!("Account '{}' registered", args.email));
            Ok(())
        }
        Err(e) => {
            if let Some(fields) = &e.fields {
                for (field, messages) in fields {
                    for message in messages {
                        output::print_error(&format!("{field}: {message}"));
                    }
                }
            }
            Err(e)
        }
    }
}
