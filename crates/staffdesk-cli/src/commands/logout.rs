//! `logout` — clear the stored session.

use staffdesk_core::config::AppConfig;
use staffdesk_core::result::AppResult;

use crate::output;

/// Execute the logout command.
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let agent = super::build_agent(config)?;
    agent.logout().await?;

    output::print_success("Logged out");
    Ok(())
}
