//! CLI command definitions and dispatch.

pub mod login;
pub mod logout;
pub mod register;
pub mod serve;
pub mod whoami;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use staffdesk_client::{FileSessionStorage, TokenAgent};
use staffdesk_core::config::AppConfig;
use staffdesk_core::result::AppResult;

/// StaffDesk command-line interface.
#[derive(Debug, Parser)]
#[command(name = "staffdesk", version, about = "StaffDesk employee portal")]
pub struct Cli {
    /// Configuration environment overlay (config/<env>.toml).
    #[arg(short, long, default_value = "default", global = true)]
    pub env: String,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the API server.
    Serve,
    /// Register a new account.
    Register(register::RegisterArgs),
    /// Log in and store a session.
    Login(login::LoginArgs),
    /// Show the identity of the stored session.
    Whoami,
    /// Clear the stored session.
    Logout,
}

impl Cli {
    /// Dispatch the selected command.
    pub async fn execute(self) -> AppResult<()> {
        let config = AppConfig::load(&self.env)?;

        match self.command {
            Command::Serve => serve::execute(config).await,
            Command::Register(args) => register::execute(&config, args).await,
            Command::Login(args) => login::execute(&config, args).await,
            Command::Whoami => whoami::execute(&config).await,
            Command::Logout => logout::execute(&config).await,
        }
    }
}

/// Build a token agent over the configured session file.
pub fn build_agent(config: &AppConfig) -> AppResult<Arc<TokenAgent>> {
    let storage = Arc::new(FileSessionStorage::new(&config.client.session_file));
    Ok(Arc::new(TokenAgent::new(&config.client, storage)?))
}
