//! `serve` — run the API server.

use staffdesk_core::config::AppConfig;
use staffdesk_core::result::AppResult;

/// Execute the serve command.
pub async fn execute(config: AppConfig) -> AppResult<()> {
    staffdesk_api::run_server(config).await
}
