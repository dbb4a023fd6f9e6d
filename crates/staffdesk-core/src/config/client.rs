//! Client agent configuration.

use serde::{Deserialize, Serialize};

/// Settings for the client-side token agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the StaffDesk API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Path of the durable session document.
    #[serde(default = "default_session_file")]
    pub session_file: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            session_file: default_session_file(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_session_file() -> String {
    ".staffdesk/session.json".to_string()
}
