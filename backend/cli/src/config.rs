use std::collections::HashMap;

use pagepilot_core::PilotError;

/// PagePilot runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Log level when RUST_LOG is unset
    pub log_level: String,
    /// Directory for NDJSON log files; console-only when unset
    pub log_dir: Option<String>,

    // Messenger
    pub messenger_app_secret: Option<String>,
    pub messenger_verify_token: Option<String>,
    pub messenger_page_token: Option<String>,
    pub messenger_webhook_path: String,

    // Telegram owner alerts
    pub telegram_bot_token: Option<String>,
    pub telegram_owner_chat_id: Option<i64>,

    /// Bearer token guarding the operator API
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_dir: None,
            messenger_app_secret: None,
            messenger_verify_token: None,
            messenger_page_token: None,
            messenger_webhook_path: "/webhooks/messenger".to_string(),
            telegram_bot_token: None,
            telegram_owner_chat_id: None,
            admin_token: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_env_map(&std::env::vars().collect())
    }

    /// Load configuration from a provided variable map (useful for testing).
    /// Blank values are treated as unset.
    pub fn from_env_map(vars: &HashMap<String, String>) -> Self {
        let get = |key: &str| -> Option<String> {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            bind_address: get("PAGEPILOT_BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: get("PAGEPILOT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_dir: get("PAGEPILOT_LOG_DIR"),
            messenger_app_secret: get("MESSENGER_APP_SECRET"),
            messenger_verify_token: get("MESSENGER_VERIFY_TOKEN"),
            messenger_page_token: get("MESSENGER_PAGE_TOKEN"),
            messenger_webhook_path: get("MESSENGER_WEBHOOK_PATH")
                .unwrap_or_else(|| "/webhooks/messenger".to_string()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_owner_chat_id: get("TELEGRAM_OWNER_CHAT_ID").and_then(|v| v.parse().ok()),
            admin_token: get("PAGEPILOT_ADMIN_TOKEN"),
        }
    }

    /// Reject inconsistent settings before any component starts.
    ///
    /// A missing Messenger app secret is deliberately NOT an error here:
    /// the webhook stays mounted and fails closed on every delivery.
    pub fn validate(&self) -> Result<(), PilotError> {
        match (&self.telegram_bot_token, &self.telegram_owner_chat_id) {
            (Some(_), None) => Err(PilotError::ConfigError(
                "TELEGRAM_BOT_TOKEN is set but TELEGRAM_OWNER_CHAT_ID is missing or not a number"
                    .to_string(),
            )),
            (None, Some(_)) => Err(PilotError::ConfigError(
                "TELEGRAM_OWNER_CHAT_ID is set but TELEGRAM_BOT_TOKEN is missing".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
