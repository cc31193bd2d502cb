//! Messenger Send API client.
//!
//! Sends text replies to customers via the Graph API on behalf of a
//! connected page.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{info, warn};

use pagepilot_core::PilotError;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

/// Messenger text message character limit.
const MAX_MESSAGE_LENGTH: usize = 2000;

pub struct MessengerSender {
    page_access_token: String,
    http: Client,
}

impl MessengerSender {
    pub fn new(page_access_token: String) -> Self {
        Self {
            page_access_token,
            http: Client::new(),
        }
    }

    /// Send a text reply to a customer, addressed by page-scoped id.
    pub async fn send_text(&self, recipient_psid: &str, text: &str) -> Result<(), PilotError> {
        let to = recipient_psid.trim();
        if to.is_empty() {
            return Err(PilotError::ChannelError(
                "Messenger recipient cannot be empty".to_string(),
            ));
        }

        let payload = json!({
            "recipient": { "id": to },
            "messaging_type": "RESPONSE",
            "message": { "text": truncate_message(text) },
        });

        let response = self
            .http
            .post(format!("{}/me/messages", GRAPH_API_BASE))
            .query(&[("access_token", self.page_access_token.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| PilotError::ChannelError(format!("Send API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let detail = body
                .get("error")
                .and_then(|err| err.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown Graph API error");
            warn!("[Messenger] Send API error {}: {}", status, detail);
            return Err(PilotError::ChannelError(format!(
                "Send API error {status}: {detail}"
            )));
        }

        info!("[Messenger] sent reply to {}", to);
        Ok(())
    }
}

/// Truncate a message to the Messenger character limit.
fn truncate_message(content: &str) -> String {
    if content.chars().count() <= MAX_MESSAGE_LENGTH {
        content.to_string()
    } else {
        let suffix = "...(truncated)";
        let cut_chars = MAX_MESSAGE_LENGTH.saturating_sub(suffix.len());
        let prefix: String = content.chars().take(cut_chars).collect();
        format!("{}{}", prefix, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_message_short() {
        assert_eq!(truncate_message("Hello!"), "Hello!");
    }

    #[test]
    fn test_truncate_message_at_limit() {
        let msg = "a".repeat(MAX_MESSAGE_LENGTH);
        assert_eq!(truncate_message(&msg).len(), MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn test_truncate_message_over_limit() {
        let msg = "a".repeat(MAX_MESSAGE_LENGTH + 100);
        let result = truncate_message(&msg);
        assert!(result.chars().count() <= MAX_MESSAGE_LENGTH);
        assert!(result.ends_with("...(truncated)"));
    }

    #[tokio::test]
    async fn test_send_text_empty_recipient() {
        let sender = MessengerSender::new("token".to_string());
        let result = sender.send_text("   ", "hello").await;
        assert!(matches!(result, Err(PilotError::ChannelError(_))));
    }
}
