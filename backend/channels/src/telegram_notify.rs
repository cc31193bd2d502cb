//! Telegram owner notifications.
//!
//! Delivers owner alerts (new customer messages needing attention) to a
//! fixed Telegram chat via the Bot API.

use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};

use pagepilot_core::{Message, OwnerAlertPayload, PilotError};

pub struct TelegramNotifier {
    bot: Bot,
    owner_chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: String, owner_chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            owner_chat_id: ChatId(owner_chat_id),
        }
    }

    /// Deliver a single alert to the owner chat.
    pub async fn send_alert(&self, alert: &OwnerAlertPayload) -> Result<(), PilotError> {
        self.bot
            .send_message(self.owner_chat_id, format_alert(alert))
            .await
            .map_err(|e| PilotError::NotifyError(e.to_string()))?;
        Ok(())
    }

    /// Consume owner alerts from the bus until the channel closes.
    /// Delivery failures are logged and never stop the loop.
    pub async fn run(self, mut rx: mpsc::Receiver<Message>) {
        info!("[Telegram] owner notifier started");
        while let Some(msg) = rx.recv().await {
            match msg {
                Message::OwnerAlert(alert) => {
                    if let Err(e) = self.send_alert(&alert).await {
                        warn!("[Telegram] failed to deliver owner alert: {e}");
                    }
                }
                other => {
                    warn!("[Telegram] ignoring unexpected bus message: {}", other.kind());
                }
            }
        }
        info!("[Telegram] owner notifier stopped");
    }
}

/// Render an alert as a plain-text Telegram message.
fn format_alert(alert: &OwnerAlertPayload) -> String {
    if alert.body.is_empty() {
        alert.title.clone()
    } else {
        format!("{}\n{}", alert.title, alert.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_alert_with_body() {
        let alert = OwnerAlertPayload {
            title: "New messenger message".to_string(),
            body: "From U1: hi".to_string(),
        };
        assert_eq!(format_alert(&alert), "New messenger message\nFrom U1: hi");
    }

    #[test]
    fn test_format_alert_title_only() {
        let alert = OwnerAlertPayload {
            title: "New messenger message".to_string(),
            body: String::new(),
        };
        assert_eq!(format_alert(&alert), "New messenger message");
    }
}
