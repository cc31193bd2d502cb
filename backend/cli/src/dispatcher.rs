//! Inbound message dispatcher.
//!
//! Consumes normalized inbound messages from the bus, records them, and
//! raises owner alerts. Conversation storage and bot reply generation hang
//! off this seam.

use chrono::DateTime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pagepilot_core::{InboundTextPayload, Message, OwnerAlertPayload};

/// Longest message preview included in an owner alert.
const PREVIEW_LENGTH: usize = 200;

/// Run the dispatcher until the inbound channel closes.
pub async fn run_dispatcher(
    mut inbound_rx: mpsc::Receiver<Message>,
    alert_tx: Option<mpsc::Sender<Message>>,
) {
    info!("Dispatcher started");
    while let Some(msg) = inbound_rx.recv().await {
        match msg {
            Message::InboundText(payload) => {
                info!(
                    "[{}] message {} from {}: {}",
                    payload.channel,
                    payload.message.message_id,
                    payload.message.sender_id,
                    payload.message.message_text,
                );
                if let Some(tx) = &alert_tx {
                    let alert = owner_alert_for(&payload);
                    if tx.send(Message::OwnerAlert(alert)).await.is_err() {
                        warn!("Notifier channel closed, dropping owner alert");
                    }
                }
            }
            other => debug!("Dispatcher ignoring message: {}", other.kind()),
        }
    }
    info!("Dispatcher stopped");
}

/// Build the owner alert for an inbound message.
fn owner_alert_for(inbound: &InboundTextPayload) -> OwnerAlertPayload {
    let when = DateTime::from_timestamp_millis(inbound.message.timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown time".to_string());

    OwnerAlertPayload {
        title: format!("New {} message", inbound.channel),
        body: format!(
            "From {} at {}: {}",
            inbound.message.sender_id,
            when,
            preview(&inbound.message.message_text),
        ),
    }
}

/// Shorten a message for the alert body.
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LENGTH {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(PREVIEW_LENGTH).collect();
        format!("{}…", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepilot_core::ParsedMessage;

    fn inbound(text: &str) -> InboundTextPayload {
        InboundTextPayload {
            channel: "messenger".to_string(),
            message: ParsedMessage {
                sender_id: "U1".to_string(),
                recipient_id: "P1".to_string(),
                timestamp: 1_700_000_000_000,
                message_text: text.to_string(),
                message_id: "m.1".to_string(),
            },
        }
    }

    #[test]
    fn test_owner_alert_contents() {
        let alert = owner_alert_for(&inbound("can I book a table?"));
        assert_eq!(alert.title, "New messenger message");
        assert!(alert.body.starts_with("From U1 at 2023-11-14"));
        assert!(alert.body.ends_with("can I book a table?"));
    }

    #[test]
    fn test_owner_alert_unparseable_timestamp() {
        let mut payload = inbound("hi");
        payload.message.timestamp = i64::MAX;
        let alert = owner_alert_for(&payload);
        assert!(alert.body.contains("unknown time"));
    }

    #[test]
    fn test_preview_truncates_long_messages() {
        let long = "x".repeat(PREVIEW_LENGTH + 50);
        let short = preview(&long);
        assert_eq!(short.chars().count(), PREVIEW_LENGTH + 1);
        assert!(short.ends_with('…'));
    }

    #[tokio::test]
    async fn test_dispatcher_raises_owner_alert() {
        let (inbound_tx, inbound_rx) = mpsc::channel(8);
        let (alert_tx, mut alert_rx) = mpsc::channel(8);

        tokio::spawn(run_dispatcher(inbound_rx, Some(alert_tx)));

        inbound_tx
            .send(Message::InboundText(inbound("hello")))
            .await
            .unwrap();

        let alert = alert_rx.recv().await.unwrap();
        match alert {
            Message::OwnerAlert(alert) => {
                assert_eq!(alert.title, "New messenger message");
                assert!(alert.body.contains("hello"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatcher_without_notifier() {
        let (inbound_tx, inbound_rx) = mpsc::channel(8);
        let handle = tokio::spawn(run_dispatcher(inbound_rx, None));

        inbound_tx
            .send(Message::InboundText(inbound("hello")))
            .await
            .unwrap();
        drop(inbound_tx);

        // Loop exits cleanly when the inbound channel closes.
        handle.await.unwrap();
    }
}
