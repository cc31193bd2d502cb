use serde::{Deserialize, Serialize};

/// A single inbound customer text message, normalized from a webhook delivery.
///
/// Constructed fresh for each delivery and handed over the bus; nothing in
/// this crate stores or mutates it afterwards. All fields are copied verbatim
/// from the platform payload, including `timestamp` (milliseconds since epoch,
/// platform-supplied).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// Platform-scoped id of the customer who sent the message.
    pub sender_id: String,
    /// Id of the page that received it.
    pub recipient_id: String,
    pub timestamp: i64,
    pub message_text: String,
    /// Platform message id (`mid`).
    pub message_id: String,
}

/// Messages exchanged between components via the PilotBus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Channels → dispatcher: a customer sent the bot a text message
    InboundText(InboundTextPayload),
    /// Dispatcher → notifier: alert the business owner
    OwnerAlert(OwnerAlertPayload),
}

/// An inbound message together with the channel it arrived on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundTextPayload {
    pub channel: String,
    pub message: ParsedMessage,
}

/// A human-readable alert for the business owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerAlertPayload {
    pub title: String,
    pub body: String,
}

impl Message {
    /// Short tag used in dispatcher logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::InboundText(_) => "inbound_text",
            Message::OwnerAlert(_) => "owner_alert",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_parsed() -> ParsedMessage {
        ParsedMessage {
            sender_id: "U1".to_string(),
            recipient_id: "P1".to_string(),
            timestamp: 1_700_000_000_000,
            message_text: "hello".to_string(),
            message_id: "m.1".to_string(),
        }
    }

    #[test]
    fn test_message_serialization_roundtrip() {
        let msg = Message::InboundText(InboundTextPayload {
            channel: "messenger".to_string(),
            message: sample_parsed(),
        });
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        match deserialized {
            Message::InboundText(payload) => {
                assert_eq!(payload.channel, "messenger");
                assert_eq!(payload.message, sample_parsed());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_message_tagged_encoding() {
        let msg = Message::OwnerAlert(OwnerAlertPayload {
            title: "New message".to_string(),
            body: "hi".to_string(),
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "owner_alert");
    }

    #[test]
    fn test_kind_tags() {
        let inbound = Message::InboundText(InboundTextPayload {
            channel: "messenger".to_string(),
            message: sample_parsed(),
        });
        assert_eq!(inbound.kind(), "inbound_text");
    }
}
