//! Messenger Webhook Receiver
//!
//! Handles inbound payloads from the Messenger Platform webhook,
//! including signature verification and event normalization.
//!
//! Both functions here are pure: no state across calls, no I/O beyond
//! diagnostic logging, safe under arbitrary concurrency.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, error, info, warn};

use pagepilot_core::ParsedMessage;

type HmacSha256 = Hmac<Sha256>;

/// Header prefix Meta uses for SHA-256 payload signatures.
const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify the `X-Hub-Signature-256` header against the raw request body.
///
/// `body` must be the exact bytes that arrived on the wire — verifying a
/// re-serialized payload would miss byte-level tampering. Returns `false`
/// for every failure mode, never panics. The digest comparison is
/// constant-time (`Mac::verify_slice`).
pub fn verify_signature(
    app_secret: Option<&str>,
    body: &[u8],
    signature_header: Option<&str>,
) -> bool {
    let Some(secret) = app_secret.filter(|s| !s.is_empty()) else {
        error!("[Messenger] app secret not configured — rejecting webhook (set MESSENGER_APP_SECRET)");
        return false;
    };
    let Some(header) = signature_header.filter(|h| !h.is_empty()) else {
        warn!("[Messenger] missing signature header");
        return false;
    };
    let Some(hex_sig) = header.strip_prefix(SIGNATURE_PREFIX) else {
        warn!("[Messenger] malformed signature header");
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        warn!("[Messenger] signature header is not valid hex");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    if mac.verify_slice(&expected).is_err() {
        warn!("[Messenger] invalid signature");
        return false;
    }
    true
}

// --- Messenger webhook wire types ---

/// Top-level webhook envelope from the Messenger Platform.
#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    /// Must be "page" for Page subscriptions.
    object: String,
    /// One element per page in this delivery. Absent is treated as empty.
    #[serde(default)]
    entry: Vec<Value>,
}

/// A single page entry. Entries are decoded one by one so a malformed
/// element cannot take down the whole delivery.
#[derive(Debug, Deserialize)]
struct Entry {
    /// Events for this page. Absent is treated as empty; any other
    /// non-array shape fails the entry as a whole.
    #[serde(default)]
    messaging: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct MessagingEvent {
    sender: Option<Participant>,
    recipient: Option<Participant>,
    /// Milliseconds since epoch, platform-supplied.
    #[serde(default)]
    timestamp: i64,
    /// Present only for message events; delivery receipts, read receipts,
    /// and postbacks do not carry it.
    message: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct Participant {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    mid: String,
    /// Absent for attachment-only and sticker messages.
    text: Option<String>,
    /// Set when the platform echoes the bot's own outbound message back.
    #[serde(default)]
    is_echo: bool,
}

/// Normalize an untrusted webhook payload into inbound text messages.
///
/// Anything that is not a genuine inbound text message — echoes, delivery
/// and read receipts, postbacks, attachment-only messages, malformed
/// entries — is dropped, never raised. An empty result is a routine
/// outcome (a delivery of read receipts yields nothing).
pub fn extract_text_messages(payload: Value) -> Vec<ParsedMessage> {
    let envelope: WebhookEnvelope = match serde_json::from_value(payload) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!("[Messenger] payload failed structural validation: {err}");
            return Vec::new();
        }
    };

    if envelope.object != "page" {
        warn!(
            "[Messenger] ignoring webhook for unexpected object '{}'",
            envelope.object
        );
        return Vec::new();
    }

    let mut out = Vec::new();

    for entry_value in envelope.entry {
        let Ok(entry) = serde_json::from_value::<Entry>(entry_value) else {
            continue;
        };

        for event_value in entry.messaging {
            let event: MessagingEvent = match serde_json::from_value(event_value) {
                Ok(event) => event,
                Err(err) => {
                    debug!("[Messenger] skipping malformed messaging event: {err}");
                    continue;
                }
            };

            // Delivery receipts, read receipts, and postbacks carry no message.
            let Some(message) = event.message else {
                continue;
            };

            // The platform echoes the bot's own outbound messages back;
            // processing them would feed the bot its own output.
            if message.is_echo {
                continue;
            }

            let text = match message.text {
                Some(text) if !text.is_empty() => text,
                _ => continue,
            };

            let sender_id = event.sender.map(|p| p.id).unwrap_or_default();
            let recipient_id = event.recipient.map(|p| p.id).unwrap_or_default();
            let message_id = message.mid;

            let mut missing: Vec<&str> = Vec::new();
            if sender_id.is_empty() {
                missing.push("sender.id");
            }
            if recipient_id.is_empty() {
                missing.push("recipient.id");
            }
            if message_id.is_empty() {
                missing.push("message.mid");
            }
            if !missing.is_empty() {
                warn!(
                    "[Messenger] dropping message event missing {}",
                    missing.join(", ")
                );
                continue;
            }

            out.push(ParsedMessage {
                sender_id,
                recipient_id,
                timestamp: event.timestamp,
                message_text: text,
                message_id,
            });
        }
    }

    if !out.is_empty() {
        info!("[Messenger] extracted {} inbound text message(s)", out.len());
    }

    out
}

// ===========================================================================
// Tests
// ===========================================================================
