/// Messenger channel adapter for PagePilot.
///
/// Receives Messenger Platform webhooks for a connected Facebook Page and
/// forwards normalized inbound messages to the dispatcher.
///
/// Required env vars (see `pagepilot-cli`):
///   MESSENGER_APP_SECRET   — used to verify X-Hub-Signature-256 HMAC
///   MESSENGER_VERIFY_TOKEN — echoed during webhook subscription setup
///   MESSENGER_WEBHOOK_PATH — path to mount the webhook (default: /webhooks/messenger)
use crate::ChannelAdapter;
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use pagepilot_core::{InboundTextPayload, Message};

use crate::messenger_receive::{extract_text_messages, verify_signature};

/// Signature header the platform sends with every POST delivery.
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MessengerConfig {
    /// App secret for webhook signature verification. Verification fails
    /// closed when unset.
    pub app_secret: Option<String>,
    /// Token echoed back during webhook subscription verification.
    pub verify_token: String,
    pub webhook_path: String,
}

// ---------------------------------------------------------------------------
// Axum state
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    config: MessengerConfig,
    dispatcher_tx: mpsc::Sender<Message>,
}

/// Webhook subscription verification request.
/// The platform sends: GET {path}?hub.mode=subscribe&hub.verify_token=TOKEN&hub.challenge=CHALLENGE
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// ---------------------------------------------------------------------------
// Adapter struct
// ---------------------------------------------------------------------------

pub struct MessengerAdapter {
    config: MessengerConfig,
    dispatcher_tx: mpsc::Sender<Message>,
}

impl MessengerAdapter {
    pub fn new(config: MessengerConfig, dispatcher_tx: mpsc::Sender<Message>) -> Self {
        Self {
            config,
            dispatcher_tx,
        }
    }
}

#[async_trait]
impl ChannelAdapter for MessengerAdapter {
    fn name(&self) -> &str {
        "messenger"
    }

    fn build_router(&self) -> Router {
        let state = AppState {
            config: self.config.clone(),
            dispatcher_tx: self.dispatcher_tx.clone(),
        };
        Router::new()
            .route(
                &self.config.webhook_path,
                get(verify_webhook).post(receive_webhook),
            )
            .with_state(state)
    }

    async fn start(&self, _dispatcher_tx: mpsc::Sender<Message>) -> Result<()> {
        info!("[Messenger] Adapter ready at {}", self.config.webhook_path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Webhook handlers
// ---------------------------------------------------------------------------

/// Decide the response to a webhook subscription verification request.
/// Returns the challenge to echo when the request is a valid subscribe
/// attempt carrying the expected token.
fn challenge_response(params: &VerifyParams, expected_token: &str) -> Option<String> {
    if params.mode.as_deref() != Some("subscribe") {
        return None;
    }
    if expected_token.is_empty() || params.verify_token.as_deref() != Some(expected_token) {
        return None;
    }
    params.challenge.clone()
}

async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    match challenge_response(&params, &state.config.verify_token) {
        Some(challenge) => {
            info!("[Messenger] webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            warn!("[Messenger] webhook subscription verification failed");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    // Authenticate before parsing anything. The response stays generic so a
    // forger learns nothing about why it was rejected.
    if !verify_signature(state.config.app_secret.as_deref(), &body, signature) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            warn!("[Messenger] webhook body is not valid JSON: {err}");
            return StatusCode::OK.into_response();
        }
    };

    for message in extract_text_messages(payload) {
        let inbound = InboundTextPayload {
            channel: "messenger".to_string(),
            message,
        };
        if state
            .dispatcher_tx
            .send(Message::InboundText(inbound))
            .await
            .is_err()
        {
            warn!("[Messenger] dispatcher channel closed, dropping inbound message");
            break;
        }
    }

    StatusCode::OK.into_response()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mode: Option<&str>, token: Option<&str>, challenge: Option<&str>) -> VerifyParams {
        VerifyParams {
            mode: mode.map(String::from),
            verify_token: token.map(String::from),
            challenge: challenge.map(String::from),
        }
    }

    #[test]
    fn test_verification_valid() {
        let p = params(Some("subscribe"), Some("verify-secret"), Some("c123"));
        assert_eq!(
            challenge_response(&p, "verify-secret"),
            Some("c123".to_string())
        );
    }

    #[test]
    fn test_verification_wrong_token() {
        let p = params(Some("subscribe"), Some("wrong"), Some("c123"));
        assert!(challenge_response(&p, "verify-secret").is_none());
    }

    #[test]
    fn test_verification_wrong_mode() {
        let p = params(Some("unsubscribe"), Some("verify-secret"), Some("c123"));
        assert!(challenge_response(&p, "verify-secret").is_none());
    }

    #[test]
    fn test_verification_missing_mode() {
        let p = params(None, Some("verify-secret"), Some("c123"));
        assert!(challenge_response(&p, "verify-secret").is_none());
    }

    #[test]
    fn test_verification_missing_challenge() {
        let p = params(Some("subscribe"), Some("verify-secret"), None);
        assert!(challenge_response(&p, "verify-secret").is_none());
    }

    #[test]
    fn test_verification_empty_expected_token() {
        // An unset token must never verify, even against an empty supplied one.
        let p = params(Some("subscribe"), Some(""), Some("c123"));
        assert!(challenge_response(&p, "").is_none());
    }

    #[test]
    fn test_verify_params_field_renames() {
        let p: VerifyParams = serde_json::from_str(
            r#"{"hub.mode":"subscribe","hub.verify_token":"t","hub.challenge":"c"}"#,
        )
        .unwrap();
        assert_eq!(p.mode.as_deref(), Some("subscribe"));
        assert_eq!(p.verify_token.as_deref(), Some("t"));
        assert_eq!(p.challenge.as_deref(), Some("c"));
    }
}
