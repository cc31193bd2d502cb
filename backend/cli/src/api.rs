use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use pagepilot_channels::MessengerSender;

/// Shared application state for API handlers.
pub struct AppState {
    /// Present when a page access token is configured.
    pub messenger_sender: Option<MessengerSender>,
    /// Bearer token guarding the operator API. Unset disables it.
    pub admin_token: Option<String>,
    pub messenger_enabled: bool,
    pub telegram_enabled: bool,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>, channel_router: Option<Router>) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/messages/send", post(send_message))
        .with_state(state);

    if let Some(router) = channel_router {
        app = app.merge(router);
    }

    app
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pagepilot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Feature summary for the control panel.
async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "messenger": state.messenger_enabled,
        "replies": state.messenger_sender.is_some(),
        "owner_alerts": state.telegram_enabled,
    }))
}

#[derive(serde::Deserialize)]
struct SendMessageBody {
    recipient_id: String,
    text: String,
}

/// POST /api/messages/send — operator intervention: push a manual reply
/// into a customer conversation.
async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SendMessageBody>,
) -> impl IntoResponse {
    if let Some(err) = admin_auth_error(state.admin_token.as_deref(), &headers) {
        return err;
    }

    let Some(sender) = state.messenger_sender.as_ref() else {
        let err = json!({"error": "Messenger page token not configured"});
        return (StatusCode::SERVICE_UNAVAILABLE, Json(err));
    };

    let recipient = body.recipient_id.trim();
    let text = body.text.trim();
    if recipient.is_empty() || text.is_empty() {
        let err = json!({"error": "recipient_id and text are required"});
        return (StatusCode::BAD_REQUEST, Json(err));
    }

    match sender.send_text(recipient, text).await {
        Ok(()) => {
            info!("Operator reply sent to {}", recipient);
            (StatusCode::OK, Json(json!({"ok": true})))
        }
        Err(e) => {
            warn!("Operator reply failed: {e}");
            (StatusCode::BAD_GATEWAY, Json(json!({"error": e.to_string()})))
        }
    }
}

/// Check the operator bearer token. The endpoint is disabled entirely when
/// no token is configured.
fn admin_auth_error(
    admin_token: Option<&str>,
    headers: &HeaderMap,
) -> Option<(StatusCode, Json<Value>)> {
    let Some(expected) = admin_token else {
        let err = json!({"error": "operator API disabled — set PAGEPILOT_ADMIN_TOKEN"});
        return Some((StatusCode::SERVICE_UNAVAILABLE, Json(err)));
    };
    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");
    if supplied == expected {
        return None;
    }
    warn!("Operator API: rejected request with missing or invalid bearer token");
    Some((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "invalid bearer token"})),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_auth_disabled_without_token() {
        let result = admin_auth_error(None, &bearer("anything"));
        let (status, _) = result.unwrap();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_auth_accepts_matching_token() {
        assert!(admin_auth_error(Some("secret"), &bearer("secret")).is_none());
    }

    #[test]
    fn test_auth_rejects_wrong_token() {
        let (status, _) = admin_auth_error(Some("secret"), &bearer("wrong")).unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_auth_rejects_missing_header() {
        let (status, _) = admin_auth_error(Some("secret"), &HeaderMap::new()).unwrap();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
