use async_trait::async_trait;
use pagepilot_core::Message;
use tokio::sync::mpsc;

pub mod messenger;
pub mod messenger_receive;
pub mod messenger_send;
pub mod telegram_notify;

pub use messenger::{MessengerAdapter, MessengerConfig};
pub use messenger_receive::{extract_text_messages, verify_signature};
pub use messenger_send::MessengerSender;
pub use telegram_notify::TelegramNotifier;

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Build an optional Axum sub-router for inbound webhook endpoints.
    /// Adapters that use polling/long-connections return an empty router.
    fn build_router(&self) -> axum::Router {
        axum::Router::new()
    }

    /// Start the adapter's background work, if any.
    async fn start(&self, dispatcher_tx: mpsc::Sender<Message>) -> anyhow::Result<()>;
}
