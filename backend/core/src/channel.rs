use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::message::Message;

/// Default channel buffer size for inter-component messaging.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// The message bus connecting channels, the dispatcher, and the notifier.
///
/// Each consumer gets a bounded mpsc pair: adapters push inbound messages to
/// the dispatcher, the dispatcher pushes owner alerts to the notifier.
/// Bounded channels give backpressure when a consumer falls behind.
pub struct PilotBus {
    pub dispatcher_tx: mpsc::Sender<Message>,
    pub dispatcher_rx: Option<mpsc::Receiver<Message>>,

    pub notifier_tx: mpsc::Sender<Message>,
    pub notifier_rx: Option<mpsc::Receiver<Message>>,
}

impl PilotBus {
    /// Create a new bus with default buffer sizes.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bus with a custom buffer size.
    pub fn with_buffer_size(buffer: usize) -> Self {
        let (dispatcher_tx, dispatcher_rx) = mpsc::channel(buffer);
        let (notifier_tx, notifier_rx) = mpsc::channel(buffer);

        info!(buffer_size = buffer, "PilotBus initialized");

        Self {
            dispatcher_tx,
            dispatcher_rx: Some(dispatcher_rx),
            notifier_tx,
            notifier_rx: Some(notifier_rx),
        }
    }

    /// Take the dispatcher receiver (can only be called once).
    pub fn take_dispatcher_rx(&mut self) -> Option<mpsc::Receiver<Message>> {
        debug!("Dispatcher receiver taken");
        self.dispatcher_rx.take()
    }

    /// Take the notifier receiver (can only be called once).
    pub fn take_notifier_rx(&mut self) -> Option<mpsc::Receiver<Message>> {
        debug!("Notifier receiver taken");
        self.notifier_rx.take()
    }
}

impl Default for PilotBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{InboundTextPayload, Message, ParsedMessage};

    fn inbound(text: &str) -> Message {
        Message::InboundText(InboundTextPayload {
            channel: "messenger".to_string(),
            message: ParsedMessage {
                sender_id: "U1".to_string(),
                recipient_id: "P1".to_string(),
                timestamp: 1000,
                message_text: text.to_string(),
                message_id: "m.1".to_string(),
            },
        })
    }

    #[tokio::test]
    async fn test_bus_send_receive() {
        let mut bus = PilotBus::new();
        let mut rx = bus.take_dispatcher_rx().unwrap();

        bus.dispatcher_tx.send(inbound("hi")).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind(), "inbound_text");
    }

    #[tokio::test]
    async fn test_bus_take_rx_once() {
        let mut bus = PilotBus::new();
        assert!(bus.take_notifier_rx().is_some());
        assert!(bus.take_notifier_rx().is_none()); // second take is None
    }

    #[tokio::test]
    async fn test_bus_backpressure() {
        let mut bus = PilotBus::with_buffer_size(2);
        let _rx = bus.take_dispatcher_rx().unwrap();

        // Fill the buffer
        for _ in 0..2 {
            bus.dispatcher_tx.send(inbound("fill")).await.unwrap();
        }

        // Third send should not complete immediately (buffer full)
        let result = bus.dispatcher_tx.try_send(inbound("overflow"));
        assert!(result.is_err());
    }
}
