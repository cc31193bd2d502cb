pub mod channel;
pub mod error;
pub mod message;

pub use channel::PilotBus;
pub use error::PilotError;
pub use message::{InboundTextPayload, Message, OwnerAlertPayload, ParsedMessage};
