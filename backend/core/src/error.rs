use thiserror::Error;

/// Top-level error type for the PagePilot runtime.
#[derive(Debug, Error)]
pub enum PilotError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("channel error: {0}")]
    ChannelError(String),

    #[error("notification error: {0}")]
    NotifyError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
