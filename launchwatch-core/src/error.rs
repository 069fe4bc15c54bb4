//! Error types shared across the scheduler.

/// An offset spec string failed the `(\d{1,5}[smhdw])+` grammar or is out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OffsetError {
    #[error(
        "invalid alert time '{0}': expected digits followed by a unit (s, m, h, d, w), e.g. 24h or 1d3h"
    )]
    InvalidOffsetFormat(String),

    #[error("alert time '{0}' is too far ahead of launch (at most 99999w)")]
    OffsetTooLarge(String),
}

/// Errors from the key-value substrate and the stores layered on it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Errors from reading or changing subscriber options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for {option}: {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    InvalidOffsets(#[from] OffsetError),

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("invalid subscriber: {0}")]
    InvalidSubscriber(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by an event source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Failure to deliver one alert. Logged by the scheduler, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("launch '{0}' is no longer available from the source")]
    LaunchNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("delivery failed: {0}")]
    Delivery(String),
}
