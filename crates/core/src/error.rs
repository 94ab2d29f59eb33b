//! Error types for the smsfwd domain.
//!
//! Each external collaborator has its own error enum; callers match on the
//! one they talk to.

use thiserror::Error;

/// Failures talking to a modem (fetch or delete).
#[derive(Debug, Clone, Error)]
pub enum ModemError {
    #[error("Modem command failed on {port}: {reason}")]
    CommandFailed { port: String, reason: String },

    #[error("Modem {port} returned an empty feed")]
    EmptyFeed { port: String },

    #[error("Failed to delete message {index} on {port}: {reason}")]
    DeleteFailed {
        port: String,
        index: i64,
        reason: String,
    },

    #[error("Modem {operation} on {port} timed out after {timeout_secs}s")]
    Timeout {
        port: String,
        operation: &'static str,
        timeout_secs: u64,
    },

    #[error("Operation not supported by {port}: {operation}")]
    Unsupported {
        port: String,
        operation: &'static str,
    },
}

/// The raw feed could not be turned into message records.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("Malformed feed: {0}")]
    Malformed(String),

    #[error("Feed has no `msg` list")]
    MissingMessageList,

    #[error("Feed `msg` field is not a list")]
    MessageListNotArray,
}

/// Failures delivering one message through one forwarder.
#[derive(Debug, Clone, Error)]
pub enum ForwardError {
    #[error("Unsupported forwarder type: {0}")]
    UnsupportedType(String),

    #[error("Invalid config for {forwarder}: {reason}")]
    InvalidConfig { forwarder: String, reason: String },

    #[error("Delivery via {forwarder} failed: {reason}")]
    DeliveryFailed { forwarder: String, reason: String },

    #[error("Forwarder {forwarder} timed out after {timeout_secs}s")]
    Timeout { forwarder: String, timeout_secs: u64 },
}

impl ForwardError {
    pub fn delivery(forwarder: impl Into<String>, reason: impl ToString) -> Self {
        Self::DeliveryFailed {
            forwarder: forwarder.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_config(forwarder: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            forwarder: forwarder.into(),
            reason: reason.into(),
        }
    }
}
