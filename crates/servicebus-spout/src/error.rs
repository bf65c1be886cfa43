//! Spout error types.
//!
//! - `ConfigurationError`: a descriptor or config value that cannot be used
//! - `ConnectorError`: the single error type surfaced to the host pipeline

use std::fmt;

use thiserror::Error;

/// The kind of broker resource a descriptor names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A point-to-point queue.
    Queue,
    /// A publish/subscribe topic, consumed through a subscription.
    Topic,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Queue => write!(f, "queue"),
            ResourceKind::Topic => write!(f, "topic"),
        }
    }
}

/// Invalid configuration detected when a field is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The connection string has fewer than three `;`-delimited segments.
    #[error(
        "malformed connection string: expected at least 3 ';'-delimited segments, found {segments}"
    )]
    MalformedConnectionString {
        /// Number of non-trailing segments found.
        segments: usize,
    },

    /// The queue or topic name is absent or empty.
    #[error("missing resource name: {kind} name is empty")]
    MissingResourceName {
        /// Which resource name was missing.
        kind: ResourceKind,
    },

    /// A required configuration key is not set.
    #[error("missing required config: {0}")]
    MissingKey(String),

    /// A configuration value could not be parsed.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Parser message.
        message: String,
    },
}

/// Errors surfaced by the spout and by broker client implementations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The descriptor or spout configuration is unusable. Fatal: the
    /// configuration must be fixed and the spout rebuilt.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    /// The broker could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Receiving the next message failed.
    #[error("read error: {0}")]
    ReadError(String),

    /// Completing or abandoning a message failed.
    #[error("settlement failed: {0}")]
    SettlementFailed(String),

    /// The spout was used out of lifecycle order.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// The expected state.
        expected: String,
        /// The actual state.
        actual: String,
    },

    /// The spout has been closed.
    #[error("spout closed")]
    Closed,

    /// An internal error that doesn't fit other categories.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// Returns `true` for configuration failures, which are never retried.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, ConnectorError::InvalidConfiguration(_))
    }
}
