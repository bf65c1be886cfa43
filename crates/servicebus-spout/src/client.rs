//! Broker client capability.
//!
//! The spout never speaks the broker protocol itself. It sequences calls on
//! a [`BrokerClient`] that an SDK adapter (or a test double) provides.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ConnectorError;
use crate::servicebus::connection::ConnectionDescriptor;

/// Opaque handle used to settle a peek-locked message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettlementToken(String);

impl SettlementToken {
    /// Wraps a broker-issued lock token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettlementToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message fetched from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Message body, passed to the emitter untouched.
    pub body: Bytes,

    /// Broker-assigned message id, if the broker exposes one.
    pub broker_id: Option<String>,

    /// Lock token for peek-lock receive mode. `None` in receive-and-delete mode.
    pub settlement: Option<SettlementToken>,
}

impl BrokerMessage {
    /// Creates a receive-and-delete message with the given body.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            broker_id: None,
            settlement: None,
        }
    }

    /// Attaches a broker-assigned message id.
    #[must_use]
    pub fn with_broker_id(mut self, id: impl Into<String>) -> Self {
        self.broker_id = Some(id.into());
        self
    }

    /// Attaches a peek-lock settlement token.
    #[must_use]
    pub fn with_settlement(mut self, token: SettlementToken) -> Self {
        self.settlement = Some(token);
        self
    }

    /// Returns `true` if the body carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// The narrow set of operations the spout needs from a broker SDK.
///
/// # Lifecycle
///
/// 1. `connect()` then `is_connected()` - on open and on every reconnect attempt
/// 2. `next_message()` - once per poll cycle while connected
/// 3. `complete()` / `abandon()` - when the pipeline acks or fails a message
/// 4. `disconnect()` - on close
#[async_trait]
pub trait BrokerClient: Send {
    /// The descriptor variant this client was built from.
    type Descriptor: ConnectionDescriptor;

    /// Returns the descriptor naming the resource this client reads from.
    fn descriptor(&self) -> &Self::Descriptor;

    /// Attempts to establish a connection to the resource.
    ///
    /// Success is judged by [`is_connected`](Self::is_connected), not by
    /// the return value.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::ConnectionFailed` if the attempt fails.
    async fn connect(&mut self) -> Result<(), ConnectorError>;

    /// Reports whether the client currently holds a usable connection.
    fn is_connected(&self) -> bool;

    /// Fetches the next available message without waiting for one.
    ///
    /// Returns `Ok(None)` when the resource is currently empty.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::ReadError` if the receive fails.
    async fn next_message(&mut self) -> Result<Option<BrokerMessage>, ConnectorError>;

    /// Completes a peek-locked message, removing it from the resource.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::SettlementFailed` if the broker rejects it.
    async fn complete(&mut self, _token: &SettlementToken) -> Result<(), ConnectorError> {
        Ok(())
    }

    /// Abandons a peek-locked message so the broker redelivers it.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::SettlementFailed` if the broker rejects it.
    async fn abandon(&mut self, _token: &SettlementToken) -> Result<(), ConnectorError> {
        Ok(())
    }

    /// Releases the connection.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError` if cleanup fails.
    async fn disconnect(&mut self) -> Result<(), ConnectorError> {
        Ok(())
    }
}
