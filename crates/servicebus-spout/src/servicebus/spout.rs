//! Service Bus polling spout.
//!
//! [`ServiceBusSpout`] owns one [`BrokerClient`] and one [`Emitter`]. The
//! host scheduler calls [`poll_once`](ServiceBusSpout::poll_once)
//! repeatedly on a single task; each cycle delivers at most one message.
//!
//! # Lifecycle
//!
//! 1. Create with [`ServiceBusSpout::for_queue`] / [`ServiceBusSpout::for_topic`]
//!    (or [`ServiceBusSpout::new`] for any client)
//! 2. `open()` - validate the descriptor and make the first connect attempt
//! 3. `poll_once()` in a loop - reconnect if needed, then fetch and emit
//! 4. `ack()` / `fail()` - settle emitted messages
//! 5. `close()` - abandon unsettled messages and disconnect
//!
//! Connectivity problems never surface as errors. They leave the spout
//! [`ConnectionState::Disconnected`] and the next cycle tries again.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::client::{BrokerClient, SettlementToken};
use crate::emitter::{Emitter, MessageId, SpoutRecord};
use crate::error::{ConfigurationError, ConnectorError};
use crate::health::HealthStatus;
use crate::metrics::ConnectorMetrics;

use super::config::SpoutConfig;
use super::connection::{ConnectionDescriptor, ConnectionString, QueueConnection, TopicConnection};
use super::metrics::SpoutMetrics;
use super::pending::PendingAcks;

/// Broker connectivity as last observed by the spout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No usable connection; the next poll cycle attempts to reconnect.
    #[default]
    Disconnected,
    /// Connected to a named resource; poll cycles fetch messages.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Open,
    Closed,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Created => write!(f, "created"),
            Lifecycle::Open => write!(f, "open"),
            Lifecycle::Closed => write!(f, "closed"),
        }
    }
}

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// One message was emitted under this id.
    Emitted(MessageId),
    /// Connected, but the broker had nothing to deliver.
    Empty,
    /// Not connected; nothing was fetched.
    Disconnected,
}

impl PollOutcome {
    /// Returns the emitted message id, if any.
    #[must_use]
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            PollOutcome::Emitted(id) => Some(*id),
            PollOutcome::Empty | PollOutcome::Disconnected => None,
        }
    }
}

/// Polls a queue or topic subscription and feeds messages to an emitter.
pub struct ServiceBusSpout<C, E> {
    client: C,
    emitter: E,
    config: SpoutConfig,
    lifecycle: Lifecycle,
    state: ConnectionState,
    /// Entity path of the resource; `None` when no name is configured.
    entity: Option<String>,
    processed: u64,
    pending: PendingAcks,
    metrics: SpoutMetrics,
    last_connect_attempt: Option<Instant>,
}

impl<C, E> ServiceBusSpout<C, E>
where
    C: BrokerClient<Descriptor = QueueConnection>,
    E: Emitter,
{
    /// Creates a spout reading from a queue.
    #[must_use]
    pub fn for_queue(client: C, emitter: E) -> Self {
        Self::new(client, emitter)
    }
}

impl<C, E> ServiceBusSpout<C, E>
where
    C: BrokerClient<Descriptor = TopicConnection>,
    E: Emitter,
{
    /// Creates a spout reading from a topic subscription.
    #[must_use]
    pub fn for_topic(client: C, emitter: E) -> Self {
        Self::new(client, emitter)
    }
}

impl<C: BrokerClient, E: Emitter> ServiceBusSpout<C, E> {
    /// Creates a spout around an injected client. No I/O happens until `open`.
    #[must_use]
    pub fn new(client: C, emitter: E) -> Self {
        Self {
            client,
            emitter,
            config: SpoutConfig::default(),
            lifecycle: Lifecycle::Created,
            state: ConnectionState::Disconnected,
            entity: None,
            processed: 0,
            pending: PendingAcks::new(),
            metrics: SpoutMetrics::new(),
            last_connect_attempt: None,
        }
    }

    /// Validates the descriptor and makes one connect attempt.
    ///
    /// The connection string must be well formed. A missing resource name
    /// is fatal only when `config.require_resource_name` is set; otherwise
    /// the spout opens but stays disconnected. In every non-fatal case the
    /// client sees exactly one `connect()` followed by one `is_connected()`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::InvalidConfiguration` for an unusable
    /// descriptor, or `ConnectorError::Closed` after `close()`.
    pub async fn open(&mut self, config: &SpoutConfig) -> Result<(), ConnectorError> {
        if self.lifecycle == Lifecycle::Closed {
            return Err(ConnectorError::Closed);
        }
        self.config = config.clone();

        let descriptor = self.client.descriptor();
        let kind = descriptor.kind();
        let connection = ConnectionString::new(descriptor.connection_string()?);
        let entity = match descriptor.entity_path() {
            Ok(path) => Some(path),
            Err(err @ ConfigurationError::MissingResourceName { .. }) => {
                if self.config.require_resource_name {
                    return Err(err.into());
                }
                warn!(%kind, "no {kind} name configured; spout will stay disconnected");
                None
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            %kind,
            entity = entity.as_deref().unwrap_or("<none>"),
            connection = %connection,
            reconnect_interval_ms = u64::try_from(self.config.reconnect_interval.as_millis())
                .unwrap_or(u64::MAX),
            "opening Service Bus spout"
        );

        self.entity = entity;
        self.lifecycle = Lifecycle::Open;
        self.state = ConnectionState::Disconnected;
        self.attempt_connect().await;
        Ok(())
    }

    /// Runs one poll cycle.
    ///
    /// While disconnected, the cycle is a reconnect attempt (subject to
    /// `reconnect_interval`) and fetches only if that attempt succeeds.
    /// Without a resource name the client is not touched at all.
    /// While connected, it fetches directly. At most one message is
    /// emitted and the processed count grows by exactly one when it is.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::InvalidState` before `open()` and
    /// `ConnectorError::Closed` after `close()`. Broker failures are not
    /// errors.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, ConnectorError> {
        self.ensure_open()?;

        if self.state == ConnectionState::Disconnected {
            if self.entity.is_none() || !self.reconnect_due() {
                return Ok(PollOutcome::Disconnected);
            }
            self.attempt_connect().await;
            if self.state == ConnectionState::Disconnected {
                return Ok(PollOutcome::Disconnected);
            }
        }

        let message = match self.client.next_message().await {
            Ok(Some(message)) => message,
            Ok(None) => {
                self.metrics.record_empty_poll();
                return Ok(PollOutcome::Empty);
            }
            Err(e) => {
                self.metrics.record_error();
                warn!(error = %e, entity = self.entity_label(), "receive failed; marking disconnected");
                self.set_state(ConnectionState::Disconnected);
                return Ok(PollOutcome::Disconnected);
            }
        };

        if message.is_empty() {
            self.metrics.record_empty_poll();
            debug!(broker_id = ?message.broker_id, "discarding message with empty body");
            if let Some(token) = &message.settlement {
                if let Err(e) = self.client.complete(token).await {
                    self.metrics.record_error();
                    warn!(error = %e, "failed to complete empty message");
                }
            }
            return Ok(PollOutcome::Empty);
        }

        let id = MessageId::new();
        let bytes = message.body.len() as u64;
        if let Some(token) = message.settlement {
            self.pending.insert(id, token);
        }
        self.emitter.emit(SpoutRecord {
            payload: message.body,
            message_id: id,
        });
        self.processed += 1;
        self.metrics.record_emit(bytes);

        debug!(
            message_id = %id,
            broker_id = ?message.broker_id,
            bytes,
            processed = self.processed,
            "emitted message"
        );
        Ok(PollOutcome::Emitted(id))
    }

    /// Completes a previously emitted message on the broker.
    ///
    /// Returns `false` if the id is not pending (unknown, already settled,
    /// or emitted without a lock token).
    pub async fn ack(&mut self, id: &MessageId) -> bool {
        let Some(token) = self.pending.take(id) else {
            debug!(message_id = %id, "ack for message that is not pending");
            return false;
        };
        match self.client.complete(&token).await {
            Ok(()) => self.metrics.record_ack(),
            Err(e) => {
                self.metrics.record_error();
                warn!(message_id = %id, error = %e, "failed to complete message");
            }
        }
        true
    }

    /// Abandons a previously emitted message so the broker redelivers it.
    ///
    /// Returns `false` if the id is not pending.
    pub async fn fail(&mut self, id: &MessageId) -> bool {
        let Some(token) = self.pending.take(id) else {
            debug!(message_id = %id, "fail for message that is not pending");
            return false;
        };
        if self.abandon(&token).await {
            self.metrics.record_fail();
        }
        true
    }

    /// Abandons unsettled messages, disconnects, and closes the spout.
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the client's error if `disconnect()` fails. The spout is
    /// closed either way.
    pub async fn close(&mut self) -> Result<(), ConnectorError> {
        if self.lifecycle == Lifecycle::Closed {
            return Ok(());
        }
        info!(
            entity = self.entity_label(),
            processed = self.processed,
            pending = self.pending.len(),
            "closing Service Bus spout"
        );

        for token in self.pending.drain_tokens() {
            self.abandon(&token).await;
        }

        let result = self.client.disconnect().await;
        self.state = ConnectionState::Disconnected;
        self.lifecycle = Lifecycle::Closed;
        result
    }

    /// Returns `true` if the last observation found the broker connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of messages emitted since creation.
    #[must_use]
    pub fn processed_message_count(&self) -> u64 {
        self.processed
    }

    /// Number of emitted messages awaiting ack or fail.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &SpoutConfig {
        &self.config
    }

    /// Returns the spout's health.
    #[must_use]
    pub fn health_check(&self) -> HealthStatus {
        match (self.lifecycle, self.state) {
            (Lifecycle::Created, _) => HealthStatus::Unknown,
            (Lifecycle::Open, ConnectionState::Connected) => HealthStatus::Healthy,
            (Lifecycle::Open, ConnectionState::Disconnected) => match self.entity {
                Some(_) => HealthStatus::Degraded("broker unreachable".into()),
                None => HealthStatus::Degraded("no resource name configured".into()),
            },
            (Lifecycle::Closed, _) => HealthStatus::Unhealthy("closed".into()),
        }
    }

    /// Returns current metrics.
    #[must_use]
    pub fn metrics(&self) -> ConnectorMetrics {
        self.metrics
            .to_connector_metrics(self.pending.len() as u64, self.pending.oldest_age())
    }

    fn ensure_open(&self) -> Result<(), ConnectorError> {
        match self.lifecycle {
            Lifecycle::Open => Ok(()),
            Lifecycle::Closed => Err(ConnectorError::Closed),
            Lifecycle::Created => Err(ConnectorError::InvalidState {
                expected: Lifecycle::Open.to_string(),
                actual: self.lifecycle.to_string(),
            }),
        }
    }

    fn reconnect_due(&self) -> bool {
        let interval = self.config.reconnect_interval;
        interval.is_zero()
            || self
                .last_connect_attempt
                .map_or(true, |at| at.elapsed() >= interval)
    }

    /// One `connect()` then one `is_connected()`. Connected only when the
    /// client says so and a resource name is configured.
    async fn attempt_connect(&mut self) {
        self.last_connect_attempt = Some(Instant::now());
        self.metrics.record_connect_attempt();

        if let Err(e) = self.client.connect().await {
            self.metrics.record_error();
            warn!(error = %e, entity = self.entity_label(), "connect attempt failed");
        }

        let reachable = self.client.is_connected();
        let next = if reachable && self.entity.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        self.set_state(next);
    }

    async fn abandon(&mut self, token: &SettlementToken) -> bool {
        match self.client.abandon(token).await {
            Ok(()) => true,
            Err(e) => {
                self.metrics.record_error();
                warn!(error = %e, "failed to abandon message");
                false
            }
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        if next != self.state {
            info!(entity = self.entity_label(), from = %self.state, to = %next, "connection state changed");
        }
        self.state = next;
    }

    fn entity_label(&self) -> &str {
        self.entity.as_deref().unwrap_or("<none>")
    }
}

impl<C: BrokerClient, E> fmt::Debug for ServiceBusSpout<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBusSpout")
            .field("descriptor", self.client.descriptor())
            .field("lifecycle", &self.lifecycle)
            .field("state", &self.state)
            .field("processed", &self.processed)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
