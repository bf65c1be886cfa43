//! Testing utilities for spout and client implementations.
//!
//! [`MockBrokerClient`] stands in for a broker SDK adapter. Its behaviour
//! is scripted, and its call history inspected, through a cloneable
//! [`MockClientHandle`] that stays with the test after the client has
//! been moved into a spout.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{BrokerClient, BrokerMessage, SettlementToken};
use crate::emitter::{Emitter, SpoutRecord};
use crate::error::ConnectorError;
use crate::servicebus::connection::{ConnectionDescriptor, QueueConnection, TopicConnection};

/// A connection string with three segments and a masked key.
pub const MOCK_CONNECTION_STRING: &str =
    "Endpoint=sb://mock.servicebus.windows.net/;SharedAccessKeyName=mock;SharedAccessKey=bW9jaw==";

#[derive(Debug, Default)]
struct MockState {
    reachable: bool,
    fail_connect: bool,
    fail_settlement: bool,
    fail_disconnect: bool,
    receive_errors: usize,
    connected: bool,
    messages: VecDeque<BrokerMessage>,
    connect_calls: usize,
    is_connected_calls: usize,
    receive_calls: usize,
    disconnect_calls: usize,
    completed: Vec<SettlementToken>,
    abandoned: Vec<SettlementToken>,
}

/// Shared control and inspection handle for a [`MockBrokerClient`].
#[derive(Debug, Clone, Default)]
pub struct MockClientHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockClientHandle {
    /// Controls whether the next `connect()` yields a live connection.
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// Makes `connect()` return `ConnectionFailed` while set.
    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    /// Makes `complete()` and `abandon()` return `SettlementFailed` while set.
    pub fn set_fail_settlement(&self, fail: bool) {
        self.state.lock().fail_settlement = fail;
    }

    /// Makes `disconnect()` return `ConnectionFailed` while set.
    pub fn set_fail_disconnect(&self, fail: bool) {
        self.state.lock().fail_disconnect = fail;
    }

    /// Makes the next receive fail and drop the connection.
    pub fn fail_next_receive(&self) {
        self.state.lock().receive_errors += 1;
    }

    /// Queues a message for delivery.
    pub fn push_message(&self, message: BrokerMessage) {
        self.state.lock().messages.push_back(message);
    }

    /// Number of messages not yet received.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.state.lock().messages.len()
    }

    /// Number of `connect()` calls.
    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }

    /// Number of `is_connected()` calls.
    #[must_use]
    pub fn is_connected_calls(&self) -> usize {
        self.state.lock().is_connected_calls
    }

    /// Number of `next_message()` calls.
    #[must_use]
    pub fn receive_calls(&self) -> usize {
        self.state.lock().receive_calls
    }

    /// Number of `disconnect()` calls.
    #[must_use]
    pub fn disconnect_calls(&self) -> usize {
        self.state.lock().disconnect_calls
    }

    /// Tokens successfully passed to `complete()`, in call order.
    #[must_use]
    pub fn completed(&self) -> Vec<SettlementToken> {
        self.state.lock().completed.clone()
    }

    /// Tokens successfully passed to `abandon()`, in call order.
    #[must_use]
    pub fn abandoned(&self) -> Vec<SettlementToken> {
        self.state.lock().abandoned.clone()
    }
}

/// Scripted [`BrokerClient`] for tests.
///
/// `connect()` succeeds and connects iff the handle marks the broker
/// reachable; `next_message()` pops from the handle's queue.
#[derive(Debug)]
pub struct MockBrokerClient<D> {
    descriptor: D,
    handle: MockClientHandle,
}

impl<D: ConnectionDescriptor> MockBrokerClient<D> {
    /// Creates an unreachable mock client for the given descriptor.
    #[must_use]
    pub fn new(descriptor: D) -> Self {
        Self {
            descriptor,
            handle: MockClientHandle::default(),
        }
    }

    /// Returns a handle sharing this client's state.
    #[must_use]
    pub fn handle(&self) -> MockClientHandle {
        self.handle.clone()
    }
}

/// Creates a mock queue client and its handle.
#[must_use]
pub fn mock_queue_client(
    connection_string: &str,
    queue_name: Option<&str>,
) -> (MockBrokerClient<QueueConnection>, MockClientHandle) {
    let client = MockBrokerClient::new(QueueConnection::new(connection_string, queue_name));
    let handle = client.handle();
    (client, handle)
}

/// Creates a mock topic client and its handle.
#[must_use]
pub fn mock_topic_client(
    connection_string: &str,
    topic_name: Option<&str>,
    subscription_name: Option<&str>,
) -> (MockBrokerClient<TopicConnection>, MockClientHandle) {
    let client = MockBrokerClient::new(TopicConnection::new(
        connection_string,
        topic_name,
        subscription_name,
    ));
    let handle = client.handle();
    (client, handle)
}

#[async_trait]
impl<D: ConnectionDescriptor> BrokerClient for MockBrokerClient<D> {
    type Descriptor = D;

    fn descriptor(&self) -> &D {
        &self.descriptor
    }

    async fn connect(&mut self) -> Result<(), ConnectorError> {
        let mut state = self.handle.state.lock();
        state.connect_calls += 1;
        if state.fail_connect {
            state.connected = false;
            return Err(ConnectorError::ConnectionFailed(
                "mock broker refused connection".into(),
            ));
        }
        state.connected = state.reachable;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        let mut state = self.handle.state.lock();
        state.is_connected_calls += 1;
        state.connected
    }

    async fn next_message(&mut self) -> Result<Option<BrokerMessage>, ConnectorError> {
        let mut state = self.handle.state.lock();
        state.receive_calls += 1;
        if state.receive_errors > 0 {
            state.receive_errors -= 1;
            state.connected = false;
            return Err(ConnectorError::ReadError("mock link detached".into()));
        }
        if !state.connected {
            return Err(ConnectorError::ReadError("not connected".into()));
        }
        Ok(state.messages.pop_front())
    }

    async fn complete(&mut self, token: &SettlementToken) -> Result<(), ConnectorError> {
        let mut state = self.handle.state.lock();
        if state.fail_settlement {
            return Err(ConnectorError::SettlementFailed(format!(
                "mock lock lost for {token}"
            )));
        }
        state.completed.push(token.clone());
        Ok(())
    }

    async fn abandon(&mut self, token: &SettlementToken) -> Result<(), ConnectorError> {
        let mut state = self.handle.state.lock();
        if state.fail_settlement {
            return Err(ConnectorError::SettlementFailed(format!(
                "mock lock lost for {token}"
            )));
        }
        state.abandoned.push(token.clone());
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ConnectorError> {
        let mut state = self.handle.state.lock();
        state.disconnect_calls += 1;
        state.connected = false;
        if state.fail_disconnect {
            return Err(ConnectorError::ConnectionFailed(
                "mock link refused to detach".into(),
            ));
        }
        Ok(())
    }
}

/// Emitter that stores every record for inspection.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectingEmitter {
    records: Arc<Mutex<Vec<SpoutRecord>>>,
}

impl CollectingEmitter {
    /// Creates an empty emitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all emitted records.
    #[must_use]
    pub fn records(&self) -> Vec<SpoutRecord> {
        self.records.lock().clone()
    }

    /// Number of emitted records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing has been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Emitter for CollectingEmitter {
    fn emit(&mut self, record: SpoutRecord) {
        self.records.lock().push(record);
    }
}
