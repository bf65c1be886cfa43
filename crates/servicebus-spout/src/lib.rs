//! # Service Bus Spout
//!
//! Bridges a cloud message broker resource (a queue, or a topic
//! subscription) into a stream-processing pipeline that is driven by an
//! external polling scheduler.
//!
//! ## Building blocks
//!
//! - [`servicebus::connection`] - Lazily validated connection descriptors
//! - [`client`] - The `BrokerClient` capability the spout drives
//! - [`emitter`] - The pipeline-side sink that receives emitted records
//! - [`servicebus::spout`] - The polling state machine
//! - [`testing`] - Mock broker client and collecting emitter
//!
//! ## Data flow
//!
//! ```text
//! ConnectorConfig ──▶ QueueConnection / TopicConnection   (validated on use)
//!                              │
//!                         BrokerClient
//!                              │
//!   scheduler ──▶ ServiceBusSpout::poll_once() ──▶ Emitter::emit(payload, id)
//!                              │
//!                 ack(id) / fail(id) ──▶ complete / abandon
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unreadable_literal, unused_mut))]

/// Error types for configuration and broker operations.
pub mod error;

/// Key-value connector configuration.
pub mod config;

/// Broker client capability trait.
pub mod client;

/// Record emission into the host pipeline.
pub mod emitter;

/// Health status reported by the spout.
pub mod health;

/// Metrics snapshot types.
pub mod metrics;

/// Service Bus queue and topic-subscription spouts.
pub mod servicebus;

/// Testing utilities (mock broker client, collecting emitter).
pub mod testing;

pub use client::{BrokerClient, BrokerMessage, SettlementToken};
pub use config::ConnectorConfig;
pub use emitter::{Emitter, MessageId, SpoutRecord};
pub use error::{ConfigurationError, ConnectorError, ResourceKind};
pub use health::HealthStatus;
pub use metrics::ConnectorMetrics;
pub use servicebus::{
    ConnectionDescriptor, ConnectionState, ConnectionString, PollOutcome, QueueConnection,
    ServiceBusSpout, SpoutConfig, TopicConnection,
};
