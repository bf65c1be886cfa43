//! Service Bus queue and topic-subscription spouts.
//!
//! Both flavors share one state machine, [`ServiceBusSpout`]; they differ
//! only in the descriptor their [`BrokerClient`](crate::client::BrokerClient)
//! carries ([`QueueConnection`] or [`TopicConnection`]).
//!
//! # Features
//!
//! - Lazy, per-accessor validation of connection strings and resource names
//! - Subscription name defaulting to `<topic>sub`
//! - Reconnect attempt on every poll cycle, optionally throttled
//! - Exactly-once counting of emitted messages
//! - Peek-lock settlement through `ack` / `fail`
//! - Secret masking of connection strings in logs
//!
//! # Usage
//!
//! ```rust,ignore
//! use servicebus_spout::servicebus::{QueueConnection, ServiceBusSpout, SpoutConfig};
//!
//! let descriptor = QueueConnection::from_config(&connector_config);
//! let client = MySdkClient::new(descriptor);
//! let mut spout = ServiceBusSpout::for_queue(client, emitter);
//!
//! spout.open(&SpoutConfig::from_config(&connector_config)?).await?;
//! loop {
//!     spout.poll_once().await?;
//! }
//! ```

pub mod config;
pub mod connection;
pub mod metrics;
pub mod pending;
pub mod spout;

pub use config::SpoutConfig;
pub use connection::{ConnectionDescriptor, ConnectionString, QueueConnection, TopicConnection};
pub use metrics::SpoutMetrics;
pub use pending::PendingAcks;
pub use spout::{ConnectionState, PollOutcome, ServiceBusSpout};
