//! Service Bus spout configuration.
//!
//! Descriptor builders read their keys leniently: a missing key becomes an
//! empty field and surfaces as a `ConfigurationError` only when the field
//! is accessed. [`SpoutConfig`] fails eagerly on unparsable values.

use std::time::Duration;

use crate::config::ConnectorConfig;
use crate::error::ConfigurationError;

use super::connection::{QueueConnection, TopicConnection};

/// Broker connection string.
pub const CONNECTION_STRING_KEY: &str = "connection.string";
/// Queue to receive from.
pub const QUEUE_NAME_KEY: &str = "queue.name";
/// Topic to receive from.
pub const TOPIC_NAME_KEY: &str = "topic.name";
/// Subscription under the topic; defaults to `<topic>sub`.
pub const SUBSCRIPTION_NAME_KEY: &str = "subscription.name";
/// Minimum delay between reconnect attempts, in milliseconds.
pub const RECONNECT_INTERVAL_KEY: &str = "reconnect.interval.ms";
/// Whether a missing resource name fails `open`.
pub const REQUIRE_RESOURCE_NAME_KEY: &str = "require.resource.name";

/// Behavioural settings for a [`ServiceBusSpout`](super::ServiceBusSpout).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpoutConfig {
    /// Minimum time between reconnect attempts while disconnected.
    ///
    /// Zero retries on every poll cycle. A non-zero interval skips
    /// attempts that come too soon; the spout never sleeps.
    pub reconnect_interval: Duration,

    /// Treat a missing queue/topic name at `open` as a fatal configuration
    /// error instead of staying disconnected.
    pub require_resource_name: bool,
}

impl SpoutConfig {
    /// Parses a [`SpoutConfig`] from a [`ConnectorConfig`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidValue` if a value cannot be parsed.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, ConfigurationError> {
        let reconnect_interval_ms = config
            .get_parsed::<u64>(RECONNECT_INTERVAL_KEY)?
            .unwrap_or(0);
        let require_resource_name = config
            .get_parsed::<bool>(REQUIRE_RESOURCE_NAME_KEY)?
            .unwrap_or(false);

        Ok(Self {
            reconnect_interval: Duration::from_millis(reconnect_interval_ms),
            require_resource_name,
        })
    }

    /// Sets the reconnect interval.
    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Makes a missing resource name fatal at `open`.
    #[must_use]
    pub fn with_required_resource_name(mut self) -> Self {
        self.require_resource_name = true;
        self
    }
}

impl QueueConnection {
    /// Builds a queue descriptor from `connection.string` and `queue.name`.
    #[must_use]
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(
            config.get(CONNECTION_STRING_KEY).unwrap_or_default(),
            config.get(QUEUE_NAME_KEY),
        )
    }
}

impl TopicConnection {
    /// Builds a topic descriptor from `connection.string`, `topic.name`
    /// and `subscription.name`.
    #[must_use]
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(
            config.get(CONNECTION_STRING_KEY).unwrap_or_default(),
            config.get(TOPIC_NAME_KEY),
            config.get(SUBSCRIPTION_NAME_KEY),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResourceKind;

    #[test]
    fn test_spout_config_defaults() {
        let config = SpoutConfig::from_config(&ConnectorConfig::new()).unwrap();
        assert_eq!(config, SpoutConfig::default());
        assert!(config.reconnect_interval.is_zero());
        assert!(!config.require_resource_name);
    }

    #[test]
    fn test_spout_config_parsed() {
        let mut raw = ConnectorConfig::new();
        raw.set(RECONNECT_INTERVAL_KEY, "1500");
        raw.set(REQUIRE_RESOURCE_NAME_KEY, "true");

        let config = SpoutConfig::from_config(&raw).unwrap();
        assert_eq!(config.reconnect_interval, Duration::from_millis(1500));
        assert!(config.require_resource_name);
    }

    #[test]
    fn test_spout_config_rejects_bad_values() {
        let mut raw = ConnectorConfig::new();
        raw.set(RECONNECT_INTERVAL_KEY, "-1");
        assert!(matches!(
            SpoutConfig::from_config(&raw),
            Err(ConfigurationError::InvalidValue { .. })
        ));

        let mut raw = ConnectorConfig::new();
        raw.set(REQUIRE_RESOURCE_NAME_KEY, "yes");
        assert!(SpoutConfig::from_config(&raw).is_err());
    }

    #[test]
    fn test_builders() {
        let config = SpoutConfig::default()
            .with_reconnect_interval(Duration::from_secs(2))
            .with_required_resource_name();
        assert_eq!(config.reconnect_interval, Duration::from_secs(2));
        assert!(config.require_resource_name);
    }

    #[test]
    fn test_queue_from_config() {
        let mut raw = ConnectorConfig::new();
        raw.set(CONNECTION_STRING_KEY, "a;b;c");
        raw.set(QUEUE_NAME_KEY, "orders");

        let queue = QueueConnection::from_config(&raw);
        assert_eq!(queue.connection_string().unwrap(), "a;b;c");
        assert_eq!(queue.queue_name().unwrap(), "orders");
    }

    #[test]
    fn test_queue_from_empty_config_fails_on_use() {
        let queue = QueueConnection::from_config(&ConnectorConfig::new());
        assert!(matches!(
            queue.connection_string(),
            Err(ConfigurationError::MalformedConnectionString { segments: 1 })
        ));
    }

    #[test]
    fn test_topic_from_config() {
        let mut raw = ConnectorConfig::new();
        raw.set(CONNECTION_STRING_KEY, "a;b;c");
        raw.set(TOPIC_NAME_KEY, "events");

        let topic = TopicConnection::from_config(&raw);
        assert_eq!(topic.topic_name().unwrap(), "events");
        assert_eq!(topic.subscription_name().unwrap(), "eventssub");

        raw.set(SUBSCRIPTION_NAME_KEY, "billing");
        let topic = TopicConnection::from_config(&raw);
        assert_eq!(topic.subscription_name().unwrap(), "billing");
    }

    #[test]
    fn test_topic_from_config_without_name() {
        let mut raw = ConnectorConfig::new();
        raw.set(CONNECTION_STRING_KEY, "a;b;c");

        let topic = TopicConnection::from_config(&raw);
        assert_eq!(
            topic.topic_name().unwrap_err(),
            ConfigurationError::MissingResourceName {
                kind: ResourceKind::Topic
            }
        );
    }
}
