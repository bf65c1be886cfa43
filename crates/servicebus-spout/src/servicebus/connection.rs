//! Connection descriptors for queues and topic subscriptions.
//!
//! Descriptors accept any input at construction and validate on read:
//! every accessor first checks the connection string, then the field it
//! returns. A descriptor built from untrusted config therefore never fails
//! until a caller actually needs a field.

use std::borrow::Cow;
use std::fmt;

use crate::error::{ConfigurationError, ResourceKind};

/// Minimum number of `;`-delimited segments in a well-formed connection string.
pub const MIN_SEGMENTS: usize = 3;

/// Suffix appended to the topic name when no subscription is configured.
pub const SUBSCRIPTION_SUFFIX: &str = "sub";

/// Segment keys whose values are masked in `Display`/`Debug` output.
const SECRET_KEYS: &[&str] = &["SharedAccessKey", "SharedAccessSignature"];

/// A raw, opaque broker connection string.
///
/// Only the segment count is checked. `Display` and `Debug` mask shared
/// access keys so the value is safe to log.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ConnectionString {
    raw: String,
}

impl ConnectionString {
    /// Wraps a raw connection string without validating it.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Counts `;`-delimited segments, ignoring trailing empty ones.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.raw.trim_end_matches(';').split(';').count()
    }

    /// Returns `true` if the string has at least [`MIN_SEGMENTS`] segments.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.segment_count() >= MIN_SEGMENTS
    }

    /// Returns the raw string unchanged if it is well formed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MalformedConnectionString` otherwise.
    pub fn validate(&self) -> Result<&str, ConfigurationError> {
        let segments = self.segment_count();
        if segments < MIN_SEGMENTS {
            return Err(ConfigurationError::MalformedConnectionString { segments });
        }
        Ok(&self.raw)
    }

    /// Returns the string with secret segment values replaced by `***`.
    #[must_use]
    pub fn masked(&self) -> String {
        self.raw
            .split(';')
            .map(|segment| match segment.split_once('=') {
                Some((key, _)) if is_secret_key(key) => Cow::Owned(format!("{key}=***")),
                _ => Cow::Borrowed(segment),
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.trim();
    SECRET_KEYS.iter().any(|s| key.eq_ignore_ascii_case(s))
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionString")
            .field(&self.masked())
            .finish()
    }
}

impl From<&str> for ConnectionString {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ConnectionString {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Validated access to the identity of a broker resource.
pub trait ConnectionDescriptor: fmt::Debug + Send + Sync {
    /// Which resource kind this descriptor names.
    fn kind(&self) -> ResourceKind;

    /// Returns the raw connection string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MalformedConnectionString` if it has
    /// fewer than [`MIN_SEGMENTS`] segments.
    fn connection_string(&self) -> Result<&str, ConfigurationError>;

    /// Returns the queue or topic name.
    ///
    /// # Errors
    ///
    /// Fails like [`connection_string`](Self::connection_string), or with
    /// `ConfigurationError::MissingResourceName` if the name is empty.
    fn resource_name(&self) -> Result<&str, ConfigurationError>;

    /// Returns the path identifying the entity messages are received from.
    ///
    /// # Errors
    ///
    /// Fails like [`resource_name`](Self::resource_name).
    fn entity_path(&self) -> Result<String, ConfigurationError>;
}

fn require_name(name: Option<&str>, kind: ResourceKind) -> Result<&str, ConfigurationError> {
    match name {
        Some(n) if !n.trim().is_empty() => Ok(n),
        _ => Err(ConfigurationError::MissingResourceName { kind }),
    }
}

/// Identity of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConnection {
    connection_string: ConnectionString,
    queue_name: Option<String>,
}

impl QueueConnection {
    /// Creates a queue descriptor. Nothing is validated here.
    #[must_use]
    pub fn new(connection_string: impl Into<ConnectionString>, queue_name: Option<&str>) -> Self {
        Self {
            connection_string: connection_string.into(),
            queue_name: queue_name.map(str::to_string),
        }
    }

    /// Returns the connection string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MalformedConnectionString` if malformed.
    pub fn connection_string(&self) -> Result<&str, ConfigurationError> {
        self.connection_string.validate()
    }

    /// Returns the queue name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MalformedConnectionString` if the
    /// connection string is malformed, or `MissingResourceName` if the
    /// queue name is empty.
    pub fn queue_name(&self) -> Result<&str, ConfigurationError> {
        self.connection_string.validate()?;
        require_name(self.queue_name.as_deref(), ResourceKind::Queue)
    }
}

impl ConnectionDescriptor for QueueConnection {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Queue
    }

    fn connection_string(&self) -> Result<&str, ConfigurationError> {
        QueueConnection::connection_string(self)
    }

    fn resource_name(&self) -> Result<&str, ConfigurationError> {
        self.queue_name()
    }

    fn entity_path(&self) -> Result<String, ConfigurationError> {
        self.queue_name().map(str::to_string)
    }
}

/// Identity of a topic and the subscription messages are read through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicConnection {
    connection_string: ConnectionString,
    topic_name: Option<String>,
    subscription_name: Option<String>,
}

impl TopicConnection {
    /// Creates a topic descriptor. Nothing is validated here.
    #[must_use]
    pub fn new(
        connection_string: impl Into<ConnectionString>,
        topic_name: Option<&str>,
        subscription_name: Option<&str>,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            topic_name: topic_name.map(str::to_string),
            subscription_name: subscription_name.map(str::to_string),
        }
    }

    /// Returns the connection string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MalformedConnectionString` if malformed.
    pub fn connection_string(&self) -> Result<&str, ConfigurationError> {
        self.connection_string.validate()
    }

    /// Returns the topic name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MalformedConnectionString` if the
    /// connection string is malformed, or `MissingResourceName` if the
    /// topic name is empty.
    pub fn topic_name(&self) -> Result<&str, ConfigurationError> {
        self.connection_string.validate()?;
        require_name(self.topic_name.as_deref(), ResourceKind::Topic)
    }

    /// Returns the subscription name, defaulting to `<topic>sub`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MalformedConnectionString` if the
    /// connection string is malformed. When the subscription has to be
    /// derived, fails like [`topic_name`](Self::topic_name).
    pub fn subscription_name(&self) -> Result<Cow<'_, str>, ConfigurationError> {
        self.connection_string.validate()?;
        match self.subscription_name.as_deref() {
            Some(sub) if !sub.trim().is_empty() => Ok(Cow::Borrowed(sub)),
            _ => {
                let topic = self.topic_name()?;
                Ok(Cow::Owned(format!("{topic}{SUBSCRIPTION_SUFFIX}")))
            }
        }
    }
}

impl ConnectionDescriptor for TopicConnection {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Topic
    }

    fn connection_string(&self) -> Result<&str, ConfigurationError> {
        TopicConnection::connection_string(self)
    }

    fn resource_name(&self) -> Result<&str, ConfigurationError> {
        self.topic_name()
    }

    fn entity_path(&self) -> Result<String, ConfigurationError> {
        let topic = self.topic_name()?;
        let subscription = self.subscription_name()?;
        Ok(format!("{topic}/subscriptions/{subscription}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Endpoint=sb://ns.servicebus.windows.net/;\
                          SharedAccessKeyName=RootManageSharedAccessKey;\
                          SharedAccessKey=c2VjcmV0";

    fn is_malformed(err: &ConfigurationError) -> bool {
        matches!(err, ConfigurationError::MalformedConnectionString { .. })
    }

    // ── Queue ──

    #[test]
    fn test_incorrect_connection_string() {
        let connection = QueueConnection::new("test;this", None);
        let err = connection.connection_string().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MalformedConnectionString { segments: 2 }
        );
    }

    #[test]
    fn test_correct_connection_string() {
        let connection = QueueConnection::new("test;this;thing", None);
        assert_eq!(connection.connection_string().unwrap(), "test;this;thing");
    }

    #[test]
    fn test_invalid_queue_name_with_malformed_connection_string() {
        let connection = QueueConnection::new("test;this", Some("sd"));
        assert!(is_malformed(&connection.queue_name().unwrap_err()));
    }

    #[test]
    fn test_empty_queue_name_fails_on_valid_connection_string() {
        for name in [None, Some(""), Some("   ")] {
            let connection = QueueConnection::new("a;b;c", name);
            assert_eq!(
                connection.queue_name().unwrap_err(),
                ConfigurationError::MissingResourceName {
                    kind: ResourceKind::Queue
                }
            );
        }
    }

    #[test]
    fn test_queue_descriptor_accessors() {
        let connection = QueueConnection::new(SAMPLE, Some("orders"));
        assert_eq!(connection.kind(), ResourceKind::Queue);
        assert_eq!(ConnectionDescriptor::resource_name(&connection).unwrap(), "orders");
        assert_eq!(connection.entity_path().unwrap(), "orders");
    }

    #[test]
    fn test_every_accessor_fails_on_malformed_string() {
        for raw in ["", "one", "a;b", "a;b;", "a;b;;;"] {
            let queue = QueueConnection::new(raw, Some("q"));
            assert!(is_malformed(&queue.connection_string().unwrap_err()), "{raw}");
            assert!(is_malformed(&queue.queue_name().unwrap_err()), "{raw}");
            assert!(is_malformed(&queue.entity_path().unwrap_err()), "{raw}");

            let topic = TopicConnection::new(raw, Some("t"), Some("s"));
            assert!(is_malformed(&topic.connection_string().unwrap_err()), "{raw}");
            assert!(is_malformed(&topic.topic_name().unwrap_err()), "{raw}");
            assert!(is_malformed(&topic.subscription_name().unwrap_err()), "{raw}");
            assert!(is_malformed(&topic.entity_path().unwrap_err()), "{raw}");
        }
    }

    #[test]
    fn test_connection_string_returned_unchanged() {
        for raw in ["a;;b", "x;y;z;", SAMPLE] {
            let connection = QueueConnection::new(raw, None);
            assert_eq!(connection.connection_string().unwrap(), raw);
        }
    }

    // ── Topic ──

    #[test]
    fn test_incorrect_connection_string_topic() {
        let connection = TopicConnection::new("test;this", None, None);
        assert!(is_malformed(&connection.connection_string().unwrap_err()));
    }

    #[test]
    fn test_correct_connection_string_topic() {
        let connection = TopicConnection::new("test;this;thing", None, None);
        assert_eq!(connection.connection_string().unwrap(), "test;this;thing");
    }

    #[test]
    fn test_invalid_topic_name() {
        let connection = TopicConnection::new("test;this", Some("sd"), None);
        assert!(is_malformed(&connection.topic_name().unwrap_err()));
    }

    #[test]
    fn test_derived_subscription() {
        let connection = TopicConnection::new("test;this;this", Some("sd123"), None);
        assert_eq!(connection.subscription_name().unwrap(), "sd123sub");
    }

    #[test]
    fn test_explicit_subscription() {
        let connection = TopicConnection::new(SAMPLE, Some("events"), Some("audit"));
        assert_eq!(connection.subscription_name().unwrap(), "audit");
        assert_eq!(
            connection.entity_path().unwrap(),
            "events/subscriptions/audit"
        );
    }

    #[test]
    fn test_blank_subscription_falls_back_to_derived() {
        let connection = TopicConnection::new(SAMPLE, Some("events"), Some(""));
        assert_eq!(connection.subscription_name().unwrap(), "eventssub");
    }

    #[test]
    fn test_derived_subscription_requires_topic() {
        let connection = TopicConnection::new(SAMPLE, None, None);
        assert_eq!(
            connection.subscription_name().unwrap_err(),
            ConfigurationError::MissingResourceName {
                kind: ResourceKind::Topic
            }
        );

        let explicit = TopicConnection::new(SAMPLE, None, Some("audit"));
        assert_eq!(explicit.subscription_name().unwrap(), "audit");
    }

    // ── ConnectionString ──

    #[test]
    fn test_segment_count_ignores_trailing_separators() {
        assert_eq!(ConnectionString::new("a;b;c;").segment_count(), 3);
        assert_eq!(ConnectionString::new("a;;c").segment_count(), 3);
        assert_eq!(ConnectionString::new("a;b;;").segment_count(), 2);
        assert!(!ConnectionString::new("a;b;;").is_well_formed());
    }

    #[test]
    fn test_display_masks_shared_access_key() {
        let cs = ConnectionString::new(SAMPLE);
        let shown = cs.to_string();
        assert!(!shown.contains("c2VjcmV0"));
        assert!(shown.contains("SharedAccessKey=***"));
        assert!(shown.contains("SharedAccessKeyName=RootManageSharedAccessKey"));
        assert!(shown.contains("Endpoint=sb://ns.servicebus.windows.net/"));

        let debugged = format!("{:?}", QueueConnection::new(SAMPLE, Some("q")));
        assert!(!debugged.contains("c2VjcmV0"));
    }

    #[test]
    fn test_display_masks_shared_access_signature() {
        let cs = ConnectionString::new("Endpoint=sb://x/;SharedAccessSignature=sig;EntityPath=q");
        assert_eq!(
            cs.masked(),
            "Endpoint=sb://x/;SharedAccessSignature=***;EntityPath=q"
        );
    }
}
