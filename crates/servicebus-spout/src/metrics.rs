//! Metrics snapshot reported by a spout.

/// Point-in-time metrics exposed to the host's monitoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorMetrics {
    /// Total records emitted.
    pub records_total: u64,

    /// Total payload bytes emitted.
    pub bytes_total: u64,

    /// Broker errors absorbed by the spout.
    pub errors_total: u64,

    /// Emitted records still awaiting ack or fail.
    pub pending: u64,

    /// Additional spout-specific metrics.
    pub custom: Vec<(String, f64)>,
}

impl ConnectorMetrics {
    /// Creates empty metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom metric.
    pub fn add_custom(&mut self, name: impl Into<String>, value: f64) {
        self.custom.push((name.into(), value));
    }

    /// Looks up a custom metric by name.
    #[must_use]
    pub fn custom_value(&self, name: &str) -> Option<f64> {
        self.custom
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
    }
}
