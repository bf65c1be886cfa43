//! Service Bus spout metrics.
//!
//! [`SpoutMetrics`] keeps lock-free counters that convert into the
//! crate-level [`ConnectorMetrics`] snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::metrics::ConnectorMetrics;

/// Atomic counters for spout activity.
#[derive(Debug, Default)]
pub struct SpoutMetrics {
    /// Records handed to the emitter.
    pub messages_emitted: AtomicU64,
    /// Payload bytes handed to the emitter.
    pub bytes_emitted: AtomicU64,
    /// Poll cycles that found no message.
    pub empty_polls: AtomicU64,
    /// Calls to `BrokerClient::connect`.
    pub connect_attempts: AtomicU64,
    /// Broker errors absorbed by the spout.
    pub errors: AtomicU64,
    /// Messages completed after an ack.
    pub acked: AtomicU64,
    /// Messages abandoned after a fail.
    pub failed: AtomicU64,
}

impl SpoutMetrics {
    /// Creates a new metrics instance with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one emitted message of `bytes` bytes.
    pub fn record_emit(&self, bytes: u64) {
        self.messages_emitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_emitted.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a poll cycle that found nothing.
    pub fn record_empty_poll(&self) {
        self.empty_polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a connect attempt.
    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an absorbed broker error.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed message.
    pub fn record_ack(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an abandoned message.
    pub fn record_fail(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Converts to a [`ConnectorMetrics`] snapshot.
    ///
    /// `oldest_pending` is reported as `servicebus.oldest_pending_ms` when
    /// something awaits settlement.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_connector_metrics(
        &self,
        pending: u64,
        oldest_pending: Option<Duration>,
    ) -> ConnectorMetrics {
        let mut m = ConnectorMetrics {
            records_total: self.messages_emitted.load(Ordering::Relaxed),
            bytes_total: self.bytes_emitted.load(Ordering::Relaxed),
            errors_total: self.errors.load(Ordering::Relaxed),
            pending,
            custom: Vec::new(),
        };
        m.add_custom(
            "servicebus.empty_polls",
            self.empty_polls.load(Ordering::Relaxed) as f64,
        );
        m.add_custom(
            "servicebus.connect_attempts",
            self.connect_attempts.load(Ordering::Relaxed) as f64,
        );
        m.add_custom("servicebus.acked", self.acked.load(Ordering::Relaxed) as f64);
        m.add_custom("servicebus.failed", self.failed.load(Ordering::Relaxed) as f64);
        if let Some(age) = oldest_pending {
            m.add_custom("servicebus.oldest_pending_ms", age.as_secs_f64() * 1000.0);
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_zeros() {
        let m = SpoutMetrics::new().to_connector_metrics(0, None);
        assert_eq!(m.records_total, 0);
        assert_eq!(m.bytes_total, 0);
        assert_eq!(m.errors_total, 0);
        assert_eq!(m.custom.len(), 4);
        assert_eq!(m.custom_value("servicebus.oldest_pending_ms"), None);
    }

    #[test]
    fn test_counters() {
        let m = SpoutMetrics::new();
        m.record_emit(10);
        m.record_emit(5);
        m.record_empty_poll();
        m.record_connect_attempt();
        m.record_connect_attempt();
        m.record_error();
        m.record_ack();
        m.record_fail();

        let cm = m.to_connector_metrics(1, Some(Duration::from_millis(1500)));
        assert_eq!(cm.records_total, 2);
        assert_eq!(cm.bytes_total, 15);
        assert_eq!(cm.errors_total, 1);
        assert_eq!(cm.pending, 1);
        assert_eq!(cm.custom_value("servicebus.connect_attempts"), Some(2.0));
        assert_eq!(cm.custom_value("servicebus.empty_polls"), Some(1.0));
        assert_eq!(cm.custom_value("servicebus.acked"), Some(1.0));
        assert_eq!(cm.custom_value("servicebus.failed"), Some(1.0));
        assert_eq!(cm.custom_value("servicebus.oldest_pending_ms"), Some(1500.0));
    }
}
