//! Spout health reporting.

use std::fmt;

/// Health of a spout as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HealthStatus {
    /// Connected and polling.
    Healthy,

    /// Open but not delivering, e.g. the broker is unreachable.
    Degraded(String),

    /// Closed or otherwise unable to deliver again.
    Unhealthy(String),

    /// Not opened yet.
    #[default]
    Unknown,
}

impl HealthStatus {
    /// Returns `true` if the spout is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Returns `true` unless the spout can no longer recover.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy(_))
    }

    /// Returns the reason attached to a degraded or unhealthy status.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => Some(reason),
            HealthStatus::Healthy | HealthStatus::Unknown => None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "Healthy"),
            HealthStatus::Degraded(msg) => write!(f, "Degraded: {msg}"),
            HealthStatus::Unhealthy(msg) => write!(f, "Unhealthy: {msg}"),
            HealthStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_checks() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(HealthStatus::Unknown.is_recoverable());

        let degraded = HealthStatus::Degraded("broker unreachable".into());
        assert!(!degraded.is_healthy());
        assert!(degraded.is_recoverable());
        assert_eq!(degraded.reason(), Some("broker unreachable"));

        let closed = HealthStatus::Unhealthy("closed".into());
        assert!(!closed.is_recoverable());
        assert_eq!(closed.to_string(), "Unhealthy: closed");
    }
}
