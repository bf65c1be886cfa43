//! Tracking of emitted messages that still await settlement.
//!
//! [`PendingAcks`] maps the [`MessageId`] handed to the pipeline back to
//! the broker lock token needed to complete or abandon the message.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::client::SettlementToken;
use crate::emitter::MessageId;

#[derive(Debug, Clone)]
struct PendingEntry {
    token: SettlementToken,
    emitted_at: Instant,
}

/// Emitted-but-unsettled messages, keyed by message id.
#[derive(Debug, Default)]
pub struct PendingAcks {
    entries: HashMap<MessageId, PendingEntry>,
}

impl PendingAcks {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message as pending.
    pub fn insert(&mut self, id: MessageId, token: SettlementToken) {
        self.entries.insert(
            id,
            PendingEntry {
                token,
                emitted_at: Instant::now(),
            },
        );
    }

    /// Removes a pending message, returning its token if it was tracked.
    pub fn take(&mut self, id: &MessageId) -> Option<SettlementToken> {
        self.entries.remove(id).map(|entry| entry.token)
    }

    /// Returns `true` if the id is pending.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the number of pending messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Age of the oldest pending message.
    #[must_use]
    pub fn oldest_age(&self) -> Option<Duration> {
        self.entries
            .values()
            .map(|entry| entry.emitted_at.elapsed())
            .max()
    }

    /// Removes every pending message, returning their tokens.
    pub fn drain_tokens(&mut self) -> Vec<SettlementToken> {
        self.entries.drain().map(|(_, entry)| entry.token).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_take() {
        let mut pending = PendingAcks::new();
        let id = MessageId::new();
        pending.insert(id, SettlementToken::new("lock-1"));

        assert!(pending.contains(&id));
        assert_eq!(pending.len(), 1);
        assert!(pending.oldest_age().is_some());

        assert_eq!(pending.take(&id), Some(SettlementToken::new("lock-1")));
        assert!(pending.take(&id).is_none());
        assert!(pending.is_empty());
        assert!(pending.oldest_age().is_none());
    }

    #[test]
    fn test_unknown_id() {
        let mut pending = PendingAcks::new();
        pending.insert(MessageId::new(), SettlementToken::new("lock-1"));
        assert!(pending.take(&MessageId::new()).is_none());
        assert_eq!(pending.len(), 1);

        let drained = pending.drain_tokens();
        assert_eq!(drained, vec![SettlementToken::new("lock-1")]);
        assert!(pending.is_empty());
    }
}
