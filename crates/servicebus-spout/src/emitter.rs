//! Record emission into the host pipeline.

use std::fmt;

use bytes::Bytes;
use uuid::Uuid;

/// Unique id attached to every emitted record.
///
/// The pipeline hands it back through `ack`/`fail` once the record tree
/// has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for MessageId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// One message handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoutRecord {
    /// Message body as received from the broker.
    pub payload: Bytes,
    /// Id used for downstream acknowledgement.
    pub message_id: MessageId,
}

/// The pipeline-side sink for emitted records.
pub trait Emitter: Send {
    /// Emits one record.
    fn emit(&mut self, record: SpoutRecord);
}

impl<F> Emitter for F
where
    F: FnMut(SpoutRecord) + Send,
{
    fn emit(&mut self, record: SpoutRecord) {
        self(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = MessageId::new();
        let b = MessageId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_message_id_display_is_hyphenated() {
        let id = MessageId::from(Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_closure_emitter() {
        let mut seen = Vec::new();
        {
            let mut emitter = |record: SpoutRecord| seen.push(record.payload);
            emitter.emit(SpoutRecord {
                payload: Bytes::from_static(b"x"),
                message_id: MessageId::new(),
            });
        }
        assert_eq!(seen, vec![Bytes::from_static(b"x")]);
    }
}
