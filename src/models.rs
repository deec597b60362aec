//! Wire types exchanged between peers: [`MessageExchange`] and its fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a running coordinator instance. Never used for ordering.
pub type ProcessId = Uuid;

/// Totally-ordered peer identity, assigned once per peer from a
/// database-managed monotonic counter. `0` is reserved as the "yield"
/// sentinel and is never issued by the counter (which starts at 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(pub i64);

impl Sequence {
    /// The terminal "yield" probe sentinel. Never a live candidate sequence.
    pub const YIELD: Sequence = Sequence(0);

    /// Whether this sequence could have come from the counter (i.e. is
    /// eligible to respond to pings / be a candidate).
    pub fn is_live(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator-chosen scoping string. Two peers are in the same election iff
/// they share a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(pub String);

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The database-visible NOTIFY/LISTEN channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub String);

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two message kinds exchanged on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Ping,
    Pong,
}

/// The sole wire record exchanged on the channel.
///
/// Structural validity (parseable JSON, UUID-shaped identifiers, an
/// aware/offset-bearing timestamp) is enforced by the field types
/// themselves during `serde` deserialization; semantic checks (namespace
/// match, sequence sanity) are left to the dispatcher, per design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageExchange {
    pub channel: Channel,
    pub message_id: Uuid,
    pub namespace: Namespace,
    pub process_id: ProcessId,
    pub sent_at: DateTime<Utc>,
    pub sequence: Sequence,
    #[serde(rename = "type")]
    pub kind: MessageType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_zero_is_not_live() {
        assert!(!Sequence::YIELD.is_live());
        assert!(Sequence(1).is_live());
    }

    #[test]
    fn sequence_ordering_is_numeric() {
        assert!(Sequence(5) > Sequence(3));
        assert_eq!(Sequence(5).max(Sequence(3)), Sequence(5));
    }
}
