//! Message Factory: stamps outbound messages with the local identity and
//! the current sequence. Stateless beyond holding that identity.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Channel, MessageExchange, MessageType, Namespace, ProcessId, Sequence};

#[derive(Debug, Clone)]
pub struct MessageFactory {
    process_id: ProcessId,
    namespace: Namespace,
    channel: Channel,
}

impl MessageFactory {
    pub fn new(process_id: ProcessId, namespace: Namespace, channel: Channel) -> Self {
        Self {
            process_id,
            namespace,
            channel,
        }
    }

    fn create(&self, kind: MessageType, sequence: Sequence) -> MessageExchange {
        MessageExchange {
            channel: self.channel.clone(),
            message_id: Uuid::new_v4(),
            namespace: self.namespace.clone(),
            process_id: self.process_id,
            sent_at: Utc::now(),
            sequence,
            kind,
        }
    }

    /// Builds a Ping stamped with `sequence` (normally the local
    /// sequence, or [`Sequence::YIELD`] for the terminal yield probe).
    pub fn create_ping(&self, sequence: Sequence) -> MessageExchange {
        self.create(MessageType::Ping, sequence)
    }

    /// Builds a Pong stamped with `sequence` (always the local sequence).
    pub fn create_pong(&self, sequence: Sequence) -> MessageExchange {
        self.create(MessageType::Pong, sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> MessageFactory {
        MessageFactory::new(Uuid::new_v4(), Namespace("prod".into()), Channel("ch".into()))
    }

    #[test]
    fn stamped_messages_carry_the_senders_own_identity() {
        let f = factory();
        let ping = f.create_ping(Sequence(3));
        assert_eq!(ping.process_id, f.process_id);
        assert_eq!(ping.namespace, f.namespace);
        assert_eq!(ping.kind, MessageType::Ping);
        assert_eq!(ping.sequence, Sequence(3));
    }

    #[test]
    fn each_message_gets_a_fresh_id() {
        let f = factory();
        let a = f.create_ping(Sequence(1));
        let b = f.create_ping(Sequence(1));
        assert_ne!(a.message_id, b.message_id);
    }
}
