//! Query Layer: the narrow facade over the database that acquires a fresh
//! sequence value, publishes messages, and installs/removes the shared
//! counter. The only mutual-exclusion primitive in the core lives here.

use tokio::sync::Mutex;

use crate::codec;
use crate::db::QueryExecutor;
use crate::error::Result;
use crate::models::{Channel, MessageExchange, Sequence};

/// Builds the four SQL statements this crate needs, applying an optional
/// prefix uniformly to the sequence and channel names so multiple
/// deployments can coexist in one database.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    channel: Channel,
    sequence_name: String,
}

impl QueryBuilder {
    pub fn new(prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            channel: Channel(format!("{prefix}ch_notifelect")),
            sequence_name: format!("{prefix}seq_notifelect"),
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn install_sql(&self) -> String {
        format!("CREATE SEQUENCE {} START 1;", self.sequence_name)
    }

    pub fn uninstall_sql(&self) -> String {
        format!("DROP SEQUENCE {};", self.sequence_name)
    }

    pub fn next_sequence_sql(&self) -> String {
        format!("SELECT nextval('{}');", self.sequence_name)
    }

    pub fn emit_sql(&self) -> String {
        format!("SELECT pg_notify('{}', $1);", self.channel.0)
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new("")
    }
}

/// Query Layer: wraps a [`QueryExecutor`] with the serialization lock
/// described in spec §4.2. Every operation acquires the lock for the
/// duration of the database call, since the underlying connection is
/// single-plex.
pub struct Queries<E: QueryExecutor> {
    executor: E,
    query_builder: QueryBuilder,
    lock: Mutex<()>,
}

impl<E: QueryExecutor> Queries<E> {
    pub fn new(executor: E, query_builder: QueryBuilder) -> Self {
        Self {
            executor,
            query_builder,
            lock: Mutex::new(()),
        }
    }

    pub fn channel(&self) -> &Channel {
        self.query_builder.channel()
    }

    /// Creates the shared counter starting at 1. Not idempotent: running
    /// this twice surfaces a database error (by design, see DESIGN.md).
    pub async fn install(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.executor.execute(&self.query_builder.install_sql()).await
    }

    /// Drops the shared counter.
    pub async fn uninstall(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.executor.execute(&self.query_builder.uninstall_sql()).await
    }

    /// Atomically returns the next counter value (>= 1).
    pub async fn next_sequence(&self) -> Result<Sequence> {
        let _guard = self.lock.lock().await;
        let value = self
            .executor
            .fetch_sequence(&self.query_builder.next_sequence_sql())
            .await?;
        Ok(Sequence(value))
    }

    /// Publishes the encoded message on the channel.
    pub async fn notify(&self, message: &MessageExchange) -> Result<()> {
        let payload = codec::encode(message)?;
        let _guard = self.lock.lock().await;
        self.executor.publish(&self.query_builder.emit_sql(), &payload).await
    }
}
