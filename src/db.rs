//! The narrow database-facing interface the core consumes, and its
//! concrete `sqlx` implementation.
//!
//! The core (`queries.rs`, `election.rs`, `coordinator.rs`) only ever sees
//! [`QueryExecutor`] and [`ChannelListener`] — it has no idea `sqlx` or
//! PostgreSQL exist. That keeps "the database client library" an external
//! collaborator (per spec §1) and lets tests substitute an in-memory fake
//! (see `tests/support/fake_bus.rs`) instead of a live database.

use async_trait::async_trait;
use sqlx::postgres::PgListener;
use sqlx::{PgPool, Row};

use crate::error::{Error, Result};

/// Runs statements and queries against the shared database connection.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a statement with no result (`CREATE SEQUENCE` / `DROP SEQUENCE`).
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Run a statement that returns a single integer (`nextval(...)`).
    async fn fetch_sequence(&self, sql: &str) -> Result<i64>;

    /// Run a statement that publishes a payload (`pg_notify(channel, $1)`).
    async fn publish(&self, sql: &str, payload: &str) -> Result<()>;
}

/// Subscribes to a NOTIFY channel and yields payload strings as they
/// arrive. Analogous to `asyncpg`'s `add_listener`/`remove_listener`
/// callback pair, expressed as an owned poll loop instead of a callback.
#[async_trait]
pub trait ChannelListener: Send + Sync {
    async fn listen(&mut self, channel: &str) -> Result<()>;
    async fn unlisten(&mut self, channel: &str) -> Result<()>;
    async fn recv(&mut self) -> Result<String>;
}

/// `sqlx::PgPool`-backed [`QueryExecutor`].
pub struct PgQueryExecutor {
    pool: PgPool,
}

impl PgQueryExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_sequence(&self, sql: &str) -> Result<i64> {
        let row = sqlx::query(sql).fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>(0).map_err(Error::Database)?)
    }

    async fn publish(&self, sql: &str, payload: &str) -> Result<()> {
        sqlx::query(sql).bind(payload).execute(&self.pool).await?;
        Ok(())
    }
}

/// `sqlx::postgres::PgListener`-backed [`ChannelListener`].
pub struct PgChannelListener {
    listener: PgListener,
}

impl PgChannelListener {
    pub async fn connect(dsn: &str) -> Result<Self> {
        Ok(Self {
            listener: PgListener::connect(dsn).await?,
        })
    }
}

#[async_trait]
impl ChannelListener for PgChannelListener {
    async fn listen(&mut self, channel: &str) -> Result<()> {
        self.listener.listen(channel).await?;
        Ok(())
    }

    async fn unlisten(&mut self, channel: &str) -> Result<()> {
        self.listener.unlisten(channel).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String> {
        let notification = self.listener.recv().await?;
        Ok(notification.payload().to_string())
    }
}
