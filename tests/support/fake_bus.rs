//! In-memory stand-in for the database client library, so the election
//! core's scenarios can run deterministically without a live PostgreSQL
//! instance. One [`FakeBus`] models one database: a single monotonic
//! counter and a single NOTIFY channel shared by every client drawn from
//! it, exactly like every coordinator in a real deployment shares one
//! database.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use notifelect::db::{ChannelListener, QueryExecutor};
use notifelect::error::{Error, Result};

/// A shared, in-memory sequence counter and broadcast channel. Clone
/// [`FakeBus::client`]/[`FakeBus::listener`] once per simulated peer.
#[derive(Clone)]
pub struct FakeBus {
    sequence: Arc<AtomicI64>,
    sender: broadcast::Sender<String>,
}

impl FakeBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(1024);
        Self {
            sequence: Arc::new(AtomicI64::new(0)),
            sender,
        }
    }

    pub fn client(&self) -> FakeQueryExecutor {
        FakeQueryExecutor {
            sequence: self.sequence.clone(),
            sender: self.sender.clone(),
        }
    }

    pub fn listener(&self) -> FakeChannelListener {
        FakeChannelListener {
            sender: self.sender.clone(),
            receiver: None,
        }
    }

    /// Publishes a raw payload directly, bypassing any coordinator —
    /// used to inject malformed traffic (scenario S6).
    pub fn inject(&self, payload: &str) {
        let _ = self.sender.send(payload.to_string());
    }
}

impl Default for FakeBus {
    fn default() -> Self {
        Self::new()
    }
}

/// [`QueryExecutor`] backed by [`FakeBus`]'s counter and channel. Ignores
/// the SQL text it's handed, same as a real executor would run it
/// verbatim — the fake just skips the database round trip.
pub struct FakeQueryExecutor {
    sequence: Arc<AtomicI64>,
    sender: broadcast::Sender<String>,
}

#[async_trait]
impl QueryExecutor for FakeQueryExecutor {
    async fn execute(&self, _sql: &str) -> Result<()> {
        Ok(())
    }

    async fn fetch_sequence(&self, _sql: &str) -> Result<i64> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn publish(&self, _sql: &str, payload: &str) -> Result<()> {
        let _ = self.sender.send(payload.to_string());
        Ok(())
    }
}

/// [`ChannelListener`] backed by [`FakeBus`]'s broadcast channel.
/// Subscribes lazily in `listen` so a peer only observes traffic sent
/// from that point on, matching a real `LISTEN`'s behavior.
pub struct FakeChannelListener {
    sender: broadcast::Sender<String>,
    receiver: Option<broadcast::Receiver<String>>,
}

#[async_trait]
impl ChannelListener for FakeChannelListener {
    async fn listen(&mut self, _channel: &str) -> Result<()> {
        self.receiver = Some(self.sender.subscribe());
        Ok(())
    }

    async fn unlisten(&mut self, _channel: &str) -> Result<()> {
        self.receiver = None;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String> {
        loop {
            let receiver = self
                .receiver
                .as_mut()
                .ok_or_else(|| Error::Listener("recv called before listen".to_string()))?;
            match receiver.recv().await {
                Ok(payload) => return Ok(payload),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(Error::Listener("bus closed".to_string()))
                }
            }
        }
    }
}
