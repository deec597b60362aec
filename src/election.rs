//! Electoral Engine: drives one election per `election_interval`, owning
//! the ballot set and the [`Outcome`].
//!
//! State machine per round (spec §4.4): Idle -> Probing -> Collecting ->
//! Tallying -> Idle, with a `watch<bool>` stop signal racing both waits so
//! cancellation is observed at the next suspension boundary and never
//! mutates `Outcome` mid-round.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use crate::db::QueryExecutor;
use crate::error::Result;
use crate::factory::MessageFactory;
use crate::models::{MessageExchange, Sequence};
use crate::queries::Queries;

/// The single observable boolean: am I the leader? `false` until the
/// first round completes. Cheap to clone and read from any task; reads
/// observe the value at the last completed tally.
#[derive(Debug, Clone, Default)]
pub struct Outcome(Arc<AtomicBool>);

impl Outcome {
    pub fn winner(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, winner: bool) {
        self.0.store(winner, Ordering::Release);
    }
}

/// Timing knobs for the electoral loop.
#[derive(Debug, Clone)]
pub struct ElectionTiming {
    pub election_interval: Duration,
    pub election_timeout: Duration,
}

impl Default for ElectionTiming {
    fn default() -> Self {
        Self {
            election_interval: Duration::from_secs(20),
            election_timeout: Duration::from_secs(5),
        }
    }
}

pub type Ballots = Arc<Mutex<Vec<MessageExchange>>>;

/// Drives the periodic election loop for one peer.
pub struct ElectoralEngine<E: QueryExecutor> {
    timing: ElectionTiming,
    sequence: Sequence,
    ballots: Ballots,
    outcome: Outcome,
    queries: Arc<Queries<E>>,
    message_factory: Arc<MessageFactory>,
}

impl<E: QueryExecutor> ElectoralEngine<E> {
    pub fn new(
        timing: ElectionTiming,
        sequence: Sequence,
        ballots: Ballots,
        outcome: Outcome,
        queries: Arc<Queries<E>>,
        message_factory: Arc<MessageFactory>,
    ) -> Self {
        Self {
            timing,
            sequence,
            ballots,
            outcome,
            queries,
            message_factory,
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome.clone()
    }

    /// Runs rounds until `stop` is signalled. A round abandoned by
    /// cancellation never mutates `Outcome`.
    pub async fn run(self, mut stop: watch::Receiver<bool>) -> Result<()> {
        loop {
            tokio::select! {
                _ = stop.changed() => break,
                _ = tokio::time::sleep(self.timing.election_interval) => {}
            }
            if *stop.borrow() {
                break;
            }

            let ping = self.message_factory.create_ping(self.sequence);
            self.queries.notify(&ping).await?;
            tracing::debug!(sequence = %self.sequence, "election ping emitted");

            tokio::select! {
                _ = stop.changed() => break,
                _ = tokio::time::sleep(self.timing.election_timeout) => {}
            }
            if *stop.borrow() {
                break;
            }

            self.tally().await;
        }
        Ok(())
    }

    async fn tally(&self) {
        let mut ballots = self.ballots.lock().await;

        if ballots.is_empty() {
            tracing::warn!(
                sequence = %self.sequence,
                "tally skipped: no ballots received this round"
            );
            ballots.clear();
            return;
        }

        let max_sequence = ballots.iter().map(|b| b.sequence).max().expect("checked non-empty above");
        let winner = max_sequence == self.sequence;

        self.outcome.set(winner);
        tracing::debug!(
            winner = winner,
            sequence = %self.sequence,
            max_sequence = %max_sequence,
            "election concluded"
        );
        ballots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_defaults_to_false() {
        let outcome = Outcome::default();
        assert!(!outcome.winner());
    }

    #[test]
    fn outcome_set_is_observable_through_clones() {
        let outcome = Outcome::default();
        let handle = outcome.clone();
        outcome.set(true);
        assert!(handle.winner());
    }
}
