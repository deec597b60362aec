//! Coordinator: ties the codec, query layer, message factory and
//! electoral engine to a live database connection. Owns the channel
//! subscription, parses and routes inbound messages, and guarantees
//! teardown (spec §4.5).

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::codec;
use crate::config::Settings;
use crate::db::{ChannelListener, QueryExecutor};
use crate::election::{Ballots, ElectoralEngine, Outcome};
use crate::error::Result;
use crate::factory::MessageFactory;
use crate::models::{MessageType, Namespace, Sequence};
use crate::queries::Queries;
use crate::task_manager::TaskManager;

/// A live, entered coordinator. Dropping this without calling
/// [`CoordinatorHandle::shutdown`] leaves background tasks and the
/// channel subscription running; `Drop` logs a warning so a leaked
/// handle is at least visible in the logs.
pub struct CoordinatorHandle<E: QueryExecutor + 'static> {
    queries: Arc<Queries<E>>,
    message_factory: Arc<MessageFactory>,
    stop_tx: watch::Sender<bool>,
    task_manager: Arc<TaskManager>,
    shut_down: bool,
}

impl<E: QueryExecutor + 'static> CoordinatorHandle<E> {
    /// Entry: acquires a sequence, subscribes to the channel, spawns the
    /// electoral loop, and publishes an initial Ping so a new joiner
    /// triggers immediate reconvergence instead of waiting a full
    /// interval.
    pub async fn enter<L>(settings: Settings, queries: Arc<Queries<E>>, mut listener: L) -> Result<(Self, Outcome)>
    where
        L: ChannelListener + Send + 'static,
    {
        let sequence = queries.next_sequence().await?;
        tracing::debug!(sequence = %sequence, "acquired sequence");

        let process_id = Uuid::new_v4();
        let message_factory = Arc::new(MessageFactory::new(
            process_id,
            settings.namespace.clone(),
            queries.channel().clone(),
        ));

        let ballots: Ballots = Arc::new(Mutex::new(Vec::new()));
        let outcome = Outcome::default();
        let (stop_tx, stop_rx) = watch::channel(false);
        let task_manager = Arc::new(TaskManager::new());

        let channel_name = queries.channel().0.clone();
        listener.listen(&channel_name).await?;

        let engine = ElectoralEngine::new(
            settings.timing.clone(),
            sequence,
            ballots.clone(),
            outcome.clone(),
            queries.clone(),
            message_factory.clone(),
        );
        task_manager.add(tokio::spawn(engine.run(stop_rx.clone())));

        let dispatch_handle = spawn_dispatcher(
            listener,
            channel_name,
            settings.namespace.clone(),
            sequence,
            ballots,
            queries.clone(),
            message_factory.clone(),
            task_manager.clone(),
            stop_rx,
        );
        task_manager.add(dispatch_handle);

        queries.notify(&message_factory.create_ping(sequence)).await?;

        Ok((
            Self {
                queries,
                message_factory,
                stop_tx,
                task_manager,
                shut_down: false,
            },
            outcome,
        ))
    }

    /// Exit: stops the electoral loop, unregisters the channel listener,
    /// publishes a best-effort terminal yield Ping (sequence 0) so the
    /// remaining peers reconverge promptly, and awaits every background
    /// task.
    pub async fn shutdown(mut self) -> Result<()> {
        self.shut_down = true;
        let _ = self.stop_tx.send(true);

        let yield_ping = self.message_factory.create_ping(Sequence::YIELD);
        if let Err(err) = self.queries.notify(&yield_ping).await {
            tracing::error!(error = %err, "failed to publish terminal yield ping; continuing teardown");
        }

        self.task_manager.join_all().await
    }
}

impl<E: QueryExecutor + 'static> Drop for CoordinatorHandle<E> {
    fn drop(&mut self) {
        if !self.shut_down {
            tracing::warn!("coordinator handle dropped without calling shutdown(); background tasks may still be running");
        }
    }
}

/// Runs the common enter/body/shutdown sequence, guaranteeing `shutdown`
/// runs even if `body` fails — the Rust analogue of the source's
/// `async with Coordinator(...) as outcome:` block.
pub async fn run<E, L, F, Fut, T>(
    settings: Settings,
    queries: Arc<Queries<E>>,
    listener: L,
    body: F,
) -> Result<T>
where
    E: QueryExecutor + 'static,
    L: ChannelListener + Send + 'static,
    F: FnOnce(Outcome) -> Fut,
    Fut: Future<Output = T>,
{
    let (handle, outcome) = CoordinatorHandle::enter(settings, queries, listener).await?;
    let result = body(outcome).await;
    handle.shutdown().await?;
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn spawn_dispatcher<E, L>(
    mut listener: L,
    channel_name: String,
    namespace: Namespace,
    sequence: Sequence,
    ballots: Ballots,
    queries: Arc<Queries<E>>,
    message_factory: Arc<MessageFactory>,
    task_manager: Arc<TaskManager>,
    mut stop_rx: watch::Receiver<bool>,
) -> JoinHandle<Result<()>>
where
    E: QueryExecutor + 'static,
    L: ChannelListener + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    if let Err(err) = listener.unlisten(&channel_name).await {
                        tracing::error!(error = %err, "failed to unlisten on shutdown");
                    }
                    break;
                }
                received = listener.recv() => {
                    match received {
                        Ok(payload) => {
                            dispatch(
                                &payload,
                                &namespace,
                                sequence,
                                &ballots,
                                &queries,
                                &message_factory,
                                &task_manager,
                            )
                            .await;
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "channel listener failed; dispatcher stopping");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    })
}

async fn dispatch<E: QueryExecutor + 'static>(
    payload: &str,
    namespace: &Namespace,
    sequence: Sequence,
    ballots: &Ballots,
    queries: &Arc<Queries<E>>,
    message_factory: &Arc<MessageFactory>,
    task_manager: &Arc<TaskManager>,
) {
    let parsed = match codec::decode(payload) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(error = %err, payload, "failed to decode payload");
            return;
        }
    };

    if &parsed.namespace != namespace {
        tracing::warn!(
            expected = %namespace,
            received = %parsed.namespace,
            "ignoring message due to namespace mismatch"
        );
        return;
    }

    match parsed.kind {
        MessageType::Ping => {
            handle_ping(parsed.sequence, sequence, queries.clone(), message_factory.clone(), task_manager);
        }
        MessageType::Pong => {
            ballots.lock().await.push(parsed);
        }
    }
}

/// If our sequence is live and at least the incoming Ping's sequence,
/// respond with a Pong stamped with our own sequence. The `>=` (not `>`)
/// is essential: it is how a lone peer wins by responding to its own
/// Ping, and how the globally-highest-sequence peer responds to every
/// probe including its own.
fn handle_ping<E: QueryExecutor + 'static>(
    incoming_sequence: Sequence,
    local_sequence: Sequence,
    queries: Arc<Queries<E>>,
    message_factory: Arc<MessageFactory>,
    task_manager: &Arc<TaskManager>,
) {
    if !(local_sequence.is_live() && local_sequence >= incoming_sequence) {
        return;
    }
    let task_manager = task_manager.clone();
    let handle = tokio::spawn(async move {
        let pong = message_factory.create_pong(local_sequence);
        queries.notify(&pong).await
    });
    task_manager.add(handle);
}
