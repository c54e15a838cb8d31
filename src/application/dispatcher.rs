//! Dispatcher - reads messages from a transport and feeds the router.
//!
//! Each conversation key gets its own worker task fed through a channel, so
//! one user's messages are handled in arrival order while different users
//! are served concurrently. Idle workers exit after `WORKER_IDLE`; a worker
//! started for a key whose previous worker is still draining waits for it
//! to finish first.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, error, warn};

use super::router::MessageRouter;
use crate::domain::foundation::ConversationKey;
use crate::ports::{InboundMessage, Transport, TransportError};

const WORKER_IDLE: Duration = Duration::from_secs(60);

struct Worker {
    sender: mpsc::UnboundedSender<InboundMessage>,
    /// Resolves once the worker task has returned.
    done: oneshot::Receiver<()>,
}

impl Worker {
    fn is_running(&mut self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Serves `transport` until it runs out of messages.
///
/// Malformed input lines are logged and skipped. Returns once every
/// accepted message has been answered, or with the first I/O error.
pub async fn serve<T>(router: Arc<MessageRouter>, transport: Arc<T>) -> Result<(), TransportError>
where
    T: Transport + 'static,
{
    let mut workers: HashMap<ConversationKey, Worker> = HashMap::new();
    let mut tasks = JoinSet::new();

    let outcome = loop {
        let message = match transport.receive().await {
            Ok(Some(message)) => message,
            Ok(None) => break Ok(()),
            Err(TransportError::Malformed(reason)) => {
                warn!(reason = %reason, "Skipping malformed message");
                continue;
            }
            Err(err) => break Err(err),
        };

        let key = message.key();
        let message = match workers.get(&key) {
            Some(worker) => match worker.sender.send(message) {
                Ok(()) => continue,
                // The worker went idle and closed; start a new one.
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let previous = workers.remove(&key).map(|worker| worker.done);
        workers.retain(|_, worker| worker.is_running());
        while tasks.try_join_next().is_some() {}

        let (sender, receiver) = mpsc::unbounded_channel();
        let (finished, done) = oneshot::channel();
        workers.insert(key, Worker { sender, done });
        debug!(chat_id = %key.chat_id, user_id = %key.user_id, "Starting conversation worker");
        tasks.spawn(key_worker(
            router.clone(),
            transport.clone(),
            previous,
            message,
            receiver,
            finished,
        ));
    };

    drop(workers);
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            error!(error = %err, "Conversation worker failed");
        }
    }
    outcome
}

/// Serves one key until idle. `_finished` is dropped on return, which is
/// what a successor waiting on `previous` observes.
async fn key_worker<T: Transport>(
    router: Arc<MessageRouter>,
    transport: Arc<T>,
    previous: Option<oneshot::Receiver<()>>,
    first: InboundMessage,
    mut receiver: mpsc::UnboundedReceiver<InboundMessage>,
    _finished: oneshot::Sender<()>,
) {
    if let Some(previous) = previous {
        previous.await.ok();
    }
    deliver(&router, transport.as_ref(), first).await;
    loop {
        match time::timeout(WORKER_IDLE, receiver.recv()).await {
            Ok(Some(message)) => deliver(&router, transport.as_ref(), message).await,
            Ok(None) => return,
            Err(_) => {
                receiver.close();
                while let Ok(message) = receiver.try_recv() {
                    deliver(&router, transport.as_ref(), message).await;
                }
                return;
            }
        }
    }
}

async fn deliver<T: Transport>(router: &MessageRouter, transport: &T, message: InboundMessage) {
    for reply in router.handle(message).await {
        if let Err(err) = transport.send(&reply).await {
            error!(chat_id = %reply.chat_id, error = %err, "Failed to deliver reply");
            return;
        }
    }
}
