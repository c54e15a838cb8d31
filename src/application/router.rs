//! MessageRouter - turns one inbound message into the replies to send.
//!
//! For each message the router:
//! 1. takes the per-key lock, held for load, advance and save
//! 2. classifies the text once into a `Command`
//! 3. handles `/start` and `/list` directly (they need the user directory
//!    and record reader), otherwise loads the conversation, expiring it when
//!    stale, and advances the dialogue engine
//! 4. applies the engine's effect, committing through the gateway on
//!    completion
//!
//! `handle` never fails. Validation problems become re-prompts, integrity
//! and connection failures become explanations that keep the user's
//! answers, and anything unexpected (panics included) becomes an apology
//! with nothing further written.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::keyed_locks::KeyedLocks;
use super::retry::RetryPolicy;
use crate::domain::bot_user::SenderProfile;
use crate::domain::dialogue::{
    replies, Command, Conversation, DialogueEngine, Effect, InvalidTransition, Transition,
};
use crate::domain::foundation::{ConversationKey, Pagination, Timestamp};
use crate::ports::{
    ConversationStore, InboundMessage, OutboundReply, PersistenceError, PersistenceGateway,
    RecordReader, StoreError, UserDirectory,
};

/// Failures that end processing of one message with an apology.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Dialogue engine error: {0}")]
    Engine(#[from] InvalidTransition),
}

/// Configuration for the MessageRouter.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Conversations idle for longer than this are discarded on next use.
    pub staleness_threshold: Duration,

    /// Retry policy for storage and commit calls.
    pub retry: RetryPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            staleness_threshold: Duration::from_secs(86_400),
            retry: RetryPolicy::default(),
        }
    }
}

impl RouterConfig {
    /// Create config with custom staleness threshold.
    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    /// Create config with custom retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Ports the router talks to.
#[derive(Clone)]
pub struct RouterPorts {
    pub store: Arc<dyn ConversationStore>,
    pub gateway: Arc<dyn PersistenceGateway>,
    pub users: Arc<dyn UserDirectory>,
    pub records: Arc<dyn RecordReader>,
}

/// Routes inbound messages through the dialogue engine.
pub struct MessageRouter {
    engine: DialogueEngine,
    ports: RouterPorts,
    locks: KeyedLocks<ConversationKey>,
    config: RouterConfig,
}

impl MessageRouter {
    /// Create a new MessageRouter with default configuration.
    pub fn new(engine: DialogueEngine, ports: RouterPorts) -> Self {
        Self::with_config(engine, ports, RouterConfig::default())
    }

    /// Create a new MessageRouter with custom configuration.
    pub fn with_config(engine: DialogueEngine, ports: RouterPorts, config: RouterConfig) -> Self {
        Self {
            engine,
            ports,
            locks: KeyedLocks::new(),
            config,
        }
    }

    pub fn engine(&self) -> &DialogueEngine {
        &self.engine
    }

    /// Processes one message and returns the replies, in order.
    pub async fn handle(&self, message: InboundMessage) -> Vec<OutboundReply> {
        let key = message.key();
        let _guard = self.locks.lock(key).await;

        let texts = match AssertUnwindSafe(self.process(&message)).catch_unwind().await {
            Ok(Ok(texts)) => texts,
            Ok(Err(err)) => {
                error!(
                    chat_id = %key.chat_id,
                    user_id = %key.user_id,
                    error = %err,
                    "Failed to handle message"
                );
                vec![replies::apology()]
            }
            Err(panic) => {
                error!(
                    chat_id = %key.chat_id,
                    user_id = %key.user_id,
                    panic = %panic_message(panic.as_ref()),
                    "Panic while handling message"
                );
                vec![replies::apology()]
            }
        };

        texts
            .into_iter()
            .map(|text| OutboundReply::new(message.chat_id, text))
            .collect()
    }

    async fn process(&self, message: &InboundMessage) -> Result<Vec<String>, RouterError> {
        let key = message.key();
        // Stamped with the local clock, the same one the sweeper compares against.
        let now = Timestamp::now();
        let command = self.engine.classify(&message.text);
        debug!(
            chat_id = %key.chat_id,
            user_id = %key.user_id,
            ?command,
            delay_secs = now.as_unix_secs() - message.timestamp.as_unix_secs(),
            "Routing message"
        );

        match &command {
            Command::Start => return Ok(self.start(message).await),
            Command::List(dialogue) => return self.list(message, dialogue.as_deref()).await,
            _ => {}
        }

        let (current, expired) = self.load_fresh(key, now).await?;
        let transition = self.engine.advance(key, current, command, now)?;

        let mut texts = if expired { vec![replies::expired()] } else { vec![] };
        texts.extend(self.apply(key, transition).await?);
        Ok(texts)
    }

    /// Registers the sender and greets them. Registration problems are
    /// logged but never keep the greeting from going out.
    async fn start(&self, message: &InboundMessage) -> Vec<String> {
        let profile = message
            .sender
            .clone()
            .unwrap_or_else(|| SenderProfile::new(message.user_id, ""));

        let first_name = match self
            .config
            .retry
            .run("register user", || self.ports.users.register(profile.clone()))
            .await
        {
            Ok(user) => {
                info!(user_id = %user.user_id, role = %user.role, "User registered");
                Some(user.first_name)
            }
            Err(err) => {
                warn!(user_id = %message.user_id, error = %err, "Failed to register user");
                message.sender.as_ref().map(|s| s.first_name.clone())
            }
        };

        vec![replies::greeting(first_name.as_deref(), self.engine.catalog())]
    }

    /// Lists one page of a dialogue's records for an administrator.
    ///
    /// The argument is `<dialogue> [page]`, pages counting from 1.
    async fn list(
        &self,
        message: &InboundMessage,
        argument: Option<&str>,
    ) -> Result<Vec<String>, RouterError> {
        let user = self
            .config
            .retry
            .run("find user", || self.ports.users.find(message.user_id))
            .await?;
        if !user.is_some_and(|u| u.is_admin()) {
            return Ok(vec![replies::not_allowed()]);
        }

        let catalog = self.engine.catalog();
        let target = argument.and_then(list_target);
        let Some((definition, page)) =
            target.and_then(|(name, page)| catalog.get(name).map(|d| (d, page)))
        else {
            return Ok(vec![replies::list_usage(catalog)]);
        };

        let limit = Pagination::default().limit;
        let pagination = Pagination::new((page - 1).saturating_mul(limit), limit);
        let page = self
            .config
            .retry
            .run("list records", || {
                self.ports.records.list(&definition.name, pagination)
            })
            .await?;
        Ok(vec![replies::record_page(definition, &page)])
    }

    /// Loads the conversation for `key`, discarding it when stale.
    ///
    /// Returns the live conversation and whether a stale one was dropped.
    async fn load_fresh(
        &self,
        key: ConversationKey,
        now: Timestamp,
    ) -> Result<(Option<Conversation>, bool), RouterError> {
        let retry = self.config.retry;
        let loaded = retry
            .run("load conversation", || self.ports.store.load(key))
            .await?;

        match loaded {
            Some(conversation) if conversation.is_stale(now, self.config.staleness_threshold) => {
                info!(
                    chat_id = %key.chat_id,
                    user_id = %key.user_id,
                    dialogue = conversation.dialogue(),
                    "Expiring stale conversation"
                );
                retry
                    .run("clear conversation", || self.ports.store.clear(key))
                    .await?;
                Ok((None, true))
            }
            other => Ok((other, false)),
        }
    }

    async fn apply(
        &self,
        key: ConversationKey,
        transition: Transition,
    ) -> Result<Vec<String>, RouterError> {
        let Transition { effect, replies: mut texts } = transition;
        let retry = self.config.retry;

        match effect {
            Effect::None => {}
            Effect::Save(conversation) => {
                retry
                    .run("save conversation", || self.ports.store.save(&conversation))
                    .await?;
            }
            Effect::Clear => {
                retry
                    .run("clear conversation", || self.ports.store.clear(key))
                    .await?;
            }
            Effect::Commit(conversation) => texts.extend(self.commit(conversation).await?),
        }

        Ok(texts)
    }

    async fn commit(&self, conversation: Conversation) -> Result<Vec<String>, RouterError> {
        let key = conversation.key();
        let retry = self.config.retry;
        let Some(definition) = self.engine.catalog().get(conversation.dialogue()) else {
            retry
                .run("clear conversation", || self.ports.store.clear(key))
                .await?;
            return Ok(vec![replies::dialogue_gone()]);
        };

        let result = retry
            .run("commit record", || {
                self.ports.gateway.commit(&conversation, definition)
            })
            .await;

        match result {
            Ok(record) => {
                info!(
                    chat_id = %key.chat_id,
                    user_id = %key.user_id,
                    dialogue = %record.dialogue,
                    record_id = %record.id,
                    "Record committed"
                );
                Ok(vec![replies::saved(definition, &conversation)])
            }
            Err(PersistenceError::Integrity(message)) => {
                info!(
                    chat_id = %key.chat_id,
                    user_id = %key.user_id,
                    dialogue = %definition.name,
                    reason = %message,
                    "Commit rejected by integrity constraint"
                );
                retry
                    .run("save conversation", || self.ports.store.save(&conversation))
                    .await?;
                Ok(vec![replies::duplicate_value(&message)])
            }
            Err(PersistenceError::Connection(message)) => {
                warn!(
                    chat_id = %key.chat_id,
                    user_id = %key.user_id,
                    dialogue = %definition.name,
                    error = %message,
                    "Commit failed after retries"
                );
                if let Err(err) = self.ports.store.save(&conversation).await {
                    warn!(
                        chat_id = %key.chat_id,
                        user_id = %key.user_id,
                        error = %err,
                        "Could not keep completed conversation"
                    );
                }
                Ok(vec![replies::temporarily_unavailable()])
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Splits a `/list` argument into a dialogue name and a page number.
fn list_target(argument: &str) -> Option<(&str, u32)> {
    let mut parts = argument.split_whitespace();
    let name = parts.next()?;
    let page = match parts.next() {
        Some(page) => page.parse::<u32>().ok().filter(|page| *page >= 1)?,
        None => 1,
    };
    match parts.next() {
        Some(_) => None,
        None => Some((name, page)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
