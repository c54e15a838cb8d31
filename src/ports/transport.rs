//! Chat transport port - where messages come from and replies go to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::bot_user::SenderProfile;
use crate::domain::foundation::{ChatId, ConversationKey, Timestamp, UserId};

/// One message received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub text: String,
    /// When the platform received the message. Conversation times use the
    /// local clock instead.
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub sender: Option<SenderProfile>,
}

impl InboundMessage {
    pub fn new(chat_id: ChatId, user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            text: text.into(),
            timestamp: Timestamp::now(),
            sender: None,
        }
    }

    pub fn with_sender(mut self, sender: SenderProfile) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(self.chat_id, self.user_id)
    }
}

/// One reply to deliver, in order, to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    pub chat_id: ChatId,
    pub text: String,
}

impl OutboundReply {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

/// Errors raised by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed inbound message: {0}")]
    Malformed(String),
}

/// Port for receiving messages and delivering replies.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Waits for the next message; `None` once the source is exhausted.
    async fn receive(&self) -> Result<Option<InboundMessage>, TransportError>;

    /// Delivers one reply.
    async fn send(&self, reply: &OutboundReply) -> Result<(), TransportError>;
}
