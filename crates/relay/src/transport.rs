//! Seams between the relay core and a concrete chat platform.

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{ChatId, MessageId, RelayMessage, UserId};

/// Failure reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The platform refused the request for this recipient (blocked bot,
    /// deactivated account, unknown chat). Carries the platform's text.
    #[error("{0}")]
    Rejected(String),

    /// Another process is consuming the same event feed.
    #[error("another instance is consuming updates with the same credential")]
    Conflict,

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Outbound primitives of the chat platform.
///
/// Every call targets `(chat, message)` pairs and returns the id of the
/// message it created.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Forward a message, keeping forward-origin metadata where the sender
    /// allows it.
    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageId, TransportError>;

    /// Copy a message's content without any link to the original.
    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageId, TransportError>;

    /// Send a plain text message, optionally as a reply.
    async fn send_message(
        &self,
        to: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, TransportError>;

    /// Set an emoji reaction on a message.
    async fn set_reaction(
        &self,
        chat: ChatId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError>;
}

/// Ordered feed of inbound messages for one transport session.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next message. `Ok(None)` means the feed closed.
    async fn next_event(&mut self) -> Result<Option<RelayMessage>, TransportError>;
}

/// A live connection: outbound primitives plus the inbound feed.
pub struct Session<T, E> {
    pub transport: Arc<T>,
    pub events: E,
    /// The relay account's own user id, when the platform reports it.
    pub relay_user: Option<UserId>,
}

/// Builds fresh sessions. Called again from scratch after every failure.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport + 'static;
    type Events: EventSource + 'static;

    async fn connect(&self) -> Result<Session<Self::Transport, Self::Events>, TransportError>;
}
