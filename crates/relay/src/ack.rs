//! Best-effort reactions.

use std::sync::Arc;

use tracing::debug;

use crate::{
    transport::Transport,
    types::{ChatId, MessageId},
};

/// Emoji used for acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reactions {
    /// Set on an end-user's message once it reached the operator chat.
    pub received: String,
    /// Set on the operator's reply (and the relayed pair) once delivered.
    pub delivered: String,
}

impl Default for Reactions {
    fn default() -> Self {
        Self {
            received: "👀".into(),
            delivered: "👍".into(),
        }
    }
}

/// Applies reactions and swallows every failure.
///
/// This is the only place where a reaction result is inspected; callers get
/// `()` back and cannot propagate anything.
pub struct Acknowledger<T> {
    transport: Arc<T>,
}

impl<T: Transport> Acknowledger<T> {
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn react(&self, chat: ChatId, message_id: MessageId, emoji: &str) {
        if emoji.is_empty() {
            return;
        }
        if let Err(e) = self.transport.set_reaction(chat, message_id, emoji).await {
            debug!(
                chat_id = %chat,
                message_id = %message_id,
                error = %e,
                "acknowledgement reaction failed"
            );
        }
    }
}
