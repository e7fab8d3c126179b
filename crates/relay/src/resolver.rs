//! Recover the end-user an operator reply is addressed to.

use tracing::debug;

use crate::{
    annotation::{self, AnnotationError},
    types::{ForwardOrigin, RelayMessage, UserId},
};

/// How many reply hops are followed before giving up.
pub const MAX_CHAIN_DEPTH: usize = 8;

/// Stateless identity resolver.
///
/// Signals are tried in a fixed order and the first hit wins:
///
/// 1. forward-origin metadata naming a visible user,
/// 2. an annotation authored by the relay itself,
/// 3. an annotation further up the reply chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    relay_user: Option<UserId>,
}

impl Resolver {
    /// `relay_user` is the relay account's own id. When known, only messages
    /// it authored are trusted as annotations.
    #[must_use]
    pub fn new(relay_user: Option<UserId>) -> Self {
        Self { relay_user }
    }

    /// Resolve the user behind `referenced`, the message an operator replied to.
    #[must_use]
    pub fn resolve(&self, referenced: &RelayMessage) -> Option<UserId> {
        if let Some(ForwardOrigin::User(sender)) = &referenced.forward_origin {
            return Some(sender.id);
        }

        if let Some(id) = self.annotation_id(referenced) {
            return Some(id);
        }

        let mut current = referenced.reply_to.as_deref();
        for _ in 0..MAX_CHAIN_DEPTH {
            let Some(message) = current else {
                break;
            };
            if let Some(id) = self.annotation_id(message) {
                return Some(id);
            }
            current = message.reply_to.as_deref();
        }

        None
    }

    /// Whether `message` could be an annotation posted by this relay.
    #[must_use]
    pub fn is_relay_authored(&self, message: &RelayMessage) -> bool {
        if message.forward_origin.is_some() {
            return false;
        }
        match (self.relay_user, message.sender_id()) {
            (Some(relay), Some(sender)) => relay == sender,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Whether the relay account posted `message`, forwards included.
    ///
    /// Without a known relay id, bot authorship is the best signal left.
    #[must_use]
    pub fn is_relay_message(&self, message: &RelayMessage) -> bool {
        match (self.relay_user, message.sender.as_ref()) {
            (Some(relay), Some(sender)) => relay == sender.id,
            (None, Some(sender)) => sender.is_bot,
            (_, None) => false,
        }
    }

    fn annotation_id(&self, message: &RelayMessage) -> Option<UserId> {
        if !self.is_relay_authored(message) {
            return None;
        }
        let text = message.text.as_deref()?;
        match annotation::decode(text) {
            Ok(id) => Some(id),
            Err(AnnotationError::MissingId) => None,
            Err(e) => {
                debug!(
                    chat_id = %message.chat_id,
                    message_id = %message.message_id,
                    error = %e,
                    "annotation id did not parse"
                );
                None
            },
        }
    }
}
