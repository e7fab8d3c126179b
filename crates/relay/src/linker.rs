use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    Error, Result,
    ack::Acknowledger,
    annotation::{self, AnnotationError},
    transport::{Transport, TransportError},
    types::{ChatId, MessageId, RelayMessage},
};

/// Posted instead of forwarded content that carries an identity line of its
/// own. A verbatim copy would be authored by the relay and read back as an
/// annotation.
pub const WITHHELD_NOTICE: &str = "⚠️ Forwarded content withheld: it contains an identity line. \
     Ask the user to send it as plain text.";

/// The two messages the relay posts into the operator chat for one inbound
/// message. Returned for logging only; nothing keeps it around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayPair {
    /// The user's message in the operator chat: a forward, or a plain copy
    /// when the user's message was itself forwarded from someone else.
    pub forwarded: MessageId,
    /// Identity annotation, posted as a reply to `forwarded`.
    pub annotation: MessageId,
}

/// Mirrors end-user messages into the operator chat.
pub struct Linker<T> {
    transport: Arc<T>,
    ack: Acknowledger<T>,
    operator_chat: ChatId,
    received_reaction: String,
}

impl<T: Transport> Linker<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, operator_chat: ChatId, received_reaction: String) -> Self {
        Self {
            ack: Acknowledger::new(Arc::clone(&transport)),
            transport,
            operator_chat,
            received_reaction,
        }
    }

    /// Forward `inbound` and post its annotation.
    ///
    /// Returns `Ok(None)` without touching the transport when the sender is
    /// unknown or is the operator account itself.
    pub async fn link(&self, inbound: &RelayMessage) -> Result<Option<RelayPair>> {
        let Some(sender) = inbound.sender.as_ref() else {
            debug!(chat_id = %inbound.chat_id, "inbound message without sender, not relayed");
            return Ok(None);
        };
        if sender.id.as_chat() == Some(self.operator_chat) {
            debug!(user_id = %sender.id, "message from the operator account, not relayed");
            return Ok(None);
        }

        let forwarded = self
            .post_content(inbound)
            .await
            .map_err(|e| Error::transport("forward to operator chat", e))?;

        // The annotation replies to the forward, so it can only be sent once
        // the forward's id is known.
        let annotation = self
            .transport
            .send_message(
                self.operator_chat,
                &annotation::encode(sender),
                Some(forwarded),
            )
            .await
            .map_err(|e| Error::transport("send annotation", e))?;

        self.ack
            .react(inbound.chat_id, inbound.message_id, &self.received_reaction)
            .await;

        info!(
            user_id = %sender.id,
            chat_id = %inbound.chat_id,
            forwarded = %forwarded,
            annotation = %annotation,
            "relayed user message to operator chat"
        );

        Ok(Some(RelayPair {
            forwarded,
            annotation,
        }))
    }

    /// Put the user's content into the operator chat.
    ///
    /// A forward of a forward keeps the origin of the first author, which
    /// would route replies to that third party. Such messages are copied so
    /// the annotation stays the only identity signal.
    async fn post_content(
        &self,
        inbound: &RelayMessage,
    ) -> std::result::Result<MessageId, TransportError> {
        if inbound.forward_origin.is_none() {
            return self
                .transport
                .forward_message(self.operator_chat, inbound.chat_id, inbound.message_id)
                .await;
        }

        if carries_identity_line(inbound) {
            debug!(
                chat_id = %inbound.chat_id,
                message_id = %inbound.message_id,
                "forwarded content carries an identity line, withholding it"
            );
            return self
                .transport
                .send_message(self.operator_chat, WITHHELD_NOTICE, None)
                .await;
        }

        self.transport
            .copy_message(self.operator_chat, inbound.chat_id, inbound.message_id)
            .await
    }
}

fn carries_identity_line(message: &RelayMessage) -> bool {
    message
        .text
        .as_deref()
        .is_some_and(|text| annotation::decode(text) != Err(AnnotationError::MissingId))
}
