use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    Result,
    ack::{Acknowledger, Reactions},
    linker::{Linker, RelayPair},
    resolver::Resolver,
    transport::{Transport, TransportError},
    types::{ChatId, ChatKind, MessageId, RelayMessage, UserId},
};

/// Notice posted when an operator reply cannot be traced back to a user.
pub const UNRESOLVED_NOTICE: &str = "⚠️ Could not resolve the recipient of this reply. \
     Reply to the identity card (the message ending in \"ID: `…`\") instead.";

/// Where an incoming message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// End-user message to mirror into the operator chat.
    Inbound,
    /// Operator reply to route back to a user.
    OperatorReply,
    /// Nothing to do.
    Ignore(&'static str),
}

/// Terminal state of one operator reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Copied to the user; acknowledgements attempted.
    Delivered { user: UserId, message_id: MessageId },
    /// No signal identified the user; the operator was told.
    Unresolved,
    /// The platform refused the copy; the operator was told why.
    SendFailed { user: UserId, error: TransportError },
}

/// Routes messages between end-users and the operator chat.
///
/// Holds no per-conversation state: a new dispatcher is built for every
/// transport session.
pub struct Dispatcher<T> {
    transport: Arc<T>,
    linker: Linker<T>,
    resolver: Resolver,
    ack: Acknowledger<T>,
    operator_chat: ChatId,
    delivered_reaction: String,
}

impl<T: Transport> Dispatcher<T> {
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        operator_chat: ChatId,
        resolver: Resolver,
        reactions: Reactions,
    ) -> Self {
        Self {
            linker: Linker::new(Arc::clone(&transport), operator_chat, reactions.received),
            ack: Acknowledger::new(Arc::clone(&transport)),
            transport,
            resolver,
            operator_chat,
            delivered_reaction: reactions.delivered,
        }
    }

    /// Classify a message.
    #[must_use]
    pub fn route(&self, message: &RelayMessage) -> Route {
        if message.chat_id == self.operator_chat {
            return match &message.sender {
                None => Route::Ignore("operator chat message without sender"),
                Some(sender) if sender.is_bot => Route::Ignore("bot message in operator chat"),
                Some(_) if message.reply_to.is_none() => {
                    Route::Ignore("operator message is not a reply")
                },
                Some(_) => Route::OperatorReply,
            };
        }

        match message.chat_kind {
            ChatKind::Private if message.is_command() => Route::Ignore("command"),
            ChatKind::Private if message.sender.is_none() => Route::Ignore("message without sender"),
            ChatKind::Private => Route::Inbound,
            ChatKind::Group | ChatKind::Channel => Route::Ignore("not a private conversation"),
        }
    }

    /// Handle one event from the transport feed.
    ///
    /// Only failures to relay an inbound message are returned; operator reply
    /// failures are reported to the operator chat and end here.
    pub async fn handle(&self, message: RelayMessage) -> Result<()> {
        match self.route(&message) {
            Route::Inbound => self.on_inbound(&message).await.map(|_| ()),
            Route::OperatorReply => {
                self.on_operator_reply(&message).await;
                Ok(())
            },
            Route::Ignore(reason) => {
                debug!(
                    chat_id = %message.chat_id,
                    message_id = %message.message_id,
                    reason,
                    "ignoring message"
                );
                Ok(())
            },
        }
    }

    pub async fn on_inbound(&self, message: &RelayMessage) -> Result<Option<RelayPair>> {
        self.linker.link(message).await
    }

    pub async fn on_operator_reply(&self, reply: &RelayMessage) -> ReplyOutcome {
        let Some(user) = reply
            .reply_to
            .as_deref()
            .and_then(|referenced| self.resolver.resolve(referenced))
        else {
            info!(message_id = %reply.message_id, "operator reply could not be resolved");
            self.report(reply.message_id, UNRESOLVED_NOTICE).await;
            return ReplyOutcome::Unresolved;
        };

        let sent = match user.as_chat() {
            Some(chat) => {
                self.transport
                    .copy_message(chat, self.operator_chat, reply.message_id)
                    .await
            },
            None => Err(TransportError::rejected(format!(
                "user id {user} is not addressable"
            ))),
        };

        match sent {
            Ok(message_id) => {
                info!(user_id = %user, message_id = %reply.message_id, "delivered operator reply");
                self.acknowledge(reply).await;
                ReplyOutcome::Delivered { user, message_id }
            },
            Err(error) => {
                warn!(user_id = %user, error = %error, "operator reply delivery failed");
                self.report(
                    reply.message_id,
                    &format!("⚠️ Could not deliver this reply to user {user}: {error}"),
                )
                .await;
                ReplyOutcome::SendFailed { user, error }
            },
        }
    }

    /// React on the operator's reply and on the relayed message it points at,
    /// plus the forwarded copy when that message is an annotation.
    async fn acknowledge(&self, reply: &RelayMessage) {
        let emoji = self.delivered_reaction.as_str();
        self.ack.react(self.operator_chat, reply.message_id, emoji).await;

        let Some(referenced) = reply.reply_to.as_deref() else {
            return;
        };
        // Earlier operator replies in a chain are not part of the pair.
        if referenced.chat_id != self.operator_chat
            || !self.resolver.is_relay_message(referenced)
        {
            return;
        }
        self.ack
            .react(self.operator_chat, referenced.message_id, emoji)
            .await;

        // An annotation replies to its forwarded copy.
        if self.resolver.is_relay_authored(referenced)
            && let Some(copy) = referenced.reply_to.as_deref()
            && copy.chat_id == self.operator_chat
        {
            self.ack.react(self.operator_chat, copy.message_id, emoji).await;
        }
    }

    async fn report(&self, reply_to: MessageId, text: &str) {
        if let Err(e) = self
            .transport
            .send_message(self.operator_chat, text, Some(reply_to))
            .await
        {
            warn!(error = %e, "failed to report to operator chat");
        }
    }
}
