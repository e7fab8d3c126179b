use std::fmt;

/// Chat identifier. Negative for groups, positive for private chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message identifier, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Platform user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl UserId {
    /// The private chat with a user shares the user's numeric id.
    #[must_use]
    pub fn as_chat(self) -> Option<ChatId> {
        i64::try_from(self.0).ok().map(ChatId)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of conversation a message was posted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

/// Who sent a message, as far as the transport tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub id: UserId,
    pub display_name: String,
    /// Public handle without the leading `@`.
    pub handle: Option<String>,
    pub is_bot: bool,
}

impl SenderIdentity {
    #[must_use]
    pub fn new(id: u64, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            display_name: display_name.into(),
            handle: None,
            is_bot: false,
        }
    }

    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    #[must_use]
    pub fn bot(mut self) -> Self {
        self.is_bot = true;
        self
    }
}

/// Forward-origin metadata attached to a forwarded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOrigin {
    /// The original sender is visible.
    User(SenderIdentity),
    /// The original sender hid their account; only a name survives.
    HiddenUser { name: String },
    /// Forwarded on behalf of a chat or channel.
    Chat { chat_id: ChatId },
}

/// A message as seen by the relay core.
///
/// Payload (text, photo, voice, document, ...) stays opaque: the core only
/// reads the text or caption, and only to parse annotations. `reply_to`
/// nests as deep as the transport exposes the reply chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    pub sender: Option<SenderIdentity>,
    pub text: Option<String>,
    pub forward_origin: Option<ForwardOrigin>,
    pub reply_to: Option<Box<RelayMessage>>,
}

impl RelayMessage {
    #[must_use]
    pub fn new(chat_id: ChatId, chat_kind: ChatKind, message_id: MessageId) -> Self {
        Self {
            chat_id,
            chat_kind,
            message_id,
            sender: None,
            text: None,
            forward_origin: None,
            reply_to: None,
        }
    }

    #[must_use]
    pub fn from_sender(mut self, sender: SenderIdentity) -> Self {
        self.sender = Some(sender);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn forwarded_from(mut self, origin: ForwardOrigin) -> Self {
        self.forward_origin = Some(origin);
        self
    }

    #[must_use]
    pub fn replying_to(mut self, message: RelayMessage) -> Self {
        self.reply_to = Some(Box::new(message));
        self
    }

    /// Bot commands start with `/` (`/start`, `/help@my_bot`).
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.text.as_deref().is_some_and(|t| t.starts_with('/'))
    }

    #[must_use]
    pub fn sender_id(&self) -> Option<UserId> {
        self.sender.as_ref().map(|s| s.id)
    }
}
