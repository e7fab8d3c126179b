//! Conversion of teloxide messages into the relay's message model.

use {
    ferry_relay::{ChatId, ChatKind, ForwardOrigin, MessageId, RelayMessage, SenderIdentity, UserId},
    teloxide::types::{Chat, Message, MessageOrigin, User},
};

/// Convert a Telegram message, following `reply_to_message` as far as the
/// Bot API includes it (one level for updates).
#[must_use]
pub fn to_relay_message(msg: &Message) -> RelayMessage {
    RelayMessage {
        chat_id: ChatId(msg.chat.id.0),
        chat_kind: classify_chat(&msg.chat),
        message_id: MessageId(msg.id.0),
        sender: msg.from.as_ref().map(sender_identity),
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
        forward_origin: msg.forward_origin().map(forward_origin),
        reply_to: msg
            .reply_to_message()
            .map(|reply| Box::new(to_relay_message(reply))),
    }
}

#[must_use]
pub fn sender_identity(user: &User) -> SenderIdentity {
    SenderIdentity {
        id: UserId(user.id.0),
        display_name: display_name(user),
        handle: user.username.clone(),
        is_bot: user.is_bot,
    }
}

fn display_name(user: &User) -> String {
    let first = &user.first_name;
    let last = user.last_name.as_deref().unwrap_or("");
    let name = format!("{first} {last}").trim().to_string();
    if name.is_empty() {
        user.username
            .clone()
            .unwrap_or_else(|| format!("user {}", user.id.0))
    } else {
        name
    }
}

fn forward_origin(origin: &MessageOrigin) -> ForwardOrigin {
    match origin {
        MessageOrigin::User { sender_user, .. } => ForwardOrigin::User(sender_identity(sender_user)),
        MessageOrigin::HiddenUser {
            sender_user_name, ..
        } => ForwardOrigin::HiddenUser {
            name: sender_user_name.clone(),
        },
        MessageOrigin::Chat { sender_chat, .. } => ForwardOrigin::Chat {
            chat_id: ChatId(sender_chat.id.0),
        },
        MessageOrigin::Channel { chat, .. } => ForwardOrigin::Chat {
            chat_id: ChatId(chat.id.0),
        },
    }
}

fn classify_chat(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Group
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn alice() -> serde_json::Value {
        json!({
            "id": 555,
            "is_bot": false,
            "first_name": "Alice",
            "last_name": "Smith",
            "username": "alice"
        })
    }

    fn bot_user() -> serde_json::Value {
        json!({ "id": 9000, "is_bot": true, "first_name": "Ferry", "username": "ferry_bot" })
    }

    fn group() -> serde_json::Value {
        json!({ "id": -100_777, "type": "supergroup", "title": "Support" })
    }

    #[test]
    fn private_text_message() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 3,
            "date": 1,
            "chat": { "id": 555, "type": "private", "first_name": "Alice" },
            "from": alice(),
            "text": "hello"
        }))
        .expect("deserialize text message");

        let relay = to_relay_message(&msg);
        assert_eq!(relay.chat_id, ChatId(555));
        assert_eq!(relay.chat_kind, ChatKind::Private);
        assert_eq!(relay.message_id, MessageId(3));
        assert_eq!(relay.text.as_deref(), Some("hello"));
        let sender = relay.sender.unwrap();
        assert_eq!(sender.id, UserId(555));
        assert_eq!(sender.display_name, "Alice Smith");
        assert_eq!(sender.handle.as_deref(), Some("alice"));
        assert!(!sender.is_bot);
        assert!(relay.forward_origin.is_none());
        assert!(relay.reply_to.is_none());
    }

    #[test]
    fn photo_caption_is_used_as_text() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 4,
            "date": 1,
            "chat": { "id": 555, "type": "private", "first_name": "Alice" },
            "from": alice(),
            "caption": "look at this",
            "photo": [{
                "file_id": "photo-id",
                "file_unique_id": "photo-unique",
                "width": 10,
                "height": 10,
                "file_size": 100
            }]
        }))
        .expect("deserialize photo message");

        assert_eq!(
            to_relay_message(&msg).text.as_deref(),
            Some("look at this")
        );
    }

    #[test]
    fn visible_forward_origin() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 10,
            "date": 2,
            "chat": group(),
            "from": bot_user(),
            "forward_origin": { "type": "user", "date": 1, "sender_user": alice() },
            "text": "hello"
        }))
        .expect("deserialize forwarded message");

        let relay = to_relay_message(&msg);
        assert_eq!(relay.chat_kind, ChatKind::Group);
        match relay.forward_origin {
            Some(ForwardOrigin::User(sender)) => assert_eq!(sender.id, UserId(555)),
            other => panic!("unexpected origin: {other:?}"),
        }
    }

    #[test]
    fn hidden_forward_origin() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 10,
            "date": 2,
            "chat": group(),
            "from": bot_user(),
            "forward_origin": { "type": "hidden_user", "date": 1, "sender_user_name": "Alice" },
            "text": "hello"
        }))
        .expect("deserialize hidden forward");

        assert_eq!(
            to_relay_message(&msg).forward_origin,
            Some(ForwardOrigin::HiddenUser {
                name: "Alice".into()
            })
        );
    }

    #[test]
    fn reply_to_annotation_is_nested() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": 12,
            "date": 3,
            "chat": group(),
            "from": { "id": 42, "is_bot": false, "first_name": "Operator" },
            "text": "hi",
            "reply_to_message": {
                "message_id": 11,
                "date": 2,
                "chat": group(),
                "from": bot_user(),
                "text": "📨 Relayed message · v1\nName: Alice Smith\nHandle: @alice\nID: `555`"
            }
        }))
        .expect("deserialize reply");

        let relay = to_relay_message(&msg);
        let referenced = relay.reply_to.expect("reply reference");
        assert_eq!(referenced.message_id, MessageId(11));
        assert_eq!(referenced.sender.map(|s| s.id), Some(UserId(9000)));
        assert_eq!(
            ferry_relay::Resolver::new(Some(UserId(9000))).resolve(&to_relay_message(
                msg.reply_to_message().unwrap()
            )),
            Some(UserId(555))
        );
    }

    #[test]
    fn nameless_user_falls_back_to_handle() {
        let user: User = serde_json::from_value(json!({
            "id": 8,
            "is_bot": false,
            "first_name": "",
            "username": "ghost"
        }))
        .unwrap();
        assert_eq!(sender_identity(&user).display_name, "ghost");
    }
}
