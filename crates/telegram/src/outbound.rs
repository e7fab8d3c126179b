use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    ferry_relay::{ChatId, MessageId, Transport, TransportError},
    teloxide::{
        RequestError,
        payloads::{SendMessageSetters, SetMessageReactionSetters},
        prelude::*,
        types::{self as tg, ReactionType, ReplyParameters},
    },
    tracing::{debug, warn},
};

use crate::error::request_error_to_transport;

/// Outbound primitives backed by the Telegram Bot API.
pub struct TelegramTransport {
    bot: Bot,
    retry_after_max_retries: usize,
}

impl TelegramTransport {
    #[must_use]
    pub fn new(bot: Bot, retry_after_max_retries: usize) -> Self {
        Self {
            bot,
            retry_after_max_retries,
        }
    }

    /// Run a Bot API request, sleeping and retrying while Telegram answers
    /// with `retry_after`. Any other error is returned as-is.
    async fn run_with_retry<T, F, Fut>(
        &self,
        chat: ChatId,
        operation: &'static str,
        mut request: F,
    ) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(request_error_to_transport(err));
                    };

                    if retries >= self.retry_after_max_retries {
                        warn!(
                            chat_id = %chat,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(request_error_to_transport(err));
                    }

                    retries += 1;
                    warn!(
                        chat_id = %chat,
                        operation,
                        retries,
                        max_retries = self.retry_after_max_retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

fn tg_chat(chat: ChatId) -> tg::ChatId {
    tg::ChatId(chat.0)
}

fn tg_message(id: MessageId) -> tg::MessageId {
    tg::MessageId(id.0)
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageId, TransportError> {
        let forwarded = self
            .run_with_retry(to, "forward message", || {
                let req = self
                    .bot
                    .forward_message(tg_chat(to), tg_chat(from), tg_message(message_id));
                async move { req.await }
            })
            .await?;
        debug!(chat_id = %to, from = %from, message_id = forwarded.id.0, "forwarded message");
        Ok(MessageId(forwarded.id.0))
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageId, TransportError> {
        let copied = self
            .run_with_retry(to, "copy message", || {
                let req = self
                    .bot
                    .copy_message(tg_chat(to), tg_chat(from), tg_message(message_id));
                async move { req.await }
            })
            .await?;
        debug!(chat_id = %to, from = %from, message_id = copied.0, "copied message");
        Ok(MessageId(copied.0))
    }

    async fn send_message(
        &self,
        to: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, TransportError> {
        let sent = self
            .run_with_retry(to, "send message", || {
                let mut req = self.bot.send_message(tg_chat(to), text);
                if let Some(id) = reply_to {
                    req = req.reply_parameters(
                        ReplyParameters::new(tg_message(id)).allow_sending_without_reply(),
                    );
                }
                async move { req.await }
            })
            .await?;
        Ok(MessageId(sent.id.0))
    }

    async fn set_reaction(
        &self,
        chat: ChatId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<(), TransportError> {
        self.run_with_retry(chat, "set reaction", || {
            let req = self
                .bot
                .set_message_reaction(tg_chat(chat), tg_message(message_id))
                .reaction(vec![ReactionType::Emoji {
                    emoji: emoji.to_string(),
                }]);
            async move { req.await }
        })
        .await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::mock_api::MockBotApi, serde_json::json};

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(teloxide::types::Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert_eq!(retry_after_duration(&err), None);
    }

    #[tokio::test]
    async fn copy_to_blocked_user_is_rejected_with_api_text() {
        let api = MockBotApi::start().await;
        api.fail("CopyMessage", 403, "Forbidden: bot was blocked by the user");
        let transport = TelegramTransport::new(api.bot(), 0);

        let err = transport
            .copy_message(ChatId(555), ChatId(-100_777), MessageId(12))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Rejected("Forbidden: bot was blocked by the user".into())
        );
        api.shutdown().await;
    }

    #[tokio::test]
    async fn copy_returns_new_message_id() {
        let api = MockBotApi::start().await;
        let transport = TelegramTransport::new(api.bot(), 0);

        let id = transport
            .copy_message(ChatId(555), ChatId(-100_777), MessageId(12))
            .await
            .unwrap();
        assert_eq!(id, MessageId(77));

        let calls = api.calls("CopyMessage");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["chat_id"], json!(555));
        assert_eq!(calls[0]["from_chat_id"], json!(-100_777));
        assert_eq!(calls[0]["message_id"], json!(12));
        api.shutdown().await;
    }

    #[tokio::test]
    async fn annotation_is_sent_as_plain_text_reply() {
        let api = MockBotApi::start().await;
        let transport = TelegramTransport::new(api.bot(), 0);

        transport
            .send_message(ChatId(-100_777), "ID: `555`", Some(MessageId(10)))
            .await
            .unwrap();

        let calls = api.calls("SendMessage");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["text"], json!("ID: `555`"));
        assert!(calls[0].get("parse_mode").is_none(), "{:?}", calls[0]);
        assert_eq!(calls[0]["reply_parameters"]["message_id"], json!(10));
        api.shutdown().await;
    }

    #[tokio::test]
    async fn reaction_carries_emoji() {
        let api = MockBotApi::start().await;
        let transport = TelegramTransport::new(api.bot(), 0);

        transport
            .set_reaction(ChatId(555), MessageId(3), "👀")
            .await
            .unwrap();

        let calls = api.calls("SetMessageReaction");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["reaction"][0]["type"], json!("emoji"));
        assert_eq!(calls[0]["reaction"][0]["emoji"], json!("👀"));
        api.shutdown().await;
    }

    #[tokio::test]
    async fn forward_returns_forwarded_id() {
        let api = MockBotApi::start().await;
        let transport = TelegramTransport::new(api.bot(), 0);

        let id = transport
            .forward_message(ChatId(-100_777), ChatId(555), MessageId(3))
            .await
            .unwrap();
        assert_eq!(id, MessageId(1));
        assert_eq!(api.calls("ForwardMessage").len(), 1);
        api.shutdown().await;
    }
}
