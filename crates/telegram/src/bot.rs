use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicI32, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    ferry_relay::{Connector, EventSource, RelayMessage, Session, TransportError, UserId},
    secrecy::ExposeSecret,
    teloxide::{
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tracing::{debug, info},
};

use crate::{
    config::TelegramConfig,
    error::{Error, request_error_to_transport},
    inbound::to_relay_message,
    outbound::TelegramTransport,
};

/// Opens Telegram sessions: verifies the token, clears any webhook so long
/// polling works, then hands out a transport and an update feed.
///
/// The update cursor outlives sessions, so a reconnect resumes after the last
/// update handed to the relay instead of replaying the unconfirmed backlog.
pub struct TelegramConnector {
    config: TelegramConfig,
    api_url: Option<reqwest::Url>,
    cursor: Arc<AtomicI32>,
}

impl TelegramConnector {
    #[must_use]
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            api_url: None,
            cursor: Arc::new(AtomicI32::new(0)),
        }
    }

    /// Point the bot at a different Bot API server.
    #[must_use]
    pub fn with_api_url(mut self, url: reqwest::Url) -> Self {
        self.api_url = Some(url);
        self
    }

    fn build_bot(&self) -> crate::Result<Bot> {
        if !self.config.has_token() {
            return Err(Error::message("telegram token is empty"));
        }
        // The client timeout must outlast the long-polling timeout or the
        // request is aborted before Telegram answers.
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .build()?;
        let bot = Bot::with_client(self.config.token.expose_secret(), client);
        Ok(match &self.api_url {
            Some(url) => bot.set_api_url(url.clone()),
            None => bot,
        })
    }
}

#[async_trait]
impl Connector for TelegramConnector {
    type Events = UpdateFeed;
    type Transport = TelegramTransport;

    async fn connect(&self) -> Result<Session<TelegramTransport, UpdateFeed>, TransportError> {
        let bot = self.build_bot()?;

        let me = bot.get_me().await.map_err(request_error_to_transport)?;
        bot.delete_webhook()
            .send()
            .await
            .map_err(request_error_to_transport)?;

        info!(
            username = ?me.username,
            bot_id = me.id.0,
            offset = self.cursor.load(Ordering::Relaxed),
            "telegram bot connected (webhook cleared)"
        );

        Ok(Session {
            transport: Arc::new(TelegramTransport::new(
                bot.clone(),
                self.config.retry_after_max_retries,
            )),
            events: UpdateFeed::new(
                bot,
                self.config.poll_timeout_secs,
                Arc::clone(&self.cursor),
            ),
            relay_user: Some(UserId(me.id.0)),
        })
    }
}

/// Long-polling `getUpdates` feed.
///
/// `cursor` holds the offset of the next update to ask for. It moves past an
/// update as soon as the update is handed out, so delivery is at most once:
/// an update whose handling crashed the session is not fetched again.
pub struct UpdateFeed {
    bot: Bot,
    cursor: Arc<AtomicI32>,
    /// Fetched updates with the offset that confirms each one.
    pending: VecDeque<(i32, Option<Message>)>,
    poll_timeout_secs: u32,
}

impl UpdateFeed {
    #[must_use]
    pub fn new(bot: Bot, poll_timeout_secs: u32, cursor: Arc<AtomicI32>) -> Self {
        Self {
            bot,
            cursor,
            pending: VecDeque::new(),
            poll_timeout_secs,
        }
    }

    async fn poll(&mut self) -> Result<(), TransportError> {
        let updates = self
            .bot
            .get_updates()
            .offset(self.cursor.load(Ordering::Relaxed))
            .timeout(self.poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await
            .map_err(request_error_to_transport)?;

        debug!(count = updates.len(), "got telegram updates");
        for update in updates {
            let next = update.id.as_offset();
            match update.kind {
                UpdateKind::Message(msg) => {
                    debug!(chat_id = msg.chat.id.0, "received telegram message");
                    self.pending.push_back((next, Some(msg)));
                },
                other => {
                    debug!("ignoring non-message update: {other:?}");
                    self.pending.push_back((next, None));
                },
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventSource for UpdateFeed {
    async fn next_event(&mut self) -> Result<Option<RelayMessage>, TransportError> {
        loop {
            if let Some((next, msg)) = self.pending.pop_front() {
                self.cursor.store(next, Ordering::Relaxed);
                if let Some(msg) = msg {
                    return Ok(Some(to_relay_message(&msg)));
                }
                continue;
            }
            self.poll().await?;
        }
    }
}
