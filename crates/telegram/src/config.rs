use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Telegram bot settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Chat where relayed messages land and operators answer. Negative for
    /// groups, the operator's user id for a private chat.
    pub operator_chat_id: Option<i64>,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,

    /// HTTP client timeout. Must exceed `poll_timeout_secs`.
    pub request_timeout_secs: u64,

    /// How often a request is retried after a `retry_after` answer.
    pub retry_after_max_retries: usize,
}

impl TelegramConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("operator_chat_id", &self.operator_chat_id)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            operator_chat_id: None,
            poll_timeout_secs: 30,
            request_timeout_secs: 45,
            retry_after_max_retries: 4,
        }
    }
}
