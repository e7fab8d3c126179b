use {
    ferry_relay::TransportError,
    teloxide::{ApiError, RequestError},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for TransportError {
    fn from(error: Error) -> Self {
        match error {
            Error::Telegram(e) => request_error_to_transport(e),
            Error::Reqwest(e) => TransportError::Network(e.to_string()),
            Error::Message { message } => TransportError::Other(message),
        }
    }
}

/// Errors meaning the recipient cannot be reached at all, as opposed to a
/// malformed request or a transient failure.
#[must_use]
pub fn is_unreachable_recipient(error: &ApiError) -> bool {
    matches!(
        error,
        ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::UserDeactivated
            | ApiError::CantInitiateConversation
            | ApiError::CantTalkWithBots
            | ApiError::ChatNotFound
            | ApiError::UserNotFound
    )
}

/// Map a teloxide failure onto the relay's transport taxonomy. Rejections
/// keep the Bot API's own description so operators see it verbatim.
#[must_use]
pub fn request_error_to_transport(error: RequestError) -> TransportError {
    match error {
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates) => TransportError::Conflict,
        RequestError::Api(ref api) if is_unreachable_recipient(api) => {
            TransportError::Rejected(api.to_string())
        },
        RequestError::Network(ref e) => TransportError::Network(e.to_string()),
        other => TransportError::Other(other.to_string()),
    }
}
