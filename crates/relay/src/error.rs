use crate::transport::TransportError;

/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort handling of a single event or a whole session.
///
/// Resolution and delivery failures of operator replies are not errors: they
/// are reported inline and surface as [`crate::ReplyOutcome`] variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport call failed while relaying an inbound message.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: TransportError,
    },

    /// The event feed of a session ended or broke.
    #[error("event feed failed: {0}")]
    Feed(#[source] TransportError),

    /// The event feed closed without an error.
    #[error("event feed closed")]
    FeedClosed,

    /// The session task panicked.
    #[error("session task panicked: {0}")]
    Panicked(String),

    /// Connecting a new transport session failed.
    #[error("connect failed: {0}")]
    Connect(#[source] TransportError),
}

impl Error {
    #[must_use]
    pub fn transport(context: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }
}
