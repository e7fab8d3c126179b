//! Stateless relay between end-users and an operator chat.
//!
//! Every routing fact lives in the transport's own message graph: inbound
//! messages are forwarded into the operator chat together with an
//! [`annotation`] carrying the sender's id, and operator replies are routed
//! back by [`resolver::Resolver`] reading that graph again. Nothing is
//! persisted between events or between transport sessions.

pub mod ack;
pub mod annotation;
pub mod dispatch;
pub mod error;
pub mod linker;
pub mod resolver;
pub mod supervisor;
pub mod transport;
pub mod types;

pub use {
    ack::Reactions,
    dispatch::{Dispatcher, ReplyOutcome, Route},
    error::{Error, Result},
    linker::{Linker, RelayPair},
    resolver::Resolver,
    supervisor::{Supervisor, SupervisorConfig},
    transport::{Connector, EventSource, Session, Transport, TransportError},
    types::{ChatId, ChatKind, ForwardOrigin, MessageId, RelayMessage, SenderIdentity, UserId},
};
