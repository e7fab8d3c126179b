//! Telegram transport for ferry.
//!
//! Implements the relay's [`Transport`](ferry_relay::Transport) and
//! [`EventSource`](ferry_relay::EventSource) seams on top of teloxide:
//! long polling for updates, forward/copy/send/react for outbound traffic.

pub mod bot;
pub mod config;
pub mod error;
pub mod inbound;
pub mod outbound;

#[cfg(test)]
mod mock_api;

pub use {
    bot::{TelegramConnector, UpdateFeed},
    config::TelegramConfig,
    error::{Error, Result},
    outbound::TelegramTransport,
};
