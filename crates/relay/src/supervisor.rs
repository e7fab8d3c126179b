//! Keeps a relay session running for the lifetime of the process.

use std::{sync::Arc, time::Duration};

use {
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use crate::{
    Error, Result,
    ack::Reactions,
    dispatch::Dispatcher,
    resolver::Resolver,
    transport::{Connector, EventSource, Session},
    types::ChatId,
};

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub operator_chat: ChatId,
    /// Fixed pause between a failure and the next connect.
    pub restart_delay: Duration,
    /// Consecutive failures after which every further failure is logged as
    /// a crash loop. `0` disables the alert.
    pub alert_after_failures: u32,
    pub reactions: Reactions,
}

impl SupervisorConfig {
    #[must_use]
    pub fn new(operator_chat: ChatId) -> Self {
        Self {
            operator_chat,
            restart_delay: Duration::from_secs(5),
            alert_after_failures: 5,
            reactions: Reactions::default(),
        }
    }
}

/// Restarts the relay session from scratch whenever it fails.
pub struct Supervisor<C> {
    connector: Arc<C>,
    config: SupervisorConfig,
    cancel: CancellationToken,
}

/// What a finished session left behind.
struct SessionReport {
    events: u64,
    result: Result<()>,
}

impl<C: Connector + 'static> Supervisor<C> {
    #[must_use]
    pub fn new(connector: C, config: SupervisorConfig, cancel: CancellationToken) -> Self {
        Self {
            connector: Arc::new(connector),
            config,
            cancel,
        }
    }

    /// Run until the cancellation token fires.
    ///
    /// Every failure, including a panic inside the session, is logged and
    /// followed by a fixed delay and a fresh connect. There is no retry limit.
    pub async fn run(&self) {
        let mut consecutive_failures: u32 = 0;

        loop {
            let session = tokio::spawn(run_session(
                Arc::clone(&self.connector),
                self.config.clone(),
                self.cancel.child_token(),
            ));
            let report = session.await.unwrap_or_else(|e| SessionReport {
                events: 0,
                result: Err(Error::Panicked(e.to_string())),
            });

            if self.cancel.is_cancelled() {
                info!("relay supervisor stopped");
                return;
            }

            if report.events > 0 {
                consecutive_failures = 0;
            }
            consecutive_failures = consecutive_failures.saturating_add(1);

            let reason = match report.result {
                Ok(()) => "session ended".to_string(),
                Err(e) => e.to_string(),
            };
            error!(
                error = %reason,
                events = report.events,
                consecutive_failures,
                restart_in_ms = self.config.restart_delay.as_millis() as u64,
                "relay session failed, restarting"
            );
            let threshold = self.config.alert_after_failures;
            if threshold > 0 && consecutive_failures >= threshold {
                error!(
                    consecutive_failures,
                    threshold, "relay is crash looping: sessions keep failing without progress"
                );
            }

            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("relay supervisor stopped");
                    return;
                },
                () = tokio::time::sleep(self.config.restart_delay) => {},
            }
        }
    }
}

async fn run_session<C: Connector>(
    connector: Arc<C>,
    config: SupervisorConfig,
    cancel: CancellationToken,
) -> SessionReport {
    let mut events = 0;
    let result = consume(connector.as_ref(), config, &cancel, &mut events).await;
    SessionReport { events, result }
}

async fn consume<C: Connector>(
    connector: &C,
    config: SupervisorConfig,
    cancel: &CancellationToken,
    events: &mut u64,
) -> Result<()> {
    let Session {
        transport,
        events: mut feed,
        relay_user,
    } = connector.connect().await.map_err(Error::Connect)?;

    let dispatcher = Dispatcher::new(
        transport,
        config.operator_chat,
        Resolver::new(relay_user),
        config.reactions,
    );
    info!(
        operator_chat = %config.operator_chat,
        relay_user = ?relay_user.map(|u| u.0),
        "relay session started"
    );

    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            next = feed.next_event() => next,
        };
        let message = next.map_err(Error::Feed)?.ok_or(Error::FeedClosed)?;
        *events += 1;

        let chat_id = message.chat_id;
        let message_id = message.message_id;
        if let Err(e) = dispatcher.handle(message).await {
            warn!(%chat_id, %message_id, error = %e, "failed to relay message");
        }
    }
}
