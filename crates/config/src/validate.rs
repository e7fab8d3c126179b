//! Turns a loaded [`FerryConfig`] into settings the relay can run with.

use std::{net::IpAddr, time::Duration};

use {
    ferry_relay::{ChatId, Reactions, SupervisorConfig},
    ferry_telegram::TelegramConfig,
};

use crate::{
    error::{ConfigError, Result},
    schema::{FerryConfig, HealthConfig},
};

/// A configuration that passed [`validate`]. Every required value is present.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub telegram: TelegramConfig,
    pub operator_chat: ChatId,
    pub supervisor: SupervisorConfig,
    /// `None` when the liveness endpoint is disabled.
    pub health: Option<HealthConfig>,
}

/// Check required settings and value ranges.
///
/// Missing settings are reported together so a fresh deployment can be
/// fixed in one go; range errors are reported one at a time.
pub fn validate(config: FerryConfig) -> Result<ValidatedConfig> {
    let mut missing = Vec::new();
    if !config.telegram.has_token() {
        missing.push("telegram.token");
    }
    if config.telegram.operator_chat_id.is_none() {
        missing.push("telegram.operator_chat_id");
    }
    let Some(operator_chat_id) = config.telegram.operator_chat_id.filter(|_| missing.is_empty())
    else {
        return Err(ConfigError::Missing { fields: missing });
    };

    if operator_chat_id == 0 {
        return Err(ConfigError::invalid(
            "telegram.operator_chat_id",
            "must be a non-zero chat id",
        ));
    }
    if config.telegram.request_timeout_secs <= u64::from(config.telegram.poll_timeout_secs) {
        return Err(ConfigError::invalid(
            "telegram.request_timeout_secs",
            format!(
                "must exceed telegram.poll_timeout_secs ({})",
                config.telegram.poll_timeout_secs
            ),
        ));
    }

    let health = if config.health.enabled {
        if config.health.bind.parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid(
                "health.bind",
                format!("'{}' is not an IP address", config.health.bind),
            ));
        }
        Some(config.health)
    } else {
        None
    };

    let operator_chat = ChatId(operator_chat_id);
    let supervisor = SupervisorConfig {
        operator_chat,
        restart_delay: Duration::from_secs(config.supervisor.restart_delay_secs),
        alert_after_failures: config.supervisor.alert_after_failures,
        reactions: Reactions {
            received: config.reactions.received,
            delivered: config.reactions.delivered,
        },
    };

    Ok(ValidatedConfig {
        telegram: config.telegram,
        operator_chat,
        supervisor,
        health,
    })
}
