//! Config schema types.

use {ferry_telegram::TelegramConfig, serde::Deserialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FerryConfig {
    pub telegram: TelegramConfig,
    pub supervisor: SupervisorSettings,
    pub health: HealthConfig,
    pub reactions: ReactionsConfig,
}

/// Restart policy for the relay session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Pause between a failed session and the next connect attempt.
    pub restart_delay_secs: u64,
    /// Consecutive failures before the crash-loop alert fires. `0` disables it.
    pub alert_after_failures: u32,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            restart_delay_secs: 5,
            alert_after_failures: 5,
        }
    }
}

/// Liveness endpoint for hosting platforms that probe a port.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    /// Address to bind to. Defaults to "0.0.0.0".
    pub bind: String,
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0".into(),
            port: 10000,
        }
    }
}

/// Acknowledgement emoji. An empty string turns that reaction off.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReactionsConfig {
    pub received: String,
    pub delivered: String,
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        let defaults = ferry_relay::Reactions::default();
        Self {
            received: defaults.received,
            delivered: defaults.delivered,
        }
    }
}

/// Values that win over anything read from a config file: CLI flags and
/// their environment variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub operator_chat_id: Option<i64>,
    pub health_port: Option<u16>,
}

impl FerryConfig {
    /// Apply overrides in place. Blank tokens are ignored so an empty `TOKEN=`
    /// in the environment doesn't mask the file's value.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(token) = overrides.token.as_deref()
            && !token.trim().is_empty()
        {
            self.telegram.token = secrecy::Secret::new(token.to_string());
        }
        if let Some(id) = overrides.operator_chat_id {
            self.telegram.operator_chat_id = Some(id);
        }
        if let Some(port) = overrides.health_port {
            self.health.port = port;
        }
    }
}
