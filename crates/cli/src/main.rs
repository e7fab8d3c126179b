mod health;

use std::{net::SocketAddr, path::PathBuf};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    ferry_config::{Overrides, ValidatedConfig},
    ferry_relay::Supervisor,
    ferry_telegram::TelegramConnector,
    tokio_util::sync::CancellationToken,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "ferry", about = "ferry: stateless Telegram support relay", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching for ferry.{toml,yaml,yml,json}.
    #[arg(long, global = true, env = "FERRY_CONFIG")]
    config: Option<PathBuf>,

    /// Telegram bot token (overrides config value).
    #[arg(long, global = true, env = "TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Operator chat id, negative for groups (overrides config value).
    #[arg(
        long,
        global = true,
        env = "ADMIN_GROUP_ID",
        allow_negative_numbers = true
    )]
    operator_chat_id: Option<i64>,

    /// Port for the liveness endpoint (overrides config value).
    #[arg(long, global = true, env = "PORT")]
    health_port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay (default when no subcommand is provided).
    Run,
    /// Validate the configuration and exit.
    Check,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            token: self.token.clone(),
            operator_chat_id: self.operator_chat_id,
            health_port: self.health_port,
        }
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "ferry starting");

    let config = ferry_config::load(cli.config.as_deref(), &cli.overrides())
        .and_then(ferry_config::validate)
        .inspect_err(|e| error!(error = %e, "invalid configuration"))?;

    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::Check) => {
            check(&config);
            Ok(())
        },
    }
}

fn check(config: &ValidatedConfig) {
    eprintln!("Configuration OK");
    eprintln!("  operator chat:   {}", config.operator_chat);
    eprintln!(
        "  restart delay:   {}s",
        config.supervisor.restart_delay.as_secs()
    );
    match &config.health {
        Some(health) => eprintln!("  health endpoint: {}:{}", health.bind, health.port),
        None => eprintln!("  health endpoint: disabled"),
    }
}

async fn run(config: ValidatedConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    if let Some(health) = &config.health {
        let ip = health
            .bind
            .parse()
            .with_context(|| format!("invalid health.bind '{}'", health.bind))?;
        let addr = SocketAddr::new(ip, health.port);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr, cancel).await {
                error!(%addr, error = %e, "health endpoint failed");
            }
        });
    }

    let supervisor = Supervisor::new(
        TelegramConnector::new(config.telegram),
        config.supervisor,
        cancel,
    );
    supervisor.run().await;

    info!("ferry stopped");
    Ok(())
}

async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    shutdown_signal().await;
    info!("shutdown signal received");
    cancel.cancel();
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = sigterm.recv() => {},
            }
        },
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        },
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
