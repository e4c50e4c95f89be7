//! serial-bridge: entry point.
//!
//! Listens for a field client, connects out to a controller, and relays
//! event frames between the two until SIGINT or SIGTERM.
//!
//! # Usage
//!
//! ```text
//! serial-bridge [OPTIONS]
//!
//! Options:
//!   --config <PATH>                 TOML configuration file
//!   --listen-host <IP>              Passive endpoint address [default: 127.0.0.1]
//!   --listen-port <PORT>            Passive endpoint port [default: 10000]
//!   --controller-host <IP>          Controller address [default: 127.0.0.1]
//!   --controller-port <PORT>        Controller port [default: 4040]
//!   --reconnect-interval-ms <MS>    Wait between connect attempts [default: 1000]
//!   --log-level <LEVEL>             Log level when RUST_LOG is unset [default: info]
//! ```
//!
//! Each option can also be set through the environment variable shown in
//! `--help` (`SERIAL_BRIDGE_*`).  Precedence, lowest first: built-in defaults,
//! the config file, then options and environment variables.
//!
//! # Exit codes
//!
//! | Code | Meaning                                 |
//! |------|-----------------------------------------|
//! | 0    | Clean shutdown after a signal           |
//! | 1    | Configuration or other startup error    |
//! |      | (including a listener the runtime       |
//! |      | could not register)                     |
//! | 2    | The listening socket could not be bound |
//! | 3    | The bound socket could not listen       |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use serial_bridge::application::{SetupError, ShutdownFlag};
use serial_bridge::domain::BridgeConfig;
use serial_bridge::infrastructure::storage::{load_config, FileConfig};
use serial_bridge::infrastructure::{Bridge, BridgeOutcome, ShutdownSignals};

const DEFAULT_LOG_LEVEL: &str = "info";

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Bidirectional TCP bridge for switch and output event frames.
///
/// Every option is optional: unset options fall back to the config file and
/// then to the built-in defaults.
#[derive(Debug, Parser)]
#[command(
    name = "serial-bridge",
    about = "Relays switch/output event frames between a field client and a controller",
    version
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "SERIAL_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// IP address the passive endpoint listens on.
    #[arg(long, env = "SERIAL_BRIDGE_LISTEN_HOST")]
    listen_host: Option<String>,

    /// TCP port the passive endpoint listens on.
    #[arg(long, env = "SERIAL_BRIDGE_LISTEN_PORT")]
    listen_port: Option<u16>,

    /// IP address of the controller.
    #[arg(long, env = "SERIAL_BRIDGE_CONTROLLER_HOST")]
    controller_host: Option<String>,

    /// TCP port of the controller.
    #[arg(long, env = "SERIAL_BRIDGE_CONTROLLER_PORT")]
    controller_port: Option<u16>,

    /// Milliseconds to wait between failed connection attempts.
    #[arg(
        long,
        env = "SERIAL_BRIDGE_RECONNECT_INTERVAL_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    reconnect_interval_ms: Option<u64>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "SERIAL_BRIDGE_LOG_LEVEL")]
    log_level: Option<String>,
}

/// Fully merged runtime settings.
#[derive(Debug)]
struct Settings {
    bridge: BridgeConfig,
    log_level: String,
}

impl Cli {
    /// Merges defaults, the config file (if any) and the CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if a
    /// host is not a valid IP address.
    fn resolve(&self) -> anyhow::Result<Settings> {
        let file = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => FileConfig::default(),
        };

        let mut bridge = file.to_bridge_config().context("invalid config file")?;

        override_addr(
            &mut bridge.listen_addr,
            self.listen_host.as_deref(),
            self.listen_port,
            "listen",
        )?;
        override_addr(
            &mut bridge.controller_addr,
            self.controller_host.as_deref(),
            self.controller_port,
            "controller",
        )?;
        if let Some(ms) = self.reconnect_interval_ms {
            bridge.reconnect_interval = Duration::from_millis(ms);
        }

        let log_level = self
            .log_level
            .clone()
            .unwrap_or_else(|| file.logging.level.clone());

        Ok(Settings { bridge, log_level })
    }
}

fn override_addr(
    addr: &mut SocketAddr,
    host: Option<&str>,
    port: Option<u16>,
    what: &str,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        let ip: IpAddr = host
            .parse()
            .with_context(|| format!("invalid {what} host: '{host}'"))?;
        addr.set_ip(ip);
    }
    if let Some(port) = port {
        addr.set_port(port);
    }
    Ok(())
}

/// Maps a startup failure to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        match cause.downcast_ref::<SetupError>() {
            Some(SetupError::BindFailed { .. }) => return 2,
            Some(SetupError::ListenFailed { .. }) => return 3,
            Some(SetupError::RegisterFailed { .. }) => return 1,
            None => {}
        }
    }
    1
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = cli.resolve();
    let level = settings
        .as_ref()
        .map(|s| s.log_level.as_str())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_tracing(level);

    let result = match settings {
        Ok(settings) => run(settings.bridge).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            info!(
                passive_to_active = ?outcome.passive_to_active,
                active_to_passive = ?outcome.active_to_passive,
                "serial-bridge stopped"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Opens the bridge and runs it until a termination signal arrives.
async fn run(config: BridgeConfig) -> anyhow::Result<BridgeOutcome> {
    // Registered before the listener exists; only acted on once both loops run.
    let signals = ShutdownSignals::install().context("failed to install signal handlers")?;
    let shutdown = ShutdownFlag::new();

    info!(
        "serial-bridge starting: listen={}, controller={}",
        config.listen_addr, config.controller_addr
    );

    let bridge = Bridge::open(&config, shutdown.clone()).context("bridge setup failed")?;
    let outcome = bridge
        .run(move || {
            signals.watch(shutdown);
        })
        .await
        .context("bridge failed")?;

    Ok(outcome)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
