//! TOML configuration file for the bridge.
//!
//! Every section and every field is optional; anything left out keeps the
//! built-in default from [`BridgeConfig::default`].  A complete file:
//!
//! ```toml
//! [listen]
//! host = "127.0.0.1"
//! port = 10000
//! backlog = 10
//!
//! [controller]
//! host = "127.0.0.1"
//! port = 4040
//! connect_timeout_ms = 1000
//!
//! [relay]
//! reconnect_interval_ms = 1000
//! settle_delay_ms = 100
//! poll_interval_ms = 200
//! write_timeout_ms = 1000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Apart from `settle_delay_ms`, every `*_ms` value must be at least 1.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::config::DEFAULT_LISTEN_BACKLOG;
use crate::domain::BridgeConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `host` value is not an IP address.
    #[error("invalid {section} host '{host}': expected an IP address")]
    InvalidAddress { section: &'static str, host: String },

    /// A timing value that must be positive was set to 0.
    #[error("{field} must be at least 1 ms")]
    ZeroDuration { field: &'static str },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level layout of the configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub listen: ListenSection,
    #[serde(default)]
    pub controller: ControllerSection,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// The passive endpoint (where field clients connect).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ListenSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backlog: Option<i32>,
}

/// The active endpoint (the controller the bridge connects to).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ControllerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout_ms: Option<u64>,
}

/// Timing of the relay loops and reconnect logic.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    pub reconnect_interval_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
}

/// `tracing` level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl FileConfig {
    /// Overlays the values present in the file onto `base`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidAddress`] if a `host` is not an IP address,
    /// [`ConfigError::ZeroDuration`] if an interval or timeout is 0.
    pub fn apply_to(&self, base: &mut BridgeConfig) -> Result<(), ConfigError> {
        base.listen_addr = overlay_addr(
            "listen",
            base.listen_addr,
            self.listen.host.as_deref(),
            self.listen.port,
        )?;
        if let Some(backlog) = self.listen.backlog {
            base.listen_backlog = if backlog > 0 {
                backlog
            } else {
                DEFAULT_LISTEN_BACKLOG
            };
        }

        base.controller_addr = overlay_addr(
            "controller",
            base.controller_addr,
            self.controller.host.as_deref(),
            self.controller.port,
        )?;
        overlay_positive_millis(
            "controller.connect_timeout_ms",
            &mut base.connect_timeout,
            self.controller.connect_timeout_ms,
        )?;

        overlay_positive_millis(
            "relay.reconnect_interval_ms",
            &mut base.reconnect_interval,
            self.relay.reconnect_interval_ms,
        )?;
        overlay_positive_millis(
            "relay.poll_interval_ms",
            &mut base.poll_interval,
            self.relay.poll_interval_ms,
        )?;
        overlay_positive_millis(
            "relay.write_timeout_ms",
            &mut base.write_timeout,
            self.relay.write_timeout_ms,
        )?;
        overlay_millis(&mut base.settle_delay, self.relay.settle_delay_ms);
        Ok(())
    }

    /// Defaults with this file applied.
    ///
    /// # Errors
    ///
    /// See [`FileConfig::apply_to`].
    pub fn to_bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        let mut config = BridgeConfig::default();
        self.apply_to(&mut config)?;
        Ok(config)
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
///
/// [`ConfigError::Parse`] if the text is not valid TOML or contains unknown keys.
pub fn parse_config(content: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Reads and parses the configuration file at `path`.
///
/// Unlike a default-location config, a file named explicitly must exist.
///
/// # Errors
///
/// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`] if
/// it is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

fn overlay_addr(
    section: &'static str,
    base: SocketAddr,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<SocketAddr, ConfigError> {
    let ip = match host {
        Some(host) => host
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidAddress {
                section,
                host: host.to_string(),
            })?,
        None => base.ip(),
    };
    Ok(SocketAddr::new(ip, port.unwrap_or(base.port())))
}

fn overlay_millis(target: &mut Duration, millis: Option<u64>) {
    if let Some(ms) = millis {
        *target = Duration::from_millis(ms);
    }
}

fn overlay_positive_millis(
    field: &'static str,
    target: &mut Duration,
    millis: Option<u64>,
) -> Result<(), ConfigError> {
    if millis == Some(0) {
        return Err(ConfigError::ZeroDuration { field });
    }
    overlay_millis(target, millis);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        // Arrange / Act
        let file = parse_config("").unwrap();

        // Assert
        assert_eq!(file, FileConfig::default());
        assert_eq!(file.logging.level, "info");
        assert_eq!(file.to_bridge_config().unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_full_file_overrides_every_field() {
        // Arrange
        let toml_str = r#"
[listen]
host = "0.0.0.0"
port = 11000
backlog = 4

[controller]
host = "10.0.0.5"
port = 5050
connect_timeout_ms = 250

[relay]
reconnect_interval_ms = 500
settle_delay_ms = 50
poll_interval_ms = 100
write_timeout_ms = 750

[logging]
level = "debug"
"#;

        // Act
        let file = parse_config(toml_str).unwrap();
        let cfg = file.to_bridge_config().unwrap();

        // Assert
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:11000");
        assert_eq!(cfg.listen_backlog, 4);
        assert_eq!(cfg.controller_addr.to_string(), "10.0.0.5:5050");
        assert_eq!(cfg.connect_timeout, Duration::from_millis(250));
        assert_eq!(cfg.reconnect_interval, Duration::from_millis(500));
        assert_eq!(cfg.settle_delay, Duration::from_millis(50));
        assert_eq!(cfg.poll_interval, Duration::from_millis(100));
        assert_eq!(cfg.write_timeout, Duration::from_millis(750));
        assert_eq!(file.logging.level, "debug");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange: only the port changes
        let file = parse_config("[listen]\nport = 12000\n").unwrap();

        // Act
        let cfg = file.to_bridge_config().unwrap();

        // Assert
        assert_eq!(cfg.listen_addr.to_string(), "127.0.0.1:12000");
        assert_eq!(cfg.controller_addr, BridgeConfig::default().controller_addr);
        assert_eq!(cfg.listen_backlog, DEFAULT_LISTEN_BACKLOG);
    }

    #[test]
    fn test_non_positive_backlog_falls_back_to_default() {
        let file = parse_config("[listen]\nbacklog = 0\n").unwrap();
        let cfg = file.to_bridge_config().unwrap();
        assert_eq!(cfg.listen_backlog, DEFAULT_LISTEN_BACKLOG);
    }

    #[test]
    fn test_zero_reconnect_interval_is_rejected() {
        // Arrange
        let file = parse_config("[relay]\nreconnect_interval_ms = 0\n").unwrap();

        // Act
        let err = file.to_bridge_config().unwrap_err();

        // Assert
        assert!(
            matches!(
                err,
                ConfigError::ZeroDuration {
                    field: "relay.reconnect_interval_ms"
                }
            ),
            "got {err:?}"
        );
        assert_eq!(
            err.to_string(),
            "relay.reconnect_interval_ms must be at least 1 ms"
        );
    }

    #[test]
    fn test_every_zero_interval_or_timeout_is_rejected() {
        let cases = [
            ("[controller]\nconnect_timeout_ms = 0\n", "controller.connect_timeout_ms"),
            ("[relay]\npoll_interval_ms = 0\n", "relay.poll_interval_ms"),
            ("[relay]\nwrite_timeout_ms = 0\n", "relay.write_timeout_ms"),
        ];

        for (toml_str, expected) in cases {
            let err = parse_config(toml_str).unwrap().to_bridge_config().unwrap_err();
            assert!(
                matches!(err, ConfigError::ZeroDuration { field } if field == expected),
                "{toml_str:?}: got {err:?}"
            );
        }
    }

    #[test]
    fn test_zero_settle_delay_is_allowed() {
        let cfg = parse_config("[relay]\nsettle_delay_ms = 0\n")
            .unwrap()
            .to_bridge_config()
            .unwrap();
        assert_eq!(cfg.settle_delay, Duration::ZERO);
    }

    #[test]
    fn test_invalid_host_returns_invalid_address() {
        // Arrange
        let file = parse_config("[controller]\nhost = \"not.an.ip\"\n").unwrap();

        // Act
        let err = file.to_bridge_config().unwrap_err();

        // Assert
        assert!(
            matches!(err, ConfigError::InvalidAddress { section: "controller", .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        let err = parse_config("[listen]\nprot = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let err = parse_config("[[[ not valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        let path = Path::new("/nonexistent/path/that/cannot/exist/serial-bridge.toml");
        let err = load_config(path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn test_load_config_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!(
            "serial_bridge_test_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[relay]\nreconnect_interval_ms = 250\n").unwrap();

        // Act
        let file = load_config(&path);
        std::fs::remove_file(&path).ok();

        // Assert
        let cfg = file.unwrap().to_bridge_config().unwrap();
        assert_eq!(cfg.reconnect_interval, Duration::from_millis(250));
    }
}
