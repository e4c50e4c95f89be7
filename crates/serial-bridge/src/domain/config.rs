//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from defaults, an optional TOML file and CLI
//! arguments (see `main.rs` and `infrastructure::storage`), then handed to
//! [`Bridge::open`](crate::infrastructure::Bridge::open).
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads inside the domain) lets tests run a complete bridge on ephemeral
//! ports with short timings.

use std::net::SocketAddr;
use std::time::Duration;

/// Default passive (listening) address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:10000";
/// Default active (controller) address.
pub const DEFAULT_CONTROLLER_ADDR: &str = "127.0.0.1:4040";
/// Pending-connection queue length for the passive listener.
pub const DEFAULT_LISTEN_BACKLOG: i32 = 10;

/// All runtime configuration for the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Address the passive endpoint binds and listens on.
    pub listen_addr: SocketAddr,

    /// Backlog passed to `listen(2)` for the passive endpoint.
    pub listen_backlog: i32,

    /// Address the active endpoint connects to.
    pub controller_addr: SocketAddr,

    /// Wait between failed connect attempts (and after an accept error).
    pub reconnect_interval: Duration,

    /// Wait after a successful connect before the active endpoint is marked
    /// ready, giving the controller time to finish its own accept handling.
    pub settle_delay: Duration,

    /// Upper bound on a single connect attempt.
    pub connect_timeout: Duration,

    /// Upper bound on writing one frame to a peer.
    ///
    /// A peer that stops reading eventually fills the socket buffer; once a
    /// write has been stuck this long the connection is dropped.
    pub write_timeout: Duration,

    /// Upper bound on a single blocking read.
    ///
    /// A read that times out is reported as "no frame" and the relay loop
    /// goes round again, so this also bounds how stale a readiness change
    /// made by the other loop can be before this loop notices it.
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    /// | Field              | Default            |
    /// |--------------------|--------------------|
    /// | listen_addr        | `127.0.0.1:10000`  |
    /// | listen_backlog     | 10                 |
    /// | controller_addr    | `127.0.0.1:4040`   |
    /// | reconnect_interval | 1 s                |
    /// | settle_delay       | 100 ms             |
    /// | connect_timeout    | 1 s                |
    /// | write_timeout      | 1 s                |
    /// | poll_interval      | 200 ms             |
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 10000)),
            listen_backlog: DEFAULT_LISTEN_BACKLOG,
            controller_addr: SocketAddr::from(([127, 0, 0, 1], 4040)),
            reconnect_interval: Duration::from_secs(1),
            settle_delay: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(200),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listen_addr_is_loopback_10000() {
        // Arrange / Act
        let cfg = BridgeConfig::default();
        // Assert
        assert_eq!(cfg.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn test_default_controller_addr_is_loopback_4040() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.controller_addr.to_string(), DEFAULT_CONTROLLER_ADDR);
    }

    #[test]
    fn test_default_backlog_is_10() {
        assert_eq!(BridgeConfig::default().listen_backlog, 10);
    }

    #[test]
    fn test_default_timings() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(1));
        assert_eq!(cfg.settle_delay, Duration::from_millis(100));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(1));
        assert_eq!(cfg.write_timeout, Duration::from_secs(1));
        assert_eq!(cfg.poll_interval, Duration::from_millis(200));
    }
}
