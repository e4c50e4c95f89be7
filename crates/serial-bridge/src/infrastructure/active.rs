//! Active endpoint: connects out to the controller and keeps reconnecting.
//!
//! Reconnection is a plain fixed-interval loop, as the controller is expected
//! to be local and to come back quickly.  There is no backoff growth and no
//! attempt limit; only a shutdown request ends the loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::ports::LinkError;
use crate::application::state::ShutdownFlag;
use crate::domain::{BridgeConfig, Role};
use crate::infrastructure::endpoint::{Connector, Endpoint};

/// The active side of the bridge.
pub type ActiveEndpoint = Endpoint<ActiveConnector>;

/// Connects to a fixed address, retrying forever.
pub struct ActiveConnector {
    addr: SocketAddr,
    reconnect_interval: Duration,
    settle_delay: Duration,
    connect_timeout: Duration,
    attempts: AtomicU64,
}

impl ActiveConnector {
    pub fn new(
        addr: SocketAddr,
        reconnect_interval: Duration,
        settle_delay: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            addr,
            reconnect_interval,
            settle_delay,
            connect_timeout,
            attempts: AtomicU64::new(0),
        }
    }

    /// Connection attempts made so far, successful or not.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Connector for ActiveConnector {
    async fn establish(
        &self,
        shutdown: &ShutdownFlag,
    ) -> Result<(TcpStream, SocketAddr), LinkError> {
        loop {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("connecting to {} (attempt {attempt})", self.addr);

            let connected = tokio::select! {
                _ = shutdown.requested() => return Err(LinkError::Closed),
                result = timeout(self.connect_timeout, TcpStream::connect(self.addr)) => result,
            };

            match connected {
                Ok(Ok(stream)) => {
                    info!("connected to {}", self.addr);
                    // Give the peer a moment before the first read or write.
                    if shutdown.sleep(self.settle_delay).await {
                        return Err(LinkError::Closed);
                    }
                    return Ok((stream, self.addr));
                }
                Ok(Err(e)) => {
                    warn!(
                        "connect to {} failed: {e}; retrying in {:?}",
                        self.addr, self.reconnect_interval
                    );
                }
                Err(_elapsed) => {
                    warn!(
                        "connect to {} timed out after {:?}; retrying in {:?}",
                        self.addr, self.connect_timeout, self.reconnect_interval
                    );
                }
            }

            if shutdown.sleep(self.reconnect_interval).await {
                return Err(LinkError::Closed);
            }
        }
    }
}

impl ActiveEndpoint {
    /// Builds the active endpoint described by `config`.  Does not connect.
    pub fn from_config(config: &BridgeConfig, shutdown: ShutdownFlag) -> Self {
        let connector = ActiveConnector::new(
            config.controller_addr,
            config.reconnect_interval,
            config.settle_delay,
            config.connect_timeout,
        );
        Endpoint::new(
            Role::Active,
            connector,
            shutdown,
            config.poll_interval,
            config.write_timeout,
        )
    }

    /// Connects, retrying until it succeeds or shutdown is requested.
    pub async fn open(&self) -> Result<(), LinkError> {
        self.establish().await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
