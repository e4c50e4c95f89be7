//! Passive endpoint: a listener that serves one client at a time.
//!
//! The listener is created with `socket2` rather than
//! `tokio::net::TcpListener::bind` because the bridge needs two things the
//! tokio shortcut does not expose:
//!
//! - `SO_REUSEADDR`, so a restart does not fail while the old socket sits in
//!   `TIME_WAIT`;
//! - an explicit backlog (10), and separate bind and listen steps so their
//!   failures can be reported (and exit) differently.
//!
//! While a client is connected no further `accept` is issued; later clients
//! wait in the backlog until the current one goes away.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::application::ports::{LinkError, SetupError};
use crate::application::state::ShutdownFlag;
use crate::domain::{BridgeConfig, Role};
use crate::infrastructure::endpoint::{Connector, Endpoint};

/// The passive side of the bridge.
pub type PassiveEndpoint = Endpoint<PassiveConnector>;

/// Accepts connections on a lazily bound listener.
pub struct PassiveConnector {
    addr: SocketAddr,
    backlog: i32,
    retry_interval: Duration,
    listener: Mutex<Option<Arc<TcpListener>>>,
}

impl PassiveConnector {
    pub fn new(addr: SocketAddr, backlog: i32, retry_interval: Duration) -> Self {
        Self {
            addr,
            backlog,
            retry_interval,
            listener: Mutex::new(None),
        }
    }

    /// Binds and listens, once.
    ///
    /// Later calls return the already-open listener without touching the
    /// socket again.  Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`SetupError::BindFailed`] or [`SetupError::ListenFailed`] for the
    /// socket calls of the same name, [`SetupError::RegisterFailed`] if the
    /// listening socket cannot be handed to the runtime.
    pub fn open(&self) -> Result<SocketAddr, SetupError> {
        let listener = self.listener()?;
        Ok(listener.local_addr().unwrap_or(self.addr))
    }

    /// The bound address, once [`open`](Self::open) has succeeded.
    ///
    /// Differs from the configured address when that used port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        let slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().and_then(|l| l.local_addr().ok())
    }

    fn listener(&self) -> Result<Arc<TcpListener>, SetupError> {
        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(listener) = slot.as_ref() {
            return Ok(Arc::clone(listener));
        }

        let listener = Arc::new(bind_listener(self.addr, self.backlog)?);
        info!(
            "passive endpoint listening on {} (backlog {})",
            listener.local_addr().unwrap_or(self.addr),
            self.backlog
        );
        *slot = Some(Arc::clone(&listener));
        Ok(listener)
    }
}

#[async_trait]
impl Connector for PassiveConnector {
    async fn establish(
        &self,
        shutdown: &ShutdownFlag,
    ) -> Result<(TcpStream, SocketAddr), LinkError> {
        let listener = self.listener()?;

        loop {
            debug!("waiting for a client on {}", self.addr);
            let accepted = tokio::select! {
                _ = shutdown.requested() => return Err(LinkError::Closed),
                result = listener.accept() => result,
            };

            match accepted {
                Ok((stream, peer)) => {
                    info!("accepted connection from {peer}");
                    return Ok((stream, peer));
                }
                Err(e) => {
                    // e.g. EMFILE; the listener itself is still fine.
                    warn!("accept failed: {e}; retrying in {:?}", self.retry_interval);
                    if shutdown.sleep(self.retry_interval).await {
                        return Err(LinkError::Closed);
                    }
                }
            }
        }
    }
}

impl PassiveEndpoint {
    /// Builds the passive endpoint described by `config`.  Does not bind.
    pub fn from_config(config: &BridgeConfig, shutdown: ShutdownFlag) -> Self {
        let connector = PassiveConnector::new(
            config.listen_addr,
            config.listen_backlog,
            config.reconnect_interval,
        );
        Endpoint::new(
            Role::Passive,
            connector,
            shutdown,
            config.poll_interval,
            config.write_timeout,
        )
    }

    /// Binds the listening socket.  Idempotent; see [`PassiveConnector::open`].
    pub fn open(&self) -> Result<SocketAddr, SetupError> {
        self.connector().open()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.connector().local_addr()
    }
}

fn bind_listener(addr: SocketAddr, backlog: i32) -> Result<TcpListener, SetupError> {
    let bind_failed = |source| SetupError::BindFailed { addr, source };
    let listen_failed = |source| SetupError::ListenFailed { addr, source };
    let register_failed = |source| SetupError::RegisterFailed { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(bind_failed)?;
    socket.set_reuse_address(true).map_err(bind_failed)?;
    socket.bind(&addr.into()).map_err(bind_failed)?;
    socket.listen(backlog).map_err(listen_failed)?;
    socket.set_nonblocking(true).map_err(register_failed)?;

    TcpListener::from_std(socket.into()).map_err(register_failed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
