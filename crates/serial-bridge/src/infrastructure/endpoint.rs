//! Connection lifecycle shared by both endpoint roles.
//!
//! An [`Endpoint`] owns at most one TCP connection.  How that connection is
//! obtained differs per role and is delegated to a [`Connector`]:
//!
//! - passive: accept on a listener ([`PassiveConnector`](super::passive::PassiveConnector))
//! - active: connect with backoff ([`ActiveConnector`](super::active::ActiveConnector))
//!
//! Everything else is common:
//!
//! ```text
//!            establish()                      EOF / read error / write error
//! NotReady ─────────────▶ Ready ───────────────────────────────────▶ NotReady
//!    │                      │                                         (re-arm on
//!    └──── shutdown ────────┴──── shutdown / close() ──▶ Closed        next receive)
//! ```
//!
//! # Ownership
//!
//! The stream is split on install.  The read half belongs to the relay loop
//! that uses this endpoint as its source; the write half sits behind a lock
//! because the *other* relay loop writes through it.  [`Readiness`] is only
//! changed while that write lock is held, so "ready" and "write half present"
//! always change together.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::application::ports::{FrameSink, FrameSource, LinkError, Received};
use crate::application::state::{Readiness, ShutdownFlag};
use crate::domain::Role;

/// Produces new connections for an [`Endpoint`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Waits until a connection is available.
    ///
    /// Must return [`LinkError::Closed`] promptly once `shutdown` is
    /// requested, and must never give up on transient failures.
    async fn establish(&self, shutdown: &ShutdownFlag)
        -> Result<(TcpStream, SocketAddr), LinkError>;
}

/// One side of the bridge.
pub struct Endpoint<C> {
    role: Role,
    connector: C,
    readiness: Readiness,
    shutdown: ShutdownFlag,
    poll_interval: Duration,
    write_timeout: Duration,
    reader: Mutex<Option<OwnedReadHalf>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: AtomicBool,
}

impl<C: Connector> Endpoint<C> {
    /// Creates a not-ready endpoint.  No I/O happens until the first
    /// `receive` (or an explicit [`Endpoint::establish`]).
    ///
    /// `poll_interval` bounds each read and `write_timeout` bounds each send.
    pub fn new(
        role: Role,
        connector: C,
        shutdown: ShutdownFlag,
        poll_interval: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            role,
            connector,
            readiness: Readiness::new(),
            shutdown,
            poll_interval,
            write_timeout,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Handle to this endpoint's readiness flag.
    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Blocks until the endpoint is ready, establishing a connection if there
    /// is none.
    ///
    /// # Errors
    ///
    /// [`LinkError::Closed`] if shutdown is requested (or the endpoint was
    /// closed) first; [`LinkError::Setup`] if the connector cannot be set up.
    pub async fn establish(&self) -> Result<(), LinkError> {
        let mut reader = self.reader.lock().await;
        self.ensure_connected(&mut reader).await
    }

    /// Installs a connection if `reader` holds none.  Caller holds the read lock.
    async fn ensure_connected(&self, reader: &mut Option<OwnedReadHalf>) -> Result<(), LinkError> {
        if self.is_closed() {
            *reader = None;
            return Err(LinkError::Closed);
        }

        // A failed send drops the write half; take the read half with it.
        if reader.is_some() && !self.readiness.is_ready() {
            debug!("{} endpoint: connection dropped by writer; re-arming", self.role);
            *reader = None;
        }
        if reader.is_some() {
            return Ok(());
        }

        let (stream, peer) = self.connector.establish(&self.shutdown).await?;
        if self.is_closed() {
            return Err(LinkError::Closed);
        }

        let (read_half, write_half) = stream.into_split();
        {
            let mut writer = self.writer.lock().await;
            *writer = Some(write_half);
            self.readiness.set(true);
        }
        *reader = Some(read_half);

        info!("{} endpoint ready (peer {peer})", self.role);
        Ok(())
    }

    /// Drops the write half and marks the endpoint not ready.
    async fn disconnect(&self) {
        let mut writer = self.writer.lock().await;
        let had_writer = writer.take().is_some();
        let was_ready = self.readiness.set(false);
        if had_writer || was_ready {
            info!("{} endpoint not ready", self.role);
        }
    }
}

#[async_trait]
impl<C: Connector> FrameSource for Endpoint<C> {
    async fn receive(&self, buf: &mut [u8]) -> Result<Received, LinkError> {
        if self.shutdown.is_requested() {
            self.close().await;
            return Err(LinkError::Closed);
        }

        let mut reader = self.reader.lock().await;
        match self.ensure_connected(&mut reader).await {
            Ok(()) => {}
            Err(LinkError::Closed) => {
                drop(reader);
                self.close().await;
                return Err(LinkError::Closed);
            }
            Err(e) => return Err(e),
        }

        let Some(stream) = reader.as_mut() else {
            return Ok(Received::Idle);
        };

        let read = tokio::select! {
            _ = self.shutdown.requested() => None,
            result = timeout(self.poll_interval, stream.read(buf)) => Some(result),
        };

        match read {
            None => {
                *reader = None;
                drop(reader);
                self.close().await;
                Err(LinkError::Closed)
            }
            Some(Err(_elapsed)) => Ok(Received::Idle),
            Some(Ok(Ok(0))) => {
                info!("{} endpoint: peer closed the connection", self.role);
                *reader = None;
                self.disconnect().await;
                Ok(Received::Disconnected)
            }
            Some(Ok(Ok(n))) => {
                debug!("{} endpoint: read {n} bytes", self.role);
                Ok(Received::Frame(n))
            }
            Some(Ok(Err(e))) => {
                warn!("{} endpoint: read failed: {e}", self.role);
                *reader = None;
                self.disconnect().await;
                Ok(Received::Disconnected)
            }
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("{} endpoint closed", self.role);
        }
        self.disconnect().await;
        // The owning loop may be inside `receive`; it drops the read half
        // itself once it sees the closed flag.
        if let Ok(mut reader) = self.reader.try_lock() {
            *reader = None;
        }
    }
}

#[async_trait]
impl<C: Connector> FrameSink for Endpoint<C> {
    fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// Writes `bytes`, giving up after the write timeout or on shutdown.
    ///
    /// Any failure drops the connection, so the writer lock is never held
    /// longer than one write timeout.
    async fn send(&self, bytes: &[u8]) -> Result<(), LinkError> {
        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(LinkError::NotReady);
        };

        let written = tokio::select! {
            biased;
            _ = self.shutdown.requested() => None,
            result = timeout(self.write_timeout, stream.write_all(bytes)) => Some(result),
        };

        let err = match written {
            Some(Ok(Ok(()))) => return Ok(()),
            Some(Ok(Err(e))) => {
                warn!("{} endpoint: write failed: {e}; connection dropped", self.role);
                LinkError::WriteFailed(e)
            }
            Some(Err(_elapsed)) => {
                warn!(
                    "{} endpoint: write stalled for {:?}; connection dropped",
                    self.role, self.write_timeout
                );
                LinkError::WriteFailed(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "peer stopped reading",
                ))
            }
            None => LinkError::Closed,
        };

        *writer = None;
        self.readiness.set(false);
        Err(err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
