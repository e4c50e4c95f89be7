//! The seams between the relay loop and the endpoints.
//!
//! A relay loop only needs two things from the world: something to read
//! frames from and something to write frames to.  Expressing those as traits
//! keeps [`RelayLoop`](crate::application::RelayLoop) free of sockets, so its
//! state machine is tested with in-memory fakes while the real endpoints in
//! `infrastructure` implement the same traits over TCP.

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of one `receive` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// `n` bytes were written to the start of the buffer.
    Frame(usize),
    /// Nothing arrived within the poll interval.
    Idle,
    /// The connection dropped during this call; the endpoint re-arms on the
    /// next `receive`.
    Disconnected,
}

/// Fatal startup failures.  These are the only errors that end the process.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The listening socket could not be created or bound.
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The bound socket could not be put into listening mode.
    #[error("listen failed on {addr}: {source}")]
    ListenFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The listening socket could not be made non-blocking or handed to the
    /// async runtime.
    #[error("failed to register listener on {addr}: {source}")]
    RegisterFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by an endpoint.
///
/// Apart from [`LinkError::Setup`] every variant is recoverable: the caller
/// drops the frame (send side) or simply tries again (receive side).
#[derive(Debug, Error)]
pub enum LinkError {
    /// No live connection right now.
    #[error("endpoint not ready")]
    NotReady,

    /// The write itself failed; the endpoint has dropped the connection.
    #[error("write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// The endpoint has been closed for good (shutdown or explicit close).
    #[error("endpoint closed")]
    Closed,

    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Where a relay loop reads frames from.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Reads at most `buf.len()` bytes.
    ///
    /// Establishes (or re-establishes) the connection first if there is none.
    /// Returns [`LinkError::Closed`] once the endpoint is permanently closed.
    async fn receive(&self, buf: &mut [u8]) -> Result<Received, LinkError>;

    /// Closes the connection and the endpoint.  Idempotent.
    async fn close(&self);
}

/// Where a relay loop writes frames to.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Best-effort readiness hint; `send` must still cope with a dead handle.
    fn is_ready(&self) -> bool;

    /// Writes all of `bytes` to the live connection.
    async fn send(&self, bytes: &[u8]) -> Result<(), LinkError>;
}
