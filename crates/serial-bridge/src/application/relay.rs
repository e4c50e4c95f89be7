//! The relay loop: one per direction.
//!
//! ```text
//!            ┌──────────────── Idle / Disconnected ───────────────┐
//!            ▼                                                    │
//!   ┌──── WaitReceive ──── Frame(n) ──▶ Decode ── error ──▶ log + discard
//!   │        ▲                            │
//!   │        │                            ▼ ok
//!   │        └──────────────────────── Forward (if destination ready,
//!   │                                    else drop)
//!   └── shutdown / source closed ──▶ Terminate (close source)
//! ```
//!
//! The loop never queues: a frame that cannot be forwarded right now is lost.
//! Frame errors and forwarding failures are logged and counted, never fatal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serial_bridge_core::{decode, encode, FRAME_BUFFER_SIZE};
use tracing::{debug, error, info, warn};

use crate::application::ports::{FrameSink, FrameSource, LinkError, Received, SetupError};
use crate::application::state::ShutdownFlag;
use crate::domain::Direction;

/// Pause after an unexpected receive error, so a misbehaving source cannot
/// make the loop spin.
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Why a relay loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayExit {
    /// The shutdown flag was observed.
    Shutdown,
    /// The source was closed without a shutdown request.
    SourceClosed,
}

/// Per-direction counters, readable while the loop runs.
#[derive(Debug, Default)]
pub struct RelayStats {
    forwarded: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
}

/// A point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayCounts {
    /// Frames written to the destination.
    pub forwarded: u64,
    /// Buffers that failed to decode.
    pub rejected: u64,
    /// Valid frames lost because the destination was not ready or the write failed.
    pub dropped: u64,
}

impl RelayStats {
    pub fn snapshot(&self) -> RelayCounts {
        RelayCounts {
            forwarded: self.forwarded.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Reads frames from `source`, validates them with the direction's grammar
/// and forwards the received bytes unchanged to `sink`.
pub struct RelayLoop<S: ?Sized, D: ?Sized> {
    direction: Direction,
    source: Arc<S>,
    sink: Arc<D>,
    shutdown: ShutdownFlag,
    stats: Arc<RelayStats>,
}

impl<S, D> RelayLoop<S, D>
where
    S: FrameSource + ?Sized,
    D: FrameSink + ?Sized,
{
    pub fn new(direction: Direction, source: Arc<S>, sink: Arc<D>, shutdown: ShutdownFlag) -> Self {
        Self {
            direction,
            source,
            sink,
            shutdown,
            stats: Arc::new(RelayStats::default()),
        }
    }

    /// Shared handle to this loop's counters.
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Runs until shutdown is requested or the source closes.
    ///
    /// The source endpoint is always closed before this returns.
    ///
    /// # Errors
    ///
    /// Returns the [`SetupError`] if the source endpoint could not be set up
    /// at all (for example its listener could not be bound).
    pub async fn run(self) -> Result<RelayExit, SetupError> {
        let direction = self.direction;
        info!("{direction}: relay started ({} frames)", direction.grammar());

        let mut buf = [0u8; FRAME_BUFFER_SIZE];
        let result = loop {
            if self.shutdown.is_requested() {
                break Ok(RelayExit::Shutdown);
            }

            match self.source.receive(&mut buf).await {
                Ok(Received::Frame(n)) => self.relay(&buf[..n]).await,
                Ok(Received::Idle) | Ok(Received::Disconnected) => {}
                Err(LinkError::Closed) => {
                    break Ok(if self.shutdown.is_requested() {
                        RelayExit::Shutdown
                    } else {
                        RelayExit::SourceClosed
                    });
                }
                Err(LinkError::Setup(e)) => {
                    error!("{direction}: source endpoint setup failed: {e}");
                    break Err(e);
                }
                Err(e) => {
                    debug!("{direction}: receive failed: {e}");
                    self.shutdown.sleep(ERROR_BACKOFF).await;
                }
            }
        };

        self.source.close().await;

        let counts = self.stats.snapshot();
        info!(
            forwarded = counts.forwarded,
            rejected = counts.rejected,
            dropped = counts.dropped,
            "{direction}: relay stopped"
        );
        result
    }

    async fn relay(&self, raw: &[u8]) {
        let direction = self.direction;

        let frame = match decode(raw, direction.grammar()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    "{direction}: discarding {:?}: {e}",
                    String::from_utf8_lossy(raw)
                );
                RelayStats::bump(&self.stats.rejected);
                return;
            }
        };

        if !self.sink.is_ready() {
            debug!("{direction}: destination not ready; dropping {frame}");
            RelayStats::bump(&self.stats.dropped);
            return;
        }

        match self.sink.send(encode(&frame)).await {
            Ok(()) => {
                info!("{direction}: forwarded {frame}");
                RelayStats::bump(&self.stats.forwarded);
            }
            Err(e) => {
                warn!("{direction}: dropping {frame}: {e}");
                RelayStats::bump(&self.stats.dropped);
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
