//! Wires the two endpoints and the two relay loops together.
//!
//! ```text
//!   field client ──▶ [passive] ── passive→active (main task) ──▶ [active] ──▶ controller
//!   field client ◀── [passive] ◀── active→passive (spawned) ──── [active] ◀── controller
//! ```
//!
//! [`Bridge::open`] does the only fatal work (binding the listener).  Once it
//! succeeds, [`Bridge::run`] never fails on a connection problem; it returns
//! when shutdown is requested.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::ports::{FrameSource, SetupError};
use crate::application::relay::{RelayCounts, RelayExit, RelayLoop};
use crate::application::state::{Readiness, ShutdownFlag};
use crate::domain::{BridgeConfig, Direction};
use crate::infrastructure::active::ActiveEndpoint;
use crate::infrastructure::passive::PassiveEndpoint;

/// How a bridge run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOutcome {
    /// Exit reason of the passive→active loop.
    pub primary: RelayExit,
    /// Exit reason of the active→passive loop, or `None` if it was cancelled.
    pub secondary: Option<RelayExit>,
    pub passive_to_active: RelayCounts,
    pub active_to_passive: RelayCounts,
}

/// A bridge with its listener bound, ready to run.
pub struct Bridge {
    shutdown: ShutdownFlag,
    passive: Arc<PassiveEndpoint>,
    active: Arc<ActiveEndpoint>,
    listen_addr: SocketAddr,
    controller_addr: SocketAddr,
}

impl Bridge {
    /// Creates both endpoints and binds the passive listener.
    ///
    /// The controller is not contacted here; the active endpoint connects
    /// (and keeps reconnecting) once [`run`](Self::run) starts.  Must be
    /// called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`SetupError`] if the listener cannot be bound, put into listening mode
    /// or registered with the runtime.
    pub fn open(config: &BridgeConfig, shutdown: ShutdownFlag) -> Result<Self, SetupError> {
        let passive = Arc::new(PassiveEndpoint::from_config(config, shutdown.clone()));
        let active = Arc::new(ActiveEndpoint::from_config(config, shutdown.clone()));

        let listen_addr = passive.open()?;

        Ok(Self {
            shutdown,
            passive,
            active,
            listen_addr,
            controller_addr: config.controller_addr,
        })
    }

    /// The address actually bound, which differs from the configured one
    /// when port 0 was requested.
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn passive_readiness(&self) -> Readiness {
        self.passive.readiness()
    }

    pub fn active_readiness(&self) -> Readiness {
        self.active.readiness()
    }

    /// Runs both relay loops until shutdown.
    ///
    /// `on_started` is called once, after both loops exist and before the
    /// primary loop starts reading.  `main` uses it to start watching
    /// termination signals.
    ///
    /// When the primary loop exits because of a shutdown request the
    /// secondary loop is cancelled; otherwise it is joined.
    ///
    /// # Errors
    ///
    /// [`SetupError`] if either source endpoint reports a setup failure.
    pub async fn run<F: FnOnce()>(self, on_started: F) -> Result<BridgeOutcome, SetupError> {
        info!(
            "bridge running: field clients on {}, controller at {}",
            self.listen_addr, self.controller_addr
        );

        let secondary = RelayLoop::new(
            Direction::ActiveToPassive,
            Arc::clone(&self.active),
            Arc::clone(&self.passive),
            self.shutdown.clone(),
        );
        let primary = RelayLoop::new(
            Direction::PassiveToActive,
            Arc::clone(&self.passive),
            Arc::clone(&self.active),
            self.shutdown.clone(),
        );
        let active_to_passive = secondary.stats();
        let passive_to_active = primary.stats();

        let secondary = tokio::spawn(secondary.run());
        on_started();

        let primary_result = primary.run().await;
        if primary_result.is_err() {
            self.shutdown.request();
        }

        let secondary_result = if self.shutdown.is_requested() {
            secondary.abort();
            match secondary.await {
                Ok(result) => Some(result),
                Err(e) if e.is_cancelled() => {
                    info!("{}: relay cancelled", Direction::ActiveToPassive);
                    None
                }
                Err(e) => {
                    error!("{}: relay task failed: {e}", Direction::ActiveToPassive);
                    None
                }
            }
        } else {
            match secondary.await {
                Ok(result) => Some(result),
                Err(e) => {
                    error!("{}: relay task failed: {e}", Direction::ActiveToPassive);
                    None
                }
            }
        };

        // A cancelled loop never got to close its source.
        self.active.close().await;
        self.passive.close().await;

        let primary = primary_result?;
        let secondary = secondary_result.transpose()?;
        if primary == RelayExit::SourceClosed {
            warn!("{}: source closed without shutdown", Direction::PassiveToActive);
        }

        info!("bridge stopped");
        Ok(BridgeOutcome {
            primary,
            secondary,
            passive_to_active: passive_to_active.snapshot(),
            active_to_passive: active_to_passive.snapshot(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
