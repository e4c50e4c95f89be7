//! SIGINT / SIGTERM handling.
//!
//! Installing and watching are separate steps.  [`ShutdownSignals::install`]
//! registers the handlers right away, replacing the default "terminate"
//! disposition, so a signal that arrives during setup is recorded rather
//! than killing the process.  Nothing acts on it until [`ShutdownSignals::watch`]
//! is called once both relay loops exist; a signal recorded earlier is then
//! delivered immediately.

use tracing::info;

use crate::application::state::ShutdownFlag;

/// Registered, not yet watched, termination signal listeners.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Registers the listeners.  Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a handler cannot be registered.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Ctrl-C is registered lazily on non-Unix targets.
    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Spawns a task that turns the first signal into a shutdown request.
    ///
    /// The task also ends quietly if shutdown is requested some other way.
    pub fn watch(self, shutdown: ShutdownFlag) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                name = self.recv() => {
                    info!("received {name}; shutting down");
                    shutdown.request();
                }
                _ = shutdown.requested() => {}
            }
        })
    }

    #[cfg(unix)]
    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    async fn recv(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        "Ctrl+C"
    }
}
