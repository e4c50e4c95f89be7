//! State shared between the two relay loops.
//!
//! Two kinds of cross-task state exist and nothing else is shared:
//!
//! - [`Readiness`]: one per endpoint.  Written by that endpoint's connection
//!   lifecycle, read by the opposite relay loop before it forwards a frame.
//! - [`ShutdownFlag`]: one per bridge.  Set by the signal watcher (or a test),
//!   observed by both loops and by every retry wait inside the endpoints.
//!
//! Both are cheap handles around an `Arc`; clone them into whoever needs them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

// ── Readiness ─────────────────────────────────────────────────────────────────

/// Whether an endpoint currently holds a usable connection.
///
/// Reads and writes are serialized by a mutex.  A `true` reading is only a
/// hint: the connection may drop right after the check, which is why
/// endpoint `send` re-validates its handle and fails cleanly instead.
#[derive(Debug, Clone, Default)]
pub struct Readiness {
    ready: Arc<Mutex<bool>>,
}

impl Readiness {
    /// Creates a flag in the not-ready state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the flag and returns the previous value.
    pub fn set(&self, ready: bool) -> bool {
        let mut guard = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, ready)
    }
}

// ── ShutdownFlag ──────────────────────────────────────────────────────────────

/// Process-wide, one-way shutdown request.
///
/// The flag only ever moves from "running" to "shutdown requested".  Waiters
/// are woken through a [`Notify`], so retry sleeps and blocking accepts end
/// as soon as the request is made rather than at their next timeout.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug, Default)]
struct ShutdownInner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown.
    ///
    /// Returns `true` only for the call that actually flipped the flag;
    /// repeated requests are no-ops.
    pub fn request(&self) -> bool {
        let first = !self.inner.requested.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested.
    pub async fn requested(&self) {
        loop {
            // Register before checking so a request made in between is not missed.
            let notified = self.inner.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }

    /// Sleeps for `duration` unless shutdown is requested first.
    ///
    /// Returns `true` if the sleep was cut short by (or started after) a
    /// shutdown request, `false` if the full duration elapsed.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.requested() => true,
            _ = tokio::time::sleep(duration) => self.is_requested(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
