//! Application layer for serial-bridge.
//!
//! Knows *what* the bridge does (validate a frame, forward it if the other
//! side is ready, stop when asked) and delegates *how* bytes move to the
//! infrastructure layer through the [`ports`] traits.
//!
//! # What does NOT belong here?
//!
//! - Opening sockets, accepting or connecting (infrastructure)
//! - Signal handling (infrastructure)
//! - Frame grammar details (`serial-bridge-core`)

pub mod ports;
pub mod relay;
pub mod state;

pub use ports::{FrameSink, FrameSource, LinkError, Received, SetupError};
pub use relay::{RelayCounts, RelayExit, RelayLoop, RelayStats};
pub use state::{Readiness, ShutdownFlag};
