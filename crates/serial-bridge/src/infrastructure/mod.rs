//! Infrastructure layer for serial-bridge.
//!
//! Everything that touches the operating system lives here:
//!
//! - TCP endpoints: the passive listener and the active reconnecting client,
//!   both built on the shared [`endpoint::Endpoint`] lifecycle
//! - Termination signal handling
//! - The [`Bridge`] that wires endpoints and relay loops together
//! - Reading the optional TOML configuration file
//!
//! # What does NOT belong here?
//!
//! - Frame validation (that is `serial-bridge-core`)
//! - The forwarding rules themselves (that is the application layer)

pub mod active;
pub mod bridge;
pub mod endpoint;
pub mod passive;
pub mod signals;
pub mod storage;

pub use active::{ActiveConnector, ActiveEndpoint};
pub use bridge::{Bridge, BridgeOutcome};
pub use endpoint::{Connector, Endpoint};
pub use passive::{PassiveConnector, PassiveEndpoint};
pub use signals::ShutdownSignals;
