//! Domain layer for serial-bridge.
//!
//! Pure types with no I/O: configuration, endpoint roles and relay
//! directions.  Nothing here touches a socket, a timer or the runtime.

pub mod config;
pub mod endpoint;

pub use config::BridgeConfig;
pub use endpoint::{Direction, Role};
