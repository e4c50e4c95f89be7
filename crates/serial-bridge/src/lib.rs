//! serial-bridge library crate.
//!
//! Relays fixed-width event frames between a field client and a controller:
//!
//! ```text
//! field client ──TCP──▶ :10000 [passive] ──">OUT:t,v"──▶ [active] ──TCP──▶ controller :4040
//! field client ◀─TCP─── :10000 [passive] ◀──">SW:t,v"─── [active] ◀─TCP─── controller :4040
//! ```
//!
//! Frames are validated with the grammar of the direction they travel in
//! and forwarded byte-for-byte; invalid frames, and frames whose
//! destination is not connected, are dropped.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! [serial-bridge]
//!   ├── domain/           BridgeConfig, endpoint roles, relay directions
//!   ├── application/      Relay loop, ports, readiness and shutdown state
//!   └── infrastructure/
//!         ├── passive/    Listening endpoint (socket2 + tokio)
//!         ├── active/     Reconnecting client endpoint
//!         ├── signals/    SIGINT / SIGTERM
//!         ├── bridge/     Wires both loops together
//!         └── storage/    Optional TOML config file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `serial-bridge-core`; it reaches
//!   sockets only through the traits in [`application::ports`].
//! - `infrastructure` depends on all other layers plus `tokio` and `socket2`.

/// Domain layer: configuration and pure types (no I/O).
pub mod domain;

/// Application layer: relay logic and shared state.
pub mod application;

/// Infrastructure layer: endpoints, signals, bridge wiring, config file.
pub mod infrastructure;

pub use application::{RelayCounts, RelayExit, SetupError, ShutdownFlag};
pub use domain::BridgeConfig;
pub use infrastructure::{Bridge, BridgeOutcome};
