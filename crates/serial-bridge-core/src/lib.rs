//! # serial-bridge-core
//!
//! The wire vocabulary shared by the serial bridge and anything that talks to
//! it: the two fixed-width ASCII frame grammars and a strict decoder.
//!
//! ```text
//! controller ──">SW:t,v"──▶  bridge  ──">SW:t,v"──▶  field client
//! controller ◀──">OUT:t,v"── bridge ◀──">OUT:t,v"── field client
//! ```
//!
//! This crate does no I/O.  Everything in it is a pure function of its
//! inputs, so both relay directions can share it without locking.

pub mod protocol;

pub use protocol::codec::{decode, encode, FrameError};
pub use protocol::frame::{Frame, Grammar, FRAME_BUFFER_SIZE, MAX_TARGET};
