//! Frame grammar and the strict decoder for it.

pub mod codec;
pub mod frame;

pub use codec::{decode, encode, FrameError};
pub use frame::{Frame, Grammar, FRAME_BUFFER_SIZE, MAX_TARGET};
