//! Event frame types and wire constants.
//!
//! Wire format (ASCII, fixed width, no length prefix):
//! ```text
//! >SW:<target>,<value>     switch event   (7 bytes)
//! >OUT:<target>,<value>    output command (8 bytes)
//! ```
//! `target` and `value` are single decimal digits.  A frame may be followed by
//! one line terminator (`\n` or `\r\n`); nothing else may follow it.

use std::fmt;

use crate::protocol::codec::FrameError;

/// Highest valid `target` index.  Targets are `0..=MAX_TARGET`.
pub const MAX_TARGET: u8 = 2;

/// Size of the buffer handed to a single socket read.
///
/// Every valid frame, including an optional `\r\n`, fits in this many bytes.
pub const FRAME_BUFFER_SIZE: usize = 10;

/// The two frame grammars understood by the bridge.
///
/// Each direction of the bridge accepts exactly one grammar; a frame of the
/// other grammar arriving on the wrong side is rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// `>SW:t,v`: a switch changed state on the controller side.
    Switch,
    /// `>OUT:t,v`: a request to drive an output, issued by the field side.
    Output,
}

impl Grammar {
    /// Literal prefix that starts every frame of this grammar.
    pub const fn prefix(self) -> &'static [u8] {
        match self {
            Grammar::Switch => b">SW:",
            Grammar::Output => b">OUT:",
        }
    }

    /// Length of a frame of this grammar without any line terminator.
    pub const fn frame_len(self) -> usize {
        // prefix + digit + ',' + digit
        self.prefix().len() + 3
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grammar::Switch => f.write_str("switch"),
            Grammar::Output => f.write_str("output"),
        }
    }
}

/// A validated event frame.
///
/// A `Frame` keeps the exact bytes it was decoded from, so relaying a frame
/// never re-serializes it: [`Frame::as_bytes`] returns what arrived on the
/// wire, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    grammar: Grammar,
    target: u8,
    value: u8,
    raw: Vec<u8>,
}

impl Frame {
    /// Builds the canonical encoding of a frame (no line terminator).
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OutOfRange`] if `target > MAX_TARGET` or
    /// `value` is not 0 or 1.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serial_bridge_core::protocol::{Frame, Grammar};
    ///
    /// let frame = Frame::new(Grammar::Output, 1, 1).unwrap();
    /// assert_eq!(frame.as_bytes(), b">OUT:1,1");
    /// ```
    pub fn new(grammar: Grammar, target: u8, value: u8) -> Result<Self, FrameError> {
        check_range(target, value)?;

        let mut raw = Vec::with_capacity(grammar.frame_len());
        raw.extend_from_slice(grammar.prefix());
        raw.push(b'0' + target);
        raw.push(b',');
        raw.push(b'0' + value);

        Ok(Self {
            grammar,
            target,
            value,
            raw,
        })
    }

    /// Called by the decoder once `raw` has passed every check.
    pub(crate) fn from_validated(grammar: Grammar, target: u8, value: u8, raw: &[u8]) -> Self {
        Self {
            grammar,
            target,
            value,
            raw: raw.to_vec(),
        }
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Index of the output or switch this frame addresses.
    pub fn target(&self) -> u8 {
        self.target
    }

    /// Binary state: 0 or 1.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// The exact bytes this frame was built or decoded from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consumes the frame and returns its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the canonical part; the terminator is not interesting in logs.
        let end = self.raw.len().min(self.grammar.frame_len());
        f.write_str(&String::from_utf8_lossy(&self.raw[..end]))
    }
}

pub(crate) fn check_range(target: u8, value: u8) -> Result<(), FrameError> {
    if target > MAX_TARGET {
        return Err(FrameError::OutOfRange {
            field: "target",
            value: target,
        });
    }
    if value > 1 {
        return Err(FrameError::OutOfRange {
            field: "value",
            value,
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
