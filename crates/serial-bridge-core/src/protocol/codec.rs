//! Decoder for the fixed-width event frame grammar.
//!
//! Decoding is strict: the literal prefix must match byte for byte, each
//! numeric field is exactly one ASCII digit, and the only bytes tolerated after
//! the second digit are a single `\n` or `\r\n`.  There is no resynchronisation
//! and no partial acceptance; a buffer is either one valid frame or an error.
//!
//! Encoding is the identity: a relayed frame is written out as the bytes it
//! was decoded from (see [`encode`]).

use thiserror::Error;

use crate::protocol::frame::{check_range, Frame, Grammar};

/// Reasons a buffer is not a valid frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The prefix, separator or digit shapes do not match the grammar.
    #[error("malformed {grammar} frame: {reason}")]
    MalformedFrame {
        grammar: Grammar,
        reason: &'static str,
    },

    /// The frame is well-formed but a field lies outside its valid range.
    #[error("{field} {value} out of range")]
    OutOfRange { field: &'static str, value: u8 },
}

/// Decodes one frame of `grammar` from `raw`.
///
/// # Errors
///
/// - [`FrameError::MalformedFrame`] if the prefix, digit fields or separator
///   do not match exactly, or if unexpected bytes follow the frame.
/// - [`FrameError::OutOfRange`] if the target exceeds
///   [`MAX_TARGET`](crate::protocol::MAX_TARGET) or the value is not 0 or 1.
///
/// # Examples
///
/// ```rust
/// use serial_bridge_core::protocol::{decode, FrameError, Grammar};
///
/// let frame = decode(b">SW:1,0\n", Grammar::Switch).unwrap();
/// assert_eq!((frame.target(), frame.value()), (1, 0));
/// assert_eq!(frame.as_bytes(), b">SW:1,0\n");
///
/// assert!(matches!(
///     decode(b">SW:9,1", Grammar::Switch),
///     Err(FrameError::OutOfRange { .. })
/// ));
/// ```
pub fn decode(raw: &[u8], grammar: Grammar) -> Result<Frame, FrameError> {
    let malformed = |reason| FrameError::MalformedFrame { grammar, reason };

    let body = strip_terminator(raw);
    let fields = body
        .strip_prefix(grammar.prefix())
        .ok_or_else(|| malformed("prefix mismatch"))?;

    let (target, value) = match fields {
        [t, b',', v] => (*t, *v),
        _ if fields.len() < 3 => return Err(malformed("truncated fields")),
        _ if fields.len() > 3 => return Err(malformed("unexpected trailing bytes")),
        _ => return Err(malformed("missing separator")),
    };

    let target = digit(target).ok_or_else(|| malformed("target is not a digit"))?;
    let value = digit(value).ok_or_else(|| malformed("value is not a digit"))?;
    check_range(target, value)?;

    Ok(Frame::from_validated(grammar, target, value, raw))
}

/// Returns the bytes to put on the wire for `frame`.
///
/// Frames are forwarded verbatim, so this is exactly what was decoded.
pub fn encode(frame: &Frame) -> &[u8] {
    frame.as_bytes()
}

fn strip_terminator(raw: &[u8]) -> &[u8] {
    raw.strip_suffix(b"\r\n")
        .or_else(|| raw.strip_suffix(b"\n"))
        .unwrap_or(raw)
}

fn digit(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
