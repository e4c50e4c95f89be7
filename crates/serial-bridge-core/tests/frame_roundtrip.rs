//! Integration tests for the frame codec through the public API.
//!
//! These cover the whole valid input space (every target, every value, both
//! grammars) plus the families of input that must be rejected.

use serial_bridge_core::{decode, encode, Frame, FrameError, Grammar, MAX_TARGET};

const GRAMMARS: [Grammar; 2] = [Grammar::Switch, Grammar::Output];

#[test]
fn test_every_valid_frame_decodes_to_its_fields() {
    for grammar in GRAMMARS {
        for target in 0..=MAX_TARGET {
            for value in 0..=1 {
                // Arrange
                let built = Frame::new(grammar, target, value).expect("in range");

                // Act
                let decoded = decode(built.as_bytes(), grammar).expect("valid frame");

                // Assert
                assert_eq!((decoded.target(), decoded.value()), (target, value));
                assert_eq!(encode(&decoded), built.as_bytes());
            }
        }
    }
}

#[test]
fn test_frames_are_rejected_by_the_other_grammar() {
    let switch = Frame::new(Grammar::Switch, 1, 1).unwrap();
    let output = Frame::new(Grammar::Output, 1, 1).unwrap();

    assert!(matches!(
        decode(switch.as_bytes(), Grammar::Output),
        Err(FrameError::MalformedFrame { .. })
    ));
    assert!(matches!(
        decode(output.as_bytes(), Grammar::Switch),
        Err(FrameError::MalformedFrame { .. })
    ));
}

#[test]
fn test_every_out_of_range_target_is_rejected() {
    for grammar in GRAMMARS {
        for target in (MAX_TARGET + 1)..=9 {
            let mut raw = grammar.prefix().to_vec();
            raw.extend_from_slice(format!("{target},1").as_bytes());

            assert_eq!(
                decode(&raw, grammar),
                Err(FrameError::OutOfRange {
                    field: "target",
                    value: target
                }),
                "target {target} must be out of range"
            );
        }
    }
}

#[test]
fn test_inputs_without_exact_prefix_are_malformed() {
    let inputs: [&[u8]; 8] = [
        b"",
        b">",
        b">SW",
        b"SW:1,1",
        b" >SW:1,1",
        b">SW :1,1",
        b">OUT:1,1",
        b"\0\0\0\0\0\0\0",
    ];

    for raw in inputs {
        assert!(
            matches!(
                decode(raw, Grammar::Switch),
                Err(FrameError::MalformedFrame { .. })
            ),
            "{raw:?} must be malformed"
        );
    }
}

#[test]
fn test_inputs_with_missing_digits_are_malformed() {
    let inputs: [&[u8]; 5] = [b">OUT:", b">OUT:1", b">OUT:,1", b">OUT:1,", b">OUT:,"];

    for raw in inputs {
        assert!(
            matches!(
                decode(raw, Grammar::Output),
                Err(FrameError::MalformedFrame { .. })
            ),
            "{raw:?} must be malformed"
        );
    }
}

#[test]
fn test_terminated_frames_are_forwarded_with_their_terminator() {
    let decoded = decode(b">OUT:2,1\r\n", Grammar::Output).unwrap();
    assert_eq!(encode(&decoded), b">OUT:2,1\r\n");
    assert_eq!(decoded.to_string(), ">OUT:2,1");
}
