use super::*;

#[test]
fn error_code_round_trips_through_as_str() {
    for code in [
        ErrorCode::FrameTooLarge,
        ErrorCode::DecodeError,
        ErrorCode::InvalidEnvelope,
        ErrorCode::EncodeError,
        ErrorCode::InvalidPointer,
        ErrorCode::InvalidEscape,
    ] {
        assert_eq!(code.to_string(), code.as_str());
    }
}

#[test]
fn transport_error_display_includes_code_and_message() {
    let err = TransportError::new(ErrorCode::DecodeError, "unexpected EOF");
    assert_eq!(err.to_string(), "DECODE_ERROR: unexpected EOF");
}

#[test]
fn core_error_display_is_human_readable() {
    let err = CoreError::NonMonotonicRevision { prev: 5, next: 4 };
    assert_eq!(err.to_string(), "revision went from 5 to 4");
}
