// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified error types shared across the codec, pointer, and session layers.

use std::fmt;

/// Wire-facing error codes: every one of these can legitimately reach the
/// renderer inside an `error` envelope or a `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    FrameTooLarge,
    DecodeError,
    InvalidEnvelope,
    EncodeError,
    InvalidPointer,
    InvalidEscape,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrameTooLarge => "FRAME_TOO_LARGE",
            Self::DecodeError => "DECODE_ERROR",
            Self::InvalidEnvelope => "INVALID_ENVELOPE",
            Self::EncodeError => "ENCODE_ERROR",
            Self::InvalidPointer => "INVALID_POINTER",
            Self::InvalidEscape => "INVALID_ESCAPE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable fault at a transport boundary: decode/encode/frame-size
/// failures that the bridge converts into a synthetic `error` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub code: ErrorCode,
    pub message: String,
}

impl TransportError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for TransportError {}

/// A programmer-error invariant violation: malformed pointer, malformed
/// patch op, or a non-monotonic revision. These must never reach the wire;
/// callers are expected to treat them as a hard abort of the current
/// operation, not as recoverable conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    InvalidPointer(String),
    InvalidEscape(String),
    NonMonotonicRevision { prev: u64, next: u64 },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPointer(s) => write!(f, "invalid JSON pointer: {s:?}"),
            Self::InvalidEscape(s) => write!(f, "invalid pointer escape in {s:?}"),
            Self::NonMonotonicRevision { prev, next } => {
                write!(f, "revision went from {prev} to {next}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
