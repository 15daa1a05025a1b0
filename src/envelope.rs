// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound/outbound envelope types and the codec that encodes/decodes them,
//! independent of how the bytes are framed on the wire.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ErrorCode, TransportError};
use crate::pointer::PatchOp;
use crate::vm::Vm;

/// Maximum size, in bytes, of a single inbound (renderer → core) frame.
pub const INBOUND_CAP: usize = 65_536;
/// Maximum size, in bytes, of a single outbound (core → renderer) frame.
pub const OUTBOUND_CAP: usize = 1_048_576;

const WARN_THRESHOLD: f64 = 0.80;

/// A message received from the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum InboundEnvelope {
    Ready {
        sid: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capabilities: Option<serde_json::Map<String, serde_json::Value>>,
    },
    Intent {
        sid: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Map<String, serde_json::Value>>,
    },
}

/// A message sent to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum OutboundEnvelope {
    Render {
        sid: String,
        rev: u64,
        vm: Vm,
        #[serde(skip_serializing_if = "Option::is_none")]
        ack: Option<i64>,
    },
    Patch {
        sid: String,
        rev: u64,
        ops: Vec<PatchOp>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ack: Option<i64>,
    },
    Error {
        sid: String,
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rev: Option<u64>,
    },
}

/// Decode one inbound frame's bytes into an [`InboundEnvelope`].
///
/// Enforces the inbound size cap before attempting to parse, and emits a
/// non-fatal warning once the frame crosses 80% of the cap.
pub fn decode_inbound(bytes: &[u8]) -> Result<InboundEnvelope, TransportError> {
    check_cap(bytes.len(), INBOUND_CAP, "inbound")?;
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| TransportError::new(ErrorCode::DecodeError, e.to_string()))?;
    if !value.is_object() {
        return Err(TransportError::new(
            ErrorCode::InvalidEnvelope,
            "decoded value is not a JSON object",
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| TransportError::new(ErrorCode::InvalidEnvelope, e.to_string()))
}

/// Encode an [`OutboundEnvelope`] into bytes.
///
/// Enforces the outbound size cap on the encoded result.
pub fn encode_outbound(envelope: &OutboundEnvelope) -> Result<Vec<u8>, TransportError> {
    let bytes = serde_json::to_vec(envelope)
        .map_err(|e| TransportError::new(ErrorCode::EncodeError, e.to_string()))?;
    check_cap(bytes.len(), OUTBOUND_CAP, "outbound")?;
    Ok(bytes)
}

fn check_cap(len: usize, cap: usize, direction: &str) -> Result<(), TransportError> {
    if len > cap {
        return Err(TransportError::new(
            ErrorCode::FrameTooLarge,
            format!("{direction} frame of {len} bytes exceeds cap of {cap} bytes"),
        ));
    }
    #[allow(clippy::cast_precision_loss)]
    if len as f64 >= cap as f64 * WARN_THRESHOLD {
        warn!(direction, len, cap, "frame approaching size cap");
    }
    Ok(())
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
