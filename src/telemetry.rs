// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four telemetry emission points, realized as `tracing` events rather
//! than a bespoke metrics sink — the teacher routes all observability
//! through `tracing` and leaves collection to whatever subscriber the
//! embedder installs.

use tracing::info;

/// An intent envelope was received and is about to be dispatched.
pub fn intent_received(sid: &str, rev: u64, screen: &str, name: &str, ack: Option<i64>) {
    info!(
        target: "projection_core::telemetry",
        event = "intent.received",
        sid,
        rev,
        screen,
        intent = name,
        ack,
    );
}

/// A render cycle finished, successfully or not.
pub fn render_complete(sid: &str, rev: u64, duration_ms: f64, status: RenderStatus) {
    info!(
        target: "projection_core::telemetry",
        event = "render.complete",
        sid,
        rev,
        duration_ms,
        status = status.as_str(),
    );
}

/// Status recorded for a `render.complete` telemetry emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Ok,
    Error,
}

impl RenderStatus {
    fn as_str(self) -> &'static str {
        match self {
            RenderStatus::Ok => "ok",
            RenderStatus::Error => "error",
        }
    }
}

/// A coalesced patch envelope was handed to the bridge.
pub fn patch_sent(sid: &str, rev: u64, op_count: usize, ack: Option<i64>) {
    info!(
        target: "projection_core::telemetry",
        event = "patch.sent",
        sid,
        rev,
        op_count,
        ack,
    );
}

/// A non-fatal internal fault worth surfacing to observers, distinct from
/// the hard invariant-violation errors that abort the current operation.
pub fn error(sid: &str, kind: &str, message: &str, screen: &str) {
    info!(
        target: "projection_core::telemetry",
        event = "error",
        sid,
        kind,
        message,
        screen,
    );
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
