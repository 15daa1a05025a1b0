// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coalesces bursts of patch ops into batched envelopes, preserving
//! per-path latest-write-wins ordering and the newest acknowledgement
//! token.
//!
//! This is pure state-transition logic: it never owns a timer itself. The
//! caller (the session's `tokio::select!` loop, see [`crate::session`])
//! schedules/cancels the actual `tokio::time::Sleep` in response to the
//! [`FlushDecision`] this returns, the same split the teacher keeps between
//! its select-loop and the plain state it drives.

use crate::pointer::PatchOp;

/// What the batcher's caller should do with its flush timer after an
/// [`PatchBatcher::enqueue`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    /// Nothing pending; cancel any running timer.
    CancelTimer,
    /// No timer was running; the caller should start one for the batch
    /// window.
    ScheduleTimer,
    /// A timer is already running; leave it alone — per spec, two
    /// successive `enqueue` calls never start overlapping timers.
    TimerAlreadyArmed,
    /// Flush immediately (window is zero, or the op-count cap was hit).
    FlushNow,
}

/// A coalesced patch envelope ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushedPatch {
    pub ops: Vec<PatchOp>,
    pub ack: Option<i64>,
}

/// Accumulates patch ops between flushes.
#[derive(Debug, Default)]
pub struct PatchBatcher {
    pending_ops: Vec<PatchOp>,
    pending_ack: Option<i64>,
    timer_armed: bool,
    max_pending_ops: usize,
}

impl PatchBatcher {
    pub fn new(max_pending_ops: usize) -> Self {
        Self { pending_ops: Vec::new(), pending_ack: None, timer_armed: false, max_pending_ops }
    }

    pub fn is_empty(&self) -> bool {
        self.pending_ops.is_empty()
    }

    pub fn pending_op_count(&self) -> usize {
        self.pending_ops.len()
    }

    /// Append `ops`, coalesce by path (latest write wins, first-occurrence
    /// position preserved), merge `ack`, and decide what the caller's timer
    /// should do.
    ///
    /// `batch_window_ms == 0` means "flush immediately" — pass that in via
    /// `immediate` rather than storing it here, since the batcher has no
    /// opinion about wall-clock time.
    pub fn enqueue(&mut self, ops: Vec<PatchOp>, ack: Option<i64>, immediate: bool) -> FlushDecision {
        self.pending_ops.extend(ops);
        coalesce(&mut self.pending_ops);
        self.pending_ack = merge_ack(self.pending_ack, ack);

        if self.pending_ops.is_empty() {
            self.pending_ack = None;
            self.timer_armed = false;
            return FlushDecision::CancelTimer;
        }
        if immediate || self.pending_ops.len() >= self.max_pending_ops {
            return FlushDecision::FlushNow;
        }
        if self.timer_armed {
            FlushDecision::TimerAlreadyArmed
        } else {
            self.timer_armed = true;
            FlushDecision::ScheduleTimer
        }
    }

    /// Produce the flushed batch (if any) and clear pending state.
    pub fn flush(&mut self) -> Option<FlushedPatch> {
        if self.pending_ops.is_empty() {
            self.timer_armed = false;
            return None;
        }
        let ops = std::mem::take(&mut self.pending_ops);
        let ack = self.pending_ack.take();
        self.timer_armed = false;
        Some(FlushedPatch { ops, ack })
    }

    /// Discard any pending batch without emitting — used when a `ready`
    /// supersedes it with a full render.
    pub fn clear(&mut self) {
        self.pending_ops.clear();
        self.pending_ack = None;
        self.timer_armed = false;
    }
}

/// Merge two optional ack tokens: the maximum if both are defined,
/// otherwise whichever is defined.
fn merge_ack(old: Option<i64>, new: Option<i64>) -> Option<i64> {
    match (old, new) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Keep only the latest op for each distinct path, preserving the position
/// of each path's first occurrence.
fn coalesce(ops: &mut Vec<PatchOp>) {
    let mut latest_by_path: std::collections::HashMap<String, PatchOp> =
        std::collections::HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for op in ops.drain(..) {
        let path = op.path().to_owned();
        if !latest_by_path.contains_key(&path) {
            order.push(path.clone());
        }
        latest_by_path.insert(path, op);
    }

    for path in order {
        if let Some(op) = latest_by_path.remove(&path) {
            ops.push(op);
        }
    }
}

#[cfg(test)]
#[path = "batcher_tests.rs"]
mod tests;
