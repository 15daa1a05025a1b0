// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `tokio::select!` loop that drives a [`SessionCore`] as a
//! single-threaded cooperative actor (§5), the way the teacher's
//! `session/run.rs` drives its `Session` — one task owns the core
//! exclusively; everything else talks to it through a channel.

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info_span, Instrument};

use crate::bridge::TransportBridge;
use crate::envelope::InboundEnvelope;
use crate::session::{Effect, SessionCore};

/// Message delivered to a running session actor.
pub enum Inbound {
    Envelope(InboundEnvelope),
    Shutdown,
}

/// Handle used to feed inbound envelopes to a running [`Session`] actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Inbound>,
}

impl SessionHandle {
    pub async fn send(&self, envelope: InboundEnvelope) -> Result<(), mpsc::error::SendError<Inbound>> {
        self.tx.send(Inbound::Envelope(envelope)).await
    }

    pub async fn shutdown(&self) -> Result<(), mpsc::error::SendError<Inbound>> {
        self.tx.send(Inbound::Shutdown).await
    }
}

/// Owns a [`SessionCore`] and a [`TransportBridge`], and runs the
/// `tokio::select!` loop that turns inbound envelopes and timer fires into
/// [`Effect`]s, carrying each one out in order.
pub struct Session<B: TransportBridge> {
    core: SessionCore,
    bridge: B,
    inbox: mpsc::Receiver<Inbound>,
}

impl<B: TransportBridge> Session<B> {
    /// Wrap a [`SessionCore`] for running. Returns the actor plus the handle
    /// callers use to feed it inbound envelopes.
    pub fn new(core: SessionCore, bridge: B, inbox_capacity: usize) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(inbox_capacity);
        (Self { core, bridge, inbox: rx }, SessionHandle { tx })
    }

    /// Run until the inbox closes or a `Shutdown` message arrives.
    pub async fn run(mut self) {
        let mut flush_at: Option<Instant> = None;
        let mut tick_at: Option<Instant> = None;

        loop {
            tokio::select! {
                msg = self.inbox.recv() => {
                    let span = info_span!("session", sid = self.core.sid().unwrap_or("-"));
                    match msg {
                        Some(Inbound::Envelope(envelope)) => {
                            let effects = self.core.handle_inbound(envelope);
                            self.apply(effects, &mut flush_at, &mut tick_at).instrument(span).await;
                        }
                        Some(Inbound::Shutdown) | None => {
                            let effects = self.core.shutdown();
                            self.apply(effects, &mut flush_at, &mut tick_at).instrument(span).await;
                            break;
                        }
                    }
                }

                _ = async {
                    match flush_at {
                        Some(at) => sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                }, if flush_at.is_some() => {
                    let span = info_span!("session", sid = self.core.sid().unwrap_or("-"));
                    let effects = self.core.on_flush_timer_fired();
                    self.apply(effects, &mut flush_at, &mut tick_at).instrument(span).await;
                }

                _ = async {
                    match tick_at {
                        Some(at) => sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                }, if tick_at.is_some() => {
                    let span = info_span!("session", sid = self.core.sid().unwrap_or("-"));
                    let effects = self.core.on_tick_fired();
                    self.apply(effects, &mut flush_at, &mut tick_at).instrument(span).await;
                }
            }
        }
    }

    async fn apply(
        &self,
        effects: Vec<Effect>,
        flush_at: &mut Option<Instant>,
        tick_at: &mut Option<Instant>,
    ) {
        for effect in effects {
            match effect {
                Effect::Send(envelope) => {
                    if let Err(e) = self.bridge.send_outbound(&envelope).await {
                        error!(error = %e, "failed to send outbound envelope");
                    }
                }
                Effect::ScheduleFlush(duration) => {
                    *flush_at = Some(Instant::now() + duration);
                }
                Effect::CancelFlush => {
                    *flush_at = None;
                }
                Effect::ScheduleTick(duration) => {
                    *tick_at = Some(Instant::now() + duration);
                }
                Effect::CancelTick => {
                    *tick_at = None;
                }
            }
        }
        debug!(pending_flush = flush_at.is_some(), pending_tick = tick_at.is_some(), "effects applied");
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
