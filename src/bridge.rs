// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The core ↔ transport bridge contract (§6.2), plus a concrete reference
//! implementation over a child process's stdio.
//!
//! The core only ever calls [`TransportBridge::send_outbound`]; decoding and
//! framing inbound bytes into an [`InboundEnvelope`] and handing it to the
//! session is the bridge's job, driven by whatever loop owns the bridge
//! (the session's `tokio::select!`, see [`crate::session`]). This mirrors
//! the teacher's `Backend` trait, which returns a boxed future so it stays
//! object-safe without pulling in `async-trait`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, error, warn};

use crate::envelope::{encode_outbound, OutboundEnvelope};
use crate::error::TransportError;

/// Side the core hands outbound envelopes to. Encoding, framing, and
/// connection lifecycle belong entirely to the implementor.
pub trait TransportBridge: Send + Sync {
    fn send_outbound<'a>(
        &'a self,
        envelope: &'a OutboundEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;
}

/// Bounded exponential backoff schedule for reconnect attempts.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the `attempt`-th retry (0-indexed).
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base.saturating_mul(self.multiplier.saturating_pow(attempt));
        scaled.min(self.max_delay)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempt >= max)
    }
}

/// Reference [`TransportBridge`]: a length-prefixed JSON codec over a
/// spawned child process's stdin/stdout, reconnecting with bounded
/// exponential backoff when the process exits or a pipe breaks.
///
/// Inbound framing (child stdout → core) is handled by
/// [`ChildProcessBridge::run`], which owns the reconnect loop and hands
/// each decoded envelope to `on_inbound`. Outbound framing is the
/// `TransportBridge::send_outbound` impl, writing directly to whichever
/// child is currently alive.
pub struct ChildProcessBridge {
    command: String,
    args: Vec<String>,
    backoff: BackoffPolicy,
    child: tokio::sync::Mutex<Option<Child>>,
}

impl ChildProcessBridge {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::with_backoff(command, args, BackoffPolicy::default())
    }

    pub fn with_backoff(command: impl Into<String>, args: Vec<String>, backoff: BackoffPolicy) -> Self {
        Self { command: command.into(), args, backoff, child: tokio::sync::Mutex::new(None) }
    }

    async fn spawn(&self) -> std::io::Result<Child> {
        Command::new(&self.command)
            .args(&self.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
    }

    /// Drive the reconnect loop: spawn the child, read length-prefixed
    /// frames from its stdout until it exits or the pipe breaks, then
    /// reconnect per `self.backoff`. Each decoded inbound envelope is
    /// handed to `on_inbound`.
    ///
    /// Returns only when backoff attempts are exhausted (if bounded); an
    /// unbounded policy runs until the process is dropped.
    pub async fn run<F>(&self, mut on_inbound: F) -> Result<(), TransportError>
    where
        F: FnMut(Vec<u8>) + Send,
    {
        let mut attempt = 0u32;
        loop {
            match self.spawn().await {
                Ok(mut child) => {
                    attempt = 0;
                    let stdout = child.stdout.take();
                    *self.child.lock().await = Some(child);

                    if let Some(mut stdout) = stdout {
                        loop {
                            match read_frame(&mut stdout).await {
                                Ok(Some(bytes)) => on_inbound(bytes),
                                Ok(None) => break,
                                Err(e) => {
                                    warn!(error = %e, "child bridge read failed, reconnecting");
                                    break;
                                }
                            }
                        }
                    }
                    *self.child.lock().await = None;
                }
                Err(e) => {
                    error!(error = %e, attempt, "failed to spawn bridge child process");
                }
            }

            if self.backoff.exhausted(attempt) {
                return Err(TransportError::new(
                    crate::error::ErrorCode::DecodeError,
                    "bridge reconnect attempts exhausted",
                ));
            }
            let delay = self.backoff.delay_for(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "bridge reconnecting");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl TransportBridge for ChildProcessBridge {
    fn send_outbound<'a>(
        &'a self,
        envelope: &'a OutboundEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let bytes = encode_outbound(envelope)?;
            let mut guard = self.child.lock().await;
            let Some(child) = guard.as_mut() else {
                return Err(TransportError::new(
                    crate::error::ErrorCode::EncodeError,
                    "no active bridge child process",
                ));
            };
            let Some(stdin) = child.stdin.as_mut() else {
                return Err(TransportError::new(
                    crate::error::ErrorCode::EncodeError,
                    "bridge child process has no stdin",
                ));
            };
            write_frame(stdin, &bytes).await.map_err(|e| {
                TransportError::new(crate::error::ErrorCode::EncodeError, e.to_string())
            })
        })
    }
}

async fn write_frame(
    stdin: &mut (impl tokio::io::AsyncWrite + Unpin),
    bytes: &[u8],
) -> std::io::Result<()> {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    stdin.write_all(&len.to_be_bytes()).await?;
    stdin.write_all(bytes).await?;
    stdin.flush().await
}

/// Read one length-prefixed frame. `Ok(None)` means clean EOF (pipe closed).
async fn read_frame(
    stdout: &mut (impl tokio::io::AsyncRead + Unpin),
) -> std::io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stdout.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stdout.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
