// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session configuration. Unlike the teacher's `Config`, this is a plain
//! builder struct rather than a `clap::Parser` — standing up a session core
//! embedded in a host application has no command line, so there are no
//! flags or env vars to parse. Defaults mirror the spec's stated constants.

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Tracing subscriber configuration.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_owned(), format: LogFormat::default() }
    }
}

/// Tunables for a single session's runtime behavior.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Coalescing window for the patch batcher, in milliseconds. `0` means
    /// flush every enqueue immediately.
    pub batch_window_ms: u64,
    /// Op-count cap that forces an immediate flush regardless of the
    /// window timer.
    pub max_pending_ops: usize,
    /// Period between `Tick` info messages delivered to the active screen.
    pub tick_period_ms: u64,
    /// Title surfaced in the router-mode `app` VM frame.
    pub app_title: String,
    /// Max inbound frame size in bytes before a frame is rejected.
    pub inbound_cap: usize,
    /// Max outbound frame size in bytes before an encode is rejected.
    pub outbound_cap: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            batch_window_ms: 16,
            max_pending_ops: 64,
            tick_period_ms: 1_000,
            app_title: String::new(),
            inbound_cap: crate::envelope::INBOUND_CAP,
            outbound_cap: crate::envelope::OUTBOUND_CAP,
        }
    }
}

/// Builds a [`SessionSettings`] with method-chained overrides over the
/// defaults, rather than requiring every field to be named at construction.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    settings: SessionSettings,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_window_ms(mut self, ms: u64) -> Self {
        self.settings.batch_window_ms = ms;
        self
    }

    pub fn max_pending_ops(mut self, n: usize) -> Self {
        self.settings.max_pending_ops = n;
        self
    }

    pub fn tick_period_ms(mut self, ms: u64) -> Self {
        self.settings.tick_period_ms = ms;
        self
    }

    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.settings.app_title = title.into();
        self
    }

    pub fn inbound_cap(mut self, bytes: usize) -> Self {
        self.settings.inbound_cap = bytes;
        self
    }

    pub fn outbound_cap(mut self, bytes: usize) -> Self {
        self.settings.outbound_cap = bytes;
        self
    }

    pub fn build(self) -> SessionSettings {
        self.settings
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
