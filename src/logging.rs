// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup. Mirrors the teacher's `init_tracing`, minus the
//! CLI-flag plumbing this crate doesn't have: log level and format come from
//! [`crate::config::LogSettings`] instead of `clap` args.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LogSettings};

/// Initialize the global tracing subscriber from `settings`.
///
/// Uses `try_init` so it's safe to call more than once (tests, embedders
/// that already installed a subscriber).
pub fn init(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let result = match settings.format {
        LogFormat::Json => fmt::fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Text => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
