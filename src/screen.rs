// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The screen controller capability interface.
//!
//! A screen module is a polymorphic collaborator registered in a table and
//! looked up by a stable identifier referenced from route definitions. Every
//! hook except [`Screen::schema`] has a documented default, which is how the
//! source's "probed for an optional function" dynamic dispatch is expressed
//! in a statically typed trait.

use crate::screen_state::ScreenState;
use crate::vm::Vm;

/// Opaque routing-boundary identity. Two routes with different
/// `screen_session` values belong to different partitions; navigating
/// between partitions is forbidden (see [`crate::route`]).
pub type ScreenSession = String;

/// A single inbound route/screen parameter bag.
pub type Params = Vm;

/// Returned by a screen hook that mutates state. `Err` means the hook
/// faulted (the target-language stand-in for the source catching a thrown
/// exception); the dispatcher logs it and keeps the prior state.
pub type HookResult = Result<ScreenState, ScreenFault>;

/// Opaque fault from a screen hook. The message is logged, never shown to
/// the renderer.
#[derive(Debug, Clone)]
pub struct ScreenFault(pub String);

impl ScreenFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for ScreenFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ScreenFault {}

/// An inbound timer/out-of-band message delivered to [`Screen::handle_info`].
#[derive(Debug, Clone)]
pub enum InfoMessage {
    Tick,
    Custom(String, Vm),
}

/// The screen controller capability set.
pub trait Screen: Send + Sync {
    /// Field → default value mapping describing this screen's public VM
    /// surface. Used to seed mount state.
    fn schema(&self) -> Vm;

    /// Build the initial state for a fresh mount. Must succeed — a mount
    /// fault aborts session start (see [`crate::dispatcher`]).
    ///
    /// Default: seed from [`Screen::schema`], ignoring `params`.
    fn mount(
        &self,
        _params: &Params,
        _screen_session: &ScreenSession,
        _initial_state: Option<&ScreenState>,
    ) -> Result<ScreenState, ScreenFault> {
        Ok(ScreenState::new(self.schema()))
    }

    /// Handle an inbound intent directed at this screen (any name not
    /// reserved for route-level intents).
    ///
    /// Default: state unchanged.
    fn handle_event(&self, _name: &str, _payload: &Vm, state: ScreenState) -> HookResult {
        Ok(state)
    }

    /// Handle updated route params without a re-mount. `None` means "no
    /// hook" — the dispatcher performs a full re-mount instead of calling
    /// this default.
    fn handle_params(&self, _params: &Params, state: ScreenState) -> Option<HookResult> {
        let _ = state;
        None
    }

    /// Handle a timer fire or host-delivered message.
    ///
    /// Default: state unchanged.
    fn handle_info(&self, _message: &InfoMessage, state: ScreenState) -> HookResult {
        Ok(state)
    }

    /// Render this screen's VM subtree from its assigns. Must be
    /// deterministic in `assigns`.
    ///
    /// Default: project assigns onto the schema's keys (drop anything not in
    /// the declared schema, fill nothing in — assigns already contains the
    /// full schema after mount).
    fn render(&self, assigns: &Vm) -> Result<Vm, ScreenFault> {
        let schema = self.schema();
        Ok(assigns
            .iter()
            .filter(|(key, _)| schema.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    /// Pub/sub topics this screen wants subscribed while mounted.
    ///
    /// Default: no subscriptions.
    fn subscriptions(&self, _params: &Params, _screen_session: &ScreenSession) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
#[path = "screen_tests.rs"]
mod tests;
