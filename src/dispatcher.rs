// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invokes a screen's lifecycle hooks with graceful degradation: a faulting
//! hook logs a warning and leaves state untouched rather than taking the
//! session down.

use tracing::warn;

use crate::screen::{InfoMessage, Params, Screen, ScreenSession};
use crate::screen_state::ScreenState;
use crate::vm::Vm;

/// Outcome of rendering a screen for this cycle.
pub enum RenderOutcome {
    Ok(Vm),
    Faulted { message: String },
}

/// Mount a screen. A mount fault is a hard error — the caller (session
/// start, or a re-mount during routing) must abort.
pub fn mount(
    screen: &dyn Screen,
    params: &Params,
    screen_session: &ScreenSession,
    prior: Option<&ScreenState>,
) -> Result<ScreenState, crate::screen::ScreenFault> {
    screen.mount(params, screen_session, prior)
}

/// Dispatch an inbound intent to the screen's event handler.
///
/// On fault, logs a warning and returns the prior state unchanged — the
/// intent is effectively a no-op.
pub fn handle_event(
    screen: &dyn Screen,
    name: &str,
    payload: &Vm,
    state: ScreenState,
) -> ScreenState {
    let before = state.clone();
    match screen.handle_event(name, payload, state) {
        Ok(next) => next,
        Err(fault) => {
            warn!(intent = name, error = %fault, "screen handle_event faulted; keeping prior state");
            before
        }
    }
}

/// Dispatch updated route params.
///
/// Returns `None` if the screen has no `handle_params` hook — the caller
/// must perform a full re-mount in that case. On fault, logs a warning and
/// returns the prior state unchanged, wrapped in `Some` (the hook *was*
/// present; it just failed).
pub fn handle_params(screen: &dyn Screen, params: &Params, state: ScreenState) -> Option<ScreenState> {
    let before = state.clone();
    match screen.handle_params(params, state) {
        None => None,
        Some(Ok(next)) => Some(next),
        Some(Err(fault)) => {
            warn!(error = %fault, "screen handle_params faulted; keeping prior state");
            Some(before)
        }
    }
}

/// Dispatch a timer fire or host message.
pub fn handle_info(screen: &dyn Screen, message: &InfoMessage, state: ScreenState) -> ScreenState {
    let before = state.clone();
    match screen.handle_info(message, state) {
        Ok(next) => next,
        Err(fault) => {
            warn!(error = %fault, "screen handle_info faulted; keeping prior state");
            before
        }
    }
}

/// Render the screen. A faulting render does not propagate — the caller
/// switches to the error VM for this cycle instead.
pub fn render(screen: &dyn Screen, assigns: &Vm) -> RenderOutcome {
    match screen.render(assigns) {
        Ok(vm) => RenderOutcome::Ok(vm),
        Err(fault) => RenderOutcome::Faulted { message: fault.to_string() },
    }
}

/// Subscriptions the screen wants. Never faults by contract (pure
/// computation over `params`/`screen_session`); an implementation that
/// panics here is a programmer error in the screen itself, not something
/// this dispatcher can recover from.
pub fn subscriptions(
    screen: &dyn Screen,
    params: &Params,
    screen_session: &ScreenSession,
) -> Vec<String> {
    screen.subscriptions(params, screen_session)
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
