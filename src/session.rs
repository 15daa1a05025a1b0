// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SessionCore`: the per-session state machine (§4.9). Pure transition
//! logic — no I/O, no timers, no channels. It consumes one inbound envelope
//! (already decoded) at a time and returns the [`Effect`]s its caller must
//! carry out: sending an outbound envelope, or arming/cancelling a timer.
//! This mirrors the split the teacher keeps between `session/transition.rs`'s
//! pure helpers and `session/run.rs`'s `tokio::select!` loop — see
//! [`crate::actor`] for the actor that drives this with real timers and a
//! [`crate::bridge::TransportBridge`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::batcher::{FlushDecision, PatchBatcher};
use crate::config::SessionSettings;
use crate::differ::{diff, diff_at_paths};
use crate::dispatcher;
use crate::envelope::{InboundEnvelope, OutboundEnvelope};
use crate::pointer::PatchOp;
use crate::route::{NavState, RouteDef, Router};
use crate::screen::{InfoMessage, Params, Screen, ScreenFault, ScreenSession};
use crate::screen_state::ScreenState;
use crate::subscription::{SubscriptionHook, SubscriptionSyncer};
use crate::telemetry::{self, RenderStatus};
use crate::vm::{Value, Vm};

/// Table of screen controllers keyed by the `screen_module` identifier a
/// [`RouteDef`] names. The runtime output of the screen-registration DSL
/// (out of this core's scope, see §9): a static map the host builds once.
pub type ScreenRegistry = HashMap<String, Arc<dyn Screen>>;

/// What the actor driving a [`SessionCore`] must do after a transition.
#[derive(Debug)]
pub enum Effect {
    /// Hand this envelope to the transport bridge.
    Send(OutboundEnvelope),
    /// No flush timer is running; start one for the given duration.
    ScheduleFlush(Duration),
    /// Cancel any running flush timer.
    CancelFlush,
    /// No tick timer is running; start one for the given duration.
    ScheduleTick(Duration),
    /// Cancel any running tick timer.
    CancelTick,
}

/// Error constructing a [`SessionCore`]: the screen registry doesn't cover
/// every route's `screen_module`, or the initial mount faulted.
#[derive(Debug)]
pub enum SessionBuildError {
    UnregisteredScreenModule(String),
    InitialMountFaulted(ScreenFault),
    UnknownInitialRoute(String),
}

impl std::fmt::Display for SessionBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnregisteredScreenModule(m) => {
                write!(f, "route references unregistered screen module {m:?}")
            }
            Self::InitialMountFaulted(e) => write!(f, "initial mount faulted: {e}"),
            Self::UnknownInitialRoute(r) => write!(f, "unknown initial route {r:?}"),
        }
    }
}

impl std::error::Error for SessionBuildError {}

enum Mode {
    Router { router: Arc<Router>, screens: Arc<ScreenRegistry>, nav: NavState },
    SingleScreen { screen: Arc<dyn Screen>, screen_session: ScreenSession, params: Params },
}

/// The per-session state machine. One instance per UI connection; owned
/// exclusively by the [`crate::actor`] task that drives it.
pub struct SessionCore {
    sid: Option<String>,
    rev: u64,
    vm: Vm,
    mode: Mode,
    screen_state: ScreenState,
    subscriptions: SubscriptionSyncer,
    subscription_hook: Box<dyn SubscriptionHook>,
    batcher: PatchBatcher,
    settings: SessionSettings,
    tick_armed: bool,
}

impl SessionCore {
    /// Build a session in router mode, mounting the router's default route.
    pub fn new_router(
        router: Arc<Router>,
        screens: Arc<ScreenRegistry>,
        settings: SessionSettings,
        subscription_hook: Box<dyn SubscriptionHook>,
    ) -> Result<Self, SessionBuildError> {
        for def in router.route_defs().values() {
            if !screens.contains_key(&def.screen_module) {
                return Err(SessionBuildError::UnregisteredScreenModule(def.screen_module.clone()));
            }
        }
        let default_name = router.default_route_name().to_owned();
        let nav = router
            .initial_nav(&default_name, Params::new())
            .ok_or(SessionBuildError::UnknownInitialRoute(default_name))?;

        let mut core = Self {
            sid: None,
            rev: 0,
            vm: Vm::new(),
            mode: Mode::Router { router, screens, nav },
            screen_state: ScreenState::default(),
            subscriptions: SubscriptionSyncer::new(),
            subscription_hook,
            batcher: PatchBatcher::new(settings.max_pending_ops),
            settings,
            tick_armed: false,
        };
        core.mount_active(None).map_err(SessionBuildError::InitialMountFaulted)?;
        core.sync_subscriptions();
        core.vm = core.render_full().vm;
        Ok(core)
    }

    /// Build a session in single-screen mode.
    pub fn new_single_screen(
        screen: Arc<dyn Screen>,
        screen_session: ScreenSession,
        params: Params,
        settings: SessionSettings,
        subscription_hook: Box<dyn SubscriptionHook>,
    ) -> Result<Self, SessionBuildError> {
        let mut core = Self {
            sid: None,
            rev: 0,
            vm: Vm::new(),
            mode: Mode::SingleScreen { screen, screen_session, params },
            screen_state: ScreenState::default(),
            subscriptions: SubscriptionSyncer::new(),
            subscription_hook,
            batcher: PatchBatcher::new(settings.max_pending_ops),
            settings,
            tick_armed: false,
        };
        core.mount_active(None).map_err(SessionBuildError::InitialMountFaulted)?;
        core.sync_subscriptions();
        core.vm = core.render_full().vm;
        Ok(core)
    }

    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    /// Dispatch one decoded inbound envelope, returning the effects the
    /// caller must carry out.
    pub fn handle_inbound(&mut self, envelope: InboundEnvelope) -> Vec<Effect> {
        match envelope {
            InboundEnvelope::Ready { sid, .. } => self.on_ready(sid),
            InboundEnvelope::Intent { name, id, payload, .. } => {
                let ack = normalize_ack(id);
                let payload = normalize_payload(payload);
                self.on_intent(&name, ack, payload)
            }
        }
    }

    /// The flush timer fired; flush the batcher if anything is pending.
    pub fn on_flush_timer_fired(&mut self) -> Vec<Effect> {
        self.flush_now()
    }

    /// The tick timer fired; dispatch `Tick` to the active screen.
    pub fn on_tick_fired(&mut self) -> Vec<Effect> {
        self.tick_armed = false;
        let state = std::mem::take(&mut self.screen_state);
        let screen = self.active_screen();
        self.screen_state = dispatcher::handle_info(screen.as_ref(), &InfoMessage::Tick, state);

        let ops = self.update_pipeline(false);
        let mut effects = self.enqueue_patch(ops, None);
        if self.settings.tick_period_ms > 0 {
            self.tick_armed = true;
            effects.push(Effect::ScheduleTick(Duration::from_millis(self.settings.tick_period_ms)));
        }
        effects
    }

    /// Tear the session down: cancel timers, unsubscribe from everything,
    /// discard any pending patch.
    pub fn shutdown(&mut self) -> Vec<Effect> {
        self.batcher.clear();
        self.subscriptions.unsubscribe_all(self.subscription_hook.as_ref());
        vec![Effect::CancelFlush, Effect::CancelTick]
    }

    fn on_ready(&mut self, incoming_sid: String) -> Vec<Effect> {
        self.batcher.clear();
        let mut effects = vec![Effect::CancelFlush];

        if self.sid.is_none() {
            self.sid = Some(incoming_sid);
        }
        self.rev += 1;
        let sid = self.sid.clone().unwrap_or_default();
        effects.push(Effect::Send(OutboundEnvelope::Render {
            sid,
            rev: self.rev,
            vm: self.vm.clone(),
            ack: None,
        }));

        if self.settings.tick_period_ms > 0 && !self.tick_armed {
            self.tick_armed = true;
            effects.push(Effect::ScheduleTick(Duration::from_millis(self.settings.tick_period_ms)));
        }
        effects
    }

    fn on_intent(&mut self, name: &str, ack: Option<i64>, payload: Vm) -> Vec<Effect> {
        let screen_label = self.current_screen_label();
        telemetry::intent_received(
            self.sid.as_deref().unwrap_or(""),
            self.rev,
            &screen_label,
            name,
            ack,
        );

        if self.is_router_mode() {
            match name {
                "ui.route.navigate" => return self.route_navigate(payload, ack),
                "ui.route.patch" => return self.route_patch(payload, ack),
                "ui.back" => return self.route_back(ack),
                _ => {}
            }
        }

        let state = std::mem::take(&mut self.screen_state);
        let screen = self.active_screen();
        self.screen_state = dispatcher::handle_event(screen.as_ref(), name, &payload, state);
        let ops = self.update_pipeline(false);
        self.enqueue_patch(ops, ack)
    }

    fn route_navigate(&mut self, payload: Vm, ack: Option<i64>) -> Vec<Effect> {
        let Mode::Router { router, nav, .. } = &self.mode else { return vec![] };

        let to = payload
            .get("to")
            .and_then(as_str)
            .or_else(|| payload.get("arg").and_then(as_str))
            .map(str::to_owned);
        let Some(to) = to else { return vec![] };

        if router.screen_session_transition(nav, &to) {
            warn!(target = %to, "cross-boundary navigation blocked");
            return vec![];
        }

        let params = payload.get("params").and_then(Value::as_map).cloned().unwrap_or_default();

        let Mode::Router { router, nav, .. } = &mut self.mode else { return vec![] };
        if router.navigate(nav, &to, params).is_none() {
            return vec![];
        }

        if let Err(fault) = self.mount_active(None) {
            warn!(error = %fault, "re-mount during navigate faulted; navigation aborted");
            return vec![];
        }
        self.sync_subscriptions();
        let ops = self.update_pipeline(true);
        self.enqueue_patch(ops, ack)
    }

    fn route_patch(&mut self, payload: Vm, ack: Option<i64>) -> Vec<Effect> {
        let params = payload.get("params").and_then(Value::as_map).cloned().unwrap_or_default();

        let Mode::Router { router, nav, .. } = &mut self.mode else { return vec![] };
        router.patch(nav, params.clone());

        let state = std::mem::take(&mut self.screen_state);
        let screen = self.active_screen();
        match dispatcher::handle_params(screen.as_ref(), &params, state) {
            Some(next) => self.screen_state = next,
            // Hook absent — a full re-mount is the documented (if
            // surprising) behavior; see Open Question (b).
            None => {
                if let Err(fault) = self.mount_active(None) {
                    warn!(error = %fault, "re-mount on route patch faulted");
                    return vec![];
                }
            }
        }
        self.sync_subscriptions();
        let ops = self.update_pipeline(false);
        self.enqueue_patch(ops, ack)
    }

    fn route_back(&mut self, ack: Option<i64>) -> Vec<Effect> {
        let Mode::Router { router, nav, .. } = &mut self.mode else { return vec![] };
        if !router.back(nav) {
            return vec![];
        }
        if let Err(fault) = self.mount_active(None) {
            warn!(error = %fault, "re-mount on back faulted");
            return vec![];
        }
        self.sync_subscriptions();
        let ops = self.update_pipeline(true);
        self.enqueue_patch(ops, ack)
    }

    /// Mount the currently active route/screen, passing `prior` through
    /// (used only by tests exercising re-mount-preserving-state scenarios;
    /// production call sites always pass `None`, matching the source's
    /// "re-mount means fresh state" behavior for route transitions).
    fn mount_active(&mut self, prior: Option<&ScreenState>) -> Result<(), ScreenFault> {
        let screen = self.active_screen();
        let (params, screen_session) = self.active_params_and_session();
        self.screen_state = dispatcher::mount(screen.as_ref(), &params, &screen_session, prior)?;
        Ok(())
    }

    fn sync_subscriptions(&mut self) {
        let screen = self.active_screen();
        let (params, screen_session) = self.active_params_and_session();
        let topics = dispatcher::subscriptions(screen.as_ref(), &params, &screen_session);
        self.subscriptions.sync(&topics, self.subscription_hook.as_ref());
    }

    /// Snapshot+clear the screen's changed-field set, render, diff against
    /// the committed `vm`, and commit the new `vm`. Returns the ops to
    /// enqueue (possibly empty).
    fn update_pipeline(&mut self, screen_identity_changed: bool) -> Vec<PatchOp> {
        let changed_fields = self.screen_state.changed_fields();
        self.screen_state.clear_changed();

        let started = Instant::now();
        let result = self.render_full();
        let status = if result.faulted { RenderStatus::Error } else { RenderStatus::Ok };
        #[allow(clippy::cast_precision_loss)]
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        telemetry::render_complete(self.sid.as_deref().unwrap_or(""), self.rev, duration_ms, status);
        if result.faulted {
            telemetry::error(
                self.sid.as_deref().unwrap_or(""),
                "render_exception",
                &result.fault_message,
                &self.current_screen_label(),
            );
        }

        let ops = if result.faulted {
            diff(&self.vm, &result.vm)
        } else {
            let paths = self.scoped_paths(&changed_fields, screen_identity_changed);
            diff_at_paths(&self.vm, &result.vm, &paths)
        };
        self.vm = result.vm;
        ops
    }

    fn scoped_paths(&self, changed_fields: &[String], screen_identity_changed: bool) -> Vec<Vec<String>> {
        match &self.mode {
            Mode::Router { .. } => {
                let mut paths = vec![
                    vec!["app".to_owned()],
                    vec!["nav".to_owned()],
                    vec!["screen".to_owned(), "name".to_owned()],
                    vec!["screen".to_owned(), "action".to_owned()],
                ];
                if screen_identity_changed {
                    paths.push(vec!["screen".to_owned(), "vm".to_owned()]);
                } else {
                    for field in changed_fields {
                        paths.push(vec!["screen".to_owned(), "vm".to_owned(), field.clone()]);
                    }
                }
                paths
            }
            Mode::SingleScreen { .. } => changed_fields.iter().map(|f| vec![f.clone()]).collect(),
        }
    }

    fn render_full(&self) -> RenderOutput {
        let screen = self.active_screen();
        let outcome = dispatcher::render(screen.as_ref(), self.screen_state.assigns());
        match (&self.mode, outcome) {
            (Mode::Router { router, nav, .. }, dispatcher::RenderOutcome::Ok(screen_vm)) => {
                let def = self.current_route_def();
                RenderOutput {
                    vm: router_frame(
                        &self.settings.app_title,
                        router.to_vm(nav),
                        &def.name,
                        def.action.as_deref(),
                        screen_vm,
                    ),
                    faulted: false,
                    fault_message: String::new(),
                }
            }
            (Mode::Router { router, nav, .. }, dispatcher::RenderOutcome::Faulted { message }) => {
                let def = self.current_route_def();
                RenderOutput {
                    vm: router_error_frame(
                        &self.settings.app_title,
                        router.to_vm(nav),
                        &message,
                        &def.screen_module,
                    ),
                    faulted: true,
                    fault_message: message,
                }
            }
            (Mode::SingleScreen { .. }, dispatcher::RenderOutcome::Ok(screen_vm)) => {
                RenderOutput { vm: screen_vm, faulted: false, fault_message: String::new() }
            }
            (Mode::SingleScreen { .. }, dispatcher::RenderOutcome::Faulted { message }) => {
                let mut vm = Vm::new();
                vm.insert("title".to_owned(), Value::String("Rendering Error".to_owned()));
                vm.insert("message".to_owned(), Value::String(message.clone()));
                RenderOutput { vm, faulted: true, fault_message: message }
            }
        }
    }

    fn enqueue_patch(&mut self, ops: Vec<PatchOp>, ack: Option<i64>) -> Vec<Effect> {
        if ops.is_empty() || self.sid.is_none() {
            return vec![];
        }
        let immediate = self.settings.batch_window_ms == 0;
        match self.batcher.enqueue(ops, ack, immediate) {
            FlushDecision::CancelTimer => vec![Effect::CancelFlush],
            FlushDecision::ScheduleTimer => {
                vec![Effect::ScheduleFlush(Duration::from_millis(self.settings.batch_window_ms))]
            }
            FlushDecision::TimerAlreadyArmed => vec![],
            FlushDecision::FlushNow => self.flush_now(),
        }
    }

    fn flush_now(&mut self) -> Vec<Effect> {
        match self.batcher.flush() {
            None => vec![Effect::CancelFlush],
            Some(flushed) => {
                self.rev += 1;
                let sid = self.sid.clone().unwrap_or_default();
                telemetry::patch_sent(&sid, self.rev, flushed.ops.len(), flushed.ack);
                vec![
                    Effect::Send(OutboundEnvelope::Patch {
                        sid,
                        rev: self.rev,
                        ops: flushed.ops,
                        ack: flushed.ack,
                    }),
                    Effect::CancelFlush,
                ]
            }
        }
    }

    fn is_router_mode(&self) -> bool {
        matches!(self.mode, Mode::Router { .. })
    }

    fn active_screen(&self) -> Arc<dyn Screen> {
        match &self.mode {
            Mode::Router { screens, nav, .. } => {
                let def = self.current_route_def();
                match screens.get(&def.screen_module) {
                    Some(screen) => Arc::clone(screen),
                    // Invariant checked at construction: every route's
                    // screen_module is present in the registry.
                    None => unreachable!("route {:?} has unregistered screen module", nav.top().name),
                }
            }
            Mode::SingleScreen { screen, .. } => Arc::clone(screen),
        }
    }

    fn active_params_and_session(&self) -> (Params, ScreenSession) {
        match &self.mode {
            Mode::Router { nav, .. } => {
                let def = self.current_route_def();
                (nav.top().params.clone(), def.screen_session.clone())
            }
            Mode::SingleScreen { screen_session, params, .. } => {
                (params.clone(), screen_session.clone())
            }
        }
    }

    fn current_route_def(&self) -> &RouteDef {
        let Mode::Router { router, nav, .. } = &self.mode else {
            unreachable!("current_route_def called outside router mode")
        };
        match router.resolve(&nav.top().name) {
            Some(def) => def,
            // Invariant: nav entries only ever hold names the router
            // resolved when they were pushed.
            None => unreachable!("nav stack holds an unresolvable route name"),
        }
    }

    fn current_screen_label(&self) -> String {
        match &self.mode {
            Mode::Router { nav, .. } => nav.top().name.clone(),
            Mode::SingleScreen { screen_session, .. } => screen_session.clone(),
        }
    }
}

struct RenderOutput {
    vm: Vm,
    faulted: bool,
    fault_message: String,
}

fn router_frame(app_title: &str, nav_vm: Vm, screen_name: &str, action: Option<&str>, screen_vm: Vm) -> Vm {
    let mut app = Vm::new();
    app.insert("title".to_owned(), Value::String(app_title.to_owned()));

    let mut screen = Vm::new();
    screen.insert("name".to_owned(), Value::String(screen_name.to_owned()));
    if let Some(action) = action {
        screen.insert("action".to_owned(), Value::String(action.to_owned()));
    }
    screen.insert("vm".to_owned(), Value::Map(screen_vm));

    let mut out = Vm::new();
    out.insert("app".to_owned(), Value::Map(app));
    out.insert("nav".to_owned(), Value::Map(nav_vm));
    out.insert("screen".to_owned(), Value::Map(screen));
    out
}

fn router_error_frame(app_title: &str, nav_vm: Vm, message: &str, screen_module: &str) -> Vm {
    let mut app = Vm::new();
    app.insert("title".to_owned(), Value::String(app_title.to_owned()));

    let mut error_vm = Vm::new();
    error_vm.insert("title".to_owned(), Value::String("Rendering Error".to_owned()));
    error_vm.insert("message".to_owned(), Value::String(message.to_owned()));
    error_vm.insert("screen_module".to_owned(), Value::String(screen_module.to_owned()));

    let mut screen = Vm::new();
    screen.insert("name".to_owned(), Value::String("error".to_owned()));
    screen.insert("action".to_owned(), Value::String("render_error".to_owned()));
    screen.insert("vm".to_owned(), Value::Map(error_vm));

    let mut out = Vm::new();
    out.insert("app".to_owned(), Value::Map(app));
    out.insert("nav".to_owned(), Value::Map(nav_vm));
    out.insert("screen".to_owned(), Value::Map(screen));
    out
}

fn normalize_ack(id: Option<serde_json::Value>) -> Option<i64> {
    id.and_then(|v| v.as_i64())
}

fn normalize_payload(payload: Option<serde_json::Map<String, serde_json::Value>>) -> Vm {
    payload
        .and_then(|obj| serde_json::from_value(serde_json::Value::Object(obj)).ok())
        .unwrap_or_default()
}

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
