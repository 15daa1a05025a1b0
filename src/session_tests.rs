use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::route::RouteDef;
use crate::screen::{HookResult, Params, Screen, ScreenSession};
use crate::screen_state::ScreenState;
use crate::vm;

fn hook(_: crate::subscription::SubscriptionAction, _: &str) -> Result<(), String> {
    Ok(())
}

fn ready(sid: &str) -> InboundEnvelope {
    InboundEnvelope::Ready { sid: sid.to_owned(), capabilities: None }
}

fn intent(name: &str, id: i64, payload: serde_json::Value) -> InboundEnvelope {
    InboundEnvelope::Intent {
        sid: "ignored".to_owned(),
        name: name.to_owned(),
        id: Some(json!(id)),
        payload: payload.as_object().cloned(),
    }
}

fn only_send(effects: Vec<Effect>) -> OutboundEnvelope {
    let mut sends: Vec<OutboundEnvelope> =
        effects.into_iter().filter_map(|e| match e { Effect::Send(env) => Some(env), _ => None }).collect();
    assert_eq!(sends.len(), 1, "expected exactly one Send effect");
    sends.remove(0)
}

// --- Scenario screens ---

struct ClockScreen;

impl Screen for ClockScreen {
    fn schema(&self) -> Vm {
        vm! { "clock_label" => "Label 0" }
    }

    fn handle_event(&self, name: &str, payload: &Vm, mut state: ScreenState) -> HookResult {
        if name == "set_label" {
            if let Some(label) = payload.get("label").and_then(as_str) {
                state.assign("clock_label", Value::String(label.to_owned()));
            }
        }
        Ok(state)
    }
}

struct TableScreen;

fn table_schema() -> Vm {
    let mut by_id = Vm::new();
    for i in 1..=500 {
        let mut entry = Vm::new();
        entry.insert("status".to_owned(), Value::String("Online".to_owned()));
        by_id.insert(format!("dev-{i}"), Value::Map(entry));
    }
    let order: Vec<Value> = (1..=500).map(|i| Value::String(format!("dev-{i}"))).collect();
    let mut devices = Vm::new();
    devices.insert("order".to_owned(), Value::List(order));
    devices.insert("by_id".to_owned(), Value::Map(by_id));
    vm! { "devices" => devices }
}

impl Screen for TableScreen {
    fn schema(&self) -> Vm {
        table_schema()
    }

    fn handle_event(&self, name: &str, payload: &Vm, mut state: ScreenState) -> HookResult {
        if name == "set_status" {
            let id = payload.get("id").and_then(as_str).unwrap_or_default().to_owned();
            let status = payload.get("status").and_then(as_str).unwrap_or_default().to_owned();
            state.update("devices", move |old| {
                let mut devices = old.and_then(Value::as_map).cloned().unwrap_or_default();
                if let Some(Value::Map(by_id)) = devices.get_mut("by_id") {
                    if let Some(Value::Map(entry)) = by_id.get_mut(&id) {
                        entry.insert("status".to_owned(), Value::String(status.clone()));
                    }
                }
                Value::Map(devices)
            });
        }
        Ok(state)
    }
}

struct FaultyRenderScreen;

impl Screen for FaultyRenderScreen {
    fn schema(&self) -> Vm {
        vm! {}
    }

    fn render(&self, _assigns: &Vm) -> Result<Vm, ScreenFault> {
        Err(ScreenFault::new("boom"))
    }
}

struct HealthyScreen;

impl Screen for HealthyScreen {
    fn schema(&self) -> Vm {
        vm! { "ok" => true }
    }
}

fn single_screen_core(screen: Arc<dyn Screen>, settings: SessionSettings) -> SessionCore {
    SessionCore::new_single_screen(
        screen,
        ScreenSession::from("main"),
        Params::new(),
        settings,
        Box::new(hook),
    )
    .unwrap()
}

fn two_boundary_router_core(default_first: bool) -> SessionCore {
    let routes = if default_first {
        vec![
            RouteDef {
                name: "faulty".to_owned(),
                path: "/faulty".to_owned(),
                key: "faulty".to_owned(),
                screen_module: "faulty".to_owned(),
                action: None,
                screen_session: "main".to_owned(),
            },
            RouteDef {
                name: "healthy".to_owned(),
                path: "/healthy".to_owned(),
                key: "healthy".to_owned(),
                screen_module: "healthy".to_owned(),
                action: None,
                screen_session: "main".to_owned(),
            },
        ]
    } else {
        vec![
            RouteDef {
                name: "clock".to_owned(),
                path: "/clock".to_owned(),
                key: "clock".to_owned(),
                screen_module: "clock".to_owned(),
                action: None,
                screen_session: "main".to_owned(),
            },
            RouteDef {
                name: "admin".to_owned(),
                path: "/admin".to_owned(),
                key: "admin".to_owned(),
                screen_module: "admin".to_owned(),
                action: None,
                screen_session: "admin".to_owned(),
            },
        ]
    };
    let router = Arc::new(Router::new(routes).unwrap());
    let mut screens: ScreenRegistry = HashMap::new();
    if default_first {
        screens.insert("faulty".to_owned(), Arc::new(FaultyRenderScreen) as Arc<dyn Screen>);
        screens.insert("healthy".to_owned(), Arc::new(HealthyScreen) as Arc<dyn Screen>);
    } else {
        screens.insert("clock".to_owned(), Arc::new(ClockScreen) as Arc<dyn Screen>);
        screens.insert("admin".to_owned(), Arc::new(ClockScreen) as Arc<dyn Screen>);
    }
    SessionCore::new_router(router, Arc::new(screens), SessionSettings::default(), Box::new(hook)).unwrap()
}

#[test]
fn scenario_1_stable_sid_and_monotonic_rev() {
    let mut core = single_screen_core(Arc::new(ClockScreen), SessionSettings::default());

    let envelope = only_send(core.handle_inbound(ready("S1")));
    assert!(matches!(envelope, OutboundEnvelope::Render { ref sid, rev: 1, .. } if sid == "S1"));

    let envelope = only_send(core.handle_inbound(ready("S2")));
    assert!(matches!(envelope, OutboundEnvelope::Render { ref sid, rev: 2, .. } if sid == "S1"));
}

#[test]
fn scenario_2_scoped_single_field_patch_on_large_table() {
    let mut core = single_screen_core(Arc::new(TableScreen), SessionSettings::default());
    core.handle_inbound(ready("S1"));

    let effects = core.handle_inbound(intent(
        "set_status",
        77,
        json!({ "id": "dev-250", "status": "Offline (2m)" }),
    ));
    assert!(effects.iter().all(|e| !matches!(e, Effect::Send(_))), "window timer hasn't fired yet");

    let envelope = only_send(core.on_flush_timer_fired());
    match envelope {
        OutboundEnvelope::Patch { rev, ack, ops, .. } => {
            assert_eq!(rev, 2);
            assert_eq!(ack, Some(77));
            assert_eq!(ops, vec![PatchOp::Replace {
                path: "/devices/by_id/dev-250/status".to_owned(),
                value: Value::String("Offline (2m)".to_owned()),
            }]);
        }
        other => panic!("expected a patch envelope, got {other:?}"),
    }
}

#[test]
fn scenario_3_coalescing_burst() {
    let settings = SessionConfig::new().batch_window_ms(120).max_pending_ops(64).build();
    let mut core = single_screen_core(Arc::new(ClockScreen), settings);
    core.handle_inbound(ready("S1"));

    for i in 1..=20 {
        let effects = core.handle_inbound(intent("set_label", i, json!({ "label": format!("Label {i}") })));
        assert!(effects.iter().all(|e| !matches!(e, Effect::Send(_))), "no intermediate flush expected");
    }

    let effects = core.on_flush_timer_fired();
    let envelope = only_send(effects);
    match envelope {
        OutboundEnvelope::Patch { rev, ack, ops, .. } => {
            assert_eq!(rev, 2);
            assert_eq!(ack, Some(20));
            assert_eq!(ops, vec![PatchOp::Replace {
                path: "/clock_label".to_owned(),
                value: Value::String("Label 20".to_owned()),
            }]);
        }
        other => panic!("expected a patch envelope, got {other:?}"),
    }
}

#[test]
fn scenario_4_cross_boundary_navigation_blocked() {
    let mut core = two_boundary_router_core(false);
    let before = core.vm().clone();

    let effects = core.handle_inbound(intent("ui.route.navigate", 1, json!({ "to": "admin" })));
    assert!(effects.is_empty());
    assert_eq!(core.vm(), &before);
}

#[test]
fn scenario_5_render_fault_switches_to_error_vm_and_session_survives() {
    let mut core = two_boundary_router_core(true);

    let screen = core.vm().get("screen").and_then(Value::as_map).unwrap();
    assert_eq!(screen.get("name"), Some(&Value::String("error".to_owned())));
    assert_eq!(screen.get("action"), Some(&Value::String("render_error".to_owned())));

    core.handle_inbound(intent("ui.route.navigate", 1, json!({ "to": "healthy" })));
    let screen = core.vm().get("screen").and_then(Value::as_map).unwrap();
    assert_eq!(screen.get("name"), Some(&Value::String("healthy".to_owned())));
}

#[test]
fn configured_app_title_reaches_the_router_frame() {
    let routes = vec![RouteDef {
        name: "clock".to_owned(),
        path: "/clock".to_owned(),
        key: "clock".to_owned(),
        screen_module: "clock".to_owned(),
        action: None,
        screen_session: "main".to_owned(),
    }];
    let router = Arc::new(Router::new(routes).unwrap());
    let mut screens: ScreenRegistry = HashMap::new();
    screens.insert("clock".to_owned(), Arc::new(ClockScreen) as Arc<dyn Screen>);
    let settings = SessionConfig::new().app_title("Control Room").build();
    let core =
        SessionCore::new_router(router, Arc::new(screens), settings, Box::new(hook)).unwrap();

    let app = core.vm().get("app").and_then(Value::as_map).unwrap();
    assert_eq!(app.get("title"), Some(&Value::String("Control Room".to_owned())));
}

#[test]
fn scenario_6_ready_clears_pending_batch() {
    let settings = SessionConfig::new().batch_window_ms(500).build();
    let mut core = single_screen_core(Arc::new(ClockScreen), settings);
    core.handle_inbound(ready("S1"));

    let effects = core.handle_inbound(intent("set_label", 1, json!({ "label": "Label 1" })));
    assert!(effects.iter().all(|e| !matches!(e, Effect::Send(_))));

    let effects = core.handle_inbound(ready("S2"));
    let sends: Vec<&OutboundEnvelope> =
        effects.iter().filter_map(|e| match e { Effect::Send(env) => Some(env), _ => None }).collect();
    assert_eq!(sends.len(), 1);
    assert!(matches!(sends[0], OutboundEnvelope::Render { rev: 2, .. }));
}
