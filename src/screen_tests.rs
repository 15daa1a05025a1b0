use super::*;
use crate::vm;

struct MinimalScreen;

impl Screen for MinimalScreen {
    fn schema(&self) -> Vm {
        vm! { "count" => 0_i64 }
    }
}

#[test]
fn default_mount_seeds_state_from_schema() {
    let screen = MinimalScreen;
    let params = Params::new();
    let state = screen.mount(&params, &"main".to_owned(), None).unwrap();
    assert_eq!(state.get("count"), Some(&crate::vm::Value::Int(0)));
}

#[test]
fn default_handle_event_is_a_no_op() {
    let screen = MinimalScreen;
    let state = ScreenState::new(vm! { "count" => 1_i64 });
    let next = screen.handle_event("anything", &Vm::new(), state.clone()).unwrap();
    assert_eq!(next.assigns(), state.assigns());
}

#[test]
fn default_handle_params_signals_hook_absent() {
    let screen = MinimalScreen;
    let state = ScreenState::new(Vm::new());
    assert!(screen.handle_params(&Params::new(), state).is_none());
}

#[test]
fn default_render_projects_assigns_onto_schema_keys() {
    let screen = MinimalScreen;
    let assigns = vm! { "count" => 5_i64, "not_in_schema" => "leaked" };
    assert_eq!(screen.render(&assigns).unwrap(), vm! { "count" => 5_i64 });
}

#[test]
fn default_subscriptions_is_empty() {
    let screen = MinimalScreen;
    assert!(screen.subscriptions(&Params::new(), &"main".to_owned()).is_empty());
}

struct FaultyRenderScreen;

impl Screen for FaultyRenderScreen {
    fn schema(&self) -> Vm {
        Vm::new()
    }

    fn render(&self, _assigns: &Vm) -> Result<Vm, ScreenFault> {
        Err(ScreenFault::new("boom"))
    }
}

#[test]
fn render_fault_is_reported_as_err() {
    let screen = FaultyRenderScreen;
    assert!(screen.render(&Vm::new()).is_err());
}
