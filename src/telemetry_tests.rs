use super::*;

#[test]
fn emission_points_do_not_panic_without_a_subscriber() {
    intent_received("sess-1", 3, "clock", "tick.pause", Some(7));
    render_complete("sess-1", 4, 0.42, RenderStatus::Ok);
    render_complete("sess-1", 4, 0.11, RenderStatus::Error);
    patch_sent("sess-1", 4, 3, Some(7));
    error("sess-1", "render_exception", "boom", "clock");
}

#[test]
fn render_status_as_str_matches_spec_vocabulary() {
    assert_eq!(RenderStatus::Ok.as_str(), "ok");
    assert_eq!(RenderStatus::Error.as_str(), "error");
}
