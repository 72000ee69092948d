use outreach_core::{update, AppState, Msg, Stage};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn tick_keeps_initial_stage() {
    let (next, effects) = update(AppState::new(), Msg::Tick);

    assert_eq!(next.stage(), Stage::SearchEdit);
    assert!(effects.is_empty());
}
