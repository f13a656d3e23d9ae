use fluxscan_core::{
    update, AppState, ChannelEvent, Effect, Msg, ScanId, Severity, Theme, ViewUpdate,
    REQUEST_FAILED_MESSAGE,
};
use pretty_assertions::assert_eq;

fn page_loaded(saved_theme: Option<&str>) -> (AppState, Vec<Effect>) {
    update(
        AppState::new(),
        Msg::PageLoaded {
            path: "/".to_string(),
            saved_theme: saved_theme.map(str::to_string),
        },
    )
}

#[test]
fn page_load_defaults_to_dark_theme() {
    let (state, effects) = page_loaded(None);

    assert_eq!(state.theme(), Theme::Dark);
    assert_eq!(
        effects,
        vec![
            Effect::Render(ViewUpdate::ApplyTheme(Theme::Dark)),
            Effect::Render(ViewUpdate::InitializeComponents),
        ]
    );
}

#[test]
fn page_load_restores_saved_theme() {
    let (state, _) = page_loaded(Some("light"));
    assert_eq!(state.theme(), Theme::Light);

    let (state, _) = page_loaded(Some("solarized"));
    assert_eq!(state.theme(), Theme::Dark);
}

#[test]
fn toggle_flips_and_persists() {
    let (state, _) = page_loaded(None);
    let (state, effects) = update(state, Msg::ThemeToggleClicked);

    assert_eq!(state.theme(), Theme::Light);
    assert_eq!(
        effects,
        vec![
            Effect::Render(ViewUpdate::ApplyTheme(Theme::Light)),
            Effect::PersistTheme(Theme::Light),
        ]
    );

    let (state, _) = update(state, Msg::ThemeToggleClicked);
    assert_eq!(state.theme(), Theme::Dark);
}

#[test]
fn content_swap_reinitializes_every_time() {
    let (state, _) = page_loaded(None);
    let (state, first) = update(state, Msg::ContentSwapped);
    let (_, second) = update(state, Msg::ContentSwapped);

    assert_eq!(first, vec![Effect::Render(ViewUpdate::InitializeComponents)]);
    assert_eq!(first, second);
}

#[test]
fn failed_content_request_raises_error_toast() {
    let (state, _) = page_loaded(None);
    let (state, effects) = update(state, Msg::ContentRequestFailed);

    let toast = &state.toasts()[0];
    assert_eq!(toast.message, REQUEST_FAILED_MESSAGE);
    assert_eq!(toast.severity, Severity::Error);
    assert_eq!(effects.len(), 2);
}

#[test]
fn reset_discards_all_state() {
    let (state, _) = page_loaded(Some("light"));
    let (state, _) = update(
        state,
        Msg::Channel(ChannelEvent::ScanProgress {
            scan_id: ScanId::from("S1"),
            progress: 12,
            symbol: "TCS".to_string(),
        }),
    );
    let (state, effects) = update(state, Msg::Reset);

    assert!(effects.is_empty());
    assert_eq!(state, AppState::new());
}
