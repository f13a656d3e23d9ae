use crate::{
    AppState, ChannelEvent, Effect, Msg, SearchStep, Severity, Theme, ViewUpdate,
    REQUEST_FAILED_MESSAGE, RESULTS_RELOAD_DELAY, SEARCH_DEBOUNCE, TOAST_LIFETIME,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageLoaded { path, saved_theme } => {
            let theme = Theme::from_saved(saved_theme.as_deref());
            state.set_theme(theme);
            state.set_location(path);
            vec![
                Effect::Render(ViewUpdate::ApplyTheme(theme)),
                Effect::Render(ViewUpdate::InitializeComponents),
            ]
        }
        Msg::Navigated { path } => {
            state.set_location(path);
            Vec::new()
        }
        Msg::ContentSwapped => vec![Effect::Render(ViewUpdate::InitializeComponents)],
        Msg::ContentRequestFailed => {
            notify(&mut state, REQUEST_FAILED_MESSAGE.to_string(), Severity::Error)
        }
        Msg::ThemeToggleClicked => {
            let theme = state.theme().toggled();
            state.set_theme(theme);
            vec![
                Effect::Render(ViewUpdate::ApplyTheme(theme)),
                Effect::PersistTheme(theme),
            ]
        }
        Msg::Notify { message, severity } => notify(&mut state, message, severity),
        Msg::ToastExpired(id) | Msg::DismissToast(id) => {
            if state.remove_toast(id) {
                vec![Effect::Render(ViewUpdate::RemoveToast(id))]
            } else {
                Vec::new()
            }
        }
        Msg::Channel(event) => apply_channel_event(&mut state, event),
        Msg::SearchInput(query) => match state.search_mut().input(&query) {
            SearchStep::Empty => {
                state.set_search_results(Vec::new());
                vec![Effect::Render(ViewUpdate::SearchResults(Vec::new()))]
            }
            SearchStep::Wait { generation } => vec![Effect::after(
                SEARCH_DEBOUNCE,
                Msg::SearchDebounceElapsed { generation },
            )],
        },
        Msg::SearchDebounceElapsed { generation } => match state.search_mut().elapsed(generation) {
            Some(query) => vec![Effect::SearchSymbols { generation, query }],
            None => Vec::new(),
        },
        Msg::SearchResults {
            generation,
            matches,
        } => {
            if state.search_mut().accept(generation) {
                state.set_search_results(matches.clone());
                vec![Effect::Render(ViewUpdate::SearchResults(matches))]
            } else {
                Vec::new()
            }
        }
        Msg::ReloadDue => vec![Effect::Render(ViewUpdate::ReloadResults)],
        Msg::Reset => {
            state = AppState::new();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn notify(state: &mut AppState, message: String, severity: Severity) -> Vec<Effect> {
    let toast = state.push_toast(message, severity);
    let id = toast.id;
    vec![
        Effect::Render(ViewUpdate::ShowToast(toast)),
        Effect::after(TOAST_LIFETIME, Msg::ToastExpired(id)),
    ]
}

fn apply_channel_event(state: &mut AppState, event: ChannelEvent) -> Vec<Effect> {
    match event {
        ChannelEvent::Connected => {
            state.set_connected(true);
            Vec::new()
        }
        ChannelEvent::Disconnected => {
            state.set_connected(false);
            Vec::new()
        }
        ChannelEvent::ScanProgress {
            scan_id,
            progress,
            symbol,
        } => {
            let percent = progress.min(100);
            state.apply_progress(scan_id.clone(), percent, &symbol);
            vec![Effect::Render(ViewUpdate::ScanProgress {
                scan_id,
                percent,
                symbol,
            })]
        }
        ChannelEvent::ScanComplete {
            scan_id,
            status,
            signals_found,
            total_scanned: _,
        } => {
            let mut effects = notify(
                state,
                format!("Scan completed! Found {signals_found} signals"),
                Severity::Success,
            );
            effects.push(Effect::Render(ViewUpdate::ScanStatus {
                scan_id: scan_id.clone(),
                status: status.clone(),
            }));
            state.apply_complete(scan_id, status);
            if state.on_results_view() {
                effects.push(Effect::after(RESULTS_RELOAD_DELAY, Msg::ReloadDue));
            }
            effects
        }
        ChannelEvent::ScanSubscribed { scan_id } => {
            state.set_subscribed(scan_id, true);
            Vec::new()
        }
        ChannelEvent::ScanUnsubscribed { scan_id } => {
            state.set_subscribed(scan_id, false);
            Vec::new()
        }
    }
}
