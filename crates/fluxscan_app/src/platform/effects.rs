use std::path::PathBuf;
use std::time::Duration;

use fluxscan_core::{
    apply_view_update, ChannelEvent, Effect, Msg, ScanId, ScanStatus, Severity, SymbolMatch,
    ViewRegistry,
};
use fluxscan_engine::{
    FluxScan, NoticeLevel, Notifier, PushEvent, ScanSubscriber, ServerEvent,
};
use fluxscan_logging::{flux_debug, flux_info};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::persistence;

/// Executes the effects returned by `update`. Anything asynchronous reports
/// back by sending a `Msg` into the session's inbox.
pub struct EffectRunner {
    view: Box<dyn ViewRegistry>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    actions: FluxScan,
    state_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        view: Box<dyn ViewRegistry>,
        msg_tx: mpsc::UnboundedSender<Msg>,
        actions: FluxScan,
        state_dir: PathBuf,
    ) -> Self {
        Self {
            view,
            msg_tx,
            actions,
            state_dir,
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(update) => apply_view_update(self.view.as_mut(), &update),
                Effect::After { delay, msg } => {
                    schedule(self.msg_tx.clone(), delay, *msg);
                }
                Effect::PersistTheme(theme) => persistence::save_theme(&self.state_dir, theme),
                Effect::SearchSymbols { generation, query } => {
                    flux_debug!("Searching symbols for {:?} (generation {})", query, generation);
                    let actions = self.actions.clone();
                    let msg_tx = self.msg_tx.clone();
                    tokio::spawn(async move {
                        let matches = actions
                            .search_symbols(&query)
                            .await
                            .iter()
                            .filter_map(symbol_match_from_value)
                            .collect();
                        let _ = msg_tx.send(Msg::SearchResults {
                            generation,
                            matches,
                        });
                    });
                }
            }
        }
    }
}

/// Delivers `msg` after `delay`. Timers are never cancelled; the controller
/// ignores messages that no longer apply.
pub fn schedule(msg_tx: mpsc::UnboundedSender<Msg>, delay: Duration, msg: Msg) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = msg_tx.send(msg);
    })
}

/// Turns push-channel events into controller messages.
pub fn spawn_push_forwarder(
    mut events: mpsc::UnboundedReceiver<PushEvent>,
    msg_tx: mpsc::UnboundedSender<Msg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(msg) = map_push_event(event) {
                if msg_tx.send(msg).is_err() {
                    break;
                }
            }
        }
    })
}

pub fn map_push_event(event: PushEvent) -> Option<Msg> {
    let channel = match event {
        PushEvent::Connected => {
            flux_info!("Connected to FluxScan server");
            ChannelEvent::Connected
        }
        PushEvent::Disconnected => {
            flux_info!("Disconnected from FluxScan server");
            ChannelEvent::Disconnected
        }
        PushEvent::Server(ServerEvent::Connected { data }) => {
            flux_debug!("Server greeting: {}", data);
            return None;
        }
        PushEvent::Server(ServerEvent::ScanProgress(progress)) => {
            flux_debug!("Scan progress: {:?}", progress);
            ChannelEvent::ScanProgress {
                scan_id: ScanId::new(progress.scan_id),
                progress: progress.progress,
                symbol: progress.symbol,
            }
        }
        PushEvent::Server(ServerEvent::ScanComplete(complete)) => {
            flux_info!("Scan complete: {:?}", complete);
            ChannelEvent::ScanComplete {
                scan_id: ScanId::new(complete.scan_id),
                status: ScanStatus::parse(&complete.status),
                signals_found: complete.signals_found,
                total_scanned: complete.total_scanned,
            }
        }
        PushEvent::Server(ServerEvent::ScanSubscribed { scan_id }) => {
            ChannelEvent::ScanSubscribed {
                scan_id: ScanId::new(scan_id),
            }
        }
        PushEvent::Server(ServerEvent::ScanUnsubscribed { scan_id }) => {
            ChannelEvent::ScanUnsubscribed {
                scan_id: ScanId::new(scan_id),
            }
        }
    };
    Some(Msg::Channel(channel))
}

/// Reads one entry of a symbol-search response. Entries without a string
/// `symbol` are skipped.
pub fn symbol_match_from_value(value: &Value) -> Option<SymbolMatch> {
    let symbol = value.get("symbol")?.as_str()?;
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    Some(SymbolMatch {
        symbol: symbol.to_string(),
        name: text("name"),
        exchange: text("exchange"),
    })
}

fn severity_for(level: NoticeLevel) -> Severity {
    match level {
        NoticeLevel::Info => Severity::Info,
        NoticeLevel::Success => Severity::Success,
        NoticeLevel::Warning => Severity::Warning,
        NoticeLevel::Error => Severity::Error,
    }
}

/// Routes action outcomes into the controller as toasts.
pub struct MsgNotifier {
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl MsgNotifier {
    pub fn new(msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self { msg_tx }
    }
}

impl Notifier for MsgNotifier {
    fn notify(&self, level: NoticeLevel, message: String) {
        let _ = self.msg_tx.send(Msg::Notify {
            message,
            severity: severity_for(level),
        });
    }
}

/// Subscriber for commands that run without the push channel.
pub struct DetachedSubscriber;

impl ScanSubscriber for DetachedSubscriber {
    fn subscribe(&self, scan_id: &str) {
        flux_info!(
            "Push channel not open; scan {} will not report progress here",
            scan_id
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use fluxscan_core::{ScanId, Theme, Toast, ToastId, ViewUpdate};
    use fluxscan_engine::{ApiClient, ApiSettings, ScanComplete, ScanProgress, Url};
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingView {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingView {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ViewRegistry for RecordingView {
        fn show_toast(&mut self, toast: &Toast) {
            self.record(format!("toast {} {}", toast.severity, toast.message));
        }
        fn remove_toast(&mut self, id: ToastId) {
            self.record(format!("remove {id}"));
        }
        fn update_progress(&mut self, scan_id: &ScanId, percent: u8, symbol: &str) {
            self.record(format!("progress {scan_id} {percent} {symbol}"));
        }
        fn update_status(&mut self, scan_id: &ScanId, status: &ScanStatus) {
            self.record(format!("status {scan_id} {}", status.as_str()));
        }
        fn apply_theme(&mut self, theme: Theme) {
            self.record(format!("theme {theme}"));
        }
        fn initialize_components(&mut self) {
            self.record("init".to_string());
        }
        fn reload_results(&mut self) {
            self.record("reload".to_string());
        }
        fn show_search_results(&mut self, matches: &[SymbolMatch]) {
            self.record(format!("search {}", matches.len()));
        }
    }

    fn runner(
        view: RecordingView,
        state_dir: PathBuf,
    ) -> (EffectRunner, mpsc::UnboundedReceiver<Msg>) {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let base = Url::parse("http://127.0.0.1:5001").unwrap();
        let api = ApiClient::new(ApiSettings::new(base)).unwrap();
        let actions = FluxScan::new(
            api,
            state_dir.clone(),
            Arc::new(MsgNotifier::new(msg_tx.clone())),
            Arc::new(DetachedSubscriber),
        );
        (
            EffectRunner::new(Box::new(view), msg_tx, actions, state_dir),
            msg_rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_message_arrives_after_its_delay() {
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
        let start = tokio::time::Instant::now();
        schedule(msg_tx, Duration::from_millis(5000), Msg::ToastExpired(3));

        let msg = msg_rx.recv().await.expect("timer message");
        assert_eq!(msg, Msg::ToastExpired(3));
        assert!(start.elapsed() >= Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn runner_renders_persists_and_schedules() {
        let dir = tempfile::tempdir().unwrap();
        let view = RecordingView::default();
        let (mut runner, mut msg_rx) = runner(view.clone(), dir.path().to_path_buf());

        runner.run(vec![
            Effect::Render(ViewUpdate::ApplyTheme(Theme::Light)),
            Effect::PersistTheme(Theme::Light),
            Effect::After {
                delay: Duration::from_millis(1000),
                msg: Box::new(Msg::ReloadDue),
            },
        ]);

        assert_eq!(*view.calls.lock().unwrap(), vec!["theme light".to_string()]);
        assert_eq!(
            persistence::load_theme(dir.path()).as_deref(),
            Some("light")
        );
        assert_eq!(msg_rx.recv().await, Some(Msg::ReloadDue));
    }

    #[test]
    fn notifier_levels_become_toast_severities() {
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
        let notifier = MsgNotifier::new(msg_tx);
        notifier.notify(NoticeLevel::Warning, "Scanner code has 2 error(s)".to_string());
        assert_eq!(
            msg_rx.try_recv().unwrap(),
            Msg::Notify {
                message: "Scanner code has 2 error(s)".to_string(),
                severity: Severity::Warning,
            }
        );
    }

    #[test]
    fn push_events_map_to_channel_messages() {
        assert_eq!(
            map_push_event(PushEvent::Connected),
            Some(Msg::Channel(ChannelEvent::Connected))
        );
        assert_eq!(
            map_push_event(PushEvent::Server(ServerEvent::Connected {
                data: "hello".to_string()
            })),
            None
        );
        assert_eq!(
            map_push_event(PushEvent::Server(ServerEvent::ScanProgress(ScanProgress {
                scan_id: "42".to_string(),
                progress: 40,
                symbol: "TCS".to_string(),
            }))),
            Some(Msg::Channel(ChannelEvent::ScanProgress {
                scan_id: ScanId::new("42"),
                progress: 40,
                symbol: "TCS".to_string(),
            }))
        );
        assert_eq!(
            map_push_event(PushEvent::Server(ServerEvent::ScanComplete(ScanComplete {
                scan_id: "42".to_string(),
                status: "failed".to_string(),
                signals_found: 0,
                total_scanned: None,
            }))),
            Some(Msg::Channel(ChannelEvent::ScanComplete {
                scan_id: ScanId::new("42"),
                status: ScanStatus::Failed,
                signals_found: 0,
                total_scanned: None,
            }))
        );
    }

    #[test]
    fn search_entries_without_symbol_are_skipped() {
        let full = json!({"symbol": "INFY", "name": "Infosys Ltd", "exchange": "NSE"});
        let bare = json!({"symbol": "TCS"});
        let broken = json!({"name": "No ticker"});

        assert_eq!(
            symbol_match_from_value(&full),
            Some(SymbolMatch {
                symbol: "INFY".to_string(),
                name: Some("Infosys Ltd".to_string()),
                exchange: Some("NSE".to_string()),
            })
        );
        assert_eq!(symbol_match_from_value(&bare), Some(SymbolMatch::new("TCS")));
        assert_eq!(symbol_match_from_value(&broken), None);
    }
}
