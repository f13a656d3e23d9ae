use crate::{ScanId, ScanStatus, Severity, SymbolMatch, ToastId};

/// Events arriving over the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    ScanProgress {
        scan_id: ScanId,
        progress: u8,
        symbol: String,
    },
    ScanComplete {
        scan_id: ScanId,
        status: ScanStatus,
        signals_found: u64,
        total_scanned: Option<u64>,
    },
    /// Server acknowledged a subscription.
    ScanSubscribed { scan_id: ScanId },
    /// Server acknowledged an unsubscription.
    ScanUnsubscribed { scan_id: ScanId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Initial load of a view, with whatever theme was persisted.
    PageLoaded {
        path: String,
        saved_theme: Option<String>,
    },
    /// The current view changed without a full load.
    Navigated { path: String },
    /// A partial-content swap finished; components need re-initializing.
    ContentSwapped,
    /// A partial-content request failed.
    ContentRequestFailed,
    ThemeToggleClicked,
    /// Show a toast.
    Notify { message: String, severity: Severity },
    /// Auto-dismiss timer for a toast fired.
    ToastExpired(ToastId),
    /// User closed a toast before it expired.
    DismissToast(ToastId),
    Channel(ChannelEvent),
    /// Symbol search field changed.
    SearchInput(String),
    SearchDebounceElapsed { generation: u64 },
    SearchResults {
        generation: u64,
        matches: Vec<SymbolMatch>,
    },
    /// Delayed results-view reload is due.
    ReloadDue,
    /// Drop all state and start over.
    Reset,
    Tick,
    NoOp,
}
