use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use crate::view_model::{AppViewModel, ScanRowView};
use crate::{ProgressTracker, SearchDebouncer, Severity, SymbolMatch, Theme, Toast, ToastId};

/// Delay between a scan finishing and the results view being reloaded.
pub const RESULTS_RELOAD_DELAY: Duration = Duration::from_millis(1000);

/// Shown when a partial-content request fails.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed. Please try again.";

/// Opaque server-assigned scan identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanId(String);

impl ScanId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScanId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ScanId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    Cancelled,
    Failed,
    Other(String),
}

impl ScanStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "completed" => ScanStatus::Completed,
            "cancelled" => ScanStatus::Cancelled,
            "failed" => ScanStatus::Failed,
            other => ScanStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ScanStatus::Completed => "completed",
            ScanStatus::Cancelled => "cancelled",
            ScanStatus::Failed => "failed",
            ScanStatus::Other(raw) => raw,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanStatus::Completed)
    }

    pub fn badge_class(&self) -> &'static str {
        if self.is_success() {
            "badge badge-success"
        } else {
            "badge badge-error"
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    theme: Theme,
    toasts: Vec<Toast>,
    next_toast_id: ToastId,
    progress: ProgressTracker,
    search: SearchDebouncer,
    search_results: Vec<SymbolMatch>,
    location: String,
    connected: bool,
    subscriptions: BTreeSet<ScanId>,
    finished: BTreeMap<ScanId, ScanStatus>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn search_results(&self) -> &[SymbolMatch] {
        &self.search_results
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_subscribed(&self, scan_id: &ScanId) -> bool {
        self.subscriptions.contains(scan_id)
    }

    pub fn scan_status(&self, scan_id: &ScanId) -> Option<&ScanStatus> {
        self.finished.get(scan_id)
    }

    pub fn is_scan_finished(&self, scan_id: &ScanId) -> bool {
        self.finished.contains_key(scan_id)
    }

    pub fn is_search_idle(&self) -> bool {
        self.search.is_idle()
    }

    /// Whether the current location is a results view.
    pub fn on_results_view(&self) -> bool {
        self.location.contains("results")
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            theme: self.theme,
            connected: self.connected,
            toasts: self.toasts.clone(),
            scans: self
                .progress
                .iter()
                .map(|(scan_id, entry)| ScanRowView {
                    scan_id: scan_id.clone(),
                    percent: Some(entry.percent),
                    symbol: Some(entry.symbol.clone()),
                    status: None,
                })
                .chain(self.finished.iter().map(|(scan_id, status)| ScanRowView {
                    scan_id: scan_id.clone(),
                    percent: None,
                    symbol: None,
                    status: Some(status.clone()),
                }))
                .collect(),
            search_results: self.search_results.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns the dirty flag and clears it.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.mark_dirty();
    }

    pub(crate) fn set_location(&mut self, path: String) {
        self.location = path;
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            self.connected = connected;
            self.mark_dirty();
        }
    }

    pub(crate) fn push_toast(&mut self, message: String, severity: Severity) -> Toast {
        self.next_toast_id += 1;
        let toast = Toast {
            id: self.next_toast_id,
            message,
            severity,
        };
        self.toasts.push(toast.clone());
        self.mark_dirty();
        toast
    }

    pub(crate) fn remove_toast(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        let removed = self.toasts.len() != before;
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn apply_progress(&mut self, scan_id: ScanId, percent: u8, symbol: &str) {
        self.progress.set(scan_id, percent, symbol);
        self.mark_dirty();
    }

    pub(crate) fn apply_complete(&mut self, scan_id: ScanId, status: ScanStatus) {
        self.progress.clear(&scan_id);
        self.finished.insert(scan_id, status);
        self.mark_dirty();
    }

    pub(crate) fn set_subscribed(&mut self, scan_id: ScanId, subscribed: bool) {
        if subscribed {
            self.subscriptions.insert(scan_id);
        } else {
            self.subscriptions.remove(&scan_id);
        }
    }

    pub(crate) fn search_mut(&mut self) -> &mut SearchDebouncer {
        &mut self.search
    }

    pub(crate) fn set_search_results(&mut self, matches: Vec<SymbolMatch>) {
        self.search_results = matches;
        self.mark_dirty();
    }
}
