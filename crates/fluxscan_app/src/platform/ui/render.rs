use std::collections::BTreeMap;
use std::io::Write;

use fluxscan_core::{
    progress_label, scanning_label, AppViewModel, ScanId, ScanStatus, SymbolMatch, Theme, Toast,
    ToastId, ViewRegistry,
};
use fluxscan_logging::{flux_debug, flux_trace};

use super::constants::*;

/// Line-oriented terminal rendering of the controller's view updates.
pub struct TerminalView<W: Write> {
    out: W,
    theme: Theme,
    initialized: bool,
    last_progress: BTreeMap<ScanId, (u8, String)>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            theme: Theme::default(),
            initialized: false,
            last_progress: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write> ViewRegistry for TerminalView<W> {
    fn show_toast(&mut self, toast: &Toast) {
        self.line(&format_toast(toast));
    }

    fn remove_toast(&mut self, id: ToastId) {
        flux_trace!("Toast {} dismissed", id);
    }

    fn update_progress(&mut self, scan_id: &ScanId, percent: u8, symbol: &str) {
        let current = (percent, symbol.to_string());
        if self.last_progress.get(scan_id) == Some(&current) {
            return;
        }
        self.last_progress.insert(scan_id.clone(), current);
        self.line(&format_progress(scan_id, percent, symbol));
    }

    fn update_status(&mut self, scan_id: &ScanId, status: &ScanStatus) {
        self.last_progress.remove(scan_id);
        self.line(&format_status(scan_id, status));
    }

    fn apply_theme(&mut self, theme: Theme) {
        flux_debug!("Theme set to {}", theme);
        self.theme = theme;
    }

    fn initialize_components(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        flux_debug!("Terminal view ready");
    }

    fn reload_results(&mut self) {
        self.line("Results updated on the server; run `fluxscan export` to fetch them.");
    }

    fn show_search_results(&mut self, matches: &[SymbolMatch]) {
        if matches.is_empty() {
            self.line("No matching symbols.");
            return;
        }
        for line in matches.iter().map(format_symbol) {
            self.line(&line);
        }
    }
}

pub fn format_toast(toast: &Toast) -> String {
    format!(
        "[{}] {}",
        toast.severity.as_str().to_ascii_uppercase(),
        toast.message
    )
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    let mut bar = String::with_capacity(BAR_WIDTH + 2);
    bar.push('[');
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(BAR_WIDTH - filled));
    bar.push(']');
    bar
}

pub fn format_progress(scan_id: &ScanId, percent: u8, symbol: &str) -> String {
    let mut text = format!(
        "scan {} {} {:>4}",
        scan_id,
        progress_bar(percent),
        progress_label(percent)
    );
    if !symbol.is_empty() {
        text.push_str("  ");
        text.push_str(&scanning_label(symbol));
    }
    text
}

pub fn format_status(scan_id: &ScanId, status: &ScanStatus) -> String {
    let marker = if status.is_success() { "ok" } else { "!!" };
    format!("scan {} [{}] {}", scan_id, marker, status.as_str())
}

fn format_symbol(entry: &SymbolMatch) -> String {
    let mut text = entry.symbol.clone();
    if let Some(name) = &entry.name {
        text.push_str("  ");
        text.push_str(name);
    }
    if let Some(exchange) = &entry.exchange {
        text.push_str(&format!(" ({exchange})"));
    }
    text
}

/// End-of-session overview of every scan seen.
pub fn summary(view: &AppViewModel) -> String {
    if view.scans.is_empty() {
        return "No scans observed.".to_string();
    }
    let mut lines = Vec::with_capacity(view.scans.len());
    for row in &view.scans {
        let line = match (&row.status, row.percent) {
            (Some(status), _) => format_status(&row.scan_id, status),
            (None, Some(percent)) => format_progress(
                &row.scan_id,
                percent,
                row.symbol.as_deref().unwrap_or_default(),
            ),
            (None, None) => format!("scan {} waiting", row.scan_id),
        };
        lines.push(line);
    }
    lines.join("\n")
}
