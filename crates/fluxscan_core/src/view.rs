use crate::{ScanId, ScanStatus, SymbolMatch, Theme, Toast, ToastId, ViewUpdate};

/// Rendering capability supplied by whatever draws the UI.
///
/// The controller never looks widgets up itself; it asks the registry to
/// update "the progress view for scan X" and the registry decides whether
/// such a widget exists.
pub trait ViewRegistry {
    fn show_toast(&mut self, toast: &Toast);
    fn remove_toast(&mut self, id: ToastId);
    fn update_progress(&mut self, scan_id: &ScanId, percent: u8, symbol: &str);
    fn update_status(&mut self, scan_id: &ScanId, status: &ScanStatus);
    fn apply_theme(&mut self, theme: Theme);
    /// Must be safe to call repeatedly.
    fn initialize_components(&mut self);
    fn reload_results(&mut self);
    fn show_search_results(&mut self, matches: &[SymbolMatch]);
}

pub fn apply_view_update(view: &mut dyn ViewRegistry, update: &ViewUpdate) {
    match update {
        ViewUpdate::ShowToast(toast) => view.show_toast(toast),
        ViewUpdate::RemoveToast(id) => view.remove_toast(*id),
        ViewUpdate::ScanProgress {
            scan_id,
            percent,
            symbol,
        } => view.update_progress(scan_id, *percent, symbol),
        ViewUpdate::ScanStatus { scan_id, status } => view.update_status(scan_id, status),
        ViewUpdate::ApplyTheme(theme) => view.apply_theme(*theme),
        ViewUpdate::InitializeComponents => view.initialize_components(),
        ViewUpdate::ReloadResults => view.reload_results(),
        ViewUpdate::SearchResults(matches) => view.show_search_results(matches),
    }
}

/// Text for a progress bar, e.g. `42%`.
pub fn progress_label(percent: u8) -> String {
    format!("{percent}%")
}

/// Text for the symbol line under a progress bar.
pub fn scanning_label(symbol: &str) -> String {
    format!("Scanning: {symbol}")
}
