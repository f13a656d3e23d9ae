use crate::{ScanId, ScanStatus, SymbolMatch, Theme, Toast};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub theme: Theme,
    pub connected: bool,
    pub toasts: Vec<Toast>,
    pub scans: Vec<ScanRowView>,
    pub search_results: Vec<SymbolMatch>,
    pub dirty: bool,
}

/// One scan as shown in a list: either running (percent and symbol) or
/// finished (status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRowView {
    pub scan_id: ScanId,
    pub percent: Option<u8>,
    pub symbol: Option<String>,
    pub status: Option<ScanStatus>,
}
