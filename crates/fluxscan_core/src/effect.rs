use std::time::Duration;

use crate::{Msg, ScanId, ScanStatus, SymbolMatch, Theme, Toast, ToastId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Mutate the rendered view.
    Render(ViewUpdate),
    /// Deliver `msg` back to the controller once `delay` has passed.
    After { delay: Duration, msg: Box<Msg> },
    PersistTheme(Theme),
    SearchSymbols { generation: u64, query: String },
}

impl Effect {
    pub(crate) fn after(delay: Duration, msg: Msg) -> Self {
        Effect::After {
            delay,
            msg: Box::new(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    ShowToast(Toast),
    RemoveToast(ToastId),
    ScanProgress {
        scan_id: ScanId,
        percent: u8,
        symbol: String,
    },
    ScanStatus {
        scan_id: ScanId,
        status: ScanStatus,
    },
    ApplyTheme(Theme),
    InitializeComponents,
    ReloadResults,
    SearchResults(Vec<SymbolMatch>),
}
