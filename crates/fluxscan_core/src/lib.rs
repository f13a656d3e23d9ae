//! FluxScan core: pure UI controller state machine and view-model helpers.
mod effect;
mod msg;
mod progress;
mod search;
mod state;
mod theme;
mod toast;
mod update;
mod view;
mod view_model;

pub use effect::{Effect, ViewUpdate};
pub use msg::{ChannelEvent, Msg};
pub use progress::{ProgressEntry, ProgressTracker};
pub use search::{SearchDebouncer, SearchStep, SymbolMatch, MIN_QUERY_CHARS, SEARCH_DEBOUNCE};
pub use state::{AppState, ScanId, ScanStatus, REQUEST_FAILED_MESSAGE, RESULTS_RELOAD_DELAY};
pub use theme::Theme;
pub use toast::{Severity, Toast, ToastId, TOAST_LIFETIME};
pub use update::update;
pub use view::{apply_view_update, progress_label, scanning_label, ViewRegistry};
pub use view_model::{AppViewModel, ScanRowView};
