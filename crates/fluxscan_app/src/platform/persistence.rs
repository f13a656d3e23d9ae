use std::fs;
use std::path::{Path, PathBuf};

use fluxscan_core::Theme;
use fluxscan_engine::{ensure_output_dir, AtomicFileWriter};
use fluxscan_logging::{flux_error, flux_info, flux_warn};
use serde::{Deserialize, Serialize};

const STATE_DIR: &str = "fluxscan";
const STATE_FILENAME: &str = "state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    theme: Option<String>,
}

pub(crate) fn state_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(STATE_DIR))
        .unwrap_or_else(|| PathBuf::from(".fluxscan"))
}

/// The saved theme name, if any. Read failures are logged and treated as
/// "nothing saved".
pub(crate) fn load_theme(state_dir: &Path) -> Option<String> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            flux_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => state.theme,
        Err(err) => {
            flux_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_theme(state_dir: &Path, theme: Theme) {
    if let Err(err) = ensure_output_dir(state_dir) {
        flux_error!("Failed to ensure state dir {:?}: {}", state_dir, err);
        return;
    }

    let state = PersistedState {
        theme: Some(theme.as_str().to_string()),
    };
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(content) => content,
        Err(err) => {
            flux_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(state_dir.to_path_buf());
    match writer.write(STATE_FILENAME, &content) {
        Ok(path) => flux_info!("Saved theme preference to {:?}", path),
        Err(err) => flux_error!("Failed to write persisted state: {}", err),
    }
}
