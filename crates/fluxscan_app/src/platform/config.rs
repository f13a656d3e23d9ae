//! Client configuration loaded from `<config_dir>/fluxscan/config.ron`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fluxscan_engine::{ChannelSettings, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5001";
const CONFIG_DIR: &str = "fluxscan";
const CONFIG_FILENAME: &str = "config.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid server url {url:?}: {message}")]
    ServerUrl { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    /// Where CSV exports land. Falls back to the user's download directory.
    pub download_dir: Option<PathBuf>,
    pub log_to_file: bool,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            download_dir: None,
            log_to_file: false,
            reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 5000,
        }
    }
}

impl AppConfig {
    pub fn server_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.server_url).map_err(|err| ConfigError::ServerUrl {
            url: self.server_url.clone(),
            message: err.to_string(),
        })
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn channel_settings(&self, base_url: Url) -> ChannelSettings {
        let mut settings = ChannelSettings::new(base_url);
        settings.reconnect_delay = Duration::from_millis(self.reconnect_delay_ms.max(1));
        settings.max_reconnect_delay =
            Duration::from_millis(self.max_reconnect_delay_ms.max(self.reconnect_delay_ms));
        settings
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

/// Loads the config. A missing file at the default location means defaults;
/// a missing file the user named explicitly is an error.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => return Ok(AppConfig::default()),
    };
    match fs::read_to_string(&path) {
        Ok(text) => parse(&path, &text),
        Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Read { path, source }),
    }
}

fn parse(path: &Path, text: &str) -> Result<AppConfig, ConfigError> {
    ron::from_str(text).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
