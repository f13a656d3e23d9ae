//! FluxScan engine: server communication, push channel and downloads.
mod actions;
mod api;
mod channel;
mod error;
mod events;
mod notify;
mod persist;
mod socketio;

pub use actions::{
    export_filename, ExportFormat, ExportOutcome, FluxScan, ScanStarted, ValidationReport,
    DEFAULT_EXCHANGE, MIN_SEARCH_CHARS,
};
pub use api::{ApiClient, ApiSettings, RequestOptions, FALLBACK_ERROR_MESSAGE};
pub use channel::{socket_url, ChannelHandle, ChannelSettings};
pub use error::ClientError;
pub use events::{ClientEvent, PushEvent, ScanComplete, ScanProgress, ServerEvent};
pub use notify::{NoticeLevel, Notifier, ScanSubscriber};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use socketio::{decode_frame, encode_event, Frame, OpenInfo, SocketPacket};

pub use reqwest::Url;
