use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// Where user-facing outcome messages go.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: String);
}

/// Registers interest in a scan's push events.
pub trait ScanSubscriber: Send + Sync {
    fn subscribe(&self, scan_id: &str);
}
