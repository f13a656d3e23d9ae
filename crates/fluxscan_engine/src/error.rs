use thiserror::Error;

use crate::persist::PersistError;

/// Failures surfaced by the request helper, the domain actions and the push
/// channel. Server-reported errors display as the bare server message so they
/// can be embedded directly in a notification.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("push channel error: {0}")]
    Channel(String),
    #[error("{0}")]
    Persist(#[from] PersistError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
