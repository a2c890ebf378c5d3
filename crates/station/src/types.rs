//! Connection state and the errors an intent can end with.

use serde::Serialize;

use crate::router::Rejection;
use crate::transport::TransportError;

/// Lifecycle of the coordinator's link to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Why an intent produced no wire command (or failed to send one).
///
/// Public intent methods never return these; they log them.  The
/// `try_*` entry points on [`Station`](crate::Station) surface them for
/// callers that need to know.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("no connected session")]
    NotConnected,
    #[error("unknown device {0}")]
    UnknownDevice(String),
    #[error("invalid guard mode {0}")]
    InvalidGuardMode(i64),
    #[error("channel {0} is already streaming")]
    AlreadyStreaming(u8),
    #[error("channel {0} is not streaming")]
    NotStreaming(u8),
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

/// Top-level error for building a [`Station`](crate::Station).
#[derive(thiserror::Error, Debug)]
pub enum StationError {
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Domain(#[from] sl_domain::error::Error),
}
