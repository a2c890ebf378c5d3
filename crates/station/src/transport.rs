//! The seam between the coordinator and the encrypted peer-to-peer link.
//!
//! Framing, encryption, hole punching and media demuxing live behind
//! [`TransportSession`].  The coordinator only hands it fully routed
//! [`WireCommand`]s and consumes the [`TransportEvent`]s it reports.

use std::sync::Arc;

use async_trait::async_trait;
use sl_protocol::{TransportEvent, WireCommand};
use tokio::sync::mpsc;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,
    #[error("handshake: {0}")]
    Handshake(String),
    #[error("io: {0}")]
    Io(String),
    #[error("session closed")]
    Closed,
}

impl From<TransportError> for sl_domain::error::Error {
    fn from(e: TransportError) -> Self {
        sl_domain::error::Error::Transport(e.to_string())
    }
}

/// Client key pair material exposed by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Raw RSA modulus; hex-encoded into live-stream and download commands.
    pub modulus: Vec<u8>,
    /// PEM-encoded private key used to decrypt downloaded files.
    pub pem: String,
}

/// Everything a factory needs to open a session to one hub.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionParams {
    pub station_serial: String,
    pub p2p_did: String,
    /// Session key from the credential cache.  May be empty or stale.
    pub dsk_key: String,
    pub local_address: Option<String>,
}

/// Where a session reports its events.  Dropping the receiving side
/// detaches every listener at once.
pub type EventSink = mpsc::UnboundedSender<TransportEvent>;

/// One live (or connecting) link to a hub.
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Run the handshake.  Resolves once it completed or failed; the
    /// session also reports [`TransportEvent::Connected`] on success.
    async fn connect(&self) -> Result<(), TransportError>;

    async fn close(&self);

    fn is_connected(&self) -> bool;

    async fn send(&self, command: WireCommand) -> Result<(), TransportError>;

    fn public_key(&self) -> KeyMaterial;

    /// Install the private key used to decrypt the next download.
    fn set_download_key(&self, pem: &str);

    fn is_live_streaming(&self, channel: u8) -> bool;
}

/// Creates sessions.  Called once per connect attempt.
pub trait TransportFactory: Send + Sync {
    fn create(&self, params: SessionParams, events: EventSink) -> Arc<dyn TransportSession>;
}
