//! Events reported by a transport session.

use serde::{Deserialize, Serialize};
use sl_domain::ParamType;
use tokio::sync::broadcast;

/// Everything a transport session can tell the coordinator.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Handshake completed with the hub at `address`.
    Connected { address: String },
    Disconnected,
    CommandResult(CommandResult),
    /// The hub's guard mode changed (raw wire value).
    AlarmMode(i64),
    CameraInfo(CameraInfoSnapshot),
    DownloadStarted(StreamEvent),
    DownloadFinished(StreamEvent),
    LivestreamStarted(StreamEvent),
    LivestreamStopped(StreamEvent),
    WifiRssi { channel: u8, rssi: i32 },
}

/// Outcome of a previously sent command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub command_type: u32,
    pub channel: u8,
    pub return_code: i32,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }
}

/// Parameter dump returned for a camera-info request.
///
/// Each entry names the channel it originated from; channel 255 is the
/// station itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfoSnapshot {
    #[serde(default)]
    pub params: Vec<CameraInfoEntry>,
    #[serde(default)]
    pub main_sw_version: Option<String>,
    #[serde(default)]
    pub sec_sw_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfoEntry {
    #[serde(rename = "dev_type")]
    pub channel: u8,
    pub param_type: ParamType,
    #[serde(rename = "param_value")]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCodec {
    None,
    Aac,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub video_codec: crate::VideoCodec,
    pub video_fps: u32,
    pub video_width: u32,
    pub video_height: u32,
    pub audio_codec: AudioCodec,
}

/// Media channels for a running stream.  Subscribers call `subscribe()`
/// on the sender they are interested in.
#[derive(Debug, Clone)]
pub struct MediaStreams {
    pub video: broadcast::Sender<Vec<u8>>,
    pub audio: broadcast::Sender<Vec<u8>>,
}

impl MediaStreams {
    pub fn new(capacity: usize) -> Self {
        let (video, _) = broadcast::channel(capacity);
        let (audio, _) = broadcast::channel(capacity);
        Self { video, audio }
    }
}

/// Payload of the download / live-stream start and stop events.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub channel: u8,
    pub metadata: StreamMetadata,
    pub streams: MediaStreams,
}
