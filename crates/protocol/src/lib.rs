//! Station protocol: wire command codes, payload encodings and the events a
//! transport session reports back.
//!
//! Byte framing and encryption are the transport's business; this crate
//! only fixes *what* is sent (command + payload + channel) and *what* comes
//! back.

pub mod command;
pub mod event;
pub mod payload;

pub use command::{CommandType, VideoCodec, DOORBELL_LIVESTREAM_SUBCOMMAND};
pub use event::{
    AudioCodec, CameraInfoEntry, CameraInfoSnapshot, CommandResult, MediaStreams, StreamEvent,
    StreamMetadata, TransportEvent,
};
pub use payload::{Encoding, Payload, WireCommand};

/// Client OS string the hub expects in structured live-stream payloads.
pub const CLIENT_OS: &str = "Android";
