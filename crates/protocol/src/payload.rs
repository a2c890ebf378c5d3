//! Payload encodings for outbound commands.
//!
//! The hub accepts four shapes: a bare integer, an integer pair, a string
//! pair, and a structured JSON document wrapped in one of the two
//! "set payload" envelope commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::CommandType;

/// Payload shape discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Int,
    IntString,
    String,
    Json,
}

/// The value carried by a [`WireCommand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum Payload {
    Int {
        value: i64,
        str_value: String,
    },
    IntString {
        value: i64,
        value_sub: i64,
        str_value: String,
    },
    String {
        value: String,
        value_sub: String,
        cipher_id: i64,
    },
    Json {
        body: Value,
    },
}

impl Payload {
    pub fn encoding(&self) -> Encoding {
        match self {
            Payload::Int { .. } => Encoding::Int,
            Payload::IntString { .. } => Encoding::IntString,
            Payload::String { .. } => Encoding::String,
            Payload::Json { .. } => Encoding::Json,
        }
    }
}

/// A fully resolved command ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCommand {
    pub command: CommandType,
    pub payload: Payload,
    pub channel: u8,
}

impl WireCommand {
    pub fn new(command: CommandType, payload: Payload, channel: u8) -> Self {
        Self {
            command,
            payload,
            channel,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Structured JSON bodies
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Envelope for [`CommandType::SetPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPayloadBody<P> {
    pub account_id: String,
    pub cmd: u32,
    #[serde(rename = "mValue3")]
    pub m_value3: u32,
    pub payload: P,
}

/// Envelope for [`CommandType::DoorbellSetPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorbellPayloadBody<D> {
    #[serde(rename = "commandType")]
    pub command_type: u32,
    pub data: D,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmingPayload {
    pub mode_type: i64,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivestreamPayload {
    #[serde(rename = "ClientOS")]
    pub client_os: String,
    pub key: String,
    pub streamtype: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorbellLivestreamData {
    pub account_id: String,
    pub encryptkey: String,
    pub streamtype: u8,
}

/// Generic on/off (or small enum) switch with a client transaction id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchPayload {
    pub value: i64,
    pub transaction: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_payload_uses_wire_field_names() {
        let body = SetPayloadBody {
            account_id: "acc".into(),
            cmd: 1224,
            m_value3: 0,
            payload: ArmingPayload {
                mode_type: 1,
                user_name: "me".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mValue3"], 0);
        assert_eq!(json["payload"]["mode_type"], 1);
    }

    #[test]
    fn livestream_payload_renames_client_os() {
        let p = LivestreamPayload {
            client_os: "Android".into(),
            key: "ab".into(),
            streamtype: 0,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["ClientOS"], "Android");
    }

    #[test]
    fn encoding_matches_variant() {
        let p = Payload::IntString {
            value: 1,
            value_sub: 0,
            str_value: String::new(),
        };
        assert_eq!(p.encoding(), Encoding::IntString);
    }
}
