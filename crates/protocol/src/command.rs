use serde::{Deserialize, Serialize};

/// Sub-command code used inside the doorbell-family payload envelope to
/// start a live stream.
pub const DOORBELL_LIVESTREAM_SUBCOMMAND: u32 = 1000;

/// Commands understood by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    StartRealtimeMedia,
    StopRealtimeMedia,
    IrcutSwitch,
    DownloadVideo,
    HubReboot,
    DevsSwitch,
    DevLedSwitch,
    DownloadCancel,
    LiveviewLedSwitch,
    EasSwitch,
    CameraInfo,
    SdInfoEx,
    SetDevsOsd,
    SetArming,
    SetPayload,
    DoorbellSetPayload,
    IndoorLedSwitch,
}

impl CommandType {
    pub const ALL: [CommandType; 17] = [
        CommandType::StartRealtimeMedia,
        CommandType::StopRealtimeMedia,
        CommandType::IrcutSwitch,
        CommandType::DownloadVideo,
        CommandType::HubReboot,
        CommandType::DevsSwitch,
        CommandType::DevLedSwitch,
        CommandType::DownloadCancel,
        CommandType::LiveviewLedSwitch,
        CommandType::EasSwitch,
        CommandType::CameraInfo,
        CommandType::SdInfoEx,
        CommandType::SetDevsOsd,
        CommandType::SetArming,
        CommandType::SetPayload,
        CommandType::DoorbellSetPayload,
        CommandType::IndoorLedSwitch,
    ];

    /// Numeric command code on the wire.
    pub fn code(self) -> u32 {
        match self {
            CommandType::StartRealtimeMedia => 1003,
            CommandType::StopRealtimeMedia => 1004,
            CommandType::IrcutSwitch => 1013,
            CommandType::DownloadVideo => 1024,
            CommandType::HubReboot => 1034,
            CommandType::DevsSwitch => 1035,
            CommandType::DevLedSwitch => 1046,
            CommandType::DownloadCancel => 1051,
            CommandType::LiveviewLedSwitch => 1056,
            CommandType::EasSwitch => 1061,
            CommandType::CameraInfo => 1103,
            CommandType::SdInfoEx => 1144,
            CommandType::SetDevsOsd => 1214,
            CommandType::SetArming => 1224,
            CommandType::SetPayload => 1350,
            CommandType::DoorbellSetPayload => 1700,
            CommandType::IndoorLedSwitch => 6014,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

/// Video codec requested when starting a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    H264,
    H265,
}

impl VideoCodec {
    pub fn code(self) -> u8 {
        match self {
            VideoCodec::H264 => 0,
            VideoCodec::H265 => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<u32> = CommandType::ALL.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), CommandType::ALL.len());
    }

    #[test]
    fn from_code_finds_command() {
        assert_eq!(CommandType::from_code(1224), Some(CommandType::SetArming));
        assert_eq!(CommandType::from_code(1), None);
    }
}
