//! Maps a high-level intent plus device / station context onto concrete
//! wire commands.
//!
//! Routing is a pure function of its inputs: no I/O, no clock reads.  The
//! caller supplies the transaction stamp and key material.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sl_domain::version::is_at_least;
use sl_domain::{Capability, CapabilitySet, DeviceInfo, GuardMode, StationInfo, STATION_CHANNEL};
use sl_protocol::payload::{
    ArmingPayload, DoorbellLivestreamData, DoorbellPayloadBody, LivestreamPayload,
    SetPayloadBody, SwitchPayload,
};
use sl_protocol::{
    CommandType, Payload, VideoCodec, WireCommand, CLIENT_OS, DOORBELL_LIVESTREAM_SUBCOMMAND,
};

use Capability::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// OSD watermark options.  Each device family numbers them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkSetting {
    Off,
    Timestamp,
    TimestampAndLogo,
}

impl WatermarkSetting {
    fn camera2_code(self) -> i64 {
        match self {
            WatermarkSetting::Off => 0,
            WatermarkSetting::Timestamp => 1,
            WatermarkSetting::TimestampAndLogo => 2,
        }
    }

    fn indoor_code(self) -> i64 {
        match self {
            WatermarkSetting::Timestamp => 0,
            WatermarkSetting::TimestampAndLogo => 1,
            WatermarkSetting::Off => 2,
        }
    }
}

/// What the caller wants to happen, independent of wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SetGuardMode(GuardMode),
    GetCameraInfo,
    GetStorageInfo,
    RebootHub,
    SetStatusLed(bool),
    SetAutoNightVision(bool),
    SetAntiTheftDetection(bool),
    SetWatermark(WatermarkSetting),
    EnableDevice(bool),
    StartDownload { path: String, cipher_id: i64 },
    CancelDownload,
    StartLivestream,
    StopLivestream,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SetGuardMode(_) => "set_guard_mode",
            Intent::GetCameraInfo => "get_camera_info",
            Intent::GetStorageInfo => "get_storage_info",
            Intent::RebootHub => "reboot_hub",
            Intent::SetStatusLed(_) => "set_status_led",
            Intent::SetAutoNightVision(_) => "set_auto_night_vision",
            Intent::SetAntiTheftDetection(_) => "set_anti_theft_detection",
            Intent::SetWatermark(_) => "set_watermark",
            Intent::EnableDevice(_) => "enable_device",
            Intent::StartDownload { .. } => "start_download",
            Intent::CancelDownload => "cancel_download",
            Intent::StartLivestream => "start_livestream",
            Intent::StopLivestream => "stop_livestream",
        }
    }

    /// Intents allowed to open a session on their own when none is up.
    pub fn connects_implicitly(&self) -> bool {
        matches!(
            self,
            Intent::SetGuardMode(_) | Intent::GetCameraInfo | Intent::GetStorageInfo
        )
    }

    /// Intents addressed to one attached device rather than the hub.
    pub fn targets_device(&self) -> bool {
        matches!(
            self,
            Intent::SetStatusLed(_)
                | Intent::SetAutoNightVision(_)
                | Intent::SetAntiTheftDetection(_)
                | Intent::SetWatermark(_)
                | Intent::EnableDevice(_)
                | Intent::CancelDownload
                | Intent::StartLivestream
                | Intent::StopLivestream
        )
    }

    /// Intents whose payload embeds the session's public key.
    pub fn needs_public_key(&self) -> bool {
        matches!(self, Intent::StartDownload { .. } | Intent::StartLivestream)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Context & errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy)]
pub struct DeviceTarget<'a> {
    pub info: &'a DeviceInfo,
    pub caps: &'a CapabilitySet,
}

/// Inputs a routing decision may depend on.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub station: &'a StationInfo,
    pub station_caps: &'a CapabilitySet,
    pub device: Option<DeviceTarget<'a>>,
    /// Name reported in structured guard-mode payloads.
    pub user_name: &'a str,
    /// Session public key modulus, for intents that embed it.
    pub public_key: Option<&'a [u8]>,
    /// Client transaction stamp for JSON switch payloads.
    pub transaction: &'a str,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{intent} is not supported by device {device}")]
    Unsupported { intent: &'static str, device: String },
    #[error("{0} needs a target device")]
    MissingDevice(&'static str),
    #[error("{0} needs the session public key")]
    MissingPublicKey(&'static str),
    #[error("payload encoding: {0}")]
    Encoding(String),
}

/// Firmware cut-offs that decide between payload families.
#[derive(Debug, Clone)]
pub struct RoutingThresholds {
    /// Hubs older than this take guard-mode changes as JSON.
    pub guard_mode_int_min: String,
    /// Hubs older than this take live-stream requests as an int pair.
    pub livestream_json_min: String,
    /// Serial prefix that uses JSON live-stream from `livestream_prefix_min`.
    pub livestream_prefix: String,
    pub livestream_prefix_min: String,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            guard_mode_int_min: "2.0.7.9".into(),
            livestream_json_min: "2.0.9.7".into(),
            livestream_prefix: "T8420".into(),
            livestream_prefix_min: "1.0.0.25".into(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Router
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default)]
pub struct CommandRouter {
    thresholds: RoutingThresholds,
}

impl CommandRouter {
    pub fn new(thresholds: RoutingThresholds) -> Self {
        Self { thresholds }
    }

    /// Resolve `intent` into the commands to send, in order.
    pub fn route(
        &self,
        intent: &Intent,
        ctx: &RouteContext<'_>,
    ) -> Result<Vec<WireCommand>, Rejection> {
        let station = ctx.station;
        let admin = station.admin_user_id.clone();

        match intent {
            Intent::SetGuardMode(mode) => Ok(vec![self.guard_mode(*mode, ctx)?]),

            Intent::GetCameraInfo => Ok(vec![WireCommand::new(
                CommandType::CameraInfo,
                Payload::Int {
                    value: i64::from(STATION_CHANNEL),
                    str_value: String::new(),
                },
                STATION_CHANNEL,
            )]),

            Intent::GetStorageInfo => Ok(vec![WireCommand::new(
                CommandType::SdInfoEx,
                Payload::IntString {
                    value: 0,
                    value_sub: 0,
                    str_value: admin,
                },
                STATION_CHANNEL,
            )]),

            Intent::RebootHub => Ok(vec![WireCommand::new(
                CommandType::HubReboot,
                Payload::Int {
                    value: 0,
                    str_value: admin,
                },
                STATION_CHANNEL,
            )]),

            Intent::StartDownload { path, cipher_id } => {
                let key = public_key_hex(intent, ctx)?;
                Ok(vec![WireCommand::new(
                    CommandType::DownloadVideo,
                    Payload::String {
                        value: path.clone(),
                        value_sub: key,
                        cipher_id: *cipher_id,
                    },
                    STATION_CHANNEL,
                )])
            }

            Intent::SetStatusLed(on) => {
                let dev = device(intent, ctx)?;
                if dev.caps.contains(Camera2Family) {
                    let payload = int_switch(*on, dev.info.channel, &admin);
                    Ok(vec![
                        WireCommand::new(CommandType::DevLedSwitch, payload.clone(), dev.info.channel),
                        WireCommand::new(CommandType::LiveviewLedSwitch, payload, dev.info.channel),
                    ])
                } else if dev.caps.any_of(&[IndoorCamera, SoloCamera]) {
                    Ok(vec![json_switch(
                        CommandType::IndoorLedSwitch,
                        i64::from(*on),
                        dev.info.channel,
                        ctx,
                    )?])
                } else {
                    Err(unsupported(intent, dev))
                }
            }

            Intent::SetAutoNightVision(on) => {
                let dev = device(intent, ctx)?;
                let families = [
                    Camera2Family,
                    IndoorCamera,
                    SoloCamera,
                    Floodlight,
                    BatteryDoorbell,
                    BatteryDoorbell2,
                ];
                if !dev.caps.any_of(&families) {
                    return Err(unsupported(intent, dev));
                }
                Ok(vec![WireCommand::new(
                    CommandType::IrcutSwitch,
                    int_switch(*on, dev.info.channel, &admin),
                    dev.info.channel,
                )])
            }

            Intent::SetAntiTheftDetection(on) => {
                let dev = device(intent, ctx)?;
                if !dev.caps.contains(Camera2Family) {
                    return Err(unsupported(intent, dev));
                }
                Ok(vec![WireCommand::new(
                    CommandType::EasSwitch,
                    int_switch(*on, dev.info.channel, &admin),
                    dev.info.channel,
                )])
            }

            Intent::SetWatermark(setting) => {
                let dev = device(intent, ctx)?;
                if dev.caps.contains(Camera2Family) {
                    Ok(vec![WireCommand::new(
                        CommandType::SetDevsOsd,
                        Payload::IntString {
                            value: setting.camera2_code(),
                            value_sub: i64::from(dev.info.channel),
                            str_value: admin,
                        },
                        dev.info.channel,
                    )])
                } else if dev.caps.contains(IndoorCamera) {
                    Ok(vec![json_switch(
                        CommandType::SetDevsOsd,
                        setting.indoor_code(),
                        dev.info.channel,
                        ctx,
                    )?])
                } else {
                    Err(unsupported(intent, dev))
                }
            }

            Intent::EnableDevice(enabled) => {
                let dev = device(intent, ctx)?;
                if !dev.caps.contains(Camera) {
                    return Err(unsupported(intent, dev));
                }
                // Generic cameras take the inverse: 1 means "switched off".
                let value = if dev.caps.any_of(&[IndoorCamera, SoloCamera]) {
                    i64::from(*enabled)
                } else {
                    i64::from(!*enabled)
                };
                Ok(vec![WireCommand::new(
                    CommandType::DevsSwitch,
                    Payload::IntString {
                        value,
                        value_sub: i64::from(dev.info.channel),
                        str_value: admin,
                    },
                    dev.info.channel,
                )])
            }

            Intent::CancelDownload => {
                let dev = device(intent, ctx)?;
                Ok(vec![WireCommand::new(
                    CommandType::DownloadCancel,
                    Payload::Int {
                        value: i64::from(dev.info.channel),
                        str_value: admin,
                    },
                    dev.info.channel,
                )])
            }

            Intent::StartLivestream => Ok(vec![self.start_livestream(intent, ctx)?]),

            Intent::StopLivestream => {
                let dev = device(intent, ctx)?;
                Ok(vec![WireCommand::new(
                    CommandType::StopRealtimeMedia,
                    Payload::Int {
                        value: i64::from(dev.info.channel),
                        str_value: admin,
                    },
                    dev.info.channel,
                )])
            }
        }
    }

    fn guard_mode(&self, mode: GuardMode, ctx: &RouteContext<'_>) -> Result<WireCommand, Rejection> {
        let station = ctx.station;
        let caps = ctx.station_caps;
        let older = !is_at_least(&station.software_version, &self.thresholds.guard_mode_int_min);

        if (older && !caps.contains(IntegratedDevice)) || caps.contains(SoloCamera) {
            let body = SetPayloadBody {
                account_id: station.account_id.clone(),
                cmd: CommandType::SetArming.code(),
                m_value3: 0,
                payload: ArmingPayload {
                    mode_type: mode.code(),
                    user_name: ctx.user_name.to_string(),
                },
            };
            return Ok(WireCommand::new(
                CommandType::SetPayload,
                json_payload(&body)?,
                STATION_CHANNEL,
            ));
        }

        Ok(WireCommand::new(
            CommandType::SetArming,
            Payload::Int {
                value: mode.code(),
                str_value: station.admin_user_id.clone(),
            },
            STATION_CHANNEL,
        ))
    }

    fn start_livestream(
        &self,
        intent: &Intent,
        ctx: &RouteContext<'_>,
    ) -> Result<WireCommand, Rejection> {
        let dev = device(intent, ctx)?;
        let key = public_key_hex(intent, ctx)?;
        let station = ctx.station;
        let channel = dev.info.channel;
        let t = &self.thresholds;

        if dev.caps.any_of(&[Doorbell, Floodlight, SoloCamera, IndoorCamera]) {
            let body = DoorbellPayloadBody {
                command_type: DOORBELL_LIVESTREAM_SUBCOMMAND,
                data: DoorbellLivestreamData {
                    account_id: station.account_id.clone(),
                    encryptkey: key,
                    streamtype: VideoCodec::H264.code(),
                },
            };
            return Ok(WireCommand::new(
                CommandType::DoorbellSetPayload,
                json_payload(&body)?,
                channel,
            ));
        }

        let fw = &station.software_version;
        let prefix_exempt =
            station.serial.starts_with(&t.livestream_prefix) && is_at_least(fw, &t.livestream_prefix_min);
        let legacy = ctx.station_caps.contains(IntegratedDevice) || !is_at_least(fw, &t.livestream_json_min);

        if legacy && !prefix_exempt {
            return Ok(WireCommand::new(
                CommandType::StartRealtimeMedia,
                Payload::IntString {
                    value: i64::from(channel),
                    value_sub: i64::from(channel),
                    str_value: key,
                },
                channel,
            ));
        }

        let body = SetPayloadBody {
            account_id: station.account_id.clone(),
            cmd: CommandType::StartRealtimeMedia.code(),
            m_value3: CommandType::StartRealtimeMedia.code(),
            payload: LivestreamPayload {
                client_os: CLIENT_OS.into(),
                key,
                streamtype: VideoCodec::H264.code(),
            },
        };
        Ok(WireCommand::new(
            CommandType::SetPayload,
            json_payload(&body)?,
            channel,
        ))
    }
}

// ── helpers ──────────────────────────────────────────────────────────

fn device<'a>(intent: &Intent, ctx: &RouteContext<'a>) -> Result<DeviceTarget<'a>, Rejection> {
    ctx.device.ok_or(Rejection::MissingDevice(intent.name()))
}

fn unsupported(intent: &Intent, dev: DeviceTarget<'_>) -> Rejection {
    Rejection::Unsupported {
        intent: intent.name(),
        device: dev.info.serial.clone(),
    }
}

fn public_key_hex(intent: &Intent, ctx: &RouteContext<'_>) -> Result<String, Rejection> {
    ctx.public_key
        .map(hex::encode)
        .ok_or(Rejection::MissingPublicKey(intent.name()))
}

fn int_switch(on: bool, channel: u8, admin: &str) -> Payload {
    Payload::IntString {
        value: i64::from(on),
        value_sub: i64::from(channel),
        str_value: admin.to_string(),
    }
}

fn json_switch(
    cmd: CommandType,
    value: i64,
    channel: u8,
    ctx: &RouteContext<'_>,
) -> Result<WireCommand, Rejection> {
    let body = SetPayloadBody {
        account_id: ctx.station.account_id.clone(),
        cmd: cmd.code(),
        m_value3: 0,
        payload: SwitchPayload {
            value,
            transaction: ctx.transaction.to_string(),
        },
    };
    Ok(WireCommand::new(CommandType::SetPayload, json_payload(&body)?, channel))
}

fn json_payload<T: Serialize>(body: &T) -> Result<Payload, Rejection> {
    let body: Value = serde_json::to_value(body).map_err(|e| Rejection::Encoding(e.to_string()))?;
    Ok(Payload::Json { body })
}
