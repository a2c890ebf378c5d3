//! Runtime descriptors for the hub and its attached devices.

use serde::{Deserialize, Serialize};

use crate::config::{DeviceConfig, StationConfig};
use crate::param::RawParameter;
use crate::STATION_CHANNEL;

/// The hub as currently known to the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationInfo {
    pub serial: String,
    pub model: String,
    pub name: String,
    pub software_version: String,
    pub p2p_did: String,
    pub local_address: Option<String>,
    pub account_id: String,
    pub admin_user_id: String,
    pub devices: Vec<DeviceInfo>,
}

/// A camera, doorbell, sensor... managed by the hub on a given channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub serial: String,
    pub model: String,
    pub name: String,
    pub channel: u8,
    pub software_version: String,
}

impl StationInfo {
    /// Resolve a hub channel to the serial of the device using it.
    ///
    /// Returns `None` for the station's own channel and for channels no
    /// known device is bound to.
    pub fn device_serial_for_channel(&self, channel: u8) -> Option<&str> {
        if channel == STATION_CHANNEL {
            return None;
        }
        self.devices
            .iter()
            .find(|d| d.channel == channel)
            .map(|d| d.serial.as_str())
    }

    pub fn device(&self, serial: &str) -> Option<&DeviceInfo> {
        self.devices.iter().find(|d| d.serial == serial)
    }
}

/// Hub description plus raw parameters as returned by the cloud listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubSnapshot {
    pub station: StationInfo,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

impl From<&DeviceConfig> for DeviceInfo {
    fn from(cfg: &DeviceConfig) -> Self {
        Self {
            serial: cfg.serial.clone(),
            model: cfg.model.clone(),
            name: cfg.name.clone(),
            channel: cfg.channel,
            software_version: cfg.software_version.clone(),
        }
    }
}

impl From<&StationConfig> for StationInfo {
    fn from(cfg: &StationConfig) -> Self {
        Self {
            serial: cfg.serial.clone(),
            model: cfg.model.clone(),
            name: cfg.name.clone(),
            software_version: cfg.software_version.clone(),
            p2p_did: cfg.p2p_did.clone(),
            local_address: cfg.local_address.clone(),
            account_id: cfg.account_id.clone(),
            admin_user_id: cfg.admin_user_id.clone(),
            devices: cfg.devices.iter().map(DeviceInfo::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> StationInfo {
        StationInfo {
            serial: "T8010P00000001".into(),
            devices: vec![
                DeviceInfo {
                    serial: "T8114P0000000A".into(),
                    channel: 0,
                    ..Default::default()
                },
                DeviceInfo {
                    serial: "T8114P0000000B".into(),
                    channel: 1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn resolves_known_channel() {
        assert_eq!(station().device_serial_for_channel(1), Some("T8114P0000000B"));
    }

    #[test]
    fn unknown_and_station_channels_do_not_resolve() {
        let s = station();
        assert_eq!(s.device_serial_for_channel(7), None);
        assert_eq!(s.device_serial_for_channel(STATION_CHANNEL), None);
    }

    #[test]
    fn built_from_config() {
        let cfg = StationConfig {
            serial: "T8010P1".into(),
            devices: vec![DeviceConfig {
                serial: "T8400P1".into(),
                channel: 3,
                ..Default::default()
            }],
            ..Default::default()
        };
        let info = StationInfo::from(&cfg);
        assert_eq!(info.serial, "T8010P1");
        assert_eq!(info.device("T8400P1").map(|d| d.channel), Some(3));
    }
}
