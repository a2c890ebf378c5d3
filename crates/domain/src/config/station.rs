use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Station descriptor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Static description of the hub this process coordinates.
///
/// Usually bootstrapped from config and later refreshed from the cloud
/// hub snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub software_version: String,
    /// Peer identifier used by the transport for hole punching.
    #[serde(default)]
    pub p2p_did: String,
    /// LAN address hint (`ip` or `ip:port`).
    #[serde(default)]
    pub local_address: Option<String>,
    /// Account id embedded in structured command payloads.
    #[serde(default)]
    pub account_id: String,
    /// Admin user id sent with integer commands.
    #[serde(default)]
    pub admin_user_id: String,
    /// Name reported to the hub when the guard mode is changed.
    #[serde(default = "d_user_name")]
    pub user_name: String,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            serial: String::new(),
            model: String::new(),
            name: String::new(),
            software_version: String::new(),
            p2p_did: String::new(),
            local_address: None,
            account_id: String::new(),
            admin_user_id: String::new(),
            user_name: d_user_name(),
            devices: Vec::new(),
        }
    }
}

fn d_user_name() -> String {
    "stationlink".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub serial: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channel: u8,
    #[serde(default)]
    pub software_version: String,
}
