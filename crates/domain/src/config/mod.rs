mod capabilities;
mod cloud;
mod observability;
mod reconnect;
mod station;

pub use capabilities::*;
pub use cloud::*;
pub use observability::*;
pub use reconnect::*;
pub use station::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::STATION_CHANNEL;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Model-prefix → capability table.  Replaces the built-in table
    /// entirely when present.
    #[serde(default = "default_capability_rules")]
    pub capabilities: Vec<CapabilityRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station: StationConfig::default(),
            cloud: CloudConfig::default(),
            reconnect: ReconnectConfig::default(),
            observability: ObservabilityConfig::default(),
            capabilities: default_capability_rules(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.station.serial.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "station.serial".into(),
                message: "serial must not be empty".into(),
            });
        }

        if self.station.software_version.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "station.software_version".into(),
                message: "firmware version unknown; routing assumes the oldest firmware".into(),
            });
        }

        let mut seen = HashSet::new();
        for (i, device) in self.station.devices.iter().enumerate() {
            if device.serial.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("station.devices[{i}].serial"),
                    message: "device serial must not be empty".into(),
                });
            }
            if device.channel == STATION_CHANNEL {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("station.devices[{i}].channel"),
                    message: format!("channel {STATION_CHANNEL} is reserved for the station"),
                });
            }
            if !seen.insert(device.channel) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("station.devices[{i}].channel"),
                    message: format!("duplicate device channel {}", device.channel),
                });
            }
        }

        if self.cloud.base_url.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "cloud.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        }

        let r = &self.reconnect;
        if r.initial_delay_ms == 0 || r.small_step_ms == 0 || r.large_step_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "reconnect".into(),
                message: "backoff delays and steps must be greater than 0".into(),
            });
        }
        if r.step_threshold_ms > r.ceiling_ms {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "reconnect.step_threshold_ms".into(),
                message: "threshold above ceiling; large steps are never used".into(),
            });
        }

        if self.capabilities.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "capabilities".into(),
                message: "no capability rules; every capability-gated command will be rejected"
                    .into(),
            });
        }

        errors
    }
}
