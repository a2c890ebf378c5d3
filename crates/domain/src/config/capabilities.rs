use serde::{Deserialize, Serialize};

use crate::capability::Capability;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Capability table
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Maps a model-number prefix (e.g. `"T8114"`) to its capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRule {
    pub prefix: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl CapabilityRule {
    fn new(prefix: &str, capabilities: &[Capability]) -> Self {
        Self {
            prefix: prefix.into(),
            capabilities: capabilities.to_vec(),
        }
    }
}

/// Built-in model table for the known device families.
pub fn default_capability_rules() -> Vec<CapabilityRule> {
    use Capability::*;

    vec![
        // Home bases carry no device capabilities.
        CapabilityRule::new("T8001", &[]),
        CapabilityRule::new("T8002", &[]),
        CapabilityRule::new("T8010", &[]),
        // First-generation battery cameras.
        CapabilityRule::new("T8111", &[Camera]),
        CapabilityRule::new("T8112", &[Camera]),
        // eufyCam 2 family.
        CapabilityRule::new("T8113", &[Camera, Camera2Family]),
        CapabilityRule::new("T8114", &[Camera, Camera2Family]),
        CapabilityRule::new("T8140", &[Camera, Camera2Family]),
        CapabilityRule::new("T8142", &[Camera, Camera2Family]),
        // Solo cameras.
        CapabilityRule::new("T8122", &[Camera, SoloCamera, IntegratedDevice]),
        CapabilityRule::new("T8123", &[Camera, SoloCamera, IntegratedDevice]),
        CapabilityRule::new("T8130", &[Camera, SoloCamera, IntegratedDevice]),
        CapabilityRule::new("T8131", &[Camera, SoloCamera, IntegratedDevice]),
        // Doorbells.
        CapabilityRule::new("T8200", &[Camera, Doorbell, IntegratedDevice]),
        CapabilityRule::new("T8201", &[Camera, Doorbell, IntegratedDevice]),
        CapabilityRule::new("T8202", &[Camera, Doorbell, IntegratedDevice]),
        CapabilityRule::new("T8210", &[Camera, BatteryDoorbell]),
        CapabilityRule::new("T8220", &[Camera, BatteryDoorbell]),
        CapabilityRule::new("T8212", &[Camera, BatteryDoorbell2]),
        CapabilityRule::new("T8222", &[Camera, BatteryDoorbell2]),
        // Indoor cameras.
        CapabilityRule::new("T8400", &[Camera, IndoorCamera, IntegratedDevice]),
        CapabilityRule::new("T8401", &[Camera, IndoorCamera, IntegratedDevice]),
        CapabilityRule::new("T8410", &[Camera, IndoorCamera, IntegratedDevice]),
        CapabilityRule::new("T8411", &[Camera, IndoorCamera, IntegratedDevice]),
        // Floodlights.
        CapabilityRule::new("T8420", &[Camera, Floodlight, IntegratedDevice]),
        CapabilityRule::new("T8422", &[Camera, Floodlight, IntegratedDevice]),
        CapabilityRule::new("T8423", &[Camera, Floodlight, IntegratedDevice]),
        CapabilityRule::new("T8424", &[Camera, Floodlight, IntegratedDevice]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_unique() {
        let rules = default_capability_rules();
        let mut prefixes: Vec<_> = rules.iter().map(|r| r.prefix.as_str()).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), rules.len());
    }

    #[test]
    fn rule_parses_snake_case_capabilities() {
        let toml_str = r#"
            prefix = "T9999"
            capabilities = ["camera", "indoor_camera"]
        "#;
        let rule: CapabilityRule = toml::from_str(toml_str).unwrap();
        assert_eq!(
            rule.capabilities,
            vec![Capability::Camera, Capability::IndoorCamera]
        );
    }
}
