use sl_domain::config::{Config, ConfigSeverity};
use sl_domain::{Capability, CapabilityOracle, PrefixCapabilityOracle};

#[test]
fn empty_file_parses_to_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.reconnect.initial_delay_ms, 5_000);
    assert_eq!(config.reconnect.ceiling_ms, 600_000);
    assert_eq!(config.cloud.token_env, "SL_CLOUD_TOKEN");
    assert!(!config.capabilities.is_empty());
}

#[test]
fn station_and_devices_parse() {
    let toml_str = r#"
[station]
serial = "T8010P00000001"
model = "T8010"
software_version = "2.0.8.0"
account_id = "acc-1"

[[station.devices]]
serial = "T8114P0000000A"
model = "T8114"
channel = 0

[[station.devices]]
serial = "T8400P0000000B"
model = "T8400"
channel = 1
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.station.devices.len(), 2);
    assert_eq!(config.station.devices[1].channel, 1);
    assert!(config.validate().is_empty());
}

#[test]
fn custom_capability_table_replaces_builtin() {
    let toml_str = r#"
[[capabilities]]
prefix = "X100"
capabilities = ["camera", "solo_camera"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let oracle = PrefixCapabilityOracle::new(config.capabilities);
    assert!(oracle.classify("", "X100").contains(Capability::SoloCamera));
    assert!(oracle.classify("", "T8114").is_empty());
}

#[test]
fn partial_reconnect_section_keeps_other_defaults() {
    let toml_str = r#"
[reconnect]
initial_delay_ms = 1000
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.reconnect.initial_delay_ms, 1_000);
    assert_eq!(config.reconnect.small_step_ms, 10_000);
}

#[test]
fn default_config_flags_missing_serial() {
    let issues = Config::default().validate();
    assert!(issues
        .iter()
        .any(|e| e.severity == ConfigSeverity::Error && e.field == "station.serial"));
}
