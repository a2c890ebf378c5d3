use clap::{Parser, Subcommand};
use sl_domain::config::{Config, ConfigSeverity};
use sl_domain::GuardMode;

/// Drive a security hub session from the command line.
#[derive(Debug, Parser)]
#[command(name = "sl-stationctl", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect and log station events until Ctrl-C (default).
    Run {
        /// Simulated hub round-trip latency in milliseconds.
        #[arg(long, default_value_t = 250)]
        latency_ms: u64,
    },
    /// Connect, change the guard mode and wait for the hub's answer.
    Guard {
        /// Mode name (away, home, schedule, off, disarmed, ...) or wire code.
        mode: GuardMode,
        /// Seconds to wait for the command result.
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `SL_CONFIG` (or `station.toml`
/// by default).  Returns the parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("SL_CONFIG").unwrap_or_else(|_| "station.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

/// A missing file yields the defaults; an unreadable or malformed one is
/// an error.
pub fn load_config_from(config_path: &str) -> anyhow::Result<Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

/// Print every validation issue.  Returns `false` if any is an error.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("serializing config: {e}"))?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config_from("/nonexistent/station.toml").unwrap();
        assert_eq!(cfg.reconnect.initial_delay_ms, 5_000);
    }

    #[test]
    fn reads_station_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[station]
serial = "T8010P0000000001"
software_version = "2.0.8.0"

[[station.devices]]
serial = "T8114P0000000001"
channel = 0
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.station.serial, "T8010P0000000001");
        assert_eq!(cfg.station.devices.len(), 1);
        assert!(validate(&cfg, &path));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[station\nserial = ").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn cli_parses_guard_mode_by_name_and_code() {
        let cli = Cli::try_parse_from(["sl-stationctl", "guard", "home"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Guard {
                mode: GuardMode::Home,
                ..
            })
        ));

        let cli = Cli::try_parse_from(["sl-stationctl", "guard", "63"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Guard {
                mode: GuardMode::Disarmed,
                ..
            })
        ));

        assert!(Cli::try_parse_from(["sl-stationctl", "guard", "7"]).is_err());
    }
}
