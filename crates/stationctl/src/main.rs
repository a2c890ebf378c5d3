//! Command-line driver for a stationlink coordinator.
//!
//! Usage:
//!   SL_CONFIG=station.toml sl-stationctl run
//!   sl-stationctl guard home
//!   sl-stationctl config validate
//!
//! Env vars:
//!   SL_CONFIG        config file path (default: "station.toml")
//!   SL_CLOUD_TOKEN   cloud auth token (name configurable via `cloud.token_env`)
//!   RUST_LOG         overrides `observability.log_filter`
//!
//! The hub link is served by an in-process simulator; the encrypted P2P
//! transport plugs in through `sl_station::TransportFactory`.

mod cli;
mod sim;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sl_cloud::RestCloudClient;
use sl_domain::config::{Config, ObservabilityConfig};
use sl_domain::GuardMode;
use sl_station::{Station, StationBuilder, StationEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigCommand};
use sim::SimulatedHub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run { latency_ms: 250 }) {
        Command::Run { latency_ms } => {
            let (config, config_path) = cli::load_config()?;
            init_tracing(&config.observability);
            tracing::info!(config = %config_path, "starting");
            run(config, Duration::from_millis(latency_ms)).await
        }
        Command::Guard { mode, timeout_secs } => {
            let (config, _) = cli::load_config()?;
            init_tracing(&config.observability);
            guard(config, mode, Duration::from_secs(timeout_secs)).await
        }
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = cli::load_config()?;
            if !cli::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _) = cli::load_config()?;
            cli::show(&config)
        }
        Command::Version => {
            println!("sl-stationctl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Human-readable or JSON logs depending on config; `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.log_filter));

    if obs.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_station(config: &Config, latency: Duration) -> anyhow::Result<Station> {
    for issue in config.validate() {
        tracing::warn!(issue = %issue, "config");
    }

    let api = RestCloudClient::new(&config.cloud).context("building cloud client")?;
    let hub = SimulatedHub::new((&config.station).into(), latency);

    StationBuilder::from_config(config)
        .credential_api(Arc::new(api))
        .transport_factory(Arc::new(hub))
        .build()
        .context("building station")
}

async fn run(config: Config, latency: Duration) -> anyhow::Result<()> {
    let station = build_station(&config, latency)?;
    let mut events = station.events();

    station.connect().await;
    station.get_camera_info().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            ev = events.recv() => match ev {
                Ok(ev) => log_event(&ev),
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "event consumer lagging"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    station.close().await;
    Ok(())
}

async fn guard(config: Config, mode: GuardMode, timeout: Duration) -> anyhow::Result<()> {
    let station = build_station(&config, Duration::from_millis(50))?;
    let mut events = station.events();

    station.set_guard_mode(mode).await;

    let answered = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(StationEvent::CommandResult(r)) => return Some(r),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .await;

    station.close().await;

    match answered {
        Ok(Some(r)) if r.is_success() => {
            println!("guard mode set to {mode}");
            Ok(())
        }
        Ok(Some(r)) => anyhow::bail!("hub rejected guard mode {mode} (code {})", r.return_code),
        Ok(None) => anyhow::bail!("event stream closed before the hub answered"),
        Err(_) => anyhow::bail!("no answer from hub within {}s", timeout.as_secs()),
    }
}

fn log_event(ev: &StationEvent) {
    match ev {
        StationEvent::Connected { station, address } => {
            tracing::info!(station = %station, address = %address, "station connected")
        }
        StationEvent::Disconnected { station } => {
            tracing::info!(station = %station, "station disconnected")
        }
        StationEvent::ParameterChanged {
            owner,
            param_type,
            value,
            ..
        } => tracing::info!(owner = %owner, param = %param_type, value = %value, "parameter changed"),
        StationEvent::DeviceParametersUpdated { device, parameters } => {
            tracing::info!(device = %device, count = parameters.len(), "device parameters")
        }
        StationEvent::CommandResult(r) => tracing::info!(
            command = r.command_type,
            channel = r.channel,
            return_code = r.return_code,
            "command result"
        ),
        StationEvent::RssiChanged { owner, rssi } => {
            tracing::info!(owner = %owner, rssi, "rssi")
        }
        StationEvent::LivestreamStarted(s) | StationEvent::DownloadStarted(s) => {
            tracing::info!(channel = s.channel, codec = ?s.metadata.video_codec, "stream started")
        }
        StationEvent::LivestreamStopped(s) | StationEvent::DownloadFinished(s) => {
            tracing::info!(channel = s.channel, "stream stopped")
        }
    }
}
