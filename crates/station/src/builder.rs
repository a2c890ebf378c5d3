//! Builder pattern for constructing a [`Station`].

use std::sync::Arc;

use sl_cloud::{CredentialApi, CredentialCache};
use sl_domain::config::{Config, ReconnectConfig};
use sl_domain::{
    CapabilityOracle, ParameterDecoder, PrefixCapabilityOracle, RawValueDecoder, StationInfo,
};

use crate::reconnect::ReconnectScheduler;
use crate::router::{CommandRouter, RoutingThresholds};
use crate::station::{Parts, Station};
use crate::transport::TransportFactory;
use crate::types::StationError;

/// Fluent builder for [`Station`].
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use sl_station::{Station, TransportFactory};
/// # use sl_cloud::RestCloudClient;
/// # use sl_domain::config::Config;
/// # fn example(factory: Arc<dyn TransportFactory>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let station = Station::builder((&config.station).into())
///     .reconnect(config.reconnect)
///     .credential_api(Arc::new(RestCloudClient::new(&config.cloud)?))
///     .transport_factory(factory)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct StationBuilder {
    info: StationInfo,
    user_name: String,
    reconnect: ReconnectConfig,
    thresholds: RoutingThresholds,
    oracle: Option<Arc<dyn CapabilityOracle>>,
    decoder: Option<Arc<dyn ParameterDecoder>>,
    credential_api: Option<Arc<dyn CredentialApi>>,
    transport: Option<Arc<dyn TransportFactory>>,
    event_capacity: usize,
}

impl StationBuilder {
    pub fn new(info: StationInfo) -> Self {
        Self {
            info,
            user_name: "stationlink".into(),
            reconnect: ReconnectConfig::default(),
            thresholds: RoutingThresholds::default(),
            oracle: None,
            decoder: None,
            credential_api: None,
            transport: None,
            event_capacity: 256,
        }
    }

    /// Seed identity, reconnect policy and capability rules from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new((&config.station).into())
            .user_name(config.station.user_name.clone())
            .reconnect(config.reconnect)
            .capability_oracle(Arc::new(PrefixCapabilityOracle::new(
                config.capabilities.clone(),
            )))
    }

    // ── Required ─────────────────────────────────────────────────────

    pub fn credential_api(mut self, api: Arc<dyn CredentialApi>) -> Self {
        self.credential_api = Some(api);
        self
    }

    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport = Some(factory);
        self
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Name sent to the hub in structured guard-mode payloads.
    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    pub fn reconnect(mut self, cfg: ReconnectConfig) -> Self {
        self.reconnect = cfg;
        self
    }

    pub fn routing_thresholds(mut self, t: RoutingThresholds) -> Self {
        self.thresholds = t;
        self
    }

    /// Override the model / serial classifier (default: built-in prefix table).
    pub fn capability_oracle(mut self, oracle: Arc<dyn CapabilityOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Override the raw parameter decoder (default: [`RawValueDecoder`]).
    pub fn decoder(mut self, decoder: Arc<dyn ParameterDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Buffer size of the async event channel (default 256).
    pub fn event_capacity(mut self, n: usize) -> Self {
        self.event_capacity = n.max(1);
        self
    }

    pub fn build(self) -> Result<Station, StationError> {
        if self.info.serial.is_empty() {
            return Err(StationError::Config("station serial is required".into()));
        }
        let api = self
            .credential_api
            .ok_or_else(|| StationError::Config("credential_api is required".into()))?;
        let factory = self
            .transport
            .ok_or_else(|| StationError::Config("transport_factory is required".into()))?;

        let credentials = CredentialCache::new(self.info.serial.clone(), api);

        Ok(Station::from_parts(Parts {
            info: self.info,
            user_name: self.user_name,
            reconnect: ReconnectScheduler::new(self.reconnect),
            router: CommandRouter::new(self.thresholds),
            oracle: self
                .oracle
                .unwrap_or_else(|| Arc::new(PrefixCapabilityOracle::default())),
            decoder: self.decoder.unwrap_or_else(|| Arc::new(RawValueDecoder)),
            credentials,
            factory,
            event_capacity: self.event_capacity,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_serial_is_a_config_error() {
        let err = StationBuilder::new(StationInfo::default()).build().err();
        assert!(matches!(err, Some(StationError::Config(msg)) if msg.contains("serial")));
    }

    #[test]
    fn missing_credential_api_is_a_config_error() {
        let info = StationInfo {
            serial: "T8010P1".into(),
            ..Default::default()
        };
        let err = StationBuilder::new(info).build().err();
        assert!(matches!(err, Some(StationError::Config(msg)) if msg.contains("credential_api")));
    }
}
