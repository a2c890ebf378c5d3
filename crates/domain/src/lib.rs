//! `sl-domain`: shared types for the stationlink crates.
//!
//! Everything that more than one crate needs lives here: the error type,
//! the configuration tree, structured trace events, the station / device
//! descriptors, the capability model, parameter values and the guard-mode
//! enumeration.

pub mod capability;
pub mod config;
pub mod error;
pub mod guard;
pub mod param;
pub mod station;
pub mod trace;
pub mod version;

pub use capability::{Capability, CapabilityOracle, CapabilitySet, PrefixCapabilityOracle};
pub use guard::GuardMode;
pub use param::{ParamType, Parameter, ParameterDecoder, RawParameter, RawValueDecoder};
pub use station::{DeviceInfo, HubSnapshot, StationInfo};

/// Channel number the hub uses for itself (as opposed to attached devices).
pub const STATION_CHANNEL: u8 = 255;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
