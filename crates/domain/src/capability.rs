//! Device capability model.
//!
//! The hub firmware exposes different command sets depending on the device
//! family.  Routing never looks at models directly: it asks a
//! [`CapabilityOracle`] for the [`CapabilitySet`] of a station or device and
//! checks membership.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::CapabilityRule;

/// A device family / feature flag used for command gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Any camera-class device (can be enabled / disabled).
    Camera,
    /// Second-generation battery cameras (eufyCam 2 family).
    Camera2Family,
    /// Indoor (pan/tilt or fixed) cameras.
    IndoorCamera,
    /// Standalone battery cameras without a home base.
    SoloCamera,
    /// Floodlight cameras.
    Floodlight,
    /// Wired video doorbells.
    Doorbell,
    /// First-generation battery doorbells.
    BatteryDoorbell,
    /// Second-generation battery doorbells.
    BatteryDoorbell2,
    /// Devices that act as their own station (no separate hub).
    IntegratedDevice,
}

/// Set of capabilities reported for one station or device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cap: Capability) -> &mut Self {
        self.0.insert(cap);
        self
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }

    /// True when at least one of `caps` is present.
    pub fn any_of(&self, caps: &[Capability]) -> bool {
        caps.iter().any(|c| self.0.contains(c))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(caps: [Capability; N]) -> Self {
        caps.into_iter().collect()
    }
}

/// Classifies a station or device into a capability set.
///
/// Implementations must be pure: the same `(serial, model)` always yields
/// the same set.
pub trait CapabilityOracle: Send + Sync {
    fn classify(&self, serial: &str, model: &str) -> CapabilitySet;
}

/// Table-driven oracle matching model numbers (or, when the model is
/// unknown, serial numbers) against configured prefixes.
///
/// The longest matching prefix wins.
#[derive(Debug, Clone)]
pub struct PrefixCapabilityOracle {
    rules: Vec<CapabilityRule>,
}

impl PrefixCapabilityOracle {
    pub fn new(mut rules: Vec<CapabilityRule>) -> Self {
        rules.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { rules }
    }

    fn lookup(&self, key: &str) -> Option<&CapabilityRule> {
        if key.is_empty() {
            return None;
        }
        self.rules.iter().find(|r| key.starts_with(r.prefix.as_str()))
    }
}

impl Default for PrefixCapabilityOracle {
    fn default() -> Self {
        Self::new(crate::config::default_capability_rules())
    }
}

impl CapabilityOracle for PrefixCapabilityOracle {
    fn classify(&self, serial: &str, model: &str) -> CapabilitySet {
        self.lookup(model)
            .or_else(|| self.lookup(serial))
            .map(|rule| rule.capabilities.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_of_matches_single_member() {
        let set = CapabilitySet::from([Capability::Camera, Capability::IndoorCamera]);
        assert!(set.any_of(&[Capability::SoloCamera, Capability::IndoorCamera]));
        assert!(!set.any_of(&[Capability::Floodlight]));
        assert!(!set.any_of(&[]));
    }

    #[test]
    fn default_table_classifies_camera2() {
        let oracle = PrefixCapabilityOracle::default();
        let caps = oracle.classify("T8114P0000000001", "T8114");
        assert!(caps.contains(Capability::Camera2Family));
        assert!(caps.contains(Capability::Camera));
    }

    #[test]
    fn falls_back_to_serial_when_model_unknown() {
        let oracle = PrefixCapabilityOracle::default();
        let caps = oracle.classify("T8400P1234567890", "");
        assert!(caps.contains(Capability::IndoorCamera));
        assert!(caps.contains(Capability::IntegratedDevice));
    }

    #[test]
    fn longest_prefix_wins() {
        let oracle = PrefixCapabilityOracle::new(vec![
            CapabilityRule {
                prefix: "T81".into(),
                capabilities: vec![Capability::Camera],
            },
            CapabilityRule {
                prefix: "T8130".into(),
                capabilities: vec![Capability::SoloCamera],
            },
        ]);
        let caps = oracle.classify("", "T8130");
        assert!(caps.contains(Capability::SoloCamera));
        assert!(!caps.contains(Capability::Camera));
    }

    #[test]
    fn unknown_model_has_no_capabilities() {
        let oracle = PrefixCapabilityOracle::default();
        assert!(oracle.classify("X0000", "X0000").is_empty());
    }
}
