use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reconnect back-off
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stepped back-off applied after an unexpected disconnect.
///
/// The first retry waits `initial_delay_ms`.  Each later retry adds
/// `small_step_ms` while the previous delay is below `step_threshold_ms`,
/// then `large_step_ms` until the delay reaches `ceiling_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "d_5000")]
    pub initial_delay_ms: u64,
    #[serde(default = "d_10000")]
    pub small_step_ms: u64,
    #[serde(default = "d_60000")]
    pub large_step_ms: u64,
    #[serde(default = "d_60000")]
    pub step_threshold_ms: u64,
    #[serde(default = "d_600000")]
    pub ceiling_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 5_000,
            small_step_ms: 10_000,
            large_step_ms: 60_000,
            step_threshold_ms: 60_000,
            ceiling_ms: 600_000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_5000() -> u64 {
    5_000
}
fn d_10000() -> u64 {
    10_000
}
fn d_60000() -> u64 {
    60_000
}
fn d_600000() -> u64 {
    600_000
}
