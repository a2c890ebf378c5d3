use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cloud credential API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "d_cloud_url")]
    pub base_url: String,
    /// Environment variable holding the API auth token.
    #[serde(default = "d_token_env")]
    pub token_env: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
    #[serde(default = "d_country")]
    pub country: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: d_cloud_url(),
            token_env: d_token_env(),
            timeout_ms: 10_000,
            country: d_country(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_cloud_url() -> String {
    "https://mysecurity.eufylife.com/api".into()
}
fn d_token_env() -> String {
    "SL_CLOUD_TOKEN".into()
}
fn d_10000() -> u64 {
    10_000
}
fn d_country() -> String {
    "US".into()
}
