//! Request/response DTOs for the cloud key endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DskKeysRequest {
    pub station_sns: Vec<String>,
}

/// Top-level response body.  `code == 0` means success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DskKeysResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<DskKeysData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DskKeysData {
    #[serde(default)]
    pub dsk_keys: Vec<DskKey>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DskKey {
    pub station_sn: String,
    pub dsk_key: String,
    /// Expiry as Unix seconds.
    pub expiration: i64,
    #[serde(default)]
    pub about_to_be_replaced: bool,
}

/// HTTP status plus the parsed body, if the body was parseable.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<DskKeysResponse>,
}

impl DskKeysResponse {
    /// Key entry for `station_sn`, if the response carries one.
    pub fn key_for(&self, station_sn: &str) -> Option<&DskKey> {
        self.data
            .as_ref()?
            .dsk_keys
            .iter()
            .find(|k| k.station_sn == station_sn)
    }
}
