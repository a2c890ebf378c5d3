//! The `CredentialApi` trait defines the interface for the cloud key
//! endpoint (REST, mock/test).

use async_trait::async_trait;
use sl_domain::error::Result;

use crate::types::ApiResponse;

/// Abstraction over the cloud endpoint that issues station session keys.
///
/// Implementations return `Err` only for transport-level failures.  A
/// non-200 status or a non-zero body `code` is reported in the
/// [`ApiResponse`] and left for the caller to judge.
#[async_trait]
pub trait CredentialApi: Send + Sync {
    /// Fetch the session keys for one station
    /// (POST /v1/app/equipment/get_dsk_keys).
    async fn fetch_credentials(&self, station_sn: &str) -> Result<ApiResponse>;
}
