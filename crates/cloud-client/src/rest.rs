//! REST implementation of [`CredentialApi`].
//!
//! `RestCloudClient` wraps a `reqwest::Client` and issues exactly one
//! request per call.  A failed refresh is retried on the next connect
//! attempt, not here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use sl_domain::config::CloudConfig;
use sl_domain::error::{Error, Result};
use sl_domain::trace::TraceEvent;
use uuid::Uuid;

use crate::api::CredentialApi;
use crate::types::{ApiResponse, DskKeysRequest, DskKeysResponse};

const DSK_KEYS_PATH: &str = "/v1/app/equipment/get_dsk_keys";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST-based client for the vendor cloud.
///
/// Created once and reused for the lifetime of the process.  The
/// underlying `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct RestCloudClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    country: String,
    timeout: Duration,
}

impl RestCloudClient {
    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a new client from the shared `CloudConfig`.
    ///
    /// The auth token is read from the environment variable named by
    /// `cfg.token_env`; a missing variable is not an error (the cloud will
    /// answer 401 and the caller logs it).
    pub fn new(cfg: &CloudConfig) -> Result<Self> {
        let timeout = Duration::from_millis(cfg.timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let token = std::env::var(&cfg.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!(env = %cfg.token_env, "cloud auth token not set");
        }

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            token,
            country: cfg.country.clone(),
            timeout,
        })
    }

    /// Override the auth token (e.g. after an interactive login).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Decorate a `RequestBuilder` with the standard headers.
    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        let trace_id = Uuid::new_v4().to_string();
        let mut rb = rb
            .header("Country", &self.country)
            .header("X-Trace-Id", &trace_id);

        if let Some(ref token) = self.token {
            rb = rb.header("X-Auth-Token", token);
        }
        rb
    }

    /// Build the full URL for a path like `/v1/app/equipment/get_dsk_keys`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl CredentialApi for RestCloudClient {
    async fn fetch_credentials(&self, station_sn: &str) -> Result<ApiResponse> {
        let url = self.url(DSK_KEYS_PATH);
        let req = DskKeysRequest {
            station_sns: vec![station_sn.to_owned()],
        };

        let start = Instant::now();
        let result = self.decorate(self.http.post(&url).json(&req)).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::CloudCall {
                    endpoint: format!("POST {DSK_KEYS_PATH}"),
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    duration_ms,
                }
                .emit();
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status().as_u16();
        TraceEvent::CloudCall {
            endpoint: format!("POST {DSK_KEYS_PATH}"),
            status,
            duration_ms,
        }
        .emit();

        let text = resp.text().await.map_err(from_reqwest)?;
        let body = match serde_json::from_str::<DskKeysResponse>(&text) {
            Ok(b) => Some(b),
            Err(e) => {
                tracing::debug!(status, error = %e, "unparseable credential response body");
                None
            }
        };

        Ok(ApiResponse { status, body })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let cfg = CloudConfig {
            base_url: "http://localhost:9000/api/".into(),
            ..Default::default()
        };
        let client = RestCloudClient::new(&cfg).unwrap();
        assert_eq!(
            client.url(DSK_KEYS_PATH),
            "http://localhost:9000/api/v1/app/equipment/get_dsk_keys"
        );
    }

    #[test]
    fn timeout_comes_from_config() {
        let cfg = CloudConfig {
            timeout_ms: 1234,
            ..Default::default()
        };
        let client = RestCloudClient::new(&cfg).unwrap();
        assert_eq!(client.timeout(), Duration::from_millis(1234));
    }
}
