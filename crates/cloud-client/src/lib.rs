//! `sl-cloud`: cloud credential client for stationlink.
//!
//! Provides the [`CredentialApi`] trait abstracting the vendor cloud's key
//! endpoint, a production REST implementation ([`RestCloudClient`]), typed
//! DTOs, and the [`CredentialCache`] that keeps one station's session key
//! fresh.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sl_domain::config::CloudConfig;
//! use sl_cloud::{CredentialCache, RestCloudClient};
//!
//! # async fn example() -> sl_domain::error::Result<()> {
//! let api = Arc::new(RestCloudClient::new(&CloudConfig::default())?);
//! let mut cache = CredentialCache::new("T8010P00000001", api);
//!
//! let credential = cache.ensure_fresh().await;
//! println!("key present: {}", !credential.key.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod credentials;
pub mod rest;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use api::CredentialApi;
pub use credentials::{Credential, CredentialCache};
pub use rest::{from_reqwest, RestCloudClient};
pub use types::{ApiResponse, DskKey, DskKeysData, DskKeysRequest, DskKeysResponse};
