//! Lazily refreshed session key for one station.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sl_domain::trace::TraceEvent;

use crate::api::CredentialApi;

/// Session key and its expiry.  Replaced wholesale on refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A credential is usable when it has a key that has not expired.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.key.is_empty() && self.expires_at.is_some_and(|exp| exp > now)
    }
}

/// Holds the session key for a single station and refreshes it from the
/// cloud when it is missing or expired.
///
/// Refresh is lazy: it only happens when [`ensure_fresh`](Self::ensure_fresh)
/// is called (once per connect attempt).
pub struct CredentialCache {
    station_sn: String,
    api: Arc<dyn CredentialApi>,
    current: Credential,
}

impl CredentialCache {
    pub fn new(station_sn: impl Into<String>, api: Arc<dyn CredentialApi>) -> Self {
        Self {
            station_sn: station_sn.into(),
            api,
            current: Credential::default(),
        }
    }

    /// The credential as currently held, without refreshing.
    pub fn current(&self) -> &Credential {
        &self.current
    }

    /// Refresh the credential if needed and return the (possibly stale)
    /// result.  Never fails: errors are logged and the previous state kept.
    pub async fn ensure_fresh(&mut self) -> Credential {
        self.ensure_fresh_at(Utc::now()).await
    }

    /// Same as [`ensure_fresh`](Self::ensure_fresh) with an explicit clock.
    pub async fn ensure_fresh_at(&mut self, now: DateTime<Utc>) -> Credential {
        if self.current.is_fresh(now) {
            return self.current.clone();
        }

        let station = self.station_sn.clone();
        let resp = match self.api.fetch_credentials(&station).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(station = %station, error = %e, "credential refresh failed");
                return self.current.clone();
            }
        };

        if resp.status != 200 {
            tracing::warn!(
                station = %station,
                status = resp.status,
                "credential refresh returned non-success status"
            );
            return self.current.clone();
        }

        let Some(body) = resp.body else {
            tracing::warn!(station = %station, "credential refresh returned no body");
            return self.current.clone();
        };

        if body.code != 0 {
            tracing::warn!(
                station = %station,
                code = body.code,
                msg = %body.msg,
                "credential refresh rejected by cloud"
            );
            return self.current.clone();
        }

        let Some(entry) = body.key_for(&station) else {
            tracing::warn!(station = %station, "credential response has no key for station");
            return self.current.clone();
        };

        let Some(expires_at) = DateTime::from_timestamp(entry.expiration, 0) else {
            tracing::warn!(
                station = %station,
                expiration = entry.expiration,
                "credential expiry out of range"
            );
            return self.current.clone();
        };

        self.current = Credential {
            key: entry.dsk_key.clone(),
            expires_at: Some(expires_at),
        };

        TraceEvent::CredentialRefreshed {
            station: station.clone(),
            expires_at: expires_at.timestamp(),
        }
        .emit();

        self.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sl_domain::error::{Error, Result};

    use crate::types::{ApiResponse, DskKey, DskKeysData, DskKeysResponse};

    /// Test double returning a scripted response and counting calls.
    struct ScriptedApi {
        calls: AtomicUsize,
        respond: Box<dyn Fn() -> Result<ApiResponse> + Send + Sync>,
    }

    impl ScriptedApi {
        fn new(respond: impl Fn() -> Result<ApiResponse> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                respond: Box::new(respond),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialApi for ScriptedApi {
        async fn fetch_credentials(&self, _station_sn: &str) -> Result<ApiResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)()
        }
    }

    fn ok_response(key: &str, expiration: i64) -> Result<ApiResponse> {
        Ok(ApiResponse {
            status: 200,
            body: Some(DskKeysResponse {
                code: 0,
                msg: "Succeed.".into(),
                data: Some(DskKeysData {
                    dsk_keys: vec![DskKey {
                        station_sn: "T8010P1".into(),
                        dsk_key: key.into(),
                        expiration,
                        about_to_be_replaced: false,
                    }],
                    enabled: true,
                }),
            }),
        })
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn fetches_when_empty() {
        let api = ScriptedApi::new(|| ok_response("k1", 2_000));
        let mut cache = CredentialCache::new("T8010P1", api.clone());

        let cred = cache.ensure_fresh_at(at(1_000)).await;
        assert_eq!(cred.key, "k1");
        assert_eq!(cred.expires_at, Some(at(2_000)));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn fresh_credential_is_not_refetched() {
        let api = ScriptedApi::new(|| ok_response("k1", 2_000));
        let mut cache = CredentialCache::new("T8010P1", api.clone());

        cache.ensure_fresh_at(at(1_000)).await;
        cache.ensure_fresh_at(at(1_500)).await;
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn expired_credential_is_refetched() {
        let api = ScriptedApi::new(|| ok_response("k1", 2_000));
        let mut cache = CredentialCache::new("T8010P1", api.clone());

        cache.ensure_fresh_at(at(1_000)).await;
        cache.ensure_fresh_at(at(2_500)).await;
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn transport_error_keeps_previous_state() {
        let api = ScriptedApi::new(|| Err(Error::Http("connection refused".into())));
        let mut cache = CredentialCache::new("T8010P1", api.clone());

        let cred = cache.ensure_fresh_at(at(1_000)).await;
        assert_eq!(cred, Credential::default());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn non_200_status_is_failure() {
        let api = ScriptedApi::new(|| {
            Ok(ApiResponse {
                status: 401,
                body: None,
            })
        });
        let mut cache = CredentialCache::new("T8010P1", api);
        assert!(cache.ensure_fresh_at(at(1_000)).await.key.is_empty());
    }

    #[tokio::test]
    async fn non_zero_code_keeps_stale_key() {
        let first = std::sync::Mutex::new(true);
        let api = ScriptedApi::new(move || {
            let mut first = first.lock().unwrap();
            if *first {
                *first = false;
                ok_response("old", 2_000)
            } else {
                Ok(ApiResponse {
                    status: 200,
                    body: Some(DskKeysResponse {
                        code: 26006,
                        msg: "token expired".into(),
                        data: None,
                    }),
                })
            }
        });
        let mut cache = CredentialCache::new("T8010P1", api);

        cache.ensure_fresh_at(at(1_000)).await;
        let cred = cache.ensure_fresh_at(at(3_000)).await;
        assert_eq!(cred.key, "old");
        assert!(!cred.is_fresh(at(3_000)));
    }
}
