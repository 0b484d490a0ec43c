//! # Rate Provider
//!
//! Fetches the two exchange rates from their HTTP endpoints.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Rate Provider                                   │
//! │                                                                         │
//! │   official_url ──GET──► { "promedio": 36.4987, ... }                   │
//! │                         └─► field lookup ─► round(2) ─► 36.50          │
//! │                                                                         │
//! │   informal_url ──GET──► { "ask": 80.2, "bid": 79.8, ... }              │
//! │                         └─► mean(ask, bid) ─► 80.0                     │
//! │                             (or whichever is present)                  │
//! │                                                                         │
//! │   Each call is independent and bounded by the client timeout.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fetch failures are returned as [`RateFetchError`]; deciding what to keep
//! on failure is the job of [`crate::rate_board::RateBoard`].

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;
use vitrina_core::RateKind;

use crate::config::RateSettings;
use crate::error::{RateFetchError, SyncError, SyncResult};

/// User agent sent to the rate endpoints.
const USER_AGENT: &str = concat!("vitrina/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Rate Source Trait
// =============================================================================

/// Anything that can produce a current rate for a kind.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the current value of one rate.
    async fn fetch_rate(&self, kind: RateKind) -> Result<f64, RateFetchError>;
}

// =============================================================================
// HTTP Rate Provider
// =============================================================================

/// Fetches rates over HTTP with an injected `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct RateProvider {
    client: reqwest::Client,
    official_url: Url,
    informal_url: Url,
    official_field: String,
}

impl RateProvider {
    /// Builds a provider with its own client, bounded by `settings.timeout()`.
    pub fn new(settings: &RateSettings) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::HttpClient(e.to_string()))?;

        Self::with_client(client, settings)
    }

    /// Builds a provider around an existing client.
    pub fn with_client(client: reqwest::Client, settings: &RateSettings) -> SyncResult<Self> {
        Ok(RateProvider {
            client,
            official_url: Url::parse(&settings.official_url)?,
            informal_url: Url::parse(&settings.informal_url)?,
            official_field: settings.official_field.clone(),
        })
    }

    /// Fetches the official (BCV) rate, rounded to 2 decimals.
    pub async fn fetch_official_rate(&self) -> Result<f64, RateFetchError> {
        let kind = RateKind::Official;
        let body = self.get_json(kind, &self.official_url).await?;

        let value = lookup_path(&body, &self.official_field)
            .and_then(as_number)
            .ok_or_else(|| RateFetchError::MissingField {
                kind,
                field: self.official_field.clone(),
            })?;

        let value = check_value(kind, value)?;
        Ok((value * 100.0).round() / 100.0)
    }

    /// Fetches the informal (USDT) rate as the mean of `ask` and `bid`.
    pub async fn fetch_informal_rate(&self) -> Result<f64, RateFetchError> {
        let kind = RateKind::Informal;
        let body = self.get_json(kind, &self.informal_url).await?;

        let ask = body.get("ask").and_then(as_number);
        let bid = body.get("bid").and_then(as_number);

        let value = match (ask, bid) {
            (Some(ask), Some(bid)) => (ask + bid) / 2.0,
            (Some(one), None) | (None, Some(one)) => one,
            (None, None) => {
                return Err(RateFetchError::MissingField {
                    kind,
                    field: "ask/bid".to_string(),
                })
            }
        };

        check_value(kind, value)
    }

    async fn get_json(&self, kind: RateKind, url: &Url) -> Result<Value, RateFetchError> {
        debug!(%kind, %url, "Fetching exchange rate");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(kind, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateFetchError::Http {
                kind,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(kind, e))?;

        serde_json::from_slice(&bytes).map_err(|e| RateFetchError::Decode {
            kind,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl RateSource for RateProvider {
    async fn fetch_rate(&self, kind: RateKind) -> Result<f64, RateFetchError> {
        match kind {
            RateKind::Official => self.fetch_official_rate().await,
            RateKind::Informal => self.fetch_informal_rate().await,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn transport_error(kind: RateKind, err: reqwest::Error) -> RateFetchError {
    if err.is_timeout() {
        RateFetchError::Timeout { kind }
    } else {
        RateFetchError::Transport {
            kind,
            message: err.to_string(),
        }
    }
}

/// Follows a dotted path (`"rates.usd"`) into nested objects.
fn lookup_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(body, |value, key| value.get(key.trim()))
}

/// Accepts JSON numbers and numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn check_value(kind: RateKind, value: f64) -> Result<f64, RateFetchError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RateFetchError::InvalidValue { kind, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> RateSettings {
        RateSettings {
            official_url: format!("{}/oficial", server.uri()),
            informal_url: format!("{}/usdt", server.uri()),
            timeout_secs: 2,
            ..RateSettings::default()
        }
    }

    #[tokio::test]
    async fn test_official_rate_rounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oficial"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "fuente": "oficial", "promedio": 36.4987 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = RateProvider::new(&settings_for(&server)).unwrap();
        let rate = provider.fetch_official_rate().await.unwrap();
        assert_eq!(rate, 36.5);
    }

    #[tokio::test]
    async fn test_official_rate_numeric_string_and_nested_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oficial"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "rates": { "usd": "36.123" } })),
            )
            .mount(&server)
            .await;

        let mut settings = settings_for(&server);
        settings.official_field = "rates.usd".into();

        let provider = RateProvider::new(&settings).unwrap();
        assert_eq!(provider.fetch_official_rate().await.unwrap(), 36.12);
    }

    #[tokio::test]
    async fn test_official_rate_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = RateProvider::new(&settings_for(&server)).unwrap();
        let err = provider.fetch_official_rate().await.unwrap_err();
        assert_eq!(
            err,
            RateFetchError::Http {
                kind: RateKind::Official,
                status: 500
            }
        );
    }

    #[tokio::test]
    async fn test_official_rate_missing_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promedio": null })))
            .mount(&server)
            .await;

        let provider = RateProvider::new(&settings_for(&server)).unwrap();
        let err = provider.fetch_official_rate().await.unwrap_err();
        assert!(matches!(err, RateFetchError::MissingField { kind: RateKind::Official, .. }));
    }

    #[tokio::test]
    async fn test_informal_rate_mean_and_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/usdt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ask": 81.0, "totalAsk": 81.2, "bid": 79.0 })),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/usdt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bid": 79.5 })))
            .mount(&server)
            .await;

        let provider = RateProvider::new(&settings_for(&server)).unwrap();
        assert_eq!(provider.fetch_informal_rate().await.unwrap(), 80.0);
        assert_eq!(provider.fetch_informal_rate().await.unwrap(), 79.5);
    }

    #[tokio::test]
    async fn test_informal_rate_neither_quote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "time": 1 })))
            .mount(&server)
            .await;

        let provider = RateProvider::new(&settings_for(&server)).unwrap();
        let err = provider.fetch_rate(RateKind::Informal).await.unwrap_err();
        assert_eq!(err.kind(), RateKind::Informal);
        assert!(matches!(err, RateFetchError::MissingField { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_and_negative_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oficial"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/usdt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ask": -3.0 })))
            .mount(&server)
            .await;

        let provider = RateProvider::new(&settings_for(&server)).unwrap();
        assert!(matches!(
            provider.fetch_official_rate().await,
            Err(RateFetchError::Decode { .. })
        ));
        assert!(matches!(
            provider.fetch_informal_rate().await,
            Err(RateFetchError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "promedio": 36.5 }))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let provider = RateProvider::with_client(client, &settings_for(&server)).unwrap();

        let err = provider.fetch_official_rate().await.unwrap_err();
        assert_eq!(
            err,
            RateFetchError::Timeout {
                kind: RateKind::Official
            }
        );
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(&json!(1.5)), Some(1.5));
        assert_eq!(as_number(&json!(" 2.25 ")), Some(2.25));
        assert_eq!(as_number(&json!("n/a")), None);
        assert_eq!(as_number(&json!(true)), None);
    }
}
