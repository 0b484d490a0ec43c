//! Exchange-rate commands.
//!
//! Rate failures never surface as errors here: a failed refresh keeps the
//! last value and reports it through `RateSlot::last_error`.

use serde::Serialize;
use tracing::debug;
use vitrina_core::RatePair;
use vitrina_sync::RateSlot;

use crate::error::ApiError;
use crate::state::RatesState;

/// Both rates as the header shows them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesDto {
    pub official: RateSlot,
    pub informal: RateSlot,
    /// Values actually used for pricing (stale ones dropped).
    pub pricing: RatePair,
}

impl From<[RateSlot; 2]> for RatesDto {
    fn from(slots: [RateSlot; 2]) -> Self {
        let [official, informal] = slots;
        let pricing = RatePair {
            official: official.value.filter(|_| !official.stale).map(|r| r.value),
            informal: informal.value.filter(|_| !informal.stale).map(|r| r.value),
        };
        RatesDto {
            official,
            informal,
            pricing,
        }
    }
}

/// Current state of both rates, without fetching.
pub async fn get_rates(rates: &RatesState) -> Result<RatesDto, ApiError> {
    Ok(rates.board().status().into())
}

/// Fetches both rates now and waits for the results.
pub async fn refresh_rates(rates: &RatesState) -> Result<RatesDto, ApiError> {
    debug!("refresh_rates");
    Ok(rates.board().refresh_all().await.into())
}

/// Asks the background agent for a refresh without waiting for it.
///
/// Without an agent the refresh runs inline.
pub async fn request_refresh(rates: &RatesState) -> Result<(), ApiError> {
    match rates.agent() {
        Some(agent) => agent.refresh_now().await?,
        None => {
            rates.board().refresh_all().await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::offline_rates;
    use vitrina_core::{ExchangeRate, RateKind};

    #[tokio::test]
    async fn test_failed_refresh_keeps_values() {
        let rates = offline_rates();
        rates.board().record(ExchangeRate::now(RateKind::Official, 36.5));

        let dto = refresh_rates(&rates).await.unwrap();

        assert_eq!(dto.official.value.map(|r| r.value), Some(36.5));
        assert!(dto.official.last_error.is_some());
        assert!(!dto.official.loading);
        assert_eq!(dto.pricing.official, Some(36.5));
        assert_eq!(dto.pricing.informal, None);
    }

    #[tokio::test]
    async fn test_get_rates_before_any_fetch() {
        let rates = offline_rates();
        let dto = get_rates(&rates).await.unwrap();

        assert_eq!(dto.official.kind, RateKind::Official);
        assert_eq!(dto.informal.kind, RateKind::Informal);
        assert!(dto.official.value.is_none());
        assert!(!dto.pricing.is_complete());
    }

    #[tokio::test]
    async fn test_request_refresh_without_agent() {
        let rates = offline_rates();
        request_refresh(&rates).await.unwrap();
        assert!(rates.board().snapshot(RateKind::Informal).last_attempt.is_some());
    }
}
