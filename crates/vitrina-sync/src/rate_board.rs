//! # Rate Board
//!
//! Last-known exchange rates with per-rate loading flags.
//!
//! ## Refresh Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     refresh(kind)                                       │
//! │                                                                         │
//! │   loading = true                                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   source.fetch_rate(kind)                                              │
//! │        │                                                                │
//! │        ├── Ok(v)  ──► value = ExchangeRate(v, now), last_error = None  │
//! │        │                                                                │
//! │        └── Err(e) ──► value UNCHANGED, last_error = e, warn!           │
//! │                                                                         │
//! │   loading = false            (never returns an error to the caller)    │
//! │                                                                         │
//! │   rates() ──► RatePair, dropping values older than max_age             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two rates have independent slots; refreshing one never touches the
//! other.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use vitrina_core::{ExchangeRate, RateKind, RatePair};

use crate::rates::RateSource;

// =============================================================================
// Slot State
// =============================================================================

#[derive(Debug, Clone, Default)]
struct Slot {
    value: Option<ExchangeRate>,
    in_flight: u32,
    last_error: Option<String>,
    last_attempt: Option<DateTime<Utc>>,
}

/// Snapshot of one rate for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSlot {
    pub kind: RateKind,

    /// Last successfully fetched rate, however old.
    pub value: Option<ExchangeRate>,

    /// A fetch for this rate is in flight.
    pub loading: bool,

    /// The last attempt failed ("could not refresh").
    pub last_error: Option<String>,

    pub last_attempt: Option<DateTime<Utc>>,

    /// `value` is older than the staleness ceiling and is not used for
    /// pricing.
    pub stale: bool,
}

// =============================================================================
// Rate Board
// =============================================================================

/// Holds the last-known value of both rates.
pub struct RateBoard {
    source: Arc<dyn RateSource>,
    slots: Mutex<[Slot; 2]>,
    max_age: chrono::Duration,
}

impl RateBoard {
    /// Creates an empty board; both rates start unknown.
    pub fn new(source: Arc<dyn RateSource>, max_age: chrono::Duration) -> Self {
        RateBoard {
            source,
            slots: Mutex::new([Slot::default(), Slot::default()]),
            max_age,
        }
    }

    /// Refreshes one rate. Failures keep the previous value.
    pub async fn refresh(&self, kind: RateKind) -> RateSlot {
        {
            let mut slots = self.lock();
            let slot = &mut slots[index(kind)];
            slot.in_flight += 1;
            slot.last_attempt = Some(Utc::now());
        }

        let result = self.source.fetch_rate(kind).await;

        let mut slots = self.lock();
        let slot = &mut slots[index(kind)];
        slot.in_flight = slot.in_flight.saturating_sub(1);

        match result {
            Ok(value) => {
                debug!(%kind, value, "Exchange rate refreshed");
                slot.value = Some(ExchangeRate::now(kind, value));
                slot.last_error = None;
            }
            Err(e) => {
                warn!(
                    %kind,
                    error = %e,
                    kept = ?slot.value.map(|r| r.value),
                    "Could not refresh exchange rate, keeping last value"
                );
                slot.last_error = Some(e.to_string());
            }
        }

        self.to_snapshot(kind, slot, Utc::now())
    }

    /// Refreshes both rates concurrently.
    pub async fn refresh_all(&self) -> [RateSlot; 2] {
        let (official, informal) = tokio::join!(
            self.refresh(RateKind::Official),
            self.refresh(RateKind::Informal)
        );
        [official, informal]
    }

    /// Stores a known rate directly, e.g. one restored at startup.
    pub fn record(&self, rate: ExchangeRate) {
        let mut slots = self.lock();
        slots[index(rate.kind)].value = Some(rate);
    }

    /// Current state of one rate.
    pub fn snapshot(&self, kind: RateKind) -> RateSlot {
        let slots = self.lock();
        self.to_snapshot(kind, &slots[index(kind)], Utc::now())
    }

    /// Current state of both rates, in display order.
    pub fn status(&self) -> [RateSlot; 2] {
        let slots = self.lock();
        let now = Utc::now();
        RateKind::ALL.map(|kind| self.to_snapshot(kind, &slots[index(kind)], now))
    }

    /// Rates usable for pricing right now.
    pub fn rates(&self) -> RatePair {
        self.rates_at(Utc::now())
    }

    /// Rates usable for pricing at `now`; stale values count as unknown.
    pub fn rates_at(&self, now: DateTime<Utc>) -> RatePair {
        let slots = self.lock();
        let fresh = |kind: RateKind| {
            slots[index(kind)]
                .value
                .filter(|rate| !rate.is_stale(now, self.max_age))
                .map(|rate| rate.value)
        };

        RatePair {
            official: fresh(RateKind::Official),
            informal: fresh(RateKind::Informal),
        }
    }

    /// Staleness ceiling applied by [`RateBoard::rates`].
    pub fn max_age(&self) -> chrono::Duration {
        self.max_age
    }

    fn to_snapshot(&self, kind: RateKind, slot: &Slot, now: DateTime<Utc>) -> RateSlot {
        RateSlot {
            kind,
            value: slot.value,
            loading: slot.in_flight > 0,
            last_error: slot.last_error.clone(),
            last_attempt: slot.last_attempt,
            stale: slot
                .value
                .map(|rate| rate.is_stale(now, self.max_age))
                .unwrap_or(false),
        }
    }

    // Never held across an await.
    fn lock(&self) -> MutexGuard<'_, [Slot; 2]> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn index(kind: RateKind) -> usize {
    match kind {
        RateKind::Official => 0,
        RateKind::Informal => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RateFetchError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    /// Replays scripted results per kind.
    #[derive(Default)]
    struct ScriptedSource {
        official: Mutex<VecDeque<Result<f64, RateFetchError>>>,
        informal: Mutex<VecDeque<Result<f64, RateFetchError>>>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn push(&self, kind: RateKind, result: Result<f64, RateFetchError>) {
            match kind {
                RateKind::Official => self.official.lock().unwrap().push_back(result),
                RateKind::Informal => self.informal.lock().unwrap().push_back(result),
            }
        }
    }

    #[async_trait]
    impl RateSource for ScriptedSource {
        async fn fetch_rate(&self, kind: RateKind) -> Result<f64, RateFetchError> {
            if kind == RateKind::Official {
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
            }
            let next = match kind {
                RateKind::Official => self.official.lock().unwrap().pop_front(),
                RateKind::Informal => self.informal.lock().unwrap().pop_front(),
            };
            next.unwrap_or(Err(RateFetchError::Transport {
                kind,
                message: "script exhausted".into(),
            }))
        }
    }

    fn http_500(kind: RateKind) -> RateFetchError {
        RateFetchError::Http { kind, status: 500 }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_value() {
        let source = Arc::new(ScriptedSource::default());
        source.push(RateKind::Official, Ok(36.5));
        source.push(RateKind::Official, Err(http_500(RateKind::Official)));

        let board = RateBoard::new(source, chrono::Duration::hours(24));

        let first = board.refresh(RateKind::Official).await;
        assert_eq!(first.value.map(|r| r.value), Some(36.5));

        let second = board.refresh(RateKind::Official).await;
        assert_eq!(second.value.map(|r| r.value), Some(36.5));
        assert!(!second.loading);
        assert!(second.last_error.unwrap().contains("500"));
        assert_eq!(board.rates().official, Some(36.5));
    }

    #[tokio::test]
    async fn test_first_load_failure_leaves_unknown() {
        let source = Arc::new(ScriptedSource::default());
        source.push(RateKind::Informal, Err(http_500(RateKind::Informal)));

        let board = RateBoard::new(source, chrono::Duration::hours(24));
        let slot = board.refresh(RateKind::Informal).await;

        assert!(slot.value.is_none());
        assert!(!slot.loading);
        assert_eq!(board.rates(), RatePair::unknown());
    }

    #[tokio::test]
    async fn test_success_clears_error() {
        let source = Arc::new(ScriptedSource::default());
        source.push(RateKind::Informal, Err(http_500(RateKind::Informal)));
        source.push(RateKind::Informal, Ok(80.0));

        let board = RateBoard::new(source, chrono::Duration::hours(24));
        board.refresh(RateKind::Informal).await;
        let slot = board.refresh(RateKind::Informal).await;

        assert!(slot.last_error.is_none());
        assert_eq!(board.rates().informal, Some(80.0));
    }

    #[tokio::test]
    async fn test_rates_refresh_independently() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        source.push(RateKind::Official, Ok(36.5));
        source.push(RateKind::Informal, Ok(80.0));

        let board = Arc::new(RateBoard::new(source, chrono::Duration::hours(24)));

        let official = tokio::spawn({
            let board = board.clone();
            async move { board.refresh(RateKind::Official).await }
        });

        // Informal completes while official is still blocked
        let informal = board.refresh(RateKind::Informal).await;
        assert_eq!(informal.value.map(|r| r.value), Some(80.0));

        while !board.snapshot(RateKind::Official).loading {
            tokio::task::yield_now().await;
        }
        assert_eq!(board.rates(), RatePair {
            official: None,
            informal: Some(80.0)
        });

        gate.notify_one();
        let official = official.await.unwrap();
        assert!(!official.loading);
        assert_eq!(board.rates(), RatePair::known(36.5, 80.0));
    }

    #[tokio::test]
    async fn test_refresh_all_mixed_results() {
        let source = Arc::new(ScriptedSource::default());
        source.push(RateKind::Official, Err(http_500(RateKind::Official)));
        source.push(RateKind::Informal, Ok(79.9));

        let board = RateBoard::new(source, chrono::Duration::hours(24));
        let [official, informal] = board.refresh_all().await;

        assert!(official.last_error.is_some());
        assert_eq!(informal.value.map(|r| r.value), Some(79.9));
        assert!(!board.rates().is_complete());
    }

    #[test]
    fn test_stale_rates_are_unknown_for_pricing() {
        let board = RateBoard::new(
            Arc::new(ScriptedSource::default()),
            chrono::Duration::hours(24),
        );

        let fetched_at = Utc::now() - chrono::Duration::hours(30);
        board.record(ExchangeRate {
            kind: RateKind::Official,
            value: 36.5,
            fetched_at,
        });
        board.record(ExchangeRate::now(RateKind::Informal, 80.0));

        let pair = board.rates();
        assert_eq!(pair.official, None);
        assert_eq!(pair.informal, Some(80.0));

        // Raw value is still visible for display
        let slot = board.snapshot(RateKind::Official);
        assert!(slot.stale);
        assert_eq!(slot.value.map(|r| r.value), Some(36.5));

        // Within the ceiling at an earlier instant
        let earlier = fetched_at + chrono::Duration::hours(1);
        assert_eq!(board.rates_at(earlier).official, Some(36.5));
    }
}
