//! Mock Market Data
//!
//! For testing and demo purposes. Serves deterministic synthetic histories
//! for the default universe plus any series injected by the caller.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::MarketDataProvider;
use crate::error::{AdvisorError, Result};
use crate::model::{DEFAULT_UNIVERSE, PriceSeries};

const SECS_PER_DAY: i64 = 86_400;

/// Deterministic in-memory provider
pub struct MockMarketData {
    custom: BTreeMap<String, Vec<f64>>,
    builtin: bool,
    reachable: bool,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketData {
    /// Provider serving the built-in synthetic universe
    pub fn new() -> Self {
        Self {
            custom: BTreeMap::new(),
            builtin: true,
            reachable: true,
        }
    }

    /// Provider that only knows injected series
    pub fn empty() -> Self {
        Self {
            builtin: false,
            ..Self::new()
        }
    }

    /// Provider whose every request fails, like a source that is down
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Serve exactly `prices` (one per day, ending today) for `symbol`
    pub fn with_series(mut self, symbol: &str, prices: &[f64]) -> Self {
        self.custom.insert(symbol.to_uppercase(), prices.to_vec());
        self
    }

    fn today() -> DateTime<Utc> {
        let now = Utc::now().timestamp();
        DateTime::from_timestamp(now - now.rem_euclid(SECS_PER_DAY), 0).unwrap_or_default()
    }

    /// Synthetic closes: a seeded oscillating walk, one point per trading day
    fn synthetic(symbol: &str, lookback_days: u32) -> Vec<f64> {
        let seed = symbol
            .bytes()
            .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));

        let points = (lookback_days as usize * 5 / 7).max(2);
        let volatility = 0.004 + f64::from(seed % 24) / 1000.0;
        let drift = (f64::from(seed % 7) - 2.0) / 10_000.0;
        let phase = f64::from(seed % 360).to_radians();
        let mut price = 40.0 + f64::from(seed % 400);

        let mut closes = Vec::with_capacity(points);
        for t in 0..points {
            closes.push((price * 100.0).round() / 100.0);
            #[allow(clippy::cast_precision_loss)]
            let x = t as f64;
            let shock = (x * 0.9 + phase).sin() + 0.5 * (x * 2.3 + phase * 2.0).cos();
            price *= 1.0 + drift + volatility * shock;
        }
        closes
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn fetch_history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries> {
        if !self.reachable {
            return Err(AdvisorError::MarketData("mock source is unreachable".into()));
        }

        let symbol = symbol.to_uppercase();
        let prices = if let Some(prices) = self.custom.get(&symbol) {
            prices.clone()
        } else if self.builtin && DEFAULT_UNIVERSE.contains(&symbol.as_str()) {
            Self::synthetic(&symbol, lookback_days)
        } else {
            return Err(AdvisorError::UnknownSymbol(symbol));
        };

        let days = i64::try_from(prices.len()).unwrap_or(i64::MAX);
        let start = Self::today() - Duration::days(days.saturating_sub(1));
        Ok(PriceSeries::daily(symbol, start, &prices))
    }

    async fn health_check(&self) -> bool {
        self.reachable
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
