//! Market Data
//!
//! Providers of historical price series (Strategy pattern).
//! Failures are per symbol: a symbol that cannot be fetched is left out of
//! the table, and an unreachable source simply yields an empty table.

mod mock;
mod yahoo;

pub use mock::MockMarketData;
pub use yahoo::YahooFinanceClient;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::Result;
use crate::model::{PriceSeries, PriceTable, Symbol};

/// Market data provider trait
///
/// Implement this for each data vendor.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily history for one symbol covering the last `lookback_days`
    async fn fetch_history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries>;

    /// History for every symbol that can be fetched before `deadline`
    ///
    /// Symbols still pending when the deadline passes are omitted; the ones
    /// already fetched are kept.
    async fn fetch_universe(&self, symbols: &[Symbol], lookback_days: u32, deadline: Instant) -> PriceTable {
        let mut table = PriceTable::new();
        for (i, symbol) in symbols.iter().enumerate() {
            match tokio::time::timeout_at(deadline, self.fetch_history(symbol, lookback_days)).await {
                Ok(Ok(series)) if !series.is_empty() => {
                    tracing::debug!(symbol = %symbol, points = series.len(), "Fetched history");
                    table.insert(symbol.clone(), series);
                }
                Ok(Ok(_)) => tracing::warn!(symbol = %symbol, "Empty price history, omitting"),
                Ok(Err(e)) => tracing::warn!(symbol = %symbol, error = %e, "Fetch failed, omitting"),
                Err(_) => {
                    tracing::warn!(
                        provider = self.name(),
                        fetched = table.len(),
                        omitted = symbols.len() - i,
                        "Market data deadline reached, omitting remaining symbols"
                    );
                    break;
                }
            }
        }
        table
    }

    /// Check if the source is reachable
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}

/// `fetch_universe` with a deadline `timeout` from now
pub async fn fetch_bounded(
    provider: &dyn MarketDataProvider,
    symbols: &[Symbol],
    lookback_days: u32,
    timeout: Duration,
) -> PriceTable {
    provider
        .fetch_universe(symbols, lookback_days, Instant::now() + timeout)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;

    /// Answers every symbol after `delay`; "HANG" never answers in time
    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait]
    impl MarketDataProvider for SlowProvider {
        async fn fetch_history(&self, symbol: &str, _lookback_days: u32) -> Result<PriceSeries> {
            let delay = if symbol == "HANG" { Duration::from_secs(5) } else { self.delay };
            tokio::time::sleep(delay).await;
            if symbol == "NOPE" {
                return Err(AdvisorError::NoData(symbol.into()));
            }
            Ok(PriceSeries::daily(symbol, chrono::Utc::now(), &[10.0, 11.0, 12.0]))
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn symbols(names: &[&str]) -> Vec<Symbol> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_failing_symbols_are_omitted() {
        let provider = MockMarketData::new().with_series("ONE", &[1.0, 2.0, 3.0]);

        let table = fetch_bounded(&provider, &symbols(&["ONE", "NOPE"]), 30, Duration::from_secs(5)).await;

        assert_eq!(table.len(), 1);
        assert!(table.contains_key("ONE"));
    }

    #[tokio::test]
    async fn test_timeout_yields_empty_table() {
        let provider = SlowProvider { delay: Duration::from_millis(1) };

        let table = fetch_bounded(&provider, &symbols(&["HANG"]), 30, Duration::from_millis(20)).await;

        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_deadline_keeps_symbols_already_fetched() {
        let provider = SlowProvider { delay: Duration::from_millis(5) };
        let requested = symbols(&["AAA", "NOPE", "BBB", "HANG", "CCC"]);

        let table = fetch_bounded(&provider, &requested, 30, Duration::from_millis(300)).await;

        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["AAA", "BBB"]);
    }

    #[tokio::test]
    async fn test_slow_but_healthy_source_is_partially_kept() {
        let provider = SlowProvider { delay: Duration::from_millis(40) };
        let requested: Vec<Symbol> = (0..10).map(|i| format!("S{}", i)).collect();

        let table = fetch_bounded(&provider, &requested, 30, Duration::from_millis(200)).await;

        assert!(!table.is_empty());
        assert!(table.len() < requested.len());
    }
}
