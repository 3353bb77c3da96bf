//! Deterministic Pipeline
//!
//! Runs every step in process, in order. Always available.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{PipelineParts, PipelineStrategy, assemble};
use crate::error::Result;
use crate::market::{MarketDataProvider, fetch_bounded};
use crate::model::{PipelineRequest, PortfolioResult, StrategyKind};
use crate::risk::RiskAssessor;
use crate::strategy::PortfolioGenerator;

pub struct DeterministicPipeline {
    market: Arc<dyn MarketDataProvider>,
    fetch_timeout: Duration,
    assessor: RiskAssessor,
    generator: PortfolioGenerator,
}

impl DeterministicPipeline {
    pub fn new(market: Arc<dyn MarketDataProvider>, fetch_timeout: Duration) -> Self {
        Self {
            market,
            fetch_timeout,
            assessor: RiskAssessor::new(),
            generator: PortfolioGenerator::new(),
        }
    }
}

#[async_trait]
impl PipelineStrategy for DeterministicPipeline {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Deterministic
    }

    async fn run_pipeline(&self, request: &PipelineRequest) -> Result<PortfolioResult> {
        let prices = fetch_bounded(
            self.market.as_ref(),
            &request.symbols,
            request.lookback_days,
            self.fetch_timeout,
        )
        .await;
        tracing::debug!(fetched = prices.len(), requested = request.symbols.len(), "Prices fetched");

        let report = self.assessor.assess_universe(&prices);
        let weights = self.generator.allocate(&report.scores());

        Ok(assemble(
            request,
            PipelineParts { prices, report, weights },
            self.kind(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;
    use crate::model::{PortfolioStatus, RiskLevel};
    use rust_decimal_macros::dec;

    fn request(symbols: &[&str]) -> PipelineRequest {
        PipelineRequest {
            symbols: symbols.iter().map(|s| (*s).to_string()).collect(),
            lookback_days: 180,
            budget: dec!(10000),
            risk_level: RiskLevel::Moderate,
        }
    }

    fn pipeline(market: MockMarketData) -> DeterministicPipeline {
        DeterministicPipeline::new(Arc::new(market), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_single_symbol_takes_full_weight() {
        let market = MockMarketData::empty().with_series("AAA", &[100.0, 110.0, 99.0, 105.0]);
        let result = pipeline(market).run_pipeline(&request(&["AAA"])).await.unwrap();

        assert_eq!(result.status, PortfolioStatus::Complete);
        assert_eq!(result.weights.len(), 1);
        assert_eq!(result.weights["AAA"], 1.0);
        // 10000 / 105 → 95 shares
        assert_eq!(result.holdings.holdings[0].shares, 95);
        assert_eq!(result.holdings.remaining, dec!(25.00));
    }

    #[tokio::test]
    async fn test_short_history_excluded_and_missing_omitted() {
        let market = MockMarketData::empty()
            .with_series("AAA", &[100.0, 101.0, 99.5, 100.2])
            .with_series("NEW", &[42.0]);
        let result = pipeline(market)
            .run_pipeline(&request(&["AAA", "NEW", "GONE"]))
            .await
            .unwrap();

        assert_eq!(result.weights.keys().collect::<Vec<_>>(), vec!["AAA"]);
        assert_eq!(result.diagnostics.insufficient_history, vec!["NEW".to_string()]);
        assert_eq!(result.diagnostics.omitted_symbols, vec!["GONE".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_source_gives_empty_result() {
        let result = pipeline(MockMarketData::unreachable())
            .run_pipeline(&request(&["AAPL", "MSFT"]))
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.status, PortfolioStatus::InsufficientData);
        assert_eq!(result.holdings.remaining, dec!(10000));
        assert_eq!(result.diagnostics.omitted_symbols.len(), 2);
    }

    #[tokio::test]
    async fn test_runs_are_bit_identical() {
        let symbols = ["AAPL", "MSFT", "GOOGL", "XOM", "JPM"];
        let p = pipeline(MockMarketData::new());

        let first = p.run_pipeline(&request(&symbols)).await.unwrap();
        let second = p.run_pipeline(&request(&symbols)).await.unwrap();

        assert_eq!(first.weights.len(), 5);
        for (symbol, w) in &first.weights {
            assert_eq!(w.to_bits(), second.weights[symbol].to_bits());
        }
        let sum: f64 = first.weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
