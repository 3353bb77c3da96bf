//! Crew Pipeline
//!
//! The same three steps run as a crew task graph:
//!
//! ```text
//! fetch_prices ──▶ assess_risk ──▶ generate_portfolio
//! ```
//!
//! Requires valid crew credentials; building or running the crew fails
//! without them, and the orchestrator falls back to the deterministic path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use agent_core::{Crew, CrewBuilder, CrewCredentials, CrewOutput, Task};

use super::{PipelineParts, PipelineStrategy, assemble};
use crate::error::{AdvisorError, Result};
use crate::market::MarketDataProvider;
use crate::model::{PipelineRequest, PortfolioResult, StrategyKind};
use crate::svckit::{
    ALLOCATE_TASK, ASSESS_TASK, FETCH_TASK, PortfolioGeneratorTool, PriceHistoryTool, RiskAssessmentTool,
};

/// Slack on top of the market fetch timeout for the fetch task
const TASK_GRACE: Duration = Duration::from_secs(5);

pub struct CrewPipeline {
    crew: Crew,
}

impl CrewPipeline {
    /// Build the crew; fails on missing or malformed credentials
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        fetch_timeout: Duration,
        credentials: CrewCredentials,
    ) -> Result<Self> {
        let crew = CrewBuilder::new()
            .credentials(credentials)
            .task_timeout(fetch_timeout + TASK_GRACE)
            .tool(PriceHistoryTool::new(market, fetch_timeout))
            .tool(RiskAssessmentTool::new())
            .tool(PortfolioGeneratorTool::new())
            .task(
                Task::new(FETCH_TASK, "price_history")
                    .description("Collect daily price history for the requested universe"),
            )
            .task(
                Task::new(ASSESS_TASK, "risk_assessment")
                    .description("Score each symbol by volatility of simple returns")
                    .context(&[FETCH_TASK]),
            )
            .task(
                Task::new(ALLOCATE_TASK, "portfolio_generator")
                    .description("Weight symbols by inverse volatility")
                    .context(&[ASSESS_TASK]),
            )
            .build()?;

        Ok(Self { crew })
    }

    fn task_data<T: DeserializeOwned>(output: &CrewOutput, task: &str) -> Result<T> {
        let data = output
            .get(task)
            .and_then(|t| t.data.clone())
            .ok_or_else(|| AdvisorError::Pipeline(format!("crew task '{}' produced no data", task)))?;
        Ok(serde_json::from_value(data)?)
    }
}

#[async_trait]
impl PipelineStrategy for CrewPipeline {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Crew
    }

    async fn run_pipeline(&self, request: &PipelineRequest) -> Result<PortfolioResult> {
        let mut inputs = HashMap::new();
        inputs.insert("symbols".to_string(), serde_json::to_value(&request.symbols)?);
        inputs.insert("lookback_days".to_string(), serde_json::json!(request.lookback_days));

        let output = self.crew.kickoff(inputs).await?;
        tracing::debug!(run_id = %output.run_id, tasks = ?self.crew.task_names(), "Crew run complete");

        let parts = PipelineParts {
            prices: Self::task_data(&output, FETCH_TASK)?,
            report: Self::task_data(&output, ASSESS_TASK)?,
            weights: Self::task_data(&output, ALLOCATE_TASK)?,
        };

        Ok(assemble(request, parts, self.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockMarketData;
    use crate::model::RiskLevel;
    use crate::pipeline::DeterministicPipeline;
    use rust_decimal_macros::dec;

    fn request(symbols: &[&str]) -> PipelineRequest {
        PipelineRequest {
            symbols: symbols.iter().map(|s| (*s).to_string()).collect(),
            lookback_days: 120,
            budget: dec!(5000),
            risk_level: RiskLevel::Low,
        }
    }

    #[test]
    fn test_rejects_bad_credentials() {
        let market: Arc<dyn MarketDataProvider> = Arc::new(MockMarketData::new());
        assert!(CrewPipeline::new(market.clone(), Duration::from_secs(1), CrewCredentials::new("")).is_err());
        assert!(CrewPipeline::new(market, Duration::from_secs(1), CrewCredentials::new("short")).is_err());
    }

    #[tokio::test]
    async fn test_matches_deterministic_pipeline() {
        let market: Arc<dyn MarketDataProvider> = Arc::new(
            MockMarketData::new().with_series("GAPPY", &[50.0, f64::NAN, 51.0, 49.5, 52.25]),
        );
        let symbols = ["AAPL", "TSLA", "JNJ", "GAPPY", "NOPE"];

        let crew = CrewPipeline::new(market.clone(), Duration::from_secs(5), CrewCredentials::new("crew-test-key"))
            .unwrap();
        let plain = DeterministicPipeline::new(market, Duration::from_secs(5));

        let a = crew.run_pipeline(&request(&symbols)).await.unwrap();
        let b = plain.run_pipeline(&request(&symbols)).await.unwrap();

        assert_eq!(a.diagnostics.strategy, StrategyKind::Crew);
        assert_eq!(b.diagnostics.strategy, StrategyKind::Deterministic);
        assert_eq!(a.weights.len(), 4);
        for (symbol, w) in &b.weights {
            assert_eq!(w.to_bits(), a.weights[symbol].to_bits(), "{}", symbol);
        }
        assert_eq!(a.holdings, b.holdings);
        assert_eq!(a.diagnostics.omitted_symbols, vec!["NOPE".to_string()]);
    }
}
