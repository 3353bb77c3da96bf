//! Pipeline Strategies
//!
//! fetch → assess → allocate, behind one trait with two implementations:
//! a plain in-process sequence and a crew-run task graph. Both produce the
//! same `PortfolioResult` shape through [`assemble`].

mod deterministic;
#[cfg(feature = "crew")]
mod crew;

pub use deterministic::DeterministicPipeline;
#[cfg(feature = "crew")]
pub use crew::CrewPipeline;

use async_trait::async_trait;
use chrono::Utc;

use crate::chart::CHART_TAIL;
use crate::error::Result;
use crate::model::{
    Diagnostics, PipelineRequest, PortfolioResult, PortfolioStatus, PriceChart, PriceTable, RiskReport,
    StrategyKind, Weights,
};
use crate::strategy::plan_holdings;

/// One way of running the advisory pipeline
#[async_trait]
pub trait PipelineStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn run_pipeline(&self, request: &PipelineRequest) -> Result<PortfolioResult>;
}

/// Intermediate outputs of a pipeline run
#[derive(Clone, Debug, Default)]
pub struct PipelineParts {
    pub prices: PriceTable,
    pub report: RiskReport,
    pub weights: Weights,
}

/// Package pipeline outputs into a result
pub fn assemble(request: &PipelineRequest, parts: PipelineParts, kind: StrategyKind) -> PortfolioResult {
    let PipelineParts { prices, report, weights } = parts;

    let omitted_symbols = request
        .symbols
        .iter()
        .filter(|s| !prices.contains_key(*s))
        .cloned()
        .collect();

    let status = if weights.is_empty() {
        PortfolioStatus::InsufficientData
    } else {
        PortfolioStatus::Complete
    };

    PortfolioResult {
        request_id: uuid::Uuid::new_v4().to_string(),
        status,
        holdings: plan_holdings(request.budget, &weights, &prices),
        prices: PriceChart::from_table(&prices, CHART_TAIL),
        diagnostics: Diagnostics {
            strategy: kind,
            fallback_reason: None,
            requested: request.symbols.clone(),
            omitted_symbols,
            insufficient_history: report.insufficient_history.clone(),
            lookback_days: request.lookback_days,
        },
        weights,
        risk_report: report,
        explanation: None,
        generated_at: Utc::now(),
    }
}
