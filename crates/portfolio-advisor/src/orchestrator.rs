//! Orchestrator
//!
//! Validates a request, picks a pipeline strategy, runs it and attaches an
//! explanation.
//!
//! ```text
//! SelectingStrategy ──▶ RunningPipeline(crew | deterministic) ──▶ Done
//!                              │ crew failure
//!                              └──────▶ RunningPipeline(deterministic)
//! ```
//!
//! The crew strategy is used only when it is compiled in and the configured
//! credentials are well-formed. `run` never fails: the worst case is an
//! empty result with status `insufficient_data`.

use std::sync::Arc;
use std::time::Duration;

use agent_core::{GenerationOptions, LlmProvider};
use rust_decimal::Decimal;

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::explain::ExplanationAgent;
use crate::market::MarketDataProvider;
use crate::model::{PipelineRequest, PortfolioResult, RecommendRequest, RiskLevel, StrategyKind};
use crate::pipeline::{DeterministicPipeline, PipelineStrategy};

/// Longest accepted lookback window (about ten years)
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    SelectingStrategy,
    RunningPipeline(StrategyKind),
    Done,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::SelectingStrategy => write!(f, "selecting_strategy"),
            PipelineState::RunningPipeline(kind) => write!(f, "running_pipeline({})", kind),
            PipelineState::Done => write!(f, "done"),
        }
    }
}

/// Outcome of strategy selection
pub struct Selection {
    pub strategy: Box<dyn PipelineStrategy>,
    /// Why the crew strategy was not chosen
    pub fallback_reason: Option<String>,
}

pub struct Orchestrator {
    config: Arc<AdvisorConfig>,
    market: Arc<dyn MarketDataProvider>,
    explainer: ExplanationAgent,
}

impl Orchestrator {
    /// Orchestrator with the offline explanation agent
    pub fn new(config: Arc<AdvisorConfig>, market: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            config,
            market,
            explainer: ExplanationAgent::offline(),
        }
    }

    /// Use `provider` for live explanations
    pub fn with_explainer(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.explainer = ExplanationAgent::new(
            provider,
            GenerationOptions::for_model(&self.config.explanation.model),
            Duration::from_secs(self.config.explanation.timeout_secs),
        );
        self
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.config.fetch_timeout_secs)
    }

    /// Validate and normalize a wire request
    pub fn plan(&self, request: RecommendRequest) -> Result<PipelineRequest> {
        let mut symbols = request.universe.map(|u| u.normalize()).unwrap_or_default();
        if symbols.is_empty() {
            symbols.clone_from(&self.config.default_universe);
        }

        let lookback_days = request.lookback_days.unwrap_or(self.config.lookback_days);
        if lookback_days == 0 || lookback_days > MAX_LOOKBACK_DAYS {
            return Err(AdvisorError::InvalidRequest(format!(
                "lookback_days must be between 1 and {}",
                MAX_LOOKBACK_DAYS
            )));
        }

        let budget = match request.budget {
            None => self.config.default_budget,
            Some(b) if !b.is_finite() || b < 0.0 => {
                return Err(AdvisorError::InvalidRequest(
                    "budget must be a non-negative number".into(),
                ));
            }
            Some(b) => Decimal::from_f64_retain(b)
                .map(|d| d.round_dp(2))
                .ok_or_else(|| AdvisorError::InvalidRequest("budget is out of range".into()))?,
        };

        let risk_level = request
            .risk_level
            .as_deref()
            .map(RiskLevel::parse)
            .unwrap_or_default();

        Ok(PipelineRequest {
            symbols,
            lookback_days,
            budget,
            risk_level,
        })
    }

    /// Pick the pipeline for this request
    pub fn select_strategy(&self) -> Selection {
        match self.crew_capability() {
            Ok(strategy) => Selection {
                strategy,
                fallback_reason: None,
            },
            Err(reason) => Selection {
                strategy: Box::new(self.deterministic()),
                fallback_reason: Some(reason),
            },
        }
    }

    fn deterministic(&self) -> DeterministicPipeline {
        DeterministicPipeline::new(self.market.clone(), self.fetch_timeout())
    }

    #[cfg(feature = "crew")]
    fn crew_capability(&self) -> std::result::Result<Box<dyn PipelineStrategy>, String> {
        let Some(credentials) = &self.config.crew else {
            tracing::info!("No crew credentials configured, using deterministic pipeline");
            return Err("crew credentials not configured".into());
        };

        crate::pipeline::CrewPipeline::new(self.market.clone(), self.fetch_timeout(), credentials.clone())
            .map(|p| Box::new(p) as Box<dyn PipelineStrategy>)
            .map_err(|e| {
                tracing::warn!(error = %e, "Crew unavailable, using deterministic pipeline");
                format!("crew unavailable: {}", e)
            })
    }

    #[cfg(not(feature = "crew"))]
    fn crew_capability(&self) -> std::result::Result<Box<dyn PipelineStrategy>, String> {
        tracing::info!("Crew support not compiled in, using deterministic pipeline");
        Err("crew support not compiled in".into())
    }

    /// Run the pipeline and explain the result
    pub async fn run(&self, request: PipelineRequest) -> PortfolioResult {
        tracing::info!(state = %PipelineState::SelectingStrategy, symbols = request.symbols.len(), "Pipeline");
        let selection = self.select_strategy();
        self.run_selected(selection, request).await
    }

    async fn run_selected(&self, selection: Selection, request: PipelineRequest) -> PortfolioResult {
        let Selection {
            strategy,
            mut fallback_reason,
        } = selection;

        tracing::info!(state = %PipelineState::RunningPipeline(strategy.kind()), "Pipeline");
        let mut result = match strategy.run_pipeline(&request).await {
            Ok(result) => result,
            Err(e) if strategy.kind() == StrategyKind::Crew => {
                tracing::warn!(error = %e, "Crew run failed, falling back to deterministic pipeline");
                fallback_reason = Some(format!("crew run failed: {}", e));

                tracing::info!(state = %PipelineState::RunningPipeline(StrategyKind::Deterministic), "Pipeline");
                self.deterministic()
                    .run_pipeline(&request)
                    .await
                    .unwrap_or_else(|e| Self::empty_result(&request, &e))
            }
            Err(e) => Self::empty_result(&request, &e),
        };

        result.diagnostics.fallback_reason = fallback_reason;
        result.explanation = Some(self.explainer.explain(&result, request.risk_level).await);

        tracing::info!(
            state = %PipelineState::Done,
            strategy = %result.diagnostics.strategy,
            holdings = result.weights.len(),
            status = ?result.status,
            "Pipeline"
        );
        result
    }

    fn empty_result(request: &PipelineRequest, error: &AdvisorError) -> PortfolioResult {
        tracing::warn!(error = %error, "Pipeline failed, returning empty result");
        PortfolioResult::empty(request, StrategyKind::Deterministic)
    }

    /// Validate then run
    pub async fn recommend(&self, request: RecommendRequest) -> Result<PortfolioResult> {
        let request = self.plan(request)?;
        Ok(self.run(request).await)
    }
}
