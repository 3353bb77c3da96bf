//! Application State

use std::sync::Arc;

use agent_core::LlmProvider;
use portfolio_advisor::{AdvisorConfig, MarketDataProvider, Orchestrator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Immutable advisor configuration
    pub config: Arc<AdvisorConfig>,

    /// Market data provider (Yahoo, mock)
    pub market: Arc<dyn MarketDataProvider>,

    /// Explanation provider (None if no API key is configured)
    pub explainer: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    /// Request-scoped orchestrator
    pub fn orchestrator(&self) -> Orchestrator {
        let orchestrator = Orchestrator::new(self.config.clone(), self.market.clone());
        match &self.explainer {
            Some(provider) => orchestrator.with_explainer(provider.clone()),
            None => orchestrator,
        }
    }
}
