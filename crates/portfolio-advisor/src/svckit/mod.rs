//! Service Kit - Crew Tools
//!
//! Pipeline steps exposed as `agent_core::Tool`s so a `Crew` can run them.
//! Each tool hands its result to the next through structured `data`.

mod portfolio_generator;
mod price_history;
mod risk_assessment;

pub use portfolio_generator::PortfolioGeneratorTool;
pub use price_history::PriceHistoryTool;
pub use risk_assessment::RiskAssessmentTool;

use agent_core::{AgentError, Result as CoreResult, ToolCall};
use serde::de::DeserializeOwned;

/// Task names used by the crew pipeline
pub const FETCH_TASK: &str = "fetch_prices";
pub const ASSESS_TASK: &str = "assess_risk";
pub const ALLOCATE_TASK: &str = "generate_portfolio";

/// Output of an upstream task, taken from the call's `context` argument
pub(crate) fn context_value<T: DeserializeOwned>(call: &ToolCall, task: &str) -> CoreResult<T> {
    let context: serde_json::Map<String, serde_json::Value> = call.argument("context")?;
    let value = context
        .get(task)
        .cloned()
        .ok_or_else(|| AgentError::ToolValidation(format!("Missing context from '{}'", task)))?;
    serde_json::from_value(value)
        .map_err(|e| AgentError::ToolValidation(format!("Invalid context from '{}': {}", task, e)))
}
