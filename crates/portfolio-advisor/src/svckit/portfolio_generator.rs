//! Portfolio Generator Tool

use async_trait::async_trait;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use super::{ASSESS_TASK, context_value};
use crate::model::RiskReport;
use crate::strategy::PortfolioGenerator;

/// Allocates by inverse volatility
#[derive(Default)]
pub struct PortfolioGeneratorTool {
    generator: PortfolioGenerator,
}

impl PortfolioGeneratorTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tool for PortfolioGeneratorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "portfolio_generator".into(),
            description: "Turn risk scores into normalized inverse-volatility weights.".into(),
            parameters: vec![ParameterSchema::required(
                "context",
                "object",
                "Upstream outputs; must include the risk report",
            )],
            category: Some("allocation".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let report: RiskReport = context_value(call, ASSESS_TASK)?;
        let weights = self.generator.allocate(&report.scores());

        let output = if weights.is_empty() {
            "Insufficient data: empty allocation".to_string()
        } else {
            weights
                .iter()
                .map(|(symbol, w)| format!("{} {:.1}%", symbol, w * 100.0))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Ok(ToolResult::success("portfolio_generator", output).with_data(serde_json::to_value(&weights)?))
    }
}
