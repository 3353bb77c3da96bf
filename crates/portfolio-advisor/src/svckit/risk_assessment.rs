//! Risk Assessment Tool

use async_trait::async_trait;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use super::{FETCH_TASK, context_value};
use crate::model::PriceTable;
use crate::risk::RiskAssessor;

/// Scores the fetched universe
#[derive(Default)]
pub struct RiskAssessmentTool {
    assessor: RiskAssessor,
}

impl RiskAssessmentTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tool for RiskAssessmentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "risk_assessment".into(),
            description: "Compute volatility, drawdown and relative risk for fetched price histories.".into(),
            parameters: vec![ParameterSchema::required(
                "context",
                "object",
                "Upstream outputs; must include the price table",
            )],
            category: Some("analysis".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let prices: PriceTable = context_value(call, FETCH_TASK)?;
        let report = self.assessor.assess_universe(&prices);

        let output = match &report.summary {
            Some(summary) => format!(
                "Scored {} symbols (annualized volatility avg {:.1}%, min {:.1}%, max {:.1}%)",
                report.entries.len(),
                summary.avg_volatility * 100.0,
                summary.min_volatility * 100.0,
                summary.max_volatility * 100.0
            ),
            None => "No symbol has enough history to score".to_string(),
        };

        Ok(ToolResult::success("risk_assessment", output).with_data(serde_json::to_value(&report)?))
    }
}
