//! Price History Tool
//!
//! Fetches the requested universe from the market data provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};

use crate::market::{MarketDataProvider, fetch_bounded};
use crate::model::{Symbol, is_valid_price};

/// Tool wrapping a market data provider
pub struct PriceHistoryTool {
    market: Arc<dyn MarketDataProvider>,
    timeout: Duration,
}

impl PriceHistoryTool {
    pub fn new(market: Arc<dyn MarketDataProvider>, timeout: Duration) -> Self {
        Self { market, timeout }
    }
}

#[async_trait]
impl Tool for PriceHistoryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "price_history".into(),
            description: "Fetch daily price history for a list of ticker symbols.".into(),
            parameters: vec![
                ParameterSchema::required("symbols", "array", "Ticker symbols to fetch"),
                ParameterSchema::required("lookback_days", "integer", "Days of history"),
            ],
            category: Some("market_data".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let symbols: Vec<Symbol> = call.argument("symbols")?;
        let lookback_days: u32 = call.argument("lookback_days")?;

        let mut table = fetch_bounded(self.market.as_ref(), &symbols, lookback_days, self.timeout).await;

        // non-finite prices cannot cross a JSON boundary; they are skipped downstream anyway
        for series in table.values_mut() {
            series.points.retain(|p| p.price.is_finite());
        }
        let usable = table
            .values()
            .filter(|s| s.prices().filter(|p| is_valid_price(*p)).count() >= 2)
            .count();

        let output = format!(
            "Fetched {} of {} symbols from {} ({} with usable history)",
            table.len(),
            symbols.len(),
            self.market.name(),
            usable
        );
        let data = serde_json::to_value(&table)?;

        Ok(ToolResult::success("price_history", output).with_data(data))
    }
}
