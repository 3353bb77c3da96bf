//! Yahoo Finance Client
//!
//! Daily history from the public chart endpoint
//! (`/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d`).
//! Adjusted closes are preferred; raw closes are used when the adjusted
//! column is absent. Points without a value are dropped.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;

use super::MarketDataProvider;
use crate::error::{AdvisorError, Result};
use crate::model::{PricePoint, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; portfolio-advisor)";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

/// Yahoo Finance chart API client
pub struct YahooFinanceClient {
    client: Client,
    base_url: Url,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let parsed = Url::parse(base_url.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| AdvisorError::MarketData(format!("invalid base URL: {}", base_url)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Chart endpoint for `symbol`, percent-encoded as a single path segment
    fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v8", "finance", "chart", symbol]);
        }
        url
    }

    /// Turn a chart payload into a series
    fn parse_chart(symbol: &str, body: ChartResponse) -> Result<PriceSeries> {
        if let Some(error) = body.chart.error {
            return Err(if error.code.eq_ignore_ascii_case("Not Found") {
                AdvisorError::UnknownSymbol(symbol.to_string())
            } else {
                AdvisorError::MarketData(format!("{}: {}", error.code, error.description))
            });
        }

        let data = body
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| AdvisorError::NoData(symbol.to_string()))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let adjusted = data
            .indicators
            .adjclose
            .and_then(|a| a.into_iter().next())
            .map(|a| a.adjclose)
            .filter(|values| values.iter().any(Option::is_some));
        let closes = match adjusted {
            Some(values) => values,
            None => data
                .indicators
                .quote
                .into_iter()
                .next()
                .map(|q| q.close)
                .unwrap_or_default(),
        };

        let points: Vec<PricePoint> = timestamps
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| {
                Some(PricePoint {
                    timestamp: DateTime::from_timestamp(ts, 0)?,
                    price: close?,
                })
            })
            .collect();

        if points.is_empty() {
            return Err(AdvisorError::NoData(symbol.to_string()));
        }

        Ok(PriceSeries::new(symbol, points))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(i64::from(lookback_days));

        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AdvisorError::UnknownSymbol(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(AdvisorError::MarketData(format!("HTTP {} for {}", status, symbol)));
        }

        let body: ChartResponse = response.json().await?;
        Self::parse_chart(symbol, body)
    }

    async fn health_check(&self) -> bool {
        self.fetch_history("SPY", 7).await.is_ok()
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}
