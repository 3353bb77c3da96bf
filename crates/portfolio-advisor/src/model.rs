//! Domain Models
//!
//! Request-scoped data types for the advisory pipeline. Every map keyed by
//! symbol is a `BTreeMap` so iteration (and therefore floating-point
//! accumulation) order is fixed.
//! Budgets and cash amounts use `rust_decimal`; weights and volatilities are
//! plain `f64` ratios.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Ticker symbol (trimmed, upper-case, unique within a request)
pub type Symbol = String;

/// Dispersion of simple returns for one symbol
pub type RiskScore = f64;

/// Symbol → allocation weight in [0, 1]
pub type Weights = BTreeMap<Symbol, f64>;

/// Symbol → price history
pub type PriceTable = BTreeMap<Symbol, PriceSeries>;

/// Universe used when a request names no symbols
pub const DEFAULT_UNIVERSE: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "JNJ", "V", "PG", "XOM", "JPM",
];

/// A single observation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Time-ordered prices for one symbol
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, sorting points ascending by timestamp
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            symbol: symbol.into().to_uppercase(),
            points,
        }
    }

    /// Daily series starting at `start`, one point per element of `prices`
    pub fn daily(symbol: impl Into<String>, start: DateTime<Utc>, prices: &[f64]) -> Self {
        let points = prices
            .iter()
            .zip(0_i64..)
            .map(|(&price, day)| PricePoint {
                timestamp: start + chrono::Duration::days(day),
                price,
            })
            .collect();
        Self::new(symbol, points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Raw prices in timestamp order
    pub fn prices(&self) -> impl DoubleEndedIterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    /// Most recent finite, positive price
    pub fn last_valid_price(&self) -> Option<f64> {
        self.prices().rev().find(|p| is_valid_price(*p))
    }
}

/// Prices that can take part in return calculations
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Universe as sent by clients: a list or a comma-separated string
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniverseInput {
    List(Vec<String>),
    Csv(String),
}

impl UniverseInput {
    /// Trim, upper-case, drop empties and duplicates (first occurrence wins)
    pub fn normalize(&self) -> Vec<Symbol> {
        let raw: Vec<&str> = match self {
            UniverseInput::List(items) => items.iter().map(String::as_str).collect(),
            UniverseInput::Csv(text) => text.split(',').collect(),
        };

        let mut seen = HashSet::new();
        raw.into_iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }
}

/// Investor risk preference (narration only)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Moderate,
    High,
}

impl RiskLevel {
    /// Lenient parse; unknown values map to `Moderate`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" | "conservative" => RiskLevel::Low,
            "high" | "aggressive" => RiskLevel::High,
            _ => RiskLevel::Moderate,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Inbound recommendation request (wire form)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub universe: Option<UniverseInput>,
    #[serde(default)]
    pub lookback_days: Option<u32>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
}

/// Validated input to a pipeline run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub symbols: Vec<Symbol>,
    pub lookback_days: u32,
    pub budget: Decimal,
    pub risk_level: RiskLevel,
}

/// Per-symbol risk figures
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    /// Sample standard deviation of simple returns
    pub volatility: RiskScore,
    /// `volatility` scaled by √252
    pub annualized_volatility: f64,
    /// Most negative peak-to-trough move (≤ 0)
    pub max_drawdown: f64,
    /// Volatility rank / n (ascending)
    pub relative_risk: f64,
    /// Number of returns the score was computed from
    pub observations: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub avg_volatility: f64,
    pub max_volatility: f64,
    pub min_volatility: f64,
}

/// Risk assessment of a whole universe
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub entries: BTreeMap<Symbol, RiskEntry>,
    /// Symbols with fewer than two valid prices
    pub insufficient_history: Vec<Symbol>,
    pub summary: Option<RiskSummary>,
}

impl RiskReport {
    /// Defined risk scores only
    pub fn scores(&self) -> BTreeMap<Symbol, RiskScore> {
        self.entries
            .iter()
            .map(|(symbol, entry)| (symbol.clone(), entry.volatility))
            .collect()
    }
}

/// Budget translated into whole shares
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub weight: f64,
    /// Latest usable price, if any
    pub price: Option<Decimal>,
    pub shares: u64,
    pub allocated: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldingsPlan {
    pub budget: Decimal,
    pub allocated: Decimal,
    pub remaining: Decimal,
    pub holdings: Vec<Holding>,
}

impl HoldingsPlan {
    /// Plan with nothing invested
    pub fn uninvested(budget: Decimal) -> Self {
        Self {
            budget,
            allocated: Decimal::ZERO,
            remaining: budget,
            holdings: Vec::new(),
        }
    }
}

/// Aligned recent prices for charting
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChart {
    /// `YYYY-MM-DD`, ascending
    pub dates: Vec<String>,
    /// One value per date, per symbol
    pub series: BTreeMap<Symbol, Vec<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioStatus {
    Complete,
    InsufficientData,
}

/// Which pipeline implementation produced a result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Deterministic,
    Crew,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Deterministic => write!(f, "deterministic"),
            StrategyKind::Crew => write!(f, "crew"),
        }
    }
}

/// Where an explanation came from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExplanationSource {
    Live { model: String },
    Fallback { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub text: String,
    pub source: ExplanationSource,
}

impl Explanation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ExplanationSource::Fallback { .. })
    }
}

/// How a result was produced and what was dropped on the way
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub strategy: StrategyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub requested: Vec<Symbol>,
    /// Symbols whose fetch failed
    pub omitted_symbols: Vec<Symbol>,
    /// Symbols fetched but with too little valid history
    pub insufficient_history: Vec<Symbol>,
    pub lookback_days: u32,
}

/// Output of one pipeline run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub request_id: String,
    pub status: PortfolioStatus,
    pub weights: Weights,
    pub holdings: HoldingsPlan,
    pub risk_report: RiskReport,
    pub prices: PriceChart,
    pub explanation: Option<Explanation>,
    pub diagnostics: Diagnostics,
    pub generated_at: DateTime<Utc>,
}

impl PortfolioResult {
    /// Result with no allocation
    pub fn empty(request: &PipelineRequest, strategy: StrategyKind) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            status: PortfolioStatus::InsufficientData,
            weights: Weights::new(),
            holdings: HoldingsPlan::uninvested(request.budget),
            risk_report: RiskReport::default(),
            prices: PriceChart::default(),
            explanation: None,
            diagnostics: Diagnostics {
                strategy,
                fallback_reason: None,
                requested: request.symbols.clone(),
                omitted_symbols: request.symbols.clone(),
                insufficient_history: Vec::new(),
                lookback_days: request.lookback_days,
            },
            generated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_normalization() {
        let csv = UniverseInput::Csv(" aapl, msft ,,AAPL, googl ".into());
        assert_eq!(csv.normalize(), vec!["AAPL", "MSFT", "GOOGL"]);

        let list = UniverseInput::List(vec!["xom".into(), "".into(), "  ".into(), "Xom".into()]);
        assert_eq!(list.normalize(), vec!["XOM"]);
    }

    #[test]
    fn test_universe_deserializes_both_shapes() {
        let req: RecommendRequest = serde_json::from_str(r#"{"universe": "AAPL,MSFT"}"#).unwrap();
        assert_eq!(req.universe, Some(UniverseInput::Csv("AAPL,MSFT".into())));

        let req: RecommendRequest = serde_json::from_str(r#"{"universe": ["AAPL"], "budget": 500}"#).unwrap();
        assert_eq!(req.universe, Some(UniverseInput::List(vec!["AAPL".into()])));
        assert_eq!(req.budget, Some(500.0));
    }

    #[test]
    fn test_series_sorted_and_last_valid_price() {
        let t0 = DateTime::from_timestamp(1_704_153_600, 0).unwrap();
        let series = PriceSeries::new(
            "aapl",
            vec![
                PricePoint { timestamp: t0 + chrono::Duration::days(2), price: f64::NAN },
                PricePoint { timestamp: t0, price: 100.0 },
                PricePoint { timestamp: t0 + chrono::Duration::days(1), price: 101.5 },
            ],
        );

        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.points[0].price, 100.0);
        assert_eq!(series.last_valid_price(), Some(101.5));
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!(RiskLevel::parse("LOW"), RiskLevel::Low);
        assert_eq!(RiskLevel::parse("aggressive"), RiskLevel::High);
        assert_eq!(RiskLevel::parse("whatever"), RiskLevel::Moderate);
        assert_eq!(RiskLevel::High.to_string(), "high");
    }

    #[test]
    fn test_explanation_source_tagging() {
        let explanation = Explanation {
            text: "offline".into(),
            source: ExplanationSource::Fallback { reason: "no key".into() },
        };
        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json["source"]["kind"], "fallback");
        assert!(explanation.is_fallback());
    }
}
