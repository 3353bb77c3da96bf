//! Advisor Configuration
//!
//! Loaded once at startup and handed to the orchestrator explicitly.
//! Nothing in the pipeline reads the environment during a run.

use std::str::FromStr;

use agent_core::CrewCredentials;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_UNIVERSE, Symbol};
use crate::orchestrator::MAX_LOOKBACK_DAYS;

/// Which market data provider to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSource {
    #[default]
    Yahoo,
    Mock,
}

impl MarketSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "yahoo" => Some(MarketSource::Yahoo),
            "mock" => Some(MarketSource::Mock),
            _ => None,
        }
    }
}

/// Settings for the explanation agent
#[derive(Clone, Serialize, Deserialize)]
pub struct ExplanationConfig {
    /// Generative-text API key; `None` means always use the offline text
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    /// Endpoint override; `None` uses the public API
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ExplanationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: agent_core::provider::DEFAULT_MODEL.into(),
            base_url: None,
            timeout_secs: 20,
        }
    }
}

/// Complete advisor configuration
#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    pub explanation: ExplanationConfig,
    /// Present only when crew credentials were supplied
    pub crew: Option<CrewCredentials>,
    pub lookback_days: u32,
    pub market_source: MarketSource,
    pub fetch_timeout_secs: u64,
    pub default_budget: Decimal,
    pub default_universe: Vec<Symbol>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            explanation: ExplanationConfig::default(),
            crew: None,
            lookback_days: 180,
            market_source: MarketSource::Yahoo,
            fetch_timeout_secs: 15,
            default_budget: dec!(10000),
            default_universe: DEFAULT_UNIVERSE.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl AdvisorConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, map, ...)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let market_source = match get("MARKET_DATA_SOURCE") {
            Some(raw) => MarketSource::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown MARKET_DATA_SOURCE, using yahoo");
                MarketSource::Yahoo
            }),
            None => defaults.market_source,
        };

        Self {
            explanation: ExplanationConfig {
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or(defaults.explanation.model),
                base_url: get("GEMINI_BASE_URL"),
                timeout_secs: parse_or(
                    "EXPLANATION_TIMEOUT_SECS",
                    get("EXPLANATION_TIMEOUT_SECS"),
                    defaults.explanation.timeout_secs,
                ),
            },
            crew: get("CREW_API_KEY").map(CrewCredentials::new),
            lookback_days: lookback_or(get("LOOKBACK_DAYS"), defaults.lookback_days),
            market_source,
            fetch_timeout_secs: parse_or(
                "MARKET_FETCH_TIMEOUT_SECS",
                get("MARKET_FETCH_TIMEOUT_SECS"),
                defaults.fetch_timeout_secs,
            ),
            default_budget: parse_or("DEFAULT_BUDGET", get("DEFAULT_BUDGET"), defaults.default_budget),
            default_universe: defaults.default_universe,
        }
    }

    /// Whether a generative-text key is configured
    pub fn has_explainer(&self) -> bool {
        self.explanation.api_key.is_some()
    }
}

fn lookback_or(raw: Option<String>, default: u32) -> u32 {
    let days = parse_or("LOOKBACK_DAYS", raw, default);
    if (1..=MAX_LOOKBACK_DAYS).contains(&days) {
        days
    } else {
        tracing::warn!(value = days, max = MAX_LOOKBACK_DAYS, fallback = default, "LOOKBACK_DAYS out of range, using default");
        default
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %value, fallback = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AdvisorConfig::from_lookup(|_| None);

        assert!(config.explanation.api_key.is_none());
        assert!(config.crew.is_none());
        assert_eq!(config.lookback_days, 180);
        assert_eq!(config.market_source, MarketSource::Yahoo);
        assert_eq!(config.fetch_timeout_secs, 15);
        assert_eq!(config.default_budget, dec!(10000));
        assert_eq!(config.default_universe.len(), 10);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = AdvisorConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "gm-key"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("CREW_API_KEY", "crew-key-1234"),
            ("LOOKBACK_DAYS", "90"),
            ("MARKET_DATA_SOURCE", "Mock"),
            ("DEFAULT_BUDGET", "2500.50"),
        ]));

        assert!(config.has_explainer());
        assert_eq!(config.explanation.model, "gemini-1.5-pro");
        assert!(config.crew.is_some());
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.market_source, MarketSource::Mock);
        assert_eq!(config.default_budget, dec!(2500.50));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = AdvisorConfig::from_lookup(lookup(&[
            ("LOOKBACK_DAYS", "a while"),
            ("EXPLANATION_TIMEOUT_SECS", "-3"),
            ("MARKET_DATA_SOURCE", "bloomberg"),
            ("GEMINI_API_KEY", "   "),
        ]));

        assert_eq!(config.lookback_days, 180);
        assert_eq!(config.explanation.timeout_secs, 20);
        assert_eq!(config.market_source, MarketSource::Yahoo);
        assert!(config.explanation.api_key.is_none());
    }

    #[test]
    fn test_out_of_range_lookback_falls_back() {
        for raw in ["0", "5000"] {
            let config = AdvisorConfig::from_lookup(lookup(&[("LOOKBACK_DAYS", raw)]));
            assert_eq!(config.lookback_days, 180, "LOOKBACK_DAYS={}", raw);
        }
        let config = AdvisorConfig::from_lookup(lookup(&[("LOOKBACK_DAYS", "3650")]));
        assert_eq!(config.lookback_days, 3650);
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AdvisorConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "super-secret")]));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
    }
}
