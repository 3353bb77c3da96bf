//! Risk Assessment
//!
//! Volatility of simple returns per symbol plus universe-level figures
//! (annualized volatility, maximum drawdown, relative rank).
//!
//! Only valid prices (finite and strictly positive) take part; anything
//! else is skipped rather than treated as an error.

use std::collections::BTreeMap;

use crate::model::{PriceSeries, PriceTable, RiskEntry, RiskReport, RiskScore, RiskSummary, is_valid_price};

/// Trading days used to annualize daily volatility
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Stateless risk calculator
#[derive(Clone, Copy, Debug, Default)]
pub struct RiskAssessor;

impl RiskAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Simple returns between consecutive valid prices
    pub fn returns(series: &PriceSeries) -> Vec<f64> {
        let valid: Vec<f64> = series.prices().filter(|p| is_valid_price(*p)).collect();
        valid.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
    }

    /// Sample standard deviation of simple returns
    ///
    /// `None` when the series has fewer than two valid prices.
    pub fn score(&self, series: &PriceSeries) -> Option<RiskScore> {
        sample_std(&Self::returns(series))
    }

    /// Most negative `(p - running_max) / running_max`, 0.0 for flat or rising series
    pub fn max_drawdown(series: &PriceSeries) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut worst = 0.0_f64;
        for price in series.prices().filter(|p| is_valid_price(*p)) {
            peak = peak.max(price);
            worst = worst.min((price - peak) / peak);
        }
        worst
    }

    /// Assess every symbol in a price table
    pub fn assess_universe(&self, prices: &PriceTable) -> RiskReport {
        let mut scored: BTreeMap<String, (RiskScore, usize, f64)> = BTreeMap::new();
        let mut insufficient_history = Vec::new();

        for (symbol, series) in prices {
            let returns = Self::returns(series);
            match sample_std(&returns) {
                Some(volatility) => {
                    scored.insert(symbol.clone(), (volatility, returns.len(), Self::max_drawdown(series)));
                }
                None => {
                    tracing::warn!(symbol = %symbol, points = series.len(), "Insufficient history for risk score");
                    insufficient_history.push(symbol.clone());
                }
            }
        }

        let ranks = average_ranks(&scored.iter().map(|(s, (v, _, _))| (s.clone(), *v)).collect());
        #[allow(clippy::cast_precision_loss)]
        let n = scored.len() as f64;

        let entries: BTreeMap<String, RiskEntry> = scored
            .into_iter()
            .map(|(symbol, (volatility, observations, max_drawdown))| {
                let relative_risk = ranks.get(&symbol).copied().unwrap_or(0.0) / n;
                let entry = RiskEntry {
                    volatility,
                    annualized_volatility: volatility * TRADING_DAYS_PER_YEAR.sqrt(),
                    max_drawdown,
                    relative_risk,
                    observations,
                };
                (symbol, entry)
            })
            .collect();

        let summary = summarize(&entries);
        tracing::debug!(scored = entries.len(), skipped = insufficient_history.len(), "Risk assessed");

        RiskReport {
            entries,
            insufficient_history,
            summary,
        }
    }
}

/// n-1 denominator; a single observation has zero dispersion
fn sample_std(values: &[f64]) -> Option<f64> {
    match values.len() {
        0 => None,
        1 => Some(0.0),
        len => {
            #[allow(clippy::cast_precision_loss)]
            let n = len as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            Some(variance.sqrt())
        }
    }
}

/// 1-based ascending ranks, ties share their average rank
fn average_ranks(values: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut ordered: Vec<(&String, f64)> = values.iter().map(|(s, v)| (s, *v)).collect();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = BTreeMap::new();
    let mut i = 0;
    while i < ordered.len() {
        let mut j = i;
        while j + 1 < ordered.len() && ordered[j + 1].1 == ordered[i].1 {
            j += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for (symbol, _) in &ordered[i..=j] {
            ranks.insert((*symbol).clone(), rank);
        }
        i = j + 1;
    }
    ranks
}

/// Summary over annualized volatilities
fn summarize(entries: &BTreeMap<String, RiskEntry>) -> Option<RiskSummary> {
    if entries.is_empty() {
        return None;
    }
    let vols: Vec<f64> = entries.values().map(|e| e.annualized_volatility).collect();
    #[allow(clippy::cast_precision_loss)]
    let avg = vols.iter().sum::<f64>() / vols.len() as f64;

    Some(RiskSummary {
        avg_volatility: avg,
        max_volatility: vols.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min_volatility: vols.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn series(symbol: &str, prices: &[f64]) -> PriceSeries {
        PriceSeries::daily(symbol, DateTime::from_timestamp(1_704_067_200, 0).unwrap(), prices)
    }

    #[test]
    fn test_score_matches_hand_computation() {
        // returns: 0.1, -0.1, 0.0606...
        let s = series("A", &[100.0, 110.0, 99.0, 105.0]);
        let r = RiskAssessor::returns(&s);
        let mean = r.iter().sum::<f64>() / 3.0;
        let expected = (r.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 2.0).sqrt();

        let score = RiskAssessor::new().score(&s).unwrap();
        assert!((score - expected).abs() < 1e-15);
        assert!(score > 0.09 && score < 0.12);
    }

    #[test]
    fn test_short_and_invalid_series() {
        let assessor = RiskAssessor::new();
        assert_eq!(assessor.score(&series("A", &[])), None);
        assert_eq!(assessor.score(&series("A", &[100.0])), None);
        assert_eq!(assessor.score(&series("A", &[100.0, f64::NAN, -5.0, 0.0])), None);
        assert_eq!(assessor.score(&series("A", &[100.0, 101.0])), Some(0.0));

        // invalid points are skipped, not fatal
        let s = series("A", &[100.0, f64::INFINITY, 110.0, 0.0, 121.0]);
        assert_eq!(RiskAssessor::returns(&s).len(), 2);
        assert!(assessor.score(&s).unwrap() < 1e-12);
    }

    #[test]
    fn test_max_drawdown() {
        assert_eq!(RiskAssessor::max_drawdown(&series("A", &[1.0, 2.0, 3.0])), 0.0);
        let dd = RiskAssessor::max_drawdown(&series("A", &[100.0, 120.0, 90.0, 130.0, 117.0]));
        assert!((dd - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_universe_report() {
        let mut table = PriceTable::new();
        table.insert("CALM".into(), series("CALM", &[100.0, 100.5, 100.0, 100.5]));
        table.insert("WILD".into(), series("WILD", &[100.0, 120.0, 90.0, 115.0]));
        table.insert("NEW".into(), series("NEW", &[50.0]));

        let report = RiskAssessor::new().assess_universe(&table);

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.insufficient_history, vec!["NEW".to_string()]);
        assert_eq!(report.entries["CALM"].relative_risk, 0.5);
        assert_eq!(report.entries["WILD"].relative_risk, 1.0);

        let calm = &report.entries["CALM"];
        assert!((calm.annualized_volatility - calm.volatility * 252f64.sqrt()).abs() < 1e-12);

        let summary = report.summary.unwrap();
        assert_eq!(summary.max_volatility, report.entries["WILD"].annualized_volatility);
        assert_eq!(summary.min_volatility, calm.annualized_volatility);
    }

    #[test]
    fn test_tied_ranks_are_averaged() {
        let mut table = PriceTable::new();
        for symbol in ["A", "B", "C"] {
            table.insert(symbol.into(), series(symbol, &[10.0, 10.0, 10.0]));
        }
        let report = RiskAssessor::new().assess_universe(&table);
        assert!(report.entries.values().all(|e| (e.relative_risk - 2.0 / 3.0).abs() < 1e-12));
    }
}
