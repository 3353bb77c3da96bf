//! Inverse-Volatility Weighting
//!
//! `w_i = (1/r_i) / Σ_j (1/r_j)`, computed as `(r_min/r_i) / Σ_j (r_min/r_j)`
//! so every term lies in (0, 1] and nothing overflows. A zero score is
//! floored at `f64::MIN_POSITIVE`: the symbol stays in and takes almost all
//! of the weight.

use std::collections::BTreeMap;

use crate::model::{RiskScore, Symbol, Weights};

/// Produces normalized allocation weights from risk scores
#[derive(Clone, Copy, Debug, Default)]
pub struct PortfolioGenerator;

impl PortfolioGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Allocate by inverse volatility
    ///
    /// Empty input (or no usable score) gives an empty allocation.
    pub fn allocate(&self, scores: &BTreeMap<Symbol, RiskScore>) -> Weights {
        let floored: BTreeMap<&Symbol, f64> = scores
            .iter()
            .filter_map(|(symbol, &score)| {
                if score.is_nan() || score < 0.0 || score.is_infinite() {
                    tracing::warn!(symbol = %symbol, score, "Unusable risk score, skipping");
                    None
                } else {
                    Some((symbol, score.max(f64::MIN_POSITIVE)))
                }
            })
            .collect();

        let Some(min) = floored.values().copied().reduce(f64::min) else {
            return Weights::new();
        };

        let scaled: BTreeMap<&Symbol, f64> = floored.iter().map(|(s, r)| (*s, min / r)).collect();
        let total: f64 = scaled.values().sum();

        scaled
            .into_iter()
            .map(|(symbol, inv)| (symbol.clone(), inv / total))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<Symbol, RiskScore> {
        pairs.iter().map(|(s, r)| ((*s).to_string(), *r)).collect()
    }

    fn assert_sums_to_one(weights: &Weights) {
        let sum: f64 = weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "weights sum to {}", sum);
    }

    #[test]
    fn test_two_symbol_split() {
        let weights = PortfolioGenerator::new().allocate(&scores(&[("A", 0.02), ("B", 0.04)]));

        assert!((weights["A"] - 2.0 / 3.0).abs() < 1e-12);
        assert!((weights["B"] - 1.0 / 3.0).abs() < 1e-12);
        assert_sums_to_one(&weights);
    }

    #[test]
    fn test_single_symbol_gets_everything() {
        let weights = PortfolioGenerator::new().allocate(&scores(&[("ONLY", 0.07)]));
        assert_eq!(weights["ONLY"], 1.0);
    }

    #[test]
    fn test_zero_risk_stays_finite() {
        let weights = PortfolioGenerator::new().allocate(&scores(&[("FLAT", 0.0), ("B", 0.03), ("C", 1e-300)]));

        assert_eq!(weights.len(), 3);
        assert!(weights.values().all(|w| w.is_finite() && *w >= 0.0));
        assert!(weights["FLAT"] > 0.999);
        assert_sums_to_one(&weights);
    }

    #[test]
    fn test_all_zero_risk_is_equal_weight() {
        let weights = PortfolioGenerator::new().allocate(&scores(&[("A", 0.0), ("B", 0.0)]));
        assert_eq!(weights["A"], 0.5);
        assert_eq!(weights["B"], 0.5);
    }

    #[test]
    fn test_empty_and_unusable() {
        let generator = PortfolioGenerator::new();
        assert!(generator.allocate(&BTreeMap::new()).is_empty());
        assert!(generator.allocate(&scores(&[("X", f64::NAN), ("Y", -1.0)])).is_empty());
    }

    #[test]
    fn test_many_symbols_sum() {
        let input: BTreeMap<Symbol, RiskScore> = (1..=50)
            .map(|i| (format!("S{:02}", i), f64::from(i) * 0.0037))
            .collect();
        let weights = PortfolioGenerator::new().allocate(&input);
        assert_sums_to_one(&weights);
        assert!(weights["S01"] > weights["S50"]);
    }
}
