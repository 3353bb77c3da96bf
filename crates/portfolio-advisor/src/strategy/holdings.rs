//! Budget Holdings
//!
//! Converts weights into whole shares at the latest price.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::model::{Holding, HoldingsPlan, PriceTable, Weights};

/// Whole-share plan for `budget` split by `weights`
///
/// `shares = floor(budget * weight / price)`, `allocated = shares * price`
/// rounded to cents. Share counts beyond `u64::MAX` saturate. Symbols
/// without a usable latest price get no shares.
/// Holdings are ordered by weight, largest first.
pub fn plan_holdings(budget: Decimal, weights: &Weights, prices: &PriceTable) -> HoldingsPlan {
    let mut holdings: Vec<Holding> = weights
        .iter()
        .map(|(symbol, &weight)| {
            let price = prices
                .get(symbol)
                .and_then(|series| series.last_valid_price())
                .and_then(Decimal::from_f64_retain)
                .map(|p| p.round_dp(6))
                .filter(|p| *p > Decimal::ZERO);

            let (shares, allocated) = match (price, Decimal::from_f64_retain(weight)) {
                (Some(price), Some(weight)) if budget > Decimal::ZERO => {
                    let weight = weight.round_dp(12);
                    let amount = budget * weight;
                    let shares = amount
                        .checked_div(price)
                        .and_then(|q| q.floor().to_u64())
                        .unwrap_or(u64::MAX);
                    (shares, (Decimal::from(shares) * price).round_dp(2))
                }
                _ => (0, Decimal::ZERO),
            };

            if price.is_none() {
                tracing::warn!(symbol = %symbol, "No usable latest price, holding left empty");
            }

            Holding {
                symbol: symbol.clone(),
                weight,
                price,
                shares,
                allocated,
            }
        })
        .collect();

    holdings.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.symbol.cmp(&b.symbol)));

    let allocated: Decimal = holdings.iter().map(|h| h.allocated).sum();

    HoldingsPlan {
        budget,
        allocated,
        remaining: budget - allocated,
        holdings,
    }
}
