//! Price Chart
//!
//! Aligns every series on the union of their dates, fills gaps forward
//! then backward, and keeps the most recent days only.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::{PriceChart, PriceTable, is_valid_price};

/// Days kept in a chart
pub const CHART_TAIL: usize = 90;

impl PriceChart {
    pub fn from_table(prices: &PriceTable, tail: usize) -> Self {
        // symbol → date → last valid price seen that day
        let by_day: BTreeMap<&String, BTreeMap<NaiveDate, f64>> = prices
            .iter()
            .map(|(symbol, series)| {
                let days = series
                    .points
                    .iter()
                    .filter(|p| is_valid_price(p.price))
                    .map(|p| (p.timestamp.date_naive(), p.price))
                    .collect::<BTreeMap<_, _>>();
                (symbol, days)
            })
            .filter(|(_, days)| !days.is_empty())
            .collect();

        let all_dates: Vec<NaiveDate> = by_day
            .values()
            .flat_map(|days| days.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let skip = all_dates.len().saturating_sub(tail);

        let series = by_day
            .into_iter()
            .map(|(symbol, days)| {
                let mut filled: Vec<Option<f64>> = Vec::with_capacity(all_dates.len());
                let mut last = None;
                for date in &all_dates {
                    if let Some(price) = days.get(date) {
                        last = Some(*price);
                    }
                    filled.push(last);
                }
                let first = days.values().next().copied().unwrap_or_default();
                let values = filled
                    .into_iter()
                    .skip(skip)
                    .map(|v| round_cents(v.unwrap_or(first)))
                    .collect();
                (symbol.clone(), values)
            })
            .collect();

        Self {
            dates: all_dates
                .iter()
                .skip(skip)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
            series,
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
