//! Common benchmark fixtures and utilities.
//!
//! Provides shared offer and tier creation functions used across benchmarks.

#![allow(dead_code)]

use cashback_core::{BoostTier, RawOffer};
use serde_json::json;

/// Create a search-result page of `count` offers, alternating percentage and
/// fixed cashback, each with `categories` per-category rates.
pub fn create_offers(count: usize, categories: usize) -> Vec<RawOffer> {
    (0..count)
        .map(|i| {
            let kind = if i % 2 == 0 { "percentage" } else { "fixed" };
            let all_rates: Vec<_> = (0..categories)
                .map(|c| json!({"name": format!("category-{c}"), "amount": 1.5, "type": kind}))
                .collect();

            serde_json::from_value(json!({
                "id": format!("offer-{i}"),
                "name": format!("Merchant {i}"),
                "cashback": {
                    "amount": 2.5,
                    "type": kind,
                    "allRates": all_rates,
                }
            }))
            .unwrap()
        })
        .collect()
}

/// Create an active tier with splits and thresholds.
pub fn create_tier(payout_multiplier: f64) -> BoostTier {
    BoostTier::new("bench", "Bench", payout_multiplier)
        .with_platform_multiplier(1.25)
        .with_splits(0.8, 0.15, 0.05)
        .with_minimums(500.0, 100.0)
}
