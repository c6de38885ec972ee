//! Fuzz harness for display-rate parsing and offer decoding.
//!
//! Arbitrary bytes are fed to `parse_rate` and, when they form JSON, to the
//! offer decoder and enrichment. Neither path may panic, and a successful
//! parse must yield a finite, non-negative amount.

#![no_main]
use cashback_core::{BoostTier, RateCalculator, UserRateContext, enrich_hit, parse_rate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok((amount, _kind)) = parse_rate(input) {
        assert!(amount.is_finite() && amount >= 0.0);
    }

    if let Ok(hit) = serde_json::from_str::<serde_json::Value>(input) {
        let context = UserRateContext::new("USDC", Some(BoostTier::new("f", "Fuzz", 1.5)));
        let enriched = enrich_hit(&hit, &context, &RateCalculator::default());
        if let Some(rate) = enriched.user_rate {
            assert!(rate.boosted_amount.is_finite() && rate.boosted_amount >= 0.0);
        }
    }
});
