//! Property-based tests for the rate calculator.
//!
//! These tests verify the arithmetic invariants of boosted cashback using
//! property-based testing with proptest.

use proptest::prelude::*;

use crate::enrich::{UserRateContext, enrich_offers};
use crate::offer::{Cashback, CashbackKind, RawOffer};
use crate::rate::{RateCalculator, calculate_user_rate, format_amount};
use crate::tier::BoostTier;

/// Strategy for non-negative cashback amounts.
fn amount() -> impl Strategy<Value = f64> {
    0.0f64..10_000.0
}

/// Strategy for valid multipliers, zero included.
fn multiplier() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(1.0), 0.0f64..10.0]
}

fn kind() -> impl Strategy<Value = CashbackKind> {
    prop_oneof![Just(CashbackKind::Percentage), Just(CashbackKind::Fixed)]
}

fn label() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Z]{2,5}"]
}

proptest! {
    /// Property: boosted = amount * multiplier and is never negative.
    #[test]
    fn prop_boosted_is_product(
        amount in amount(),
        multiplier in multiplier(),
        kind in kind(),
        label in label(),
    ) {
        let cashback = Cashback::new(kind, amount).unwrap();
        let tier = BoostTier::new("t", "Tier", multiplier);

        let details = calculate_user_rate(&cashback, &label, Some(&tier)).unwrap();

        prop_assert!(details.boosted_amount >= 0.0);
        prop_assert!((details.boosted_amount - amount * multiplier).abs() < 1e-9);
        prop_assert!((details.applied_multiplier - multiplier).abs() < f64::EPSILON);
    }

    /// Property: no tier or an inactive tier is the identity.
    #[test]
    fn prop_identity_without_active_tier(
        amount in amount(),
        multiplier in -10.0f64..10.0,
        kind in kind(),
    ) {
        let cashback = Cashback::new(kind, amount).unwrap();
        let inactive = BoostTier::new("t", "Tier", multiplier).with_active(false);

        let none = calculate_user_rate(&cashback, "USDC", None).unwrap();
        let off = calculate_user_rate(&cashback, "USDC", Some(&inactive)).unwrap();

        prop_assert_eq!(none.boosted_amount.to_bits(), amount.to_bits());
        prop_assert_eq!(off, none);
    }

    /// Property: negative multipliers are rejected and the fallback shows
    /// the base rate.
    #[test]
    fn prop_negative_multiplier_rejected(
        amount in amount(),
        multiplier in -1_000.0f64..-f64::MIN_POSITIVE,
    ) {
        let cashback = Cashback::new(CashbackKind::Percentage, amount).unwrap();
        let tier = BoostTier::new("t", "Tier", multiplier);
        let calculator = RateCalculator::default();

        let result = calculator.calculate(&cashback, "USDC", Some(&tier));
        prop_assert!(result.is_err());
        prop_assert!(result.unwrap_err().is_invalid_multiplier());

        let fallback = calculator.calculate_or_fallback(&cashback, "USDC", Some(&tier));
        prop_assert_eq!(fallback, calculator.unboosted(&cashback, "USDC"));
    }

    /// Property: the calculation is idempotent.
    #[test]
    fn prop_idempotent(
        amount in amount(),
        multiplier in multiplier(),
        kind in kind(),
        label in label(),
    ) {
        let cashback = Cashback::new(kind, amount).unwrap();
        let tier = BoostTier::new("t", "Tier", multiplier);

        let first = calculate_user_rate(&cashback, &label, Some(&tier));
        let second = calculate_user_rate(&cashback, &label, Some(&tier));
        prop_assert_eq!(first, second);
    }

    /// Property: the kind selects the format, never the arithmetic.
    #[test]
    fn prop_kind_affects_format_only(
        amount in amount(),
        multiplier in multiplier(),
    ) {
        let tier = BoostTier::new("t", "Tier", multiplier);
        let pct = calculate_user_rate(
            &Cashback::new(CashbackKind::Percentage, amount).unwrap(),
            "USDC",
            Some(&tier),
        )
        .unwrap();
        let fixed = calculate_user_rate(
            &Cashback::new(CashbackKind::Fixed, amount).unwrap(),
            "USDC",
            Some(&tier),
        )
        .unwrap();

        prop_assert_eq!(pct.boosted_amount.to_bits(), fixed.boosted_amount.to_bits());
        prop_assert!(pct.formatted_rate.contains('%'));
        prop_assert!(!fixed.formatted_rate.contains('%'));
    }

    /// Property: formatted amounts never carry trailing zeros or a sign.
    #[test]
    fn prop_format_amount_trimmed(amount in amount(), digits in 0u8..=8) {
        let text = format_amount(amount, digits);

        prop_assert!(!text.starts_with('-'));
        if text.contains('.') {
            prop_assert!(!text.ends_with('0'));
            prop_assert!(!text.ends_with('.'));
        }
    }

    /// Property: enrichment preserves the length and order of the list.
    #[test]
    fn prop_enrich_preserves_order(
        amounts in prop::collection::vec(prop::option::of(amount()), 0..20),
        multiplier in -2.0f64..5.0,
    ) {
        let offers: Vec<RawOffer> = amounts
            .iter()
            .enumerate()
            .map(|(index, amount)| {
                let mut offer = RawOffer {
                    id: Some(format!("offer-{index}")),
                    ..RawOffer::default()
                };
                if let Some(amount) = amount {
                    offer.cashback = serde_json::from_value(serde_json::json!({
                        "amount": amount,
                        "type": "percentage",
                    }))
                    .ok();
                }
                offer
            })
            .collect();
        let context = UserRateContext::new("USDC", Some(BoostTier::new("t", "Tier", multiplier)));

        let enriched = enrich_offers(&offers, &context, &RateCalculator::default());

        prop_assert_eq!(enriched.len(), offers.len());
        for (index, offer) in enriched.iter().enumerate() {
            let expected_id = format!("offer-{index}");
            prop_assert_eq!(offer.offer.display_id(), expected_id.as_str());
            prop_assert_eq!(offer.user_rate.is_some(), amounts[index].is_some());
            prop_assert_eq!(offer.is_fallback(), amounts[index].is_none() || multiplier < 0.0);
        }
    }
}
