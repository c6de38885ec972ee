//! Offer enrichment.
//!
//! Applies the rate calculator to every offer of a search result list (and
//! to each offer's per-category rates). Enrichment never fails: an offer
//! whose computation fails keeps its raw, unboosted cashback display and
//! records why in `fallback_reason`, so one bad record cannot take down the
//! whole list.
//!
//! The user's payout token and boost tier are resolved once by the caller
//! and passed in as a [`UserRateContext`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RateError;
use crate::offer::{Cashback, RawOffer, RejectedRate};
use crate::rate::{RateCalculator, UserRateDetails};
use crate::tier::BoostTier;
use crate::token::{TokenDirectory, deserialize_optional_id};

/// The profile fields enrichment depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The partner token the user receives payouts in.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub payout_partner_token_id: Option<String>,

    /// The user's boost tier.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub boost_tier_id: Option<String>,
}

/// Resolved per-user inputs to the calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRateContext {
    /// Display label of the user's payout token; may be empty.
    pub payout_token_label: String,
    /// The user's boost tier, if any.
    pub boost_tier: Option<BoostTier>,
}

impl UserRateContext {
    /// Creates a context from already-resolved values.
    #[must_use]
    pub fn new(payout_token_label: impl Into<String>, boost_tier: Option<BoostTier>) -> Self {
        Self {
            payout_token_label: payout_token_label.into(),
            boost_tier,
        }
    }

    /// Resolves a profile's token and tier ids against reference data.
    ///
    /// Unknown ids degrade to an empty label or no tier.
    #[must_use]
    pub fn resolve(profile: &UserProfile, tokens: &TokenDirectory, tiers: &[BoostTier]) -> Self {
        let payout_token_label = match profile.payout_partner_token_id.as_deref() {
            Some(id) => tokens.display_label(id).map_or_else(
                || {
                    tracing::debug!(token_id = id, "payout token not found");
                    String::new()
                },
                str::to_string,
            ),
            None => String::new(),
        };

        let boost_tier = profile.boost_tier_id.as_deref().and_then(|id| {
            let tier = tiers.iter().find(|tier| tier.id == id).cloned();
            if tier.is_none() {
                tracing::debug!(tier_id = id, "boost tier not found");
            }
            tier
        });

        Self {
            payout_token_label,
            boost_tier,
        }
    }
}

/// Effective rate for one category of an offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRate {
    /// Category name, if known.
    pub name: Option<String>,
    /// The category's effective rate.
    #[serde(flatten)]
    pub details: UserRateDetails,
}

/// An offer annotated with the user's effective rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedOffer {
    /// The offer as received.
    #[serde(flatten)]
    pub offer: RawOffer,

    /// The headline rate, boosted when possible. `None` if the offer's own
    /// cashback is unusable; display the raw `cashback.rate` instead.
    pub user_rate: Option<UserRateDetails>,

    /// Per-category rates in `allRates` order.
    pub category_rates: Vec<CategoryRate>,

    /// `allRates` entries that failed validation; display their raw rate.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_categories: Vec<RejectedRate>,

    /// Why the boost was not applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl EnrichedOffer {
    /// Returns `true` if the offer is shown without its boost.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Enriches one offer.
#[must_use]
pub fn enrich_offer(
    raw: &RawOffer,
    context: &UserRateContext,
    calculator: &RateCalculator,
) -> EnrichedOffer {
    let cashback = match raw.cashback() {
        Ok(cashback) => cashback,
        Err(error) => return unusable(raw.clone(), &error),
    };

    if !cashback.rejected_rates.is_empty() {
        tracing::warn!(
            offer_id = %raw.display_id(),
            rejected = cashback.rejected_rates.len(),
            "category rates invalid, showing them unboosted"
        );
    }

    match boosted_rates(&cashback, context, calculator) {
        Ok((user_rate, category_rates)) => EnrichedOffer {
            offer: raw.clone(),
            user_rate: Some(user_rate),
            category_rates,
            rejected_categories: cashback.rejected_rates,
            fallback_reason: None,
        },
        Err(error) => {
            tracing::warn!(
                offer_id = %raw.display_id(),
                %error,
                "rate calculation failed, showing base rate"
            );
            let (user_rate, category_rates) = unboosted_rates(&cashback, context, calculator);
            EnrichedOffer {
                offer: raw.clone(),
                user_rate: Some(user_rate),
                category_rates,
                rejected_categories: cashback.rejected_rates,
                fallback_reason: Some(error.to_string()),
            }
        },
    }
}

/// Enriches one raw search hit.
///
/// A hit that does not decode as an offer is returned verbatim with no user
/// rate and the decode error as its `fallback_reason`.
#[must_use]
pub fn enrich_hit(
    hit: &Value,
    context: &UserRateContext,
    calculator: &RateCalculator,
) -> EnrichedOffer {
    match RawOffer::from_hit(hit) {
        Ok(raw) => enrich_offer(&raw, context, calculator),
        Err(error) => unusable(RawOffer::undecoded(hit), &error),
    }
}

/// Enriches a list of offers, preserving order and length.
#[must_use]
pub fn enrich_offers(
    offers: &[RawOffer],
    context: &UserRateContext,
    calculator: &RateCalculator,
) -> Vec<EnrichedOffer> {
    let enriched: Vec<EnrichedOffer> = offers
        .iter()
        .map(|offer| enrich_offer(offer, context, calculator))
        .collect();
    log_summary(&enriched, context);
    enriched
}

/// Enriches a page of raw search hits, decoding each one separately so a
/// malformed hit only affects itself.
#[must_use]
pub fn enrich_hits(
    hits: &[Value],
    context: &UserRateContext,
    calculator: &RateCalculator,
) -> Vec<EnrichedOffer> {
    let enriched: Vec<EnrichedOffer> = hits
        .iter()
        .map(|hit| enrich_hit(hit, context, calculator))
        .collect();
    log_summary(&enriched, context);
    enriched
}

fn unusable(offer: RawOffer, error: &RateError) -> EnrichedOffer {
    tracing::warn!(
        offer_id = %offer.display_id(),
        %error,
        "offer cashback invalid, showing raw rate"
    );
    EnrichedOffer {
        offer,
        user_rate: None,
        category_rates: Vec::new(),
        rejected_categories: Vec::new(),
        fallback_reason: Some(error.to_string()),
    }
}

fn log_summary(enriched: &[EnrichedOffer], context: &UserRateContext) {
    tracing::debug!(
        offers = enriched.len(),
        fallbacks = enriched.iter().filter(|offer| offer.is_fallback()).count(),
        tier_id = context.boost_tier.as_ref().map(|tier| tier.id.as_str()),
        "enriched offers"
    );
}

fn boosted_rates(
    cashback: &Cashback,
    context: &UserRateContext,
    calculator: &RateCalculator,
) -> Result<(UserRateDetails, Vec<CategoryRate>), RateError> {
    let label = context.payout_token_label.as_str();
    let tier = context.boost_tier.as_ref();

    let headline = calculator.calculate(cashback, label, tier)?;
    let categories = cashback
        .all_rates
        .iter()
        .map(|entry| {
            calculator
                .calculate_amount(entry.kind, entry.amount, label, tier)
                .map(|details| CategoryRate {
                    name: entry.name.clone(),
                    details,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((headline, categories))
}

fn unboosted_rates(
    cashback: &Cashback,
    context: &UserRateContext,
    calculator: &RateCalculator,
) -> (UserRateDetails, Vec<CategoryRate>) {
    let label = context.payout_token_label.as_str();
    let categories = cashback
        .all_rates
        .iter()
        .map(|entry| CategoryRate {
            name: entry.name.clone(),
            details: calculator.unboosted_amount(entry.kind, entry.amount, label),
        })
        .collect();

    (calculator.unboosted(cashback, label), categories)
}
