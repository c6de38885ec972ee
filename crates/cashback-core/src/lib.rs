//! # cashback-core
//!
//! Per-user cashback rate calculation for a crypto-cashback shopping
//! platform.
//!
//! Users browse merchant offers carrying a base cashback rate, choose a
//! partner token to receive payouts in, and belong to a boost tier that
//! multiplies their rewards. This crate turns those three inputs into the
//! effective rate a specific user sees for a specific offer:
//!
//! - [`offer`]: wire types for offers from the search index, validated into
//!   [`Cashback`] at the boundary
//! - [`tier`]: [`BoostTier`] records, validation, reward splits and tier
//!   selection
//! - [`token`]: partner tokens and the payout-label directory
//! - [`rate`]: the calculator producing [`UserRateDetails`]
//! - [`enrich`]: applying the calculator to a whole offer list with
//!   per-offer fallback
//! - [`config`]: TOML configuration for formatting and tier policy
//!
//! ## Example
//!
//! ```rust
//! use cashback_core::{
//!     BoostTier, RateCalculator, RawOffer, UserRateContext, enrich_offers,
//! };
//!
//! let offers: Vec<RawOffer> = serde_json::from_str(
//!     r#"[{"id": "acme", "cashback": {"rate": "5%", "amount": 5, "type": "percentage"}}]"#,
//! )
//! .unwrap();
//! let context = UserRateContext::new("USDC", Some(BoostTier::new("gold", "Gold", 1.5)));
//!
//! let enriched = enrich_offers(&offers, &context, &RateCalculator::default());
//! assert_eq!(
//!     enriched[0].user_rate.as_ref().unwrap().formatted_rate,
//!     "7.5% in USDC"
//! );
//! ```
//!
//! ## Design Notes
//!
//! Everything here is a pure function of its arguments. There is no global
//! state: the caller resolves the user's profile, payout token and boost tier
//! and passes them in explicitly, so the calculator can be mapped over offers
//! in any order or in parallel.

#![warn(missing_docs)]

pub mod config;
pub mod enrich;
pub mod error;
pub mod offer;
pub mod rate;
pub mod tier;
pub mod token;

#[cfg(test)]
mod proptest_rate;

// Re-export main types at crate root for convenience
pub use config::{CalculatorConfig, ConfigError, FormatConfig, TierConfig};
pub use enrich::{
    CategoryRate, EnrichedOffer, UserProfile, UserRateContext, enrich_hit, enrich_hits,
    enrich_offer, enrich_offers,
};
pub use error::RateError;
pub use offer::{
    Cashback, CashbackKind, RateEntry, RawCashback, RawOffer, RejectedRate, parse_rate,
};
pub use rate::{RateCalculator, UserRateDetails, calculate_user_rate, format_rate};
pub use tier::{BoostTier, RewardSplit, SplitPolicy, select_tier};
pub use token::{PartnerToken, TokenDirectory};
