//! Per-user cashback rate calculation.
//!
//! The calculator combines an offer's base cashback, the user's payout-token
//! label and the user's boost tier into [`UserRateDetails`]:
//!
//! - boosted amount = base amount × payout multiplier when the tier is
//!   present and active; otherwise the base amount unchanged
//! - the cashback kind selects formatting only (`"7.5% in USDC"` versus
//!   `"20 USDC"`), never the arithmetic
//! - a zero multiplier yields zero cashback; a negative or non-finite
//!   multiplier is rejected
//!
//! The calculation is pure. Callers that must always display something use
//! [`RateCalculator::calculate_or_fallback`], which degrades to the unboosted
//! base rate on error.
//!
//! # Example
//!
//! ```rust
//! use cashback_core::offer::{Cashback, CashbackKind};
//! use cashback_core::rate::calculate_user_rate;
//! use cashback_core::tier::BoostTier;
//!
//! let cashback = Cashback::new(CashbackKind::Percentage, 5.0).unwrap();
//! let tier = BoostTier::new("gold", "Gold", 1.5);
//!
//! let details = calculate_user_rate(&cashback, "USDC", Some(&tier)).unwrap();
//! assert!((details.boosted_amount - 7.5).abs() < 1e-9);
//! assert_eq!(details.formatted_rate, "7.5% in USDC");
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{CalculatorConfig, FormatConfig};
use crate::error::RateError;
use crate::offer::{Cashback, CashbackKind};
use crate::tier::{BoostTier, check_multiplier};

/// Decimals used when no configuration is supplied.
pub const DEFAULT_FRACTION_DIGITS: u8 = 2;

/// The effective cashback shown to one user for one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRateDetails {
    /// The offer's unboosted amount.
    pub base_amount: f64,
    /// The amount after the payout-token boost.
    pub boosted_amount: f64,
    /// Human-readable rate including the payout-token label.
    pub formatted_rate: String,
    /// The multiplier that produced `boosted_amount`.
    pub applied_multiplier: f64,
    /// How the amount is expressed.
    pub kind: CashbackKind,
}

impl UserRateDetails {
    /// Returns `true` if a multiplier other than one was applied.
    #[must_use]
    pub fn is_boosted(&self) -> bool {
        (self.applied_multiplier - 1.0).abs() > f64::EPSILON
    }
}

/// Computes [`UserRateDetails`] with the default configuration.
///
/// # Errors
///
/// Returns [`RateError::InvalidMultiplier`] if the applied multiplier is
/// negative or not finite, and [`RateError::InvalidAmount`] if the base or
/// boosted amount is negative or not finite.
pub fn calculate_user_rate(
    cashback: &Cashback,
    payout_token_label: &str,
    boost_tier: Option<&BoostTier>,
) -> Result<UserRateDetails, RateError> {
    RateCalculator::default().calculate(cashback, payout_token_label, boost_tier)
}

/// Rate calculator bound to a configuration.
#[derive(Debug, Clone, Default)]
pub struct RateCalculator {
    config: CalculatorConfig,
}

impl RateCalculator {
    /// Creates a calculator.
    #[must_use]
    pub const fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    /// Returns the calculator configuration.
    #[must_use]
    pub const fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Computes the effective rate for one cashback.
    ///
    /// # Errors
    ///
    /// See [`calculate_user_rate`].
    pub fn calculate(
        &self,
        cashback: &Cashback,
        payout_token_label: &str,
        boost_tier: Option<&BoostTier>,
    ) -> Result<UserRateDetails, RateError> {
        self.calculate_amount(
            cashback.kind,
            cashback.amount,
            payout_token_label,
            boost_tier,
        )
    }

    /// Computes the effective rate for a bare amount.
    ///
    /// # Errors
    ///
    /// See [`calculate_user_rate`].
    pub fn calculate_amount(
        &self,
        kind: CashbackKind,
        amount: f64,
        payout_token_label: &str,
        boost_tier: Option<&BoostTier>,
    ) -> Result<UserRateDetails, RateError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RateError::invalid_amount("cashback.amount", amount));
        }

        let multiplier = match boost_tier {
            Some(tier) if tier.is_active => check_multiplier(
                "payout_token_boost_multiplier",
                tier.payout_token_boost_multiplier,
            )?,
            _ => 1.0,
        };

        let boosted = amount * multiplier;
        if !boosted.is_finite() {
            return Err(RateError::invalid_amount("boosted_amount", boosted));
        }

        tracing::debug!(
            %kind,
            amount,
            multiplier,
            boosted,
            tier_id = boost_tier.map(|tier| tier.id.as_str()),
            "calculated user rate"
        );

        Ok(UserRateDetails {
            base_amount: amount,
            boosted_amount: boosted,
            formatted_rate: format_rate(boosted, kind, payout_token_label, &self.config.format),
            applied_multiplier: multiplier,
            kind,
        })
    }

    /// Returns the unboosted details for a cashback.
    #[must_use]
    pub fn unboosted(&self, cashback: &Cashback, payout_token_label: &str) -> UserRateDetails {
        self.unboosted_amount(cashback.kind, cashback.amount, payout_token_label)
    }

    /// Returns the unboosted details for a bare amount.
    #[must_use]
    pub fn unboosted_amount(
        &self,
        kind: CashbackKind,
        amount: f64,
        payout_token_label: &str,
    ) -> UserRateDetails {
        UserRateDetails {
            base_amount: amount,
            boosted_amount: amount,
            formatted_rate: format_rate(amount, kind, payout_token_label, &self.config.format),
            applied_multiplier: 1.0,
            kind,
        }
    }

    /// Computes the effective rate, falling back to the unboosted base rate
    /// if the calculation fails.
    #[must_use]
    pub fn calculate_or_fallback(
        &self,
        cashback: &Cashback,
        payout_token_label: &str,
        boost_tier: Option<&BoostTier>,
    ) -> UserRateDetails {
        self.calculate(cashback, payout_token_label, boost_tier)
            .unwrap_or_else(|error| {
                tracing::warn!(
                    %error,
                    tier_id = boost_tier.map(|tier| tier.id.as_str()),
                    "rate calculation failed, showing base rate"
                );
                self.unboosted(cashback, payout_token_label)
            })
    }
}

/// Formats a rate for display.
///
/// Percentages render as `"7.5% in USDC"` (joiner from the configuration),
/// fixed amounts as `"20 USDC"`. An empty label yields the bare figure.
#[must_use]
pub fn format_rate(
    amount: f64,
    kind: CashbackKind,
    payout_token_label: &str,
    format: &FormatConfig,
) -> String {
    let figure = format_amount(amount, format.fraction_digits);
    let label = payout_token_label.trim();

    match kind {
        CashbackKind::Percentage if label.is_empty() => format!("{figure}%"),
        CashbackKind::Percentage => {
            let joiner = format.percentage_joiner.trim();
            if joiner.is_empty() {
                format!("{figure}% {label}")
            } else {
                format!("{figure}% {joiner} {label}")
            }
        },
        CashbackKind::Fixed if label.is_empty() => figure,
        CashbackKind::Fixed => format!("{figure} {label}"),
    }
}

/// Rounds to at most `fraction_digits` decimals and trims trailing zeros.
#[must_use]
pub fn format_amount(amount: f64, fraction_digits: u8) -> String {
    let mut text = format!("{amount:.prec$}", prec = usize::from(fraction_digits));
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text.remove(0);
    }
    text
}
