//! Boost tiers.
//!
//! A [`BoostTier`] is reference data describing how much a user's cashback
//! is boosted and how the reward is split between the payout token, the
//! platform token and the platform fee. Tiers are fetched per request and
//! passed to the calculator explicitly.
//!
//! # Split percentages
//!
//! The three split fields are stored independently upstream and are not
//! guaranteed to sum to one. [`SplitPolicy::Independent`] (the default)
//! checks each field's range only; [`SplitPolicy::SumToOne`] additionally
//! enforces the sum.

use serde::{Deserialize, Serialize};

use crate::error::RateError;
use crate::token::deserialize_id;

/// How split percentages are validated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SplitPolicy {
    /// Each split must lie in `[0, 1]`; the sum is unconstrained.
    #[default]
    Independent,
    /// Each split must lie in `[0, 1]` and the sum must be within
    /// `tolerance` of one.
    SumToOne {
        /// Allowed deviation from one.
        tolerance: f64,
    },
}

impl SplitPolicy {
    /// Creates a [`SplitPolicy::SumToOne`] policy.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::InvalidTolerance`] if `tolerance` is negative or
    /// not finite.
    pub fn sum_to_one(tolerance: f64) -> Result<Self, RateError> {
        check_tolerance(tolerance)?;
        Ok(Self::SumToOne { tolerance })
    }
}

/// A user boost tier record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostTier {
    /// Tier identifier.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Display name, e.g. `"Gold"`.
    #[serde(default)]
    pub name: String,

    /// Multiplier applied to platform-token rewards.
    #[serde(default = "identity_multiplier")]
    pub platform_token_boost_multiplier: f64,

    /// Multiplier applied to payout-token cashback.
    #[serde(default = "identity_multiplier")]
    pub payout_token_boost_multiplier: f64,

    /// Share of the reward paid in the payout token.
    #[serde(default)]
    pub payout_token_split_percentage: f64,

    /// Share of the reward paid in the platform token.
    #[serde(default)]
    pub platform_token_split_percentage: f64,

    /// Share of the reward retained as platform fee.
    #[serde(default)]
    pub platform_fee_split_percentage: f64,

    /// Platform tokens a user must stake to qualify.
    #[serde(default)]
    pub minimum_platform_token_staked_amount: f64,

    /// Monthly average purchases a user must make to qualify.
    #[serde(default)]
    pub minimum_monthly_average_purchases_amount: f64,

    /// Inactive tiers never boost.
    pub is_active: bool,
}

const fn identity_multiplier() -> f64 {
    1.0
}

/// A reward divided according to a tier's split percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardSplit {
    /// Portion paid in the payout token, after the payout boost.
    pub payout_token_amount: f64,
    /// Portion paid in the platform token, after the platform boost.
    pub platform_token_amount: f64,
    /// Portion retained as platform fee.
    pub platform_fee_amount: f64,
}

impl BoostTier {
    /// Creates an active tier with the given payout multiplier and no splits
    /// or qualification thresholds.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, payout_multiplier: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            platform_token_boost_multiplier: 1.0,
            payout_token_boost_multiplier: payout_multiplier,
            payout_token_split_percentage: 0.0,
            platform_token_split_percentage: 0.0,
            platform_fee_split_percentage: 0.0,
            minimum_platform_token_staked_amount: 0.0,
            minimum_monthly_average_purchases_amount: 0.0,
            is_active: true,
        }
    }

    /// Sets the platform-token multiplier.
    #[must_use]
    pub const fn with_platform_multiplier(mut self, multiplier: f64) -> Self {
        self.platform_token_boost_multiplier = multiplier;
        self
    }

    /// Sets the payout, platform and fee split percentages.
    #[must_use]
    pub const fn with_splits(mut self, payout: f64, platform: f64, fee: f64) -> Self {
        self.payout_token_split_percentage = payout;
        self.platform_token_split_percentage = platform;
        self.platform_fee_split_percentage = fee;
        self
    }

    /// Sets the staking and purchase thresholds.
    #[must_use]
    pub const fn with_minimums(mut self, staked: f64, monthly_purchases: f64) -> Self {
        self.minimum_platform_token_staked_amount = staked;
        self.minimum_monthly_average_purchases_amount = monthly_purchases;
        self
    }

    /// Sets whether the tier is active.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the payout-token multiplier actually applied: the stored
    /// multiplier for an active tier, `1.0` otherwise.
    #[must_use]
    pub const fn payout_multiplier(&self) -> f64 {
        if self.is_active {
            self.payout_token_boost_multiplier
        } else {
            1.0
        }
    }

    /// Returns the platform-token multiplier actually applied.
    #[must_use]
    pub const fn platform_multiplier(&self) -> f64 {
        if self.is_active {
            self.platform_token_boost_multiplier
        } else {
            1.0
        }
    }

    /// Validates every numeric field of the tier.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: a negative or non-finite
    /// multiplier, a split outside `[0, 1]`, a split sum off by more than
    /// the policy's tolerance, or a negative threshold.
    pub fn validate(&self, policy: SplitPolicy) -> Result<(), RateError> {
        for (field, value) in [
            (
                "platform_token_boost_multiplier",
                self.platform_token_boost_multiplier,
            ),
            (
                "payout_token_boost_multiplier",
                self.payout_token_boost_multiplier,
            ),
        ] {
            check_multiplier(field, value)?;
        }

        let splits = [
            (
                "payout_token_split_percentage",
                self.payout_token_split_percentage,
            ),
            (
                "platform_token_split_percentage",
                self.platform_token_split_percentage,
            ),
            (
                "platform_fee_split_percentage",
                self.platform_fee_split_percentage,
            ),
        ];
        for (field, value) in splits {
            if !(0.0..=1.0).contains(&value) {
                return Err(RateError::invalid_split(field, value));
            }
        }

        if let SplitPolicy::SumToOne { tolerance } = policy {
            check_tolerance(tolerance)?;
            let sum: f64 = splits.iter().map(|(_, value)| value).sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(RateError::split_sum_mismatch(sum, tolerance));
            }
        }

        for (field, value) in [
            (
                "minimum_platform_token_staked_amount",
                self.minimum_platform_token_staked_amount,
            ),
            (
                "minimum_monthly_average_purchases_amount",
                self.minimum_monthly_average_purchases_amount,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RateError::invalid_threshold(field, value));
            }
        }

        Ok(())
    }

    /// Divides `amount` by the tier's split percentages, boosting the payout
    /// and platform portions by their multipliers.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is negative or not finite, or if the
    /// tier fails [`SplitPolicy::Independent`] validation.
    pub fn split(&self, amount: f64) -> Result<RewardSplit, RateError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RateError::invalid_amount("amount", amount));
        }
        self.validate(SplitPolicy::Independent)?;

        Ok(RewardSplit {
            payout_token_amount: amount
                * self.payout_token_split_percentage
                * self.payout_multiplier(),
            platform_token_amount: amount
                * self.platform_token_split_percentage
                * self.platform_multiplier(),
            platform_fee_amount: amount * self.platform_fee_split_percentage,
        })
    }

    /// Returns `true` if a user with the given stake and monthly average
    /// purchases meets this tier's thresholds. Inactive tiers never qualify.
    #[must_use]
    pub fn qualifies(&self, staked: f64, monthly_average_purchases: f64) -> bool {
        self.is_active
            && staked >= self.minimum_platform_token_staked_amount
            && monthly_average_purchases >= self.minimum_monthly_average_purchases_amount
    }
}

/// Returns the best tier a user qualifies for: the active, valid tier with
/// the highest payout multiplier whose thresholds the user meets.
#[must_use]
pub fn select_tier(
    tiers: &[BoostTier],
    staked: f64,
    monthly_average_purchases: f64,
) -> Option<&BoostTier> {
    tiers
        .iter()
        .filter(|tier| tier.qualifies(staked, monthly_average_purchases))
        .filter(|tier| {
            tier.validate(SplitPolicy::Independent)
                .inspect_err(|error| {
                    tracing::warn!(tier_id = %tier.id, %error, "skipping invalid boost tier");
                })
                .is_ok()
        })
        .max_by(|a, b| {
            a.payout_token_boost_multiplier
                .total_cmp(&b.payout_token_boost_multiplier)
        })
}

fn check_tolerance(tolerance: f64) -> Result<(), RateError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(RateError::invalid_tolerance(tolerance));
    }
    Ok(())
}

pub(crate) fn check_multiplier(field: &str, value: f64) -> Result<f64, RateError> {
    if !value.is_finite() || value < 0.0 {
        return Err(RateError::invalid_multiplier(field, value));
    }
    Ok(value)
}
