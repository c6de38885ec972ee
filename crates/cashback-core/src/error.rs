//! Error types for rate calculation.
//!
//! Every error in this module is a validation failure at the calculator
//! boundary. Expected states such as a missing boost tier or a zero
//! multiplier are never errors.

use thiserror::Error;

/// Errors that can occur while validating rate inputs or computing a rate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RateError {
    /// A cashback amount is negative or not a finite number.
    #[error("invalid amount for {field}: {value}")]
    InvalidAmount {
        /// The offending field.
        field: String,
        /// The rejected value.
        value: f64,
    },

    /// A required field is missing or has a non-numeric value.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A boost multiplier is negative or not a finite number.
    #[error("invalid multiplier for {field}: {value}")]
    InvalidMultiplier {
        /// The offending field.
        field: String,
        /// The rejected value.
        value: f64,
    },

    /// A split percentage lies outside `[0, 1]`.
    #[error("split percentage {field} out of range [0, 1]: {value}")]
    InvalidSplit {
        /// The offending field.
        field: String,
        /// The rejected value.
        value: f64,
    },

    /// The split percentages do not sum to one within tolerance.
    #[error("split percentages sum to {sum}, expected 1 (tolerance {tolerance})")]
    SplitSumMismatch {
        /// The observed sum.
        sum: f64,
        /// The allowed deviation from 1.
        tolerance: f64,
    },

    /// A tier qualification threshold is negative or not finite.
    #[error("invalid threshold for {field}: {value}")]
    InvalidThreshold {
        /// The offending field.
        field: String,
        /// The rejected value.
        value: f64,
    },

    /// A display rate string could not be parsed.
    #[error("unparseable rate: {input:?}")]
    UnparseableRate {
        /// The raw input.
        input: String,
    },

    /// The cashback type is neither `percentage` nor `fixed`.
    #[error("unknown cashback type: {kind:?}")]
    UnknownCashbackKind {
        /// The raw type tag.
        kind: String,
    },

    /// A search hit could not be decoded as an offer record.
    #[error("malformed offer record: {reason}")]
    MalformedOffer {
        /// The decode failure.
        reason: String,
    },

    /// A split-sum tolerance is negative or not finite.
    #[error("invalid split tolerance: {value}")]
    InvalidTolerance {
        /// The rejected value.
        value: f64,
    },
}

impl RateError {
    /// Creates a new invalid amount error.
    #[must_use]
    pub fn invalid_amount(field: impl Into<String>, value: f64) -> Self {
        Self::InvalidAmount {
            field: field.into(),
            value,
        }
    }

    /// Creates a new missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a new invalid multiplier error.
    #[must_use]
    pub fn invalid_multiplier(field: impl Into<String>, value: f64) -> Self {
        Self::InvalidMultiplier {
            field: field.into(),
            value,
        }
    }

    /// Creates a new invalid split error.
    #[must_use]
    pub fn invalid_split(field: impl Into<String>, value: f64) -> Self {
        Self::InvalidSplit {
            field: field.into(),
            value,
        }
    }

    /// Creates a new split sum mismatch error.
    #[must_use]
    pub const fn split_sum_mismatch(sum: f64, tolerance: f64) -> Self {
        Self::SplitSumMismatch { sum, tolerance }
    }

    /// Creates a new invalid threshold error.
    #[must_use]
    pub fn invalid_threshold(field: impl Into<String>, value: f64) -> Self {
        Self::InvalidThreshold {
            field: field.into(),
            value,
        }
    }

    /// Creates a new unparseable rate error.
    #[must_use]
    pub fn unparseable_rate(input: impl Into<String>) -> Self {
        Self::UnparseableRate {
            input: input.into(),
        }
    }

    /// Creates a new unknown cashback kind error.
    #[must_use]
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownCashbackKind { kind: kind.into() }
    }

    /// Creates a new malformed offer error.
    #[must_use]
    pub fn malformed_offer(reason: impl Into<String>) -> Self {
        Self::MalformedOffer {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid tolerance error.
    #[must_use]
    pub const fn invalid_tolerance(value: f64) -> Self {
        Self::InvalidTolerance { value }
    }

    /// Returns `true` if this error concerns a boost multiplier.
    #[must_use]
    pub const fn is_invalid_multiplier(&self) -> bool {
        matches!(self, Self::InvalidMultiplier { .. })
    }

    /// Returns `true` if this error concerns the offer's cashback figures
    /// rather than the user's tier.
    #[must_use]
    pub const fn is_offer_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::MissingField { .. }
                | Self::UnparseableRate { .. }
                | Self::UnknownCashbackKind { .. }
                | Self::MalformedOffer { .. }
        )
    }

    /// Returns `true` if this error is a validation failure.
    ///
    /// Currently every rate error is a validation failure; callers fall back
    /// to the unboosted base rate.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        true
    }
}
