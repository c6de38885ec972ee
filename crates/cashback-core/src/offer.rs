//! Offer and cashback types.
//!
//! Offers arrive from the search index as loosely shaped JSON. The
//! [`RawOffer`] and [`RawCashback`] wire types accept whatever the index
//! returns; [`Cashback`] is the validated form the calculator consumes.
//! Conversion happens once, at the boundary, via `TryFrom`.
//!
//! # Example
//!
//! ```rust
//! use cashback_core::offer::{Cashback, CashbackKind, RawCashback};
//!
//! let raw: RawCashback = serde_json::from_str(
//!     r#"{"rate": "5%", "amount": 5, "type": "percentage", "allRates": []}"#,
//! )
//! .unwrap();
//! let cashback = Cashback::try_from(&raw).unwrap();
//! assert_eq!(cashback.kind, CashbackKind::Percentage);
//! assert!((cashback.amount - 5.0).abs() < f64::EPSILON);
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::RateError;
use crate::rate::{DEFAULT_FRACTION_DIGITS, format_amount};
use crate::token::deserialize_optional_id;

const AMOUNT_FIELD: &str = "cashback.amount";
const TYPE_FIELD: &str = "cashback.type";
const UP_TO_PREFIX: &str = "up to";
const OBJECT_ID_FIELD: &str = "objectID";
const UNKNOWN_ID: &str = "<unknown>";

/// How a cashback amount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashbackKind {
    /// A percentage of the purchase price.
    Percentage,
    /// A fixed amount of the payout token.
    Fixed,
}

impl CashbackKind {
    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }

    /// Parses a wire tag (`percentage` or `fixed`, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`RateError::UnknownCashbackKind`] for any other tag.
    pub fn parse(tag: &str) -> Result<Self, RateError> {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("percentage") {
            Ok(Self::Percentage)
        } else if tag.eq_ignore_ascii_case("fixed") {
            Ok(Self::Fixed)
        } else {
            Err(RateError::unknown_kind(tag))
        }
    }
}

impl fmt::Display for CashbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cashback block of an offer as returned by the search index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCashback {
    /// Display rate, e.g. `"5%"`. Numeric rates are kept as their text.
    #[serde(default, deserialize_with = "deserialize_optional_rate")]
    pub rate: Option<String>,

    /// Numeric amount. Kept as raw JSON so non-numeric values surface as
    /// validation errors rather than decode failures.
    #[serde(default)]
    pub amount: Option<Value>,

    /// `percentage` or `fixed`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Per-category rates.
    #[serde(rename = "allRates", alias = "all_rates", default)]
    pub all_rates: Vec<RawRateEntry>,
}

/// One entry of an offer's `allRates` breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRateEntry {
    /// Category name, e.g. `"Electronics"`.
    #[serde(default)]
    pub name: Option<String>,

    /// Display rate.
    #[serde(default, deserialize_with = "deserialize_optional_rate")]
    pub rate: Option<String>,

    /// Numeric amount.
    #[serde(default)]
    pub amount: Option<Value>,

    /// `percentage` or `fixed`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Offer record as returned by the search index.
///
/// Fields the calculator does not read, the index's `objectID` included,
/// are preserved in `extra` so that the enriched offer can be handed to the
/// presentation layer unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOffer {
    /// Offer identifier, a string or an integer on the wire.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Merchant or product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Cashback block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback: Option<RawCashback>,

    /// Every other field of the record.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RawOffer {
    /// Decodes one search hit.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::MalformedOffer`] if the hit is not an object or
    /// one of the fields the calculator reads has the wrong shape.
    pub fn from_hit(hit: &Value) -> Result<Self, RateError> {
        Self::deserialize(hit).map_err(|error| RateError::malformed_offer(error.to_string()))
    }

    /// Wraps a hit that failed to decode, keeping all of its fields in
    /// `extra` so it still serializes as received.
    #[must_use]
    pub fn undecoded(hit: &Value) -> Self {
        Self {
            extra: hit.as_object().cloned().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Returns the index `objectID`, falling back to `id`, or
    /// `"<unknown>"` for logging.
    #[must_use]
    pub fn display_id(&self) -> Cow<'_, str> {
        let extra_id = |field: &str| match self.extra.get(field) {
            Some(Value::String(id)) => Some(Cow::Borrowed(id.as_str())),
            Some(Value::Number(id)) => Some(Cow::Owned(id.to_string())),
            _ => None,
        };

        extra_id(OBJECT_ID_FIELD)
            .or_else(|| self.id.as_deref().map(Cow::Borrowed))
            .or_else(|| extra_id("id"))
            .unwrap_or(Cow::Borrowed(UNKNOWN_ID))
    }

    /// Validates and returns the offer's cashback.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::MissingField`] if the offer has no cashback
    /// block, or any error from [`Cashback::try_from`].
    pub fn cashback(&self) -> Result<Cashback, RateError> {
        let raw = self
            .cashback
            .as_ref()
            .ok_or_else(|| RateError::missing_field("cashback"))?;
        Cashback::try_from(raw)
    }
}

/// A validated per-category rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Category name, if the index provided one.
    pub name: Option<String>,
    /// How the amount is expressed.
    pub kind: CashbackKind,
    /// Non-negative base amount.
    pub amount: f64,
    /// Display rate.
    pub rate: String,
}

/// An `allRates` entry that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRate {
    /// Position in `allRates`.
    pub index: usize,
    /// Category name, if any.
    pub name: Option<String>,
    /// Display rate as received, shown unboosted.
    pub rate: Option<String>,
    /// Why the entry was rejected.
    pub reason: String,
}

/// A validated cashback block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cashback {
    /// How the amount is expressed.
    pub kind: CashbackKind,
    /// Non-negative, finite base amount.
    pub amount: f64,
    /// Display rate as shown by the index.
    pub rate: String,
    /// Validated per-category rates, in `allRates` order.
    pub all_rates: Vec<RateEntry>,
    /// Per-category rates that failed validation. They never invalidate the
    /// headline cashback.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_rates: Vec<RejectedRate>,
}

impl Cashback {
    /// Creates a validated cashback with no category breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::InvalidAmount`] if `amount` is negative or not
    /// finite.
    pub fn new(kind: CashbackKind, amount: f64) -> Result<Self, RateError> {
        let amount = validate_amount(AMOUNT_FIELD, amount)?;
        Ok(Self {
            kind,
            amount,
            rate: display_rate(kind, amount),
            all_rates: Vec::new(),
            rejected_rates: Vec::new(),
        })
    }

    /// Creates a cashback from a display rate string such as `"5%"`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`parse_rate`].
    pub fn from_display_rate(rate: &str) -> Result<Self, RateError> {
        let (amount, kind) = parse_rate(rate)?;
        Ok(Self {
            kind,
            amount,
            rate: rate.trim().to_string(),
            all_rates: Vec::new(),
            rejected_rates: Vec::new(),
        })
    }
}

impl TryFrom<&RawCashback> for Cashback {
    type Error = RateError;

    fn try_from(raw: &RawCashback) -> Result<Self, Self::Error> {
        let kind = resolve_kind(raw.kind.as_deref(), raw.rate.as_deref(), TYPE_FIELD)?;
        let amount = numeric_amount(raw.amount.as_ref(), AMOUNT_FIELD)?;

        let mut all_rates = Vec::with_capacity(raw.all_rates.len());
        let mut rejected_rates = Vec::new();
        for (index, entry) in raw.all_rates.iter().enumerate() {
            match RateEntry::validate(entry, index, kind) {
                Ok(rate) => all_rates.push(rate),
                Err(error) => rejected_rates.push(RejectedRate {
                    index,
                    name: entry.name.clone(),
                    rate: entry.rate.clone(),
                    reason: error.to_string(),
                }),
            }
        }

        Ok(Self {
            kind,
            amount,
            rate: raw
                .rate
                .clone()
                .unwrap_or_else(|| display_rate(kind, amount)),
            all_rates,
            rejected_rates,
        })
    }
}

impl RateEntry {
    fn validate(
        raw: &RawRateEntry,
        index: usize,
        parent_kind: CashbackKind,
    ) -> Result<Self, RateError> {
        let amount_field = format!("cashback.allRates[{index}].amount");

        // Untyped entries follow their display rate when it parses and the
        // headline kind otherwise ("varies", "see terms").
        let kind = match (raw.kind.as_deref(), raw.rate.as_deref()) {
            (Some(tag), _) => CashbackKind::parse(tag)?,
            (None, Some(rate)) => parse_rate(rate).map_or(parent_kind, |(_, kind)| kind),
            (None, None) => parent_kind,
        };
        let amount = numeric_amount(raw.amount.as_ref(), &amount_field)?;

        Ok(Self {
            name: raw.name.clone(),
            kind,
            amount,
            rate: raw
                .rate
                .clone()
                .unwrap_or_else(|| display_rate(kind, amount)),
        })
    }
}

/// Parses a display rate such as `"5%"`, `"Up to 8%"` or `"$10"`.
///
/// A trailing `%` yields [`CashbackKind::Percentage`]; a leading `$` or a
/// bare number yields [`CashbackKind::Fixed`]. Thousands separators are
/// ignored.
///
/// # Errors
///
/// Returns [`RateError::UnparseableRate`] for empty, signed, non-numeric or
/// non-finite input.
pub fn parse_rate(input: &str) -> Result<(f64, CashbackKind), RateError> {
    let unparseable = || RateError::unparseable_rate(input);

    let mut text = input.trim();
    if let Some(prefix) = text.get(..UP_TO_PREFIX.len()) {
        if prefix.eq_ignore_ascii_case(UP_TO_PREFIX) {
            text = text[UP_TO_PREFIX.len()..].trim_start();
        }
    }

    let (number, kind) = if let Some(number) = text.strip_suffix('%') {
        (number.trim_end(), CashbackKind::Percentage)
    } else if let Some(number) = text.strip_prefix('$') {
        (number.trim_start(), CashbackKind::Fixed)
    } else {
        (text, CashbackKind::Fixed)
    };

    if number.is_empty() || number.starts_with(['-', '+']) {
        return Err(unparseable());
    }

    let value: f64 = number.replace(',', "").parse().map_err(|_| unparseable())?;
    if !value.is_finite() {
        return Err(unparseable());
    }

    Ok((value, kind))
}

fn resolve_kind(
    tag: Option<&str>,
    rate: Option<&str>,
    field: &str,
) -> Result<CashbackKind, RateError> {
    match (tag, rate) {
        (Some(tag), _) => CashbackKind::parse(tag),
        // The index occasionally drops `type`; the display rate still says
        // which kind it is.
        (None, Some(rate)) => parse_rate(rate).map(|(_, kind)| kind),
        (None, None) => Err(RateError::missing_field(field)),
    }
}

/// Display rates are usually strings but some records carry a bare number.
fn deserialize_optional_rate<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRate {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<RawRate>::deserialize(deserializer)?.map(|rate| match rate {
            RawRate::Text(text) => text,
            RawRate::Number(number) => number.to_string(),
        }),
    )
}

fn numeric_amount(value: Option<&Value>, field: &str) -> Result<f64, RateError> {
    let amount = value
        .and_then(Value::as_f64)
        .ok_or_else(|| RateError::missing_field(field))?;
    validate_amount(field, amount)
}

fn validate_amount(field: &str, amount: f64) -> Result<f64, RateError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(RateError::invalid_amount(field, amount));
    }
    Ok(amount)
}

fn display_rate(kind: CashbackKind, amount: f64) -> String {
    let figure = format_amount(amount, DEFAULT_FRACTION_DIGITS);
    match kind {
        CashbackKind::Percentage => format!("{figure}%"),
        CashbackKind::Fixed => figure,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawCashback {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(
            CashbackKind::parse("percentage").unwrap(),
            CashbackKind::Percentage
        );
        assert_eq!(CashbackKind::parse("FIXED").unwrap(), CashbackKind::Fixed);
        assert!(matches!(
            CashbackKind::parse("tiered"),
            Err(RateError::UnknownCashbackKind { .. })
        ));
    }

    #[test]
    fn test_parse_rate_accepted_forms() {
        assert_eq!(parse_rate("5%").unwrap(), (5.0, CashbackKind::Percentage));
        assert_eq!(parse_rate(" 2.4 % ").unwrap(), (2.4, CashbackKind::Percentage));
        assert_eq!(parse_rate("Up to 8%").unwrap(), (8.0, CashbackKind::Percentage));
        assert_eq!(parse_rate("$10").unwrap(), (10.0, CashbackKind::Fixed));
        assert_eq!(parse_rate("10").unwrap(), (10.0, CashbackKind::Fixed));
        assert_eq!(parse_rate("$1,250").unwrap(), (1250.0, CashbackKind::Fixed));
    }

    #[test]
    fn test_parse_rate_rejected_forms() {
        for input in ["", "   ", "%", "abc", "-5%", "+5%", "$-3", "inf%", "NaN"] {
            assert!(
                matches!(parse_rate(input), Err(RateError::UnparseableRate { .. })),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_cashback_from_raw() {
        let cashback = Cashback::try_from(&raw(json!({
            "rate": "5%",
            "amount": 5,
            "type": "percentage",
            "allRates": [
                {"name": "Electronics", "rate": "2%", "amount": 2, "type": "percentage"},
                {"name": "Gift cards", "amount": 1.5}
            ]
        })))
        .unwrap();

        assert_eq!(cashback.kind, CashbackKind::Percentage);
        assert!((cashback.amount - 5.0).abs() < f64::EPSILON);
        assert_eq!(cashback.rate, "5%");
        assert_eq!(cashback.all_rates.len(), 2);
        assert_eq!(cashback.all_rates[1].kind, CashbackKind::Percentage);
        assert_eq!(cashback.all_rates[1].rate, "1.5%");
    }

    #[test]
    fn test_cashback_missing_amount() {
        let err = Cashback::try_from(&raw(json!({"rate": "5%", "type": "percentage"})))
            .unwrap_err();
        assert_eq!(err, RateError::missing_field("cashback.amount"));
    }

    #[test]
    fn test_cashback_non_numeric_amount() {
        let err = Cashback::try_from(&raw(json!({"amount": "five", "type": "fixed"})))
            .unwrap_err();
        assert_eq!(err, RateError::missing_field("cashback.amount"));
    }

    #[test]
    fn test_cashback_negative_amount() {
        let err =
            Cashback::try_from(&raw(json!({"amount": -1, "type": "fixed"}))).unwrap_err();
        assert!(matches!(err, RateError::InvalidAmount { .. }));
    }

    #[test]
    fn test_cashback_kind_inferred_from_rate() {
        let cashback = Cashback::try_from(&raw(json!({"rate": "$3", "amount": 3}))).unwrap();
        assert_eq!(cashback.kind, CashbackKind::Fixed);
    }

    #[test]
    fn test_cashback_without_kind_or_rate() {
        let err = Cashback::try_from(&raw(json!({"amount": 3}))).unwrap_err();
        assert_eq!(err, RateError::missing_field("cashback.type"));
    }

    #[test]
    fn test_bad_all_rates_entry_is_rejected_alone() {
        let cashback = Cashback::try_from(&raw(json!({
            "amount": 3,
            "type": "fixed",
            "allRates": [{"amount": 1}, {"name": "Travel", "amount": -4}, {"amount": 2}]
        })))
        .unwrap();

        assert!((cashback.amount - 3.0).abs() < f64::EPSILON);
        assert_eq!(cashback.all_rates.len(), 2);
        assert_eq!(cashback.rejected_rates.len(), 1);

        let rejected = &cashback.rejected_rates[0];
        assert_eq!(rejected.index, 1);
        assert_eq!(rejected.name.as_deref(), Some("Travel"));
        assert_eq!(
            rejected.reason,
            RateError::invalid_amount("cashback.allRates[1].amount", -4.0).to_string()
        );
    }

    #[test]
    fn test_untyped_entry_with_free_text_rate_inherits_kind() {
        let cashback = Cashback::try_from(&raw(json!({
            "rate": "5%",
            "amount": 5,
            "type": "percentage",
            "allRates": [{"name": "Other", "rate": "varies", "amount": 1}]
        })))
        .unwrap();

        assert!(cashback.rejected_rates.is_empty());
        assert_eq!(cashback.all_rates[0].kind, CashbackKind::Percentage);
        assert_eq!(cashback.all_rates[0].rate, "varies");
    }

    #[test]
    fn test_numeric_rate_is_accepted() {
        let cashback =
            Cashback::try_from(&raw(json!({"rate": 5, "amount": 5, "type": "percentage"})))
                .unwrap();
        assert_eq!(cashback.rate, "5");
        assert_eq!(cashback.kind, CashbackKind::Percentage);
    }

    #[test]
    fn test_raw_offer_preserves_extra_fields() {
        let offer: RawOffer = serde_json::from_value(json!({
            "objectID": "offer-1",
            "name": "Acme",
            "logo": "https://cdn.example/acme.png",
            "cashback": {"amount": 4, "type": "percentage"}
        }))
        .unwrap();

        assert_eq!(offer.display_id(), "offer-1");
        assert_eq!(offer.extra.get("objectID"), Some(&json!("offer-1")));
        assert_eq!(offer.extra.get("logo"), Some(&json!("https://cdn.example/acme.png")));
        assert_eq!(offer.cashback().unwrap().rate, "4%");
    }

    #[test]
    fn test_hit_id_shapes() {
        let numeric = RawOffer::from_hit(&json!({"objectID": 42, "cashback": {"amount": 1}}))
            .unwrap();
        assert_eq!(numeric.display_id(), "42");

        let both = RawOffer::from_hit(&json!({"objectID": "a", "id": 7})).unwrap();
        assert_eq!(both.id.as_deref(), Some("7"));
        assert_eq!(both.display_id(), "a");

        let rendered = serde_json::to_value(&both).unwrap();
        assert_eq!(rendered, json!({"objectID": "a", "id": "7"}));
    }

    #[test]
    fn test_malformed_hit_is_kept_verbatim() {
        let hit = json!({"objectID": "bad", "cashback": "five percent", "logo": "x.png"});

        let err = RawOffer::from_hit(&hit).unwrap_err();
        assert!(matches!(err, RateError::MalformedOffer { .. }));

        let offer = RawOffer::undecoded(&hit);
        assert_eq!(offer.display_id(), "bad");
        assert!(offer.cashback.is_none());
        assert_eq!(serde_json::to_value(&offer).unwrap(), hit);
    }

    #[test]
    fn test_raw_offer_without_cashback() {
        let offer = RawOffer::default();
        assert_eq!(offer.display_id(), "<unknown>");
        assert_eq!(offer.cashback().unwrap_err(), RateError::missing_field("cashback"));
    }

    #[test]
    fn test_from_display_rate() {
        let cashback = Cashback::from_display_rate("Up to 8%").unwrap();
        assert_eq!(cashback.kind, CashbackKind::Percentage);
        assert!((cashback.amount - 8.0).abs() < f64::EPSILON);
        assert_eq!(cashback.rate, "Up to 8%");
    }
}
