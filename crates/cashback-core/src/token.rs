//! Partner tokens a user can receive cashback in.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A token users can select for payouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerToken {
    /// Token identifier, referenced by `payout_partner_token_id` on the
    /// user profile.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Label shown next to rates, e.g. `"USDC"` or `"USDC on Base"`.
    #[serde(default)]
    pub display_label: String,

    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
}

impl PartnerToken {
    /// Creates a partner token.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_label: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_label: display_label.into(),
            symbol: symbol.into(),
        }
    }

    /// Returns the display label, falling back to the symbol when the label
    /// is blank.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.display_label.trim().is_empty() {
            &self.symbol
        } else {
            &self.display_label
        }
    }
}

/// Partner tokens indexed by id.
#[derive(Debug, Clone, Default)]
pub struct TokenDirectory {
    tokens: HashMap<String, PartnerToken>,
}

impl TokenDirectory {
    /// Builds a directory. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = PartnerToken>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|token| (token.id.clone(), token))
                .collect(),
        }
    }

    /// Returns the token with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PartnerToken> {
        self.tokens.get(id)
    }

    /// Returns the display label for the given token id.
    #[must_use]
    pub fn display_label(&self, id: &str) -> Option<&str> {
        self.get(id).map(PartnerToken::label)
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Reference-data ids are strings or integers depending on the table.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Integer(value) => value.to_string(),
    })
}

/// Like [`deserialize_id`] for optional ids.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "deserialize_id")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(id)| id))
}
