//! The `cashback enrich` command: annotate a page of search results with a
//! user's effective rates.
//!
//! The offers file is either a bare JSON array of offers or a search
//! response object carrying them under `hits`. Reference data (partner
//! tokens, tiers) and the user profile are separate JSON files; any of them
//! may be omitted, in which case the user gets no label or no boost.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cashback_core::{
    BoostTier, CalculatorConfig, EnrichedOffer, PartnerToken, RateCalculator, TokenDirectory,
    UserProfile, UserRateContext, enrich_hits,
};
use clap::Args;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{OutputFormat, exit_codes, output_error, print_json, read_json};

/// Arguments for the `enrich` command.
#[derive(Debug, Args)]
pub struct EnrichArgs {
    /// JSON file with the offers (array or `{"hits": [...]}`).
    #[arg(long)]
    pub offers: PathBuf,

    /// JSON array of partner tokens.
    #[arg(long)]
    pub tokens: Option<PathBuf>,

    /// JSON array of boost tiers.
    #[arg(long)]
    pub tiers: Option<PathBuf>,

    /// JSON user profile with `payout_partner_token_id` and `boost_tier_id`.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Payout-token label, overriding the one resolved from the profile.
    #[arg(long)]
    pub label: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Extracts the hits from an offers file. Hits are left undecoded so a
/// malformed one only affects itself.
fn offer_hits(path: &Path) -> Result<Vec<Value>> {
    match read_json::<Value>(path)? {
        Value::Array(hits) => Ok(hits),
        Value::Object(mut response) => match response.remove("hits") {
            Some(Value::Array(hits)) => Ok(hits),
            Some(_) => bail!("{}: `hits` is not an array", path.display()),
            None => bail!("{}: search response has no `hits` array", path.display()),
        },
        _ => bail!(
            "{}: expected an array of offers or an object with `hits`",
            path.display()
        ),
    }
}

/// Runs the `enrich` command.
///
/// Offers that fall back to their base rate are not an error; the exit code
/// is non-zero only when an input file cannot be read.
pub fn run_enrich(args: &EnrichArgs, config: &CalculatorConfig) -> u8 {
    let result = enrich_from_files(args, config).and_then(|enriched| match args.format {
        OutputFormat::Json => print_json(&enriched),
        OutputFormat::Text => {
            print_table(&enriched);
            Ok(())
        },
    });

    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(error) => output_error(
            args.format,
            "invalid_input",
            &format!("{error:#}"),
            exit_codes::ERROR,
        ),
    }
}

/// Loads every input file and enriches the offers.
fn enrich_from_files(args: &EnrichArgs, config: &CalculatorConfig) -> Result<Vec<EnrichedOffer>> {
    let hits = offer_hits(&args.offers)?;
    let context = load_context(args)?;

    tracing::info!(
        offers = hits.len(),
        label = %context.payout_token_label,
        tier_id = context.boost_tier.as_ref().map(|tier| tier.id.as_str()),
        "enriching offers"
    );

    Ok(enrich_hits(
        &hits,
        &context,
        &RateCalculator::new(config.clone()),
    ))
}

fn load_context(args: &EnrichArgs) -> Result<UserRateContext> {
    let tokens: Vec<PartnerToken> = read_optional(args.tokens.as_deref())?;
    let tiers: Vec<BoostTier> = read_optional(args.tiers.as_deref())?;
    let profile: UserProfile = match args.profile.as_deref() {
        Some(path) => read_json(path).context("failed to load user profile")?,
        None => UserProfile::default(),
    };

    let mut context = UserRateContext::resolve(&profile, &TokenDirectory::new(tokens), &tiers);
    if let Some(label) = &args.label {
        context.payout_token_label.clone_from(label);
    }
    Ok(context)
}

fn read_optional<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    path.map_or_else(|| Ok(T::default()), read_json)
}

fn print_table(enriched: &[EnrichedOffer]) {
    for offer in enriched {
        let rate = offer.user_rate.as_ref().map_or_else(
            || {
                offer
                    .offer
                    .cashback
                    .as_ref()
                    .and_then(|cashback| cashback.rate.clone())
                    .unwrap_or_else(|| "-".to_string())
            },
            |details| details.formatted_rate.clone(),
        );

        let id = offer.offer.display_id();
        match &offer.fallback_reason {
            Some(reason) => println!("{id:<24} {rate:<20} (base rate: {reason})"),
            None => println!("{id:<24} {rate}"),
        }
    }
}
