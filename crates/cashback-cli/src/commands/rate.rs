//! The `cashback rate` command: compute one user rate.
//!
//! Takes a base amount (or a display rate such as `"5%"`), a payout-token
//! label and an optional tier file, and prints the effective rate.

use std::path::PathBuf;

use anyhow::Result;
use cashback_core::{
    BoostTier, CalculatorConfig, Cashback, CashbackKind, RateCalculator, RateError,
    UserRateDetails,
};
use clap::{Args, ValueEnum};

use super::{OutputFormat, exit_codes, output_error, print_json, read_json};

/// Cashback kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Percentage of the purchase.
    Percentage,
    /// Fixed token amount.
    Fixed,
}

impl From<KindArg> for CashbackKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Percentage => Self::Percentage,
            KindArg::Fixed => Self::Fixed,
        }
    }
}

/// Arguments for the `rate` command.
#[derive(Debug, Args)]
pub struct RateArgs {
    /// Base cashback amount.
    #[arg(long, conflicts_with = "rate", required_unless_present = "rate")]
    pub amount: Option<f64>,

    /// Display rate instead of an amount (e.g. "5%", "$10").
    #[arg(long)]
    pub rate: Option<String>,

    /// How `--amount` is expressed. A display rate carries its own kind.
    #[arg(
        long,
        value_enum,
        default_value_t = KindArg::Percentage,
        conflicts_with = "rate"
    )]
    pub kind: KindArg,

    /// Payout-token display label.
    #[arg(long, default_value = "")]
    pub label: String,

    /// JSON file holding the user's boost tier record.
    #[arg(long)]
    pub tier: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Runs the `rate` command.
pub fn run_rate(args: &RateArgs, config: &CalculatorConfig) -> u8 {
    let tier = match args.tier.as_deref().map(read_json::<BoostTier>).transpose() {
        Ok(tier) => tier,
        Err(error) => {
            return output_error(
                args.format,
                "invalid_input",
                &format!("{error:#}"),
                exit_codes::ERROR,
            );
        },
    };

    match compute(args, config, tier.as_ref()) {
        Ok(details) => match print_details(&details, args.format) {
            Ok(()) => exit_codes::SUCCESS,
            Err(error) => {
                output_error(args.format, "output", &format!("{error:#}"), exit_codes::ERROR)
            },
        },
        Err(error) => output_error(
            args.format,
            "validation_error",
            &error.to_string(),
            exit_codes::VALIDATION_ERROR,
        ),
    }
}

/// Computes the details for the given arguments.
fn compute(
    args: &RateArgs,
    config: &CalculatorConfig,
    tier: Option<&BoostTier>,
) -> Result<UserRateDetails, RateError> {
    let cashback = match (&args.rate, args.amount) {
        (Some(rate), _) => Cashback::from_display_rate(rate)?,
        (None, Some(amount)) => Cashback::new(args.kind.into(), amount)?,
        (None, None) => return Err(RateError::missing_field("amount")),
    };

    RateCalculator::new(config.clone()).calculate(&cashback, &args.label, tier)
}

fn print_details(details: &UserRateDetails, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(details)?,
        OutputFormat::Text => {
            println!("{}", details.formatted_rate);
            if details.is_boosted() {
                println!(
                    "  base {} x{} boost",
                    cashback_core::rate::format_amount(details.base_amount, 8),
                    cashback_core::rate::format_amount(details.applied_multiplier, 8)
                );
            }
        },
    }
    Ok(())
}
