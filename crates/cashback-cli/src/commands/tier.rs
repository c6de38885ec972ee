//! The `cashback tier` commands: validate tier records and pick a user's
//! tier.

use std::path::{Path, PathBuf};

use anyhow::Result;
use cashback_core::{BoostTier, CalculatorConfig, RateError, SplitPolicy, select_tier};
use clap::{Args, Subcommand};
use serde::Serialize;

use super::{OutputFormat, exit_codes, output_error, print_json, read_json};

/// Tier command group.
#[derive(Debug, Args)]
pub struct TierCommand {
    #[command(subcommand)]
    pub subcommand: TierSubcommand,
}

/// Tier subcommands.
#[derive(Debug, Subcommand)]
pub enum TierSubcommand {
    /// Validate a JSON array of tier records.
    ///
    /// Exits with a non-zero code when any tier is invalid.
    Validate(ValidateArgs),

    /// Pick the best tier for a user's stake and purchase volume.
    Select(SelectArgs),
}

/// Arguments for `tier validate`.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// JSON file holding an array of tiers.
    pub path: PathBuf,

    /// Require split percentages to sum to one, whatever the config says.
    #[arg(long)]
    pub strict_splits: bool,

    /// Tolerance for `--strict-splits` (defaults to the configured value).
    #[arg(long, requires = "strict_splits")]
    pub tolerance: Option<f64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for `tier select`.
#[derive(Debug, Args)]
pub struct SelectArgs {
    /// JSON file holding an array of tiers.
    pub path: PathBuf,

    /// Platform tokens the user has staked.
    #[arg(long, default_value_t = 0.0)]
    pub staked: f64,

    /// The user's monthly average purchases.
    #[arg(long, default_value_t = 0.0)]
    pub purchases: f64,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Validation outcome for one tier.
#[derive(Debug, Serialize)]
struct TierReport {
    id: String,
    name: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Runs a tier subcommand.
pub fn run_tier(cmd: &TierCommand, config: &CalculatorConfig) -> u8 {
    match &cmd.subcommand {
        TierSubcommand::Validate(args) => run_validate(args, config),
        TierSubcommand::Select(args) => run_select(args),
    }
}

fn run_validate(args: &ValidateArgs, config: &CalculatorConfig) -> u8 {
    let tiers = match load_tiers(&args.path) {
        Ok(tiers) => tiers,
        Err(error) => {
            return output_error(
                args.format,
                "invalid_input",
                &format!("{error:#}"),
                exit_codes::ERROR,
            );
        },
    };

    let policy = match resolve_policy(args, config) {
        Ok(policy) => policy,
        Err(error) => {
            return output_error(
                args.format,
                "invalid_argument",
                &format!("--tolerance: {error}"),
                exit_codes::ERROR,
            );
        },
    };
    let reports = validate_all(&tiers, policy);
    let invalid = reports.iter().filter(|report| !report.valid).count();

    let printed = match args.format {
        OutputFormat::Json => print_json(&reports),
        OutputFormat::Text => {
            for report in &reports {
                match &report.error {
                    Some(error) => println!("FAIL {} ({}): {error}", report.id, report.name),
                    None => println!("ok   {} ({})", report.id, report.name),
                }
            }
            println!("{} tiers, {invalid} invalid", reports.len());
            Ok(())
        },
    };
    if let Err(error) = printed {
        return output_error(args.format, "output", &format!("{error:#}"), exit_codes::ERROR);
    }

    if invalid == 0 {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_ERROR
    }
}

fn run_select(args: &SelectArgs) -> u8 {
    let tiers = match load_tiers(&args.path) {
        Ok(tiers) => tiers,
        Err(error) => {
            return output_error(
                args.format,
                "invalid_input",
                &format!("{error:#}"),
                exit_codes::ERROR,
            );
        },
    };

    let selected = select_tier(&tiers, args.staked, args.purchases);
    let printed = match args.format {
        OutputFormat::Json => print_json(&selected),
        OutputFormat::Text => {
            match selected {
                Some(tier) => println!(
                    "{} ({}) x{}",
                    tier.id, tier.name, tier.payout_token_boost_multiplier
                ),
                None => println!("no qualifying tier"),
            }
            Ok(())
        },
    };

    match printed {
        Ok(()) => exit_codes::SUCCESS,
        Err(error) => output_error(args.format, "output", &format!("{error:#}"), exit_codes::ERROR),
    }
}

fn load_tiers(path: &Path) -> Result<Vec<BoostTier>> {
    read_json(path)
}

/// The `--strict-splits` flag overrides the configured policy.
fn resolve_policy(
    args: &ValidateArgs,
    config: &CalculatorConfig,
) -> Result<SplitPolicy, RateError> {
    if args.strict_splits {
        SplitPolicy::sum_to_one(args.tolerance.unwrap_or(config.tiers.split_tolerance))
    } else {
        Ok(config.tiers.policy())
    }
}

fn validate_all(tiers: &[BoostTier], policy: SplitPolicy) -> Vec<TierReport> {
    tiers
        .iter()
        .map(|tier| {
            let error = tier.validate(policy).err().map(|error| {
                tracing::debug!(tier_id = %tier.id, %error, "tier failed validation");
                error.to_string()
            });
            TierReport {
                id: tier.id.clone(),
                name: tier.name.clone(),
                valid: error.is_none(),
                error,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const TIERS: &str = r#"[
        {"id": 1, "name": "Explorer", "is_active": true},
        {"id": 2, "name": "Voyager", "payout_token_boost_multiplier": 1.5,
         "payout_token_split_percentage": 0.8, "platform_token_split_percentage": 0.15,
         "platform_fee_split_percentage": 0.05,
         "minimum_platform_token_staked_amount": 500, "is_active": true}
    ]"#;

    fn tier_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    fn validate_args(path: &Path, strict_splits: bool) -> ValidateArgs {
        ValidateArgs {
            path: path.to_path_buf(),
            strict_splits,
            tolerance: None,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_validate_independent_policy() {
        let file = tier_file(TIERS);
        let code = run_validate(
            &validate_args(file.path(), false),
            &CalculatorConfig::default(),
        );
        assert_eq!(code, exit_codes::SUCCESS);
    }

    #[test]
    fn test_validate_strict_splits_flags_unsplit_tier() {
        let file = tier_file(TIERS);
        let args = validate_args(file.path(), true);
        let config = CalculatorConfig::default();

        let policy = resolve_policy(&args, &config).unwrap();
        let reports = validate_all(&load_tiers(file.path()).unwrap(), policy);
        assert!(!reports[0].valid);
        assert!(reports[1].valid);
        assert_eq!(run_validate(&args, &config), exit_codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_validate_negative_multiplier() {
        let file = tier_file(
            r#"[{"id": "x", "name": "Broken", "payout_token_boost_multiplier": -1, "is_active": true}]"#,
        );
        let reports = validate_all(
            &load_tiers(file.path()).unwrap(),
            SplitPolicy::Independent,
        );
        assert!(
            reports[0]
                .error
                .as_deref()
                .unwrap()
                .contains("payout_token_boost_multiplier")
        );
    }

    #[test]
    fn test_resolve_policy_from_config() {
        let config = CalculatorConfig::from_toml(
            r#"
            [tiers]
            split_policy = "sum_to_one"
            split_tolerance = 0.01
            "#,
        )
        .unwrap();
        let file = tier_file(TIERS);

        assert_eq!(
            resolve_policy(&validate_args(file.path(), false), &config),
            Ok(SplitPolicy::SumToOne { tolerance: 0.01 })
        );

        let mut args = validate_args(file.path(), true);
        args.tolerance = Some(0.5);
        assert_eq!(
            resolve_policy(&args, &config),
            Ok(SplitPolicy::SumToOne { tolerance: 0.5 })
        );
    }

    #[test]
    fn test_bad_tolerance_is_rejected() {
        let file = tier_file(
            r#"[{"id": 1, "name": "Loose", "payout_token_split_percentage": 0.9,
                 "platform_token_split_percentage": 0.9, "platform_fee_split_percentage": 0.9,
                 "is_active": true}]"#,
        );
        let config = CalculatorConfig::default();

        for tolerance in [f64::NAN, -0.5, f64::INFINITY] {
            let mut args = validate_args(file.path(), true);
            args.tolerance = Some(tolerance);
            assert!(resolve_policy(&args, &config).is_err());
            assert_eq!(run_validate(&args, &config), exit_codes::ERROR);
        }
    }

    #[test]
    fn test_select_and_missing_file() {
        let file = tier_file(TIERS);
        let args = SelectArgs {
            path: file.path().to_path_buf(),
            staked: 600.0,
            purchases: 0.0,
            format: OutputFormat::Json,
        };
        assert_eq!(run_select(&args), exit_codes::SUCCESS);

        let missing = SelectArgs {
            path: PathBuf::from("/nonexistent/tiers.json"),
            ..args
        };
        assert_eq!(run_select(&missing), exit_codes::ERROR);
    }
}
