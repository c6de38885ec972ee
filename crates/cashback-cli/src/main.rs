//! cashback - boosted cashback rate calculator
//!
//! Computes the rate a user sees on an offer once their payout token and
//! boost tier are applied.

use std::path::PathBuf;

use cashback_core::CalculatorConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

/// cashback - boosted cashback rate calculator
#[derive(Parser, Debug)]
#[command(name = "cashback")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to calculator configuration file
    #[arg(short, long, default_value = "cashback.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a single user rate
    Rate(commands::rate::RateArgs),

    /// Enrich a list of offers with the user's rates
    Enrich(commands::enrich::EnrichArgs),

    /// Boost tier tools
    Tier(commands::tier::TierCommand),
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = match CalculatorConfig::from_file_or_default(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            let exit_code = commands::output_error(
                commands::OutputFormat::Text,
                "invalid_config",
                &format!("failed to load config from {}: {error}", cli.config.display()),
                commands::exit_codes::ERROR,
            );
            std::process::exit(i32::from(exit_code));
        },
    };

    // Commands report their own errors and map them to exit codes:
    // 0=success, 1=validation_error, 2=error
    let exit_code = match &cli.command {
        Commands::Rate(args) => commands::rate::run_rate(args, &config),
        Commands::Enrich(args) => commands::enrich::run_enrich(args, &config),
        Commands::Tier(cmd) => commands::tier::run_tier(cmd, &config),
    };
    std::process::exit(i32::from(exit_code));
}
