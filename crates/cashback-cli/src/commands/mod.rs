//! CLI command implementations.

pub mod enrich;
pub mod rate;
pub mod tier;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Maximum size of any JSON input file (16 MiB).
pub const MAX_INPUT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Exit codes shared by all commands.
pub mod exit_codes {
    /// Success exit code.
    pub const SUCCESS: u8 = 0;
    /// Input failed rate or tier validation.
    pub const VALIDATION_ERROR: u8 = 1;
    /// Input could not be read or parsed.
    pub const ERROR: u8 = 2;
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Error response for JSON output.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

/// Reads and parses a JSON file, refusing files over
/// [`MAX_INPUT_FILE_SIZE`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if metadata.len() > MAX_INPUT_FILE_SIZE {
        bail!(
            "{} exceeds maximum size of {MAX_INPUT_FILE_SIZE} bytes",
            path.display()
        );
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Prints a serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{output}");
    Ok(())
}

/// Reports an error on stderr and returns `exit_code`.
pub fn output_error(format: OutputFormat, code: &str, message: &str, exit_code: u8) -> u8 {
    match format {
        OutputFormat::Json => {
            let error = ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            };
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| "{}".to_string())
            );
        },
        OutputFormat::Text => eprintln!("Error: {message}"),
    }
    exit_code
}
