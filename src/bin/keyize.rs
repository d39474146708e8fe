//! Keyize CLI - Command-line interface for Keyize
//!
//! Commands:
//! - extract: Derive dynamics from a V1 recording
//! - text: Reconstruct the typed text of a V1 recording
//! - average: Average several dynamics into a reference fingerprint
//! - compare: Compare a sample against a reference
//! - config: Print the default comparison configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use keyize::{
    avg_dynamics, compare, ComparisonConfig, Dynamics, ImportStrictness, KeyizeError, Recording,
    KEYIZE_VERSION,
};

/// Keyize - Keystroke dynamics fingerprints
#[derive(Parser)]
#[command(name = "keyize")]
#[command(version = KEYIZE_VERSION)]
#[command(about = "Derive and compare keystroke dynamics fingerprints", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive dynamics from a V1 recording
    Extract {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Timestamp order policy for the import
        #[arg(long)]
        strictness: Strictness,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Reconstruct the typed text of a V1 recording
    Text {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Timestamp order policy for the import
        #[arg(long)]
        strictness: Strictness,
    },

    /// Average several dynamics (JSON) into one
    Average {
        /// Dynamics JSON files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Compare a sample against a reference (both dynamics JSON)
    Compare {
        /// Sample dynamics JSON file (use - for stdin)
        #[arg(short, long)]
        sample: PathBuf,

        /// Reference dynamics JSON file
        #[arg(short, long)]
        reference: PathBuf,

        /// Comparison configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail unless the match score reaches this threshold
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Print the default comparison configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strictness {
    /// Reject timestamps that go backwards
    Strict,
    /// Accept any timestamp order
    Lenient,
}

impl From<Strictness> for ImportStrictness {
    fn from(s: Strictness) -> Self {
        match s {
            Strictness::Strict => ImportStrictness::Strict,
            Strictness::Lenient => ImportStrictness::Lenient,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), KeyizeCliError> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            strictness,
            output_format,
        } => cmd_extract(&input, &output, strictness.into(), output_format),

        Commands::Text { input, strictness } => cmd_text(&input, strictness.into()),

        Commands::Average {
            inputs,
            output,
            output_format,
        } => cmd_average(&inputs, &output, output_format),

        Commands::Compare {
            sample,
            reference,
            config,
            threshold,
        } => cmd_compare(&sample, &reference, config.as_deref(), threshold),

        Commands::Config => {
            println!("{}", ComparisonConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    strictness: ImportStrictness,
    output_format: OutputFormat,
) -> Result<(), KeyizeCliError> {
    let data = extract_json(&read_input(input)?, strictness, output_format)?;
    write_output(output, &data)
}

/// An empty recording yields an empty object
fn extract_json(
    input: &str,
    strictness: ImportStrictness,
    output_format: OutputFormat,
) -> Result<String, KeyizeCliError> {
    let recording = Recording::import_v1(input, strictness)?;
    let dynamics = recording.dynamics();
    tracing::info!(
        events = recording.len(),
        properties = dynamics.len(),
        "extracted dynamics"
    );

    format_json(&dynamics, output_format)
}

fn cmd_text(input: &Path, strictness: ImportStrictness) -> Result<(), KeyizeCliError> {
    let recording = Recording::import_v1(&read_input(input)?, strictness)?;
    println!("{}", recording.text());
    Ok(())
}

fn cmd_average(
    inputs: &[PathBuf],
    output: &Path,
    output_format: OutputFormat,
) -> Result<(), KeyizeCliError> {
    let sessions = inputs
        .iter()
        .map(|path| read_dynamics(path))
        .collect::<Result<Vec<_>, _>>()?;

    let average = avg_dynamics(&sessions);
    tracing::info!(
        sessions = sessions.len(),
        properties = average.len(),
        "averaged dynamics"
    );

    write_output(output, &format_json(&average, output_format)?)
}

fn cmd_compare(
    sample: &Path,
    reference: &Path,
    config: Option<&Path>,
    threshold: Option<f64>,
) -> Result<(), KeyizeCliError> {
    let config = match config {
        Some(path) => ComparisonConfig::from_json(&fs::read_to_string(path)?)?,
        None => ComparisonConfig::default(),
    };

    let sample = read_dynamics(sample)?;
    let reference = read_dynamics(reference)?;

    let comparison = compare(&sample, &reference, &config);
    println!("{}", serde_json::to_string_pretty(&comparison)?);

    match threshold {
        Some(threshold) if !comparison.accepts(threshold) => {
            Err(KeyizeCliError::Rejected(threshold))
        }
        _ => Ok(()),
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, KeyizeCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_dynamics(path: &Path) -> Result<Dynamics, KeyizeCliError> {
    let dynamics: Dynamics = serde_json::from_str(&read_input(path)?)?;
    Ok(dynamics)
}

fn write_output(path: &Path, data: &str) -> Result<(), KeyizeCliError> {
    if path.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(path, data)?;
    }
    Ok(())
}

fn format_json(dynamics: &Dynamics, format: OutputFormat) -> Result<String, KeyizeCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(dynamics)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(dynamics)?),
    }
}

// Error types

#[derive(Debug)]
enum KeyizeCliError {
    Io(io::Error),
    Keyize(KeyizeError),
    Json(serde_json::Error),
    Rejected(f64),
}

impl From<io::Error> for KeyizeCliError {
    fn from(e: io::Error) -> Self {
        KeyizeCliError::Io(e)
    }
}

impl From<KeyizeError> for KeyizeCliError {
    fn from(e: KeyizeError) -> Self {
        KeyizeCliError::Keyize(e)
    }
}

impl From<serde_json::Error> for KeyizeCliError {
    fn from(e: serde_json::Error) -> Self {
        KeyizeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<KeyizeCliError> for CliError {
    fn from(e: KeyizeCliError) -> Self {
        match e {
            KeyizeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            KeyizeCliError::Keyize(e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Recordings use the V1 format, e.g. da0ua100db150ub200".to_string()),
            },
            KeyizeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Dynamics are JSON objects of property name to value".to_string()),
            },
            KeyizeCliError::Rejected(threshold) => CliError {
                code: "REJECTED".to_string(),
                message: format!("Match score below threshold {}", threshold),
                hint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_empty_recording() {
        for input in ["", " \n"] {
            let json = extract_json(input, ImportStrictness::Strict, OutputFormat::Json).unwrap();
            assert_eq!(json, "{}");
        }
    }

    #[test]
    fn test_extract_recording() {
        let json = extract_json(
            "da0ua100db150ub200",
            ImportStrictness::Strict,
            OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(json, r#"{"D.a":100.0,"D.b":50.0,"DD.a.b":150.0,"UD.a.b":50.0}"#);
    }

    #[test]
    fn test_extract_malformed_recording() {
        let result = extract_json("da0xa10", ImportStrictness::Lenient, OutputFormat::Json);
        assert!(matches!(result, Err(KeyizeCliError::Keyize(_))));
    }
}
