//! CLI commands for race-predictor.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{AppConfig, STANDARD_DISTANCES};
use crate::loader::{load_history, parse_minutes, HistorySource};
use crate::predictor::{riegel_with_exponent, round2, Predictor, PredictorSettings};
use crate::report::{format_clock, format_pace, print_table, render_json};

#[derive(Parser)]
#[command(name = "race-predictor")]
#[command(version, about = "Predict race times from your recent race results", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict Mile, 5K, 10K, Half Marathon and Marathon times from a race log
    Predict {
        /// Race log CSV (defaults to data.history_path from config)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Input layout (log, strava)
        #[arg(short, long)]
        source: Option<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Convert a single race time to another distance
    Riegel {
        /// Finish time, in minutes or as mm:ss / h:mm:ss
        #[arg(short, long)]
        time: String,

        /// Distance of the known race in km
        #[arg(long)]
        from: f64,

        /// Distance to predict in km
        #[arg(long)]
        to: f64,
    },

    /// List the standard race distances
    Distances,
}

fn predictor_from_config(config: &AppConfig) -> anyhow::Result<Predictor> {
    let settings = PredictorSettings::from(&config.predictor);
    Predictor::new(settings).context("Invalid predictor configuration")
}

/// Run predictions for all standard distances.
pub fn run_predict(
    input: Option<PathBuf>,
    source: Option<String>,
    format: Option<String>,
) -> anyhow::Result<()> {
    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(path) = input {
        config.data.history_path = path.to_string_lossy().to_string();
    }
    if let Some(s) = source {
        config.data.source = s;
    }
    if let Some(f) = format {
        config.output.format = f;
    }

    let source = match HistorySource::from_str(&config.data.source) {
        Some(s) => s.with_effort_tolerance(config.data.effort_tolerance),
        None => anyhow::bail!(
            "Unknown source: {} (expected log or strava)",
            config.data.source
        ),
    };

    let predictor = predictor_from_config(&config)?;

    tracing::info!("Loading race history from: {}", config.data.history_path);
    let history = load_history(&config.data.history_path, source)
        .with_context(|| format!("Failed to load race history from {}", config.data.history_path))?;

    let report = predictor
        .predict_all(&history, &STANDARD_DISTANCES)
        .context("Cannot predict from this race history")?;

    match config.output.format.as_str() {
        "json" => {
            println!("{}", render_json(&report)?);
        }
        "table" => {
            print_table(&report);
        }
        other => {
            tracing::warn!("Unknown format: {}. Using table.", other);
            print_table(&report);
        }
    }

    Ok(())
}

/// Convert one race time to another distance.
pub fn run_riegel(time: String, from: f64, to: f64) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let predictor = predictor_from_config(&config)?;

    let time_min = match parse_minutes(&time) {
        Some(t) if t > 0.0 => t,
        _ => anyhow::bail!("Invalid time: {} (expected minutes or h:mm:ss)", time),
    };
    if !(from.is_finite() && from > 0.0) || !(to.is_finite() && to > 0.0) {
        anyhow::bail!("Distances must be positive, got --from {} --to {}", from, to);
    }

    let predicted = riegel_with_exponent(time_min, from, to, predictor.settings().exponent);
    tracing::debug!(time_min, from, to, predicted, "Riegel conversion");

    println!(
        "{} km in {} -> {} km in {} ({} min, {})",
        from,
        format_clock(time_min),
        to,
        format_clock(predicted),
        round2(predicted),
        format_pace(predicted / to)
    );

    Ok(())
}

/// Print the standard race distances.
pub fn run_distances() -> anyhow::Result<()> {
    for target in STANDARD_DISTANCES {
        println!("  {:14} {:>7.3} km", target.name, target.km);
    }
    Ok(())
}
