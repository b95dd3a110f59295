//! Race Predictor
//!
//! CLI that predicts race times at standard distances from a personal race
//! log, using a recency-weighted Riegel model.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use race_predictor::cli::{self, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "race_predictor=debug"
    } else {
        "race_predictor=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Predict {
            input,
            source,
            format,
        } => cli::run_predict(input, source, format),
        Commands::Riegel { time, from, to } => cli::run_riegel(time, from, to),
        Commands::Distances => cli::run_distances(),
    }
}
