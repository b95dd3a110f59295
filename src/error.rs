//! Error types for prediction and race log loading.

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Invalid input to the predictor.
///
/// Input problems are raised before any arithmetic touches the offending
/// value, and a result that overflows is rejected, so a prediction is never
/// `NaN` or infinite.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("race history is empty, nothing to predict from")]
    EmptyHistory,

    #[error("target distance must be a positive number of km, got {0}")]
    InvalidTarget(f64),

    #[error("race #{index} on {date}: distance must be a positive number of km, got {value}")]
    InvalidDistance {
        index: usize,
        date: NaiveDate,
        value: f64,
    },

    #[error("race #{index} on {date}: time must be a positive number of minutes, got {value}")]
    InvalidTime {
        index: usize,
        date: NaiveDate,
        value: f64,
    },

    #[error("prediction for {target_km} km is out of range (not a finite positive time)")]
    OutOfRange { target_km: f64 },

    #[error("invalid predictor settings: {0}")]
    InvalidSettings(String),
}

/// Errors raised while reading a race log.
///
/// Row numbers count data rows from 1, header excluded.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("row {row}: cannot parse date '{value}'")]
    MalformedDate { row: usize, value: String },

    #[error("row {row}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: column '{column}' is empty")]
    MissingValue { row: usize, column: String },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] PolarsError),
}
