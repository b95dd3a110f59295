//! Race log records and prediction results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical race result.
///
/// The predictor assumes `date` has already been parsed; ordering between
/// records is the calendar order of `NaiveDate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub time_min: f64,
}

impl RaceRecord {
    pub fn new(date: NaiveDate, distance_km: f64, time_min: f64) -> Self {
        Self {
            date,
            distance_km,
            time_min,
        }
    }

    /// Average pace in minutes per kilometer.
    pub fn pace_min_per_km(&self) -> f64 {
        self.time_min / self.distance_km
    }
}

/// A named race distance to predict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetDistance {
    pub name: &'static str,
    pub km: f64,
}

/// Predicted result for one target distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RacePrediction {
    pub name: String,
    pub distance_km: f64,
    /// Weighted prediction in minutes, rounded to 2 decimals
    pub minutes: f64,
    pub pace_min_per_km: f64,
    /// Fastest single-race estimate among the races used
    pub fastest: f64,
    /// Slowest single-race estimate among the races used
    pub slowest: f64,
}

/// Predictions for every target, in target order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionReport {
    /// Races that fed the predictions, most recent first
    pub races_used: Vec<RaceRecord>,
    pub predictions: Vec<RacePrediction>,
}

impl PredictionReport {
    /// Look up a prediction by race name.
    pub fn get(&self, name: &str) -> Option<&RacePrediction> {
        self.predictions.iter().find(|p| p.name == name)
    }
}
