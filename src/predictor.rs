//! Recency-weighted Riegel race time prediction.
//!
//! A prediction for a target distance scales each of the most recent races to
//! that distance with Riegel's formula, `t2 = t1 * (d2 / d1)^1.06`, and
//! averages the scaled times with linearly decreasing weights (newest race
//! 1.0, oldest used race 0.8).

use tracing::debug;

use crate::config::PredictorConfig;
use crate::error::PredictError;
use crate::types::{PredictionReport, RacePrediction, RaceRecord, TargetDistance};

/// Riegel fatigue exponent
pub const RIEGEL_EXPONENT: f64 = 1.06;

/// Number of most recent races used per prediction
pub const RECENT_RACES: usize = 3;

/// Weight of the most recent race
pub const NEWEST_WEIGHT: f64 = 1.0;

/// Weight of the oldest race still used
pub const OLDEST_WEIGHT: f64 = 0.8;

/// Tunable parameters of the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorSettings {
    pub exponent: f64,
    pub recent_races: usize,
    pub newest_weight: f64,
    pub oldest_weight: f64,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            exponent: RIEGEL_EXPONENT,
            recent_races: RECENT_RACES,
            newest_weight: NEWEST_WEIGHT,
            oldest_weight: OLDEST_WEIGHT,
        }
    }
}

impl From<&PredictorConfig> for PredictorSettings {
    fn from(config: &PredictorConfig) -> Self {
        Self {
            exponent: config.exponent,
            recent_races: config.recent_races,
            newest_weight: config.newest_weight,
            oldest_weight: config.oldest_weight,
        }
    }
}

/// Scale a race time to another distance with Riegel's formula.
pub fn riegel(time_min: f64, from_km: f64, to_km: f64) -> f64 {
    riegel_with_exponent(time_min, from_km, to_km, RIEGEL_EXPONENT)
}

/// Riegel's formula with an explicit fatigue exponent.
pub fn riegel_with_exponent(time_min: f64, from_km: f64, to_km: f64, exponent: f64) -> f64 {
    time_min * (to_km / from_km).powf(exponent)
}

/// Weights for `n` races ordered newest first.
///
/// Evenly spaced from `newest` down to `oldest`. A single race gets `newest`.
pub fn recency_weights(n: usize, newest: f64, oldest: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![newest],
        _ => {
            let step = (oldest - newest) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        oldest
                    } else {
                        newest + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Check that a history can be predicted from.
///
/// Every record is checked, not only the ones that end up selected.
pub fn validate_history(history: &[RaceRecord]) -> Result<(), PredictError> {
    if history.is_empty() {
        return Err(PredictError::EmptyHistory);
    }

    for (index, record) in history.iter().enumerate() {
        if !is_positive(record.distance_km) {
            return Err(PredictError::InvalidDistance {
                index,
                date: record.date,
                value: record.distance_km,
            });
        }
        if !is_positive(record.time_min) {
            return Err(PredictError::InvalidTime {
                index,
                date: record.date,
                value: record.time_min,
            });
        }
    }

    Ok(())
}

/// Breakdown of a single prediction.
#[derive(Debug, Clone)]
pub struct Estimate<'a> {
    /// Races used, newest first
    pub races: Vec<&'a RaceRecord>,
    pub weights: Vec<f64>,
    /// Each race scaled to the target distance
    pub per_race: Vec<f64>,
    /// Weighted average of `per_race`, unrounded
    pub minutes: f64,
}

impl Estimate<'_> {
    pub fn fastest(&self) -> f64 {
        self.per_race.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn slowest(&self) -> f64 {
        self.per_race.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Race time predictor.
///
/// Stateless apart from its settings; every call works on its own sorted view
/// of the history, so one predictor can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Predictor {
    settings: PredictorSettings,
}

impl Predictor {
    pub fn new(settings: PredictorSettings) -> Result<Self, PredictError> {
        if settings.recent_races == 0 {
            return Err(PredictError::InvalidSettings(
                "recent_races must be at least 1".to_string(),
            ));
        }
        if !settings.exponent.is_finite() {
            return Err(PredictError::InvalidSettings(format!(
                "exponent must be finite, got {}",
                settings.exponent
            )));
        }
        if !is_positive(settings.newest_weight) || !is_positive(settings.oldest_weight) {
            return Err(PredictError::InvalidSettings(format!(
                "weights must be positive, got {} and {}",
                settings.newest_weight, settings.oldest_weight
            )));
        }

        Ok(Self { settings })
    }

    pub fn settings(&self) -> &PredictorSettings {
        &self.settings
    }

    /// Most recent races, newest first. Date ties keep input order.
    fn select_recent<'a>(&self, history: &'a [RaceRecord]) -> Vec<&'a RaceRecord> {
        let mut sorted: Vec<&RaceRecord> = history.iter().collect();
        // Stable sort
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted.truncate(self.settings.recent_races);
        sorted
    }

    /// Predict a time for `target_km` and return how it was built.
    pub fn estimate<'a>(
        &self,
        history: &'a [RaceRecord],
        target_km: f64,
    ) -> Result<Estimate<'a>, PredictError> {
        if !is_positive(target_km) {
            return Err(PredictError::InvalidTarget(target_km));
        }
        validate_history(history)?;

        let races = self.select_recent(history);
        let weights = recency_weights(
            races.len(),
            self.settings.newest_weight,
            self.settings.oldest_weight,
        );

        let per_race: Vec<f64> = races
            .iter()
            .map(|r| {
                riegel_with_exponent(r.time_min, r.distance_km, target_km, self.settings.exponent)
            })
            .collect();

        let weighted_sum: f64 = per_race.iter().zip(&weights).map(|(p, w)| p * w).sum();
        let weight_total: f64 = weights.iter().sum();
        let minutes = weighted_sum / weight_total;
        if !is_positive(minutes) {
            return Err(PredictError::OutOfRange { target_km });
        }

        debug!(
            target_km,
            races = races.len(),
            ?weights,
            ?per_race,
            minutes,
            "Estimated race time"
        );

        Ok(Estimate {
            races,
            weights,
            per_race,
            minutes,
        })
    }

    /// Predicted time in minutes for `target_km`, unrounded.
    pub fn predict(&self, history: &[RaceRecord], target_km: f64) -> Result<f64, PredictError> {
        Ok(self.estimate(history, target_km)?.minutes)
    }

    /// Predict every target, keeping the order of `targets`.
    ///
    /// Times are rounded to 2 decimals here, once per target.
    pub fn predict_all(
        &self,
        history: &[RaceRecord],
        targets: &[TargetDistance],
    ) -> Result<PredictionReport, PredictError> {
        validate_history(history)?;

        let races_used = self
            .select_recent(history)
            .into_iter()
            .cloned()
            .collect();

        let mut predictions = Vec::with_capacity(targets.len());
        for target in targets {
            let estimate = self.estimate(history, target.km)?;
            predictions.push(RacePrediction {
                name: target.name.to_string(),
                distance_km: target.km,
                minutes: round2(estimate.minutes),
                pace_min_per_km: estimate.minutes / target.km,
                fastest: round2(estimate.fastest()),
                slowest: round2(estimate.slowest()),
            });
        }

        Ok(PredictionReport {
            races_used,
            predictions,
        })
    }
}

/// Predict a time for `target_km` with the default model.
pub fn predict(history: &[RaceRecord], target_km: f64) -> Result<f64, PredictError> {
    Predictor::default().predict(history, target_km)
}
