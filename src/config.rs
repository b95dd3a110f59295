//! Configuration for the race predictor.

use serde::{Deserialize, Serialize};

use crate::types::TargetDistance;

/// Predictor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Riegel fatigue exponent
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    /// How many of the most recent races feed a prediction
    #[serde(default = "default_recent_races")]
    pub recent_races: usize,
    /// Weight of the most recent race
    #[serde(default = "default_newest_weight")]
    pub newest_weight: f64,
    /// Weight of the oldest race that is still used
    #[serde(default = "default_oldest_weight")]
    pub oldest_weight: f64,
}

fn default_exponent() -> f64 {
    1.06
}

fn default_recent_races() -> usize {
    3
}

fn default_newest_weight() -> f64 {
    1.0
}

fn default_oldest_weight() -> f64 {
    0.8
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            exponent: default_exponent(),
            recent_races: default_recent_races(),
            newest_weight: default_newest_weight(),
            oldest_weight: default_oldest_weight(),
        }
    }
}

/// Race log location and format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_history_path")]
    pub history_path: String,
    /// "log" (date,distance_km,time_min) or "strava" (activity export)
    #[serde(default = "default_source")]
    pub source: String,
    /// Strava only: relative band around a standard distance for a run to
    /// count as an effort at that distance
    #[serde(default = "default_effort_tolerance")]
    pub effort_tolerance: f64,
}

fn default_history_path() -> String {
    "data/races.csv".to_string()
}

fn default_source() -> String {
    "log".to_string()
}

fn default_effort_tolerance() -> f64 {
    0.05
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            source: default_source(),
            effort_tolerance: default_effort_tolerance(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// "table" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub predictor: PredictorConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (RACEPRED_DATA__HISTORY_PATH, etc.)
            .add_source(
                config::Environment::with_prefix("RACEPRED")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Standard race distances, in report order.
pub const STANDARD_DISTANCES: [TargetDistance; 5] = [
    TargetDistance {
        name: "Mile",
        km: 1.609,
    },
    TargetDistance { name: "5K", km: 5.0 },
    TargetDistance {
        name: "10K",
        km: 10.0,
    },
    TargetDistance {
        name: "Half Marathon",
        km: 21.095,
    },
    TargetDistance {
        name: "Marathon",
        km: 42.195,
    },
];
