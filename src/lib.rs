//! Race time prediction from a personal race log.
//!
//! The core is [`predictor::predict`]: the three most recent races are scaled
//! to the target distance with Riegel's formula and averaged with recency
//! weights. Loading and rendering live in [`loader`] and [`report`].

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod predictor;
pub mod report;
pub mod types;

pub use error::{LoadError, PredictError};
pub use predictor::{predict, Predictor};
pub use types::{PredictionReport, RacePrediction, RaceRecord, TargetDistance};
