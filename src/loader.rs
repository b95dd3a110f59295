//! Race log loading.
//!
//! Two CSV layouts are understood:
//!
//! * `log` - a plain race log with `date`, `distance_km` and `time_min`
//!   columns. Times may be decimal minutes or `mm:ss` / `h:mm:ss`.
//! * `strava` - a Strava activity export. Only `Run` activities are kept;
//!   `Elapsed Time` is in seconds and `Distance` in kilometers. Runs are then
//!   reduced to the best effort near each standard distance, so easy
//!   training runs do not count as races.
//!
//! Every column is read as text and parsed here, whatever its contents.
//!
//! Parsing stops at the first malformed date. Range checks on distance and
//! time are left to the predictor.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::STANDARD_DISTANCES;
use crate::error::LoadError;
use crate::types::{RaceRecord, TargetDistance};

const SECONDS_PER_MINUTE: f64 = 60.0;
const MINUTES_PER_HOUR: f64 = 60.0;

/// Default relative band around a standard distance for a Strava run to count
pub const DEFAULT_EFFORT_TOLERANCE: f64 = 0.05;

/// Layout of the input CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistorySource {
    Log,
    Strava {
        /// Relative distance band, e.g. 0.05 keeps 4.75-5.25 km for a 5K
        effort_tolerance: f64,
    },
}

impl HistorySource {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "log" | "races" => Some(HistorySource::Log),
            "strava" => Some(HistorySource::strava(DEFAULT_EFFORT_TOLERANCE)),
            _ => None,
        }
    }

    pub fn strava(effort_tolerance: f64) -> Self {
        HistorySource::Strava { effort_tolerance }
    }

    /// Replace the Strava tolerance; the log layout is unchanged.
    pub fn with_effort_tolerance(self, effort_tolerance: f64) -> Self {
        match self {
            HistorySource::Log => HistorySource::Log,
            HistorySource::Strava { .. } => HistorySource::Strava { effort_tolerance },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HistorySource::Log => "log",
            HistorySource::Strava { .. } => "strava",
        }
    }
}

/// Load a race history from a CSV file.
pub fn load_history<P: AsRef<Path>>(
    path: P,
    source: HistorySource,
) -> Result<Vec<RaceRecord>, LoadError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;

    let records = records_from_frame(&df, source)?;
    info!(
        "Loaded {} races from {} ({} format)",
        records.len(),
        path.as_ref().display(),
        source.name()
    );
    Ok(records)
}

/// Parse a race history from CSV text.
pub fn parse_history(csv: &str, source: HistorySource) -> Result<Vec<RaceRecord>, LoadError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(csv.as_bytes().to_vec()))
        .finish()?;

    records_from_frame(&df, source)
}

fn records_from_frame(df: &DataFrame, source: HistorySource) -> Result<Vec<RaceRecord>, LoadError> {
    match source {
        HistorySource::Log => log_records(df),
        HistorySource::Strava { effort_tolerance } => {
            let runs = strava_runs(df)?;
            Ok(best_efforts(&runs, &STANDARD_DISTANCES, effort_tolerance))
        }
    }
}

/// Read a column as strings.
fn string_column(df: &DataFrame, name: &str) -> Result<StringChunked, LoadError> {
    let column = df
        .column(name)
        .map_err(|_| LoadError::MissingColumn(name.to_string()))?;
    let as_strings = column.cast(&DataType::String)?;
    Ok(as_strings.str()?.clone())
}

fn required<'a>(value: Option<&'a str>, row: usize, column: &str) -> Result<&'a str, LoadError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(LoadError::MissingValue {
            row,
            column: column.to_string(),
        }),
    }
}

fn log_records(df: &DataFrame) -> Result<Vec<RaceRecord>, LoadError> {
    let dates = string_column(df, "date")?;
    let distances = string_column(df, "distance_km")?;
    let times = string_column(df, "time_min")?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let row = i + 1;

        let date_str = required(dates.get(i), row, "date")?;
        let date = parse_date(date_str).ok_or_else(|| LoadError::MalformedDate {
            row,
            value: date_str.to_string(),
        })?;

        let distance_str = required(distances.get(i), row, "distance_km")?;
        let distance_km = parse_number(distance_str).ok_or_else(|| LoadError::InvalidNumber {
            row,
            column: "distance_km".to_string(),
            value: distance_str.to_string(),
        })?;

        let time_str = required(times.get(i), row, "time_min")?;
        let time_min = parse_minutes(time_str).ok_or_else(|| LoadError::InvalidNumber {
            row,
            column: "time_min".to_string(),
            value: time_str.to_string(),
        })?;

        records.push(RaceRecord::new(date, distance_km, time_min));
    }

    Ok(records)
}

fn strava_runs(df: &DataFrame) -> Result<Vec<RaceRecord>, LoadError> {
    let types = string_column(df, "Activity Type")?;
    let dates = string_column(df, "Activity Date")?;
    let distances = string_column(df, "Distance")?;
    let times = string_column(df, "Elapsed Time")?;

    let mut records = Vec::new();
    let mut skipped = 0;
    for i in 0..df.height() {
        let row = i + 1;

        if types.get(i).map(str::trim) != Some("Run") {
            continue;
        }

        let distance = distances.get(i).and_then(parse_number);
        let time = times.get(i).and_then(parse_elapsed_seconds);
        let (distance_km, time_min) = match (distance, time) {
            (Some(d), Some(t)) => (d, t),
            _ => {
                warn!(
                    "Skipping run at row {}: distance={:?} elapsed={:?}",
                    row,
                    distances.get(i),
                    times.get(i)
                );
                skipped += 1;
                continue;
            }
        };

        let date_str = required(dates.get(i), row, "Activity Date")?;
        let date = parse_date(date_str).ok_or_else(|| LoadError::MalformedDate {
            row,
            value: date_str.to_string(),
        })?;

        records.push(RaceRecord::new(date, distance_km, time_min));
    }

    debug!("Strava export: {} runs kept, {} skipped", records.len(), skipped);
    Ok(records)
}

/// Fastest run within `tolerance` of each target distance, in target order.
///
/// Targets without a matching run are left out. On equal times the earlier
/// run in `runs` wins.
pub fn best_efforts(
    runs: &[RaceRecord],
    targets: &[TargetDistance],
    tolerance: f64,
) -> Vec<RaceRecord> {
    let mut efforts = Vec::new();
    for target in targets {
        let min_km = target.km * (1.0 - tolerance);
        let max_km = target.km * (1.0 + tolerance);

        let best = runs
            .iter()
            .filter(|r| r.distance_km >= min_km && r.distance_km <= max_km)
            .fold(None, |best: Option<&RaceRecord>, r| match best {
                Some(b) if b.time_min <= r.time_min => Some(b),
                _ => Some(r),
            });

        match best {
            Some(run) => {
                debug!(
                    "Best {} effort: {:.2} min on {}",
                    target.name, run.time_min, run.date
                );
                efforts.push(run.clone());
            }
            None => debug!("No run within {:.0}% of {}", tolerance * 100.0, target.name),
        }
    }
    efforts
}

/// Parse a calendar date, ignoring any time of day.
///
/// Accepts `2024-06-01`, `2024-06-01 07:30:00`, `2024-06-01T07:30:00` and the
/// Strava export style `Jun 1, 2024, 7:30:00 AM`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%b %d, %Y, %I:%M:%S %p",
    ];
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `h:mm:ss` or `mm:ss` into minutes.
pub fn parse_clock(s: &str) -> Option<f64> {
    let parts: Vec<f64> = s
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [h, m, sec] => Some(h * MINUTES_PER_HOUR + m + sec / SECONDS_PER_MINUTE),
        [m, sec] => Some(m + sec / SECONDS_PER_MINUTE),
        _ => None,
    }
}

/// Parse a duration given as decimal minutes or as a clock string.
pub fn parse_minutes(s: &str) -> Option<f64> {
    if s.contains(':') {
        parse_clock(s)
    } else {
        parse_number(s)
    }
}

/// Parse a Strava elapsed time (seconds, or a clock string) into minutes.
fn parse_elapsed_seconds(s: &str) -> Option<f64> {
    if s.contains(':') {
        parse_clock(s)
    } else {
        parse_number(s).map(|secs| secs / SECONDS_PER_MINUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log() {
        let csv = "date,distance_km,time_min\n\
                   2024-01-01,5,25\n\
                   2024-03-01,10,52.5\n\
                   2024-05-01,21.095,1:58:30\n";
        let records = parse_history(csv, HistorySource::Log).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!((records[0].distance_km - 5.0).abs() < 1e-9);
        assert!((records[0].time_min - 25.0).abs() < 1e-9);
        assert!((records[1].time_min - 52.5).abs() < 1e-9);
        assert!((records[2].time_min - 118.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_log_keeps_input_order() {
        let csv = "date,distance_km,time_min\n\
                   2024-05-01,5,24\n\
                   2024-01-01,5,25\n";
        let records = parse_history(csv, HistorySource::Log).unwrap();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_log_ignores_extra_columns() {
        let csv = "name,date,distance_km,time_min\n\
                   parkrun,2024-05-01,5,24:10\n";
        let records = parse_history(csv, HistorySource::Log).unwrap();
        assert_eq!(records.len(), 1);
        assert!((records[0].time_min - (24.0 + 10.0 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_date() {
        let csv = "date,distance_km,time_min\n\
                   2024-01-01,5,25\n\
                   last tuesday,10,52\n";
        match parse_history(csv, HistorySource::Log) {
            Err(LoadError::MalformedDate { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "last tuesday");
            }
            other => panic!("Expected MalformedDate, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_number() {
        let csv = "date,distance_km,time_min\n\
                   2024-01-01,five,25\n";
        assert!(matches!(
            parse_history(csv, HistorySource::Log),
            Err(LoadError::InvalidNumber { row: 1, .. })
        ));
    }

    #[test]
    fn test_missing_column() {
        let csv = "date,distance_km\n2024-01-01,5\n";
        match parse_history(csv, HistorySource::Log) {
            Err(LoadError::MissingColumn(name)) => assert_eq!(name, "time_min"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_strava_export() {
        let csv = "Activity ID,Activity Date,Activity Name,Activity Type,Elapsed Time,Distance\n\
                   1,\"Jan 5, 2024, 7:30:00 AM\",Morning Run,Run,1500,5.01\n\
                   2,\"Jan 6, 2024, 8:00:00 AM\",Commute,Ride,3600,20.0\n\
                   3,\"Feb 10, 2024, 9:15:00 AM\",Long Run,Run,,15.0\n\
                   4,\"Mar 3, 2024, 6:45:00 PM\",Evening Run,Run,3120,10.0\n";
        let records = parse_history(csv, HistorySource::strava(DEFAULT_EFFORT_TOLERANCE)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!((records[0].time_min - 25.0).abs() < 1e-9);
        assert!((records[0].distance_km - 5.01).abs() < 1e-9);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert!((records[1].time_min - 52.0).abs() < 1e-9);
    }

    #[test]
    fn test_strava_keeps_best_effort_per_distance() {
        let csv = "Activity Date,Activity Type,Elapsed Time,Distance\n\
                   2024-02-10,Run,1320,5.0\n\
                   2024-03-02,Run,3060,10.1\n\
                   2024-04-20,Run,2520,7.0\n\
                   2024-05-01,Run,1800,5.02\n";
        let records =
            parse_history(csv, HistorySource::strava(DEFAULT_EFFORT_TOLERANCE)).unwrap();

        // The slow 5 km jog on 2024-05-01 and the 7 km run are not races
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert!((records[0].time_min - 22.0).abs() < 1e-9);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!((records[1].time_min - 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_efforts_band() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let runs = vec![
            RaceRecord::new(date, 5.3, 20.0),
            RaceRecord::new(date, 4.8, 23.0),
            RaceRecord::new(date, 5.2, 23.0),
        ];

        let efforts = best_efforts(&runs, &STANDARD_DISTANCES, 0.05);
        assert_eq!(efforts.len(), 1);
        assert!((efforts[0].distance_km - 4.8).abs() < 1e-9);

        // A wider band lets the 5.3 km run in
        let efforts = best_efforts(&runs, &STANDARD_DISTANCES, 0.1);
        assert!((efforts[0].distance_km - 5.3).abs() < 1e-9);
    }

    #[test]
    fn test_clock_times_after_many_numeric_rows() {
        let mut csv = String::from("date,distance_km,time_min\n");
        for i in 0..150 {
            csv.push_str(&format!("2023-01-{:02},5,25\n", i % 28 + 1));
        }
        csv.push_str("2024-05-01,5,24:10\n");

        let records = parse_history(&csv, HistorySource::Log).unwrap();
        assert_eq!(records.len(), 151);
        assert!((records[150].time_min - (24.0 + 10.0 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_value() {
        let csv = "date,distance_km,time_min\n\
                   2024-01-01,5,25\n\
                   2024-02-01,,25\n";
        match parse_history(csv, HistorySource::Log) {
            Err(LoadError::MissingValue { row, column }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "distance_km");
            }
            other => panic!("Expected MissingValue, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_date("2024-06-01"), Some(expected));
        assert_eq!(parse_date(" 2024-06-01 "), Some(expected));
        assert_eq!(parse_date("2024-06-01 07:30:00"), Some(expected));
        assert_eq!(parse_date("2024-06-01T07:30:00"), Some(expected));
        assert_eq!(parse_date("Jun 1, 2024, 7:30:00 AM"), Some(expected));
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_clock() {
        assert!((parse_clock("25:30").unwrap() - 25.5).abs() < 1e-9);
        assert!((parse_clock("1:02:30").unwrap() - 62.5).abs() < 1e-9);
        assert_eq!(parse_clock("25"), None);
        assert_eq!(parse_clock("1:xx"), None);
    }

    #[test]
    fn test_parse_minutes() {
        assert!((parse_minutes("42.5").unwrap() - 42.5).abs() < 1e-9);
        assert!((parse_minutes("42:30").unwrap() - 42.5).abs() < 1e-9);
        assert_eq!(parse_minutes("NaN"), None);
        assert_eq!(parse_minutes("abc"), None);
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(HistorySource::from_str("log"), Some(HistorySource::Log));
        assert_eq!(
            HistorySource::from_str("Strava"),
            Some(HistorySource::strava(DEFAULT_EFFORT_TOLERANCE))
        );
        assert_eq!(HistorySource::from_str("garmin"), None);
        assert_eq!(HistorySource::strava(0.1).name(), "strava");
        assert_eq!(
            HistorySource::from_str("strava").unwrap().with_effort_tolerance(0.1),
            HistorySource::strava(0.1)
        );
        assert_eq!(HistorySource::Log.with_effort_tolerance(0.1), HistorySource::Log);
    }
}
