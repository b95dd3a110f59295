//! Rendering of prediction reports.

use crate::types::PredictionReport;

/// Format minutes as a clock time: `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_clock(minutes: f64) -> String {
    if !minutes.is_finite() || minutes < 0.0 {
        return "-:--".to_string();
    }

    let total_secs = (minutes * 60.0).round() as u64;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Format a pace in minutes per km as `m:ss/km`.
pub fn format_pace(min_per_km: f64) -> String {
    format!("{}/km", format_clock(min_per_km))
}

/// Render the report as a text table.
///
/// The spread column is the fastest and slowest single-race estimate among
/// the races used.
pub fn render_table(report: &PredictionReport) -> String {
    let mut out = String::from("Race Predictions (minutes):\n");
    out.push_str(&format!(
        "  {:14} {:>9} {:>9} {:>10}   {}\n",
        "Race", "Minutes", "Time", "Pace", "Spread"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(62)));
    for p in &report.predictions {
        out.push_str(&format!(
            "  {:14} {:>9.2} {:>9} {:>10}   {} - {}\n",
            p.name,
            p.minutes,
            format_clock(p.minutes),
            format_pace(p.pace_min_per_km),
            format_clock(p.fastest),
            format_clock(p.slowest)
        ));
    }

    if !report.races_used.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "Based on {} most recent races:\n",
            report.races_used.len()
        ));
        for r in &report.races_used {
            out.push_str(&format!(
                "  {}  {:>7.3} km  {:>9}\n",
                r.date,
                r.distance_km,
                format_clock(r.time_min)
            ));
        }
    }

    out
}

/// Print the report as a text table.
pub fn print_table(report: &PredictionReport) {
    print!("{}", render_table(report));
}

/// Render the report as pretty JSON.
pub fn render_json(report: &PredictionReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
