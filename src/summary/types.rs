//! Data types produced by the summary stage.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregated punctuality for a single route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub route_name: String,
    pub records: usize,
    pub avg_on_time_pct: f64,
    pub stddev_on_time_pct: f64,
    pub avg_early_stops: f64,
    pub avg_late_stops: f64,
    pub grade: String,
}

/// Average on-time share for one service day type.
#[derive(Debug, Serialize)]
pub struct DayTypeSummary {
    pub day_type: String,
    pub records: usize,
    pub avg_on_time_pct: f64,
}

/// Average on-time share for one calendar month.
#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    pub records: usize,
    pub avg_on_time_pct: f64,
}

/// Average stop counts under one weather severity level.
#[derive(Debug, Serialize)]
pub struct WeatherLevelSummary {
    pub level: String,
    pub records: usize,
    pub avg_early_stops: f64,
    pub avg_late_stops: f64,
}

/// Correlation of one weather variable with late stops.
#[derive(Debug, Serialize)]
pub struct WeatherCorrelation {
    pub variable: String,
    pub late_stops_correlation: f64,
}

/// Complete punctuality summary over a derived table.
#[derive(Debug, Serialize)]
pub struct PunctualitySummary {
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    /// Every route in the table, busiest first.
    pub routes: Vec<RouteSummary>,
    /// Rankings only consider routes with the configured record count.
    pub most_punctual: Vec<RouteSummary>,
    pub least_punctual: Vec<RouteSummary>,
    pub day_types: Vec<DayTypeSummary>,
    pub months: Vec<MonthlySummary>,
    /// Empty when the table was derived without weather.
    pub wind_levels: Vec<WeatherLevelSummary>,
    pub snow_levels: Vec<WeatherLevelSummary>,
    pub weather_correlations: Vec<WeatherCorrelation>,
}
