//! Row types shared by the pipeline stages.
//!
//! Raw rows are deserialized leniently: malformed cells become `None` rather
//! than failing the whole file, mirroring how unusable values are meant to be
//! dropped and counted by later stages. Header aliases absorb the original
//! export's column spellings, so `Route Number` and `route_number` both land
//! in the same field.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Parses a stop counter, turning junk or negative values into `None`.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// Parses a weather measurement, turning junk into `None`.
fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// A single row as exported by the transit agency, before cleaning.
#[derive(Debug, Deserialize)]
pub struct RawTransitRecord {
    #[serde(default, alias = "Day")]
    pub day: Option<String>,
    #[serde(default, alias = "Route Number")]
    pub route_number: Option<String>,
    #[serde(default, alias = "Route Name")]
    pub route_name: Option<String>,
    #[serde(default, alias = "Route Destination")]
    pub route_destination: Option<String>,
    #[serde(default, alias = "Day Type")]
    pub day_type: Option<String>,
    #[serde(default, alias = "Time Period")]
    pub time_period: Option<String>,
    #[serde(default, alias = "Early Stops", deserialize_with = "lenient_count")]
    pub early_stops: Option<u32>,
    #[serde(default, alias = "Late Stops", deserialize_with = "lenient_count")]
    pub late_stops: Option<u32>,
    #[serde(
        default,
        rename = "on-time_stops",
        alias = "On-Time Stops",
        alias = "on_time_stops",
        deserialize_with = "lenient_count"
    )]
    pub on_time_stops: Option<u32>,
}

/// A cleaned row: service date parsed, identifying fields present.
///
/// Stop counters stay optional here. Rows missing one are only dropped once a
/// stage actually needs the counts, and that stage reports how many it threw
/// away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitRecord {
    pub day: NaiveDate,
    pub route_number: String,
    pub route_name: String,
    pub route_destination: String,
    pub day_type: String,
    pub time_period: String,
    pub early_stops: Option<u32>,
    pub late_stops: Option<u32>,
    #[serde(rename = "on-time_stops", alias = "on_time_stops")]
    pub on_time_stops: Option<u32>,
}

/// One day of weather, as exported by the weather service.
///
/// The export carries far more columns than these; unknown ones are ignored.
/// `datetime` stays raw text until the join stage parses it.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherRecord {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub tempmax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub tempmin: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub dew: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub precip: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub snow: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub windgust: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub windspeed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub conditions: String,
}

/// A transit row joined with the weather observed on its service date.
///
/// `datetime_x` is the service datetime rebuilt from the day and time period,
/// `datetime_y` the weather observation timestamp, and `date` the calendar-day
/// key the two were matched on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    pub day: NaiveDate,
    pub route_number: String,
    pub route_name: String,
    pub route_destination: String,
    pub day_type: String,
    pub time_period: String,
    pub early_stops: Option<u32>,
    pub late_stops: Option<u32>,
    #[serde(rename = "on-time_stops", alias = "on_time_stops")]
    pub on_time_stops: Option<u32>,
    pub datetime_x: DateTime<Utc>,
    pub date: NaiveDate,
    pub datetime_y: DateTime<Utc>,
    pub temp: Option<f64>,
    pub tempmax: Option<f64>,
    pub tempmin: Option<f64>,
    pub dew: Option<f64>,
    pub humidity: Option<f64>,
    pub precip: Option<f64>,
    pub snow: Option<f64>,
    pub windgust: Option<f64>,
    pub windspeed: Option<f64>,
    pub visibility: Option<f64>,
    pub conditions: String,
}
