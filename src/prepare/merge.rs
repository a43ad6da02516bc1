//! Weather join stage: matches transit rows to weather by calendar date.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::prepare::features::period_hour;
use crate::records::{MergedRecord, TransitRecord, WeatherRecord};

/// Row accounting for one run of the join stage.
#[derive(Debug, Default, Serialize)]
pub struct JoinReport {
    pub transit_rows: usize,
    pub weather_rows: usize,
    /// Weather rows whose datetime failed to parse.
    pub unparsed_weather_dates: usize,
    /// Repeats of a calendar date in the weather table. The first row wins.
    pub duplicate_weather_dates: usize,
    /// Transit rows without a parseable hour in their time period.
    pub missing_service_hour: usize,
    /// Transit rows whose service date had no weather row.
    pub unmatched_transit_rows: usize,
    /// Weather dates no transit row referenced.
    pub unmatched_weather_days: usize,
    pub merged_rows: usize,
}

/// Parses a weather timestamp. The export sometimes carries a bare date and
/// sometimes a full timestamp, so several shapes are accepted.
fn parse_weather_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok()
}

/// Inner-joins cleaned transit rows with daily weather on the calendar date.
///
/// Transit rows keep one merged row each; weather rows fan out to every
/// transit row on their date. Rows that cannot be matched are dropped and
/// counted, so `merged_rows` can only shrink relative to `transit_rows`.
pub fn merge_weather(
    transit: Vec<TransitRecord>,
    weather: Vec<WeatherRecord>,
) -> (Vec<MergedRecord>, JoinReport) {
    let mut report = JoinReport {
        transit_rows: transit.len(),
        weather_rows: weather.len(),
        ..JoinReport::default()
    };

    let mut by_date: HashMap<NaiveDate, (DateTime<Utc>, WeatherRecord)> = HashMap::new();
    for row in weather {
        let observed = match row.datetime.as_deref().and_then(parse_weather_datetime) {
            Some(observed) => observed,
            None => {
                report.unparsed_weather_dates += 1;
                continue;
            }
        };
        match by_date.entry(observed.date_naive()) {
            Entry::Vacant(slot) => {
                slot.insert((observed, row));
            }
            Entry::Occupied(_) => {
                report.duplicate_weather_dates += 1;
            }
        }
    }

    let mut merged = Vec::new();
    let mut matched_dates: HashSet<NaiveDate> = HashSet::new();
    for row in transit {
        let service = match period_hour(&row.time_period)
            .and_then(|hour| row.day.and_hms_opt(hour, 0, 0))
        {
            Some(naive) => naive.and_utc(),
            None => {
                report.missing_service_hour += 1;
                continue;
            }
        };

        let (observed, conditions) = match by_date.get(&row.day) {
            Some(found) => found,
            None => {
                report.unmatched_transit_rows += 1;
                continue;
            }
        };
        matched_dates.insert(row.day);

        merged.push(MergedRecord {
            day: row.day,
            route_number: row.route_number,
            route_name: row.route_name,
            route_destination: row.route_destination,
            day_type: row.day_type,
            time_period: row.time_period,
            early_stops: row.early_stops,
            late_stops: row.late_stops,
            on_time_stops: row.on_time_stops,
            datetime_x: service,
            date: service.date_naive(),
            datetime_y: *observed,
            temp: conditions.temp,
            tempmax: conditions.tempmax,
            tempmin: conditions.tempmin,
            dew: conditions.dew,
            humidity: conditions.humidity,
            precip: conditions.precip,
            snow: conditions.snow,
            windgust: conditions.windgust,
            windspeed: conditions.windspeed,
            visibility: conditions.visibility,
            conditions: conditions.conditions.clone(),
        });
    }

    report.unmatched_weather_days = by_date.len() - matched_dates.len();
    report.merged_rows = merged.len();
    info!(
        transit = report.transit_rows,
        weather = report.weather_rows,
        merged = report.merged_rows,
        unmatched = report.unmatched_transit_rows,
        "Joined transit table with weather"
    );

    (merged, report)
}
