//! Cleaning stage: service-date parsing, window filtering, and key checks.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::config::CleanConfig;
use crate::records::{RawTransitRecord, TransitRecord};

/// The format the agency export uses for the service day.
const SERVICE_DAY_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Row accounting for one run of the cleaning stage.
#[derive(Debug, Default, Serialize)]
pub struct CleanReport {
    pub input_rows: usize,
    /// Rows whose day value was missing or not in the expected format.
    pub unparsed_days: usize,
    /// Rows with a valid day outside the configured window.
    pub outside_window: usize,
    pub missing_route_number: usize,
    pub missing_route_destination: usize,
    /// Exact repeats of an earlier row. Counted, never removed.
    pub duplicate_rows: usize,
    pub retained_rows: usize,
}

fn parse_service_day(raw: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(raw.trim(), SERVICE_DAY_FORMAT)
        .map(|dt| dt.date())
        .ok()
}

/// Cleans the raw export: parses service days, keeps only rows inside the
/// configured window, and drops rows missing a day, route number, or route
/// destination. Every dropped row lands in exactly one report counter.
pub fn clean(raw: Vec<RawTransitRecord>, cfg: &CleanConfig) -> (Vec<TransitRecord>, CleanReport) {
    let mut report = CleanReport {
        input_rows: raw.len(),
        ..CleanReport::default()
    };

    let mut cleaned = Vec::new();
    let mut seen = HashSet::new();

    for row in raw {
        let day = match row.day.as_deref().and_then(parse_service_day) {
            Some(day) => day,
            None => {
                report.unparsed_days += 1;
                continue;
            }
        };

        if day < cfg.start || day > cfg.end {
            report.outside_window += 1;
            continue;
        }

        let number_missing = row.route_number.is_none();
        let destination_missing = row.route_destination.is_none();
        if number_missing {
            report.missing_route_number += 1;
        }
        if destination_missing {
            report.missing_route_destination += 1;
        }
        if number_missing || destination_missing {
            continue;
        }

        let record = TransitRecord {
            day,
            route_number: row.route_number.unwrap_or_default(),
            route_name: row.route_name.unwrap_or_default(),
            route_destination: row.route_destination.unwrap_or_default(),
            day_type: row.day_type.unwrap_or_default(),
            time_period: row.time_period.unwrap_or_default(),
            early_stops: row.early_stops,
            late_stops: row.late_stops,
            on_time_stops: row.on_time_stops,
        };

        if !seen.insert(format!("{:?}", record)) {
            report.duplicate_rows += 1;
        }
        cleaned.push(record);
    }

    report.retained_rows = cleaned.len();
    info!(
        input = report.input_rows,
        retained = report.retained_rows,
        duplicates = report.duplicate_rows,
        "Cleaned transit table"
    );

    (cleaned, report)
}
