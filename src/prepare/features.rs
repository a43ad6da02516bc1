//! Feature derivation stage: punctuality labels and calendar/weather features.

use chrono::Timelike;
use serde::Serialize;
use tracing::info;

use crate::config::FeatureConfig;
use crate::records::{MergedRecord, TransitRecord};

/// One row ready for encoding, with labels and derived features attached.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    pub day: chrono::NaiveDate,
    pub route_number: String,
    pub route_name: String,
    pub route_destination: String,
    pub day_type: String,
    pub time_period: String,
    pub day_of_week: String,
    pub hour: Option<f64>,
    pub early_stops: f64,
    pub late_stops: f64,
    pub on_time_stops: f64,
    pub total_stops: f64,
    pub on_time_pct: f64,
    /// 1 when on-time stops outnumber early and late combined, else 0.
    pub on_time_status: f64,
    /// 1 when the on-time share reaches the configured threshold, else 0.
    /// Kept separate from `on_time_status`; the two answer different questions.
    pub high_punctuality: f64,
    pub weather: Option<WeatherFeatures>,
}

/// Weather features carried per row after the join.
///
/// Every numeric measurement rides along so the summary stage can correlate
/// it with late stops. Max/min temperature, dew point, and the raw wind gust
/// go no further than that; the encoder keeps them out of the matrix, where
/// the gust appears only as its bucketed level.
#[derive(Debug, Clone, Default)]
pub struct WeatherFeatures {
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
    pub windgust_level: Option<String>,
    pub snow_level: Option<String>,
}

/// Row accounting for one run of the derivation stage.
#[derive(Debug, Default, Serialize)]
pub struct FeatureReport {
    pub input_rows: usize,
    /// Rows missing at least one stop counter.
    pub missing_stop_counts: usize,
    /// Rows whose counters sum to zero, where no on-time share is defined.
    pub zero_stop_totals: usize,
    pub derived_rows: usize,
}

/// Extracts the starting hour from a time period such as `07:00 - 08:00`.
///
/// Takes the leftmost one- or two-digit run followed by a colon, preferring
/// the longer read. Hours of 24 or more are rejected.
pub fn period_hour(period: &str) -> Option<u32> {
    let bytes = period.as_bytes();
    for start in 0..bytes.len() {
        if !bytes[start].is_ascii_digit() {
            continue;
        }
        let mut end = start + 1;
        if end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        while end > start {
            if bytes.get(end) == Some(&b':') {
                let hour: u32 = period[start..end].parse().ok()?;
                return (hour < 24).then_some(hour);
            }
            end -= 1;
        }
    }
    None
}

/// The binary punctuality label: 1 when on-time stops strictly outnumber
/// early and late stops combined. A tie counts as not on time.
pub fn on_time_status(early_stops: u32, late_stops: u32, on_time_stops: u32) -> u8 {
    if u64::from(on_time_stops) > u64::from(early_stops) + u64::from(late_stops) {
        1
    } else {
        0
    }
}

/// Places a value into a labeled interval, `edges[i] < value <= edges[i + 1]`.
/// Values outside the outermost edges get no label.
fn bucket(value: f64, edges: &[f64], labels: &[String]) -> Option<String> {
    for (window, label) in edges.windows(2).zip(labels) {
        if value > window[0] && value <= window[1] {
            return Some(label.clone());
        }
    }
    None
}

struct PunctualityFields {
    early: f64,
    late: f64,
    on_time: f64,
    total: f64,
    pct: f64,
    status: f64,
    high: f64,
}

fn punctuality_fields(
    early: u32,
    late: u32,
    on_time: u32,
    threshold: f64,
) -> Option<PunctualityFields> {
    let total = f64::from(early) + f64::from(late) + f64::from(on_time);
    if total == 0.0 {
        return None;
    }
    let pct = f64::from(on_time) / total;
    Some(PunctualityFields {
        early: f64::from(early),
        late: f64::from(late),
        on_time: f64::from(on_time),
        total,
        pct,
        status: f64::from(on_time_status(early, late, on_time)),
        high: if pct >= threshold { 1.0 } else { 0.0 },
    })
}

/// Derives features from the weather-joined table.
pub fn derive_from_merged(
    rows: Vec<MergedRecord>,
    cfg: &FeatureConfig,
) -> (Vec<FeatureRecord>, FeatureReport) {
    let mut report = FeatureReport {
        input_rows: rows.len(),
        ..FeatureReport::default()
    };

    let mut records = Vec::new();
    for row in rows {
        let (early, late, on_time) = match (row.early_stops, row.late_stops, row.on_time_stops) {
            (Some(early), Some(late), Some(on_time)) => (early, late, on_time),
            _ => {
                report.missing_stop_counts += 1;
                continue;
            }
        };
        let fields = match punctuality_fields(early, late, on_time, cfg.high_punctuality_threshold)
        {
            Some(fields) => fields,
            None => {
                report.zero_stop_totals += 1;
                continue;
            }
        };

        records.push(FeatureRecord {
            day: row.day,
            day_of_week: row.day.format("%A").to_string(),
            route_number: row.route_number,
            route_name: row.route_name,
            route_destination: row.route_destination,
            day_type: row.day_type,
            time_period: row.time_period,
            hour: Some(f64::from(row.datetime_x.hour())),
            early_stops: fields.early,
            late_stops: fields.late,
            on_time_stops: fields.on_time,
            total_stops: fields.total,
            on_time_pct: fields.pct,
            on_time_status: fields.status,
            high_punctuality: fields.high,
            weather: Some(WeatherFeatures {
                temp: row.temp,
                tempmax: row.tempmax,
                tempmin: row.tempmin,
                dew: row.dew,
                humidity: row.humidity,
                precip: row.precip,
                snow: row.snow,
                windgust: row.windgust,
                windspeed: row.windspeed,
                visibility: row.visibility,
                conditions: row.conditions,
                windgust_level: row
                    .windgust
                    .and_then(|v| bucket(v, &cfg.wind_edges, &cfg.wind_labels)),
                snow_level: row
                    .snow
                    .and_then(|v| bucket(v, &cfg.snow_edges, &cfg.snow_labels)),
            }),
        });
    }

    report.derived_rows = records.len();
    info!(
        input = report.input_rows,
        derived = report.derived_rows,
        "Derived features from merged table"
    );

    (records, report)
}

/// Derives features from a cleaned table alone, for runs without weather.
pub fn derive_from_transit(
    rows: Vec<TransitRecord>,
    cfg: &FeatureConfig,
) -> (Vec<FeatureRecord>, FeatureReport) {
    let mut report = FeatureReport {
        input_rows: rows.len(),
        ..FeatureReport::default()
    };

    let mut records = Vec::new();
    for row in rows {
        let (early, late, on_time) = match (row.early_stops, row.late_stops, row.on_time_stops) {
            (Some(early), Some(late), Some(on_time)) => (early, late, on_time),
            _ => {
                report.missing_stop_counts += 1;
                continue;
            }
        };
        let fields = match punctuality_fields(early, late, on_time, cfg.high_punctuality_threshold)
        {
            Some(fields) => fields,
            None => {
                report.zero_stop_totals += 1;
                continue;
            }
        };

        records.push(FeatureRecord {
            day: row.day,
            day_of_week: row.day.format("%A").to_string(),
            route_number: row.route_number,
            route_name: row.route_name,
            route_destination: row.route_destination,
            day_type: row.day_type,
            hour: period_hour(&row.time_period).map(f64::from),
            time_period: row.time_period,
            early_stops: fields.early,
            late_stops: fields.late,
            on_time_stops: fields.on_time,
            total_stops: fields.total,
            on_time_pct: fields.pct,
            on_time_status: fields.status,
            high_punctuality: fields.high,
            weather: None,
        });
    }

    report.derived_rows = records.len();
    info!(
        input = report.input_rows,
        derived = report.derived_rows,
        "Derived features from cleaned table"
    );

    (records, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn transit_row(early: Option<u32>, late: Option<u32>, on_time: Option<u32>) -> TransitRecord {
        TransitRecord {
            day: NaiveDate::from_ymd_opt(2024, 10, 7).unwrap(),
            route_number: "39".to_string(),
            route_name: "Forest Hills".to_string(),
            route_destination: "Back Bay".to_string(),
            day_type: "Weekday".to_string(),
            time_period: "07:00 - 08:00".to_string(),
            early_stops: early,
            late_stops: late,
            on_time_stops: on_time,
        }
    }

    #[test]
    fn test_on_time_status_requires_strict_majority() {
        assert_eq!(on_time_status(10, 5, 16), 1);
        assert_eq!(on_time_status(10, 5, 15), 0); // tie is not on time
        assert_eq!(on_time_status(0, 0, 1), 1);
        assert_eq!(on_time_status(1, 0, 0), 0);
    }

    #[test]
    fn test_period_hour_reads_leading_hour() {
        assert_eq!(period_hour("07:00 - 08:00"), Some(7));
        assert_eq!(period_hour("7:15 PM - 8:00 PM"), Some(7));
        assert_eq!(period_hour("Peak 16:00-18:00"), Some(16));
        assert_eq!(period_hour("All Day"), None);
        assert_eq!(period_hour("25:00 - 26:00"), None);
    }

    #[test]
    fn test_bucket_edges_are_left_open_right_closed() {
        let cfg = FeatureConfig::default();

        let wind = |v: f64| bucket(v, &cfg.wind_edges, &cfg.wind_labels);
        assert_eq!(wind(0.0).as_deref(), Some("Low"));
        assert_eq!(wind(20.0).as_deref(), Some("Low"));
        assert_eq!(wind(20.1).as_deref(), Some("Medium"));
        assert_eq!(wind(60.5).as_deref(), Some("Extreme"));
        assert_eq!(wind(250.0), None);
        assert_eq!(wind(-5.0), None);

        let snow = |v: f64| bucket(v, &cfg.snow_edges, &cfg.snow_labels);
        assert_eq!(snow(0.0).as_deref(), Some("None"));
        assert_eq!(snow(0.1).as_deref(), Some("None"));
        assert_eq!(snow(0.2).as_deref(), Some("Snow"));
        assert_eq!(snow(2.0).as_deref(), Some("Snow"));
        assert_eq!(snow(2.1).as_deref(), Some("Heavy"));
    }

    #[test]
    fn test_derived_totals_and_share() {
        let (records, report) =
            derive_from_transit(vec![transit_row(Some(2), Some(3), Some(5))], &FeatureConfig::default());

        assert_eq!(report.derived_rows, 1);
        let row = &records[0];
        assert_eq!(row.total_stops, 10.0);
        assert_eq!(row.on_time_pct, 0.5);
        assert_eq!(row.on_time_status, 0.0); // 5 does not beat 2 + 3
        assert_eq!(row.high_punctuality, 0.0);
        assert_eq!(row.day_of_week, "Monday");
        assert_eq!(row.hour, Some(7.0));
    }

    #[test]
    fn test_high_punctuality_threshold_is_inclusive() {
        let (records, _) = derive_from_transit(
            vec![
                transit_row(Some(1), Some(1), Some(8)),  // exactly 0.8
                transit_row(Some(1), Some(1), Some(7)),  // just below
            ],
            &FeatureConfig::default(),
        );

        assert_eq!(records[0].high_punctuality, 1.0);
        assert_eq!(records[1].high_punctuality, 0.0);
        assert_eq!(records[0].on_time_status, 1.0);
    }

    #[test]
    fn test_zero_totals_and_missing_counts_are_dropped() {
        let (records, report) = derive_from_transit(
            vec![
                transit_row(Some(0), Some(0), Some(0)),
                transit_row(None, Some(2), Some(5)),
                transit_row(Some(1), Some(2), Some(5)),
            ],
            &FeatureConfig::default(),
        );

        assert_eq!(records.len(), 1);
        assert_eq!(report.zero_stop_totals, 1);
        assert_eq!(report.missing_stop_counts, 1);
    }
}
