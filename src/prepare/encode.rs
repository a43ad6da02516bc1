//! Categorical encoding stage: text columns to numbers, gaps to zero.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::prepare::features::{FeatureRecord, WeatherFeatures};
use crate::prepare::frame::FeatureFrame;

/// How text columns become numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingStrategy {
    /// Every text column becomes one integer-coded column.
    Label,
    /// Route name and weekday become indicator columns with the first
    /// category dropped; the remaining text columns are integer-coded.
    OneHot,
}

/// Category-to-code tables learned from the data, one per text column.
///
/// A code is the rank of the value among the column's sorted distinct values,
/// so the same data always yields the same table. The table travels with the
/// matrix so a later consumer can encode new values the same way. A missing
/// category value is encoded as the empty-string category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodingTable {
    pub columns: BTreeMap<String, BTreeMap<String, u32>>,
}

impl EncodingTable {
    pub fn learn<'a>(&mut self, column: &str, values: impl Iterator<Item = &'a str>) {
        let distinct: BTreeSet<&str> = values.collect();
        let codes = distinct
            .into_iter()
            .enumerate()
            .map(|(code, value)| (value.to_string(), code as u32))
            .collect();
        self.columns.insert(column.to_string(), codes);
    }

    pub fn code(&self, column: &str, value: &str) -> Option<u32> {
        self.columns.get(column)?.get(value).copied()
    }
}

/// A fully numeric matrix plus the encodings that produced it.
#[derive(Debug, Clone)]
pub struct ProcessedTable {
    pub frame: FeatureFrame,
    pub encodings: EncodingTable,
}

fn encoded(table: &EncodingTable, column: &str, value: &str) -> f64 {
    f64::from(
        table
            .code(column, value)
            .expect("category learned during the same pass"),
    )
}

fn sorted_categories<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let distinct: BTreeSet<&str> = values.collect();
    distinct.into_iter().map(str::to_string).collect()
}

/// Turns derived rows into a fully numeric matrix.
///
/// Text columns are encoded per the strategy, missing numeric values become
/// zero, and weather columns appear only when at least one row carries
/// weather. Identifier columns (the service date and raw timestamps) do not
/// survive into the matrix.
pub fn preprocess(records: &[FeatureRecord], strategy: EncodingStrategy) -> Result<ProcessedTable> {
    if records.is_empty() {
        return Err(PipelineError::EmptyTable(
            "no derived rows to encode".to_string(),
        ));
    }

    let has_weather = records.iter().any(|r| r.weather.is_some());
    let weather_rows: Vec<WeatherFeatures> = records
        .iter()
        .map(|r| r.weather.clone().unwrap_or_default())
        .collect();

    let mut encodings = EncodingTable::default();
    encodings.learn("route_number", records.iter().map(|r| r.route_number.as_str()));
    encodings.learn(
        "route_destination",
        records.iter().map(|r| r.route_destination.as_str()),
    );
    encodings.learn("day_type", records.iter().map(|r| r.day_type.as_str()));
    encodings.learn("time_period", records.iter().map(|r| r.time_period.as_str()));
    if strategy == EncodingStrategy::Label {
        encodings.learn("route_name", records.iter().map(|r| r.route_name.as_str()));
        encodings.learn("day_of_week", records.iter().map(|r| r.day_of_week.as_str()));
    }

    if has_weather {
        encodings.learn("conditions", weather_rows.iter().map(|w| w.conditions.as_str()));
        encodings.learn(
            "windgust_level",
            weather_rows
                .iter()
                .map(|w| w.windgust_level.as_deref().unwrap_or("")),
        );
        encodings.learn(
            "snow_level",
            weather_rows
                .iter()
                .map(|w| w.snow_level.as_deref().unwrap_or("")),
        );
    }

    // Indicator categories for the one-hot strategy, first category dropped.
    let route_name_cats = sorted_categories(records.iter().map(|r| r.route_name.as_str()));
    let day_of_week_cats = sorted_categories(records.iter().map(|r| r.day_of_week.as_str()));
    let route_name_dummies = &route_name_cats[1..];
    let day_of_week_dummies = &day_of_week_cats[1..];

    let mut columns: Vec<String> = Vec::new();
    columns.push("route_number".to_string());
    match strategy {
        EncodingStrategy::Label => columns.push("route_name".to_string()),
        EncodingStrategy::OneHot => columns.extend(
            route_name_dummies
                .iter()
                .map(|cat| format!("route_name_{cat}")),
        ),
    }
    columns.push("route_destination".to_string());
    columns.push("day_type".to_string());
    columns.push("time_period".to_string());
    match strategy {
        EncodingStrategy::Label => columns.push("day_of_week".to_string()),
        EncodingStrategy::OneHot => columns.extend(
            day_of_week_dummies
                .iter()
                .map(|cat| format!("day_of_week_{cat}")),
        ),
    }
    columns.extend(
        [
            "hour",
            "early_stops",
            "late_stops",
            "on_time_stops",
            "total_stops",
            "on_time_pct",
            "on_time_status",
            "high_punctuality",
        ]
        .map(String::from),
    );
    if has_weather {
        columns.extend(
            [
                "temp",
                "humidity",
                "precip",
                "snow",
                "windspeed",
                "visibility",
                "conditions",
                "windgust_level",
                "snow_level",
            ]
            .map(String::from),
        );
    }

    let mut rows = Vec::with_capacity(records.len());
    for (record, weather) in records.iter().zip(&weather_rows) {
        let mut row = Vec::with_capacity(columns.len());

        row.push(encoded(&encodings, "route_number", &record.route_number));
        match strategy {
            EncodingStrategy::Label => {
                row.push(encoded(&encodings, "route_name", &record.route_name));
            }
            EncodingStrategy::OneHot => {
                for cat in route_name_dummies {
                    row.push(if record.route_name == *cat { 1.0 } else { 0.0 });
                }
            }
        }
        row.push(encoded(
            &encodings,
            "route_destination",
            &record.route_destination,
        ));
        row.push(encoded(&encodings, "day_type", &record.day_type));
        row.push(encoded(&encodings, "time_period", &record.time_period));
        match strategy {
            EncodingStrategy::Label => {
                row.push(encoded(&encodings, "day_of_week", &record.day_of_week));
            }
            EncodingStrategy::OneHot => {
                for cat in day_of_week_dummies {
                    row.push(if record.day_of_week == *cat { 1.0 } else { 0.0 });
                }
            }
        }

        row.push(record.hour.unwrap_or(0.0));
        row.push(record.early_stops);
        row.push(record.late_stops);
        row.push(record.on_time_stops);
        row.push(record.total_stops);
        row.push(record.on_time_pct);
        row.push(record.on_time_status);
        row.push(record.high_punctuality);

        if has_weather {
            row.push(weather.temp.unwrap_or(0.0));
            row.push(weather.humidity.unwrap_or(0.0));
            row.push(weather.precip.unwrap_or(0.0));
            row.push(weather.snow.unwrap_or(0.0));
            row.push(weather.windspeed.unwrap_or(0.0));
            row.push(weather.visibility.unwrap_or(0.0));
            row.push(encoded(&encodings, "conditions", &weather.conditions));
            row.push(encoded(
                &encodings,
                "windgust_level",
                weather.windgust_level.as_deref().unwrap_or(""),
            ));
            row.push(encoded(
                &encodings,
                "snow_level",
                weather.snow_level.as_deref().unwrap_or(""),
            ));
        }

        rows.push(row);
    }

    info!(
        rows = rows.len(),
        columns = columns.len(),
        weather = has_weather,
        "Encoded feature matrix"
    );

    Ok(ProcessedTable {
        frame: FeatureFrame { columns, rows },
        encodings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(route_number: &str, route_name: &str, day_of_week: &str) -> FeatureRecord {
        FeatureRecord {
            day: NaiveDate::from_ymd_opt(2024, 10, 7).unwrap(),
            route_number: route_number.to_string(),
            route_name: route_name.to_string(),
            route_destination: "Back Bay".to_string(),
            day_type: "Weekday".to_string(),
            time_period: "07:00 - 08:00".to_string(),
            day_of_week: day_of_week.to_string(),
            hour: Some(7.0),
            early_stops: 2.0,
            late_stops: 3.0,
            on_time_stops: 5.0,
            total_stops: 10.0,
            on_time_pct: 0.5,
            on_time_status: 0.0,
            high_punctuality: 0.0,
            weather: None,
        }
    }

    #[test]
    fn test_label_codes_are_sorted_ranks() {
        let records = vec![
            record("A", "x", "Monday"),
            record("B", "x", "Monday"),
            record("A", "x", "Monday"),
            record("C", "x", "Monday"),
        ];
        let table = preprocess(&records, EncodingStrategy::Label).unwrap();

        let codes = table.frame.column("route_number").unwrap();
        assert_eq!(codes, vec![0.0, 1.0, 0.0, 2.0]);
        assert_eq!(table.encodings.code("route_number", "C"), Some(2));
    }

    #[test]
    fn test_matrix_is_fully_numeric_with_zero_fill() {
        let mut with_gap = record("A", "x", "Monday");
        with_gap.hour = None;
        let records = vec![with_gap, record("B", "y", "Tuesday")];

        let table = preprocess(&records, EncodingStrategy::Label).unwrap();

        for row in &table.frame.rows {
            assert_eq!(row.len(), table.frame.columns.len());
            assert!(row.iter().all(|v| v.is_finite()));
        }
        assert_eq!(table.frame.column("hour").unwrap()[0], 0.0);
    }

    #[test]
    fn test_without_weather_no_weather_columns_appear() {
        let table = preprocess(&[record("A", "x", "Monday")], EncodingStrategy::Label).unwrap();
        assert!(table.frame.column_index("temp").is_none());
        assert!(table.frame.column_index("conditions").is_none());
        assert!(table.frame.column_index("on_time_status").is_some());
    }

    #[test]
    fn test_weather_rows_get_bucket_columns() {
        let mut with_weather = record("A", "x", "Monday");
        with_weather.weather = Some(WeatherFeatures {
            temp: Some(58.0),
            tempmax: Some(63.1),
            tempmin: Some(51.0),
            dew: Some(48.9),
            humidity: Some(70.0),
            precip: Some(0.0),
            snow: Some(0.0),
            windgust: Some(18.3),
            windspeed: Some(9.0),
            visibility: None,
            conditions: "Clear".to_string(),
            windgust_level: Some("Low".to_string()),
            snow_level: Some("None".to_string()),
        });

        let table = preprocess(&[with_weather], EncodingStrategy::Label).unwrap();

        assert_eq!(table.frame.column("temp").unwrap(), vec![58.0]);
        assert_eq!(table.frame.column("visibility").unwrap(), vec![0.0]);
        assert!(table.encodings.code("windgust_level", "Low").is_some());
        // The raw gust and the shadow temperatures stay out of the matrix.
        assert!(table.frame.column_index("windgust").is_none());
        assert!(table.frame.column_index("tempmax").is_none());
        assert!(table.frame.column_index("dew").is_none());
    }

    #[test]
    fn test_one_hot_drops_first_category() {
        let records = vec![
            record("A", "Ashmont", "Monday"),
            record("B", "Braintree", "Tuesday"),
            record("C", "Copley", "Wednesday"),
        ];
        let table = preprocess(&records, EncodingStrategy::OneHot).unwrap();

        // Three route names produce two indicator columns.
        assert!(table.frame.column_index("route_name").is_none());
        assert!(table.frame.column_index("route_name_Ashmont").is_none());
        assert_eq!(
            table.frame.column("route_name_Braintree").unwrap(),
            vec![0.0, 1.0, 0.0]
        );
        assert_eq!(
            table.frame.column("route_name_Copley").unwrap(),
            vec![0.0, 0.0, 1.0]
        );
        // Weekday/Weekend stays a single binary column.
        assert_eq!(table.frame.column("day_type").unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = preprocess(&[], EncodingStrategy::Label).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTable(_)));
    }
}
