//! Aggregation over derived rows: per-route, per-day-type, per-month, and
//! per-weather-level punctuality.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::prepare::features::{FeatureRecord, WeatherFeatures};
use crate::summary::grade::grade;
use crate::summary::types::{
    DayTypeSummary, MonthlySummary, PunctualitySummary, RouteSummary, WeatherCorrelation,
    WeatherLevelSummary,
};
use crate::summary::utility::{mean, pearson, stddev};

/// Aggregates rows per route. Busiest routes come first; ties fall back to
/// the route name.
pub fn route_summaries(rows: &[FeatureRecord]) -> Vec<RouteSummary> {
    let mut by_route: HashMap<&str, Vec<&FeatureRecord>> = HashMap::new();
    for row in rows {
        by_route.entry(row.route_name.as_str()).or_default().push(row);
    }

    let mut summaries = Vec::new();
    for (name, group) in by_route {
        let shares: Vec<f64> = group.iter().map(|r| r.on_time_pct).collect();
        let early: Vec<f64> = group.iter().map(|r| r.early_stops).collect();
        let late: Vec<f64> = group.iter().map(|r| r.late_stops).collect();
        let avg = mean(&shares);

        summaries.push(RouteSummary {
            route_name: name.to_string(),
            records: group.len(),
            avg_on_time_pct: avg,
            stddev_on_time_pct: stddev(&shares, avg),
            avg_early_stops: mean(&early),
            avg_late_stops: mean(&late),
            grade: grade(avg).to_string(),
        });
    }

    summaries.sort_by(|a, b| b.records.cmp(&a.records).then(a.route_name.cmp(&b.route_name)));
    summaries
}

/// The `k` routes with the highest average on-time share, among routes with
/// at least `min_records` rows.
pub fn most_punctual(routes: &[RouteSummary], min_records: usize, k: usize) -> Vec<RouteSummary> {
    let mut ranked: Vec<RouteSummary> = routes
        .iter()
        .filter(|r| r.records >= min_records)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.avg_on_time_pct
            .total_cmp(&a.avg_on_time_pct)
            .then(a.route_name.cmp(&b.route_name))
    });
    ranked.truncate(k);
    ranked
}

/// The `k` routes with the lowest average on-time share, among routes with
/// at least `min_records` rows.
pub fn least_punctual(routes: &[RouteSummary], min_records: usize, k: usize) -> Vec<RouteSummary> {
    let mut ranked: Vec<RouteSummary> = routes
        .iter()
        .filter(|r| r.records >= min_records)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        a.avg_on_time_pct
            .total_cmp(&b.avg_on_time_pct)
            .then(a.route_name.cmp(&b.route_name))
    });
    ranked.truncate(k);
    ranked
}

/// Average on-time share per service day type, weekday first.
pub fn day_type_summaries(rows: &[FeatureRecord]) -> Vec<DayTypeSummary> {
    let mut by_type: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in rows {
        by_type
            .entry(row.day_type.as_str())
            .or_default()
            .push(row.on_time_pct);
    }

    let mut summaries: Vec<DayTypeSummary> = by_type
        .into_iter()
        .map(|(day_type, shares)| DayTypeSummary {
            day_type: day_type.to_string(),
            records: shares.len(),
            avg_on_time_pct: mean(&shares),
        })
        .collect();
    summaries.sort_by(|a, b| a.day_type.cmp(&b.day_type));
    summaries
}

/// Average on-time share per calendar month, in calendar order.
pub fn monthly_summaries(rows: &[FeatureRecord]) -> Vec<MonthlySummary> {
    let mut by_month: HashMap<String, Vec<f64>> = HashMap::new();
    for row in rows {
        by_month
            .entry(row.day.format("%Y-%m").to_string())
            .or_default()
            .push(row.on_time_pct);
    }

    let mut summaries: Vec<MonthlySummary> = by_month
        .into_iter()
        .map(|(month, shares)| MonthlySummary {
            records: shares.len(),
            avg_on_time_pct: mean(&shares),
            month,
        })
        .collect();
    summaries.sort_by(|a, b| a.month.cmp(&b.month));
    summaries
}

/// Average stop counts per severity level, in bin order. Rows without a
/// level for this measure are left out.
pub fn weather_level_summaries(
    rows: &[FeatureRecord],
    labels: &[String],
    level_of: impl Fn(&WeatherFeatures) -> Option<&str>,
) -> Vec<WeatherLevelSummary> {
    labels
        .iter()
        .filter_map(|label| {
            let group: Vec<&FeatureRecord> = rows
                .iter()
                .filter(|r| {
                    r.weather
                        .as_ref()
                        .and_then(|w| level_of(w))
                        .is_some_and(|level| level == label)
                })
                .collect();
            if group.is_empty() {
                return None;
            }

            let early: Vec<f64> = group.iter().map(|r| r.early_stops).collect();
            let late: Vec<f64> = group.iter().map(|r| r.late_stops).collect();
            Some(WeatherLevelSummary {
                level: label.clone(),
                records: group.len(),
                avg_early_stops: mean(&early),
                avg_late_stops: mean(&late),
            })
        })
        .collect()
}

/// Correlation of each weather variable with late stops, strongest first.
pub fn weather_correlations(rows: &[FeatureRecord]) -> Vec<WeatherCorrelation> {
    let variables: [(&str, fn(&WeatherFeatures) -> Option<f64>); 10] = [
        ("temp", |w| w.temp),
        ("tempmax", |w| w.tempmax),
        ("tempmin", |w| w.tempmin),
        ("dew", |w| w.dew),
        ("humidity", |w| w.humidity),
        ("precip", |w| w.precip),
        ("snow", |w| w.snow),
        ("windgust", |w| w.windgust),
        ("windspeed", |w| w.windspeed),
        ("visibility", |w| w.visibility),
    ];

    let mut correlations = Vec::new();
    for (name, value_of) in variables {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for row in rows {
            if let Some(value) = row.weather.as_ref().and_then(value_of) {
                xs.push(value);
                ys.push(row.late_stops);
            }
        }
        if xs.len() < 2 {
            continue;
        }
        correlations.push(WeatherCorrelation {
            variable: name.to_string(),
            late_stops_correlation: pearson(&xs, &ys),
        });
    }

    correlations.sort_by(|a, b| {
        b.late_stops_correlation
            .total_cmp(&a.late_stops_correlation)
    });
    correlations
}

/// Builds the complete punctuality summary for a derived table.
///
/// The weather tables report every severity level except the most severe one
/// on each scale. Rows at the top level still count everywhere else.
pub fn summarize(
    rows: &[FeatureRecord],
    wind_labels: &[String],
    snow_labels: &[String],
    min_records: usize,
    top: usize,
) -> Result<PunctualitySummary> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyTable(
            "no derived rows to summarize".to_string(),
        ));
    }

    let wind_reported = &wind_labels[..wind_labels.len().saturating_sub(1)];
    let snow_reported = &snow_labels[..snow_labels.len().saturating_sub(1)];

    let routes = route_summaries(rows);
    let summary = PunctualitySummary {
        generated_at: Utc::now(),
        rows: rows.len(),
        most_punctual: most_punctual(&routes, min_records, top),
        least_punctual: least_punctual(&routes, min_records, top),
        day_types: day_type_summaries(rows),
        months: monthly_summaries(rows),
        wind_levels: weather_level_summaries(rows, wind_reported, |w| {
            w.windgust_level.as_deref()
        }),
        snow_levels: weather_level_summaries(rows, snow_reported, |w| w.snow_level.as_deref()),
        weather_correlations: weather_correlations(rows),
        routes,
    };

    info!(
        rows = summary.rows,
        routes = summary.routes.len(),
        "Built punctuality summary"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(route: &str, day: (i32, u32, u32), day_type: &str, pct: f64, late: f64) -> FeatureRecord {
        let date = NaiveDate::from_ymd_opt(day.0, day.1, day.2).unwrap();
        FeatureRecord {
            day: date,
            day_of_week: date.format("%A").to_string(),
            route_number: route.to_string(),
            route_name: route.to_string(),
            route_destination: "Downtown".to_string(),
            day_type: day_type.to_string(),
            time_period: "07:00 - 08:00".to_string(),
            hour: Some(7.0),
            early_stops: 1.0,
            late_stops: late,
            on_time_stops: 8.0,
            total_stops: 10.0,
            on_time_pct: pct,
            on_time_status: 1.0,
            high_punctuality: if pct >= 0.8 { 1.0 } else { 0.0 },
            weather: None,
        }
    }

    #[test]
    fn test_route_summaries_order_by_record_count() {
        let mut rows = Vec::new();
        for _ in 0..3 {
            rows.push(row("39", (2024, 10, 7), "Weekday", 0.9, 2.0));
        }
        for _ in 0..2 {
            rows.push(row("66", (2024, 10, 7), "Weekday", 0.5, 5.0));
        }
        rows.push(row("1", (2024, 10, 7), "Weekday", 0.99, 0.0));

        let routes = route_summaries(&rows);

        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].route_name, "39");
        assert_eq!(routes[0].records, 3);
        assert_eq!(routes[0].grade, "A");
        assert!((routes[1].avg_on_time_pct - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rankings_sort_by_share_and_skip_sparse_routes() {
        let mut rows: Vec<FeatureRecord> = [("a", 0.2), ("b", 0.9), ("c", 0.5)]
            .iter()
            .flat_map(|(name, pct)| vec![row(name, (2024, 11, 4), "Weekday", *pct, 1.0); 2])
            .collect();
        rows.push(row("d", (2024, 11, 4), "Weekday", 0.99, 0.0));
        let routes = route_summaries(&rows);

        // route d outranks everyone on share but has a single record
        let best = most_punctual(&routes, 2, 2);
        assert_eq!(best[0].route_name, "b");
        assert_eq!(best[1].route_name, "c");

        let worst = least_punctual(&routes, 2, 1);
        assert_eq!(worst[0].route_name, "a");
    }

    #[test]
    fn test_day_type_and_month_grouping() {
        let rows = vec![
            row("39", (2024, 10, 7), "Weekday", 0.8, 2.0),
            row("39", (2024, 10, 12), "Weekend", 0.6, 2.0),
            row("39", (2024, 11, 4), "Weekday", 0.4, 2.0),
        ];

        let day_types = day_type_summaries(&rows);
        assert_eq!(day_types.len(), 2);
        assert_eq!(day_types[0].day_type, "Weekday");
        assert!((day_types[0].avg_on_time_pct - 0.6).abs() < 1e-12);

        let months = monthly_summaries(&rows);
        assert_eq!(months[0].month, "2024-10");
        assert_eq!(months[0].records, 2);
        assert_eq!(months[1].month, "2024-11");
    }

    #[test]
    fn test_weather_levels_follow_bin_order() {
        let mut calm = row("39", (2024, 12, 2), "Weekday", 0.8, 1.0);
        calm.weather = Some(WeatherFeatures {
            windgust_level: Some("Low".to_string()),
            ..WeatherFeatures::default()
        });
        let mut windy = row("39", (2024, 12, 3), "Weekday", 0.8, 9.0);
        windy.weather = Some(WeatherFeatures {
            windgust_level: Some("High".to_string()),
            ..WeatherFeatures::default()
        });

        let labels = vec![
            "Low".to_string(),
            "Medium".to_string(),
            "High".to_string(),
            "Extreme".to_string(),
        ];
        let levels =
            weather_level_summaries(&[calm, windy], &labels, |w| w.windgust_level.as_deref());

        assert_eq!(levels.len(), 2); // empty bins are left out
        assert_eq!(levels[0].level, "Low");
        assert_eq!(levels[1].level, "High");
        assert_eq!(levels[1].avg_late_stops, 9.0);
    }

    #[test]
    fn test_correlations_rank_matching_trends_first() {
        let mut rows = Vec::new();
        for i in 0..6 {
            let mut r = row("39", (2024, 12, 2), "Weekday", 0.8, i as f64);
            r.weather = Some(WeatherFeatures {
                precip: Some(i as f64),        // moves with late stops
                temp: Some(60.0 - i as f64),   // moves against them
                ..WeatherFeatures::default()
            });
            rows.push(r);
        }

        let correlations = weather_correlations(&rows);
        assert_eq!(correlations[0].variable, "precip");
        assert!((correlations[0].late_stops_correlation - 1.0).abs() < 1e-9);
        let temp = correlations.iter().find(|c| c.variable == "temp").unwrap();
        assert!((temp.late_stops_correlation + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlations_cover_every_weather_measurement() {
        let mut rows = Vec::new();
        for i in 0..5 {
            let mut r = row("66", (2024, 12, 9), "Weekday", 0.7, (i * 2) as f64);
            r.weather = Some(WeatherFeatures {
                temp: Some(40.0),
                tempmax: Some(45.0 - i as f64),
                tempmin: Some(35.0 - 2.0 * i as f64),
                dew: Some(30.0 - 0.5 * i as f64),
                humidity: Some(70.0),
                precip: Some((i % 2) as f64 * 0.2),
                snow: Some(0.0),
                windgust: Some(10.0 + 4.0 * i as f64), // rises with late stops
                windspeed: Some(8.0),
                visibility: Some(9.9),
                ..WeatherFeatures::default()
            });
            rows.push(r);
        }

        let correlations = weather_correlations(&rows);

        let names: Vec<&str> = correlations.iter().map(|c| c.variable.as_str()).collect();
        assert_eq!(names.len(), 10);
        for variable in [
            "temp",
            "tempmax",
            "tempmin",
            "dew",
            "humidity",
            "precip",
            "snow",
            "windgust",
            "windspeed",
            "visibility",
        ] {
            assert!(names.contains(&variable), "missing {variable}");
        }
        assert_eq!(correlations[0].variable, "windgust");
        assert!((correlations[0].late_stops_correlation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_leaves_out_the_most_severe_level() {
        let mut gusty = row("39", (2025, 1, 6), "Weekday", 0.7, 6.0);
        gusty.weather = Some(WeatherFeatures {
            windgust_level: Some("Extreme".to_string()),
            snow_level: Some("None".to_string()),
            ..WeatherFeatures::default()
        });
        let mut calm = row("39", (2025, 1, 7), "Weekday", 0.9, 1.0);
        calm.weather = Some(WeatherFeatures {
            windgust_level: Some("Low".to_string()),
            snow_level: Some("None".to_string()),
            ..WeatherFeatures::default()
        });

        let wind = ["Low", "Medium", "High", "Extreme"].map(String::from);
        let snow = ["None", "Snow", "Heavy"].map(String::from);
        let summary = summarize(&[gusty, calm], &wind, &snow, 1, 5).unwrap();

        assert_eq!(summary.wind_levels.len(), 1);
        assert_eq!(summary.wind_levels[0].level, "Low");
        assert_eq!(summary.snow_levels.len(), 1);
        assert_eq!(summary.snow_levels[0].records, 2);
        assert_eq!(summary.rows, 2);
    }

    #[test]
    fn test_summary_of_nothing_is_an_error() {
        let err = summarize(&[], &[], &[], 10, 10).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTable(_)));
    }
}
