//! Tunable settings for the pipeline stages.

use chrono::NaiveDate;

/// Service-date window kept by the cleaning stage. Bounds are inclusive.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for CleanConfig {
    /// October 2024 through March 2025, the season the source data covers.
    fn default() -> Self {
        CleanConfig {
            start: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        }
    }
}

/// Settings for the feature derivation stage.
///
/// Bin edges follow interval semantics: a value lands in bucket `i` when
/// `edges[i] < value <= edges[i + 1]`. Values outside the outermost edges get
/// no bucket and surface as a missing category.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    pub wind_edges: Vec<f64>,
    pub wind_labels: Vec<String>,
    pub snow_edges: Vec<f64>,
    pub snow_labels: Vec<String>,
    /// Minimum on-time share for a row to count as highly punctual.
    pub high_punctuality_threshold: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            wind_edges: vec![-1.0, 20.0, 40.0, 60.0, 200.0],
            wind_labels: vec![
                "Low".to_string(),
                "Medium".to_string(),
                "High".to_string(),
                "Extreme".to_string(),
            ],
            snow_edges: vec![-0.1, 0.1, 2.0, 100.0],
            snow_labels: vec![
                "None".to_string(),
                "Snow".to_string(),
                "Heavy".to_string(),
            ],
            high_punctuality_threshold: 0.8,
        }
    }
}

/// Settings for the train/test split.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation.
    pub holdout: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            holdout: 0.2,
            seed: 42,
        }
    }
}
