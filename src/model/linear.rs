//! Ordinary least squares regressor.

use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::model::metrics::{self, RegressionMetrics};
use crate::prepare::split::TargetSplit;

/// Fits an ordinary least squares model and scores the holdout.
pub fn regress(split: &TargetSplit) -> Result<RegressionMetrics> {
    super::require_rows(split)?;

    let x_train = super::matrix(&split.x_train)?;
    let x_test = super::matrix(&split.x_test)?;

    let model = LinearRegression::fit(&x_train, &split.y_train, LinearRegressionParameters::default())
        .map_err(|e| PipelineError::Model(format!("linear regressor: {e}")))?;
    let predicted = model
        .predict(&x_test)
        .map_err(|e| PipelineError::Model(format!("linear regressor: {e}")))?;

    let report = metrics::regression_metrics(&split.y_test, &predicted);
    info!(
        column = split.target.as_str(),
        rmse = report.rmse,
        r2 = report.r2,
        "Evaluated linear regressor"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_split() -> TargetSplit {
        let line = |x: f64| 3.0 * x + 1.0;
        let x_train: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y_train: Vec<f64> = x_train.iter().map(|row| line(row[0])).collect();
        let x_test: Vec<Vec<f64>> = [2.5, 4.5, 7.5].iter().map(|&x| vec![x]).collect();
        let y_test: Vec<f64> = x_test.iter().map(|row| line(row[0])).collect();
        TargetSplit {
            target: "late_stops".to_string(),
            feature_names: vec!["x".to_string()],
            x_train,
            x_test,
            y_train,
            y_test,
            train_indices: (0..10).collect(),
            test_indices: (10..13).collect(),
        }
    }

    #[test]
    fn test_recovers_a_noiseless_line() {
        let report = regress(&linear_split()).unwrap();
        assert!(report.mae < 1e-6);
        assert!(report.r2 > 0.999);
    }

    #[test]
    fn test_empty_partition_is_rejected() {
        let mut split = linear_split();
        split.x_train.clear();
        split.y_train.clear();
        let err = regress(&split).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTable(_)));
    }
}
