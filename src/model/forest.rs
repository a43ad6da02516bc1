//! Random forest classifier and regressor.

use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::model::metrics::{self, ClassificationMetrics, RegressionMetrics};
use crate::prepare::split::TargetSplit;

/// Fits a seeded random forest on the binary label and scores the holdout.
pub fn classify(split: &TargetSplit, seed: u64) -> Result<ClassificationMetrics> {
    super::require_rows(split)?;

    let x_train = super::matrix(&split.x_train)?;
    let x_test = super::matrix(&split.x_test)?;
    let y_train: Vec<u32> = split.y_train.iter().map(|v| *v as u32).collect();
    let y_test: Vec<u32> = split.y_test.iter().map(|v| *v as u32).collect();

    let params = RandomForestClassifierParameters::default()
        .with_n_trees(100)
        .with_seed(seed);
    let model = RandomForestClassifier::fit(&x_train, &y_train, params)
        .map_err(|e| PipelineError::Model(format!("random forest classifier: {e}")))?;
    let predicted = model
        .predict(&x_test)
        .map_err(|e| PipelineError::Model(format!("random forest classifier: {e}")))?;

    let report = metrics::classification_report(&y_test, &predicted);
    info!(
        column = split.target.as_str(),
        accuracy = report.accuracy,
        "Evaluated random forest classifier"
    );
    Ok(report)
}

/// Fits a seeded random forest on a numeric target and scores the holdout.
pub fn regress(split: &TargetSplit, seed: u64) -> Result<RegressionMetrics> {
    super::require_rows(split)?;

    let x_train = super::matrix(&split.x_train)?;
    let x_test = super::matrix(&split.x_test)?;

    let params = RandomForestRegressorParameters::default()
        .with_n_trees(100)
        .with_seed(seed);
    let model = RandomForestRegressor::fit(&x_train, &split.y_train, params)
        .map_err(|e| PipelineError::Model(format!("random forest regressor: {e}")))?;
    let predicted = model
        .predict(&x_test)
        .map_err(|e| PipelineError::Model(format!("random forest regressor: {e}")))?;

    let report = metrics::regression_metrics(&split.y_test, &predicted);
    info!(
        column = split.target.as_str(),
        rmse = report.rmse,
        r2 = report.r2,
        "Evaluated random forest regressor"
    );
    Ok(report)
}
