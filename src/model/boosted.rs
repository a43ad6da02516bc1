//! Gradient boosted trees built on shallow regression trees.
//!
//! Regression boosts toward residuals from the mean; classification boosts
//! log odds with a sigmoid readout. Boosting runs over the full train
//! partition each round, so a run is deterministic.

use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::model::metrics::{self, ClassificationMetrics, RegressionMetrics};
use crate::prepare::split::TargetSplit;

type BaseTree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Keeps log odds away from infinity when a class is absent.
const ODDS_EPSILON: f64 = 1e-10;

/// Boosting settings shared by both tasks.
#[derive(Debug, Clone)]
pub struct BoostedParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
}

impl Default for BoostedParams {
    fn default() -> Self {
        BoostedParams {
            n_rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
        }
    }
}

fn tree_params(params: &BoostedParams) -> DecisionTreeRegressorParameters {
    DecisionTreeRegressorParameters::default().with_max_depth(params.max_depth)
}

fn fit_tree(x: &DenseMatrix<f64>, residuals: &Vec<f64>, params: &BoostedParams) -> Result<BaseTree> {
    DecisionTreeRegressor::fit(x, residuals, tree_params(params))
        .map_err(|e| PipelineError::Model(format!("boosted tree: {e}")))
}

fn predict_tree(tree: &BaseTree, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
    tree.predict(x)
        .map_err(|e| PipelineError::Model(format!("boosted tree: {e}")))
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Sums a constant base with the learning-rate-scaled tree updates.
fn boosted_scores(
    base: f64,
    trees: &[BaseTree],
    x: &DenseMatrix<f64>,
    rows: usize,
    learning_rate: f64,
) -> Result<Vec<f64>> {
    let mut scores = vec![base; rows];
    for tree in trees {
        let update = predict_tree(tree, x)?;
        for (score, u) in scores.iter_mut().zip(&update) {
            *score += learning_rate * u;
        }
    }
    Ok(scores)
}

/// Boosts residuals from the mean and scores the holdout.
pub fn regress(split: &TargetSplit) -> Result<RegressionMetrics> {
    super::require_rows(split)?;
    let params = BoostedParams::default();

    let x_train = super::matrix(&split.x_train)?;
    let x_test = super::matrix(&split.x_test)?;

    let base = split.y_train.iter().sum::<f64>() / split.y_train.len() as f64;
    let mut current = vec![base; split.y_train.len()];
    let mut trees = Vec::with_capacity(params.n_rounds);

    for _ in 0..params.n_rounds {
        let residuals: Vec<f64> = split
            .y_train
            .iter()
            .zip(&current)
            .map(|(y, p)| y - p)
            .collect();
        let tree = fit_tree(&x_train, &residuals, &params)?;
        let update = predict_tree(&tree, &x_train)?;
        for (cur, u) in current.iter_mut().zip(&update) {
            *cur += params.learning_rate * u;
        }
        trees.push(tree);
    }

    let predicted = boosted_scores(
        base,
        &trees,
        &x_test,
        split.x_test.len(),
        params.learning_rate,
    )?;
    let report = metrics::regression_metrics(&split.y_test, &predicted);
    info!(
        column = split.target.as_str(),
        rounds = params.n_rounds,
        rmse = report.rmse,
        r2 = report.r2,
        "Evaluated boosted regressor"
    );
    Ok(report)
}

/// Boosts log odds for the binary label and scores the holdout at 0.5.
pub fn classify(split: &TargetSplit) -> Result<ClassificationMetrics> {
    super::require_rows(split)?;
    let params = BoostedParams::default();

    let x_train = super::matrix(&split.x_train)?;
    let x_test = super::matrix(&split.x_test)?;

    let positives = split.y_train.iter().filter(|y| **y > 0.5).count() as f64;
    let p = positives / split.y_train.len() as f64;
    let base = ((p + ODDS_EPSILON) / (1.0 - p + ODDS_EPSILON)).ln();

    let mut log_odds = vec![base; split.y_train.len()];
    let mut trees = Vec::with_capacity(params.n_rounds);

    for _ in 0..params.n_rounds {
        let residuals: Vec<f64> = split
            .y_train
            .iter()
            .zip(&log_odds)
            .map(|(y, z)| y - sigmoid(*z))
            .collect();
        let tree = fit_tree(&x_train, &residuals, &params)?;
        let update = predict_tree(&tree, &x_train)?;
        for (z, u) in log_odds.iter_mut().zip(&update) {
            *z += params.learning_rate * u;
        }
        trees.push(tree);
    }

    let scores = boosted_scores(
        base,
        &trees,
        &x_test,
        split.x_test.len(),
        params.learning_rate,
    )?;
    let predicted: Vec<u32> = scores
        .iter()
        .map(|z| if sigmoid(*z) >= 0.5 { 1 } else { 0 })
        .collect();
    let y_test: Vec<u32> = split.y_test.iter().map(|v| *v as u32).collect();

    let report = metrics::classification_report(&y_test, &predicted);
    info!(
        column = split.target.as_str(),
        rounds = params.n_rounds,
        accuracy = report.accuracy,
        "Evaluated boosted classifier"
    );
    Ok(report)
}
