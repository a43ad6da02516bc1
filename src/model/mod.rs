//! Model training and evaluation.
//!
//! Three interchangeable families are trained on the punctuality targets:
//! random forests, a linear regressor, and gradient boosted trees. Each run
//! fits on the train partition and reports test-set metrics only.

pub mod boosted;
pub mod forest;
pub mod linear;
pub mod metrics;

use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{PipelineError, Result};
use crate::prepare::split::TargetSplit;
use metrics::{ClassificationMetrics, RegressionMetrics};

/// The interchangeable model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Forest,
    Linear,
    Boosted,
}

impl ModelKind {
    /// The linear family only regresses; the others support both tasks.
    pub fn supports_classification(&self) -> bool {
        !matches!(self, ModelKind::Linear)
    }
}

/// Trains a classifier for the binary punctuality label and scores it.
pub fn train_classifier(
    kind: ModelKind,
    split: &TargetSplit,
    seed: u64,
) -> Result<ClassificationMetrics> {
    match kind {
        ModelKind::Forest => forest::classify(split, seed),
        ModelKind::Boosted => boosted::classify(split),
        ModelKind::Linear => Err(PipelineError::Model(
            "the linear family only supports regression".to_string(),
        )),
    }
}

/// Trains a regressor for a numeric target and scores it.
pub fn train_regressor(
    kind: ModelKind,
    split: &TargetSplit,
    seed: u64,
) -> Result<RegressionMetrics> {
    match kind {
        ModelKind::Forest => forest::regress(split, seed),
        ModelKind::Linear => linear::regress(split),
        ModelKind::Boosted => boosted::regress(split),
    }
}

pub(crate) fn require_rows(split: &TargetSplit) -> Result<()> {
    if split.x_train.is_empty() || split.x_test.is_empty() {
        return Err(PipelineError::EmptyTable(format!(
            "target `{}` has an empty train or test partition",
            split.target
        )));
    }
    Ok(())
}

pub(crate) fn matrix(rows: &Vec<Vec<f64>>) -> Result<DenseMatrix<f64>> {
    DenseMatrix::from_2d_vec(rows).map_err(|e| PipelineError::Model(format!("bad matrix: {e}")))
}
