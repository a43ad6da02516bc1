//! Train/test split stage.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::config::SplitConfig;
use crate::error::{PipelineError, Result};
use crate::prepare::frame::FeatureFrame;

/// One target's train/test partition, with the target column separated out.
///
/// The feature side keeps every other column, the two punctuality labels
/// included. Row indices into the source frame are kept so the partition
/// stays auditable.
#[derive(Debug, Clone)]
pub struct TargetSplit {
    pub target: String,
    pub feature_names: Vec<String>,
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Splits the frame into seeded train and test partitions for one target.
///
/// The holdout size is `round(holdout * rows)`. The same seed over the same
/// frame always produces the same partition, regardless of target.
pub fn train_test_split(
    frame: &FeatureFrame,
    target: &str,
    cfg: &SplitConfig,
) -> Result<TargetSplit> {
    let target_idx = frame
        .column_index(target)
        .ok_or_else(|| PipelineError::SchemaMismatch(target.to_string()))?;
    if frame.is_empty() {
        return Err(PipelineError::EmptyTable(format!(
            "cannot split an empty table for `{target}`"
        )));
    }

    let test_len = (cfg.holdout * frame.len() as f64).round() as usize;

    let mut indices: Vec<usize> = (0..frame.len()).collect();
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    indices.shuffle(&mut rng);

    let mut test_indices = indices[..test_len.min(indices.len())].to_vec();
    let mut train_indices = indices[test_len.min(indices.len())..].to_vec();
    test_indices.sort_unstable();
    train_indices.sort_unstable();

    let take = |rows: &[usize]| {
        let mut x = Vec::with_capacity(rows.len());
        let mut y = Vec::with_capacity(rows.len());
        for &i in rows {
            let row = &frame.rows[i];
            let mut features = Vec::with_capacity(row.len().saturating_sub(1));
            for (j, value) in row.iter().enumerate() {
                if j != target_idx {
                    features.push(*value);
                }
            }
            x.push(features);
            y.push(row[target_idx]);
        }
        (x, y)
    };
    let (x_train, y_train) = take(&train_indices);
    let (x_test, y_test) = take(&test_indices);

    let feature_names = frame
        .columns
        .iter()
        .filter(|c| c.as_str() != target)
        .cloned()
        .collect();

    info!(
        column = target,
        train = train_indices.len(),
        test = test_indices.len(),
        "Split feature matrix"
    );

    Ok(TargetSplit {
        target: target.to_string(),
        feature_names,
        x_train,
        x_test,
        y_train,
        y_test,
        train_indices,
        test_indices,
    })
}
