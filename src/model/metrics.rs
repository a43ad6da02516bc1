//! Test-set metrics for both model tasks.

use serde::Serialize;

/// Precision, recall, and F1 for one class of a classifier.
#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub label: u32,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Classification metrics over a test partition.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub classes: Vec<ClassReport>,
}

/// Regression metrics over a test partition.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Computes accuracy plus per-class precision, recall, and F1.
///
/// Classes are every label seen in either vector. A class never predicted
/// gets zero precision rather than an undefined ratio, and likewise for
/// recall on a class never observed.
pub fn classification_report(y_true: &[u32], y_pred: &[u32]) -> ClassificationMetrics {
    let total = y_true.len();
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };

    let mut labels: Vec<u32> = y_true.iter().chain(y_pred).copied().collect();
    labels.sort_unstable();
    labels.dedup();

    let mut classes = Vec::with_capacity(labels.len());
    for label in labels {
        let true_pos = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| **t == label && **p == label)
            .count() as f64;
        let false_pos = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| **t != label && **p == label)
            .count() as f64;
        let false_neg = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| **t == label && **p != label)
            .count() as f64;
        let support = y_true.iter().filter(|t| **t == label).count();

        let precision = if true_pos + false_pos == 0.0 {
            0.0
        } else {
            true_pos / (true_pos + false_pos)
        };
        let recall = if true_pos + false_neg == 0.0 {
            0.0
        } else {
            true_pos / (true_pos + false_neg)
        };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        classes.push(ClassReport {
            label,
            precision,
            recall,
            f1,
            support,
        });
    }

    ClassificationMetrics { accuracy, classes }
}

/// Computes mean absolute error, root mean squared error, and R².
///
/// R² is zero when the truth has no variance, since the ratio is undefined
/// there.
pub fn regression_metrics(y_true: &[f64], y_pred: &[f64]) -> RegressionMetrics {
    let n = y_true.len();
    if n == 0 {
        return RegressionMetrics {
            mae: 0.0,
            rmse: 0.0,
            r2: 0.0,
        };
    }
    let n = n as f64;

    let mae = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n;
    let ss_res = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>();
    let rmse = (ss_res / n).sqrt();

    let mean = y_true.iter().sum::<f64>() / n;
    let ss_tot = y_true.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>();
    let r2 = if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    RegressionMetrics { mae, rmse, r2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_classification_report_counts_confusion() {
        let report = classification_report(&[1, 0, 1, 1], &[1, 0, 0, 1]);

        assert!(close(report.accuracy, 0.75));
        assert_eq!(report.classes.len(), 2);

        let zero = &report.classes[0];
        assert_eq!(zero.label, 0);
        assert!(close(zero.precision, 0.5)); // predicted 0 twice, right once
        assert!(close(zero.recall, 1.0));
        assert_eq!(zero.support, 1);

        let one = &report.classes[1];
        assert!(close(one.precision, 1.0));
        assert!(close(one.recall, 2.0 / 3.0));
        assert!(close(one.f1, 0.8));
        assert_eq!(one.support, 3);
    }

    #[test]
    fn test_perfect_predictions_score_one() {
        let report = classification_report(&[0, 1, 1], &[0, 1, 1]);
        assert!(close(report.accuracy, 1.0));
        assert!(report.classes.iter().all(|c| close(c.f1, 1.0)));
    }

    #[test]
    fn test_never_predicted_class_has_zero_precision() {
        let report = classification_report(&[1, 1, 0], &[1, 1, 1]);
        let zero = &report.classes[0];
        assert!(close(zero.precision, 0.0));
        assert!(close(zero.recall, 0.0));
        assert!(close(zero.f1, 0.0));
    }

    #[test]
    fn test_regression_metrics_on_constant_offset() {
        let metrics = regression_metrics(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]);
        assert!(close(metrics.mae, 1.0));
        assert!(close(metrics.rmse, 1.0));
        assert!(close(metrics.r2, -0.5)); // worse than predicting the mean
    }

    #[test]
    fn test_r2_is_zero_when_truth_is_constant() {
        let metrics = regression_metrics(&[5.0, 5.0, 5.0], &[4.0, 5.0, 6.0]);
        assert!(close(metrics.r2, 0.0));
    }

    #[test]
    fn test_exact_regression_scores_one() {
        let metrics = regression_metrics(&[1.0, 2.0, 4.0], &[1.0, 2.0, 4.0]);
        assert!(close(metrics.mae, 0.0));
        assert!(close(metrics.rmse, 0.0));
        assert!(close(metrics.r2, 1.0));
    }
}
