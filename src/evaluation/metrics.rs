// Held-out classification metrics.
//
// Labels are compared as strings. The label set is the sorted union of true
// and predicted labels, so a class that is only ever predicted still gets a
// confusion-matrix row (of zeros) and a precision entry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Precision, recall, F1 and support for a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of records whose true label is this class
    pub support: usize,
}

/// Unweighted or support-weighted averages over classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Everything an evaluation run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Sorted label set; indexes both axes of `confusion`
    pub labels: Vec<String>,
    pub accuracy: f64,
    /// `confusion[i][j]` = records with true label i predicted as j
    pub confusion: Vec<Vec<usize>>,
    pub per_class: Vec<ClassMetrics>,
    pub total: usize,
}

/// Score predictions against ground truth.
pub fn score<S: AsRef<str>>(truth: &[S], predicted: &[S]) -> Result<MetricsReport> {
    if truth.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    if truth.len() != predicted.len() {
        return Err(PipelineError::LengthMismatch {
            truth: truth.len(),
            predicted: predicted.len(),
        });
    }

    let labels: Vec<String> = truth
        .iter()
        .chain(predicted)
        .map(|l| l.as_ref())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let position = |label: &str| {
        labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .unwrap_or_default()
    };

    let k = labels.len();
    let mut confusion = vec![vec![0usize; k]; k];
    let mut correct = 0usize;
    for (t, p) in truth.iter().zip(predicted) {
        let (i, j) = (position(t.as_ref()), position(p.as_ref()));
        confusion[i][j] += 1;
        if i == j {
            correct += 1;
        }
    }

    let per_class = labels
        .iter()
        .enumerate()
        .map(|(c, label)| {
            let tp = confusion[c][c];
            let support: usize = confusion[c].iter().sum();
            let predicted_as: usize = confusion.iter().map(|row| row[c]).sum();
            let precision = ratio(tp, predicted_as);
            let recall = ratio(tp, support);
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1: f1(precision, recall),
                support,
            }
        })
        .collect();

    Ok(MetricsReport {
        labels,
        accuracy: correct as f64 / truth.len() as f64,
        confusion,
        per_class,
        total: truth.len(),
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl MetricsReport {
    /// Unweighted mean over all classes in the label set.
    pub fn macro_avg(&self) -> Averages {
        let n = self.per_class.len().max(1) as f64;
        Averages {
            precision: self.per_class.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: self.per_class.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: self.per_class.iter().map(|c| c.f1).sum::<f64>() / n,
        }
    }

    /// Mean over classes weighted by true-label support.
    pub fn weighted_avg(&self) -> Averages {
        let total = self.total.max(1) as f64;
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            self.per_class
                .iter()
                .map(|c| f(c) * c.support as f64)
                .sum::<f64>()
                / total
        };
        Averages {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        }
    }

    /// Metrics for `label`, if it's in the label set.
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_miss() {
        let report = score(&["a", "a", "a"], &["a", "b", "a"]).unwrap();
        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.labels, vec!["a", "b"]);
        assert_eq!(report.confusion, vec![vec![2, 1], vec![0, 0]]);

        let a = report.class("a").unwrap();
        assert_eq!(a.precision, 1.0);
        assert!((a.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((a.f1 - 0.8).abs() < 1e-12);

        let b = report.class("b").unwrap();
        assert_eq!((b.precision, b.recall, b.f1, b.support), (0.0, 0.0, 0.0, 0));
    }

    #[test]
    fn test_empty_input() {
        let empty: [&str; 0] = [];
        assert!(matches!(score(&empty, &empty), Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            score(&["a", "b"], &["a"]),
            Err(PipelineError::LengthMismatch { truth: 2, predicted: 1 })
        ));
    }

    #[test]
    fn test_perfect_predictions() {
        let labels = ["sport", "tech", "business", "tech"];
        let report = score(&labels, &labels).unwrap();
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.labels, vec!["business", "sport", "tech"]);
        let m = report.macro_avg();
        assert_eq!((m.precision, m.recall, m.f1), (1.0, 1.0, 1.0));
    }

    #[test]
    fn test_weighted_average_uses_support() {
        // x: 3 true, all right. y: 1 true, predicted x.
        let report = score(&["x", "x", "x", "y"], &["x", "x", "x", "x"]).unwrap();
        let w = report.weighted_avg();
        // recall: x = 1.0 (support 3), y = 0.0 (support 1)
        assert!((w.recall - 0.75).abs() < 1e-12);
        let m = report.macro_avg();
        assert!((m.recall - 0.5).abs() < 1e-12);
    }
}
