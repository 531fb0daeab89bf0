// Classifier traits: the seam between the pipeline and a model backend.
//
// The pipeline only needs "fit on a feature matrix and labels, then predict
// labels for another matrix". Logistic regression is the default backend;
// anything else that fits these two traits can replace it without touching the
// feature or evaluation stages.

use crate::error::Result;
use crate::features::SparseMatrix;

/// Hyperparameters that know how to fit a model.
pub trait Classifier {
    type Model: Predictor;

    /// Human-readable model type, used in report headers.
    fn name(&self) -> &'static str;

    /// Fit a model on `features` (one row per document) and their labels.
    fn fit(&self, features: &SparseMatrix, labels: &[String]) -> Result<Self::Model>;
}

/// A fitted model that maps feature rows to labels.
pub trait Predictor {
    /// Class labels in the model's internal (sorted) order.
    fn classes(&self) -> &[String];

    /// Feature-matrix width the model was fitted on.
    fn n_features(&self) -> usize;

    /// Class probabilities per row, columns ordered like `classes()`.
    fn predict_proba(&self, features: &SparseMatrix) -> Result<Vec<Vec<f64>>>;

    /// Most likely label per row, in row order.
    fn predict(&self, features: &SparseMatrix) -> Result<Vec<String>> {
        let classes = self.classes();
        Ok(self
            .predict_proba(features)?
            .iter()
            .map(|probs| classes[argmax(probs)].clone())
            .collect())
    }
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.2, 0.5, 0.3]), 1);
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[1.0]), 0);
    }
}
