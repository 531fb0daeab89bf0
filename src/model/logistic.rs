// Multinomial logistic regression on sparse TF-IDF features.
//
// Minimizes the mean softmax cross-entropy plus an L2 penalty of
// ||W||² / (2·C·n). The intercepts are not penalized. Weights start at zero
// and both solvers are deterministic, so refitting the same data reproduces
// the same model.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::optim::{self, SolverParams};
use super::traits::{Classifier, Predictor};
use crate::config::{ClassifierConfig, Solver};
use crate::error::{PipelineError, Result};
use crate::features::{SparseMatrix, SparseRow};

/// Logistic regression hyperparameters.
pub struct LogisticRegression {
    config: ClassifierConfig,
    show_progress: bool,
}

impl LogisticRegression {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            show_progress: false,
        }
    }

    /// Draw a progress bar over solver iterations.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// Fitted multinomial logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    classes: Vec<String>,
    n_features: usize,
    /// Row-major, `classes.len()` rows of `n_features` weights
    weights: Vec<f64>,
    intercepts: Vec<f64>,
    pub solver: String,
    pub iterations: usize,
    pub converged: bool,
}

impl Classifier for LogisticRegression {
    type Model = LogisticModel;

    fn name(&self) -> &'static str {
        "LogisticRegression"
    }

    fn fit(&self, features: &SparseMatrix, labels: &[String]) -> Result<LogisticModel> {
        let n = features.n_rows();
        if n == 0 {
            return Err(PipelineError::Training(
                "cannot fit on an empty feature matrix".to_string(),
            ));
        }
        if labels.len() != n {
            return Err(PipelineError::Training(format!(
                "{n} feature rows but {} labels",
                labels.len()
            )));
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(PipelineError::Training(format!(
                "need at least 2 classes, found {}",
                classes.len()
            )));
        }

        let targets: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default())
            .collect();

        let k = classes.len();
        let d = features.n_cols();
        let params = SolverParams {
            max_iter: self.config.max_iter,
            tolerance: self.config.tolerance,
            ..SolverParams::default()
        };

        let pb = if self.show_progress {
            let pb = ProgressBar::new(params.max_iter as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] iter {pos} (max {len}) loss {msg}")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            Some(pb)
        } else {
            None
        };
        let on_iter = |iter: usize, loss: f64| {
            if let Some(ref pb) = pb {
                pb.set_position(iter as u64);
                pb.set_message(format!("{loss:.5}"));
            }
        };

        let objective = |theta: &[f64], grad: &mut [f64]| {
            softmax_loss(features, &targets, k, theta, grad, self.config.c)
        };

        let x0 = vec![0.0; k * d + k];
        let minimum = match self.config.solver {
            Solver::Lbfgs => optim::lbfgs(x0, &params, objective, on_iter),
            Solver::GradientDescent => optim::gradient_descent(x0, &params, objective, on_iter),
        };

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        if minimum.converged {
            info!(
                iterations = minimum.iterations,
                loss = minimum.value,
                solver = self.config.solver.name(),
                "Logistic regression converged"
            );
        } else {
            warn!(
                iterations = minimum.iterations,
                loss = minimum.value,
                "Logistic regression stopped before converging; consider raising NEWSCLASS_MAX_ITER"
            );
        }

        let mut theta = minimum.x;
        let intercepts = theta.split_off(k * d);

        Ok(LogisticModel {
            classes,
            n_features: d,
            weights: theta,
            intercepts,
            solver: self.config.solver.name().to_string(),
            iterations: minimum.iterations,
            converged: minimum.converged,
        })
    }
}

impl LogisticModel {
    /// Weight vector for class `k`.
    pub fn class_weights(&self, k: usize) -> &[f64] {
        &self.weights[k * self.n_features..(k + 1) * self.n_features]
    }

    pub fn intercepts(&self) -> &[f64] {
        &self.intercepts
    }

    fn scores(&self, row: SparseRow<'_>) -> Vec<f64> {
        (0..self.classes.len())
            .map(|k| row.dot(self.class_weights(k)) + self.intercepts[k])
            .collect()
    }
}

impl Predictor for LogisticModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &SparseMatrix) -> Result<Vec<Vec<f64>>> {
        if features.n_cols() != self.n_features {
            return Err(PipelineError::FeatureMismatch {
                stage: "predict",
                expected: self.n_features,
                found: features.n_cols(),
            });
        }
        Ok(features
            .rows()
            .map(|row| {
                let mut z = self.scores(row);
                softmax_in_place(&mut z);
                z
            })
            .collect())
    }
}

/// Mean cross-entropy + L2 penalty, writing the gradient into `grad`.
///
/// `theta` holds k·d weights (class-major) followed by k intercepts.
fn softmax_loss(
    x: &SparseMatrix,
    targets: &[usize],
    k: usize,
    theta: &[f64],
    grad: &mut [f64],
    c: f64,
) -> f64 {
    let d = x.n_cols();
    let n = x.n_rows() as f64;
    let (weights, intercepts) = theta.split_at(k * d);
    grad.iter_mut().for_each(|g| *g = 0.0);

    let mut loss = 0.0;
    let mut z = vec![0.0; k];
    for (row, &y) in x.rows().zip(targets) {
        for (class, zc) in z.iter_mut().enumerate() {
            *zc = row.dot(&weights[class * d..(class + 1) * d]) + intercepts[class];
        }
        let lse = log_sum_exp(&z);
        loss += lse - z[y];

        for (class, &zc) in z.iter().enumerate() {
            let indicator = if class == y { 1.0 } else { 0.0 };
            let diff = (zc - lse).exp() - indicator;
            let offset = class * d;
            for (j, v) in row.iter() {
                grad[offset + j] += diff * v;
            }
            grad[k * d + class] += diff;
        }
    }

    loss /= n;
    grad.iter_mut().for_each(|g| *g /= n);

    let penalty = 1.0 / (c * n);
    let mut sq = 0.0;
    for (g, w) in grad[..k * d].iter_mut().zip(weights) {
        *g += penalty * w;
        sq += w * w;
    }
    loss + 0.5 * penalty * sq
}

fn log_sum_exp(z: &[f64]) -> f64 {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max + z.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn softmax_in_place(z: &mut [f64]) {
    let lse = log_sum_exp(z);
    for v in z.iter_mut() {
        *v = (*v - lse).exp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    /// Three classes, each owning one feature column.
    fn separable() -> (SparseMatrix, Vec<String>) {
        let mut x = SparseMatrix::new(3);
        let mut y = Vec::new();
        for (col, label) in [(0, "business"), (1, "sport"), (2, "tech")] {
            for _ in 0..4 {
                x.push_row(&[(col, 1.0)]);
                y.push(label.to_string());
            }
        }
        (x, y)
    }

    #[test]
    fn test_fits_separable_data() {
        let (x, y) = separable();
        let model = LogisticRegression::default().fit(&x, &y).unwrap();
        assert!(model.converged);
        assert_eq!(model.classes(), &["business", "sport", "tech"]);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_gradient_descent_agrees() {
        let (x, y) = separable();
        let config = ClassifierConfig {
            solver: Solver::GradientDescent,
            ..ClassifierConfig::default()
        };
        let model = LogisticRegression::new(config).fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = separable();
        let model = LogisticRegression::default().fit(&x, &y).unwrap();
        for probs in model.predict_proba(&x).unwrap() {
            assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let (x, y) = separable();
        let targets: Vec<usize> = y
            .iter()
            .map(|l| match l.as_str() {
                "business" => 0,
                "sport" => 1,
                _ => 2,
            })
            .collect();
        let theta: Vec<f64> = (0..12).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut grad = vec![0.0; 12];
        softmax_loss(&x, &targets, 3, &theta, &mut grad, 0.7);

        let h = 1e-6;
        let mut scratch = vec![0.0; 12];
        for i in 0..12 {
            let mut plus = theta.clone();
            plus[i] += h;
            let mut minus = theta.clone();
            minus[i] -= h;
            let numeric = (softmax_loss(&x, &targets, 3, &plus, &mut scratch, 0.7)
                - softmax_loss(&x, &targets, 3, &minus, &mut scratch, 0.7))
                / (2.0 * h);
            assert!(
                (numeric - grad[i]).abs() < 1e-6,
                "grad[{i}]: analytic {} vs numeric {numeric}",
                grad[i]
            );
        }
    }

    #[test]
    fn test_rejects_single_class() {
        let mut x = SparseMatrix::new(1);
        x.push_row(&[(0, 1.0)]);
        x.push_row(&[(0, 0.5)]);
        let err = LogisticRegression::default()
            .fit(&x, &labels(&["tech", "tech"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Training(_)));
    }

    #[test]
    fn test_rejects_wrong_width_at_predict() {
        let (x, y) = separable();
        let model = LogisticRegression::default().fit(&x, &y).unwrap();
        let narrow = SparseMatrix::new(2);
        assert!(matches!(
            model.predict(&narrow),
            Err(PipelineError::FeatureMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_model_json_roundtrip() {
        let (x, y) = separable();
        let model = LogisticRegression::default().fit(&x, &y).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: LogisticModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.predict(&x).unwrap(), y);
    }
}
