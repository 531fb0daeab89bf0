// Classification: trait-based abstraction with a logistic regression backend.

pub mod logistic;
pub mod optim;
pub mod traits;

pub use logistic::{LogisticModel, LogisticRegression};
pub use traits::{Classifier, Predictor};
