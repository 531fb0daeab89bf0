// Staged pipeline: preprocess -> features -> train -> evaluate, plus predict.

pub mod artifacts;
pub mod stages;

pub use artifacts::LabeledFeatures;
pub use stages::{
    engineer_features, evaluate, predict, preprocess, train, Evaluation, FeatureSummary,
    Prediction, PreprocessSummary, TrainSummary,
};
