// Pipeline error kinds.
//
// Every variant is terminal. The Display text names the stage that failed and
// tells the user what to do about it, so main can print it as-is and exit.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for library operations that fail with a typed pipeline error.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Every download source failed and no local copy exists.
    #[error(
        "[download] dataset unavailable: {reason}\n\
         Download it manually:\n  \
         Option 1: https://www.kaggle.com/datasets/yufengdev/bbc-fulltext-and-category\n  \
         Option 2: https://raw.githubusercontent.com/susanli2016/PyCon-Canada-2019-NLP-Tutorial/master/bbc-text.csv\n\
         Save it as {} and run again.",
        target.display()
    )]
    DatasetUnavailable { target: PathBuf, reason: String },

    /// Required columns are missing after alias resolution.
    #[error(
        "[preprocess] {path} is missing required column '{column}' (found: {found})\n\
         The CSV needs a 'text' column and a 'category' (or 'label') column."
    )]
    Schema {
        path: String,
        column: String,
        found: String,
    },

    /// Document-frequency filtering removed every candidate term.
    #[error(
        "[features] vocabulary is empty after filtering {documents} training documents \
         (min_df={min_df}, max_df={max_df})\n\
         Lower NEWSCLASS_MIN_DF or raise NEWSCLASS_MAX_DF."
    )]
    EmptyVocabulary {
        documents: usize,
        min_df: usize,
        max_df: f64,
    },

    /// A category is too small to appear in both the training and test sets.
    #[error(
        "[preprocess] category '{category}' has {count} record(s); at least 2 are needed \
         to place one in each split\n\
         Add more examples for it or remove it from the dataset."
    )]
    InsufficientCategorySamples { category: String, count: usize },

    /// Evaluation was asked to score zero records.
    #[error("[evaluate] no records to score\nRe-run `newsclass preprocess` with a non-empty dataset.")]
    EmptyInput,

    /// True and predicted label sequences differ in length.
    #[error("[evaluate] {truth} true labels but {predicted} predictions\nRe-run `newsclass features` and `newsclass train`.")]
    LengthMismatch { truth: usize, predicted: usize },

    /// A configuration value is unparsable or contradicts another one.
    #[error("[config] {0}\nFix the value in your environment or .env file.")]
    InvalidConfig(String),

    /// A stage input produced by an earlier stage is absent.
    #[error("[{stage}] missing artifact {}\nRun `newsclass {hint}` first.", path.display())]
    MissingArtifact {
        stage: &'static str,
        path: PathBuf,
        hint: &'static str,
    },

    /// The classifier was handed inputs it cannot train on.
    #[error("[train] {0}\nCheck the feature artifacts or re-run `newsclass features`.")]
    Training(String),

    /// A feature matrix doesn't match the width the model was trained on.
    #[error(
        "[{stage}] feature matrix has {found} columns but the model expects {expected}\n\
         Re-run `newsclass features` and `newsclass train` so both use the same vocabulary."
    )]
    FeatureMismatch {
        stage: &'static str,
        expected: usize,
        found: usize,
    },

    /// An artifact exists but can't be read back.
    #[error(
        "[{stage}] could not read {}: {reason}\n\
         The file is unreadable or corrupt. Re-run `newsclass {hint}` to regenerate it.",
        path.display()
    )]
    CorruptArtifact {
        stage: &'static str,
        path: PathBuf,
        reason: String,
        hint: &'static str,
    },

    /// A stage couldn't write its output.
    #[error(
        "[{stage}] could not write {}: {reason}\n\
         Check that the directory is writable and the disk is not full.",
        path.display()
    )]
    ArtifactWrite {
        stage: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_stage_and_action() {
        let err = PipelineError::EmptyVocabulary {
            documents: 3,
            min_df: 5,
            max_df: 0.8,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[features]"));
        assert!(msg.contains("NEWSCLASS_MIN_DF"));

        let err = PipelineError::DatasetUnavailable {
            target: PathBuf::from("data/raw/bbc-text.csv"),
            reason: "all 2 sources failed".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[download]"));
        assert!(msg.contains("data/raw/bbc-text.csv"));
    }

    #[test]
    fn test_missing_artifact_points_at_command() {
        let err = PipelineError::MissingArtifact {
            stage: "train",
            path: PathBuf::from("data/processed/features_train.json"),
            hint: "features",
        };
        assert!(err.to_string().contains("newsclass features"));
    }

    #[test]
    fn test_corrupt_artifact_names_stage_and_producer() {
        let err = PipelineError::CorruptArtifact {
            stage: "evaluate",
            path: PathBuf::from("models/news_classifier.json"),
            reason: "EOF while parsing".to_string(),
            hint: "train",
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[evaluate] could not read models/news_classifier.json"));
        assert!(msg.contains("Re-run `newsclass train`"));
    }
}
