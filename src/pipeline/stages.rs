// The four pipeline stages plus single-article prediction.
//
// Each stage reads only what earlier stages persisted and writes its own
// outputs before returning, so any stage can be re-run on its own:
// 1. preprocess: raw CSV -> cleaned, deduplicated, stratified train/test CSVs
// 2. features: split CSVs -> frozen vocabulary + TF-IDF matrices
// 3. train: training matrix -> fitted classifier
// 4. evaluate: classifier + test matrix -> metrics report on disk

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::artifacts::{
    load_json, load_split, require, save_json, save_split, write_failed, LabeledFeatures,
};
use crate::config::{ArtifactPaths, SplitConfig, VectorizerConfig};
use crate::data::corpus::{self, LoadStats};
use crate::data::split::CorpusSplitter;
use crate::error::{PipelineError, Result};
use crate::evaluation::report::{self, ReportHeader};
use crate::evaluation::{score, MetricsReport};
use crate::features::tfidf::{self, TfIdfVectorizer};
use crate::features::{SparseMatrix, Vocabulary};
use crate::model::{Classifier, Predictor};
use crate::text::normalize;

/// What preprocessing kept and where it went.
#[derive(Debug, Clone)]
pub struct PreprocessSummary {
    pub stats: LoadStats,
    /// Records that survived cleaning
    pub total: usize,
    pub categories: BTreeMap<String, usize>,
    pub train: usize,
    pub test: usize,
    /// Mean whitespace-separated word count of the normalized text
    pub avg_words: f64,
}

/// Shape of the feature stage's outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSummary {
    pub vocabulary: usize,
    pub train_shape: (usize, usize),
    pub test_shape: (usize, usize),
    /// A handful of vocabulary entries, highest-ranked first
    pub sample_terms: Vec<String>,
}

/// Outcome of fitting the classifier.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub model: &'static str,
    pub samples: usize,
    pub features: usize,
    pub classes: Vec<String>,
    pub train_accuracy: f64,
    pub elapsed: Duration,
}

/// Held-out metrics and the report file they were written to.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: MetricsReport,
    pub rendered: String,
    pub path: PathBuf,
}

/// Classification of a single article.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Every class with its probability, most likely first
    pub probabilities: Vec<(String, f64)>,
    /// The normalized text the vectorizer saw
    pub cleaned: String,
}

/// Load, clean and split the raw dataset, writing the train/test CSVs.
pub fn preprocess(
    raw_csv: &Path,
    paths: &ArtifactPaths,
    split: &SplitConfig,
) -> Result<PreprocessSummary> {
    require(raw_csv, "preprocess", "download")?;
    let corpus = corpus::load_records(raw_csv)?;
    let categories = corpus.category_counts();
    for (category, count) in &categories {
        info!(category = %category, count, "Category distribution");
    }

    let total_words: usize = corpus
        .records
        .iter()
        .map(|r| r.cleaned_text.split_whitespace().count())
        .sum();
    let avg_words = if corpus.is_empty() {
        0.0
    } else {
        total_words as f64 / corpus.len() as f64
    };

    let (train, test) = CorpusSplitter::new(*split).split(&corpus.records)?;
    save_split(&paths.train_csv(), "preprocess", &train)?;
    save_split(&paths.test_csv(), "preprocess", &test)?;
    info!(
        train = %paths.train_csv().display(),
        test = %paths.test_csv().display(),
        "Split written"
    );

    Ok(PreprocessSummary {
        stats: corpus.stats,
        total: corpus.records.len(),
        categories,
        train: train.len(),
        test: test.len(),
        avg_words,
    })
}

/// Fit the vocabulary on the training split only and vectorize both splits.
pub fn engineer_features(paths: &ArtifactPaths, config: &VectorizerConfig) -> Result<FeatureSummary> {
    let train = load_split(&paths.train_csv(), "features", "preprocess")?;
    let test = load_split(&paths.test_csv(), "features", "preprocess")?;

    let train_docs: Vec<&str> = train.iter().map(|r| r.cleaned_text.as_str()).collect();
    let test_docs: Vec<&str> = test.iter().map(|r| r.cleaned_text.as_str()).collect();

    let (vocab, train_matrix) = TfIdfVectorizer::new(*config).fit_transform(&train_docs)?;
    let test_matrix = tfidf::transform(&test_docs, &vocab);

    let train_features = LabeledFeatures::new(
        train_matrix,
        train.into_iter().map(|r| r.category).collect(),
    );
    let test_features =
        LabeledFeatures::new(test_matrix, test.into_iter().map(|r| r.category).collect());

    save_json(&paths.vectorizer(), "features", &vocab)?;
    save_json(&paths.features_train(), "features", &train_features)?;
    save_json(&paths.features_test(), "features", &test_features)?;

    info!(
        vocabulary = vocab.len(),
        train_nnz = train_features.matrix.nnz(),
        test_nnz = test_features.matrix.nnz(),
        "Features saved"
    );

    Ok(FeatureSummary {
        vocabulary: vocab.len(),
        train_shape: train_features.shape(),
        test_shape: test_features.shape(),
        sample_terms: vocab.terms().iter().take(10).cloned().collect(),
    })
}

/// Fit `classifier` on the training features and persist the model.
pub fn train<C>(paths: &ArtifactPaths, classifier: &C) -> Result<TrainSummary>
where
    C: Classifier,
    C::Model: Serialize,
{
    let features: LabeledFeatures = load_json(&paths.features_train(), "train", "features")?;
    let (samples, n_features) = features.shape();
    info!(model = classifier.name(), samples, features = n_features, "Training classifier");

    let started = Instant::now();
    let model = classifier.fit(&features.matrix, &features.labels)?;
    let elapsed = started.elapsed();

    let predicted = model.predict(&features.matrix)?;
    let train_accuracy = score(&features.labels, &predicted)?.accuracy;
    info!(
        train_accuracy,
        seconds = elapsed.as_secs_f64(),
        "Training complete"
    );

    save_json(&paths.model(), "train", &model)?;

    Ok(TrainSummary {
        model: classifier.name(),
        samples,
        features: n_features,
        classes: model.classes().to_vec(),
        train_accuracy,
        elapsed,
    })
}

/// Score the persisted model on the test features and write the report.
pub fn evaluate<M>(paths: &ArtifactPaths, model_name: &str, dataset: &str) -> Result<Evaluation>
where
    M: Predictor + DeserializeOwned,
{
    let model: M = load_json(&paths.model(), "evaluate", "train")?;
    let features: LabeledFeatures = load_json(&paths.features_test(), "evaluate", "features")?;
    check_width(&model, features.matrix.n_cols(), "evaluate")?;

    let predicted = model.predict(&features.matrix)?;
    let report = score(&features.labels, &predicted)?;

    let header = ReportHeader {
        model: model_name.to_string(),
        dataset: dataset.to_string(),
        generated_at: Some(Utc::now()),
    };
    let rendered = report::render(&report, &header);
    let path = paths.metrics();
    report::write_report(&path, &rendered).map_err(|e| write_failed(&path, "evaluate", e))?;
    info!(accuracy = report.accuracy, path = %path.display(), "Evaluation report written");

    Ok(Evaluation {
        report,
        rendered,
        path,
    })
}

/// Classify one raw article with the persisted vocabulary and model.
pub fn predict<M>(paths: &ArtifactPaths, text: &str) -> Result<Prediction>
where
    M: Predictor + DeserializeOwned,
{
    let vocab: Vocabulary = load_json(&paths.vectorizer(), "predict", "features")?;
    let model: M = load_json(&paths.model(), "predict", "train")?;
    check_width(&model, vocab.len(), "predict")?;

    let cleaned = normalize(text);
    let mut matrix = SparseMatrix::new(vocab.len());
    matrix.push_row(&tfidf::transform_one(&cleaned, &vocab));

    let probs = model
        .predict_proba(&matrix)?
        .into_iter()
        .next()
        .unwrap_or_default();
    let mut probabilities: Vec<(String, f64)> =
        model.classes().iter().cloned().zip(probs).collect();
    probabilities.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let label = probabilities
        .first()
        .map(|(label, _)| label.clone())
        .unwrap_or_default();

    Ok(Prediction {
        label,
        probabilities,
        cleaned,
    })
}

fn check_width<M: Predictor>(model: &M, found: usize, stage: &'static str) -> Result<()> {
    if model.n_features() == found {
        Ok(())
    } else {
        Err(PipelineError::FeatureMismatch {
            stage,
            expected: model.n_features(),
            found,
        })
    }
}
