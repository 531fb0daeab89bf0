use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Mirrors tried in order when the raw CSV is not already on disk.
pub const DATASET_URLS: &[&str] = &[
    "https://github.com/susanli2016/PyCon-Canada-2019-NLP-Tutorial/raw/master/bbc-text.csv",
    "https://raw.githubusercontent.com/susanli2016/PyCon-Canada-2019-NLP-Tutorial/master/bbc-text.csv",
];

pub const DATASET_NAME: &str = "BBC News Dataset";

/// Which optimizer fits the logistic regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// Limited-memory BFGS (default)
    Lbfgs,
    /// Plain gradient descent with backtracking; slower than L-BFGS
    GradientDescent,
}

impl FromStr for Solver {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lbfgs" => Ok(Solver::Lbfgs),
            "gd" | "gradient-descent" => Ok(Solver::GradientDescent),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown solver '{other}' (expected 'lbfgs' or 'gd')"
            ))),
        }
    }
}

impl Solver {
    pub fn name(&self) -> &'static str {
        match self {
            Solver::Lbfgs => "lbfgs",
            Solver::GradientDescent => "gd",
        }
    }
}

/// Stratified train/test split settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Vocabulary and TF-IDF settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorizerConfig {
    /// Upper bound on vocabulary size, keeping the most frequent terms
    pub max_features: usize,
    /// Minimum number of training documents a term must appear in
    pub min_df: usize,
    /// Maximum fraction of training documents a term may appear in
    pub max_df: f64,
    /// Inclusive n-gram range, e.g. (1, 2) for unigrams and bigrams
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            min_df: 2,
            max_df: 0.8,
            ngram_range: (1, 2),
        }
    }
}

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    pub max_iter: usize,
    /// Inverse regularization strength (larger = weaker L2 penalty)
    pub c: f64,
    pub solver: Solver,
    /// Stop once the largest absolute gradient component falls below this
    pub tolerance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            c: 1.0,
            solver: Solver::Lbfgs,
            tolerance: 1e-4,
        }
    }
}

/// Where each stage reads and writes its artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        models_dir: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            models_dir: models_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn train_csv(&self) -> PathBuf {
        self.processed_dir().join("train_data.csv")
    }

    pub fn test_csv(&self) -> PathBuf {
        self.processed_dir().join("test_data.csv")
    }

    pub fn features_train(&self) -> PathBuf {
        self.processed_dir().join("features_train.json")
    }

    pub fn features_test(&self) -> PathBuf {
        self.processed_dir().join("features_test.json")
    }

    pub fn vectorizer(&self) -> PathBuf {
        self.models_dir.join("tfidf_vectorizer.json")
    }

    pub fn model(&self) -> PathBuf {
        self.models_dir.join("news_classifier.json")
    }

    pub fn metrics(&self) -> PathBuf {
        self.results_dir.join("metrics.txt")
    }

    /// Create every artifact directory if it doesn't exist yet.
    pub fn create_all(&self) -> Result<()> {
        for dir in [
            self.raw_dir(),
            self.processed_dir(),
            self.models_dir.clone(),
            self.results_dir.clone(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new("./data", "./models", "./results")
    }
}

/// Central configuration loaded from environment variables.
///
/// Immutable once loaded. Each stage receives only the slice it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub paths: ArtifactPaths,
    pub split: SplitConfig,
    pub vectorizer: VectorizerConfig,
    pub classifier: ClassifierConfig,
    pub dataset_urls: Vec<String>,
    pub dataset_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: ArtifactPaths::default(),
            split: SplitConfig::default(),
            vectorizer: VectorizerConfig::default(),
            classifier: ClassifierConfig::default(),
            dataset_urls: DATASET_URLS.iter().map(|u| u.to_string()).collect(),
            dataset_name: DATASET_NAME.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every option has a default; only unparsable or contradictory values fail.
    pub fn load() -> Result<Self> {
        let defaults = Config::default();

        let paths = ArtifactPaths::new(
            env::var("NEWSCLASS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.paths.data_dir),
            env::var("NEWSCLASS_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.paths.models_dir),
            env::var("NEWSCLASS_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.paths.results_dir),
        );

        let split = SplitConfig {
            test_fraction: env_or("NEWSCLASS_TEST_FRACTION", defaults.split.test_fraction)?,
            seed: env_or("NEWSCLASS_RANDOM_SEED", defaults.split.seed)?,
        };

        let ngram_range = match env::var("NEWSCLASS_NGRAM_RANGE") {
            Ok(raw) => parse_ngram_range(&raw)?,
            Err(_) => defaults.vectorizer.ngram_range,
        };

        let vectorizer = VectorizerConfig {
            max_features: env_or("NEWSCLASS_MAX_FEATURES", defaults.vectorizer.max_features)?,
            min_df: env_or("NEWSCLASS_MIN_DF", defaults.vectorizer.min_df)?,
            max_df: env_or("NEWSCLASS_MAX_DF", defaults.vectorizer.max_df)?,
            ngram_range,
        };

        let classifier = ClassifierConfig {
            max_iter: env_or("NEWSCLASS_MAX_ITER", defaults.classifier.max_iter)?,
            c: env_or("NEWSCLASS_C", defaults.classifier.c)?,
            solver: env_or("NEWSCLASS_SOLVER", defaults.classifier.solver)?,
            tolerance: defaults.classifier.tolerance,
        };

        let config = Self {
            paths,
            split,
            vectorizer,
            classifier,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that individual parsers can't see.
    pub fn validate(&self) -> Result<()> {
        let f = self.split.test_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "NEWSCLASS_TEST_FRACTION must be strictly between 0 and 1, got {f}"
            )));
        }
        let v = &self.vectorizer;
        if !(v.max_df > 0.0 && v.max_df <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "NEWSCLASS_MAX_DF must be in (0, 1], got {}",
                v.max_df
            )));
        }
        if v.max_features == 0 {
            return Err(PipelineError::InvalidConfig(
                "NEWSCLASS_MAX_FEATURES must be at least 1".to_string(),
            ));
        }
        let (lo, hi) = v.ngram_range;
        if lo == 0 || lo > hi {
            return Err(PipelineError::InvalidConfig(format!(
                "NEWSCLASS_NGRAM_RANGE must satisfy 1 <= min <= max, got {lo},{hi}"
            )));
        }
        if !(self.classifier.c > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "NEWSCLASS_C must be positive, got {}",
                self.classifier.c
            )));
        }
        if self.classifier.max_iter == 0 {
            return Err(PipelineError::InvalidConfig(
                "NEWSCLASS_MAX_ITER must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read `key` from the environment, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            PipelineError::InvalidConfig(format!("{key}='{raw}' could not be parsed: {e}"))
        }),
        Err(_) => Ok(default),
    }
}

/// Parse "1,2" (or "1-2", or a single "1") into an inclusive n-gram range.
pub fn parse_ngram_range(raw: &str) -> Result<(usize, usize)> {
    let parts: Vec<&str> = raw
        .split([',', '-'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let parse = |p: &str| {
        p.parse::<usize>().map_err(|e| {
            PipelineError::InvalidConfig(format!("NEWSCLASS_NGRAM_RANGE='{raw}': {e}"))
        })
    };
    match parts.as_slice() {
        [single] => {
            let n = parse(single)?;
            Ok((n, n))
        }
        [lo, hi] => Ok((parse(lo)?, parse(hi)?)),
        _ => Err(PipelineError::InvalidConfig(format!(
            "NEWSCLASS_NGRAM_RANGE='{raw}' should look like '1,2'"
        ))),
    }
}
