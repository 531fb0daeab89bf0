// TF-IDF vectorization over an n-gram vocabulary.
//
// `fit` sees only training documents and produces a frozen Vocabulary.
// `transform` maps any documents onto that vocabulary: raw term counts times
// the training IDF, then each row scaled to unit L2 norm. Terms the vocabulary
// doesn't know are skipped, so test documents can never add columns or shift
// weights.

use std::collections::HashMap;

use tracing::{debug, info};

use super::matrix::SparseMatrix;
use super::vocabulary::Vocabulary;
use crate::config::VectorizerConfig;
use crate::error::{PipelineError, Result};

/// Learns a vocabulary from training text and vectorizes documents against it.
pub struct TfIdfVectorizer {
    config: VectorizerConfig,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(VectorizerConfig::default())
    }
}

/// Per-term statistics gathered while fitting.
#[derive(Default, Clone, Copy)]
struct TermStats {
    document_frequency: usize,
    total_count: usize,
}

impl TfIdfVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        Self { config }
    }

    /// Build the vocabulary from training documents.
    ///
    /// Terms whose document frequency falls outside [min_df, max_df * N] are
    /// dropped. Survivors are ranked by total count (descending, ties broken
    /// alphabetically), truncated to `max_features`, and indexed in that order.
    pub fn fit<S: AsRef<str>>(&self, docs: &[S]) -> Result<Vocabulary> {
        let n_docs = docs.len();
        let empty = || PipelineError::EmptyVocabulary {
            documents: n_docs,
            min_df: self.config.min_df,
            max_df: self.config.max_df,
        };
        if n_docs == 0 {
            return Err(empty());
        }

        let max_doc_count = self.config.max_df * n_docs as f64;
        // No term can satisfy both bounds
        if max_doc_count < self.config.min_df as f64 {
            return Err(empty());
        }

        let mut stats: HashMap<String, TermStats> = HashMap::new();
        for doc in docs {
            for (term, count) in count_terms(doc.as_ref(), self.config.ngram_range) {
                let entry = stats.entry(term).or_default();
                entry.document_frequency += 1;
                entry.total_count += count;
            }
        }
        let candidates = stats.len();

        let mut ranked: Vec<(String, TermStats)> = stats
            .into_iter()
            .filter(|(_, s)| {
                s.document_frequency >= self.config.min_df
                    && s.document_frequency as f64 <= max_doc_count
            })
            .collect();
        let in_range = ranked.len();

        ranked.sort_by(|(a_term, a), (b_term, b)| {
            b.total_count
                .cmp(&a.total_count)
                .then_with(|| a_term.cmp(b_term))
        });
        ranked.truncate(self.config.max_features);

        if ranked.is_empty() {
            return Err(empty());
        }

        debug!(candidates, in_range, "Document frequency filter applied");
        info!(
            documents = n_docs,
            vocabulary = ranked.len(),
            "Vocabulary fitted"
        );

        Ok(Vocabulary::new(
            ranked
                .into_iter()
                .map(|(term, s)| (term, s.document_frequency))
                .collect(),
            n_docs,
            self.config.ngram_range,
        ))
    }

    /// Fit on `docs` and transform them in one go.
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> Result<(Vocabulary, SparseMatrix)> {
        let vocab = self.fit(docs)?;
        let matrix = transform(docs, &vocab);
        Ok((vocab, matrix))
    }
}

/// Vectorize `docs` against a fitted vocabulary. Row `i` is `docs[i]`.
pub fn transform<S: AsRef<str>>(docs: &[S], vocab: &Vocabulary) -> SparseMatrix {
    let mut matrix = SparseMatrix::new(vocab.len());
    for doc in docs {
        matrix.push_row(&transform_one(doc.as_ref(), vocab));
    }
    matrix
}

/// TF-IDF entries for a single document, sorted by column and L2-normalized.
pub fn transform_one(doc: &str, vocab: &Vocabulary) -> Vec<(usize, f64)> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for_each_ngram(doc, vocab.ngram_range(), |term| {
        if let Some(idx) = vocab.get(term) {
            *counts.entry(idx).or_insert(0) += 1;
        }
    });

    let mut entries: Vec<(usize, f64)> = counts
        .into_iter()
        .map(|(idx, tf)| (idx, tf as f64 * vocab.idf(idx)))
        .collect();
    entries.sort_by_key(|&(idx, _)| idx);

    let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut entries {
            *w /= norm;
        }
    }
    entries
}

/// Split a document into lowercase alphanumeric tokens of two or more characters.
pub fn tokenize(doc: &str) -> Vec<String> {
    doc.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// Count every n-gram in `doc` for n in the inclusive `ngram_range`.
pub fn count_terms(doc: &str, ngram_range: (usize, usize)) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for_each_ngram(doc, ngram_range, |term| {
        *counts.entry(term.to_string()).or_insert(0) += 1;
    });
    counts
}

fn for_each_ngram(doc: &str, (lo, hi): (usize, usize), mut f: impl FnMut(&str)) {
    let tokens = tokenize(doc);
    for n in lo..=hi {
        if n == 0 || n > tokens.len() {
            continue;
        }
        for window in tokens.windows(n) {
            if n == 1 {
                f(&window[0]);
            } else {
                f(&window.join(" "));
            }
        }
    }
}
