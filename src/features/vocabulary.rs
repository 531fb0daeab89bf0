// Frozen term vocabulary.
//
// Terms are interned once at fit time: `terms[i]` is the term with index `i`
// and `index` is the reverse lookup. Training document frequencies and the
// training document count travel with the vocabulary, so IDF weights never
// depend on whatever documents are transformed later.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Dense term <-> index mapping plus the training statistics IDF needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredVocabulary")]
pub struct Vocabulary {
    terms: Vec<String>,
    document_frequency: Vec<usize>,
    n_documents: usize,
    ngram_range: (usize, usize),
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// On-disk shape; the lookup table is rebuilt on load.
#[derive(Deserialize)]
struct StoredVocabulary {
    terms: Vec<String>,
    document_frequency: Vec<usize>,
    n_documents: usize,
    ngram_range: (usize, usize),
}

impl From<StoredVocabulary> for Vocabulary {
    fn from(stored: StoredVocabulary) -> Self {
        Vocabulary::new(
            stored.terms.into_iter().zip(stored.document_frequency).collect(),
            stored.n_documents,
            stored.ngram_range,
        )
    }
}

impl Vocabulary {
    /// Build from (term, document frequency) pairs already in index order.
    pub fn new(
        ranked: Vec<(String, usize)>,
        n_documents: usize,
        ngram_range: (usize, usize),
    ) -> Self {
        let mut terms = Vec::with_capacity(ranked.len());
        let mut document_frequency = Vec::with_capacity(ranked.len());
        let mut index = HashMap::with_capacity(ranked.len());
        for (i, (term, df)) in ranked.into_iter().enumerate() {
            index.insert(term.clone(), i);
            terms.push(term);
            document_frequency.push(df);
        }
        Self {
            terms,
            document_frequency,
            n_documents,
            ngram_range,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Index of `term`, if it's in the vocabulary.
    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// Term stored at `index`.
    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    /// All terms in index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Training document frequency of the term at `index`.
    pub fn document_frequency(&self, index: usize) -> usize {
        self.document_frequency[index]
    }

    /// Number of documents the vocabulary was fit on.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    /// Smoothed inverse document frequency: ln((1 + N) / (1 + df)) + 1.
    pub fn idf(&self, index: usize) -> f64 {
        let n = self.n_documents as f64;
        let df = self.document_frequency[index] as f64;
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        Vocabulary::new(
            vec![
                ("market".to_string(), 3),
                ("shares".to_string(), 1),
                ("market shares".to_string(), 1),
            ],
            4,
            (1, 2),
        )
    }

    #[test]
    fn test_lookup_both_ways() {
        let vocab = sample();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.get("shares"), Some(1));
        assert_eq!(vocab.term(2), Some("market shares"));
        assert_eq!(vocab.get("film"), None);
        assert_eq!(vocab.term(3), None);
    }

    #[test]
    fn test_idf_formula() {
        let vocab = sample();
        let expected = (5.0f64 / 4.0).ln() + 1.0;
        assert!((vocab.idf(0) - expected).abs() < 1e-12);
        // Rarer terms weigh more
        assert!(vocab.idf(1) > vocab.idf(0));
    }

    #[test]
    fn test_json_roundtrip_rebuilds_index() {
        let vocab = sample();
        let json = serde_json::to_string(&vocab).unwrap();
        assert!(!json.contains("index"));
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
        assert_eq!(back.get("market shares"), Some(2));
    }
}
