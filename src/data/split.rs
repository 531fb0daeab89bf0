// Stratified train/test split.
//
// Each category is shuffled independently with a seeded ChaCha8 stream and
// roughly `test_fraction` of it goes to the test set. Categories are visited in
// sorted order, so the same seed and input always produce the same partition.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::corpus::Record;
use crate::config::SplitConfig;
use crate::error::{PipelineError, Result};

/// Splits a corpus into stratified training and test sets.
pub struct CorpusSplitter {
    config: SplitConfig,
}

impl CorpusSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Partition `corpus` into (train, test).
    ///
    /// Fails if any category has fewer than two records, since it then can't
    /// appear on both sides.
    pub fn split(&self, corpus: &[Record]) -> Result<(Vec<Record>, Vec<Record>)> {
        let (train_idx, test_idx) =
            stratified_indices(corpus, self.config.test_fraction, self.config.seed)?;

        let train: Vec<Record> = train_idx.iter().map(|&i| corpus[i].clone()).collect();
        let test: Vec<Record> = test_idx.iter().map(|&i| corpus[i].clone()).collect();

        info!(
            train = train.len(),
            test = test.len(),
            seed = self.config.seed,
            "Stratified split complete"
        );
        Ok((train, test))
    }
}

/// Number of a category's `count` records that go to the test set.
///
/// Rounded to nearest, then clamped so both sides get at least one.
pub fn test_count(count: usize, test_fraction: f64) -> usize {
    let raw = (count as f64 * test_fraction).round() as usize;
    raw.clamp(1, count.saturating_sub(1).max(1))
}

/// Compute stratified (train, test) index lists into `corpus`.
pub fn stratified_indices(
    corpus: &[Record],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test fraction must be strictly between 0 and 1, got {test_fraction}"
        )));
    }

    let mut by_category: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, record) in corpus.iter().enumerate() {
        by_category.entry(record.category.as_str()).or_default().push(i);
    }

    if let Some((category, indices)) = by_category.iter().find(|(_, idx)| idx.len() < 2) {
        return Err(PipelineError::InsufficientCategorySamples {
            category: category.to_string(),
            count: indices.len(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for indices in by_category.values_mut() {
        indices.shuffle(&mut rng);
        let n_test = test_count(indices.len(), test_fraction);
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    // Interleave categories so neither side is grouped by label
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(per_category: &[(&str, usize)]) -> Vec<Record> {
        let mut records = Vec::new();
        for (category, n) in per_category {
            for i in 0..*n {
                records.push(Record {
                    text: format!("{category} article number {i}"),
                    category: category.to_string(),
                    cleaned_text: format!("{category} article number"),
                });
            }
        }
        records
    }

    #[test]
    fn test_test_count_rounding_and_clamping() {
        assert_eq!(test_count(10, 0.2), 2);
        assert_eq!(test_count(2, 0.2), 1);
        assert_eq!(test_count(2, 0.9), 1);
        assert_eq!(test_count(7, 0.5), 4);
    }

    #[test]
    fn test_stratified_proportions() {
        let records = corpus(&[("business", 50), ("sport", 30), ("tech", 20)]);
        let (train, test) = CorpusSplitter::new(SplitConfig::default())
            .split(&records)
            .unwrap();
        assert_eq!(train.len() + test.len(), records.len());
        let count = |set: &[Record], c: &str| set.iter().filter(|r| r.category == c).count();
        assert_eq!(count(&test, "business"), 10);
        assert_eq!(count(&test, "sport"), 6);
        assert_eq!(count(&test, "tech"), 4);
    }

    #[test]
    fn test_rejects_singleton_category() {
        let records = corpus(&[("business", 5), ("entertainment", 1)]);
        let err = CorpusSplitter::new(SplitConfig::default())
            .split(&records)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientCategorySamples { ref category, count: 1 }
                if category == "entertainment"
        ));
    }
}
