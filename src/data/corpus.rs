// Labeled corpus loading.
//
// Reads the raw CSV, resolves the `label` alias for `category`, drops rows with
// missing fields, deduplicates by exact text, and attaches the normalized text.
// Documents that normalize to nothing are dropped as well, so every record
// leaving this module has something for the vectorizer to count.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::text::normalize;

/// One labeled article, with its normalized text alongside the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
    pub category: String,
    pub cleaned_text: String,
}

impl Record {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        let text = text.into();
        let cleaned_text = normalize(&text);
        Self {
            text,
            category: category.into(),
            cleaned_text,
        }
    }
}

/// What happened while loading, for the preprocessing summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub missing: usize,
    pub duplicates: usize,
    pub empty_after_cleaning: usize,
}

/// The cleaned, deduplicated corpus in file order.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub records: Vec<Record>,
    pub stats: LoadStats,
}

impl Corpus {
    /// Build a corpus from in-memory (text, category) pairs, applying the same
    /// filtering as `load_records`.
    pub fn from_pairs<I, T, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        let mut stats = LoadStats::default();
        let mut builder = CorpusBuilder::default();
        for (text, category) in pairs {
            stats.rows_read += 1;
            builder.push(Some(text.into()), Some(category.into()), &mut stats);
        }
        Corpus {
            records: builder.records,
            stats,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record count per category, sorted by category name.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        category_counts(&self.records)
    }
}

/// Count records per category, sorted by category name.
pub fn category_counts(records: &[Record]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.category.clone()).or_insert(0) += 1;
    }
    counts
}

#[derive(Default)]
struct CorpusBuilder {
    seen: HashSet<String>,
    records: Vec<Record>,
}

impl CorpusBuilder {
    fn push(&mut self, text: Option<String>, category: Option<String>, stats: &mut LoadStats) {
        let (text, category) = match (text, category) {
            (Some(t), Some(c)) if !t.trim().is_empty() && !c.trim().is_empty() => (t, c),
            _ => {
                stats.missing += 1;
                return;
            }
        };
        if !self.seen.insert(text.clone()) {
            stats.duplicates += 1;
            return;
        }
        let record = Record::new(text, category.trim());
        if record.cleaned_text.is_empty() {
            stats.empty_after_cleaning += 1;
            return;
        }
        self.records.push(record);
    }
}

/// Load and clean the raw labeled CSV.
///
/// Requires a `text` column and a `category` column; `label` is accepted in
/// place of `category`.
pub fn load_records(path: &Path) -> Result<Corpus> {
    info!(path = %path.display(), "Loading dataset");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::DatasetUnavailable {
            target: path.to_path_buf(),
            reason: format!("could not open {}: {e}", path.display()),
        })?;

    let malformed = |e: csv::Error| PipelineError::DatasetUnavailable {
        target: path.to_path_buf(),
        reason: format!("{} is not a readable CSV: {e}", path.display()),
    };

    let headers = reader.headers().map_err(malformed)?.clone();
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);

    let found = || headers.iter().collect::<Vec<_>>().join(", ");
    let text_idx = find("text").ok_or_else(|| PipelineError::Schema {
        path: path.display().to_string(),
        column: "text".to_string(),
        found: found(),
    })?;
    let category_idx = find("category")
        .or_else(|| find("label"))
        .ok_or_else(|| PipelineError::Schema {
            path: path.display().to_string(),
            column: "category".to_string(),
            found: found(),
        })?;

    let mut stats = LoadStats::default();
    let mut builder = CorpusBuilder::default();
    for row in reader.records() {
        let row = row.map_err(malformed)?;
        stats.rows_read += 1;
        builder.push(
            row.get(text_idx).map(str::to_string),
            row.get(category_idx).map(str::to_string),
            &mut stats,
        );
    }

    debug!(?stats, "Corpus load stats");
    info!(
        articles = builder.records.len(),
        rows = stats.rows_read,
        "Loaded dataset"
    );

    Ok(Corpus {
        records: builder.records,
        stats,
    })
}

/// Write a processed split (text, category, cleaned_text) to CSV.
pub fn write_split(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a processed split written by `write_split`.
pub fn read_split(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
