// On-disk artifacts passed between stages.
//
// Everything except the split CSVs is JSON. A stage that can't find its input
// reports which command produces it instead of a bare "file not found".

use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::corpus::{self, Record};
use crate::error::{PipelineError, Result};
use crate::features::SparseMatrix;

/// A feature matrix and the category of each row, in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFeatures {
    pub matrix: SparseMatrix,
    pub labels: Vec<String>,
}

impl LabeledFeatures {
    pub fn new(matrix: SparseMatrix, labels: Vec<String>) -> Self {
        Self { matrix, labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.matrix.n_rows(), self.matrix.n_cols())
    }
}

/// Fail with `MissingArtifact` unless `path` exists.
pub fn require(path: &Path, stage: &'static str, hint: &'static str) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingArtifact {
            stage,
            path: path.to_path_buf(),
            hint,
        })
    }
}

/// Serialize `value` to `path`, creating the parent directory if needed.
pub fn save_json<T: Serialize>(path: &Path, stage: &'static str, value: &T) -> Result<()> {
    let write = || -> std::result::Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    };
    write().map_err(|e| write_failed(path, stage, e))?;
    debug!(path = %path.display(), "Artifact written");
    Ok(())
}

/// Read a JSON artifact produced by an earlier stage.
pub fn load_json<T: DeserializeOwned>(
    path: &Path,
    stage: &'static str,
    hint: &'static str,
) -> Result<T> {
    require(path, stage, hint)?;
    let read = || -> std::result::Result<T, Box<dyn std::error::Error>> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    };
    read().map_err(|e| corrupt(path, stage, hint, e))
}

/// Write a processed split CSV.
pub fn save_split(path: &Path, stage: &'static str, records: &[Record]) -> Result<()> {
    corpus::write_split(path, records).map_err(|e| write_failed(path, stage, e))
}

/// Read a processed split CSV produced by an earlier stage.
pub fn load_split(path: &Path, stage: &'static str, hint: &'static str) -> Result<Vec<Record>> {
    require(path, stage, hint)?;
    corpus::read_split(path).map_err(|e| corrupt(path, stage, hint, e))
}

/// Wrap a low-level write failure with the stage that hit it.
pub fn write_failed(path: &Path, stage: &'static str, err: impl Display) -> PipelineError {
    PipelineError::ArtifactWrite {
        stage,
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn corrupt(path: &Path, stage: &'static str, hint: &'static str, err: impl Display) -> PipelineError {
    PipelineError::CorruptArtifact {
        stage,
        path: path.to_path_buf(),
        reason: err.to_string(),
        hint,
    }
}
