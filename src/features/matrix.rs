// Compressed sparse row matrix for TF-IDF features.
//
// Rows are appended in document order and never reordered. Column indices
// inside a row are strictly increasing.

use serde::{Deserialize, Serialize};

/// Row-major sparse matrix of f64 values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_cols: usize,
    /// Row `i` occupies `indices[indptr[i]..indptr[i + 1]]`
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

/// Borrowed view of one matrix row.
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f64],
}

impl<'a> SparseRow<'a> {
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Euclidean norm of the row.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Value at column `col`, or 0.0 if it's not stored.
    pub fn get(&self, col: usize) -> f64 {
        match self.indices.binary_search(&col) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with a dense vector of length `n_cols`.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter().map(|(j, v)| v * dense[j]).sum()
    }
}

impl SparseMatrix {
    /// An empty matrix with `n_cols` columns and no rows.
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            indptr: vec![0],
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append a row. Entries must be sorted by column with no duplicates;
    /// explicit zeros are skipped.
    pub fn push_row(&mut self, entries: &[(usize, f64)]) {
        debug_assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "row entries must be strictly increasing by column"
        );
        for &(col, value) in entries {
            debug_assert!(col < self.n_cols, "column {col} out of range");
            if value != 0.0 {
                self.indices.push(col);
                self.values.push(value);
            }
        }
        self.indptr.push(self.indices.len());
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseRow {
            indices: &self.indices[start..end],
            values: &self.values[start..end],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = SparseRow<'_>> {
        (0..self.n_rows()).map(move |i| self.row(i))
    }

    /// Expand to a dense row-major Vec<Vec<f64>>. For tests and small inputs.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        self.rows()
            .map(|row| {
                let mut dense = vec![0.0; self.n_cols];
                for (j, v) in row.iter() {
                    dense[j] = v;
                }
                dense
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_rows() {
        let mut m = SparseMatrix::new(4);
        m.push_row(&[(0, 1.0), (3, 2.0)]);
        m.push_row(&[]);
        m.push_row(&[(1, 0.0), (2, 5.0)]);

        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.nnz(), 3);
        assert!(m.row(1).is_empty());
        assert_eq!(m.row(2).nnz(), 1);
        assert_eq!(m.row(0).get(3), 2.0);
        assert_eq!(m.row(0).get(2), 0.0);
        assert_eq!(
            m.to_dense(),
            vec![
                vec![1.0, 0.0, 0.0, 2.0],
                vec![0.0; 4],
                vec![0.0, 0.0, 5.0, 0.0]
            ]
        );
    }

    #[test]
    fn test_norm_and_dot() {
        let mut m = SparseMatrix::new(3);
        m.push_row(&[(0, 3.0), (2, 4.0)]);
        assert!((m.row(0).norm() - 5.0).abs() < 1e-12);
        assert!((m.row(0).dot(&[1.0, 10.0, 2.0]) - 11.0).abs() < 1e-12);
    }
}
