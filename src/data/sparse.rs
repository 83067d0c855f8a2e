//! Compressed sparse row matrix
use serde::{Deserialize, Serialize};

/// A single nonzero value of a sparse row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Column (feature) index
    pub id: usize,
    /// Value of the feature
    pub value: f64,
}

impl Entry {
    /// Creates an [`Entry`].
    pub fn new(id: usize, value: f64) -> Self {
        Entry { id, value }
    }
}

/// A sparse design matrix stored row by row.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SparseMatrix {
    offsets: Vec<usize>,
    entries: Vec<Entry>,
    num_cols: usize,
}

impl SparseMatrix {
    /// Creates an empty matrix with `num_cols` columns.
    pub fn new(num_cols: usize) -> Self {
        SparseMatrix {
            offsets: vec![0],
            entries: Vec::new(),
            num_cols,
        }
    }

    /// Builds a matrix from a list of rows. The number of columns is derived from the largest id.
    pub fn from_rows<R: AsRef<[Entry]>>(rows: &[R]) -> Self {
        let mut matrix = SparseMatrix::new(0);
        for row in rows {
            matrix.push_row(row.as_ref());
        }
        matrix
    }

    /// Appends a row, growing the column count if necessary.
    pub fn push_row(&mut self, row: &[Entry]) {
        for entry in row {
            self.num_cols = self.num_cols.max(entry.id + 1);
        }
        self.entries.extend_from_slice(row);
        self.offsets.push(self.entries.len());
    }

    /// Raises the column count to at least `num_cols`.
    pub fn with_num_cols(mut self, num_cols: usize) -> Self {
        self.num_cols = self.num_cols.max(num_cols);
        self
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns the number of columns.
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Returns the number of stored values.
    pub fn num_values(&self) -> usize {
        self.entries.len()
    }

    /// Returns the ith row.
    pub fn row(&self, i: usize) -> &[Entry] {
        &self.entries[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Iterates over all rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Entry]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.entries[w[0]..w[1]])
    }

    /// Returns the largest feature id that occurs in the matrix.
    pub fn max_id(&self) -> Option<usize> {
        self.entries.iter().map(|e| e.id).max()
    }

    /// Computes the transposed matrix: row `i` of the result lists the rows containing feature `i`.
    pub fn transpose(&self) -> SparseMatrix {
        let mut counts = vec![0usize; self.num_cols];
        for entry in self.entries.iter() {
            counts[entry.id] += 1;
        }
        let mut offsets = Vec::with_capacity(self.num_cols + 1);
        offsets.push(0);
        for &count in counts.iter() {
            offsets.push(offsets[offsets.len() - 1] + count);
        }
        let mut fill = offsets[..self.num_cols].to_vec();
        let mut entries = vec![Entry::new(0, 0.0); self.entries.len()];
        for (i, row) in self.rows().enumerate() {
            for entry in row {
                entries[fill[entry.id]] = Entry::new(i, entry.value);
                fill[entry.id] += 1;
            }
        }
        SparseMatrix {
            offsets,
            entries,
            num_cols: self.num_rows(),
        }
    }
}
