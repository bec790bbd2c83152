//! Minimal row-major 2-D storage for granule fields.

use crate::error::VfmError;
use serde::Serialize;
use std::ops::Range;

/// Row-major `rows x cols` array.
///
/// Rows are along-track footprints for every field in a granule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Array2<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> Array2<T> {
    /// Returns an array backed by `data`, which must hold exactly
    /// `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, VfmError> {
        if rows.checked_mul(cols) == Some(data.len()) {
            Ok(Self { rows, cols, data })
        } else {
            Err(VfmError::Shape {
                rows,
                cols,
                len: data.len(),
            })
        }
    }

    /// Returns a single-column array.
    pub fn column_vec(data: Vec<T>) -> Self {
        Self {
            rows: data.len(),
            cols: 1,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Returns an iterator over rows.
    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        // `max(1)` keeps `chunks_exact` happy for zero-width arrays,
        // which then yield no rows.
        self.data.chunks_exact(self.cols.max(1))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Drops every row at or after `rows`.
    pub fn truncate_rows(&mut self, rows: usize) {
        if rows < self.rows {
            self.rows = rows;
            self.data.truncate(rows * self.cols);
        }
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Array2<U> {
        Array2 {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Array2<T> {
    /// Returns a copy of rows in `range`.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.rows);
        let start = range.start.min(end);
        Self {
            rows: end - start,
            cols: self.cols,
            data: self.data[start * self.cols..end * self.cols].to_vec(),
        }
    }

    /// Returns a copy of the rows listed in `rows`, in that order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * self.cols);
        for &row in rows {
            data.extend_from_slice(self.row(row));
        }
        Self {
            rows: rows.len(),
            cols: self.cols,
            data,
        }
    }

    /// Returns a copy of column `col`.
    pub fn column(&self, col: usize) -> Vec<T> {
        self.iter_rows().map(|row| row[col].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Array2, VfmError};

    #[test]
    fn test_from_vec_checks_shape() {
        assert!(Array2::from_vec(2, 3, vec![0_u16; 6]).is_ok());
        assert!(matches!(
            Array2::from_vec(2, 3, vec![0_u16; 5]),
            Err(VfmError::Shape {
                rows: 2,
                cols: 3,
                len: 5
            })
        ));
    }

    #[test]
    fn test_row_access() {
        let arr = Array2::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(arr.row(1), &[4, 5, 6]);
        assert_eq!(arr.get(0, 2), Some(&3));
        assert_eq!(arr.get(2, 0), None);
        assert_eq!(arr.column(1), vec![2, 5]);
        assert_eq!(arr.iter_rows().len(), 2);
    }

    #[test]
    fn test_truncate_and_slice() {
        let mut arr = Array2::from_vec(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mid = arr.slice_rows(1..2);
        assert_eq!(mid.rows(), 1);
        assert_eq!(mid.row(0), &[3, 4]);
        arr.truncate_rows(2);
        assert_eq!(arr.rows(), 2);
        assert_eq!(arr.as_slice(), &[1, 2, 3, 4]);
        // Truncating beyond the current length is a no-op.
        arr.truncate_rows(10);
        assert_eq!(arr.rows(), 2);
    }

    #[test]
    fn test_select_rows() {
        let arr = Array2::from_vec(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let picked = arr.select_rows(&[2, 0]);
        assert_eq!(picked.rows(), 2);
        assert_eq!(picked.as_slice(), &[5, 6, 1, 2]);
        assert!(arr.select_rows(&[]).is_empty());
    }
}
