//! Dense two-dimensional container for matrix payloads.
//!
//! Storage is column-major: all rows of column 0, then column 1, and so on.
//! A column is one entity (e.g. a mesh vertex) and the rows are its
//! components, which is also the order in which instances appear in a file.

use std::fmt;

use super::{Error, Primitive, Result};

/// Dense `rows x cols` matrix of one primitive type.
#[derive(Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Primitive> Matrix<T> {
    /// Create a zero-filled matrix.
    ///
    /// Fails if `rows * cols` overflows or the storage cannot be allocated.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let too_large = || Error::backend(format!("{rows}x{cols} matrix is too large"));
        let len = rows.checked_mul(cols).ok_or_else(too_large)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| too_large())?;
        data.resize(len, T::default());
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix from column-major data.
    ///
    /// Returns `None` if `data.len() != rows * cols`.
    pub fn from_column_major(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        (rows.checked_mul(cols) == Some(data.len())).then_some(Self { rows, cols, data })
    }

    /// Create a matrix from a list of columns of equal length.
    pub fn from_columns(columns: &[&[T]]) -> Option<Self> {
        let rows = columns.first().map_or(0, |c| c.len());
        if columns.iter().any(|c| c.len() != rows) {
            return None;
        }
        let data = columns.iter().flat_map(|c| c.iter().copied()).collect();
        Some(Self {
            rows,
            cols: columns.len(),
            data,
        })
    }

    /// Create a `len x 1` column vector.
    pub fn column_vector(values: &[T]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    /// Create a `1 x len` row vector.
    pub fn row_vector(values: &[T]) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: values.to_vec(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `(row, col)`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.rows && col < self.cols {
            Some(self.data[col * self.rows + row])
        } else {
            None
        }
    }

    /// Mutable element at `(row, col)`, or `None` when out of bounds.
    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        if row < self.rows && col < self.cols {
            Some(&mut self.data[col * self.rows + row])
        } else {
            None
        }
    }

    /// Set element at `(row, col)`. Returns false when out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.get_mut(row, col) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// One column (entity) as a slice.
    pub fn column(&self, col: usize) -> Option<&[T]> {
        (col < self.cols).then(|| &self.data[col * self.rows..(col + 1) * self.rows])
    }

    /// Column-major element storage.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Raw bytes of the column-major storage.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Shape as `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl<T> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix<{}>[{}x{}]", std::any::type_name::<T>(), self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_major_layout() {
        let m = Matrix::from_columns(&[&[1.0f32, 2.0, 3.0][..], &[4.0, 5.0, 6.0][..]]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.get(2, 0), Some(3.0));
        assert_eq!(m.get(0, 1), Some(4.0));
        assert_eq!(m.column(1), Some(&[4.0f32, 5.0, 6.0][..]));
        assert_eq!(m.get(3, 0), None);
    }

    #[test]
    fn test_set_and_bounds() {
        let mut m = Matrix::<u16>::zeros(2, 2).unwrap();
        assert!(m.set(1, 1, 7));
        assert!(!m.set(2, 0, 1));
        assert_eq!(m.get(1, 1), Some(7));
        assert_eq!(m.as_bytes().len(), 8);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        assert!(Matrix::from_columns(&[&[1u8, 2][..], &[3u8][..]]).is_none());
        assert!(Matrix::from_column_major(2, 2, vec![1u8, 2, 3]).is_none());
        assert!(Matrix::from_column_major(usize::MAX, 2, vec![1u8, 2]).is_none());
    }

    #[test]
    fn test_oversized_zeros_is_an_error() {
        assert!(matches!(
            Matrix::<u8>::zeros(usize::MAX, 2),
            Err(Error::Backend(_))
        ));
        assert!(Matrix::<f64>::zeros(usize::MAX / 4, 1).is_err());
        assert_eq!(Matrix::<f32>::zeros(0, usize::MAX).map(|m| m.len()).ok(), Some(0));
    }
}
