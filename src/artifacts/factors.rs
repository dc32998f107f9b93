use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// On-disk form of a dense factor matrix
///
/// Row-major values with explicit dimensions, independent of how the
/// in-memory matrix is laid out. Serialized with bincode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorMatrix {
    pub nrows: usize,
    pub ncols: usize,
    pub data: Vec<f64>,
}

impl FactorMatrix {
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let mut data = Vec::with_capacity(matrix.nrows() * matrix.ncols());
        for i in 0..matrix.nrows() {
            for j in 0..matrix.ncols() {
                data.push(matrix[(i, j)]);
            }
        }
        FactorMatrix {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
            data,
        }
    }

    pub fn into_matrix(self) -> AppResult<DMatrix<f64>> {
        if self.data.len() != self.nrows * self.ncols {
            return Err(AppError::Data(format!(
                "factor matrix shape mismatch: {} values for {}x{}",
                self.data.len(),
                self.nrows,
                self.ncols
            )));
        }
        Ok(DMatrix::from_row_slice(self.nrows, self.ncols, &self.data))
    }
}
