use std::collections::BTreeMap;

use nalgebra::DMatrix;
use sprs::{CsMat, TriMat};

use crate::error::{AppError, AppResult};
use crate::models::{IdIndex, Rating};

/// Sparse user-item rating matrix in CSR form
///
/// Rows are users, columns are movies, both in the dense index order
/// assigned by the id maps. Values are raw rating values.
pub struct Interactions {
    matrix: CsMat<f64>,
}

impl Interactions {
    /// Builds the matrix from rating rows and the two id maps
    ///
    /// Duplicate (user, movie) pairs keep the last rating seen in file
    /// order. Entries are inserted in sorted coordinate order so the CSR
    /// layout is identical across runs on the same input.
    pub fn from_ratings(
        ratings: &[Rating],
        users: &IdIndex,
        movies: &IdIndex,
    ) -> AppResult<Self> {
        let mut cells: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for rating in ratings {
            let row = users.index_of(rating.user_id).ok_or_else(|| {
                AppError::Data(format!("user id {} missing from index map", rating.user_id))
            })?;
            let col = movies.index_of(rating.movie_id).ok_or_else(|| {
                AppError::Data(format!(
                    "movie id {} missing from index map",
                    rating.movie_id
                ))
            })?;
            cells.insert((row, col), rating.rating);
        }

        let mut triplets = TriMat::new((users.len(), movies.len()));
        for ((row, col), value) in cells {
            triplets.add_triplet(row, col, value);
        }
        let matrix: CsMat<f64> = triplets.to_csr();
        Ok(Interactions { matrix })
    }

    pub fn nrows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.cols()
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Computes `A * rhs` where `A` is this matrix (m x n) and `rhs` is
    /// dense (n x l), without densifying `A`
    pub fn mul_dense(&self, rhs: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(self.nrows(), rhs.ncols());
        for (row, row_vec) in self.matrix.outer_iterator().enumerate() {
            for (col, &value) in row_vec.iter() {
                for k in 0..rhs.ncols() {
                    out[(row, k)] += value * rhs[(col, k)];
                }
            }
        }
        out
    }

    /// Computes `A^T * rhs` where `A` is this matrix (m x n) and `rhs` is
    /// dense (m x l), without densifying or transposing `A`
    pub fn tr_mul_dense(&self, rhs: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(self.ncols(), rhs.ncols());
        for (row, row_vec) in self.matrix.outer_iterator().enumerate() {
            for (col, &value) in row_vec.iter() {
                for k in 0..rhs.ncols() {
                    out[(col, k)] += value * rhs[(row, k)];
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user_id: u32, movie_id: u32, rating: f64) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating,
        }
    }

    fn small_fixture() -> (Vec<Rating>, IdIndex, IdIndex) {
        let ratings = vec![rating(1, 10, 5.0), rating(1, 20, 3.0), rating(2, 10, 4.0)];
        let users = IdIndex::from_first_occurrence(ratings.iter().map(|r| r.user_id));
        let movies = IdIndex::from_first_occurrence(ratings.iter().map(|r| r.movie_id));
        (ratings, users, movies)
    }

    #[test]
    fn test_builds_csr_with_expected_shape() {
        let (ratings, users, movies) = small_fixture();
        let interactions = Interactions::from_ratings(&ratings, &users, &movies).unwrap();
        assert_eq!(interactions.nrows(), 2);
        assert_eq!(interactions.ncols(), 2);
        assert_eq!(interactions.nnz(), 3);
    }

    #[test]
    fn test_last_rating_wins_on_duplicates() {
        let ratings = vec![rating(1, 10, 2.0), rating(1, 10, 5.0)];
        let users = IdIndex::from_first_occurrence(ratings.iter().map(|r| r.user_id));
        let movies = IdIndex::from_first_occurrence(ratings.iter().map(|r| r.movie_id));
        let interactions = Interactions::from_ratings(&ratings, &users, &movies).unwrap();
        assert_eq!(interactions.nnz(), 1);

        // A 1x1 identity multiply reads the stored value back out.
        let identity = DMatrix::identity(1, 1);
        let dense = interactions.mul_dense(&identity);
        assert_eq!(dense[(0, 0)], 5.0);
    }

    #[test]
    fn test_mul_dense_matches_hand_computation() {
        let (ratings, users, movies) = small_fixture();
        let interactions = Interactions::from_ratings(&ratings, &users, &movies).unwrap();

        // A = [[5, 3], [4, 0]], rhs = [[1, 0], [0, 2]]
        let rhs = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);
        let out = interactions.mul_dense(&rhs);
        assert_eq!(out[(0, 0)], 5.0);
        assert_eq!(out[(0, 1)], 6.0);
        assert_eq!(out[(1, 0)], 4.0);
        assert_eq!(out[(1, 1)], 0.0);
    }

    #[test]
    fn test_tr_mul_dense_matches_hand_computation() {
        let (ratings, users, movies) = small_fixture();
        let interactions = Interactions::from_ratings(&ratings, &users, &movies).unwrap();

        // A^T = [[5, 4], [3, 0]], rhs = [[1], [1]]
        let rhs = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let out = interactions.tr_mul_dense(&rhs);
        assert_eq!(out[(0, 0)], 9.0);
        assert_eq!(out[(1, 0)], 3.0);
    }

    #[test]
    fn test_unmapped_id_is_a_data_error() {
        let ratings = vec![rating(1, 10, 5.0)];
        let users = IdIndex::from_first_occurrence(std::iter::once(1));
        let movies = IdIndex::from_first_occurrence(std::iter::once(99));
        let result = Interactions::from_ratings(&ratings, &users, &movies);
        assert!(matches!(result, Err(AppError::Data(_))));
    }
}
