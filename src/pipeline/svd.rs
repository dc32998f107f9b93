use std::time::Instant;

use nalgebra::{DMatrix, SVD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{AppError, AppResult};
use crate::pipeline::interactions::Interactions;

/// Extra random projection columns beyond the target rank
const OVERSAMPLES: usize = 10;

/// Power iterations applied to sharpen the projected subspace
const POWER_ITERATIONS: usize = 5;

/// Output of the truncated decomposition
///
/// `user_factors` is users x rank (left singular vectors scaled by the
/// singular values), `item_components` is rank x movies (right singular
/// vectors). Predicted score = dot(user row, item column).
pub struct LatentFactors {
    pub user_factors: DMatrix<f64>,
    pub item_components: DMatrix<f64>,
}

impl LatentFactors {
    pub fn rank(&self) -> usize {
        self.user_factors.ncols()
    }
}

/// Computes a rank-K truncated SVD of the interaction matrix
///
/// Uses a randomized range finder with a fixed seed: project onto a
/// Gaussian sketch, re-orthonormalize through a few power iterations,
/// then take a small dense SVD of the projected matrix. Identical inputs
/// and seed reproduce the factors bit for bit.
///
/// The rank is clamped to the matrix dimensions, so a 2x2 input with a
/// requested rank of 20 yields rank-2 factors.
pub fn truncated_svd(
    interactions: &Interactions,
    rank: usize,
    seed: u64,
) -> AppResult<LatentFactors> {
    let m = interactions.nrows();
    let n = interactions.ncols();
    if m == 0 || n == 0 {
        return Err(AppError::Data(
            "interaction matrix is empty, nothing to factorize".to_string(),
        ));
    }
    if rank == 0 {
        return Err(AppError::Data("latent rank must be at least 1".to_string()));
    }

    let k = rank.min(m).min(n);
    let sketch_width = (k + OVERSAMPLES).min(m).min(n);
    let start = Instant::now();
    tracing::debug!(
        rows = m,
        cols = n,
        rank = k,
        sketch_width,
        "Computing randomized truncated SVD"
    );

    // 1. Gaussian sketch of the column space
    let mut rng = StdRng::seed_from_u64(seed);
    let omega = DMatrix::from_fn(n, sketch_width, |_, _| rng.sample::<f64, _>(StandardNormal));
    let y = interactions.mul_dense(&omega);
    let mut q = y.qr().q();

    // 2. Power iterations, re-orthonormalizing at each step to keep the
    //    basis numerically sane
    for _ in 0..POWER_ITERATIONS {
        let z = interactions.tr_mul_dense(&q);
        let qz = z.qr().q();
        let y = interactions.mul_dense(&qz);
        q = y.qr().q();
    }

    // 3. Project onto the basis: B = Q^T * A, computed as (A^T * Q)^T
    let b = interactions.tr_mul_dense(&q).transpose();

    // 4. Dense SVD of the small projected matrix; nalgebra returns the
    //    singular values in descending order
    let svd = SVD::new(b, true, true);
    let u = svd
        .u
        .ok_or_else(|| AppError::Internal("SVD failed to compute U".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| AppError::Internal("SVD failed to compute V^T".to_string()))?;
    let sigma = svd.singular_values;

    // 5. Lift back: user_factors = Q * U[:, :k] scaled by the singular
    //    values, item_components = V^T[:k, :]
    let u_k = u.columns(0, k).into_owned();
    let mut user_factors = &q * &u_k;
    for j in 0..k {
        let scale = sigma[j];
        for i in 0..m {
            user_factors[(i, j)] *= scale;
        }
    }
    let item_components = v_t.rows(0, k).into_owned();

    tracing::debug!(
        rank = k,
        elapsed_ms = start.elapsed().as_millis(),
        "Truncated SVD complete"
    );

    Ok(LatentFactors {
        user_factors,
        item_components,
    })
}
