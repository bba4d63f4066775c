//! Least-squares solver with an explicit rank check.
//!
//! Every estimator reduces to one or more problems of the form
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Weighted problems scale rows by `sqrt(w_i)` and solve an ordinary one.
//! - SVD handles tall design matrices and gives the rank and `(X'X)^{-1}`
//!   from the same factorization (`V diag(1/s²) V'`).
//! - A rank-deficient design is an error, never a pseudo-inverse answer:
//!   collinear regressors have no unique coefficients to report.

use nalgebra::{DMatrix, DVector};

use crate::error::FitFailure;

/// Solution of one least-squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub beta: DVector<f64>,
    /// `(X'X)^{-1}` of the (weighted) design.
    pub xtx_inv: DMatrix<f64>,
}

/// Singular values below `RANK_RTOL · max(s)` count as zero.
pub const RANK_RTOL: f64 = 1e-10;

/// Numerical rank from singular values.
pub fn rank(singular_values: &DVector<f64>) -> usize {
    let max_sv = singular_values.iter().copied().fold(0.0, f64::max);
    let tol = max_sv * RANK_RTOL;
    singular_values.iter().filter(|s| **s > tol).count()
}

/// Solve `min ||y - Xβ||²`; `Err` if `X` does not have full column rank.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<LeastSquares, FitFailure> {
    let (n, k) = x.shape();
    if n < k {
        return Err(FitFailure::InsufficientObservations { n, needed: k });
    }

    let svd = x.clone().svd(true, true);
    let r = rank(&svd.singular_values);
    if r < k {
        return Err(FitFailure::RankDeficient { rank: r, columns: k });
    }

    let beta = svd
        .solve(y, 0.0)
        .map_err(|_| FitFailure::Degenerate("SVD solve failed"))?;
    if !beta.iter().all(|v| v.is_finite()) {
        return Err(FitFailure::NonFinite);
    }

    let v_t = svd
        .v_t
        .as_ref()
        .ok_or(FitFailure::Degenerate("SVD did not produce V'"))?;
    let inv_sq = DMatrix::from_diagonal(&svd.singular_values.map(|s| 1.0 / (s * s)));
    let xtx_inv = v_t.transpose() * inv_sq * v_t;

    Ok(LeastSquares { beta, xtx_inv })
}

/// Weighted least squares via `sqrt(w)` row scaling.
pub fn solve_weighted(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &[f64],
) -> Result<LeastSquares, FitFailure> {
    let mut xw = x.clone();
    let mut yw = y.clone();
    for (i, wi) in w.iter().enumerate() {
        let s = wi.max(0.0).sqrt();
        xw.row_mut(i).scale_mut(s);
        yw[i] *= s;
    }
    solve_least_squares(&xw, &yw)
}
