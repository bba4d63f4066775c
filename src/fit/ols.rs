//! Ordinary least squares with classical or HC0-HC3 sandwich covariance.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitStats, SePolicy};
use crate::error::FitFailure;
use crate::math::{solve_least_squares, stats};

use super::design::Design;
use super::estimator::{Fitted, build_coefficients, total_sum_of_squares};

pub fn fit(design: &Design, se: SePolicy) -> Result<Fitted, FitFailure> {
    let (n, k) = (design.n(), design.k());
    if n <= k {
        return Err(FitFailure::InsufficientObservations { n, needed: k + 1 });
    }
    let ls = solve_least_squares(&design.x, &design.y)?;
    let residuals = &design.y - &design.x * &ls.beta;
    let ssr = residuals.norm_squared();
    let tss = total_sum_of_squares(&design.y);
    let df_resid = (n - k) as f64;

    let coefficients = match se {
        SePolicy::Hc0 | SePolicy::Hc1 | SePolicy::Hc2 | SePolicy::Hc3 => {
            let cov = sandwich(design, &ls.xtx_inv, &residuals, se);
            build_coefficients(&design.terms, &ls.beta, Some(&cov), stats::normal_p_value)
        }
        SePolicy::Nonrobust => {
            let cov = &ls.xtx_inv * (ssr / df_resid);
            build_coefficients(&design.terms, &ls.beta, Some(&cov), |t| {
                stats::t_p_value(t, df_resid)
            })
        }
        SePolicy::None | SePolicy::Huber => {
            build_coefficients(&design.terms, &ls.beta, None, |_| None)
        }
    };

    let r_squared = 1.0 - ssr / tss;
    let adj_r_squared = 1.0 - (n as f64 - 1.0) / df_resid * (1.0 - r_squared);
    let llf = -(n as f64) / 2.0 * ((2.0 * PI).ln() + (ssr / n as f64).ln() + 1.0);
    let aic = -2.0 * llf + 2.0 * k as f64;
    let bic = -2.0 * llf + k as f64 * (n as f64).ln();

    Ok(Fitted {
        coefficients,
        stats: FitStats {
            n_obs: n,
            r_squared,
            adj_r_squared: Some(adj_r_squared),
            aic: Some(aic).filter(|v| v.is_finite()),
            bic: Some(bic).filter(|v| v.is_finite()),
            alpha: None,
        },
    })
}

/// `(X'X)^{-1} X' diag(ω) X (X'X)^{-1}` with `ω_i = e_i²` scaled per variant:
/// HC0 as is, HC1 by `n/(n-k)`, HC2 by `1/(1-h_ii)`, HC3 by `1/(1-h_ii)²`.
/// A leverage of one makes the HC2/HC3 weight infinite, so the standard
/// errors come out unreported.
fn sandwich(design: &Design, xtx_inv: &DMatrix<f64>, residuals: &DVector<f64>, se: SePolicy) -> DMatrix<f64> {
    let (n, k) = (design.n(), design.k());
    let mut meat = DMatrix::<f64>::zeros(k, k);
    for (i, e) in residuals.iter().enumerate() {
        let row = design.x.row(i);
        let leverage = (row * xtx_inv * row.transpose())[(0, 0)];
        let omega = match se {
            SePolicy::Hc2 => e * e / (1.0 - leverage),
            SePolicy::Hc3 => e * e / (1.0 - leverage).powi(2),
            _ => e * e,
        };
        meat += row.transpose() * row * omega;
    }
    let cov = xtx_inv * meat * xtx_inv;
    if se == SePolicy::Hc1 {
        cov * (n as f64 / (n - k) as f64)
    } else {
        cov
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(xs: &[f64], ys: &[f64]) -> Design {
        let n = xs.len();
        Design {
            terms: vec!["x".into(), "const".into()],
            x: DMatrix::from_fn(n, 2, |i, j| if j == 0 { xs[i] } else { 1.0 }),
            y: DVector::from_row_slice(ys),
        }
    }

    #[test]
    fn classical_fit_matches_hand_computation() {
        // y = 1 + 2x + e with e = [0.1, -0.1, -0.1, 0.1]
        let d = design(&[0.0, 1.0, 2.0, 3.0], &[1.1, 2.9, 4.9, 7.1]);
        let f = fit(&d, SePolicy::Nonrobust).unwrap();
        let slope = &f.coefficients[0];
        assert!((slope.estimate - 2.0).abs() < 1e-10);
        assert!((f.coefficients[1].estimate - 1.0).abs() < 1e-10);
        // SSR = 0.04, σ² = 0.02, Var(slope) = σ² / Σ(x - x̄)² = 0.02 / 5
        assert!((slope.std_error.unwrap() - (0.004f64).sqrt()).abs() < 1e-10);
        assert!(slope.p_value.unwrap() < 0.01);
        assert_eq!(f.stats.n_obs, 4);
        assert!(f.stats.r_squared > 0.99);
        assert!(f.stats.aic.is_some() && f.stats.bic.is_some());
    }

    #[test]
    fn hc1_inflates_by_small_sample_factor() {
        let d = design(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.8, 3.3, 4.7, 7.4, 8.9]);
        let f = fit(&d, SePolicy::Hc1).unwrap();
        let ls = solve_least_squares(&d.x, &d.y).unwrap();
        let e = &d.y - &d.x * &ls.beta;
        let mut meat = DMatrix::<f64>::zeros(2, 2);
        for i in 0..5 {
            let row = d.x.row(i);
            meat += row.transpose() * row * e[i].powi(2);
        }
        let hc0 = &ls.xtx_inv * meat * &ls.xtx_inv;
        let expected = (hc0[(0, 0)] * 5.0 / 3.0).sqrt();
        assert!((f.coefficients[0].std_error.unwrap() - expected).abs() < 1e-12);
    }

    /// Residuals ±0.1 on x = 0..3; leverages are [0.7, 0.3, 0.3, 0.7] and the
    /// slope row of `(X'X)^{-1}X'` is [-0.3, -0.1, 0.1, 0.3].
    fn symmetric_fixture() -> Design {
        design(&[0.0, 1.0, 2.0, 3.0], &[1.1, 2.9, 4.9, 7.1])
    }

    #[test]
    fn hc0_matches_hand_computation() {
        let f = fit(&symmetric_fixture(), SePolicy::Hc0).unwrap();
        // Σ a_i² e_i² = 0.01 · (0.09 + 0.01 + 0.01 + 0.09)
        let expected = 0.002f64.sqrt();
        assert!((f.coefficients[0].std_error.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn hc2_scales_by_inverse_one_minus_leverage() {
        let f = fit(&symmetric_fixture(), SePolicy::Hc2).unwrap();
        let var: f64 = 2.0 * (0.09 * 0.01 / 0.3 + 0.01 * 0.01 / 0.7);
        let slope = &f.coefficients[0];
        assert!((slope.std_error.unwrap() - var.sqrt()).abs() < 1e-12);
        assert!((slope.t_value.unwrap() - 2.0 / var.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn hc3_scales_by_squared_inverse_one_minus_leverage() {
        let f = fit(&symmetric_fixture(), SePolicy::Hc3).unwrap();
        let var: f64 = 2.0 * (0.09 * 0.01 / 0.09 + 0.01 * 0.01 / 0.49);
        assert!((f.coefficients[0].std_error.unwrap() - var.sqrt()).abs() < 1e-12);
        let hc2 = fit(&symmetric_fixture(), SePolicy::Hc2).unwrap();
        assert!(f.coefficients[0].std_error > hc2.coefficients[0].std_error);
    }

    #[test]
    fn collinear_design_is_rank_deficient() {
        let d = Design {
            terms: vec!["a".into(), "b".into(), "const".into()],
            x: DMatrix::from_row_slice(
                5,
                3,
                &[1.0, 2.0, 1.0, 2.0, 4.0, 1.0, 3.0, 6.0, 1.0, 4.0, 8.0, 1.0, 5.0, 10.0, 1.0],
            ),
            y: DVector::from_row_slice(&[1.0, 3.0, 2.0, 5.0, 4.0]),
        };
        assert!(matches!(
            fit(&d, SePolicy::Hc1),
            Err(FitFailure::RankDeficient { rank: 2, columns: 3 })
        ));
    }

    #[test]
    fn no_standard_errors_when_policy_is_none() {
        let d = design(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.5, 5.5, 6.0]);
        let f = fit(&d, SePolicy::None).unwrap();
        assert!(f.coefficients.iter().all(|c| c.std_error.is_none()));
    }
}
