//! Huber M-estimation by iteratively reweighted least squares.
//!
//! Scale is re-estimated each iteration as `MAD / 0.6745` of the residuals;
//! iteration stops once the Huber deviance changes by at most `tol`.
//! Covariance uses the H1 sandwich form with the small-sample factor
//! `k = 1 + (p/n) · Var(ψ') / E[ψ']²`.

use nalgebra::DVector;
use tracing::debug;

use crate::domain::FitStats;
use crate::error::FitFailure;
use crate::math::{solve_least_squares, solve_weighted, stats};

use super::design::Design;
use super::estimator::{Fitted, build_coefficients, total_sum_of_squares};

/// Huber tuning constant (95% efficiency under normal errors).
pub const HUBER_T: f64 = 1.345;
pub const MAX_ITER: usize = 50;
pub const TOL: f64 = 1e-8;

/// Normal-consistency constant for the median absolute deviation.
const MAD_NORMAL: f64 = 0.674_489_750_196_081_7;

pub fn fit(design: &Design, t: f64, max_iter: usize, tol: f64) -> Result<Fitted, FitFailure> {
    let (n, k) = (design.n(), design.k());
    if n <= k {
        return Err(FitFailure::InsufficientObservations { n, needed: k + 1 });
    }
    let floor = 1e-12 * design.y.amax().max(1.0);
    let start = solve_least_squares(&design.x, &design.y)?;
    let mut beta = start.beta;
    let mut resid = &design.y - &design.x * &beta;
    let mut scale = mad_scale(&resid, floor)?;
    let mut deviance = huber_deviance(&resid, scale, t);

    let mut iterations = 0;
    while iterations < max_iter {
        iterations += 1;
        let weights: Vec<f64> = resid.iter().map(|r| huber_weight(r / scale, t)).collect();
        beta = solve_weighted(&design.x, &design.y, &weights)?.beta;
        resid = &design.y - &design.x * &beta;
        scale = mad_scale(&resid, floor)?;
        let next = huber_deviance(&resid, scale, t);
        let converged = (next - deviance).abs() <= tol;
        deviance = next;
        if converged {
            break;
        }
    }
    debug!(iterations, scale, deviance, "huber IRLS finished");

    let z: Vec<f64> = resid.iter().map(|r| r / scale).collect();
    let psi_prime: Vec<f64> = z.iter().map(|v| if v.abs() <= t { 1.0 } else { 0.0 }).collect();
    let m = stats::mean(&psi_prime).unwrap_or(0.0);
    if m == 0.0 {
        return Err(FitFailure::Degenerate("every residual is beyond the Huber threshold"));
    }
    let var_psi_prime = stats::std_dev(&psi_prime, 0).map_or(0.0, |sd| sd * sd);
    let correction = 1.0 + (k as f64 / n as f64) * var_psi_prime / (m * m);
    let psi_sq: f64 = z.iter().map(|v| huber_psi(*v, t).powi(2)).sum();
    let df_resid = (n - k) as f64;
    let factor = correction.powi(2) * (psi_sq / df_resid) * scale * scale / (m * m);
    let cov = &start.xtx_inv * factor;

    let coefficients = build_coefficients(&design.terms, &beta, Some(&cov), stats::normal_p_value);
    let ssr = resid.norm_squared();
    let tss = total_sum_of_squares(&design.y);

    Ok(Fitted {
        coefficients,
        stats: FitStats {
            n_obs: n,
            r_squared: 1.0 - ssr / tss,
            adj_r_squared: None,
            aic: None,
            bic: None,
            alpha: None,
        },
    })
}

/// `MAD / 0.6745`; a scale at or below `floor` means the fit is exact.
fn mad_scale(resid: &DVector<f64>, floor: f64) -> Result<f64, FitFailure> {
    let mut abs: Vec<f64> = resid.iter().map(|r| r.abs()).collect();
    let scale = stats::median_mut(&mut abs).unwrap_or(0.0) / MAD_NORMAL;
    if scale.is_finite() && scale > floor {
        Ok(scale)
    } else {
        Err(FitFailure::Degenerate("residual scale is zero"))
    }
}

fn huber_weight(z: f64, t: f64) -> f64 {
    let az = z.abs();
    if az <= t { 1.0 } else { t / az }
}

fn huber_psi(z: f64, t: f64) -> f64 {
    z.clamp(-t, t)
}

fn huber_rho(z: f64, t: f64) -> f64 {
    let az = z.abs();
    if az <= t { 0.5 * z * z } else { t * az - 0.5 * t * t }
}

fn huber_deviance(resid: &DVector<f64>, scale: f64, t: f64) -> f64 {
    resid.iter().map(|r| huber_rho(r / scale, t)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn design(ys: &[f64]) -> Design {
        let n = ys.len();
        Design {
            terms: vec!["x".into(), "const".into()],
            x: DMatrix::from_fn(n, 2, |i, j| if j == 0 { i as f64 } else { 1.0 }),
            y: DVector::from_row_slice(ys),
        }
    }

    #[test]
    fn outlier_is_downweighted_relative_to_ols() {
        // y = 2x + 1 with small noise, plus one gross outlier at the end.
        let noise = [0.1, -0.2, 0.15, -0.05, 0.2, -0.1, 0.05, -0.15, 0.1];
        let mut ys: Vec<f64> = noise.iter().enumerate().map(|(i, e)| 1.0 + 2.0 * i as f64 + e).collect();
        ys.push(80.0);
        let d = design(&ys);

        let ols = solve_least_squares(&d.x, &d.y).unwrap();
        let f = fit(&d, HUBER_T, MAX_ITER, TOL).unwrap();
        let slope = f.coefficients[0].estimate;
        assert!((slope - 2.0).abs() < (ols.beta[0] - 2.0).abs());
        assert!((slope - 2.0).abs() < 0.5);
        assert!(f.coefficients.iter().all(|c| c.std_error.is_some_and(|se| se > 0.0)));
        assert!(f.coefficients[0].p_value.is_some());
    }

    #[test]
    fn perfect_fit_has_zero_scale() {
        let d = design(&[1.0, 3.0, 5.0, 7.0, 9.0]);
        assert!(matches!(
            fit(&d, HUBER_T, MAX_ITER, TOL),
            Err(FitFailure::Degenerate(_))
        ));
    }

    #[test]
    fn huber_functions_agree_at_threshold() {
        let t = HUBER_T;
        assert_eq!(huber_weight(t, t), 1.0);
        assert!((huber_weight(2.0 * t, t) - 0.5).abs() < 1e-15);
        assert!((huber_rho(t, t) - 0.5 * t * t).abs() < 1e-15);
        assert_eq!(huber_psi(-5.0, t), -t);
    }
}
