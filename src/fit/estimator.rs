//! Estimator dispatch and the coefficient builder shared by every fit.

use nalgebra::{DMatrix, DVector};

use crate::config::Settings;
use crate::domain::{Coefficient, EstimatorKind, FitStats, ModelSpec};
use crate::error::FitFailure;

use super::design::Design;
use super::{ols, ridge, rlm};

/// Estimates and statistics for one design, before they are tied to a spec.
#[derive(Debug, Clone)]
pub struct Fitted {
    pub coefficients: Vec<Coefficient>,
    pub stats: FitStats,
}

/// A configured estimator, ready to run on a design.
#[derive(Debug, Clone)]
pub enum Estimator {
    Ols,
    RidgeCv { alphas: Vec<f64>, standardize: bool },
    Rlm { tuning: f64, max_iter: usize, tol: f64 },
}

impl Estimator {
    pub fn for_spec(spec: &ModelSpec, settings: &Settings) -> Estimator {
        match spec.estimator {
            EstimatorKind::Ols => Estimator::Ols,
            EstimatorKind::RidgeCv => Estimator::RidgeCv {
                alphas: settings.ridge_alphas(),
                standardize: spec.standardize,
            },
            EstimatorKind::Rlm => Estimator::Rlm {
                tuning: rlm::HUBER_T,
                max_iter: rlm::MAX_ITER,
                tol: rlm::TOL,
            },
        }
    }

    pub fn fit(&self, spec: &ModelSpec, design: &Design) -> Result<Fitted, FitFailure> {
        let y_mean = design.y.mean();
        if design.y.iter().all(|v| (v - y_mean).abs() <= f64::EPSILON * y_mean.abs().max(1.0)) {
            return Err(FitFailure::Degenerate("dependent variable is constant"));
        }
        let fitted = match self {
            Estimator::Ols => ols::fit(design, spec.se)?,
            Estimator::RidgeCv { alphas, standardize } => ridge::fit(design, alphas, *standardize)?,
            Estimator::Rlm { tuning, max_iter, tol } => rlm::fit(design, *tuning, *max_iter, *tol)?,
        };
        let all_finite = fitted.coefficients.iter().all(|c| c.estimate.is_finite());
        if !all_finite {
            return Err(FitFailure::NonFinite);
        }
        Ok(fitted)
    }
}

/// Pair each term with its estimate; standard errors come from the diagonal
/// of `cov` when one is given.
pub(crate) fn build_coefficients(
    terms: &[String],
    beta: &DVector<f64>,
    cov: Option<&DMatrix<f64>>,
    p_value: impl Fn(f64) -> Option<f64>,
) -> Vec<Coefficient> {
    terms
        .iter()
        .enumerate()
        .map(|(j, term)| {
            let estimate = beta[j];
            let std_error = cov
                .map(|c| c[(j, j)])
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(f64::sqrt);
            let t_value = std_error
                .filter(|se| *se > 0.0)
                .map(|se| estimate / se)
                .filter(|t| t.is_finite());
            Coefficient {
                term: term.clone(),
                estimate,
                std_error,
                t_value,
                p_value: t_value.and_then(&p_value),
            }
        })
        .collect()
}

/// Sum of squared deviations from the mean.
pub(crate) fn total_sum_of_squares(y: &DVector<f64>) -> f64 {
    let m = y.mean();
    y.iter().map(|v| (v - m).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SePolicy;

    fn spec(estimator: EstimatorKind) -> ModelSpec {
        ModelSpec {
            id: "T".into(),
            label: "t".into(),
            estimator,
            dependent: "y".into(),
            regressors: vec!["x".into()],
            se: SePolicy::Hc1,
            standardize: false,
        }
    }

    #[test]
    fn constant_dependent_is_degenerate() {
        let design = Design {
            terms: vec!["x".into(), "const".into()],
            x: DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0, 1.0]),
            y: DVector::from_element(4, 0.3),
        };
        let err = Estimator::Ols.fit(&spec(EstimatorKind::Ols), &design).unwrap_err();
        assert!(matches!(err, FitFailure::Degenerate(_)));
    }

    #[test]
    fn coefficient_builder_leaves_se_blank_without_covariance() {
        let terms = vec!["x".to_string()];
        let beta = DVector::from_row_slice(&[0.5]);
        let coefs = build_coefficients(&terms, &beta, None, |_| Some(0.0));
        assert_eq!(coefs[0].std_error, None);
        assert_eq!(coefs[0].t_value, None);
        assert_eq!(coefs[0].p_value, None);
    }

    #[test]
    fn coefficient_builder_reports_t_statistic() {
        let terms = vec!["x".to_string()];
        let beta = DVector::from_row_slice(&[0.6]);
        let cov = DMatrix::from_row_slice(1, 1, &[0.04]);
        let coefs = build_coefficients(&terms, &beta, Some(&cov), |t| Some(t / 100.0));
        assert!((coefs[0].std_error.unwrap() - 0.2).abs() < 1e-12);
        assert!((coefs[0].t_value.unwrap() - 3.0).abs() < 1e-12);
        assert!((coefs[0].p_value.unwrap() - 0.03).abs() < 1e-12);
    }

    #[test]
    fn ridge_estimator_uses_settings_grid() {
        let settings = Settings::default();
        let mut s = spec(EstimatorKind::RidgeCv);
        s.standardize = true;
        match Estimator::for_spec(&s, &settings) {
            Estimator::RidgeCv { alphas, standardize } => {
                assert_eq!(alphas.len(), settings.ridge_alpha_count);
                assert!(standardize);
            }
            other => panic!("unexpected estimator {other:?}"),
        }
    }
}
