//! Run model specs against the analysis table.
//!
//! A `FitError` is local to one spec: `run_all` records it and moves on.
//! A `ConfigurationError` means the battery and the table disagree, so the
//! whole batch stops.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::domain::{ModelResult, ModelSpec, Table};
use crate::error::{ConfigurationError, FitError, RunError};

use super::design::Design;
use super::estimator::Estimator;

/// Outcome of running a battery: one entry per spec, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Batch {
    pub results: Vec<ModelResult>,
    pub failures: Vec<FitError>,
}

impl Batch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fit one spec. Does not mutate `table`.
pub fn run(spec: &ModelSpec, table: &Table, settings: &Settings) -> Result<ModelResult, RunError> {
    let design = Design::build(spec, table)?;
    let fitted = Estimator::for_spec(spec, settings)
        .fit(spec, &design)
        .map_err(|failure| FitError {
            spec_id: spec.id.clone(),
            failure,
        })?;
    Ok(ModelResult {
        spec: spec.clone(),
        coefficients: fitted.coefficients,
        stats: fitted.stats,
    })
}

/// Fit every spec in order.
pub fn run_all(
    specs: &[ModelSpec],
    table: &Table,
    settings: &Settings,
) -> Result<Batch, ConfigurationError> {
    let mut batch = Batch::default();
    for spec in specs {
        match run(spec, table, settings) {
            Ok(result) => {
                info!(
                    model = %spec.id,
                    estimator = spec.estimator.display_name(),
                    n = result.stats.n_obs,
                    r2 = result.stats.r_squared,
                    "model fitted"
                );
                batch.results.push(result);
            }
            Err(RunError::Fit(err)) => {
                warn!(model = %spec.id, reason = %err.failure, "model failed");
                batch.failures.push(err);
            }
            Err(RunError::Configuration(err)) => return Err(err),
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EstimatorKind, SePolicy};
    use crate::error::FitFailure;

    fn spec(id: &str, estimator: EstimatorKind, regressors: &[&str]) -> ModelSpec {
        ModelSpec {
            id: id.into(),
            label: id.into(),
            estimator,
            dependent: "y".into(),
            regressors: regressors.iter().map(|s| s.to_string()).collect(),
            se: match estimator {
                EstimatorKind::Ols => SePolicy::Hc1,
                EstimatorKind::RidgeCv => SePolicy::None,
                EstimatorKind::Rlm => SePolicy::Huber,
            },
            standardize: estimator == EstimatorKind::RidgeCv,
        }
    }

    fn table() -> Table {
        let a: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..12).map(|i| ((i * 7) % 5) as f64).collect();
        let doubled: Vec<f64> = a.iter().map(|v| 2.0 * v).collect();
        let noise = [0.3, -0.2, 0.1, 0.0, -0.4, 0.2, 0.1, -0.1, 0.3, -0.3, 0.2, -0.2];
        let y: Vec<f64> = (0..12).map(|i| 0.5 + 0.4 * a[i] - 0.2 * b[i] + noise[i]).collect();
        Table::from_dense(vec![("y", y), ("a", a), ("b", b), ("a2", doubled)])
    }

    #[test]
    fn collinear_model_fails_without_stopping_the_batch() {
        let specs = vec![
            spec("M1", EstimatorKind::Ols, &["a", "a2"]),
            spec("M2", EstimatorKind::Ols, &["a", "b"]),
            spec("M3", EstimatorKind::RidgeCv, &["a", "b"]),
            spec("M5", EstimatorKind::Rlm, &["a", "b"]),
        ];
        let batch = run_all(&specs, &table(), &Settings::default()).unwrap();
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].spec_id, "M1");
        assert!(matches!(batch.failures[0].failure, FitFailure::RankDeficient { .. }));
        let ids: Vec<&str> = batch.results.iter().map(|r| r.spec.id.as_str()).collect();
        assert_eq!(ids, vec!["M2", "M3", "M5"]);
        assert!(!batch.is_complete());
    }

    #[test]
    fn missing_regressor_aborts_the_batch() {
        let specs = vec![
            spec("M1", EstimatorKind::Ols, &["a"]),
            spec("M2", EstimatorKind::Ols, &["nope"]),
        ];
        let err = run_all(&specs, &table(), &Settings::default()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingColumn {
                spec_id: "M2".into(),
                column: "nope".into()
            }
        );
    }

    #[test]
    fn run_is_deterministic() {
        let s = spec("M2", EstimatorKind::Ols, &["a", "b"]);
        let t = table();
        let first = run(&s, &t, &Settings::default()).unwrap();
        let second = run(&s, &t, &Settings::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.coefficients.last().map(|c| c.term.as_str()), Some("const"));
    }
}
