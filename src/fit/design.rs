//! Design matrix assembly for one model.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{INTERCEPT, ModelSpec, Table};
use crate::error::{ConfigurationError, FitError, FitFailure, RunError};

/// Complete-case design: regressors in declared order, then the intercept
/// column (`const`) last.
#[derive(Debug, Clone)]
pub struct Design {
    pub terms: Vec<String>,
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
}

impl Design {
    /// Select the model's columns, drop rows with any missing or non-finite
    /// value (listwise deletion), and require at least `regressors + 2` rows.
    pub fn build(spec: &ModelSpec, table: &Table) -> Result<Design, RunError> {
        let columns: Vec<&[Option<f64>]> = spec
            .columns()
            .map(|name| {
                table.column(name).ok_or_else(|| ConfigurationError::MissingColumn {
                    spec_id: spec.id.clone(),
                    column: name.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;

        let complete: Vec<usize> = (0..table.n_rows())
            .filter(|&row| {
                columns
                    .iter()
                    .all(|c| c[row].is_some_and(f64::is_finite))
            })
            .collect();

        let n = complete.len();
        let needed = spec.regressors.len() + 2;
        debug!(
            spec = %spec.id,
            rows = table.n_rows(),
            complete = n,
            "listwise deletion"
        );
        if n < needed {
            return Err(FitError {
                spec_id: spec.id.clone(),
                failure: FitFailure::InsufficientObservations { n, needed },
            }
            .into());
        }

        let k = spec.regressors.len() + 1;
        let Some((dependent, regressors)) = columns.split_first() else {
            return Err(FitError {
                spec_id: spec.id.clone(),
                failure: FitFailure::Degenerate("no dependent variable"),
            }
            .into());
        };
        let y = DVector::from_iterator(n, complete.iter().map(|&row| dependent[row].unwrap_or(0.0)));
        let x = DMatrix::from_fn(n, k, |i, j| {
            regressors
                .get(j)
                .and_then(|col| col[complete[i]])
                .unwrap_or(1.0)
        });

        let mut terms = spec.regressors.clone();
        terms.push(INTERCEPT.to_string());
        Ok(Design { terms, x, y })
    }

    pub fn n(&self) -> usize {
        self.x.nrows()
    }

    /// Number of parameters, intercept included.
    pub fn k(&self) -> usize {
        self.x.ncols()
    }
}
