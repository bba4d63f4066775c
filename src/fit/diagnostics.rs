//! Sample diagnostics exported next to the regression table: descriptive
//! statistics, a missing-value audit and variance inflation factors.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::Table;
use crate::error::FitFailure;
use crate::math::{solve_least_squares, stats};

/// One row of the descriptive statistics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptive {
    pub variable: String,
    pub n: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Count, mean, sample std (ddof 1), min, quartiles, max of every listed
/// column present in `table`. Missing and non-finite cells are skipped.
pub fn describe(table: &Table, columns: &[&str]) -> Vec<Descriptive> {
    columns
        .iter()
        .filter_map(|name| {
            let values = table.column(name)?;
            let sorted = stats::sorted_finite(values.iter().flatten().copied());
            Some(Descriptive {
                variable: name.to_string(),
                n: sorted.len(),
                mean: stats::mean(&sorted),
                std: stats::std_dev(&sorted, 1),
                min: sorted.first().copied(),
                p25: stats::percentile(&sorted, 0.25),
                p50: stats::percentile(&sorted, 0.50),
                p75: stats::percentile(&sorted, 0.75),
                max: sorted.last().copied(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing_count: usize,
    /// Percent of rows, rounded to two decimals.
    pub missing_pct: f64,
}

/// Columns with at least one missing cell, most-missing first.
pub fn missing_audit(table: &Table) -> Vec<MissingCount> {
    let n = table.n_rows();
    let mut out: Vec<MissingCount> = table
        .columns()
        .iter()
        .filter_map(|col| {
            let missing = col.values.iter().filter(|v| v.is_none()).count();
            (missing > 0).then(|| MissingCount {
                column: col.name.clone(),
                missing_count: missing,
                missing_pct: (missing as f64 / n as f64 * 10_000.0).round() / 100.0,
            })
        })
        .collect();
    // Stable: equal counts keep column order.
    out.sort_by(|a, b| b.missing_count.cmp(&a.missing_count));
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vif {
    pub feature: String,
    pub vif: f64,
    pub flagged: bool,
}

/// Variance inflation factor of each column on the complete-case subset:
/// regress it on the others plus an intercept, `VIF = 1 / (1 − R²)`.
/// Sorted descending; a perfectly explained column reports `inf`.
/// Returns an empty list when no complete rows remain.
pub fn vif(table: &Table, columns: &[&str], threshold: f64) -> Vec<Vif> {
    let cols: Vec<&[Option<f64>]> = columns.iter().filter_map(|c| table.column(c)).collect();
    if cols.len() != columns.len() || cols.is_empty() {
        warn!("VIF skipped: a listed column is absent");
        return Vec::new();
    }
    let rows: Vec<usize> = (0..table.n_rows())
        .filter(|&r| cols.iter().all(|c| c[r].is_some_and(f64::is_finite)))
        .collect();
    if rows.is_empty() {
        warn!("VIF skipped: no complete observations");
        return Vec::new();
    }

    let p = cols.len();
    let data = DMatrix::from_fn(rows.len(), p, |i, j| cols[j][rows[i]].unwrap_or(0.0));

    let mut out: Vec<Vif> = (0..p)
        .map(|j| {
            let value = single_vif(&data, j).unwrap_or(f64::INFINITY);
            Vif {
                feature: columns[j].to_string(),
                vif: value,
                flagged: value > threshold,
            }
        })
        .collect();
    out.sort_by(|a, b| b.vif.total_cmp(&a.vif));

    let flagged: Vec<&str> = out.iter().filter(|v| v.flagged).map(|v| v.feature.as_str()).collect();
    if flagged.is_empty() {
        info!(threshold, "no VIF exceeds threshold");
    } else {
        warn!(threshold, ?flagged, "VIF above threshold");
    }
    out
}

fn single_vif(data: &DMatrix<f64>, j: usize) -> Result<f64, FitFailure> {
    let n = data.nrows();
    let others: Vec<usize> = (0..data.ncols()).filter(|&c| c != j).collect();
    let x = DMatrix::from_fn(n, others.len() + 1, |i, c| {
        others.get(c).map_or(1.0, |&col| data[(i, col)])
    });
    let y: DVector<f64> = data.column(j).into_owned();
    let ls = solve_least_squares(&x, &y)?;
    let ssr = (&y - &x * &ls.beta).norm_squared();
    let mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if tss == 0.0 {
        return Err(FitFailure::Degenerate("constant column"));
    }
    let r2 = 1.0 - ssr / tss;
    Ok(1.0 / (1.0 - r2))
}
