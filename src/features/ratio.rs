//! Debt ratio, winsorization and log transform.

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::Table;
use crate::error::FeatureError;
use crate::math::stats;

/// Percentile clip limits applied to `debt_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinsorBounds {
    pub lower: f64,
    pub upper: f64,
}

fn required<'a>(table: &'a Table, step: &'static str, column: &str) -> Result<&'a [Option<f64>], FeatureError> {
    table.column(column).ok_or_else(|| FeatureError::MissingColumn {
        step,
        column: column.to_string(),
    })
}

/// Drop households with `total_assets <= 0` (or missing) and add
/// `debt_ratio = total_debt / total_assets`. Returns the table and the
/// number of dropped rows.
pub fn compute_debt_ratio(table: &Table) -> Result<(Table, usize), FeatureError> {
    const STEP: &str = "compute_debt_ratio";
    let debt = required(table, STEP, "total_debt")?;
    let assets = required(table, STEP, "total_assets")?;

    let keep: Vec<bool> = assets.iter().map(|a| a.is_some_and(|a| a > 0.0)).collect();
    let ratio: Vec<Option<f64>> = debt
        .iter()
        .zip(assets)
        .map(|(d, a)| Some(d.unwrap_or(0.0) / (*a)?))
        .collect();

    let mut with_ratio = table.clone();
    with_ratio.set_column("debt_ratio", ratio);
    let out = with_ratio.filter_rows(&keep);
    let dropped = table.n_rows() - out.n_rows();
    if dropped > 0 {
        warn!(dropped, "dropped households with non-positive total assets");
    }
    if out.n_rows() == 0 {
        return Err(FeatureError::EmptySample { step: STEP });
    }
    Ok((out, dropped))
}

/// Clip `debt_ratio` at its `lower`/`upper` percentiles into
/// `debt_ratio_winsorized`. Bounds are recomputed from this sample.
pub fn winsorize(table: &Table, lower: f64, upper: f64) -> Result<(Table, WinsorBounds), FeatureError> {
    const STEP: &str = "winsorize";
    let ratio = required(table, STEP, "debt_ratio")?;
    let sorted = stats::sorted_finite(ratio.iter().flatten().copied());
    let (Some(lo), Some(hi)) = (stats::percentile(&sorted, lower), stats::percentile(&sorted, upper)) else {
        return Err(FeatureError::EmptySample { step: STEP });
    };

    let clipped = ratio
        .iter()
        .map(|v| v.filter(|x| x.is_finite()).map(|x| x.clamp(lo, hi)))
        .collect();
    let mut out = table.clone();
    out.set_column("debt_ratio_winsorized", clipped);
    info!(lower = lo, upper = hi, n = sorted.len(), "winsorized debt ratio");
    Ok((out, WinsorBounds { lower: lo, upper: hi }))
}

/// `log_debt_ratio_winsorized = ln(offset + debt_ratio_winsorized)`;
/// non-positive arguments give a missing value.
pub fn log_transform(table: &Table, offset: f64) -> Result<Table, FeatureError> {
    let w = required(table, "log_transform", "debt_ratio_winsorized")?;
    let logged = w
        .iter()
        .map(|v| v.map(|x| x + offset).filter(|x| *x > 0.0).map(f64::ln))
        .collect();
    let mut out = table.clone();
    out.set_column("log_debt_ratio_winsorized", logged);
    Ok(out)
}
