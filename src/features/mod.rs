//! Feature pipeline: admitted raw table → AnalysisTable.
//!
//! Every step is a pure function of its input table, so running the pipeline
//! twice on the same input yields identical output.

pub mod amounts;
pub mod controls;
pub mod ratio;

use serde::Serialize;
use tracing::info;

use crate::config::Settings;
use crate::data::variables::household;
use crate::domain::Table;
use crate::error::FeatureError;

pub use amounts::{coalesce_all, coalesce_var, compute_totals};
pub use controls::{ANALYSIS_COLUMNS, build_controls, select_analysis};
pub use ratio::{WinsorBounds, compute_debt_ratio, log_transform, winsorize};

#[derive(Debug, Clone)]
pub struct FeatureOutput {
    pub table: Table,
    pub stats: FeatureStats,
}

/// Sample bookkeeping recorded in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureStats {
    pub input_rows: usize,
    pub dropped_nonpositive_assets: usize,
    pub winsor_bounds: WinsorBounds,
}

pub fn build_analysis_table(raw: &Table, settings: &Settings) -> Result<FeatureOutput, FeatureError> {
    if !raw.has_column(household::ID) {
        return Err(FeatureError::MissingColumn {
            step: "build_analysis_table",
            column: household::ID.to_string(),
        });
    }
    let coalesced = coalesce_all(raw, settings.top_bin_multiplier);
    let totals = compute_totals(&coalesced, settings.top_bin_multiplier);
    let (with_ratio, dropped) = compute_debt_ratio(&totals)?;
    let (winsorized, bounds) = winsorize(&with_ratio, settings.winsor_lower, settings.winsor_upper)?;
    let logged = log_transform(&winsorized, settings.log_offset)?;
    let table = select_analysis(&build_controls(&logged));

    info!(
        rows = table.n_rows(),
        cols = table.n_cols(),
        dropped_nonpositive_assets = dropped,
        "analysis table built"
    );
    Ok(FeatureOutput {
        table,
        stats: FeatureStats {
            input_rows: raw.n_rows(),
            dropped_nonpositive_assets: dropped,
            winsor_bounds: bounds,
        },
    })
}
