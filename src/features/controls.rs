//! Control variables and the final column selection.

use tracing::warn;

use crate::data::variables::household;
use crate::domain::Table;

/// Marital codes counted as married (first marriage, remarried, cohabiting).
const MARRIED_CODES: [f64; 3] = [2.0, 3.0, 7.0];

/// Column order of the analysis table.
pub const ANALYSIS_COLUMNS: [&str; 15] = [
    "hhid",
    "head_siblings",
    "debt_ratio",
    "debt_ratio_winsorized",
    "log_debt_ratio_winsorized",
    "total_debt",
    "total_assets",
    "head_age",
    "head_is_male",
    "head_educ",
    "head_is_married",
    "head_health",
    "has_business",
    "num_houses",
    "log_total_assets",
];

/// 1/0 indicator of `pred`; a missing source stays missing.
fn indicator(table: &Table, source: &str, target: &str, pred: impl Fn(f64) -> bool) -> Vec<Option<f64>> {
    match table.column(source) {
        Some(values) => values
            .iter()
            .map(|v| v.map(|x| if pred(x) { 1.0 } else { 0.0 }))
            .collect(),
        None => {
            warn!(source, target, "source column absent, control set to missing");
            vec![None; table.n_rows()]
        }
    }
}

/// Derive head and household controls from the merged table.
pub fn build_controls(table: &Table) -> Table {
    let mut out = table.clone();
    out.set_column(
        "head_is_male",
        indicator(table, "head_sex", "head_is_male", |v| v == 1.0),
    );
    out.set_column(
        "head_is_married",
        indicator(table, "head_marital", "head_is_married", |v| MARRIED_CODES.contains(&v)),
    );
    out.set_column(
        "has_business",
        indicator(table, household::HAS_BUSINESS, "has_business", |v| v == 1.0),
    );

    if !table.has_column(household::NUM_HOUSES) {
        warn!(source = household::NUM_HOUSES, "source column absent, num_houses set to 0");
    }
    let houses = table
        .column_or_missing(household::NUM_HOUSES)
        .into_iter()
        .map(|v| Some(v.unwrap_or(0.0)))
        .collect();
    out.set_column("num_houses", houses);

    let log_assets = table
        .column_or_missing("total_assets")
        .into_iter()
        .map(|v| v.map(|a| a + 1.0).filter(|a| *a > 0.0).map(f64::ln))
        .collect();
    out.set_column("log_total_assets", log_assets);
    out
}

/// Project onto `ANALYSIS_COLUMNS`; absent columns are logged and skipped.
pub fn select_analysis(table: &Table) -> Table {
    let missing: Vec<&str> = ANALYSIS_COLUMNS
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "analysis columns absent, excluded");
    }
    table.select(&ANALYSIS_COLUMNS)
}
