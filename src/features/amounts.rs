//! Exact/interval coalescing and household totals.

use tracing::info;

use crate::data::midpoint;
use crate::data::variables::{VarSpec, asset_vars, debt_vars, vehicle_in_business};
use crate::domain::Table;

/// Exact amount where reported, else the midpoint of the interval code.
/// Absent columns read as all-missing.
pub fn coalesce_var(table: &Table, spec: &VarSpec, top_bin_multiplier: f64) -> Vec<Option<f64>> {
    let exact = table.column_or_missing(&spec.exact);
    let codes = spec
        .interval
        .as_deref()
        .map(|name| (name, table.column_or_missing(name)));
    exact
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.or_else(|| {
                let (name, codes) = codes.as_ref()?;
                midpoint::midpoint(name, codes[row]?, top_bin_multiplier)
            })
        })
        .collect()
}

/// Add a `<exact>_val` column for every debt and asset catalogue entry.
pub fn coalesce_all(table: &Table, top_bin_multiplier: f64) -> Table {
    let debts = debt_vars();
    let assets = asset_vars();
    let mut out = table.clone();
    for spec in debts.iter().chain(&assets) {
        out.set_column(spec.coalesced_name(), coalesce_var(table, spec, top_bin_multiplier));
    }
    info!(debts = debts.len(), assets = assets.len(), "coalesced exact and interval amounts");
    out
}

/// `total_debt` and `total_assets` from the coalesced columns; missing
/// components count as zero. The vehicle-in-business value is subtracted from
/// assets because it is also reported under business assets.
pub fn compute_totals(table: &Table, top_bin_multiplier: f64) -> Table {
    let n = table.n_rows();
    let sum_of = |specs: &[VarSpec]| -> Vec<f64> {
        let mut total = vec![0.0; n];
        for spec in specs {
            let values = table.column_or_missing(&spec.coalesced_name());
            for (acc, v) in total.iter_mut().zip(values) {
                *acc += v.unwrap_or(0.0);
            }
        }
        total
    };
    let debt = sum_of(&debt_vars());
    let gross_assets = sum_of(&asset_vars());
    let vib = coalesce_var(table, &vehicle_in_business(), top_bin_multiplier);

    let mut out = table.clone();
    out.set_column("total_debt", debt.into_iter().map(Some).collect());
    out.set_column(
        "total_assets",
        gross_assets
            .into_iter()
            .zip(vib)
            .map(|(a, v)| Some(a - v.unwrap_or(0.0)))
            .collect(),
    );
    out
}
