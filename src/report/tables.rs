//! Diagnostic table exports: descriptive statistics, missing audit, VIF.

use tracing::info;

use crate::error::ExportError;
use crate::fit::{Descriptive, MissingCount, Vif};
use crate::io::RunDir;
use crate::io::export::{write_rows_csv, write_text};

use super::latex::simple_table;

fn cell(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{x:.decimals$}")).unwrap_or_default()
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// `descriptive_stats.csv` and `descriptive_stats.tex`.
pub fn export_descriptive(dir: &RunDir, stats: &[Descriptive]) -> Result<(), ExportError> {
    const COLUMNS: [&str; 9] = ["variable", "N", "mean", "std", "min", "p25", "p50", "p75", "max"];
    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|d| {
            let mut row = vec![d.variable.clone(), d.n.to_string()];
            row.extend([d.mean, d.std, d.min, d.p25, d.p50, d.p75, d.max].map(|v| cell(v, 4)));
            row
        })
        .collect();

    write_rows_csv(&dir.table("descriptive_stats.csv"), &header(&COLUMNS), rows.clone())?;
    write_text(
        &dir.table("descriptive_stats.tex"),
        &simple_table("Descriptive Statistics", "tab:desc_stats", &COLUMNS, &rows),
    )?;
    info!(variables = stats.len(), "descriptive statistics saved");
    Ok(())
}

/// `missing_values.csv`.
pub fn export_missing(dir: &RunDir, audit: &[MissingCount]) -> Result<(), ExportError> {
    let rows = audit.iter().map(|m| {
        vec![
            m.column.clone(),
            m.missing_count.to_string(),
            format!("{:.2}", m.missing_pct),
        ]
    });
    write_rows_csv(
        &dir.table("missing_values.csv"),
        &header(&["column", "missing_count", "missing_pct"]),
        rows,
    )?;
    info!(columns = audit.len(), "missing-value audit saved");
    Ok(())
}

/// `vif_diagnostics.csv` and `.tex`; with no complete rows only a CSV
/// holding a comment line is written.
pub fn export_vif(dir: &RunDir, vifs: &[Vif]) -> Result<(), ExportError> {
    let csv_path = dir.table("vif_diagnostics.csv");
    if vifs.is_empty() {
        return write_text(&csv_path, "# No data available for VIF computation.\n");
    }
    const COLUMNS: [&str; 3] = ["feature", "VIF", "flagged"];
    let rows: Vec<Vec<String>> = vifs
        .iter()
        .map(|v| vec![v.feature.clone(), format!("{:.2}", v.vif), v.flagged.to_string()])
        .collect();
    write_rows_csv(&csv_path, &header(&COLUMNS), rows.clone())?;

    let tex_rows: Vec<Vec<String>> = vifs
        .iter()
        .map(|v| {
            vec![
                v.feature.clone(),
                format!("{:.4}", v.vif),
                if v.flagged { "Yes".to_string() } else { String::new() },
            ]
        })
        .collect();
    write_text(
        &dir.table("vif_diagnostics.tex"),
        &simple_table("Variance Inflation Factors", "tab:vif", &COLUMNS, &tex_rows),
    )?;
    info!(features = vifs.len(), "VIF diagnostics saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vif_export_writes_csv_and_tex() {
        let out = tempfile::tempdir().unwrap();
        let dir = RunDir::create(out.path(), "r").unwrap();
        let vifs = vec![
            Vif { feature: "head_age".into(), vif: 6.5, flagged: true },
            Vif { feature: "num_houses".into(), vif: 1.25, flagged: false },
        ];
        export_vif(&dir, &vifs).unwrap();
        let csv = std::fs::read_to_string(dir.table("vif_diagnostics.csv")).unwrap();
        assert_eq!(csv, "feature,VIF,flagged\nhead_age,6.50,true\nnum_houses,1.25,false\n");
        let tex = std::fs::read_to_string(dir.table("vif_diagnostics.tex")).unwrap();
        assert!(tex.contains(r"head\_age & 6.5000 & Yes \\"));
    }

    #[test]
    fn empty_vif_writes_placeholder() {
        let out = tempfile::tempdir().unwrap();
        let dir = RunDir::create(out.path(), "r").unwrap();
        export_vif(&dir, &[]).unwrap();
        let csv = std::fs::read_to_string(dir.table("vif_diagnostics.csv")).unwrap();
        assert!(csv.starts_with("# No data"));
        assert!(!dir.table("vif_diagnostics.tex").exists());
    }

    #[test]
    fn descriptive_export_leaves_undefined_stats_blank() {
        let out = tempfile::tempdir().unwrap();
        let dir = RunDir::create(out.path(), "r").unwrap();
        let stats = vec![Descriptive {
            variable: "x".into(),
            n: 1,
            mean: Some(2.0),
            std: None,
            min: Some(2.0),
            p25: Some(2.0),
            p50: Some(2.0),
            p75: Some(2.0),
            max: Some(2.0),
        }];
        export_descriptive(&dir, &stats).unwrap();
        let csv = std::fs::read_to_string(dir.table("descriptive_stats.csv")).unwrap();
        assert_eq!(csv.lines().nth(1), Some("x,1,2.0000,,2.0000,2.0000,2.0000,2.0000,2.0000"));
    }
}
