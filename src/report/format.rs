//! Formatted terminal output.
//!
//! Formatting lives in one place so estimation code stays free of
//! presentation concerns and output changes stay localized.

use crate::error::FitError;
use crate::fit::Batch;
use crate::models::KEY_REGRESSOR;
use crate::validate::{RuleStatus, ValidationReport};

use super::latex::stars;

/// Run summary: sample sizes, then one line per model with the key
/// coefficient, then any failed models.
pub fn format_run_summary(run_id: &str, analysis_rows: usize, batch: &Batch) -> String {
    let mut out = String::new();
    out.push_str("=== chfs - siblings and household debt ===\n");
    out.push_str(&format!("Run: {run_id}\n"));
    out.push_str(&format!("Analysis sample: n={analysis_rows}\n"));

    out.push_str("\nModels:\n");
    out.push_str(&format!(
        "{:<4} {:<8} {:<26} {:>6} {:>8} {:>14} {:>10}\n",
        "id", "est", "dependent", "N", "R2", KEY_REGRESSOR, "se"
    ));
    for r in &batch.results {
        let key = r.coefficient(KEY_REGRESSOR);
        let estimate = key
            .map(|c| format!("{:.4}{}", c.estimate, stars(c.p_value)))
            .unwrap_or_default();
        let se = key
            .and_then(|c| c.std_error)
            .map(|s| format!("({s:.4})"))
            .unwrap_or_default();
        out.push_str(
            format!(
                "{:<4} {:<8} {:<26} {:>6} {:>8.4} {:>14} {:>10}\n",
                r.spec.id,
                r.spec.estimator.display_name(),
                truncate(&r.spec.dependent, 26),
                r.stats.n_obs,
                r.stats.r_squared,
                estimate,
                se
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if !batch.failures.is_empty() {
        out.push_str("\nFailed models:\n");
        out.push_str(&format_failures(&batch.failures));
    }
    out
}

fn format_failures(failures: &[FitError]) -> String {
    failures
        .iter()
        .map(|f| format!("  {}: {}\n", f.spec_id, f.failure))
        .collect()
}

/// One line per finding under a one-line summary. Absent optional columns
/// are collapsed into a single count line.
pub fn format_validation(report: &ValidationReport) -> String {
    let mut out = format!("{}\n", report.summary());
    let mut absent = 0usize;
    for outcome in &report.outcomes {
        match outcome.status {
            RuleStatus::Pass => {}
            RuleStatus::Absent => absent += 1,
            RuleStatus::Fail => {
                for f in &outcome.findings {
                    out.push_str(&format!(
                        "  {:<28} {:<8} {:<22} {:>7} rows  {}\n",
                        outcome.column,
                        format!("{:?}", f.severity).to_lowercase(),
                        f.check.code(),
                        f.count,
                        f.detail
                    ));
                }
            }
        }
    }
    if absent > 0 {
        out.push_str(&format!("  {absent} optional column(s) absent\n"));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coefficient, EstimatorKind, FitStats, ModelResult, ModelSpec, SePolicy};
    use crate::domain::Table;
    use crate::error::FitFailure;
    use crate::validate::{ColumnRule, DType, Schema, validate};

    #[test]
    fn summary_lists_models_and_failures() {
        let result = ModelResult {
            spec: ModelSpec {
                id: "M1".into(),
                label: "ols".into(),
                estimator: EstimatorKind::Ols,
                dependent: "debt_ratio_winsorized".into(),
                regressors: vec![KEY_REGRESSOR.into()],
                se: SePolicy::Hc1,
                standardize: false,
            },
            coefficients: vec![Coefficient {
                term: KEY_REGRESSOR.into(),
                estimate: 0.0123,
                std_error: Some(0.004),
                t_value: Some(3.075),
                p_value: Some(0.002),
            }],
            stats: FitStats {
                n_obs: 950,
                r_squared: 0.05,
                adj_r_squared: Some(0.04),
                aic: None,
                bic: None,
                alpha: None,
            },
        };
        let batch = Batch {
            results: vec![result],
            failures: vec![FitError {
                spec_id: "M2".into(),
                failure: FitFailure::RankDeficient { rank: 8, columns: 10 },
            }],
        };
        let text = format_run_summary("run-1", 950, &batch);
        assert!(text.contains("Run: run-1"));
        assert!(text.contains("0.0123***"));
        assert!(text.contains("(0.0040)"));
        assert!(text.contains("M2: design matrix is rank deficient"));
        assert!(text.lines().all(|l| l == l.trim_end()));
    }

    #[test]
    fn absent_optional_columns_collapse_to_one_line() {
        let schema = Schema::new(
            "input",
            vec![
                ColumnRule::new("age", "Age", DType::Float).range(16.0, 120.0),
                ColumnRule::new("c1", "Amount", DType::Float).optional(),
                ColumnRule::new("c2", "Amount", DType::Float).optional(),
                ColumnRule::new("c3", "Amount", DType::Float).optional(),
            ],
        )
        .unwrap();
        let table = Table::from_dense(vec![("age", vec![30.0, 150.0])]);
        let text = format_validation(&validate(&table, &schema, 80.0));

        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("3 optional column(s) absent"));
        assert!(!text.contains("c1"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("age") && l.contains("1 rows")));
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
