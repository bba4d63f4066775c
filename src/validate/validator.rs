//! Validation engine.
//!
//! `validate` checks every rule of a schema against a table and counts all
//! violations (it never fails fast), so one report surfaces every problem.
//! The table is never mutated; `ValidationReport::admit` returns a copy with
//! quarantined rows removed.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::Table;
use crate::error::ValidationError;
use crate::validate::schema::{ColumnRule, Presence, Schema};

/// Offending values kept per finding.
const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Check {
    MissingColumn,
    NonIntegral,
    NotNullable,
    HighMissing,
    BelowMin,
    AboveMax,
    InvalidValues,
    InfiniteValues,
}

impl Check {
    pub fn code(self) -> &'static str {
        match self {
            Check::MissingColumn => "MISSING_COLUMN",
            Check::NonIntegral => "NON_INTEGRAL",
            Check::NotNullable => "NOT_NULLABLE",
            Check::HighMissing => "HIGH_MISSING",
            Check::BelowMin => "BELOW_MIN",
            Check::AboveMax => "ABOVE_MAX",
            Check::InvalidValues => "INVALID_VALUES",
            Check::InfiniteValues => "INFINITE_VALUES",
        }
    }

    /// Row-level checks name offending rows; the rest describe the column.
    fn is_row_level(self) -> bool {
        !matches!(self, Check::MissingColumn | Check::HighMissing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Pass,
    Fail,
    /// Optional column not present in the table.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub check: Check,
    pub severity: Severity,
    /// Violating rows (or missing cells for `HIGH_MISSING`).
    pub count: usize,
    pub examples: Vec<f64>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub column: String,
    pub critical: bool,
    pub status: RuleStatus,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub gate: String,
    pub rows_checked: usize,
    pub columns_checked: usize,
    pub outcomes: Vec<RuleOutcome>,
    /// Rows with at least one row-level violation.
    #[serde(serialize_with = "serialize_len")]
    #[serde(rename = "rows_quarantined")]
    quarantined: BTreeSet<usize>,
}

fn serialize_len<S: serde::Serializer>(set: &BTreeSet<usize>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(set.len() as u64)
}

impl ValidationReport {
    fn findings(&self) -> impl Iterator<Item = (&RuleOutcome, &Finding)> {
        self.outcomes
            .iter()
            .flat_map(|o| o.findings.iter().map(move |f| (o, f)))
    }

    pub fn error_count(&self) -> usize {
        self.findings().filter(|(_, f)| f.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings().filter(|(_, f)| f.severity == Severity::Warning).count()
    }

    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn quarantined_rows(&self) -> usize {
        self.quarantined.len()
    }

    pub fn outcome(&self, column: &str) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.column == column)
    }

    /// `Err` naming every critical finding.
    pub fn ensure_no_critical(&self) -> Result<(), ValidationError> {
        let failures: Vec<String> = self
            .findings()
            .filter(|(_, f)| f.severity == Severity::Error)
            .map(|(o, f)| format!("{}: {} ({} rows)", o.column, f.check.code(), f.count))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                gate: self.gate.clone(),
                failures,
            })
        }
    }

    /// Copy of `table` without quarantined rows.
    ///
    /// `table` must be the table this report was produced from.
    pub fn admit(&self, table: &Table) -> Table {
        if self.quarantined.is_empty() {
            return table.clone();
        }
        let keep: Vec<bool> = (0..table.n_rows())
            .map(|row| !self.quarantined.contains(&row))
            .collect();
        warn!(
            gate = %self.gate,
            quarantined = self.quarantined.len(),
            "quarantined rows with rule violations"
        );
        table.filter_rows(&keep)
    }

    pub fn summary(&self) -> String {
        let status = if self.is_valid() { "PASS" } else { "FAIL" };
        format!(
            "{} validation {status}: {} rows, {} columns checked. {} errors, {} warnings, {} rows quarantined.",
            self.gate,
            self.rows_checked,
            self.columns_checked,
            self.error_count(),
            self.warning_count(),
            self.quarantined.len(),
        )
    }
}

/// Check `table` against every rule of `schema`.
///
/// `high_missing_pct` is the null share (percent) above which a nullable
/// column draws a `HIGH_MISSING` warning.
pub fn validate(table: &Table, schema: &Schema, high_missing_pct: f64) -> ValidationReport {
    let mut quarantined = BTreeSet::new();
    let outcomes: Vec<RuleOutcome> = schema
        .rules()
        .iter()
        .map(|rule| check_rule(table, rule, high_missing_pct, &mut quarantined))
        .collect();

    let report = ValidationReport {
        gate: schema.name().to_string(),
        rows_checked: table.n_rows(),
        columns_checked: schema.len(),
        outcomes,
        quarantined,
    };

    if report.is_valid() && report.warning_count() == 0 {
        info!("{}", report.summary());
    } else {
        warn!("{}", report.summary());
        for (outcome, finding) in report.findings() {
            match finding.severity {
                Severity::Error => error!(column = %outcome.column, check = finding.check.code(), "{}", finding.detail),
                Severity::Warning => warn!(column = %outcome.column, check = finding.check.code(), "{}", finding.detail),
            }
        }
    }
    report
}

/// Row-level violations collected for one check.
struct Hits {
    rows: Vec<usize>,
    examples: Vec<f64>,
}

impl Hits {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            examples: Vec::new(),
        }
    }

    fn record(&mut self, row: usize, value: Option<f64>) {
        self.rows.push(row);
        if let Some(v) = value {
            if self.examples.len() < MAX_EXAMPLES && !self.examples.contains(&v) {
                self.examples.push(v);
            }
        }
    }
}

fn check_rule(
    table: &Table,
    rule: &ColumnRule,
    high_missing_pct: f64,
    quarantined: &mut BTreeSet<usize>,
) -> RuleOutcome {
    let severity = if rule.critical { Severity::Error } else { Severity::Warning };

    let Some(values) = table.column(&rule.name) else {
        let (status, findings) = match rule.presence {
            Presence::Optional => (RuleStatus::Absent, Vec::new()),
            Presence::Required => (
                RuleStatus::Fail,
                vec![Finding {
                    check: Check::MissingColumn,
                    severity,
                    count: table.n_rows(),
                    examples: Vec::new(),
                    detail: "column not found in table".to_string(),
                }],
            ),
        };
        return RuleOutcome {
            column: rule.name.clone(),
            critical: rule.critical,
            status,
            findings,
        };
    };

    let mut nulls = Hits::new();
    let mut infinite = Hits::new();
    let mut non_integral = Hits::new();
    let mut below = Hits::new();
    let mut above = Hits::new();
    let mut invalid = Hits::new();

    for (row, cell) in values.iter().enumerate() {
        let v = match cell {
            Some(v) if !v.is_nan() => *v,
            _ => {
                nulls.record(row, None);
                continue;
            }
        };
        if v.is_infinite() {
            infinite.record(row, Some(v));
            continue;
        }
        if rule.dtype.is_integral() && v.fract() != 0.0 {
            non_integral.record(row, Some(v));
        }
        if rule.min.is_some_and(|min| v < min) {
            below.record(row, Some(v));
        }
        if rule.max.is_some_and(|max| v > max) {
            above.record(row, Some(v));
        }
        if rule.allowed.as_ref().is_some_and(|set| !set.contains(&v)) {
            invalid.record(row, Some(v));
        }
    }

    let mut findings = Vec::new();
    let mut row_finding = |check: Check, hits: Hits, detail: String, findings: &mut Vec<Finding>| {
        if hits.rows.is_empty() {
            return;
        }
        if check.is_row_level() {
            quarantined.extend(hits.rows.iter().copied());
        }
        findings.push(Finding {
            check,
            severity,
            count: hits.rows.len(),
            examples: hits.examples,
            detail,
        });
    };

    let n = table.n_rows();
    let null_count = nulls.rows.len();
    let null_pct = if n > 0 { null_count as f64 / n as f64 * 100.0 } else { 0.0 };
    if null_count > 0 && !rule.nullable {
        let detail = format!("{null_count} null values ({null_pct:.1}%) in non-nullable column");
        row_finding(Check::NotNullable, nulls, detail, &mut findings);
    } else if null_count > 0 && null_pct > high_missing_pct {
        findings.push(Finding {
            check: Check::HighMissing,
            severity: Severity::Warning,
            count: null_count,
            examples: Vec::new(),
            detail: format!("{null_count} null values ({null_pct:.1}%); may compromise analysis"),
        });
    }

    let detail = format!("{} values are not integers", non_integral.rows.len());
    row_finding(Check::NonIntegral, non_integral, detail, &mut findings);
    if let Some(min) = rule.min {
        let detail = format!("{} values below minimum {min}", below.rows.len());
        row_finding(Check::BelowMin, below, detail, &mut findings);
    }
    if let Some(max) = rule.max {
        let detail = format!("{} values above maximum {max}", above.rows.len());
        row_finding(Check::AboveMax, above, detail, &mut findings);
    }
    if let Some(set) = &rule.allowed {
        let detail = format!("{} values outside allowed set {set:?}", invalid.rows.len());
        row_finding(Check::InvalidValues, invalid, detail, &mut findings);
    }
    let detail = format!("{} infinite values", infinite.rows.len());
    row_finding(Check::InfiniteValues, infinite, detail, &mut findings);

    let status = if findings.iter().any(|f| f.check != Check::HighMissing) {
        RuleStatus::Fail
    } else {
        RuleStatus::Pass
    };

    RuleOutcome {
        column: rule.name.clone(),
        critical: rule.critical,
        status,
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::schema::DType;

    fn schema() -> Schema {
        Schema::new(
            "test",
            vec![
                ColumnRule::new("hhid", "id", DType::Int).not_null().critical(),
                ColumnRule::new("age", "age", DType::Float).range(16.0, 120.0),
                ColumnRule::new("male", "male", DType::Binary).allowed(&[0.0, 1.0]),
                ColumnRule::new("extra", "extra", DType::Float).optional(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn counts_every_violation_and_quarantines_rows() {
        let table = Table::from_columns(vec![
            ("hhid", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            ("age", vec![Some(10.0), Some(30.0), Some(150.0), Some(f64::INFINITY)]),
            ("male", vec![Some(1.0), Some(2.0), None, Some(0.0)]),
        ]);
        let report = validate(&table, &schema(), 80.0);

        assert!(report.is_valid());
        assert!(report.ensure_no_critical().is_ok());

        let age = report.outcome("age").unwrap();
        assert_eq!(age.status, RuleStatus::Fail);
        let checks: Vec<Check> = age.findings.iter().map(|f| f.check).collect();
        assert_eq!(checks, vec![Check::BelowMin, Check::AboveMax, Check::InfiniteValues]);
        assert!(age.findings.iter().all(|f| f.severity == Severity::Warning));

        let male = report.outcome("male").unwrap();
        assert_eq!(male.findings[0].check, Check::InvalidValues);
        assert_eq!(male.findings[0].examples, vec![2.0]);

        assert_eq!(report.outcome("extra").unwrap().status, RuleStatus::Absent);

        // Every row violates something.
        assert_eq!(report.quarantined_rows(), 4);
        assert_eq!(report.admit(&table).n_rows(), 0);
    }

    #[test]
    fn critical_violation_is_an_error() {
        let table = Table::from_columns(vec![
            ("hhid", vec![Some(1.0), None, Some(2.5)]),
            ("age", vec![Some(30.0), Some(31.0), Some(32.0)]),
            ("male", vec![Some(1.0), Some(0.0), Some(1.0)]),
        ]);
        let report = validate(&table, &schema(), 80.0);
        assert!(!report.is_valid());
        let err = report.ensure_no_critical().unwrap_err();
        assert_eq!(err.gate, "test");
        assert_eq!(
            err.failures,
            vec!["hhid: NOT_NULLABLE (1 rows)", "hhid: NON_INTEGRAL (1 rows)"]
        );
    }

    #[test]
    fn missing_required_column_is_reported() {
        let table = Table::from_dense(vec![("hhid", vec![1.0]), ("male", vec![1.0])]);
        let report = validate(&table, &schema(), 80.0);
        let age = report.outcome("age").unwrap();
        assert_eq!(age.findings[0].check, Check::MissingColumn);
        assert_eq!(age.findings[0].severity, Severity::Warning);
        // Column-level findings never quarantine rows.
        assert_eq!(report.quarantined_rows(), 0);
    }

    #[test]
    fn high_missing_is_a_warning_without_quarantine() {
        let table = Table::from_columns(vec![
            ("hhid", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]),
            ("age", vec![None, None, None, None, Some(40.0)]),
            ("male", vec![Some(1.0); 5]),
        ]);
        let report = validate(&table, &schema(), 75.0);
        let age = report.outcome("age").unwrap();
        assert_eq!(age.status, RuleStatus::Pass);
        assert_eq!(age.findings[0].check, Check::HighMissing);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.quarantined_rows(), 0);
    }

    #[test]
    fn validation_does_not_touch_the_table() {
        let table = Table::from_dense(vec![("hhid", vec![1.0, 2.0]), ("age", vec![5.0, 20.0])]);
        let before = table.clone();
        let _ = validate(&table, &schema(), 80.0);
        assert_eq!(table, before);
    }
}
