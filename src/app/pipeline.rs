//! End-to-end analysis workflow shared by the `run` and `validate` commands.
//!
//! load → head merge → input gate → features → analysis gate → models →
//! export. Each stage returns its own error type; this module lifts them into
//! `PipelineError`.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{Settings, WarningPolicy};
use crate::data::{extract_heads, merge_heads};
use crate::domain::Table;
use crate::error::{ExportError, PipelineError};
use crate::features::{FeatureStats, build_analysis_table};
use crate::fit::{self, Batch};
use crate::io::export::{write_json, write_rows_csv, write_table_csv, write_text};
use crate::io::{RunDir, load_csv};
use crate::models::{KEY_REGRESSOR, Registry, default_regressors};
use crate::report::{self, RegressionTable, ResultSummary, RowCounts};
use crate::validate::{ValidationReport, analysis_schema, input_schema, validate};

/// Both extracts, merged on `hhid`.
#[derive(Debug, Clone)]
pub struct RawExtract {
    pub merged: Table,
    pub households: usize,
    pub individuals: usize,
}

/// Read both extracts from `settings.data_dir`.
///
/// Inputs are delimited-text exports of the survey's Stata archive with
/// numeric codes; converting the `.dta` files is done upstream of this crate.
pub fn load_extract(settings: &Settings) -> Result<RawExtract, PipelineError> {
    let households = load_csv(&settings.hh_path())?;
    let individuals = load_csv(&settings.ind_path())?;
    let heads = extract_heads(&individuals.table, settings)?;
    let merged = merge_heads(&households.table, &heads)?;
    Ok(RawExtract {
        merged,
        households: households.table.n_rows(),
        individuals: individuals.table.n_rows(),
    })
}

/// Reports of both gates. `analysis` is `None` when the input gate had a
/// critical failure and features were not built.
#[derive(Debug, Clone)]
pub struct GateReports {
    pub input: ValidationReport,
    pub analysis: Option<ValidationReport>,
}

impl GateReports {
    pub fn is_valid(&self) -> bool {
        self.input.is_valid() && self.analysis.as_ref().is_none_or(ValidationReport::is_valid)
    }

    pub fn warning_count(&self) -> usize {
        self.input.warning_count() + self.analysis.as_ref().map_or(0, ValidationReport::warning_count)
    }
}

/// Validated, admitted analysis table and the bookkeeping around it.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub analysis: Table,
    pub reports: GateReports,
    pub features: FeatureStats,
    pub row_counts: RowCounts,
}

/// Run both gates without raising on critical findings (the `validate`
/// command prints whatever was found).
pub fn check_gates(settings: &Settings) -> Result<GateReports, PipelineError> {
    let raw = load_extract(settings)?;
    let input = validate(&raw.merged, &input_schema()?, settings.high_missing_pct);
    if !input.is_valid() {
        return Ok(GateReports { input, analysis: None });
    }
    let features = build_analysis_table(&input.admit(&raw.merged), settings)?;
    let analysis = validate(&features.table, &analysis_schema()?, settings.high_missing_pct);
    Ok(GateReports {
        input,
        analysis: Some(analysis),
    })
}

/// Everything up to the admitted analysis table; critical findings abort.
pub fn prepare(settings: &Settings) -> Result<Prepared, PipelineError> {
    let raw = load_extract(settings)?;

    let input = validate(&raw.merged, &input_schema()?, settings.high_missing_pct);
    input.ensure_no_critical()?;
    let admitted = input.admit(&raw.merged);

    let features = build_analysis_table(&admitted, settings)?;
    let analysis_report = validate(&features.table, &analysis_schema()?, settings.high_missing_pct);
    analysis_report.ensure_no_critical()?;
    let analysis = analysis_report.admit(&features.table);

    let row_counts = RowCounts {
        households: raw.households,
        individuals: raw.individuals,
        quarantined_input: input.quarantined_rows(),
        quarantined_analysis: analysis_report.quarantined_rows(),
        analysis: analysis.n_rows(),
    };
    info!(
        households = row_counts.households,
        individuals = row_counts.individuals,
        analysis = row_counts.analysis,
        "analysis sample ready"
    );
    Ok(Prepared {
        analysis,
        reports: GateReports {
            input,
            analysis: Some(analysis_report),
        },
        features: features.stats,
        row_counts,
    })
}

/// Per-invocation choices that are not part of `Settings`.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub run_id: String,
    /// Empty: the whole default battery.
    pub models: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub run_dir: PathBuf,
    pub batch: Batch,
    pub prepared: Prepared,
}

pub fn run_analysis(settings: &Settings, options: &RunOptions) -> Result<RunOutput, PipelineError> {
    settings.check()?;
    let battery = Registry::default_battery()?;
    let registry = if options.models.is_empty() {
        battery
    } else {
        battery.select(&options.models)?
    };
    registry.check_against(&analysis_schema()?)?;

    let prepared = prepare(settings)?;
    let warnings = prepared.reports.warning_count();
    if warnings > 0 {
        match settings.warning_policy {
            WarningPolicy::Proceed => warn!(warnings, "validation warnings present, proceeding"),
            WarningPolicy::BlockExport => return Err(PipelineError::ExportBlocked { warnings }),
        }
    }

    let batch = fit::run_all(registry.specs(), &prepared.analysis, settings)?;

    let dir = RunDir::create(&settings.output_dir, &options.run_id)?;
    export_all(&dir, settings, options, &registry, &prepared, &batch)?;
    info!(dir = %dir.root().display(), "run complete");

    Ok(RunOutput {
        run_dir: dir.root().to_path_buf(),
        batch,
        prepared,
    })
}

fn export_all(
    dir: &RunDir,
    settings: &Settings,
    options: &RunOptions,
    registry: &Registry,
    prepared: &Prepared,
    batch: &Batch,
) -> Result<(), ExportError> {
    let table = &prepared.analysis;
    let regressors = default_regressors();

    let mut described: Vec<&str> = vec!["debt_ratio_winsorized", "log_debt_ratio_winsorized"];
    described.extend(regressors.iter().map(String::as_str));
    report::export_descriptive(dir, &fit::describe(table, &described))?;
    report::export_missing(dir, &fit::missing_audit(table))?;
    let vif_columns: Vec<&str> = regressors.iter().map(String::as_str).collect();
    report::export_vif(dir, &fit::vif(table, &vif_columns, settings.vif_threshold))?;

    let regression = RegressionTable::build(&batch.results);
    write_text(
        &dir.table("regression_results.tex"),
        &regression.to_latex(
            "Effect of Number of Siblings on Household Debt Ratio (CHFS 2017)",
            "tab:regression",
            "Standard errors in parentheses. HC1 robust standard errors used for OLS models.",
        ),
    )?;
    let (header, rows) = regression.to_csv_rows();
    write_rows_csv(&dir.table("regression_results.csv"), &header, rows)?;

    write_table_csv(&dir.file("processed_analysis_data.csv"), table)?;
    write_json(&dir.report("validation_input.json"), &prepared.reports.input)?;
    if let Some(analysis) = &prepared.reports.analysis {
        write_json(&dir.report("validation_analysis.json"), analysis)?;
    }

    let manifest = report::manifest::build(report::ManifestInputs {
        run_id: &options.run_id,
        seed: settings.seed,
        data_files: &settings.input_paths(),
        models_requested: registry.ids(),
        results: batch
            .results
            .iter()
            .map(|r| ResultSummary::new(r, KEY_REGRESSOR))
            .collect(),
        fit_failures: batch.failures.clone(),
        validation_passed: prepared.reports.is_valid(),
        validation_warnings: prepared.reports.warning_count(),
        row_counts: prepared.row_counts.clone(),
        features: prepared.features,
    });
    write_json(&dir.report("reproducibility_manifest.json"), &manifest)?;
    Ok(())
}
