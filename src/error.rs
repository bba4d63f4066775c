//! Error types.
//!
//! Each pipeline stage has its own error enum so a failure names the stage,
//! and the offending rule / column / model id. `PipelineError` wraps them for
//! orchestration code; `AppError` is what the binary turns into an exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read the survey extract.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read CSV headers from '{path}': {source}")]
    Headers {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("'{path}' contains no data rows")]
    Empty { path: PathBuf },
    #[error("duplicate column '{column}' in '{path}'")]
    DuplicateColumn { path: PathBuf, column: String },
}

/// A critical schema rule was violated.
#[derive(Debug, Clone, Error)]
#[error("{gate} validation failed: {}", .failures.join("; "))]
pub struct ValidationError {
    pub gate: String,
    /// One line per critical finding, e.g. `hhid: NOT_NULLABLE (3 rows)`.
    pub failures: Vec<String>,
}

/// Feature engineering could not run on the admitted table.
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("{step}: required column '{column}' is missing")]
    MissingColumn { step: &'static str, column: String },
    #[error("{step}: no rows remain")]
    EmptySample { step: &'static str },
    #[error("head merge changed row count from {before} to {after}; 'hhid' is not unique among heads")]
    MergeCardinality { before: usize, after: usize },
}

/// A model or schema declaration is inconsistent with the data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("unknown model id '{0}'")]
    UnknownModel(String),
    #[error("duplicate model id '{0}'")]
    DuplicateModel(String),
    #[error("model {spec_id}: column '{column}' is not present in the analysis table")]
    MissingColumn { spec_id: String, column: String },
    #[error("model {spec_id}: column '{column}' has no schema rule")]
    UnruledColumn { spec_id: String, column: String },
    #[error("rule '{column}': min {min} exceeds max {max}")]
    InvalidRange { column: String, min: f64, max: f64 },
    #[error("duplicate schema rule for column '{0}'")]
    DuplicateRule(String),
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Numerical reason an estimator could not produce a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitFailure {
    #[error("design matrix is rank deficient (rank {rank} < {columns} columns)")]
    RankDeficient { rank: usize, columns: usize },
    #[error("insufficient observations: {n} (need >= {needed})")]
    InsufficientObservations { n: usize, needed: usize },
    #[error("non-finite estimate")]
    NonFinite,
    #[error("{0}")]
    Degenerate(&'static str),
}

/// Estimation failed for one model; other models in the batch continue.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("model {spec_id}: {failure}")]
pub struct FitError {
    pub spec_id: String,
    pub failure: FitFailure,
}

impl serde::Serialize for FitError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("FitError", 2)?;
        s.serialize_field("model", &self.spec_id)?;
        s.serialize_field("reason", &self.failure.to_string())?;
        s.end()
    }
}

/// Why the runner produced no result for a spec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The model spec does not match the table; aborts the batch.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Estimation failed; the batch continues.
    #[error(transparent)]
    Fit(#[from] FitError),
}

/// Failure while writing run artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to serialize '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Any error that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("export blocked: {warnings} validation warning(s) under strict policy")]
    ExportBlocked { warnings: usize },
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Input(_) | PipelineError::Configuration(_) => 2,
            PipelineError::Validation(_) | PipelineError::Feature(_) => 3,
            PipelineError::Export(_) | PipelineError::ExportBlocked { .. } => 5,
        }
    }
}

/// Error surfaced by the `chfs` binary: a message plus a process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
