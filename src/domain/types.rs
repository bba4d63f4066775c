//! Model declarations and results.
//!
//! These types are serializable so they can be:
//!
//! - declared statically in the registry
//! - rendered into tables and the run manifest
//! - compared across runs in tests

use serde::{Deserialize, Serialize};

/// Name of the intercept term in coefficient lists.
pub const INTERCEPT: &str = "const";

/// Which estimator a model uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorKind {
    #[serde(rename = "OLS")]
    Ols,
    #[serde(rename = "RidgeCV")]
    RidgeCv,
    #[serde(rename = "RLM")]
    Rlm,
}

impl EstimatorKind {
    pub fn display_name(self) -> &'static str {
        match self {
            EstimatorKind::Ols => "OLS",
            EstimatorKind::RidgeCv => "RidgeCV",
            EstimatorKind::Rlm => "RLM",
        }
    }
}

/// How standard errors are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SePolicy {
    /// Point estimates only (regularized fits).
    None,
    /// Classical `σ²(X'X)^{-1}` with t-distribution p-values.
    Nonrobust,
    /// White sandwich covariance, no small-sample correction.
    Hc0,
    /// Sandwich covariance with `n/(n-k)` correction.
    Hc1,
    /// Sandwich with squared residuals scaled by `1/(1-h_ii)`.
    Hc2,
    /// Sandwich with squared residuals scaled by `1/(1-h_ii)²`.
    Hc3,
    /// Covariance from the Huber IRLS fit itself.
    Huber,
}

impl SePolicy {
    /// Heteroskedasticity-consistent sandwich variants.
    pub fn is_sandwich(self) -> bool {
        matches!(self, SePolicy::Hc0 | SePolicy::Hc1 | SePolicy::Hc2 | SePolicy::Hc3)
    }

    pub fn label(self) -> &'static str {
        match self {
            SePolicy::None => "none",
            SePolicy::Nonrobust => "nonrobust",
            SePolicy::Hc0 => "HC0",
            SePolicy::Hc1 => "HC1",
            SePolicy::Hc2 => "HC2",
            SePolicy::Hc3 => "HC3",
            SePolicy::Huber => "Huber",
        }
    }
}

/// Declarative description of one regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Short identifier used as the table column header (e.g. `M1`).
    pub id: String,
    pub label: String,
    pub estimator: EstimatorKind,
    pub dependent: String,
    /// Regressors in declaration order (intercept excluded).
    pub regressors: Vec<String>,
    pub se: SePolicy,
    /// Standardize regressors before fitting (RidgeCV).
    pub standardize: bool,
}

impl ModelSpec {
    /// Every column the model reads: dependent first, then regressors.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.dependent.as_str()).chain(self.regressors.iter().map(String::as_str))
    }
}

/// One estimated term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: Option<f64>,
    /// `estimate / std_error` (z for robust and Huber covariances).
    pub t_value: Option<f64>,
    pub p_value: Option<f64>,
}

/// Goodness-of-fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitStats {
    pub n_obs: usize,
    /// R² for OLS/Ridge, pseudo-R² for RLM.
    pub r_squared: f64,
    pub adj_r_squared: Option<f64>,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    /// Regularization strength picked by cross-validation (RidgeCV only).
    pub alpha: Option<f64>,
}

/// Output of running one `ModelSpec` on the analysis table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub spec: ModelSpec,
    pub coefficients: Vec<Coefficient>,
    pub stats: FitStats,
}

impl ModelResult {
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term == term)
    }
}
