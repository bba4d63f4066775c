//! Model estimation.
//!
//! Responsibilities:
//!
//! - assemble a complete-case design matrix per `ModelSpec`
//! - dispatch to the estimator (OLS, RidgeCV, Huber RLM)
//! - run a battery, recording per-model failures
//! - sample diagnostics (descriptive stats, missing audit, VIF)

pub mod design;
pub mod diagnostics;
pub mod estimator;
pub mod ols;
pub mod ridge;
pub mod rlm;
pub mod runner;

pub use design::Design;
pub use diagnostics::{Descriptive, MissingCount, Vif, describe, missing_audit, vif};
pub use estimator::{Estimator, Fitted};
pub use runner::{Batch, run, run_all};
