//! Schema rules and the validation engine shared by both gates.

pub mod schema;
pub mod validator;

pub use schema::{ColumnRule, DType, Presence, Schema, analysis_schema, input_schema};
pub use validator::{Check, Finding, RuleOutcome, RuleStatus, Severity, ValidationReport, validate};
