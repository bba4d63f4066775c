//! Declarative column rules.
//!
//! A `Schema` is a named, ordered set of `ColumnRule`s. Two catalogues are
//! defined here: one for the merged raw extract (input gate) and one for the
//! analysis table (analysis gate). The validator enforces them; nothing in
//! this module looks at data.

use std::collections::HashSet;

use serde::Serialize;

use crate::data::variables::{asset_vars, debt_vars, household, vehicle_in_business};
use crate::error::ConfigurationError;

/// Logical type of a column. All cells are `f64`; the non-float kinds require
/// integral values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Float,
    Int,
    Categorical,
    Binary,
}

impl DType {
    pub fn is_integral(self) -> bool {
        !matches!(self, DType::Float)
    }
}

/// Whether an absent column is itself a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRule {
    pub name: String,
    pub label: String,
    pub dtype: DType,
    pub nullable: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed: Option<Vec<f64>>,
    /// Violations abort the run instead of quarantining rows.
    pub critical: bool,
    pub presence: Presence,
}

impl ColumnRule {
    /// Nullable, required, non-critical, unconstrained.
    pub fn new(name: impl Into<String>, label: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            dtype,
            nullable: true,
            min: None,
            max: None,
            allowed: None,
            critical: false,
            presence: Presence::Required,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub fn allowed(mut self, values: &[f64]) -> Self {
        self.allowed = Some(values.to_vec());
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    fn check(&self) -> Result<(), ConfigurationError> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ConfigurationError::InvalidRange {
                    column: self.name.clone(),
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Named rule set; rule order is report order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    name: String,
    rules: Vec<ColumnRule>,
}

impl Schema {
    /// Rejects `min > max` and duplicate column names.
    pub fn new(name: impl Into<String>, rules: Vec<ColumnRule>) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.check()?;
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigurationError::DuplicateRule(rule.name.clone()));
            }
        }
        Ok(Self {
            name: name.into(),
            rules,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    pub fn rule(&self, column: &str) -> Option<&ColumnRule> {
        self.rules.iter().find(|r| r.name == column)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rules for the merged raw extract (households + head demographics).
pub fn input_schema() -> Result<Schema, ConfigurationError> {
    let mut rules = vec![
        ColumnRule::new(household::ID, "Household ID", DType::Int)
            .not_null()
            .critical(),
        ColumnRule::new("head_age", "Head age (years)", DType::Float).range(16.0, 120.0),
        ColumnRule::new("head_siblings", "Head siblings (age <= 40)", DType::Float).range(0.0, 30.0),
        ColumnRule::new("head_sex", "Head sex (1=male, 2=female)", DType::Categorical)
            .allowed(&[1.0, 2.0]),
        ColumnRule::new("head_educ", "Head education level", DType::Categorical).range(1.0, 9.0),
        ColumnRule::new("head_marital", "Head marital status", DType::Categorical).range(1.0, 7.0),
        ColumnRule::new("head_health", "Head self-rated health", DType::Categorical).range(1.0, 5.0),
        ColumnRule::new(household::HAS_BUSINESS, "Owns a business (1=yes)", DType::Categorical),
        ColumnRule::new(household::NUM_HOUSES, "Number of houses owned", DType::Float).min(0.0),
    ];

    let mut catalogue = debt_vars();
    catalogue.extend(asset_vars());
    catalogue.push(vehicle_in_business());
    for spec in &catalogue {
        rules.push(
            ColumnRule::new(spec.exact.as_str(), "Reported amount (CNY)", DType::Float)
                .min(0.0)
                .optional(),
        );
        if let Some(interval) = &spec.interval {
            rules.push(
                ColumnRule::new(interval.as_str(), "Interval code", DType::Categorical)
                    .min(1.0)
                    .optional(),
            );
        }
    }

    Schema::new("input", rules)
}

/// Rules for the analysis-ready table.
pub fn analysis_schema() -> Result<Schema, ConfigurationError> {
    let binary = [0.0, 1.0];
    Schema::new(
        "analysis",
        vec![
            ColumnRule::new(household::ID, "Household ID", DType::Int)
                .not_null()
                .critical(),
            ColumnRule::new("head_siblings", "Number of siblings (head, age <= 40)", DType::Float)
                .range(0.0, 30.0),
            ColumnRule::new("debt_ratio", "Debt-to-asset ratio", DType::Float).min(0.0),
            ColumnRule::new(
                "debt_ratio_winsorized",
                "Debt-to-asset ratio (winsorized 1%)",
                DType::Float,
            )
            .min(0.0)
            .critical(),
            ColumnRule::new("log_debt_ratio_winsorized", "Log debt-to-asset ratio", DType::Float),
            ColumnRule::new("total_debt", "Total household debt (CNY)", DType::Float).min(0.0),
            ColumnRule::new("total_assets", "Total household assets (CNY)", DType::Float)
                .min(0.0)
                .critical(),
            ColumnRule::new("head_age", "Head age (years)", DType::Float).range(16.0, 120.0),
            ColumnRule::new("head_is_male", "Head is male (1/0)", DType::Binary).allowed(&binary),
            ColumnRule::new("head_educ", "Head education level", DType::Categorical).range(1.0, 9.0),
            ColumnRule::new("head_is_married", "Head is married (1/0)", DType::Binary)
                .allowed(&binary),
            ColumnRule::new(
                "head_health",
                "Head self-rated health (1=best .. 5=worst)",
                DType::Categorical,
            )
            .range(1.0, 5.0),
            ColumnRule::new("has_business", "Household owns a business (1/0)", DType::Binary)
                .allowed(&binary),
            ColumnRule::new("num_houses", "Number of houses owned", DType::Float).min(0.0),
            ColumnRule::new("log_total_assets", "Log(total_assets + 1)", DType::Float).min(0.0),
        ],
    )
}
