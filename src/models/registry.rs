//! Declarative model battery.
//!
//! Specs are data: the registry holds them in declaration order and answers
//! lookups by id. `check_against` ties the battery to a schema so every
//! column a model reads is covered by a validation rule.

use crate::domain::{EstimatorKind, ModelSpec, SePolicy};
use crate::error::ConfigurationError;
use crate::validate::Schema;

/// Key independent variable of the study.
pub const KEY_REGRESSOR: &str = "head_siblings";

pub const HEAD_CONTROLS: [&str; 5] = [
    "head_age",
    "head_is_male",
    "head_educ",
    "head_is_married",
    "head_health",
];

pub const HOUSEHOLD_CONTROLS: [&str; 3] = ["has_business", "num_houses", "log_total_assets"];

/// `head_siblings`, then head controls, then household controls.
pub fn default_regressors() -> Vec<String> {
    std::iter::once(KEY_REGRESSOR)
        .chain(HEAD_CONTROLS)
        .chain(HOUSEHOLD_CONTROLS)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Registry {
    specs: Vec<ModelSpec>,
}

impl Registry {
    /// Rejects duplicate ids and estimator/SE combinations the estimator
    /// cannot produce.
    pub fn new(specs: Vec<ModelSpec>) -> Result<Self, ConfigurationError> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.id == spec.id) {
                return Err(ConfigurationError::DuplicateModel(spec.id.clone()));
            }
            let supported = match spec.estimator {
                EstimatorKind::Ols => {
                    matches!(spec.se, SePolicy::None | SePolicy::Nonrobust) || spec.se.is_sandwich()
                }
                EstimatorKind::RidgeCv => spec.se == SePolicy::None,
                EstimatorKind::Rlm => spec.se == SePolicy::Huber,
            };
            if !supported {
                return Err(ConfigurationError::InvalidSetting {
                    name: "se",
                    reason: format!(
                        "model {}: {} cannot report {} standard errors",
                        spec.id,
                        spec.estimator.display_name(),
                        spec.se.label()
                    ),
                });
            }
        }
        Ok(Self { specs })
    }

    /// M1..M5 of the siblings / debt-ratio study.
    pub fn default_battery() -> Result<Self, ConfigurationError> {
        let regressors = default_regressors();
        let spec = |id: &str, label: &str, estimator, dependent: &str, se, standardize| ModelSpec {
            id: id.to_string(),
            label: label.to_string(),
            estimator,
            dependent: dependent.to_string(),
            regressors: regressors.clone(),
            se,
            standardize,
        };
        Registry::new(vec![
            spec(
                "M1",
                "OLS: debt ratio (HC1)",
                EstimatorKind::Ols,
                "debt_ratio_winsorized",
                SePolicy::Hc1,
                false,
            ),
            spec(
                "M2",
                "OLS: log debt ratio (HC1)",
                EstimatorKind::Ols,
                "log_debt_ratio_winsorized",
                SePolicy::Hc1,
                false,
            ),
            spec(
                "M3",
                "RidgeCV: debt ratio (standardized)",
                EstimatorKind::RidgeCv,
                "debt_ratio_winsorized",
                SePolicy::None,
                true,
            ),
            spec(
                "M4",
                "RidgeCV: log debt ratio (standardized)",
                EstimatorKind::RidgeCv,
                "log_debt_ratio_winsorized",
                SePolicy::None,
                true,
            ),
            spec(
                "M5",
                "RLM: debt ratio (Huber)",
                EstimatorKind::Rlm,
                "debt_ratio_winsorized",
                SePolicy::Huber,
                false,
            ),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&ModelSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    pub fn specs(&self) -> &[ModelSpec] {
        &self.specs
    }

    pub fn ids(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.id.clone()).collect()
    }

    /// Subset in the order the ids are given.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Registry, ConfigurationError> {
        let picked = ids
            .iter()
            .map(|id| {
                self.get(id.as_ref())
                    .cloned()
                    .ok_or_else(|| ConfigurationError::UnknownModel(id.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Registry::new(picked)
    }

    /// Every column a spec reads must have a rule in `schema`.
    pub fn check_against(&self, schema: &Schema) -> Result<(), ConfigurationError> {
        for spec in &self.specs {
            if let Some(column) = spec.columns().find(|c| schema.rule(c).is_none()) {
                return Err(ConfigurationError::UnruledColumn {
                    spec_id: spec.id.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::analysis_schema;

    #[test]
    fn default_battery_is_ordered_and_bound_to_analysis_schema() {
        let registry = Registry::default_battery().unwrap();
        assert_eq!(registry.ids(), vec!["M1", "M2", "M3", "M4", "M5"]);
        registry.check_against(&analysis_schema().unwrap()).unwrap();

        let m3 = registry.get("M3").unwrap();
        assert_eq!(m3.estimator, EstimatorKind::RidgeCv);
        assert!(m3.standardize);
        assert_eq!(m3.regressors.first().map(String::as_str), Some(KEY_REGRESSOR));
        assert_eq!(m3.regressors.len(), 9);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let registry = Registry::default_battery().unwrap();
        let m1 = registry.get("M1").unwrap().clone();
        assert_eq!(
            Registry::new(vec![m1.clone(), m1]).unwrap_err(),
            ConfigurationError::DuplicateModel("M1".into())
        );
    }

    #[test]
    fn select_keeps_requested_order_and_rejects_unknown() {
        let registry = Registry::default_battery().unwrap();
        let sub = registry.select(&["M5", "M1"]).unwrap();
        assert_eq!(sub.ids(), vec!["M5", "M1"]);
        assert_eq!(
            registry.select(&["M9"]).unwrap_err(),
            ConfigurationError::UnknownModel("M9".into())
        );
    }

    #[test]
    fn unruled_column_is_a_configuration_error() {
        let mut spec = Registry::default_battery().unwrap().get("M1").unwrap().clone();
        spec.regressors.push("income".into());
        let registry = Registry::new(vec![spec]).unwrap();
        assert_eq!(
            registry.check_against(&analysis_schema().unwrap()).unwrap_err(),
            ConfigurationError::UnruledColumn {
                spec_id: "M1".into(),
                column: "income".into()
            }
        );
    }

    #[test]
    fn ols_accepts_every_sandwich_variant() {
        let base = Registry::default_battery().unwrap().get("M1").unwrap().clone();
        for se in [SePolicy::Hc0, SePolicy::Hc1, SePolicy::Hc2, SePolicy::Hc3, SePolicy::Nonrobust] {
            let spec = ModelSpec { se, ..base.clone() };
            assert!(Registry::new(vec![spec]).is_ok(), "{}", se.label());
        }
        let huber = ModelSpec { se: SePolicy::Huber, ..base };
        assert!(Registry::new(vec![huber]).is_err());
    }

    #[test]
    fn ridge_with_standard_errors_is_rejected() {
        let mut spec = Registry::default_battery().unwrap().get("M3").unwrap().clone();
        spec.se = SePolicy::Hc1;
        assert!(matches!(
            Registry::new(vec![spec]),
            Err(ConfigurationError::InvalidSetting { name: "se", .. })
        ));
    }
}
