//! Run-time settings.
//!
//! Every tunable constant of the pipeline lives in one immutable `Settings`
//! value that is built once (defaults → `.env`/environment → CLI flags) and
//! passed by reference to each stage.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ConfigurationError;

/// Household extract file name inside `data_dir`.
pub const HH_FILENAME: &str = "chfs2017_hh_202206.csv";
/// Individual extract file name inside `data_dir`.
pub const IND_FILENAME: &str = "chfs2017_ind_202206.csv";

/// What to do when validation produced warnings but no critical failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningPolicy {
    /// Log the warnings and export as usual.
    Proceed,
    /// Refuse to write artifacts while any warning is outstanding.
    BlockExport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,

    pub survey_year: i32,
    pub head_min_age: f64,
    pub sibling_max_age: f64,

    /// Lower/upper winsorization percentiles, as fractions.
    pub winsor_lower: f64,
    pub winsor_upper: f64,
    /// `log_debt_ratio_winsorized = ln(log_offset + debt_ratio_winsorized)`.
    pub log_offset: f64,
    /// Open-ended top interval bins resolve to `floor × top_bin_multiplier`.
    pub top_bin_multiplier: f64,

    /// RidgeCV alpha grid as `logspace(start, stop, count)`.
    pub ridge_log10_start: f64,
    pub ridge_log10_stop: f64,
    pub ridge_alpha_count: usize,

    pub vif_threshold: f64,
    /// Null share (percent) above which a nullable column draws a warning.
    pub high_missing_pct: f64,

    pub warning_policy: WarningPolicy,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data").join("raw"),
            output_dir: PathBuf::from("outputs"),
            survey_year: 2017,
            head_min_age: 16.0,
            sibling_max_age: 40.0,
            winsor_lower: 0.01,
            winsor_upper: 0.99,
            log_offset: 1.0,
            top_bin_multiplier: 1.5,
            ridge_log10_start: -6.0,
            ridge_log10_stop: 6.0,
            ridge_alpha_count: 13,
            vif_threshold: 5.0,
            high_missing_pct: 80.0,
            warning_policy: WarningPolicy::Proceed,
            seed: 42,
        }
    }
}

impl Settings {
    /// Defaults overridden by `CHFS_DATA_DIR` / `CHFS_OUTPUT_DIR` (a `.env` file is honored).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut settings = Settings::default();
        if let Ok(dir) = std::env::var("CHFS_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("CHFS_OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(dir);
        }
        settings
    }

    pub fn hh_path(&self) -> PathBuf {
        self.data_dir.join(HH_FILENAME)
    }

    pub fn ind_path(&self) -> PathBuf {
        self.data_dir.join(IND_FILENAME)
    }

    pub fn input_paths(&self) -> [PathBuf; 2] {
        [self.hh_path(), self.ind_path()]
    }

    /// `logspace(ridge_log10_start, ridge_log10_stop, ridge_alpha_count)`.
    pub fn ridge_alphas(&self) -> Vec<f64> {
        let n = self.ridge_alpha_count;
        if n == 1 {
            return vec![10f64.powf(self.ridge_log10_start)];
        }
        let step = (self.ridge_log10_stop - self.ridge_log10_start) / (n as f64 - 1.0);
        (0..n)
            .map(|i| 10f64.powf(self.ridge_log10_start + step * i as f64))
            .collect()
    }

    pub fn check(&self) -> Result<(), ConfigurationError> {
        if !(0.0..0.5).contains(&self.winsor_lower) || !(0.5..=1.0).contains(&self.winsor_upper) {
            return Err(ConfigurationError::InvalidSetting {
                name: "winsor percentiles",
                reason: format!(
                    "expected 0 <= lower < 0.5 <= upper <= 1, got ({}, {})",
                    self.winsor_lower, self.winsor_upper
                ),
            });
        }
        if !(self.log_offset.is_finite() && self.log_offset > 0.0) {
            return Err(ConfigurationError::InvalidSetting {
                name: "log_offset",
                reason: format!("must be positive, got {}", self.log_offset),
            });
        }
        if !(self.top_bin_multiplier.is_finite() && self.top_bin_multiplier >= 1.0) {
            return Err(ConfigurationError::InvalidSetting {
                name: "top_bin_multiplier",
                reason: format!("must be >= 1, got {}", self.top_bin_multiplier),
            });
        }
        if self.ridge_alpha_count == 0 {
            return Err(ConfigurationError::InvalidSetting {
                name: "ridge_alpha_count",
                reason: "alpha grid is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Same settings rooted at other directories (used by tests and `--data-dir`).
    pub fn with_dirs(mut self, data_dir: &Path, output_dir: &Path) -> Self {
        self.data_dir = data_dir.to_path_buf();
        self.output_dir = output_dir.to_path_buf();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alpha_grid_matches_logspace() {
        let alphas = Settings::default().ridge_alphas();
        assert_eq!(alphas.len(), 13);
        assert!((alphas[0] - 1e-6).abs() < 1e-18);
        assert!((alphas[6] - 1.0).abs() < 1e-12);
        assert!((alphas[12] - 1e6).abs() < 1e-6);
    }

    #[test]
    fn check_rejects_inverted_winsor_limits() {
        let settings = Settings {
            winsor_lower: 0.6,
            ..Settings::default()
        };
        assert!(matches!(
            settings.check(),
            Err(ConfigurationError::InvalidSetting { name: "winsor percentiles", .. })
        ));
        assert!(Settings::default().check().is_ok());
    }
}
