//! Reproducibility manifest: the conditions a run was produced under.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::process::Command;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::ModelResult;
use crate::error::FitError;
use crate::features::FeatureStats;

/// Placeholder checksum for an input path that does not exist.
pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";
/// Placeholder checksum for an input path that exists but cannot be read.
pub const FILE_UNREADABLE: &str = "FILE_UNREADABLE";

/// `name=version` pairs resolved from `Cargo.lock` by the build script.
const DEPENDENCY_VERSIONS: &str = env!("CHFS_DEPENDENCY_VERSIONS");
const RUSTC_VERSION: &str = env!("CHFS_RUSTC_VERSION");

/// Resolved versions of the numerical and I/O stack this binary was built with.
pub fn dependency_versions() -> BTreeMap<String, String> {
    DEPENDENCY_VERSIONS
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, version)| (name.to_string(), version.to_string()))
        .collect()
}

/// Where the run executed and which compiler built it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
    pub rustc: &'static str,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            rustc: RUSTC_VERSION,
        }
    }
}

/// Compact per-model summary recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub model: String,
    pub estimator: &'static str,
    pub dependent: String,
    pub n_obs: usize,
    pub r_squared: f64,
    pub alpha: Option<f64>,
    /// Estimate of the key regressor, when the model has it.
    pub key_estimate: Option<f64>,
    pub key_t_value: Option<f64>,
    pub key_p_value: Option<f64>,
}

impl ResultSummary {
    pub fn new(result: &ModelResult, key_term: &str) -> Self {
        let key = result.coefficient(key_term);
        Self {
            model: result.spec.id.clone(),
            estimator: result.spec.estimator.display_name(),
            dependent: result.spec.dependent.clone(),
            n_obs: result.stats.n_obs,
            r_squared: result.stats.r_squared,
            alpha: result.stats.alpha,
            key_estimate: key.map(|c| c.estimate),
            key_t_value: key.and_then(|c| c.t_value),
            key_p_value: key.and_then(|c| c.p_value),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowCounts {
    pub households: usize,
    pub individuals: usize,
    pub quarantined_input: usize,
    pub quarantined_analysis: usize,
    pub analysis: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub run_id: String,
    pub timestamp_utc: String,
    pub git_commit: String,
    pub crate_version: &'static str,
    pub platform: Platform,
    pub dependency_versions: BTreeMap<String, String>,
    pub random_seed: u64,
    pub data_checksums: BTreeMap<String, String>,
    pub models_requested: Vec<String>,
    pub results: Vec<ResultSummary>,
    pub fit_failures: Vec<FitError>,
    /// `PASS` when neither gate reported an error, else `FAIL`.
    pub validation_status: &'static str,
    pub validation_warnings: usize,
    pub row_counts: RowCounts,
    pub features: FeatureStats,
}

/// Inputs that vary per run; the rest is collected from the environment.
pub struct ManifestInputs<'a> {
    pub run_id: &'a str,
    pub seed: u64,
    pub data_files: &'a [std::path::PathBuf],
    pub models_requested: Vec<String>,
    pub results: Vec<ResultSummary>,
    pub fit_failures: Vec<FitError>,
    pub validation_passed: bool,
    pub validation_warnings: usize,
    pub row_counts: RowCounts,
    pub features: FeatureStats,
}

pub fn build(inputs: ManifestInputs<'_>) -> Manifest {
    let data_checksums = inputs
        .data_files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            (name, checksum_or_placeholder(path))
        })
        .collect();

    Manifest {
        run_id: inputs.run_id.to_string(),
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        git_commit: git_revision(),
        crate_version: env!("CARGO_PKG_VERSION"),
        platform: Platform::current(),
        dependency_versions: dependency_versions(),
        random_seed: inputs.seed,
        data_checksums,
        models_requested: inputs.models_requested,
        results: inputs.results,
        fit_failures: inputs.fit_failures,
        validation_status: if inputs.validation_passed { "PASS" } else { "FAIL" },
        validation_warnings: inputs.validation_warnings,
        row_counts: inputs.row_counts,
        features: inputs.features,
    }
}

/// Hex SHA-256 of a file.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

fn checksum_or_placeholder(path: &Path) -> String {
    match sha256_file(path) {
        Ok(digest) => digest,
        Err(err) if err.kind() == io::ErrorKind::NotFound => FILE_NOT_FOUND.to_string(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "input file could not be hashed");
            FILE_UNREADABLE.to_string()
        }
    }
}

/// Short commit hash, `-dirty` when the tree has uncommitted changes,
/// `not-a-repo` when git is unavailable or the cwd is not a repository.
pub fn git_revision() -> String {
    let run = |args: &[&str]| {
        Command::new("git")
            .args(args)
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    };
    let Some(commit) = run(&["rev-parse", "--short", "HEAD"]).filter(|c| !c.is_empty()) else {
        return "not-a-repo".to_string();
    };
    match run(&["status", "--porcelain"]) {
        Some(status) if !status.is_empty() => format!("{commit}-dirty"),
        _ => commit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::WinsorBounds;

    #[test]
    fn sha256_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, "abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let missing = sha256_file(&dir.path().join("missing.csv")).unwrap_err();
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn manifest_marks_absent_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("hh.csv");
        std::fs::write(&present, "hhid\n1\n").unwrap();
        // A directory opens but cannot be read as a file.
        let unreadable = dir.path().join("extract_dir.csv");
        std::fs::create_dir(&unreadable).unwrap();
        let files = vec![present, dir.path().join("ind.csv"), unreadable];
        let manifest = build(ManifestInputs {
            run_id: "r1",
            seed: 42,
            data_files: &files,
            models_requested: vec!["M1".into()],
            results: Vec::new(),
            fit_failures: Vec::new(),
            validation_passed: true,
            validation_warnings: 0,
            row_counts: RowCounts {
                households: 1,
                individuals: 0,
                quarantined_input: 0,
                quarantined_analysis: 0,
                analysis: 1,
            },
            features: FeatureStats {
                input_rows: 1,
                dropped_nonpositive_assets: 0,
                winsor_bounds: WinsorBounds { lower: 0.0, upper: 1.0 },
            },
        });
        assert_eq!(manifest.data_checksums["ind.csv"], FILE_NOT_FOUND);
        assert_eq!(manifest.data_checksums["hh.csv"].len(), 64);
        assert_eq!(manifest.data_checksums["extract_dir.csv"], FILE_UNREADABLE);
        assert_eq!(manifest.validation_status, "PASS");

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["random_seed"], 42);
        assert!(json["git_commit"].as_str().is_some());
        assert!(json["dependency_versions"]["nalgebra"].as_str().unwrap().starts_with("0.33."));
        assert_eq!(json["platform"]["os"], std::env::consts::OS);
        assert_eq!(json["platform"]["arch"], std::env::consts::ARCH);
        assert!(json["platform"]["rustc"].as_str().unwrap().starts_with("rustc "));
    }

    #[test]
    fn dependency_versions_are_fully_resolved() {
        let versions = dependency_versions();
        assert_eq!(versions.len(), 9);
        for (name, version) in &versions {
            let parts: Vec<&str> = version.split('-').next().unwrap().split('.').collect();
            assert_eq!(parts.len(), 3, "{name} has version {version}");
            assert!(parts.iter().all(|p| p.parse::<u64>().is_ok()), "{name} has version {version}");
        }
    }
}
