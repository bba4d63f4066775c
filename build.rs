//! Bakes the resolved dependency versions (from `Cargo.lock`) and the rustc
//! version into the binary for the reproducibility manifest.

use std::path::PathBuf;
use std::process::Command;

/// Packages recorded in the manifest, with the requirement prefix from
/// `Cargo.toml` used to pick the right entry when the lockfile carries
/// several versions of one crate.
const RECORDED: [(&str, &str); 9] = [
    ("csv", "1."),
    ("nalgebra", "0.33."),
    ("rand", "0.8."),
    ("rand_distr", "0.4."),
    ("rayon", "1."),
    ("serde_json", "1."),
    ("sha2", "0.10."),
    ("statrs", "0.17."),
    ("tracing", "0.1."),
];

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let lock_path = manifest_dir.join("Cargo.lock");
    println!("cargo:rerun-if-changed={}", lock_path.display());
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RUSTC");

    let locked = std::fs::read_to_string(&lock_path)
        .ok()
        .and_then(|text| text.parse::<toml::Table>().ok())
        .and_then(|table| table.get("package").and_then(|p| p.as_array()).cloned())
        .unwrap_or_default();
    if locked.is_empty() {
        println!("cargo:warning=Cargo.lock not readable; dependency versions recorded as unknown");
    }

    let versions: Vec<String> = RECORDED
        .iter()
        .map(|(name, prefix)| {
            let version = locked
                .iter()
                .filter(|pkg| pkg.get("name").and_then(|n| n.as_str()) == Some(*name))
                .filter_map(|pkg| pkg.get("version").and_then(|v| v.as_str()))
                .find(|v| v.starts_with(prefix))
                .unwrap_or("unknown");
            format!("{name}={version}")
        })
        .collect();
    println!("cargo:rustc-env=CHFS_DEPENDENCY_VERSIONS={}", versions.join(","));

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=CHFS_RUSTC_VERSION={rustc_version}");
}
