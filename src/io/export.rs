//! Low-level artifact writers (CSV, text, JSON) and the run directory.
//!
//! Report modules decide *what* goes into each artifact; this module only
//! knows how to put bytes on disk with errors that name the path.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::Table;
use crate::error::ExportError;

/// Output directory for one run: `<output_dir>/<run_id>/` with `tables/` and `reports/`.
///
/// Creating it again for the same id reuses (and later overwrites) the same
/// files; other run ids are never touched.
#[derive(Debug, Clone)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    pub fn create(output_dir: &Path, run_id: &str) -> Result<Self, ExportError> {
        let root = output_dir.join(run_id);
        for dir in [root.clone(), root.join("tables"), root.join("reports")] {
            fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table(&self, file_name: &str) -> PathBuf {
        self.root.join("tables").join(file_name)
    }

    pub fn report(&self, file_name: &str) -> PathBuf {
        self.root.join("reports").join(file_name)
    }

    pub fn file(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

/// Default run id: UTC timestamp, sortable and filesystem-safe.
pub fn default_run_id() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Write a numeric table; missing cells are empty fields.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<(), ExportError> {
    let header: Vec<String> = table.column_names().map(str::to_string).collect();
    let rows = (0..table.n_rows()).map(|row| {
        table
            .columns()
            .iter()
            .map(|c| c.values.get(row).copied().flatten().map(fmt_number).unwrap_or_default())
            .collect::<Vec<String>>()
    });
    write_rows_csv(path, &header, rows)
}

/// Write string rows under a header.
pub fn write_rows_csv<I>(path: &Path, header: &[String], rows: I) -> Result<(), ExportError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(header).map_err(csv_err)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn write_text(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, value).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Integers print without a fractional part; everything else with full precision.
fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}
