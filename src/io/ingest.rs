//! CSV ingest of the survey extract.
//!
//! The extract is exported from the survey's statistical-package files with
//! numeric codes, so every cell is either a number or a missing marker.
//!
//! Design goals:
//! - **Strict headers** (duplicate or empty header set is an error)
//! - **Row-level validation** (skip malformed rows, but report what happened)
//! - **No semantics here**: rules and derivations live in `validate` / `features`

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::Table;
use crate::error::InputError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the table plus bookkeeping about skipped rows.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: Table,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a CSV file into a `Table`.
pub fn load_csv(path: &Path) -> Result<IngestedTable, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| InputError::Headers {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let names = header_names(&headers);
    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(InputError::DuplicateColumn {
                path: path.to_path_buf(),
                column: name.clone(),
            });
        }
    }

    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_record(&record, &names) {
            Ok(values) => {
                for (col, value) in columns.iter_mut().zip(values) {
                    col.push(value);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let n_rows = columns.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 {
        return Err(InputError::Empty {
            path: path.to_path_buf(),
        });
    }

    let mut table = Table::with_rows(n_rows);
    for (name, values) in names.into_iter().zip(columns) {
        table.set_column(name, values);
    }

    if !row_errors.is_empty() {
        warn!(
            path = %path.display(),
            skipped = row_errors.len(),
            "skipped malformed rows"
        );
        for e in row_errors.iter().take(5) {
            debug!(line = e.line, "{}", e.message);
        }
    }
    info!(
        path = %path.display(),
        rows = table.n_rows(),
        cols = table.n_cols(),
        "loaded extract"
    );

    Ok(IngestedTable {
        table,
        row_errors,
        rows_read,
    })
}

fn header_names(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(normalize_header_name).collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet tools sometimes prefix the first header with a UTF-8 BOM;
    // left in place it would make `hhid` look absent to the validator.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_record(record: &StringRecord, names: &[String]) -> Result<Vec<Option<f64>>, String> {
    if record.len() > names.len() {
        return Err(format!(
            "row has {} fields, header has {}",
            record.len(),
            names.len()
        ));
    }

    let mut out = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        // Short rows: trailing fields are missing.
        let raw = record.get(i).unwrap_or("");
        out.push(parse_cell(raw).map_err(|_| format!("column `{name}`: not numeric: {raw:?}"))?);
    }
    Ok(out)
}

/// Parse one cell. Stata missing codes (`.`, `.a` .. `.z`) and common NA
/// spellings are missing; anything else must be a finite-or-infinite number.
pub fn parse_cell(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let s = raw.trim();
    if is_missing_token(s) {
        return Ok(None);
    }
    s.parse::<f64>().map(|v| if v.is_nan() { None } else { Some(v) })
}

fn is_missing_token(s: &str) -> bool {
    if s.is_empty() || s == "." {
        return true;
    }
    let bytes = s.as_bytes();
    if bytes.len() == 2 && bytes[0] == b'.' && bytes[1].is_ascii_lowercase() {
        return true;
    }
    matches!(s, "NA" | "N/A" | "na" | "NaN" | "nan")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn stata_missing_codes_are_missing() {
        assert_eq!(parse_cell(".").unwrap(), None);
        assert_eq!(parse_cell(".b").unwrap(), None);
        assert_eq!(parse_cell("").unwrap(), None);
        assert_eq!(parse_cell("NaN").unwrap(), None);
        assert_eq!(parse_cell(" 12.5 ").unwrap(), Some(12.5));
        assert!(parse_cell("abc").is_err());
    }

    #[test]
    fn load_csv_skips_bad_rows_and_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hh.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "\u{feff}HHID,c2002").unwrap();
        writeln!(f, "1,2").unwrap();
        writeln!(f, "2,oops").unwrap();
        writeln!(f, "3,.").unwrap();
        drop(f);

        let ingested = load_csv(&path).unwrap();
        assert_eq!(ingested.rows_read, 3);
        assert_eq!(ingested.row_errors.len(), 1);
        assert_eq!(ingested.row_errors[0].line, 3);
        assert_eq!(ingested.table.n_rows(), 2);
        assert_eq!(ingested.table.column("hhid").unwrap(), &[Some(1.0), Some(3.0)]);
        assert_eq!(ingested.table.get("c2002", 1), None);
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        std::fs::write(&path, "hhid,HHID\n1,1\n").unwrap();
        assert!(matches!(
            load_csv(&path),
            Err(InputError::DuplicateColumn { .. })
        ));
    }
}
