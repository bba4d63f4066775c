//! Household-head extraction and merge.
//!
//! The individual extract has one row per household member. Heads are the
//! members flagged `a2001 == 1`; their demographics become the head controls
//! of the household row.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::config::Settings;
use crate::data::variables::{head, household};
use crate::domain::Table;
use crate::error::FeatureError;

const STEP: &str = "extract_heads";

/// One row per household head, keyed on `hhid`.
///
/// Columns: `hhid`, `head_age`, `head_siblings`, then the renamed
/// demographics (`head_sex`, `head_educ`, `head_marital`, `head_health`) that
/// are present in the extract.
pub fn extract_heads(individuals: &Table, settings: &Settings) -> Result<Table, FeatureError> {
    let hhid = required(individuals, household::ID)?;
    let flag = required(individuals, head::FLAG)?;
    let birth_year = required(individuals, head::BIRTH_YEAR)?;
    let older = individuals.column_or_missing(head::OLDER_SIBLINGS);
    let younger = individuals.column_or_missing(head::YOUNGER_SIBLINGS);

    let survey_year = f64::from(settings.survey_year);
    let mut seen = HashSet::new();
    let mut keep = vec![false; individuals.n_rows()];
    let mut ages = vec![None; individuals.n_rows()];
    let mut flagged = 0usize;
    let mut too_young = 0usize;

    for row in 0..individuals.n_rows() {
        if flag[row] != Some(1.0) {
            continue;
        }
        flagged += 1;

        let age = birth_year[row].map(|y| survey_year - y);
        // Unknown age cannot pass the minimum-age filter.
        if !age.is_some_and(|a| a >= settings.head_min_age) {
            too_young += 1;
            continue;
        }
        let Some(id) = hhid[row] else {
            continue;
        };
        // First head per household wins.
        if !seen.insert(id.to_bits()) {
            continue;
        }
        keep[row] = true;
        ages[row] = age;
    }

    info!(flagged, "identified household heads");
    if too_young > 0 {
        warn!(
            dropped = too_young,
            min_age = settings.head_min_age,
            "dropped heads below minimum age"
        );
    }

    let siblings: Vec<Option<f64>> = (0..individuals.n_rows())
        .map(|row| {
            let age = ages[row]?;
            if age > settings.sibling_max_age {
                return None;
            }
            Some(older[row].unwrap_or(0.0) + younger[row].unwrap_or(0.0))
        })
        .collect();

    let mut heads = Table::with_rows(individuals.n_rows());
    heads.set_column(household::ID, hhid.to_vec());
    heads.set_column("head_age", ages);
    heads.set_column("head_siblings", siblings);
    for (raw, renamed) in head::RENAMES {
        if let Some(values) = individuals.column(raw) {
            heads.set_column(renamed, values.to_vec());
        }
    }
    let heads = heads.filter_rows(&keep);

    info!(heads = heads.n_rows(), "prepared head records for merge");
    Ok(heads)
}

/// Left-join head columns onto the household table on `hhid`.
///
/// Households without a head keep missing head columns. A join that would
/// change the household row count (duplicate `hhid` among heads) is an error.
pub fn merge_heads(households: &Table, heads: &Table) -> Result<Table, FeatureError> {
    let hh_ids = households
        .column(household::ID)
        .ok_or_else(|| missing("merge_heads", household::ID))?;
    let head_ids = heads
        .column(household::ID)
        .ok_or_else(|| missing("merge_heads", household::ID))?;

    let mut by_id: HashMap<u64, Vec<usize>> = HashMap::new();
    for (row, id) in head_ids.iter().enumerate() {
        if let Some(id) = id {
            by_id.entry(id.to_bits()).or_default().push(row);
        }
    }

    let before = households.n_rows();
    let after: usize = hh_ids
        .iter()
        .map(|id| {
            id.and_then(|id| by_id.get(&id.to_bits()))
                .map_or(1, Vec::len)
        })
        .sum();
    if after != before {
        return Err(FeatureError::MergeCardinality { before, after });
    }

    let matches: Vec<Option<usize>> = hh_ids
        .iter()
        .map(|id| {
            id.and_then(|id| by_id.get(&id.to_bits()))
                .and_then(|rows| rows.first().copied())
        })
        .collect();

    let mut merged = households.clone();
    for col in heads.columns() {
        if col.name == household::ID {
            continue;
        }
        let values = matches
            .iter()
            .map(|m| m.and_then(|row| col.values[row]))
            .collect();
        merged.set_column(col.name.clone(), values);
    }

    let matched = matches.iter().filter(|m| m.is_some()).count();
    info!(
        matched,
        households = before,
        pct = if before > 0 { matched as f64 / before as f64 * 100.0 } else { 0.0 },
        "merged head info"
    );
    Ok(merged)
}

fn required<'a>(table: &'a Table, column: &str) -> Result<&'a [Option<f64>], FeatureError> {
    table.column(column).ok_or_else(|| missing(STEP, column))
}

fn missing(step: &'static str, column: &str) -> FeatureError {
    FeatureError::MissingColumn {
        step,
        column: column.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individuals() -> Table {
        Table::from_columns(vec![
            ("hhid", vec![Some(1.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            ("a2001", vec![Some(1.0), Some(2.0), Some(1.0), Some(1.0), Some(1.0)]),
            // ages 37, 12, 57, 10 (too young), 30
            ("a2005", vec![Some(1980.0), Some(2005.0), Some(1960.0), Some(2007.0), Some(1987.0)]),
            ("a2028", vec![Some(2.0), None, Some(1.0), Some(0.0), None]),
            ("a2029", vec![Some(1.0), None, Some(3.0), Some(0.0), None]),
            ("a2003", vec![Some(1.0), Some(2.0), Some(2.0), Some(1.0), Some(1.0)]),
        ])
    }

    #[test]
    fn heads_get_age_and_siblings_for_young_heads_only() {
        let heads = extract_heads(&individuals(), &Settings::default()).unwrap();
        assert_eq!(heads.column("hhid").unwrap(), &[Some(1.0), Some(2.0), Some(4.0)]);
        assert_eq!(heads.column("head_age").unwrap(), &[Some(37.0), Some(57.0), Some(30.0)]);
        // 57 > 40: siblings missing; missing sibling counts read as zero.
        assert_eq!(heads.column("head_siblings").unwrap(), &[Some(3.0), None, Some(0.0)]);
        assert_eq!(heads.column("head_sex").unwrap(), &[Some(1.0), Some(2.0), Some(1.0)]);
        assert!(!heads.has_column("head_educ"));
    }

    #[test]
    fn missing_flag_column_is_a_feature_error() {
        let ind = Table::from_dense(vec![("hhid", vec![1.0]), ("a2005", vec![1980.0])]);
        let err = extract_heads(&ind, &Settings::default()).unwrap_err();
        assert!(matches!(err, FeatureError::MissingColumn { ref column, .. } if column == "a2001"));
    }

    #[test]
    fn merge_is_left_join_on_hhid() {
        let heads = extract_heads(&individuals(), &Settings::default()).unwrap();
        let households = Table::from_dense(vec![("hhid", vec![3.0, 2.0, 1.0]), ("c2002", vec![0.0, 1.0, 2.0])]);
        let merged = merge_heads(&households, &heads).unwrap();
        assert_eq!(merged.n_rows(), 3);
        assert_eq!(merged.column("head_age").unwrap(), &[None, Some(57.0), Some(37.0)]);
        assert_eq!(merged.get("c2002", 2), Some(2.0));
    }

    #[test]
    fn duplicate_head_ids_break_cardinality() {
        let heads = Table::from_dense(vec![("hhid", vec![1.0, 1.0]), ("head_age", vec![30.0, 40.0])]);
        let households = Table::from_dense(vec![("hhid", vec![1.0, 2.0])]);
        let err = merge_heads(&households, &heads).unwrap_err();
        assert!(matches!(err, FeatureError::MergeCardinality { before: 2, after: 3 }));
    }
}
