//! Column-oriented numeric table.
//!
//! The survey extract is entirely numeric (codes, amounts, ids), so a table
//! is an ordered list of named `Option<f64>` columns of equal length.
//! `None` is a missing cell. Both the raw extract and the AnalysisTable use
//! this type; stages take `&Table` and return new tables rather than mutating
//! their input.

use std::collections::HashMap;

/// One named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    n_rows: usize,
}

impl Table {
    /// Empty table with a fixed row count (columns are added with `set_column`).
    pub fn with_rows(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            index: HashMap::new(),
            n_rows,
        }
    }

    /// Build from `(name, values)` pairs.
    ///
    /// # Panics
    /// Panics if the columns have different lengths; callers construct
    /// tables from data they already shaped.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Option<f64>>)>) -> Self {
        let n_rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut table = Table::with_rows(n_rows);
        for (name, values) in columns {
            table.set_column(name, values);
        }
        table
    }

    /// Convenience for tests and fixtures: every cell present.
    pub fn from_dense<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Self {
        Table::from_columns(
            columns
                .into_iter()
                .map(|(name, values)| (name, values.into_iter().map(Some).collect()))
                .collect(),
        )
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.index
            .get(name)
            .and_then(|&idx| self.columns.get(idx))
            .map(|c| c.values.as_slice())
    }

    /// Cell value, `None` if the column is absent or the cell is missing.
    pub fn get(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name).and_then(|c| c.get(row).copied().flatten())
    }

    /// Insert or replace a column, keeping the position of a replaced one.
    ///
    /// # Panics
    /// Panics if `values.len()` differs from the table's row count.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        let name = name.into();
        assert_eq!(
            values.len(),
            self.n_rows,
            "column '{name}' has {} rows, table has {}",
            values.len(),
            self.n_rows
        );
        match self.index.get(&name) {
            Some(&idx) => {
                if let Some(col) = self.columns.get_mut(idx) {
                    col.values = values;
                }
            }
            None => {
                self.index.insert(name.clone(), self.columns.len());
                self.columns.push(Column { name, values });
            }
        }
    }

    /// New table keeping only rows where `keep[row]` is true.
    pub fn filter_rows(&self, keep: &[bool]) -> Table {
        let n_rows = keep.iter().filter(|k| **k).count();
        let mut out = Table::with_rows(n_rows);
        for col in &self.columns {
            let values = col
                .values
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| *v)
                .collect();
            out.set_column(col.name.clone(), values);
        }
        out
    }

    /// New table with the named columns in the given order; absent names are skipped.
    pub fn select(&self, names: &[&str]) -> Table {
        let mut out = Table::with_rows(self.n_rows);
        for name in names {
            if let Some(values) = self.column(name) {
                out.set_column(*name, values.to_vec());
            }
        }
        out
    }

    /// Row-wise view of the named column as a dense vector, or `None` if absent.
    pub fn column_or_missing(&self, name: &str) -> Vec<Option<f64>> {
        self.column(name)
            .map(<[Option<f64>]>::to_vec)
            .unwrap_or_else(|| vec![None; self.n_rows])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_column_replaces_in_place() {
        let mut t = Table::from_dense(vec![("a", vec![1.0, 2.0]), ("b", vec![3.0, 4.0])]);
        t.set_column("a", vec![Some(9.0), None]);
        let names: Vec<&str> = t.column_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(t.get("a", 0), Some(9.0));
        assert_eq!(t.get("a", 1), None);
    }

    #[test]
    fn filter_rows_keeps_alignment() {
        let t = Table::from_dense(vec![("a", vec![1.0, 2.0, 3.0]), ("b", vec![4.0, 5.0, 6.0])]);
        let f = t.filter_rows(&[true, false, true]);
        assert_eq!(f.n_rows(), 2);
        assert_eq!(f.column("b").unwrap(), &[Some(4.0), Some(6.0)]);
    }

    #[test]
    fn select_skips_absent_columns() {
        let t = Table::from_dense(vec![("a", vec![1.0]), ("b", vec![2.0])]);
        let s = t.select(&["b", "zz", "a"]);
        let names: Vec<&str> = s.column_names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
