//! The row-keyed heterogeneous-column adapter (§9) and the explicit
//! column-to-feature-type mapping the caller supplies instead of relying on
//! schema inference (§1 Non-goals).

use std::collections::BTreeMap;

/// A minimal tabular data source: named columns, string-valued cells. A
/// caller with its own dataframe type implements this trait at the edge
/// rather than the core depending on any particular dataframe crate.
pub trait Table {
    fn columns(&self) -> Vec<&str>;
    fn row_count(&self) -> usize;
    /// The cell at `(row, column)`, or `None` if the column doesn't exist or
    /// the cell is null/missing.
    fn value(&self, row: usize, column: &str) -> Option<&str>;
}

/// A simple in-memory `Table` built from owned strings. Suitable for tests
/// and for callers who already hold their data as `Vec<BTreeMap<String,
/// String>>` rows.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    rows: Vec<BTreeMap<String, String>>,
}

impl RowTable {
    #[must_use]
    pub fn new(rows: Vec<BTreeMap<String, String>>) -> Self {
        Self { rows }
    }

    pub fn push_row(&mut self, row: BTreeMap<String, String>) {
        self.rows.push(row);
    }
}

impl Table for RowTable {
    fn columns(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        for row in &self.rows {
            for key in row.keys() {
                seen.insert(key.as_str());
            }
        }
        seen.into_iter().collect()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

/// One entry in a [`ColumnSpec`]: which feature type to run on a column, and
/// an optional label override so differently-named columns can be unified
/// under one shingle label (§4.1).
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub column: String,
    pub feature_type: String,
    pub label: Option<String>,
}

/// The explicit column-to-feature-type mapping the caller supplies (§1
/// Non-goals: "schema alignment by automated inference" is deliberately not
/// provided). Columns absent from the spec do not contribute to the
/// embedding.
#[derive(Debug, Clone, Default)]
pub struct ColumnSpec {
    mappings: Vec<ColumnMapping>,
}

impl ColumnSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_column(
        mut self,
        column: impl Into<String>,
        feature_type: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        self.mappings.push(ColumnMapping {
            column: column.into(),
            feature_type: feature_type.into(),
            label,
        });
        self
    }

    pub(crate) fn mappings(&self) -> &[ColumnMapping] {
        &self.mappings
    }
}
