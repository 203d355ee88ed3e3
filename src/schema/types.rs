// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Kind inferred from a column's non-missing cells.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    /// Every cell is missing.
    Empty,
}

/// Per-column summary, the equivalent of a dataframe `info()` line.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub non_missing: usize,
    pub kind: ColumnKind,
}

/// A yearly sample after column-name normalization and age coercion.
#[derive(Debug, Clone)]
pub struct NormalizedSample {
    pub year: i32,
    /// Canonical column names, in file order.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Coerced age per row, parallel to `rows`.
    pub ages: Vec<Option<i64>>,
    /// Non-empty age cells that could not be read as an integer.
    pub invalid_ages: usize,
}

/// One record of the unified table.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRow {
    pub year: i32,
    pub age: Option<i64>,
    /// One cell per entry of [`UnifiedTable::columns`].
    pub cells: Vec<Option<String>>,
}

/// All normalized samples stacked under the union of their columns.
#[derive(Debug, Clone, Default)]
pub struct UnifiedTable {
    pub columns: Vec<String>,
    pub rows: Vec<UnifiedRow>,
}

impl UnifiedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The four fields every statistic reads.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq)]
pub struct AnalysisRecord {
    pub year: i32,
    pub age: Option<i64>,
    pub symptoms: Option<String>,
    pub outcome: Option<String>,
}
