// src/schema/unify.rs
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use tracing::info;

use super::types::{AnalysisRecord, NormalizedSample, UnifiedRow, UnifiedTable};
use crate::config::ColumnNames;

/// Stacks every sample, in order, under the union of their columns
/// (first-seen order). No record is dropped or deduplicated; a row whose
/// sample lacks a column holds a missing cell there.
pub fn unify(samples: &[NormalizedSample]) -> UnifiedTable {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for s in samples {
        for c in &s.columns {
            if !index.contains_key(c) {
                index.insert(c.clone(), columns.len());
                columns.push(c.clone());
            }
        }
    }

    let total: usize = samples.iter().map(|s| s.rows.len()).sum();
    let mut rows = Vec::with_capacity(total);
    for s in samples {
        // duplicate labels within one sample: the first occurrence wins
        let mut mapping: Vec<Option<usize>> = vec![None; s.columns.len()];
        let mut taken = vec![false; columns.len()];
        for (src, name) in s.columns.iter().enumerate() {
            let dst = index[name];
            if !taken[dst] {
                taken[dst] = true;
                mapping[src] = Some(dst);
            }
        }

        for (row, age) in s.rows.iter().zip(&s.ages) {
            let mut cells = vec![None; columns.len()];
            for (src, cell) in row.iter().enumerate() {
                if let Some(Some(dst)) = mapping.get(src) {
                    cells[*dst] = cell.clone();
                }
            }
            rows.push(UnifiedRow {
                year: s.year,
                age: *age,
                cells,
            });
        }
    }

    info!(rows = rows.len(), columns = columns.len(), "unified samples");
    UnifiedTable { columns, rows }
}

/// Projects the unified table onto age, symptoms, outcome and year.
pub fn project(table: &UnifiedTable, names: &ColumnNames) -> Result<Vec<AnalysisRecord>> {
    let find = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| anyhow!("unified table has no `{}` column", name))
    };
    let symptoms = find(&names.symptoms)?;
    let outcome = find(&names.outcome)?;

    Ok(table
        .rows
        .iter()
        .map(|r| AnalysisRecord {
            year: r.year,
            age: r.age,
            symptoms: r.cells[symptoms].clone(),
            outcome: r.cells[outcome].clone(),
        })
        .collect())
}
