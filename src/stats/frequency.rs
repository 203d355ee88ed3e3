use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::schema::AnalysisRecord;

/// Count of one category value within one year.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrequencyRow {
    pub year: i32,
    pub value: String,
    pub count: usize,
}

/// Counts the values `field` yields per year. Missing values are not a group.
/// Rows come back by year ascending, then count descending, then value.
fn frequencies_by_year<'a, F>(records: &'a [AnalysisRecord], field: F) -> BTreeMap<i32, Vec<FrequencyRow>>
where
    F: Fn(&'a AnalysisRecord) -> Option<&'a str>,
{
    let mut counts: BTreeMap<i32, HashMap<&'a str, usize>> = BTreeMap::new();
    for r in records {
        if let Some(v) = field(r) {
            *counts.entry(r.year).or_default().entry(v).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(year, by_value)| {
            let mut rows: Vec<FrequencyRow> = by_value
                .into_iter()
                .map(|(value, count)| FrequencyRow {
                    year,
                    value: value.to_string(),
                    count,
                })
                .collect();
            rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
            (year, rows)
        })
        .collect()
}

/// The `k` most frequent symptom strings of each year.
pub fn top_symptoms_by_year(records: &[AnalysisRecord], k: usize) -> Vec<FrequencyRow> {
    frequencies_by_year(records, |r| r.symptoms.as_deref())
        .into_values()
        .flat_map(|rows| rows.into_iter().take(k))
        .collect()
}

/// Full outcome frequency table of each year.
pub fn outcome_frequencies_by_year(records: &[AnalysisRecord]) -> Vec<FrequencyRow> {
    frequencies_by_year(records, |r| r.outcome.as_deref())
        .into_values()
        .flatten()
        .collect()
}
