use serde::Serialize;
use std::collections::BTreeMap;

use crate::schema::AnalysisRecord;

/// Grouped `describe()` row for the age column of one year.
/// Statistics that are undefined for the sample size are `NaN`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgeSummary {
    pub year: i32,
    /// Non-missing ages.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl AgeSummary {
    pub fn from_values(year: i32, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        AgeSummary {
            year,
            count: sorted.len(),
            mean: mean(&sorted),
            std: sample_variance(&sorted).sqrt(),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased variance; `NaN` below two observations.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Quantile of an ascending slice with linear interpolation between ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

/// Non-missing ages per year, years ascending. Every year present in
/// `records` gets an entry, possibly empty.
pub fn ages_by_year(records: &[AnalysisRecord]) -> BTreeMap<i32, Vec<f64>> {
    let mut map: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for r in records {
        let ages = map.entry(r.year).or_default();
        if let Some(age) = r.age {
            ages.push(age as f64);
        }
    }
    map
}

pub fn describe_age_by_year(records: &[AnalysisRecord]) -> Vec<AgeSummary> {
    ages_by_year(records)
        .into_iter()
        .map(|(year, ages)| AgeSummary::from_values(year, &ages))
        .collect()
}
