// src/schema/normalize.rs
use anyhow::{anyhow, Result};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use super::types::NormalizedSample;
use crate::process::YearlySample;

/// Canonical column label: NFKD-decomposed with every non-ASCII code point
/// dropped, then trimmed and lowercased (`" Evolução"` → `"evolucao"`).
pub fn normalize_column_name(raw: &str) -> String {
    let folded: String = raw.nfkd().filter(char::is_ascii).collect();
    folded.trim().to_ascii_lowercase()
}

pub fn normalize_columns(headers: &[String]) -> Vec<String> {
    headers.iter().map(|h| normalize_column_name(h)).collect()
}

/// Reads an age cell as an integer. Integral float text (`"45.0"`) is
/// accepted; anything else is missing. Negative values are kept as-is.
pub fn coerce_age(raw: Option<&str>) -> Option<i64> {
    let v = raw?.trim();
    if v.is_empty() {
        return None;
    }
    if let Ok(i) = v.parse::<i64>() {
        return Some(i);
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(f as i64)
        }
        _ => None,
    }
}

/// Rewrites the sample's column labels to canonical form and coerces the
/// column named `age_column` (canonical name) into nullable integers.
pub fn normalize_sample(sample: &YearlySample, age_column: &str) -> Result<NormalizedSample> {
    let columns = normalize_columns(&sample.headers);

    let age_idx = columns.iter().position(|c| c == age_column).ok_or_else(|| {
        anyhow!(
            "sample {} has no `{}` column (columns: {:?})",
            sample.year,
            age_column,
            columns
        )
    })?;

    let mut invalid_ages = 0;
    let ages: Vec<Option<i64>> = sample
        .rows
        .iter()
        .map(|row| {
            let cell = row.get(age_idx).and_then(|c| c.as_deref());
            let age = coerce_age(cell);
            if age.is_none() && cell.is_some_and(|c| !c.trim().is_empty()) {
                invalid_ages += 1;
            }
            age
        })
        .collect();

    if invalid_ages > 0 {
        warn!(
            year = sample.year,
            invalid_ages, "non-numeric ages coerced to missing"
        );
    }
    debug!(year = sample.year, ?columns, "normalized columns");

    Ok(NormalizedSample {
        year: sample.year,
        columns,
        rows: sample.rows.clone(),
        ages,
        invalid_ages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  Idade "), "idade");
        assert_eq!(normalize_column_name("evoluçãoCaso"), "evolucaocaso");
        assert_eq!(normalize_column_name("Sintomas"), "sintomas");
        assert_eq!(normalize_column_name("Município Notificação"), "municipio notificacao");
        assert_eq!(normalize_column_name("Nº"), "no");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw: Vec<String> = ["  Idade", "SINTOMAS ", "Evolução Caso", "código_ÍBGE", "ß"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let once = normalize_columns(&raw);
        let twice = normalize_columns(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_coerce_age() {
        let inputs = [Some("45"), Some("abc"), Some(""), Some("-3"), None];
        let got: Vec<Option<i64>> = inputs.iter().map(|v| coerce_age(*v)).collect();
        assert_eq!(got, vec![Some(45), None, None, Some(-3), None]);
    }

    #[test]
    fn test_coerce_age_float_text() {
        assert_eq!(coerce_age(Some("45.0")), Some(45));
        assert_eq!(coerce_age(Some(" 7 ")), Some(7));
        assert_eq!(coerce_age(Some("45.5")), None);
        assert_eq!(coerce_age(Some("NaN")), None);
        assert_eq!(coerce_age(Some("inf")), None);
    }

    #[test]
    fn test_normalize_sample_counts_invalid_ages() {
        let sample = YearlySample::from_rows(
            2022,
            [" Idade", "Sintomas"],
            vec![
                vec!["45", "Febre"],
                vec!["abc", "Tosse"],
                vec!["", "Tosse"],
                vec!["-3", ""],
            ],
        );
        let norm = normalize_sample(&sample, "idade").unwrap();
        assert_eq!(norm.columns, vec!["idade", "sintomas"]);
        assert_eq!(norm.ages, vec![Some(45), None, None, Some(-3)]);
        assert_eq!(norm.invalid_ages, 1);
        assert_eq!(norm.rows.len(), 4);
    }

    #[test]
    fn test_normalize_sample_requires_age_column() {
        let sample = YearlySample::from_rows(2024, ["sintomas"], vec![vec!["Febre"]]);
        assert!(normalize_sample(&sample, "idade").is_err());
    }
}
