use serde::Serialize;

use crate::{config::OutcomeLabels, schema::AnalysisRecord};

/// Share of `year`'s records whose outcome is exactly `target`.
/// Records with a missing outcome still count in the denominator.
/// A year without records has probability 0.
pub fn outcome_probability(records: &[AnalysisRecord], year: i32, target: &str) -> f64 {
    let (total, hits) = records
        .iter()
        .filter(|r| r.year == year)
        .fold((0usize, 0usize), |(total, hits), r| {
            let hit = r.outcome.as_deref() == Some(target);
            (total + 1, hits + usize::from(hit))
        });
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutcomeProbabilities {
    pub year: i32,
    pub death: f64,
    pub cure: f64,
    pub unknown: f64,
}

pub fn outcome_probabilities(
    records: &[AnalysisRecord],
    years: &[i32],
    labels: &OutcomeLabels,
) -> Vec<OutcomeProbabilities> {
    years
        .iter()
        .map(|&year| OutcomeProbabilities {
            year,
            death: outcome_probability(records, year, &labels.death),
            cure: outcome_probability(records, year, &labels.cure),
            unknown: outcome_probability(records, year, &labels.unknown),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(year: i32, counts: &[(&str, usize)]) -> Vec<AnalysisRecord> {
        counts
            .iter()
            .flat_map(|(outcome, n)| {
                std::iter::repeat_with(move || AnalysisRecord {
                    year,
                    age: None,
                    symptoms: None,
                    outcome: Some(outcome.to_string()),
                })
                .take(*n)
            })
            .collect()
    }

    #[test]
    fn test_zero_matches_is_exactly_zero() {
        let recs = records(2022, &[("Cura", 10)]);
        assert_eq!(outcome_probability(&recs, 2022, "Cancelado"), 0.0);
    }

    #[test]
    fn test_empty_year_is_zero() {
        let recs = records(2022, &[("Cura", 10)]);
        assert_eq!(outcome_probability(&recs, 2024, "Cura"), 0.0);
        assert_eq!(outcome_probability(&[], 2024, "Cura"), 0.0);
    }

    #[test]
    fn test_match_is_literal() {
        let recs = records(2022, &[("cura", 1), ("Cura ", 1), ("Cura", 2)]);
        assert_eq!(outcome_probability(&recs, 2022, "Cura"), 0.5);
    }

    #[test]
    fn test_missing_outcome_counts_in_denominator() {
        let mut recs = records(2022, &[("Cura", 1)]);
        recs.push(AnalysisRecord {
            year: 2022,
            age: None,
            symptoms: None,
            outcome: None,
        });
        assert_eq!(outcome_probability(&recs, 2022, "Cura"), 0.5);
    }

    #[test]
    fn test_probabilities_per_year() {
        let mut recs = records(2022, &[("Cura", 70), ("Cancelado", 20), ("Ignorado", 10)]);
        recs.extend(records(2024, &[("Cura", 40), ("Cancelado", 5), ("Ignorado", 5)]));
        let out = outcome_probabilities(&recs, &[2022, 2024], &OutcomeLabels::default());

        assert_eq!(out[0].year, 2022);
        assert!((out[0].death - 0.20).abs() < 1e-12);
        assert!((out[0].cure - 0.70).abs() < 1e-12);
        assert!((out[0].unknown - 0.10).abs() < 1e-12);
        assert!((out[1].death - 0.10).abs() < 1e-12);
        assert!((out[1].cure - 0.80).abs() < 1e-12);
    }
}
