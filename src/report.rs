// src/report.rs
use prettytable::{format, Cell, Row, Table};

use crate::{
    pipeline::{AnalysisReport, InferenceReport, MeanComparison, NormalityCheck, SampleSummary},
    stats::FrequencyRow,
};

fn header(labels: &[&str]) -> Row {
    Row::new(labels.iter().map(|l| Cell::new(l).style_spec("bFg")).collect())
}

fn new_table(labels: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(header(labels));
    table
}

fn num(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else {
        format!("{:.2}", v)
    }
}

fn right(s: String) -> Cell {
    Cell::new(&s).style_spec("r")
}

fn section(title: &str) {
    println!("\n=== {} ===", title);
}

/// Writes the whole report to stdout.
pub fn print_report(report: &AnalysisReport) {
    for s in &report.samples {
        print_sample(s);
    }

    section("Unified table");
    println!(
        "{} rows, {} columns: {}",
        report.unified_rows,
        report.unified_columns.len(),
        report.unified_columns.join(", ")
    );
    let mut preview = new_table(&["year", "age", "symptoms", "outcome"]);
    for r in &report.analysis_preview {
        preview.add_row(Row::new(vec![
            Cell::new(&r.year.to_string()),
            right(r.age.map(|a| a.to_string()).unwrap_or_default()),
            Cell::new(r.symptoms.as_deref().unwrap_or("")),
            Cell::new(r.outcome.as_deref().unwrap_or("")),
        ]));
    }
    preview.printstd();

    section("Age by year");
    let mut ages = new_table(&["year", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
    for a in &report.age_summaries {
        ages.add_row(Row::new(vec![
            Cell::new(&a.year.to_string()),
            right(a.count.to_string()),
            right(num(a.mean)),
            right(num(a.std)),
            right(num(a.min)),
            right(num(a.q1)),
            right(num(a.median)),
            right(num(a.q3)),
            right(num(a.max)),
        ]));
    }
    ages.printstd();

    section("Most frequent symptoms");
    frequency_table("symptoms", &report.top_symptoms).printstd();

    section("Outcome frequencies");
    frequency_table("outcome", &report.outcome_frequencies).printstd();

    if let Some(probs) = &report.probabilities {
        section("Outcome probabilities");
        let mut table = new_table(&["year", "death", "cure", "unknown"]);
        for p in probs {
            table.add_row(Row::new(vec![
                Cell::new(&p.year.to_string()),
                right(format!("{:.4}", p.death)),
                right(format!("{:.4}", p.cure)),
                right(format!("{:.4}", p.unknown)),
            ]));
        }
        table.printstd();
    }

    if let Some(inference) = &report.inference {
        print_inference(inference);
    }

    if !report.plots.is_empty() {
        section("Plots");
        for p in &report.plots {
            println!("{}  ({})", p.file_name, p.title);
        }
    }
}

fn print_sample(s: &SampleSummary) {
    section(&format!("Sample {} ({})", s.year, s.source.display()));
    println!(
        "{} rows loaded, {} rejected{}, {} unreadable ages",
        s.rows,
        s.rejected_rows,
        if s.truncated { ", truncated at the row cap" } else { "" },
        s.invalid_ages
    );

    if !s.preview.is_empty() {
        let labels: Vec<&str> = s.raw_headers.iter().map(String::as_str).collect();
        let mut table = new_table(&labels);
        for row in &s.preview {
            table.add_row(Row::new(
                row.iter().map(|c| Cell::new(c.as_deref().unwrap_or(""))).collect(),
            ));
        }
        table.printstd();
    }

    let mut info = new_table(&["column", "non-missing", "kind"]);
    for c in &s.columns {
        info.add_row(Row::new(vec![
            Cell::new(&c.name),
            right(c.non_missing.to_string()),
            Cell::new(&format!("{:?}", c.kind).to_lowercase()),
        ]));
    }
    info.printstd();
}

fn frequency_table(label: &str, rows: &[FrequencyRow]) -> Table {
    let mut table = new_table(&["year", label, "count"]);
    for r in rows {
        table.add_row(Row::new(vec![
            Cell::new(&r.year.to_string()),
            Cell::new(&r.value),
            right(r.count.to_string()),
        ]));
    }
    table
}

fn print_inference(inference: &InferenceReport) {
    section("Mean age");
    for m in &inference.mean_ages {
        println!("{}: {}", m.year, num(m.mean_age));
    }

    section("Shapiro-Wilk");
    let mut table = new_table(&["year", "n", "W", "p-value"]);
    for check in &inference.normality {
        match check {
            NormalityCheck::Tested { year, result, .. } => table.add_row(Row::new(vec![
                Cell::new(&year.to_string()),
                right(result.n.to_string()),
                right(format!("{:.4}", result.statistic)),
                right(format!("{:.4e}", result.p_value)),
            ])),
            NormalityCheck::Inconclusive { year, reason } => table.add_row(Row::new(vec![
                Cell::new(&year.to_string()),
                Cell::new(reason).with_hspan(3),
            ])),
        };
    }
    table.printstd();

    section("Welch t-test");
    match &inference.t_test {
        MeanComparison::Tested { result: t, .. } => println!(
            "t = {:.4}, df = {:.2}, p = {:.4e}",
            t.statistic, t.df, t.p_value
        ),
        MeanComparison::Inconclusive { reason } => println!("not run: {}", reason),
    }

    section("Conclusions");
    for line in conclusions(inference) {
        println!("- {}", line);
    }
}

/// Plain-language reading of the inference results.
pub fn conclusions(inference: &InferenceReport) -> Vec<String> {
    let alpha = inference.significance_level;
    let mut lines: Vec<String> = inference
        .normality
        .iter()
        .map(|check| match check {
            NormalityCheck::Tested { year, result, normal } => {
                if *normal {
                    format!(
                        "{}: ages are consistent with a normal distribution (p = {:.4} > {})",
                        year, result.p_value, alpha
                    )
                } else {
                    format!(
                        "{}: ages do not follow a normal distribution (p = {:.4e} <= {})",
                        year, result.p_value, alpha
                    )
                }
            }
            NormalityCheck::Inconclusive { year, reason } => {
                format!("{}: normality could not be tested ({})", year, reason)
            }
        })
        .collect();

    let (a, b) = inference.years;
    lines.push(match &inference.t_test {
        MeanComparison::Tested {
            result,
            rejects_equal_means: true,
        } => format!(
            "mean age differs significantly between {} and {} (p = {:.4e} < {})",
            a, b, result.p_value, alpha
        ),
        MeanComparison::Tested { result, .. } => format!(
            "no significant difference in mean age between {} and {} (p = {:.4} >= {})",
            a, b, result.p_value, alpha
        ),
        MeanComparison::Inconclusive { reason } => format!(
            "mean age of {} and {} could not be compared ({})",
            a, b, reason
        ),
    });
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::YearMean;
    use crate::stats::{ShapiroWilk, WelchTTest};

    fn inference(p_value: f64) -> InferenceReport {
        InferenceReport {
            significance_level: 0.05,
            mean_ages: vec![
                YearMean { year: 2022, mean_age: 40.0 },
                YearMean { year: 2024, mean_age: 42.0 },
            ],
            normality: vec![
                NormalityCheck::Tested {
                    year: 2022,
                    result: ShapiroWilk { n: 50, statistic: 0.99, p_value: 0.6 },
                    normal: true,
                },
                NormalityCheck::Inconclusive {
                    year: 2024,
                    reason: "all observations are identical".into(),
                },
            ],
            years: (2022, 2024),
            t_test: MeanComparison::Tested {
                result: WelchTTest {
                    statistic: -1.0,
                    df: 98.0,
                    p_value,
                    mean_a: 40.0,
                    mean_b: 42.0,
                },
                rejects_equal_means: p_value < 0.05,
            },
        }
    }

    #[test]
    fn test_conclusions_follow_results() {
        let lines = conclusions(&inference(0.3));
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("2022: ages are consistent"));
        assert!(lines[1].contains("could not be tested"));
        assert!(lines[2].starts_with("no significant difference"));

        let lines = conclusions(&inference(0.001));
        assert!(lines[2].starts_with("mean age differs significantly"));
    }

    #[test]
    fn test_conclusion_without_t_test() {
        let mut report = inference(0.3);
        report.t_test = MeanComparison::Inconclusive {
            reason: "need at least 2 observations, got 1".into(),
        };
        let lines = conclusions(&report);
        assert_eq!(
            lines[2],
            "mean age of 2022 and 2024 could not be compared (need at least 2 observations, got 1)"
        );
    }

    #[test]
    fn test_nan_formatting() {
        assert_eq!(num(f64::NAN), "NaN");
        assert_eq!(num(2.0 / 3.0), "0.67");
    }
}
