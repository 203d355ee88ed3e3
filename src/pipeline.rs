// src/pipeline.rs
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::{
    config::AnalysisConfig,
    plot::{self, RenderedPlot, PALETTE},
    process::{load_yearly_sample, YearlySample},
    schema::{self, AnalysisRecord, ColumnInfo},
    stats::{self, AgeSummary, FrequencyRow, OutcomeProbabilities, ShapiroWilk, WelchTTest},
};

/// What happened to one yearly file on its way into the unified table.
#[derive(Debug, Clone, Serialize)]
pub struct SampleSummary {
    pub year: i32,
    pub source: PathBuf,
    /// Header labels as written in the file.
    pub raw_headers: Vec<String>,
    /// Normalized columns with their non-missing counts and inferred kinds.
    pub columns: Vec<ColumnInfo>,
    pub rows: usize,
    pub rejected_rows: usize,
    pub truncated: bool,
    /// Non-empty age cells coerced to missing.
    pub invalid_ages: usize,
    /// First rows of the raw sample, for display.
    pub preview: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NormalityCheck {
    Tested {
        year: i32,
        result: ShapiroWilk,
        normal: bool,
    },
    /// The sample could not be tested (too small, no spread).
    Inconclusive { year: i32, reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MeanComparison {
    Tested {
        result: WelchTTest,
        rejects_equal_means: bool,
    },
    /// A year has fewer than two ages.
    Inconclusive { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct YearMean {
    pub year: i32,
    pub mean_age: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceReport {
    pub significance_level: f64,
    pub mean_ages: Vec<YearMean>,
    pub normality: Vec<NormalityCheck>,
    /// The two compared years, in t-test order.
    pub years: (i32, i32),
    pub t_test: MeanComparison,
}

/// Everything one run produces. Plot bytes are kept in memory until
/// [`write_plots`] puts them on disk.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub samples: Vec<SampleSummary>,
    pub unified_rows: usize,
    pub unified_columns: Vec<String>,
    pub analysis_preview: Vec<AnalysisRecord>,
    pub age_summaries: Vec<AgeSummary>,
    pub top_symptoms: Vec<FrequencyRow>,
    pub outcome_frequencies: Vec<FrequencyRow>,
    pub probabilities: Option<Vec<OutcomeProbabilities>>,
    pub inference: Option<InferenceReport>,
    pub plots: Vec<RenderedPlot>,
}

/// Loads every configured yearly sample. A missing file surfaces as
/// [`crate::process::LoadError::MissingSource`].
pub fn load_samples(config: &AnalysisConfig) -> Result<Vec<YearlySample>> {
    config
        .samples
        .iter()
        .map(|s| {
            load_yearly_sample(
                config.sample_path(s),
                s.year,
                config.max_rows,
                config.delimiter as u8,
            )
        })
        .collect()
}

/// Loads the configured files and analyzes them.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let samples = load_samples(config)?;
    info!("sample loading complete");
    analyze_samples(&samples, config)
}

/// Runs every stage after loading. Touches no files.
#[instrument(level = "info", skip_all, fields(samples = samples.len()))]
pub fn analyze_samples(samples: &[YearlySample], config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    // ─── 1) normalize + unify + project ─────────────────────────────
    let normalized = samples
        .iter()
        .map(|s| schema::normalize_sample(s, &config.columns.age))
        .collect::<Result<Vec<_>>>()?;

    let summaries: Vec<SampleSummary> = samples
        .iter()
        .zip(&normalized)
        .map(|(raw, norm)| SampleSummary {
            year: raw.year,
            source: raw.source.clone(),
            raw_headers: raw.headers.clone(),
            columns: schema::derive_column_info(&norm.columns, &norm.rows),
            rows: raw.rows.len(),
            rejected_rows: raw.rejected_rows,
            truncated: raw.truncated,
            invalid_ages: norm.invalid_ages,
            preview: raw.rows.iter().take(config.preview_rows).cloned().collect(),
        })
        .collect();

    let unified = schema::unify(&normalized);
    let records = schema::project(&unified, &config.columns)?;
    let years: Vec<i32> = samples.iter().map(|s| s.year).collect();

    // ─── 2) descriptive statistics ──────────────────────────────────
    let age_summaries = stats::describe_age_by_year(&records);
    let top_symptoms = stats::top_symptoms_by_year(&records, config.top_symptoms);
    let outcome_frequencies = stats::outcome_frequencies_by_year(&records);
    info!(
        years = age_summaries.len(),
        symptom_rows = top_symptoms.len(),
        outcome_rows = outcome_frequencies.len(),
        "descriptive statistics done"
    );

    // ─── 3) probabilities ───────────────────────────────────────────
    let probabilities = config
        .stages
        .probabilities
        .then(|| stats::outcome_probabilities(&records, &years, &config.outcomes));

    // ─── 4) inference + plots ───────────────────────────────────────
    let (inference, plots) = if config.stages.inference {
        let [a, b] = years[..] else {
            bail!("inference compares exactly two years, got {:?}", years);
        };
        let (report, plots) = run_inference(&records, (a, b), config)?;
        (Some(report), plots)
    } else {
        (None, Vec::new())
    };

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        samples: summaries,
        unified_rows: unified.len(),
        unified_columns: unified.columns.clone(),
        analysis_preview: records.iter().take(config.preview_rows).cloned().collect(),
        age_summaries,
        top_symptoms,
        outcome_frequencies,
        probabilities,
        inference,
        plots,
    })
}

#[instrument(level = "info", skip_all)]
fn run_inference(
    records: &[AnalysisRecord],
    (a, b): (i32, i32),
    config: &AnalysisConfig,
) -> Result<(InferenceReport, Vec<RenderedPlot>)> {
    let alpha = config.significance_level;
    let years = [a, b];
    let mut by_year = stats::ages_by_year(records);
    by_year.retain(|y, _| years.contains(y));
    for y in years {
        by_year.entry(y).or_default();
    }

    let mean_ages: Vec<YearMean> = years
        .iter()
        .map(|&year| YearMean {
            year,
            mean_age: stats::mean(&by_year[&year]),
        })
        .collect();

    // plots
    let mut plots = Vec::new();
    match plot::age_boxplot(&by_year) {
        Ok(p) => plots.push(p),
        Err(e) => warn!("skipping age boxplot: {:#}", e),
    }
    for (i, &year) in years.iter().enumerate() {
        let ages = &by_year[&year];
        if ages.is_empty() {
            warn!(year, "no ages; skipping histogram and qq plot");
            continue;
        }
        let colour = PALETTE[i % PALETTE.len()];
        plots.push(plot::age_histogram(year, ages, config.histogram_bins, colour)?);
        plots.push(plot::age_qqplot(year, ages, colour)?);
    }

    // normality per year
    let normality: Vec<NormalityCheck> = years
        .iter()
        .map(|&year| match stats::shapiro_wilk(&by_year[&year]) {
            Ok(result) => NormalityCheck::Tested {
                year,
                normal: result.is_normal(alpha),
                result,
            },
            Err(e) => {
                warn!(year, error = %e, "normality test inconclusive");
                NormalityCheck::Inconclusive {
                    year,
                    reason: e.to_string(),
                }
            }
        })
        .collect();

    // mean difference
    let t_test = match stats::welch_t_test(&by_year[&a], &by_year[&b]) {
        Ok(result) => {
            info!(
                statistic = result.statistic,
                p_value = result.p_value,
                "welch t-test done"
            );
            MeanComparison::Tested {
                rejects_equal_means: result.rejects_equal_means(alpha),
                result,
            }
        }
        Err(e) => {
            warn!(a, b, error = %e, "t-test inconclusive");
            MeanComparison::Inconclusive {
                reason: e.to_string(),
            }
        }
    };

    Ok((
        InferenceReport {
            significance_level: alpha,
            mean_ages,
            normality,
            years: (a, b),
            t_test,
        },
        plots,
    ))
}

/// Writes every plot into `out_dir`, creating it first. Files already there
/// with the same names are overwritten.
pub fn write_plots<P: AsRef<Path>>(plots: &[RenderedPlot], out_dir: P) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(plots.len());
    for p in plots {
        let path = out_dir.join(&p.file_name);
        fs::write(&path, &p.png).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote plot");
        written.push(path);
    }
    Ok(written)
}
