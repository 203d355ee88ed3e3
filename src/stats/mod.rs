// src/stats/mod.rs
pub mod describe;
pub mod distribution;
pub mod frequency;
pub mod normality;
pub mod probability;
pub mod ttest;

pub use describe::{ages_by_year, describe_age_by_year, mean, quantile, sample_variance, AgeSummary};
pub use distribution::{gaussian_kde, histogram, linspace, normal_qq, HistogramBin, QqPlotData};
pub use frequency::{outcome_frequencies_by_year, top_symptoms_by_year, FrequencyRow};
pub use normality::{shapiro_wilk, ShapiroWilk};
pub use probability::{outcome_probabilities, outcome_probability, OutcomeProbabilities};
pub use ttest::{welch_t_test, WelchTTest};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("need at least {needed} observations, got {got}")]
    TooFewObservations { needed: usize, got: usize },
    #[error("all observations are identical")]
    ZeroRange,
    #[error("distribution error: {0}")]
    Distribution(String),
}

/// Standard normal, shared by the tests and plots that need one.
pub(crate) fn standard_normal() -> Result<statrs::distribution::Normal, StatsError> {
    statrs::distribution::Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))
}
