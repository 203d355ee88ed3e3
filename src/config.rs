// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "analysis.yaml";

/// One reporting year and the file (relative to `data_dir`) holding it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleSource {
    pub year: i32,
    pub file: String,
}

/// Canonical (already normalized) names of the columns the analysis reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnNames {
    pub age: String,
    pub symptoms: String,
    pub outcome: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            age: "idade".into(),
            symptoms: "sintomas".into(),
            outcome: "evolucaocaso".into(),
        }
    }
}

/// Outcome categories, matched literally against the outcome column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutcomeLabels {
    pub death: String,
    pub cure: String,
    pub unknown: String,
}

impl Default for OutcomeLabels {
    fn default() -> Self {
        Self {
            death: "Cancelado".into(),
            cure: "Cura".into(),
            unknown: "Ignorado".into(),
        }
    }
}

/// Optional pipeline stages. Descriptive statistics always run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Stages {
    pub probabilities: bool,
    pub inference: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            probabilities: true,
            inference: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub samples: Vec<SampleSource>,
    /// Hard cap on accepted records per yearly file.
    pub max_rows: usize,
    pub delimiter: char,
    pub columns: ColumnNames,
    pub outcomes: OutcomeLabels,
    pub top_symptoms: usize,
    pub histogram_bins: usize,
    pub significance_level: f64,
    /// Rows shown per sample in the console preview.
    pub preview_rows: usize,
    pub stages: Stages,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dados"),
            output_dir: PathBuf::from("output"),
            samples: vec![
                SampleSource {
                    year: 2022,
                    file: "Notificações de Síndrome Gripal - 2022_MAIOR.csv".into(),
                },
                SampleSource {
                    year: 2024,
                    file: "Notificações de Síndrome Gripal - 2024_MAIOR.csv".into(),
                },
            ],
            max_rows: 5000,
            delimiter: ';',
            columns: ColumnNames::default(),
            outcomes: OutcomeLabels::default(),
            top_symptoms: 4,
            histogram_bins: 30,
            significance_level: 0.05,
            preview_rows: 5,
            stages: Stages::default(),
        }
    }
}

impl AnalysisConfig {
    /// Reads `path` when it exists, otherwise falls back to the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let cfg = if path.is_file() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let cfg: AnalysisConfig = serde_yaml::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?;
            info!(path = %path.display(), "loaded config");
            cfg
        } else {
            info!(path = %path.display(), "no config file, using defaults");
            AnalysisConfig::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples.is_empty() {
            bail!("config lists no samples");
        }
        let mut years = HashSet::new();
        for s in &self.samples {
            if !years.insert(s.year) {
                bail!("year {} is listed more than once", s.year);
            }
        }
        if self.max_rows == 0 {
            bail!("max_rows must be positive");
        }
        if !self.delimiter.is_ascii() {
            bail!("delimiter {:?} is not a single-byte character", self.delimiter);
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            bail!(
                "significance_level must lie in (0, 1), got {}",
                self.significance_level
            );
        }
        if self.histogram_bins == 0 {
            bail!("histogram_bins must be positive");
        }
        if self.stages.inference && self.samples.len() != 2 {
            bail!(
                "inference compares exactly two years, config lists {}",
                self.samples.len()
            );
        }
        Ok(())
    }

    pub fn sample_path(&self, source: &SampleSource) -> PathBuf {
        self.data_dir.join(&source.file)
    }
}
