use anyhow::{Context, Result};
use flusurv::{
    config::{AnalysisConfig, CONFIG_FILE},
    pipeline::run_analysis,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Runs the analysis and prints the report as JSON, without plot bodies.
fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr) // stdout carries the JSON
        .init();

    let config = AnalysisConfig::load_or_default(CONFIG_FILE)?;
    let report = run_analysis(&config).context("Failed to run analysis")?;
    tracing::info!(plots = report.plots.len(), "analysis finished");

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
