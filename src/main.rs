use anyhow::Result;
use flusurv::{
    config::{AnalysisConfig, CONFIG_FILE},
    pipeline::{run_analysis, write_plots, AnalysisReport},
    process::LoadError,
    report::print_report,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// A missing input file ends the run quietly (`None`); any other failure
/// is returned.
fn report_or_missing(result: Result<AnalysisReport>) -> Result<Option<AnalysisReport>> {
    match result {
        Ok(report) => Ok(Some(report)),
        Err(e) => {
            if let Some(missing @ LoadError::MissingSource { .. }) = e.downcast_ref::<LoadError>() {
                error!("{}; nothing to analyze", missing);
                return Ok(None);
            }
            Err(e)
        }
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) configuration ────────────────────────────────────────────
    let config = AnalysisConfig::load_or_default(CONFIG_FILE)?;

    // ─── 3) load + analyze ───────────────────────────────────────────
    let Some(report) = report_or_missing(run_analysis(&config))? else {
        return Ok(());
    };

    // ─── 4) console report ───────────────────────────────────────────
    print_report(&report);

    // ─── 5) plots ────────────────────────────────────────────────────
    let written = write_plots(&report.plots, &config.output_dir)?;
    info!(
        "{} plots written to {}",
        written.len(),
        config.output_dir.display()
    );
    Ok(())
}
