use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use frap_core::config::AnalysisConfig;
use frap_core::FrapAnalyzer;
use serde::Serialize;
use tracing::info;

use crate::progress::BarReporter;
use crate::summary::print_analysis_summary;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input SER file or its TOML sidecar
    pub file: PathBuf,

    /// Analysis config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the corrected recovery curve as CSV
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct CurveRow {
    frame: usize,
    time_s: f64,
    corrected: f64,
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let config = match args.config {
        Some(ref path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    let analyzer = FrapAnalyzer::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?
        .with_config(config)
        .with_reporter(Box::new(BarReporter::new()));

    let corrected = analyzer
        .normalized_stimulation()
        .context("Failed to normalize the stimulation signal")?;
    let fit = analyzer
        .fit_curve(&corrected)
        .context("Failed to fit the recovery curve")?;

    print_analysis_summary(&args.file, &analyzer, &fit);

    if let Some(ref path) = args.output {
        write_curve(path, &corrected, analyzer.timestamps())?;
        println!("Recovery curve saved to {}", path.display());
    }

    analyzer.close();
    Ok(())
}

fn write_curve(path: &Path, corrected: &[f64], timestamps: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for (frame, (&corrected, &time_s)) in corrected.iter().zip(timestamps).enumerate() {
        writer.serialize(CurveRow {
            frame,
            time_s,
            corrected,
        })?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = corrected.len(), "Recovery curve written");
    Ok(())
}
