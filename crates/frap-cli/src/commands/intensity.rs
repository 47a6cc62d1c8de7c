use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use frap_core::intensity::{IntensityOptions, MeanIntensity};
use frap_core::roi::RoiKind;
use frap_core::FrapAnalyzer;

use crate::progress::BarReporter;

#[derive(Clone, Copy, ValueEnum)]
pub enum RoiArg {
    Background,
    Reference,
    Stimulation,
}

impl From<RoiArg> for RoiKind {
    fn from(arg: RoiArg) -> Self {
        match arg {
            RoiArg::Background => RoiKind::Background,
            RoiArg::Reference => RoiKind::Reference,
            RoiArg::Stimulation => RoiKind::Stimulation,
        }
    }
}

#[derive(Args)]
pub struct IntensityArgs {
    /// Input SER file or its TOML sidecar
    pub file: PathBuf,

    /// ROI to measure
    #[arg(long, value_enum, default_value = "stimulation")]
    pub roi: RoiArg,

    /// Print one mean per frame instead of a single value
    #[arg(long)]
    pub trace: bool,

    /// Do not subtract the background level
    #[arg(long)]
    pub no_background: bool,

    /// Keep pixels that are zero or negative after subtraction
    #[arg(long)]
    pub allow_non_positive: bool,
}

pub fn run(args: &IntensityArgs) -> Result<()> {
    let analyzer = FrapAnalyzer::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?
        .with_reporter(Box::new(BarReporter::new()));

    let kind = RoiKind::from(args.roi);
    let options = IntensityOptions {
        keep_time: args.trace,
        subtract_background: !args.no_background,
        only_positive: !args.allow_non_positive,
    };
    let mean = analyzer
        .mean_intensity(analyzer.roi(&kind), options)
        .with_context(|| format!("Failed to measure the {kind} ROI"))?;

    match mean {
        MeanIntensity::Scalar(v) => println!("{v}"),
        MeanIntensity::Trace(values) => {
            for (frame, (v, t)) in values.iter().zip(analyzer.timestamps()).enumerate() {
                println!("{frame}\t{t:.3}\t{v}");
            }
        }
    }

    analyzer.close();
    Ok(())
}
