use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use frap_core::io::{FrameSource, SerDataset};
use frap_core::timeline::Timeline;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file or its TOML sidecar
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let dataset = SerDataset::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let info = dataset.source_info();
    let metadata = dataset.metadata();

    println!("File:        {}", info.filename.display());
    println!("Frames:      {}", info.total_frames);
    if let Some(planned) = metadata.num_frames {
        println!("Planned:     {}", planned);
    }
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Bit depth:   {} ({})", info.bit_depth, info.pixel_type);
    println!("Pixel size:  {} um", info.pixel_microns);

    if let Some(ref obs) = info.observer {
        println!("Observer:    {}", obs);
    }
    if let Some(ref inst) = info.instrument {
        println!("Instrument:  {}", inst);
    }

    let frame_bytes = dataset.header().frame_byte_size();
    let total_mb = (frame_bytes * info.total_frames) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    println!();
    if metadata.rois.is_empty() {
        println!("ROIs:        none");
    } else {
        println!("ROIs:");
        for roi in &metadata.rois {
            let shape = roi
                .shape
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".into());
            println!(
                "  {:<12} {:<10} at ({}, {}) um, size ({}, {}) um",
                roi.kind, shape, roi.position[0], roi.position[1], roi.size[0], roi.size[1]
            );
        }
    }

    println!();
    if metadata.loops().is_empty() {
        println!("Loops:       none");
    } else {
        println!("Loops:");
        for (i, lp) in metadata.loops().iter().enumerate() {
            if lp.stimulation {
                println!("  {}. stimulation  {} s", i + 1, lp.duration);
            } else {
                println!(
                    "  {}. imaging      {} s every {} s",
                    i + 1,
                    lp.duration,
                    lp.sampling_interval
                );
            }
        }
    }

    let timeline = Timeline::from_loops(metadata.loops(), dataset.frame_count());
    println!();
    println!("Bleach frame: {}", timeline.bleach_index());
    if let Some(t) = timeline.bleach_time() {
        println!("Bleach time:  {:.3} s", t);
    }

    Ok(())
}
