use std::path::Path;

use console::Style;
use frap_core::io::FrameSource;
use frap_core::recovery::RecoveryFit;
use frap_core::roi::Roi;
use frap_core::FrapAnalyzer;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_analysis_summary<S: FrameSource>(
    input: &Path,
    analyzer: &FrapAnalyzer<S>,
    fit: &RecoveryFit,
) {
    let s = Styles::new();
    let source = analyzer.source();
    let (height, width) = source.dimensions();

    println!();
    println!("  {}", s.title.apply_to("FRAP Analysis"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(13)));
    println!();

    // Recording
    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!("{} ({}x{})", source.frame_count(), width, height))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Pixel size"),
        s.value.apply_to(format!("{} um", analyzer.geometry().microns_per_pixel()))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Bleach frame"),
        s.value.apply_to(analyzer.bleach_index())
    );
    println!();

    // ROIs
    println!("  {}", s.header.apply_to("ROIs"));
    print_roi(&s, "Background", analyzer.background_roi());
    print_roi(&s, "Reference", analyzer.reference_roi());
    print_roi(&s, "Stimulation", analyzer.stimulation_roi());
    println!();

    // Correction
    let intensity = &analyzer.config().intensity;
    println!("  {}", s.header.apply_to("Correction"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Background"),
        on_off(&s, intensity.subtract_background)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Positive only"),
        on_off(&s, intensity.only_positive)
    );
    println!();

    // Fit
    println!("  {}", s.header.apply_to("Recovery"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Mobile fraction"),
        s.value.apply_to(format!("{:.4}", fit.mobile_fraction))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Half time"),
        s.value.apply_to(format!("{:.3} s", fit.half_time))
    );
    println!();
}

fn print_roi(s: &Styles, label: &str, roi: Option<&Roi>) {
    match roi {
        Some(roi) => {
            let shape = roi
                .shape
                .as_ref()
                .map(|sh| sh.to_string())
                .unwrap_or_else(|| "?".into());
            println!(
                "    {:<16}{}",
                s.label.apply_to(label),
                s.value.apply_to(format!(
                    "{} at ({}, {}) um",
                    shape, roi.position[0], roi.position[1]
                ))
            );
        }
        None => println!(
            "    {:<16}{}",
            s.label.apply_to(label),
            s.disabled.apply_to("not set")
        ),
    }
}

fn on_off(s: &Styles, enabled: bool) -> String {
    if enabled {
        s.value.apply_to("yes").to_string()
    } else {
        s.disabled.apply_to("no").to_string()
    }
}
