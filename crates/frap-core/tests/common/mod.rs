#![allow(dead_code)]

use std::path::PathBuf;

use ndarray::{Array2, Array3};

use frap_core::frame::PixelType;
use frap_core::io::ser::SER_HEADER_SIZE;
use frap_core::io::{write_dataset, AcquisitionLoop, Experiment, ExperimentMetadata, MemorySource};
use frap_core::roi::{Roi, RoiKind};

/// Build a SER header for mono frames.
///
/// Returns a `Vec<u8>` containing just the 178-byte header.
pub fn build_ser_header(width: u32, height: u32, bit_depth: u32, num_frames: usize, color_id: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID (4 bytes)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID (4 bytes)
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0
    buf.extend_from_slice(&0i32.to_le_bytes());
    // Width, Height, PixelDepth, FrameCount
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer (40 bytes)
    let mut observer = [0u8; 40];
    observer[..3].copy_from_slice(b"Lab");
    buf.extend_from_slice(&observer);
    // Instrument, Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 40]);
    buf.extend_from_slice(&[0u8; 40]);
    // DateTime, DateTimeUTC (8 bytes each)
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Write raw bytes to a temp directory as `name` and return the directory
/// handle with the file path.
pub fn write_temp_file(name: &str, data: &[u8]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, data).expect("write file");
    (dir, path)
}

/// Write `frames` plus `metadata` as `recording.ser` / `recording.toml`.
///
/// The files live as long as the returned `TempDir`.
pub fn write_temp_dataset(
    frames: &Array3<u16>,
    metadata: &ExperimentMetadata,
) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("recording.ser");
    write_dataset(&path, frames.view(), metadata).expect("write dataset");
    (dir, path)
}

pub fn metadata(pixel_microns: f64, rois: Vec<Roi>, loops: Vec<AcquisitionLoop>) -> ExperimentMetadata {
    ExperimentMetadata {
        pixel_microns,
        num_frames: None,
        rois,
        experiment: Experiment { loops },
    }
}

/// Pixels whose center lies within `radius` of `(cx, cy)`, all in pixels.
pub fn circle_pixels(dims: (usize, usize), cx: i64, cy: i64, radius: i64) -> Array2<bool> {
    Array2::from_shape_fn(dims, |(row, col)| {
        let dx = col as i64 - cx;
        let dy = row as i64 - cy;
        dx * dx + dy * dy <= radius * radius
    })
}

pub const FRAP_DIMS: (usize, usize) = (16, 16);
pub const FRAP_BACKGROUND: f64 = 10.0;
pub const PRE_BLEACH_FRAMES: usize = 5;
pub const POST_BLEACH_FRAMES: usize = 30;

/// Common acquisition photobleaching seen by every region.
pub fn acquisition_decay(t: f64) -> f64 {
    (-0.01 * t).exp()
}

pub fn recovery(a: f64, tau: f64, t: f64) -> f64 {
    a * (1.0 - (0.5f64.ln() / tau * t).exp())
}

pub fn frap_rois() -> Vec<Roi> {
    vec![
        // rows/cols 1..=3
        Roi::rectangle(RoiKind::Background, [2.0, 2.0], 2.0, 2.0),
        // cols 11..=13, rows 2..=4
        Roi::rectangle(RoiKind::Reference, [12.0, 3.0], 2.0, 2.0),
        // centered on col 8, row 11, radius 2 px
        Roi::circle(RoiKind::Stimulation, [8.0, 11.0], 2.0),
    ]
}

pub fn frap_loops() -> Vec<AcquisitionLoop> {
    vec![
        AcquisitionLoop::imaging(PRE_BLEACH_FRAMES as f64, 1.0),
        AcquisitionLoop::stimulation(0.5),
        AcquisitionLoop::imaging(POST_BLEACH_FRAMES as f64, 1.0),
    ]
}

/// Noise-free FRAP recording at 1 um per pixel, 1 s per frame.
///
/// After background subtraction and reference correction the stimulated
/// signal is exactly 1 before the bleach and `recovery(a, tau, t')` after it.
pub fn synthetic_frap_frames(a: f64, tau: f64) -> Array3<f64> {
    let n = PRE_BLEACH_FRAMES + POST_BLEACH_FRAMES;
    let (h, w) = FRAP_DIMS;
    let stim = circle_pixels(FRAP_DIMS, 8, 11, 2);
    let mut frames = Array3::<f64>::from_elem((n, h, w), FRAP_BACKGROUND);

    for t in 0..n {
        let decay = acquisition_decay(t as f64);
        let signal = if t < PRE_BLEACH_FRAMES {
            1.0
        } else {
            recovery(a, tau, (t - PRE_BLEACH_FRAMES) as f64)
        };
        for row in 2..=4 {
            for col in 11..=13 {
                frames[[t, row, col]] = FRAP_BACKGROUND + 100.0 * decay;
            }
        }
        for ((row, col), &inside) in stim.indexed_iter() {
            if inside {
                frames[[t, row, col]] = FRAP_BACKGROUND + 200.0 * decay * signal;
            }
        }
    }
    frames
}

pub fn synthetic_frap_source(a: f64, tau: f64) -> MemorySource {
    let frames = synthetic_frap_frames(a, tau);
    MemorySource::new(
        frames.view(),
        PixelType::F64,
        metadata(1.0, frap_rois(), frap_loops()),
    )
    .expect("valid synthetic metadata")
}
