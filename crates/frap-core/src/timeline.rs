//! Bleach-event position and frame timestamps derived from the acquisition
//! loops.
//!
//! The stimulation loop is treated as instantaneous: it adds no frames and no
//! elapsed time, so the first post-bleach frame is stamped with the end time
//! of the last pre-bleach loop. Instruments that spend real time bleaching
//! will therefore show post-bleach timestamps shifted early by the bleach
//! duration.

use tracing::warn;

use crate::io::AcquisitionLoop;

/// Derived timing of one recording.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    bleach_index: usize,
    timestamps: Vec<f64>,
}

impl Timeline {
    pub fn from_loops(loops: &[AcquisitionLoop], frame_count: usize) -> Self {
        Self {
            bleach_index: bleach_index(loops, frame_count),
            timestamps: timestamps(loops, frame_count),
        }
    }

    /// Index of the first frame acquired after the bleach event.
    pub fn bleach_index(&self) -> usize {
        self.bleach_index
    }

    /// Acquisition time of every frame, in seconds.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Timestamp of the bleach frame, if it was acquired.
    pub fn bleach_time(&self) -> Option<f64> {
        self.timestamps.get(self.bleach_index).copied()
    }
}

/// Frame index at which the first stimulation loop occurs.
///
/// Accumulates `duration / sampling_interval` over the imaging loops before
/// the first stimulation loop and rounds half away from zero. Without a
/// stimulation loop the whole series is pre-bleach and the rounded total is
/// returned. Loops without usable timing add nothing. Clamped to
/// `frame_count`.
pub fn bleach_index(loops: &[AcquisitionLoop], frame_count: usize) -> usize {
    let mut frames = 0.0f64;
    for lp in loops {
        if lp.stimulation {
            break;
        }
        frames += lp.frame_span();
    }
    (frames.round().max(0.0) as usize).min(frame_count)
}

/// Timestamp of every acquired frame.
///
/// Each imaging loop contributes `t0, t0 + dt, ...` strictly below
/// `t0 + duration`. Generation stops once `frame_count` stamps exist; if the
/// loops describe fewer frames, the tail is extrapolated with the last
/// imaging interval (NaN when there is none). A loop without usable timing
/// contributes no frames.
pub fn timestamps(loops: &[AcquisitionLoop], frame_count: usize) -> Vec<f64> {
    let mut stamps = Vec::with_capacity(frame_count);
    let mut current = 0.0f64;
    let mut last_interval = None;

    'loops: for lp in loops {
        if lp.stimulation {
            continue;
        }
        let dt = lp.sampling_interval;
        if !lp.has_usable_timing() {
            warn!(
                sampling_interval = dt,
                duration = lp.duration,
                "Imaging loop with unusable timing contributes no frames"
            );
            continue;
        }
        let mut k = 0usize;
        loop {
            if stamps.len() == frame_count {
                break 'loops;
            }
            let offset = k as f64 * dt;
            if offset >= lp.duration {
                break;
            }
            stamps.push(current + offset);
            k += 1;
        }
        current += lp.duration;
        last_interval = Some(dt);
    }

    if stamps.len() < frame_count {
        warn!(
            described = stamps.len(),
            acquired = frame_count,
            "Acquisition loops describe fewer frames than were recorded; extrapolating timestamps"
        );
        let start = stamps.len();
        let last = stamps.last().copied();
        for i in start..frame_count {
            let t = match (last, last_interval) {
                (Some(last), Some(dt)) => last + (i + 1 - start) as f64 * dt,
                _ => f64::NAN,
            };
            stamps.push(t);
        }
    }

    stamps
}
