use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, ArrayView3, Axis};
use num_traits::ToPrimitive;
use tracing::debug;

use crate::error::{FrapError, Result};
use crate::frame::{PixelType, SourceInfo};
use crate::io::metadata::ExperimentMetadata;
use crate::io::ser::{SerHeader, SerReader};
use crate::io::ser_writer::SerWriter;

/// Access to the frames and metadata of one FRAP recording.
///
/// Frames are read by time index and never mutated.
pub trait FrameSource {
    fn metadata(&self) -> &ExperimentMetadata;

    fn pixel_type(&self) -> PixelType;

    /// Frame shape as `(height, width)`.
    fn dimensions(&self) -> (usize, usize);

    /// Number of frames actually acquired.
    fn frame_count(&self) -> usize;

    /// Read frame `index` as intensity counts, shape = (height, width).
    fn read_frame(&self, index: usize) -> Result<Array2<f64>>;

    fn pixel_microns(&self) -> f64 {
        self.metadata().pixel_microns
    }
}

/// Path of the TOML sidecar that belongs to a SER frame file.
pub fn sidecar_path(ser_path: &Path) -> PathBuf {
    ser_path.with_extension("toml")
}

/// A SER frame file plus its TOML metadata sidecar.
///
/// The memory map is released when the dataset is dropped.
pub struct SerDataset {
    path: PathBuf,
    reader: SerReader,
    metadata: ExperimentMetadata,
}

impl SerDataset {
    /// Open a dataset from either the `.ser` file or its `.toml` sidecar.
    pub fn open(path: &Path) -> Result<Self> {
        let ser_path = if path.extension().is_some_and(|ext| ext == "toml") {
            path.with_extension("ser")
        } else {
            path.to_path_buf()
        };
        let reader = SerReader::open(&ser_path)?;
        let metadata = ExperimentMetadata::load(&sidecar_path(&ser_path))?;

        if let Some(planned) = metadata.num_frames {
            if planned > reader.frame_count() {
                debug!(
                    planned,
                    acquired = reader.frame_count(),
                    "Acquisition stopped before the planned frame count"
                );
            }
        }

        Ok(Self {
            path: ser_path,
            reader,
            metadata,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &SerHeader {
        &self.reader.header
    }

    pub fn source_info(&self) -> SourceInfo {
        let header = &self.reader.header;
        SourceInfo {
            filename: self.path.clone(),
            total_frames: self.reader.frame_count(),
            width: header.width,
            height: header.height,
            bit_depth: header.pixel_depth as u8,
            pixel_type: self.pixel_type(),
            pixel_microns: self.metadata.pixel_microns,
            observer: non_empty(&header.observer),
            instrument: non_empty(&header.instrument),
        }
    }
}

impl FrameSource for SerDataset {
    fn metadata(&self) -> &ExperimentMetadata {
        &self.metadata
    }

    fn pixel_type(&self) -> PixelType {
        self.reader.header.pixel_type().unwrap_or(PixelType::U16)
    }

    fn dimensions(&self) -> (usize, usize) {
        (
            self.reader.header.height as usize,
            self.reader.header.width as usize,
        )
    }

    fn frame_count(&self) -> usize {
        self.reader.frame_count()
    }

    fn read_frame(&self, index: usize) -> Result<Array2<f64>> {
        self.reader.read_frame(index)
    }
}

/// Frames held in memory, for synthetic data and tests.
pub struct MemorySource {
    frames: Array3<f64>,
    pixel_type: PixelType,
    metadata: ExperimentMetadata,
}

impl MemorySource {
    /// Build from a `(frames, height, width)` array of any numeric type.
    pub fn new<T: ToPrimitive + Copy>(
        frames: ArrayView3<T>,
        pixel_type: PixelType,
        metadata: ExperimentMetadata,
    ) -> Result<Self> {
        metadata.validate()?;
        let frames = frames.mapv(|v| v.to_f64().unwrap_or(f64::NAN));
        Ok(Self {
            frames,
            pixel_type,
            metadata,
        })
    }
}

impl FrameSource for MemorySource {
    fn metadata(&self) -> &ExperimentMetadata {
        &self.metadata
    }

    fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    fn dimensions(&self) -> (usize, usize) {
        let (_, h, w) = self.frames.dim();
        (h, w)
    }

    fn frame_count(&self) -> usize {
        self.frames.len_of(Axis(0))
    }

    fn read_frame(&self, index: usize) -> Result<Array2<f64>> {
        let total = self.frame_count();
        if index >= total {
            return Err(FrapError::FrameIndexOutOfRange { index, total });
        }
        Ok(self.frames.index_axis(Axis(0), index).to_owned())
    }
}

/// Write `frames` (shape `(frames, height, width)`) as a 16-bit SER file and
/// `metadata` as its sidecar.
pub fn write_dataset(
    ser_path: &Path,
    frames: ArrayView3<u16>,
    metadata: &ExperimentMetadata,
) -> Result<()> {
    let (n, h, w) = frames.dim();
    let header = SerHeader::mono(w as u32, h as u32, 16, n as u32);
    let mut writer = SerWriter::create(ser_path, &header)?;
    for frame in frames.axis_iter(Axis(0)) {
        writer.write_frame(frame)?;
    }
    writer.finalize()?;
    metadata.save(&sidecar_path(ser_path))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}
