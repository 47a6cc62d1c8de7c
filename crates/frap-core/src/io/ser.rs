use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{FrapError, Result};
use crate::frame::PixelType;

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// SER color id for monochrome frames, the only layout the analyzer reads.
pub const SER_COLOR_MONO: i32 = 0;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
    pub date_time: u64,
    pub date_time_utc: u64,
}

impl SerHeader {
    /// Header for a mono little-endian recording.
    pub fn mono(width: u32, height: u32, pixel_depth: u32, frame_count: u32) -> Self {
        Self {
            color_id: SER_COLOR_MONO,
            little_endian: true,
            width,
            height,
            pixel_depth,
            frame_count,
            observer: String::new(),
            instrument: String::new(),
            telescope: String::new(),
            date_time: 0,
            date_time_utc: 0,
        }
    }

    /// Bytes per pixel (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_pixel(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Total bytes per frame. Headers accepted by [`SerReader::open`] are
    /// known not to overflow.
    pub fn frame_byte_size(&self) -> usize {
        self.checked_frame_byte_size().unwrap_or(usize::MAX)
    }

    /// Total bytes per frame, or `None` if the size does not fit in `usize`.
    pub fn checked_frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_pixel())
    }

    pub fn pixel_type(&self) -> Option<PixelType> {
        PixelType::from_bit_depth(self.pixel_depth)
    }
}

/// Memory-mapped SER frame reader.
///
/// Frames are returned as raw detector counts; no normalization is applied so
/// intensities stay comparable with the acquisition software.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(FrapError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(FrapError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        let expected_data_size = header
            .checked_frame_byte_size()
            .and_then(|size| size.checked_mul(header.frame_count as usize))
            .and_then(|size| size.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| {
                FrapError::InvalidSer(format!(
                    "Frame data size overflows: {}x{} px, {} frames",
                    header.width, header.height, header.frame_count
                ))
            })?;
        if mmap.len() < expected_data_size {
            return Err(FrapError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(FrapError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = SER_HEADER_SIZE + index * self.header.frame_byte_size();
        let end = offset + self.header.frame_byte_size();
        Ok(&self.mmap[offset..end])
    }

    /// Read a single frame as raw counts, shape = (height, width).
    pub fn read_frame(&self, index: usize) -> Result<Array2<f64>> {
        let raw = self.frame_raw(index)?;
        Ok(decode_mono_plane(
            raw,
            self.header.height as usize,
            self.header.width as usize,
            self.header.bytes_per_pixel(),
            self.header.little_endian,
        ))
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = header_count(cursor.read_i32::<LittleEndian>()?, "width")?;
    let height = header_count(cursor.read_i32::<LittleEndian>()?, "height")?;
    let pixel_depth = header_count(cursor.read_i32::<LittleEndian>()?, "pixel depth")?;
    let frame_count = header_count(cursor.read_i32::<LittleEndian>()?, "frame count")?;

    let observer = read_fixed_string(&buf[42..82]);
    let instrument = read_fixed_string(&buf[82..122]);
    let telescope = read_fixed_string(&buf[122..162]);

    let mut cursor = std::io::Cursor::new(&buf[162..]);
    let date_time = cursor.read_u64::<LittleEndian>()?;
    let date_time_utc = cursor.read_u64::<LittleEndian>()?;

    if width == 0 || height == 0 {
        return Err(FrapError::InvalidDimensions { width, height });
    }
    if color_id != SER_COLOR_MONO {
        return Err(FrapError::UnsupportedColorId(color_id));
    }
    if PixelType::from_bit_depth(pixel_depth).is_none() {
        return Err(FrapError::UnsupportedPixelDepth(pixel_depth));
    }

    // 0 is treated as little-endian; most writers ignore the flag's
    // documented meaning.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width,
        height,
        pixel_depth,
        frame_count,
        observer,
        instrument,
        telescope,
        date_time,
        date_time_utc,
    })
}

/// Header sizes are stored as signed integers; negative values are corrupt.
fn header_count(value: i32, field: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| FrapError::InvalidSer(format!("Negative {field} in header: {value}")))
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn decode_mono_plane(
    raw: &[u8],
    height: usize,
    width: usize,
    bytes_per_sample: usize,
    little_endian: bool,
) -> Array2<f64> {
    let mut data = Array2::<f64>::zeros((height, width));

    for row in 0..height {
        for col in 0..width {
            let idx = (row * width + col) * bytes_per_sample;
            data[[row, col]] = if bytes_per_sample == 1 {
                raw[idx] as f64
            } else {
                let pair = [raw[idx], raw[idx + 1]];
                if little_endian {
                    u16::from_le_bytes(pair) as f64
                } else {
                    u16::from_be_bytes(pair) as f64
                }
            };
        }
    }

    data
}
