use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Storage type of the raw pixel samples in the source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelType {
    U8,
    U16,
    F64,
}

impl PixelType {
    /// Pixel type for a SER pixel depth (1..=16 bits).
    pub fn from_bit_depth(bits: u32) -> Option<Self> {
        match bits {
            1..=8 => Some(Self::U8),
            9..=16 => Some(Self::U16),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U8 => write!(f, "uint8"),
            Self::U16 => write!(f, "uint16"),
            Self::F64 => write!(f, "float64"),
        }
    }
}

/// Metadata about the source file.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub pixel_type: PixelType,
    pub pixel_microns: f64,
    pub observer: Option<String>,
    pub instrument: Option<String>,
}
