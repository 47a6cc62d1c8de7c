use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Unsupported pixel depth: {0} bits")]
    UnsupportedPixelDepth(u32),

    #[error("Unsupported SER color id {0}: only mono frames are supported")]
    UnsupportedColorId(i32),

    #[error("Invalid experiment metadata: {0}")]
    Metadata(String),

    #[error("Invalid analysis config: {0}")]
    Config(String),

    #[error("Invalid ROI: {0}")]
    InvalidRoi(String),

    #[error("No usable pre-bleach frames before the bleach event")]
    EmptyPreBleach,

    #[error("No usable post-bleach samples to fit")]
    EmptyPostBleach,
}

pub type Result<T> = std::result::Result<T, FrapError>;
