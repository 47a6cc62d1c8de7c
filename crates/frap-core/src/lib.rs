pub mod analyzer;
pub mod config;
pub mod error;
pub mod frame;
pub mod intensity;
pub mod io;
pub mod masked;
pub mod progress;
pub mod recovery;
pub mod roi;
pub mod timeline;

pub use analyzer::FrapAnalyzer;
pub use error::{FrapError, Result};
