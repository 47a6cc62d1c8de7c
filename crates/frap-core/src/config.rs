use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FrapError, Result};
use crate::recovery::LmOptions;

/// Settings for a full FRAP analysis, loadable from TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub intensity: IntensityConfig,
    #[serde(default)]
    pub fit: LmOptions,
}

/// How ROI traces are aggregated for normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    pub subtract_background: bool,
    pub only_positive: bool,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            subtract_background: true,
            only_positive: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| FrapError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FrapError::Config(e.to_string()))
    }
}
