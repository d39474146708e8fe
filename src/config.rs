//! Configuration for comparisons and recording imports.

use crate::distance::{KindScaleMap, MatchCalibration};
use crate::error::KeyizeError;
use crate::recording::ImportStrictness;
use serde::{Deserialize, Serialize};

/// Settings used when comparing two dynamics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Per-kind scale overrides; kinds not listed use the research defaults
    pub scale_map: KindScaleMap,

    /// Calibration points for the match score
    pub calibration: MatchCalibration,
}

impl ComparisonConfig {
    /// Load configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, KeyizeError> {
        let config: ComparisonConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, KeyizeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), KeyizeError> {
        self.scale_map.validate()?;
        self.calibration.validate()
    }
}

/// Settings used when importing recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Whether timestamps must be non-decreasing
    pub strictness: ImportStrictness,
}

impl ImportConfig {
    pub fn new(strictness: ImportStrictness) -> Self {
        Self { strictness }
    }
}
