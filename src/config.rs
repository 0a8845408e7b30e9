//! Configuration structures for the soil_colorscan pipeline.
//!
//! This module defines all tunable parameters for chart calibration,
//! region sampling and calibration scoring.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use soil_colorscan::ScanConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = ScanConfig::from_json_file(Path::new("scan.json"))?;
//!
//! // Or use defaults
//! let config = ScanConfig::default();
//! # Ok::<(), soil_colorscan::AnalysisError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`SamplingConfig`]: patch margins and background exclusion
//! - [`CalibrationConfig`]: validity bands and strict/lenient correction
//! - [`ValidationConfig`]: calibration quality thresholds

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{calibration, sampling, validation};
use crate::{AnalysisError, Result};

/// Complete configuration for calibration and sampling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Region sampling configuration
    pub sampling: SamplingConfig,

    /// Calibration acceptance configuration
    pub calibration: CalibrationConfig,

    /// Calibration quality configuration
    pub validation: ValidationConfig,
}

/// Region sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Fraction of the smaller patch side trimmed from each patch edge (0.0-0.5)
    pub margin_fraction: f64,

    /// Pixels with all channels below this are excluded from live samples
    pub near_black: f64,

    /// Pixels with all channels above this are excluded from live samples
    pub near_white: f64,

    /// Minimum region width and height in pixels before falling back to the full image
    pub min_region_pixels: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            margin_fraction: sampling::MARGIN_FRACTION,
            near_black: sampling::NEAR_BLACK,
            near_white: sampling::NEAR_WHITE,
            min_region_pixels: sampling::MIN_REGION_PIXELS,
        }
    }
}

/// How color correction behaves before a calibration has been committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMode {
    /// Uncalibrated colors pass through unchanged
    #[default]
    Lenient,
    /// Uncalibrated correction fails with [`AnalysisError::CalibrationRequired`]
    Strict,
}

/// Open interval used to reject saturated or unstable values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when `value` lies strictly inside the band
    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

/// Calibration acceptance parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Measured patch channels must lie strictly inside this band
    pub measurement_band: Band,

    /// Reference/measured factors must lie strictly inside this band
    pub factor_band: Band,

    /// Fraction of chart patches required to be valid (0.0-1.0]
    pub min_valid_fraction: f64,

    /// Behavior of color correction without a committed calibration
    pub mode: CalibrationMode,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            measurement_band: Band::new(calibration::MEASUREMENT_MIN, calibration::MEASUREMENT_MAX),
            factor_band: Band::new(calibration::FACTOR_MIN, calibration::FACTOR_MAX),
            min_valid_fraction: calibration::MIN_VALID_FRACTION,
            mode: CalibrationMode::Lenient,
        }
    }
}

impl CalibrationConfig {
    /// Number of valid patches required out of `total`
    pub fn required_patches(&self, total: usize) -> usize {
        (self.min_valid_fraction * total as f64).ceil() as usize
    }
}

/// Calibration quality thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Max per-patch error for an optimal calibration
    pub optimal_threshold: f64,

    /// Max per-patch error for an acceptable calibration
    pub acceptable_threshold: f64,

    /// Problematic patches tolerated in an acceptable calibration
    pub max_problematic: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            optimal_threshold: validation::OPTIMAL_THRESHOLD,
            acceptable_threshold: validation::ACCEPTABLE_THRESHOLD,
            max_problematic: validation::MAX_PROBLEMATIC,
        }
    }
}

impl ScanConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::persistence(format!("Failed to read config: {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AnalysisError::persistence(format!("Failed to parse config: {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::persistence("Failed to serialize config", e))?;
        std::fs::write(path, json).map_err(|e| {
            AnalysisError::persistence(format!("Failed to write config: {}", path.display()), e)
        })
    }

    /// Reject parameter combinations the pipeline cannot honor
    pub fn validate(&self) -> Result<()> {
        let s = &self.sampling;
        let c = &self.calibration;
        let v = &self.validation;
        let numbers = [
            ("sampling.margin_fraction", s.margin_fraction),
            ("sampling.near_black", s.near_black),
            ("sampling.near_white", s.near_white),
            ("calibration.measurement_band.min", c.measurement_band.min),
            ("calibration.measurement_band.max", c.measurement_band.max),
            ("calibration.factor_band.min", c.factor_band.min),
            ("calibration.factor_band.max", c.factor_band.max),
            ("calibration.min_valid_fraction", c.min_valid_fraction),
            ("validation.optimal_threshold", v.optimal_threshold),
            ("validation.acceptable_threshold", v.acceptable_threshold),
        ];
        if let Some((name, value)) = numbers.iter().find(|(_, value)| !value.is_finite()) {
            return Err(AnalysisError::invalid_parameter(name, value));
        }

        if !(0.0..0.5).contains(&s.margin_fraction) {
            return Err(AnalysisError::invalid_parameter(
                "sampling.margin_fraction",
                s.margin_fraction,
            ));
        }
        if s.near_black >= s.near_white {
            return Err(AnalysisError::invalid_parameter(
                "sampling.near_black",
                format!("{} >= near_white {}", s.near_black, s.near_white),
            ));
        }

        let bands = [
            ("calibration.measurement_band", c.measurement_band),
            ("calibration.factor_band", c.factor_band),
        ];
        for (name, band) in bands {
            if band.min >= band.max {
                return Err(AnalysisError::invalid_parameter(
                    name,
                    format!("{}..{}", band.min, band.max),
                ));
            }
        }
        if c.factor_band.min <= 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "calibration.factor_band.min",
                c.factor_band.min,
            ));
        }
        if !(c.min_valid_fraction > 0.0 && c.min_valid_fraction <= 1.0) {
            return Err(AnalysisError::invalid_parameter(
                "calibration.min_valid_fraction",
                c.min_valid_fraction,
            ));
        }

        if v.optimal_threshold > v.acceptable_threshold {
            return Err(AnalysisError::invalid_parameter(
                "validation.optimal_threshold",
                format!("{} > acceptable_threshold {}", v.optimal_threshold, v.acceptable_threshold),
            ));
        }
        Ok(())
    }
}
