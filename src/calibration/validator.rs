//! Calibration quality scoring
//!
//! Compares measured chart colors against their references and grades
//! the calibration. Pure: nothing here mutates calibration state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{ColorConverter, Rgb};
use crate::config::ValidationConfig;
use crate::exif::DeviceInfo;

/// Calibration quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationQuality {
    Optimal,
    Acceptable,
    Poor,
}

/// Outcome of comparing measured and reference colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub quality: CalibrationQuality,
    /// Mean over patches of the mean absolute channel error
    pub average_error: f64,
    /// Largest per-patch error (max absolute channel error)
    pub max_error: f64,
    /// Patches whose error exceeds the acceptable threshold
    pub problematic_patches: Vec<String>,
    /// Device the measurement was taken with
    pub device: DeviceInfo,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.quality != CalibrationQuality::Poor
    }
}

/// Grades calibrations for the current device
#[derive(Debug, Clone)]
pub struct CalibrationValidator {
    config: ValidationConfig,
    device: DeviceInfo,
}

impl CalibrationValidator {
    pub fn new(config: ValidationConfig, device: DeviceInfo) -> Self {
        Self { config, device }
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// Score `measured` against `reference` over the patch names present in both.
    ///
    /// # Panics
    ///
    /// Panics when the two maps share no patch name; grading an empty
    /// comparison is a caller bug.
    pub fn validate(
        &self,
        measured: &BTreeMap<String, Rgb>,
        reference: &BTreeMap<String, Rgb>,
    ) -> ValidationResult {
        let mut count = 0usize;
        let mut error_sum = 0.0;
        let mut max_error: f64 = 0.0;
        let mut problematic_patches = Vec::new();

        for (name, measured_color) in measured {
            let Some(reference_color) = reference.get(name) else {
                continue;
            };
            let errors = ColorConverter::channels(*measured_color)
                .into_iter()
                .zip(ColorConverter::channels(*reference_color))
                .map(|(m, r)| (m - r).abs())
                .collect::<Vec<_>>();
            let color_error = errors.iter().copied().fold(0.0, f64::max);

            error_sum += errors.iter().sum::<f64>() / 3.0;
            max_error = max_error.max(color_error);
            count += 1;
            if color_error > self.config.acceptable_threshold {
                problematic_patches.push(name.clone());
            }
        }

        assert!(count > 0, "validation requires at least one patch present in both color sets");

        let quality = if max_error <= self.config.optimal_threshold {
            CalibrationQuality::Optimal
        } else if max_error <= self.config.acceptable_threshold
            && problematic_patches.len() <= self.config.max_problematic
        {
            CalibrationQuality::Acceptable
        } else {
            CalibrationQuality::Poor
        };

        ValidationResult {
            quality,
            average_error: error_sum / count as f64,
            max_error,
            problematic_patches,
            device: self.device.clone(),
        }
    }

    /// Coarse check that a saved calibration came from this device model
    pub fn is_compatible(&self, saved: &DeviceInfo) -> bool {
        self.device.model == saved.model
    }
}
