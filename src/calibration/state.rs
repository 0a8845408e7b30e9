//! Calibration state and the published calibration aggregate
//!
//! The engine never mutates a [`Calibration`] in place. Each transition
//! builds a new value and swaps the shared `Arc`, so a reader holding a
//! snapshot sees either the whole previous calibration or the whole new one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::validator::ValidationResult;
use crate::color::{ColorConverter, Rgb};
use crate::config::CalibrationMode;
use crate::{AnalysisError, Result};

/// Per-channel multiplicative correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionFactors {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Default for CorrectionFactors {
    fn default() -> Self {
        Self::identity()
    }
}

impl CorrectionFactors {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Scale each channel and clamp the result into `[0, 1]`
    pub fn apply(&self, color: Rgb) -> Rgb {
        ColorConverter::clamp(Rgb::new(
            color.red * self.r,
            color.green * self.g,
            color.blue * self.b,
        ))
    }
}

/// Why a calibration attempt ended in [`CalibrationState::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationFailure {
    ImageProcessing,
    InsufficientPatches { valid: usize, required: usize },
    Persistence,
}

impl fmt::Display for CalibrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationFailure::ImageProcessing => f.write_str("image processing"),
            CalibrationFailure::InsufficientPatches { .. } => f.write_str("insufficient patches"),
            CalibrationFailure::Persistence => f.write_str("persistence"),
        }
    }
}

/// Calibration lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum CalibrationState {
    NotCalibrated,
    Calibrating,
    Calibrated,
    Error(CalibrationFailure),
}

impl fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationState::NotCalibrated => f.write_str("not calibrated"),
            CalibrationState::Calibrating => f.write_str("calibrating"),
            CalibrationState::Calibrated => f.write_str("calibrated"),
            CalibrationState::Error(reason) => write!(f, "error ({})", reason),
        }
    }
}

/// Per-patch outcome of one calibration run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum PatchOutcome {
    /// Patch contributed these factors to the aggregate
    Accepted { factors: CorrectionFactors },
    /// A measured channel fell outside the measurement band
    Saturated,
    /// A derived factor fell outside the factor band
    UnstableFactor,
}

impl PatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PatchOutcome::Accepted { .. })
    }
}

/// Measurements and diagnostics from the last calibration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Patches satisfying both validity bands
    pub valid_patches: usize,
    /// Valid patches needed to commit
    pub required_patches: usize,
    /// Raw measured color per patch name
    pub measured: BTreeMap<String, Rgb>,
    /// Outcome per patch name
    pub outcomes: BTreeMap<String, PatchOutcome>,
    /// Quality of the corrected measurements, present when the run committed
    pub validation: Option<ValidationResult>,
}

/// Immutable calibration aggregate shared with readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub state: CalibrationState,
    /// Last committed factors, identity when nothing has been committed
    pub factors: CorrectionFactors,
    pub calibrated_at: Option<DateTime<Utc>>,
    pub mode: CalibrationMode,
    pub report: Option<CalibrationReport>,
}

impl Calibration {
    pub(crate) fn uncalibrated(mode: CalibrationMode) -> Self {
        Self {
            state: CalibrationState::NotCalibrated,
            factors: CorrectionFactors::identity(),
            calibrated_at: None,
            mode,
            report: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.state == CalibrationState::Calibrated
    }

    /// Correct a measured color with this calibration.
    ///
    /// Outside the `Calibrated` state, lenient mode returns the color
    /// unchanged and strict mode refuses.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::CalibrationRequired` in strict mode without a calibration.
    pub fn apply(&self, color: Rgb) -> Result<Rgb> {
        if self.is_calibrated() {
            return Ok(self.factors.apply(color));
        }
        match self.mode {
            CalibrationMode::Lenient => Ok(color),
            CalibrationMode::Strict => Err(AnalysisError::CalibrationRequired),
        }
    }
}
