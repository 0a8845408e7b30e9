//! Camera calibration against the reference chart
//!
//! This module derives per-channel correction factors from a chart photo,
//! grades calibration quality, and persists committed calibrations.

pub mod engine;
pub mod state;
pub mod store;
pub mod validator;

pub use engine::CalibrationEngine;
pub use state::{
    Calibration, CalibrationFailure, CalibrationReport, CalibrationState, CorrectionFactors,
    PatchOutcome,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoredValue};
pub use validator::{CalibrationQuality, CalibrationValidator, ValidationResult};
