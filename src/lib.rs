//! # Soil Colorscan
//!
//! A Rust crate for measuring soil colors from digital photographs.
//!
//! This library provides calibrated soil color classification by:
//! - Calibrating the camera against a photographed 24-patch reference chart
//! - Sampling soil regions with background and highlight rejection
//! - Correcting samples with per-channel calibration factors
//! - Matching corrected colors to Munsell soil color notation and soil order
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use soil_colorscan::calibration::{CalibrationEngine, MemoryStore};
//! use soil_colorscan::classification::ColorClassifier;
//! use soil_colorscan::detection::Selection;
//! use soil_colorscan::exif::DeviceInfo;
//! use soil_colorscan::{analyze_sample, image_loader, ScanConfig};
//!
//! let engine = CalibrationEngine::new(
//!     ScanConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     DeviceInfo::default(),
//! )?;
//! engine.start_calibration()?;
//! engine.process_calibration_image(&image_loader::load_image(Path::new("chart.jpg"))?)?;
//!
//! let sample = image_loader::load_image(Path::new("soil.jpg"))?;
//! let result = analyze_sample(
//!     &engine.snapshot(),
//!     &ColorClassifier::default(),
//!     &sample,
//!     &Selection::FullImage,
//!     &engine.config().sampling,
//! )?;
//! println!("{} ({})", result.munsell_notation, result.soil_classification);
//! # Ok::<(), soil_colorscan::AnalysisError>(())
//! ```

use std::path::Path;

use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};

pub mod calibration;
pub mod chart;
pub mod classification;
pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod exif;
pub mod image_loader;
pub mod worker;

pub use calibration::{Calibration, CalibrationEngine, CalibrationState};
pub use classification::ColorClassifier;
pub use color::Rgb;
pub use config::ScanConfig;
pub use detection::Selection;
pub use error::{AnalysisError, Result};

use color::{ColorConverter, ColorSampler};
use config::SamplingConfig;

/// Classified soil sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilColorResult {
    /// Munsell notation of the closest catalog entry
    pub munsell_notation: String,
    pub common_name: String,
    pub soil_classification: String,
    pub soil_description: String,
    /// Mean sampled color before correction
    pub measured: Rgb,
    /// Sampled color after calibration
    pub corrected: Rgb,
    /// Hexadecimal representation of `corrected`
    pub hex: String,
    /// Distance from `corrected` to the matched catalog entry
    pub distance: f64,
    pub sample_pixel_count: usize,
    /// True when the sample came from the full-image fallback
    pub used_fallback: bool,
}

/// Sample, correct and classify a soil photo
///
/// The region is sampled with the filtered policy, corrected with the
/// given calibration snapshot and matched against the classifier catalog.
///
/// # Errors
///
/// Returns `AnalysisError::CalibrationRequired` when the snapshot is not
/// calibrated and runs in strict mode.
pub fn analyze_sample(
    snapshot: &Calibration,
    classifier: &ColorClassifier,
    image: &DynamicImage,
    selection: &Selection,
    config: &SamplingConfig,
) -> Result<SoilColorResult> {
    let sample = ColorSampler::new(config).sample_region(&image.to_rgb32f(), selection);
    let corrected = snapshot.apply(sample.color)?;
    let (entry, distance) = classifier.find_closest_with_distance(corrected);

    debug!(
        "event=sample_classified notation={} distance={:.4} pixels={} fallback={}",
        entry.notation, distance, sample.pixel_count, sample.used_fallback
    );

    Ok(SoilColorResult {
        munsell_notation: entry.notation.to_string(),
        common_name: entry.common_name.to_string(),
        soil_classification: entry.soil_classification.to_string(),
        soil_description: entry.soil_description.to_string(),
        measured: sample.color,
        corrected,
        hex: ColorConverter::to_hex(corrected),
        distance,
        sample_pixel_count: sample.pixel_count,
        used_fallback: sample.used_fallback,
    })
}

/// Load a soil photo and analyze it with the engine's current calibration
///
/// # Errors
///
/// Returns `AnalysisError::ImageDecode` if the file cannot be loaded, and
/// the errors of [`analyze_sample`].
pub fn analyze_sample_file(
    engine: &CalibrationEngine,
    classifier: &ColorClassifier,
    path: &Path,
    selection: &Selection,
) -> Result<SoilColorResult> {
    let image = image_loader::load_image(path)?;
    analyze_sample(
        &engine.snapshot(),
        classifier,
        &image,
        selection,
        &engine.config().sampling,
    )
}
