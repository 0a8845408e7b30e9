//! Integration tests for the chart calibration and soil sampling pipeline
//!
//! These tests drive the public API end to end with synthetic photos:
//! - Chart calibration and quality grading
//! - Failure handling that keeps the committed calibration
//! - Persistence across engine instances
//! - Region selection, correction and Munsell classification

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, Rgb as Px, RgbImage};

use soil_colorscan::calibration::{
    CalibrationFailure, CalibrationQuality, CalibrationState, JsonFileStore, KeyValueStore,
    MemoryStore,
};
use soil_colorscan::chart::REFERENCE_CHART;
use soil_colorscan::color::ColorConverter;
use soil_colorscan::config::CalibrationMode;
use soil_colorscan::detection::{NormalizedRect, Point, Polygon, Selection};
use soil_colorscan::exif::DeviceInfo;
use soil_colorscan::{
    analyze_sample, AnalysisError, CalibrationEngine, ColorClassifier, ScanConfig,
};

// ============================================================================
// Helpers
// ============================================================================

/// 6x4 chart photo, 40 px per cell, every cell painted by `color_of`
fn chart(color_of: impl Fn(usize) -> [u8; 3]) -> DynamicImage {
    let image: RgbImage = ImageBuffer::from_fn(240, 160, |x, y| {
        let position = (y / 40) as usize * 6 + (x / 40) as usize;
        Px(color_of(position))
    });
    DynamicImage::ImageRgb8(image)
}

fn faithful_chart() -> DynamicImage {
    chart(|i| ColorConverter::to_rgb8(REFERENCE_CHART[i].reference))
}

/// Chart photographed with every channel attenuated by `gain`
fn dimmed_chart(gain: f64) -> DynamicImage {
    chart(|i| {
        let r = REFERENCE_CHART[i].reference;
        ColorConverter::to_rgb8(soil_colorscan::Rgb::new(r.red * gain, r.green * gain, r.blue * gain))
    })
}

fn engine_with(store: Arc<dyn KeyValueStore>, config: ScanConfig) -> CalibrationEngine {
    CalibrationEngine::new(config, store, DeviceInfo::new("Acme", "Field Cam")).unwrap()
}

fn calibrate(engine: &CalibrationEngine, image: &DynamicImage) -> CalibrationState {
    engine.start_calibration().unwrap();
    engine.process_calibration_image(image).unwrap()
}

// ============================================================================
// Calibration
// ============================================================================

#[test]
fn test_faithful_chart_calibrates_to_identity() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());

    assert_eq!(calibrate(&engine, &faithful_chart()), CalibrationState::Calibrated);

    let snapshot = engine.snapshot();
    for f in [snapshot.factors.r, snapshot.factors.g, snapshot.factors.b] {
        assert!((f - 1.0).abs() < 0.02, "factor {f} not close to 1");
    }
    let report = snapshot.report.as_ref().unwrap();
    assert_eq!(report.valid_patches, 24);
    assert_eq!(report.required_patches, 6);
    let validation = report.validation.as_ref().unwrap();
    assert_eq!(validation.quality, CalibrationQuality::Optimal);
    assert_eq!(validation.device.model, "Field Cam");
    assert!(snapshot.calibrated_at.is_some());
}

#[test]
fn test_dimmed_chart_recovers_gain() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());

    assert_eq!(calibrate(&engine, &dimmed_chart(0.8)), CalibrationState::Calibrated);

    let factors = engine.snapshot().factors;
    for f in [factors.r, factors.g, factors.b] {
        assert!((f - 1.25).abs() < 0.1, "factor {f} not close to 1.25");
    }
}

#[test]
fn test_calibration_from_encoded_bytes() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());
    let mut png = Vec::new();
    faithful_chart()
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    engine.start_calibration().unwrap();
    assert_eq!(
        engine.process_calibration_bytes(&png).unwrap(),
        CalibrationState::Calibrated
    );
}

#[test]
fn test_insufficient_patches_keeps_previous_calibration() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());
    calibrate(&engine, &dimmed_chart(0.8));
    let committed = engine.snapshot().factors;

    // Only the first five cells carry the chart; the rest is clipped black
    let mostly_black = chart(|i| {
        if i < 5 {
            ColorConverter::to_rgb8(REFERENCE_CHART[i].reference)
        } else {
            [0, 0, 0]
        }
    });
    engine.recalibrate().unwrap();
    let state = calibrate(&engine, &mostly_black);

    assert_eq!(
        state,
        CalibrationState::Error(CalibrationFailure::InsufficientPatches {
            valid: 5,
            required: 6
        })
    );
    assert_eq!(engine.snapshot().factors, committed);

    // Error is not terminal
    assert_eq!(calibrate(&engine, &faithful_chart()), CalibrationState::Calibrated);
}

#[test]
fn test_processing_without_start_is_rejected() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());
    assert!(matches!(
        engine.process_calibration_image(&faithful_chart()),
        Err(AnalysisError::InvalidTransition { .. })
    ));
    assert_eq!(engine.state(), CalibrationState::NotCalibrated);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_calibration_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calibration.json");

    let first = engine_with(Arc::new(JsonFileStore::new(&path)), ScanConfig::default());
    calibrate(&first, &dimmed_chart(0.8));
    let committed = first.snapshot().factors;
    drop(first);

    let second = engine_with(Arc::new(JsonFileStore::new(&path)), ScanConfig::default());
    let restored = second.snapshot();
    assert_eq!(restored.state, CalibrationState::Calibrated);
    assert_eq!(restored.factors, committed);
    assert!(restored.calibrated_at.is_some());

    second.reset().unwrap();
    let third = engine_with(Arc::new(JsonFileStore::new(&path)), ScanConfig::default());
    assert_eq!(third.state(), CalibrationState::NotCalibrated);
}

#[test]
fn test_recalibrate_across_restarts_on_one_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calibration.json");

    let first = engine_with(Arc::new(JsonFileStore::new(&path)), ScanConfig::default());
    first.begin_calibration().unwrap();
    first.process_calibration_image(&dimmed_chart(0.8)).unwrap();
    let dimmed = first.snapshot().factors;
    drop(first);

    let second = engine_with(Arc::new(JsonFileStore::new(&path)), ScanConfig::default());
    assert_eq!(second.state(), CalibrationState::Calibrated);
    second.begin_calibration().unwrap();
    assert_eq!(
        second.process_calibration_image(&faithful_chart()).unwrap(),
        CalibrationState::Calibrated
    );
    let faithful = second.snapshot().factors;
    assert_ne!(faithful, dimmed);
    drop(second);

    let third = engine_with(Arc::new(JsonFileStore::new(&path)), ScanConfig::default());
    assert_eq!(third.snapshot().factors, faithful);
}

// ============================================================================
// Sampling and classification
// ============================================================================

/// Soil photo: dark brown soil in the middle, white paper border
fn soil_photo() -> DynamicImage {
    let image: RgbImage = ImageBuffer::from_fn(100, 100, |x, y| {
        if (20..80).contains(&x) && (20..80).contains(&y) {
            Px([64, 51, 38])
        } else {
            Px([250, 250, 250])
        }
    });
    DynamicImage::ImageRgb8(image)
}

#[test]
fn test_full_image_sample_ignores_white_border() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());
    calibrate(&engine, &faithful_chart());

    let result = analyze_sample(
        &engine.snapshot(),
        &ColorClassifier::default(),
        &soil_photo(),
        &Selection::FullImage,
        &engine.config().sampling,
    )
    .unwrap();

    assert_eq!(result.sample_pixel_count, 3600);
    assert!(!result.used_fallback);
    assert_eq!(result.munsell_notation, "10YR 3/3");
    assert_eq!(result.soil_classification, "Mollisoles");
}

#[test]
fn test_polygon_sample_inside_soil() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());
    let polygon = Polygon::new(vec![
        Point::new(0.3, 0.3),
        Point::new(0.7, 0.3),
        Point::new(0.5, 0.7),
    ]);

    let result = analyze_sample(
        &engine.snapshot(),
        &ColorClassifier::default(),
        &soil_photo(),
        &Selection::Polygon(polygon),
        &engine.config().sampling,
    )
    .unwrap();

    assert!(result.sample_pixel_count > 0);
    assert!(!result.used_fallback);
    assert_eq!(result.hex, "#403326");
    assert_eq!(result.munsell_notation, "10YR 3/3");
}

#[test]
fn test_tiny_region_falls_back_to_full_image() {
    let engine = engine_with(Arc::new(MemoryStore::new()), ScanConfig::default());
    let selection = Selection::Rect(NormalizedRect::new(0.5, 0.5, 0.05, 0.05));

    let result = analyze_sample(
        &engine.snapshot(),
        &ColorClassifier::default(),
        &soil_photo(),
        &selection,
        &engine.config().sampling,
    )
    .unwrap();

    assert!(result.used_fallback);
    assert_eq!(result.sample_pixel_count, 100 * 100);
}

#[test]
fn test_strict_mode_refuses_uncalibrated_sample() {
    let mut config = ScanConfig::default();
    config.calibration.mode = CalibrationMode::Strict;
    let engine = engine_with(Arc::new(MemoryStore::new()), config);

    let result = analyze_sample(
        &engine.snapshot(),
        &ColorClassifier::default(),
        &soil_photo(),
        &Selection::FullImage,
        &engine.config().sampling,
    );
    assert!(matches!(result, Err(AnalysisError::CalibrationRequired)));

    calibrate(&engine, &faithful_chart());
    assert!(analyze_sample(
        &engine.snapshot(),
        &ColorClassifier::default(),
        &soil_photo(),
        &Selection::FullImage,
        &engine.config().sampling,
    )
    .is_ok());
}
