//! Background execution of scans
//!
//! Chart calibration and sample analysis are CPU-bound. These helpers move
//! them onto tokio's blocking pool so an async caller can keep serving
//! while a scan runs. The engine serializes calibration writers itself;
//! sampling reads a snapshot and never waits for a running calibration.

use std::sync::Arc;

use image::DynamicImage;
use log::debug;
use tokio::task::JoinHandle;

use crate::calibration::{CalibrationEngine, CalibrationState};
use crate::classification::ColorClassifier;
use crate::detection::Selection;
use crate::{analyze_sample, Result, SoilColorResult};

/// Process a chart photo on the blocking pool.
///
/// The engine must already be in `Calibrating`; see
/// [`CalibrationEngine::process_calibration_image`].
pub fn calibrate_in_background(
    engine: Arc<CalibrationEngine>,
    image: DynamicImage,
) -> JoinHandle<Result<CalibrationState>> {
    tokio::task::spawn_blocking(move || {
        debug!(
            "event=worker_calibrate width={} height={}",
            image.width(),
            image.height()
        );
        engine.process_calibration_image(&image)
    })
}

/// Analyze a soil photo on the blocking pool with the calibration current
/// when the task starts.
pub fn sample_in_background(
    engine: Arc<CalibrationEngine>,
    classifier: ColorClassifier,
    image: DynamicImage,
    selection: Selection,
) -> JoinHandle<Result<SoilColorResult>> {
    tokio::task::spawn_blocking(move || {
        debug!("event=worker_sample selection={:?}", selection);
        analyze_sample(
            &engine.snapshot(),
            &classifier,
            &image,
            &selection,
            &engine.config().sampling,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::MemoryStore;
    use crate::chart::REFERENCE_CHART;
    use crate::color::ColorConverter;
    use crate::exif::DeviceInfo;
    use crate::ScanConfig;
    use image::{ImageBuffer, Rgb as Px, RgbImage};

    fn faithful_chart() -> DynamicImage {
        let image: RgbImage = ImageBuffer::from_fn(240, 160, |x, y| {
            let position = (y / 40) as usize * 6 + (x / 40) as usize;
            Px(ColorConverter::to_rgb8(REFERENCE_CHART[position].reference))
        });
        DynamicImage::ImageRgb8(image)
    }

    fn engine() -> Arc<CalibrationEngine> {
        Arc::new(
            CalibrationEngine::new(
                ScanConfig::default(),
                Arc::new(MemoryStore::new()),
                DeviceInfo::default(),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_calibrate_in_background() {
        let engine = engine();
        engine.start_calibration().unwrap();

        let state = calibrate_in_background(engine.clone(), faithful_chart())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(state, CalibrationState::Calibrated);
        assert!(engine.snapshot().is_calibrated());
    }

    #[tokio::test]
    async fn test_calibrate_requires_started_calibration() {
        let result = calibrate_in_background(engine(), faithful_chart())
            .await
            .unwrap();
        assert!(matches!(
            result,
            Err(crate::AnalysisError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_samples_see_same_calibration() {
        let engine = engine();
        let soil = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Px([64, 51, 38])));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                sample_in_background(
                    engine.clone(),
                    ColorClassifier::default(),
                    soil.clone(),
                    Selection::FullImage,
                )
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result.munsell_notation, "10YR 3/3");
        }
    }
}
