//! Chart-based calibration engine
//!
//! Measures every patch of a photographed reference chart, derives
//! per-channel correction factors from the patches that pass both
//! validity bands, and publishes the result as an immutable
//! [`Calibration`] snapshot.
//!
//! The engine is the single writer of calibration state. Writers are
//! serialized by an internal mutex; readers take a snapshot with
//! [`CalibrationEngine::snapshot`] and never block on a running scan.
//!
//! Algorithm tag: `algo-chart-factor-calibration`

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use image::{DynamicImage, Rgb32FImage};
use log::{debug, info, warn};

use crate::calibration::state::{
    Calibration, CalibrationFailure, CalibrationReport, CalibrationState, CorrectionFactors,
    PatchOutcome,
};
use crate::calibration::store::{KeyValueStore, StoredValue};
use crate::calibration::validator::CalibrationValidator;
use crate::chart::{reference_colors, REFERENCE_CHART};
use crate::color::{ColorConverter, ColorSampler, Rgb};
use crate::config::{CalibrationConfig, ScanConfig};
use crate::constants::store_keys;
use crate::detection::PatchLocator;
use crate::exif::DeviceInfo;
use crate::image_loader;
use crate::{AnalysisError, Result};

/// Classify one patch measurement against its reference.
///
/// A patch is accepted when every measured channel lies strictly inside
/// the measurement band and every `reference / measured` ratio lies
/// strictly inside the factor band.
pub fn evaluate_patch(reference: Rgb, measured: Rgb, config: &CalibrationConfig) -> PatchOutcome {
    let measured = ColorConverter::channels(measured);
    if !measured.iter().all(|&c| config.measurement_band.contains(c)) {
        return PatchOutcome::Saturated;
    }

    let reference = ColorConverter::channels(reference);
    let ratio = |i: usize| reference[i] / measured[i];
    let factors = CorrectionFactors::new(ratio(0), ratio(1), ratio(2));
    if [factors.r, factors.g, factors.b]
        .iter()
        .all(|&f| config.factor_band.contains(f))
    {
        PatchOutcome::Accepted { factors }
    } else {
        PatchOutcome::UnstableFactor
    }
}

/// Mean of the accepted per-patch factors, channel by channel
fn aggregate_factors<'a>(outcomes: impl Iterator<Item = &'a PatchOutcome>) -> Option<CorrectionFactors> {
    let mut sum = [0.0; 3];
    let mut count = 0usize;
    for outcome in outcomes {
        if let PatchOutcome::Accepted { factors } = outcome {
            sum[0] += factors.r;
            sum[1] += factors.g;
            sum[2] += factors.b;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(CorrectionFactors::new(sum[0] / n, sum[1] / n, sum[2] / n))
}

/// Calibration as kept in the key-value store
#[derive(Debug, Clone, Copy)]
struct StoredRecord {
    factors: CorrectionFactors,
    calibrated_at: Option<DateTime<Utc>>,
}

/// Owns calibration state and its persistence
pub struct CalibrationEngine {
    config: ScanConfig,
    locator: PatchLocator,
    sampler: ColorSampler,
    validator: CalibrationValidator,
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Arc<Calibration>>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for CalibrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibrationEngine")
            .field("config", &self.config)
            .field("current", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CalibrationEngine {
    /// Create an engine, restoring a previously committed calibration from `store`.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidParameter` for an invalid configuration
    /// and `AnalysisError::Persistence` when the store cannot be read.
    pub fn new(config: ScanConfig, store: Arc<dyn KeyValueStore>, device: DeviceInfo) -> Result<Self> {
        config.validate()?;
        let restored = Self::restore(&config, store.as_ref())?;
        info!(
            "event=calibration_restore state={} factors={:?}",
            restored.state, restored.factors
        );

        Ok(Self {
            locator: PatchLocator::new(config.sampling.margin_fraction),
            sampler: ColorSampler::new(&config.sampling),
            validator: CalibrationValidator::new(config.validation.clone(), device),
            config,
            store,
            current: RwLock::new(Arc::new(restored)),
            writer: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn validator(&self) -> &CalibrationValidator {
        &self.validator
    }

    /// Current calibration aggregate
    pub fn snapshot(&self) -> Arc<Calibration> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> CalibrationState {
        self.snapshot().state
    }

    /// Correct a color with the current calibration
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::CalibrationRequired` in strict mode when not calibrated.
    pub fn apply_calibration(&self, color: Rgb) -> Result<Rgb> {
        self.snapshot().apply(color)
    }

    /// Enter `Calibrating` from `NotCalibrated` or `Error`
    pub fn start_calibration(&self) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        match current.state {
            CalibrationState::NotCalibrated | CalibrationState::Error(_) => {
                self.publish(Calibration {
                    state: CalibrationState::Calibrating,
                    ..(*current).clone()
                });
                info!("event=calibration_start from={}", current.state);
                Ok(())
            }
            other => Err(AnalysisError::InvalidTransition {
                from: other.to_string(),
                action: "start calibration",
            }),
        }
    }

    /// Enter `Calibrating` from any other state.
    ///
    /// From `Calibrated` this is `recalibrate` followed by
    /// `start_calibration` under one writer lock; the committed factors stay
    /// in effect until the new scan commits.
    pub fn begin_calibration(&self) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        if current.state == CalibrationState::Calibrating {
            return Err(AnalysisError::InvalidTransition {
                from: current.state.to_string(),
                action: "begin calibration",
            });
        }
        self.publish(Calibration {
            state: CalibrationState::Calibrating,
            ..(*current).clone()
        });
        info!("event=calibration_start from={}", current.state);
        Ok(())
    }

    /// Leave `Calibrated` for `NotCalibrated`, keeping the committed factors
    /// until a new calibration replaces them.
    ///
    /// The store is not touched: it keeps the last committed calibration, so
    /// an engine restarted before the next commit comes back `Calibrated`.
    pub fn recalibrate(&self) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        if current.state != CalibrationState::Calibrated {
            return Err(AnalysisError::InvalidTransition {
                from: current.state.to_string(),
                action: "recalibrate",
            });
        }
        self.publish(Calibration {
            state: CalibrationState::NotCalibrated,
            ..(*current).clone()
        });
        info!("event=calibration_recalibrate");
        Ok(())
    }

    /// Drop the calibration: identity factors, cleared store, `NotCalibrated`.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Persistence` when the stored record cannot be cleared;
    /// the in-memory calibration is reset regardless.
    pub fn reset(&self) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(Calibration::uncalibrated(self.config.calibration.mode));
        info!("event=calibration_reset");

        self.store.set(store_keys::IS_CALIBRATED, StoredValue::Bool(false))?;
        for key in [
            store_keys::RED_FACTOR,
            store_keys::GREEN_FACTOR,
            store_keys::BLUE_FACTOR,
            store_keys::LAST_CALIBRATION_DATE,
        ] {
            self.store.remove(key)?;
        }
        Ok(())
    }

    /// Decode an encoded chart photo and calibrate from it.
    ///
    /// An undecodable buffer moves the engine to `Error(image processing)`.
    pub fn process_calibration_bytes(&self, bytes: &[u8]) -> Result<CalibrationState> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_calibrating("process a calibration image")?;
        match image_loader::decode_bytes(bytes) {
            Ok(image) => self.calibrate_locked(&image),
            Err(e) => {
                warn!("event=calibration_failed reason=image_processing error={}", e);
                Ok(self.fail(CalibrationFailure::ImageProcessing, None))
            }
        }
    }

    /// Calibrate from a decoded chart photo.
    ///
    /// Returns the resulting state. Calibration failures are reported as
    /// `CalibrationState::Error` and leave the committed factors untouched.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidTransition` unless calibration was started,
    /// and `AnalysisError::Persistence` when committing to the store fails.
    pub fn process_calibration_image(&self, image: &DynamicImage) -> Result<CalibrationState> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_calibrating("process a calibration image")?;
        self.calibrate_locked(image)
    }

    fn ensure_calibrating(&self, action: &'static str) -> Result<()> {
        let state = self.state();
        if state == CalibrationState::Calibrating {
            Ok(())
        } else {
            Err(AnalysisError::InvalidTransition {
                from: state.to_string(),
                action,
            })
        }
    }

    fn calibrate_locked(&self, image: &DynamicImage) -> Result<CalibrationState> {
        if image.width() == 0 || image.height() == 0 {
            warn!("event=calibration_failed reason=image_processing error=empty_image");
            return Ok(self.fail(CalibrationFailure::ImageProcessing, None));
        }

        let pixels = image.to_rgb32f();
        let measured = self.measure_patches(&pixels)?;
        let outcomes: BTreeMap<String, PatchOutcome> = REFERENCE_CHART
            .iter()
            .map(|patch| {
                let outcome = evaluate_patch(
                    patch.reference,
                    measured[patch.name],
                    &self.config.calibration,
                );
                debug!(
                    "event=patch_measured patch=\"{}\" measured={:?} outcome={:?}",
                    patch.name, measured[patch.name], outcome
                );
                (patch.name.to_string(), outcome)
            })
            .collect();

        let valid = outcomes.values().filter(|o| o.is_accepted()).count();
        let required = self.config.calibration.required_patches(REFERENCE_CHART.len());
        let mut report = CalibrationReport {
            valid_patches: valid,
            required_patches: required,
            measured: measured
                .iter()
                .map(|(name, color)| (name.to_string(), *color))
                .collect(),
            outcomes,
            validation: None,
        };

        let aggregated = aggregate_factors(report.outcomes.values());
        let factors = match aggregated {
            Some(factors) if valid >= required => factors,
            _ => {
                warn!(
                    "event=calibration_failed reason=insufficient_patches valid={} required={}",
                    valid, required
                );
                return Ok(self.fail(
                    CalibrationFailure::InsufficientPatches { valid, required },
                    Some(report),
                ));
            }
        };

        let corrected = report
            .measured
            .iter()
            .map(|(name, color)| (name.clone(), factors.apply(*color)))
            .collect();
        report.validation = Some(self.validator.validate(&corrected, &reference_colors()));

        let calibrated_at = Utc::now();
        if let Err(e) = self.persist(factors, calibrated_at) {
            warn!("event=calibration_failed reason=persistence error={}", e);
            self.fail(CalibrationFailure::Persistence, Some(report));
            return Err(e);
        }

        self.publish(Calibration {
            state: CalibrationState::Calibrated,
            factors,
            calibrated_at: Some(calibrated_at),
            mode: self.config.calibration.mode,
            report: Some(report),
        });
        info!(
            "event=calibration_commit valid={} r={:.4} g={:.4} b={:.4}",
            valid, factors.r, factors.g, factors.b
        );
        Ok(CalibrationState::Calibrated)
    }

    /// Unfiltered mean color of every chart patch, keyed by patch name
    fn measure_patches(&self, image: &Rgb32FImage) -> Result<BTreeMap<&'static str, Rgb>> {
        let (width, height) = image.dimensions();
        REFERENCE_CHART
            .iter()
            .map(|patch| {
                let rect = self.locator.locate(width, height, patch.position)?;
                Ok((patch.name, self.sampler.sample_patch(image, &rect)))
            })
            .collect()
    }

    /// Publish an `Error` state, keeping the committed factors
    fn fail(&self, reason: CalibrationFailure, report: Option<CalibrationReport>) -> CalibrationState {
        let current = self.snapshot();
        let state = CalibrationState::Error(reason);
        self.publish(Calibration {
            state,
            report: report.or_else(|| current.report.clone()),
            ..(*current).clone()
        });
        state
    }

    fn publish(&self, calibration: Calibration) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(calibration);
    }

    /// Commit a new record, writing the previous one back if the store fails.
    fn persist(&self, factors: CorrectionFactors, at: DateTime<Utc>) -> Result<()> {
        let previous = Self::read_record(&self.config.calibration, self.store.as_ref())?;
        let committed = StoredRecord {
            factors,
            calibrated_at: Some(at),
        };
        if let Err(e) = self.write_record(&committed) {
            match previous {
                Some(record) => match self.write_record(&record) {
                    Ok(()) => info!("event=calibration_rollback restored=previous"),
                    Err(rollback) => warn!("event=calibration_rollback_failed error={}", rollback),
                },
                None => {
                    if let Err(rollback) =
                        self.store.set(store_keys::IS_CALIBRATED, StoredValue::Bool(false))
                    {
                        warn!("event=calibration_rollback_failed error={}", rollback);
                    }
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Write a record with `isCalibrated` cleared first and set last, so a
    /// store that writes key by key never reads back a mixed calibration.
    fn write_record(&self, record: &StoredRecord) -> Result<()> {
        if record.calibrated_at.is_none() {
            self.store.remove(store_keys::LAST_CALIBRATION_DATE)?;
        }
        let mut entries = vec![
            (store_keys::IS_CALIBRATED, StoredValue::Bool(false)),
            (store_keys::RED_FACTOR, StoredValue::Float(record.factors.r)),
            (store_keys::GREEN_FACTOR, StoredValue::Float(record.factors.g)),
            (store_keys::BLUE_FACTOR, StoredValue::Float(record.factors.b)),
        ];
        if let Some(at) = record.calibrated_at {
            entries.push((store_keys::LAST_CALIBRATION_DATE, StoredValue::Text(at.to_rfc3339())));
        }
        entries.push((store_keys::IS_CALIBRATED, StoredValue::Bool(true)));
        self.store.set_many(&entries)
    }

    /// Committed record in `store`, if it is complete and inside the factor band
    fn read_record(
        config: &CalibrationConfig,
        store: &dyn KeyValueStore,
    ) -> Result<Option<StoredRecord>> {
        let is_calibrated = store
            .get(store_keys::IS_CALIBRATED)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !is_calibrated {
            return Ok(None);
        }

        let factor = |key: &str| -> Result<Option<f64>> {
            Ok(store
                .get(key)?
                .and_then(|v| v.as_f64())
                .filter(|f| config.factor_band.contains(*f)))
        };
        let (Some(r), Some(g), Some(b)) = (
            factor(store_keys::RED_FACTOR)?,
            factor(store_keys::GREEN_FACTOR)?,
            factor(store_keys::BLUE_FACTOR)?,
        ) else {
            warn!("event=calibration_record_invalid reason=missing_or_invalid_factors");
            return Ok(None);
        };

        let calibrated_at = store
            .get(store_keys::LAST_CALIBRATION_DATE)?
            .and_then(|v| v.as_str().map(str::to_owned))
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|d| d.with_timezone(&Utc));

        Ok(Some(StoredRecord {
            factors: CorrectionFactors::new(r, g, b),
            calibrated_at,
        }))
    }

    fn restore(config: &ScanConfig, store: &dyn KeyValueStore) -> Result<Calibration> {
        let uncalibrated = Calibration::uncalibrated(config.calibration.mode);
        Ok(match Self::read_record(&config.calibration, store)? {
            Some(record) => Calibration {
                state: CalibrationState::Calibrated,
                factors: record.factors,
                calibrated_at: record.calibrated_at,
                ..uncalibrated
            },
            None => uncalibrated,
        })
    }
}
