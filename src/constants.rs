//! Default thresholds and layout constants for chart calibration
//!
//! These are empirical guards against saturated or numerically unstable
//! measurements. Every value here is only a default: the live values come
//! from [`crate::config::ScanConfig`].

/// Reference chart layout
pub mod chart {
    /// Patch rows on the chart
    pub const ROWS: usize = 4;

    /// Patch columns on the chart
    pub const COLUMNS: usize = 6;

    /// Total patches on the chart
    pub const PATCH_COUNT: usize = ROWS * COLUMNS;
}

/// Region sampling parameters
pub mod sampling {
    /// Fraction of the smaller patch side trimmed from every edge of a patch
    pub const MARGIN_FRACTION: f64 = 0.2;

    /// Pixels with every channel below this are treated as background
    pub const NEAR_BLACK: f64 = 0.1;

    /// Pixels with every channel above this are treated as clipped highlights
    pub const NEAR_WHITE: f64 = 0.9;

    /// Regions narrower or shorter than this fall back to the full image
    pub const MIN_REGION_PIXELS: u32 = 10;
}

/// Calibration acceptance bands
pub mod calibration {
    /// Measured channels must lie strictly above this
    pub const MEASUREMENT_MIN: f64 = 0.05;

    /// Measured channels must lie strictly below this
    pub const MEASUREMENT_MAX: f64 = 0.95;

    /// Per-channel factors must lie strictly above this
    pub const FACTOR_MIN: f64 = 0.1;

    /// Per-channel factors must lie strictly below this
    pub const FACTOR_MAX: f64 = 10.0;

    /// Fraction of chart patches that must survive both bands
    pub const MIN_VALID_FRACTION: f64 = 0.25;
}

/// Calibration quality scoring
pub mod validation {
    /// Max per-patch error for an optimal calibration
    pub const OPTIMAL_THRESHOLD: f64 = 0.15;

    /// Max per-patch error for an acceptable calibration; patches above it are problematic
    pub const ACCEPTABLE_THRESHOLD: f64 = 0.25;

    /// Problematic patches tolerated in an acceptable calibration
    pub const MAX_PROBLEMATIC: usize = 8;
}

/// Logical keys under which the calibration is persisted
pub mod store_keys {
    pub const IS_CALIBRATED: &str = "isCalibrated";
    pub const RED_FACTOR: &str = "calibrationRedFactor";
    pub const GREEN_FACTOR: &str = "calibrationGreenFactor";
    pub const BLUE_FACTOR: &str = "calibrationBlueFactor";
    pub const LAST_CALIBRATION_DATE: &str = "lastCalibrationDate";
}
