//! EXIF metadata extraction module
//!
//! This module reads the camera identity from photo metadata so that a
//! stored calibration can be matched against the device taking new photos.

pub mod extractor;

pub use extractor::{DeviceInfo, ExifExtractor};
