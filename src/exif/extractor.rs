//! Device identification from EXIF metadata
//!
//! A calibration is only meaningful for the camera that produced it, so
//! the camera make and model are read from the calibration photo and
//! carried alongside validation results.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag, Value};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Camera identification used for calibration compatibility checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
}

impl DeviceInfo {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
        }
    }

    /// Device read from the EXIF block of an encoded image, if it has one
    pub fn from_exif(bytes: &[u8]) -> Option<Self> {
        ExifExtractor::extract_device(bytes)
    }
}

/// EXIF metadata extractor
pub struct ExifExtractor;

impl ExifExtractor {
    /// Read camera make and model from an encoded image.
    ///
    /// Returns `None` when the container carries no EXIF block or no
    /// model tag.
    pub fn extract_device(bytes: &[u8]) -> Option<DeviceInfo> {
        let mut cursor = Cursor::new(bytes);
        let exif = match Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(e) => {
                debug!("event=exif_missing error={}", e);
                return None;
            }
        };

        let ascii = |tag: Tag| {
            exif.get_field(tag, In::PRIMARY)
                .and_then(|field| Self::first_ascii(&field.value))
        };
        let model = ascii(Tag::Model)?;
        let manufacturer = ascii(Tag::Make).unwrap_or_default();
        Some(DeviceInfo { manufacturer, model })
    }

    /// Read camera make and model from an image file
    pub fn extract_device_from_path(path: &Path) -> Result<Option<DeviceInfo>> {
        let bytes = std::fs::read(path).map_err(|e| {
            AnalysisError::image_decode(format!("Failed to read image file: {}", path.display()), e)
        })?;
        Ok(Self::extract_device(&bytes))
    }

    /// First ASCII component of an EXIF value, trimmed of padding
    fn first_ascii(value: &Value) -> Option<String> {
        match value {
            Value::Ascii(parts) => parts
                .first()
                .map(|raw| String::from_utf8_lossy(raw).trim_matches(['\0', ' ']).to_string())
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    }
}
