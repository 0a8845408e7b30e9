//! Image loading for chart and sample photos
//!
//! This module provides a single entry point for turning files or encoded
//! buffers into decoded rasters.
//!
//! ## Supported Formats
//!
//! Standard formats (via `image` crate):
//! - JPEG, PNG, GIF, WebP, TIFF, BMP
//!
//! Apple formats (via `libheif-rs`, behind the `heic` feature):
//! - HEIC, HEIF
//!
//! EXIF orientation is not applied: calibration charts and soil samples
//! are located in the frame as delivered by the camera.

use std::path::Path;

use image::DynamicImage;

use crate::error::{AnalysisError, Result};

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image (first frame only)
    Gif,
    /// WebP image
    WebP,
    /// TIFF image
    Tiff,
    /// BMP image
    Bmp,
    /// HEIC/HEIF image (Apple)
    Heic,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::WebP),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            "bmp" => Some(ImageFormat::Bmp),
            "heic" | "heif" => Some(ImageFormat::Heic),
            _ => None,
        }
    }

    /// Check if format requires libheif
    pub fn requires_heif(&self) -> bool {
        matches!(self, ImageFormat::Heic)
    }
}

/// Load and decode an image file.
///
/// # Errors
///
/// Returns `AnalysisError::ImageDecode` if the file cannot be opened, the
/// format is unknown or unsupported by this build, or decoding fails.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let format = ImageFormat::from_extension(path).ok_or_else(|| AnalysisError::ImageDecode {
        message: format!("Unknown image format for file: {}", path.display()),
        source: None,
    })?;

    if format.requires_heif() {
        load_heic(path)
    } else {
        load_standard(path)
    }
}

/// Decode an in-memory encoded image, guessing the format from its header
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::image_decode("Failed to decode image buffer", e))?;
    ensure_not_empty(image)
}

fn ensure_not_empty(image: DynamicImage) -> Result<DynamicImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalysisError::ImageDecode {
            message: "Image has no pixels".to_string(),
            source: None,
        });
    }
    Ok(image)
}

/// Load image using the `image` crate (standard formats)
fn load_standard(path: &Path) -> Result<DynamicImage> {
    use image::ImageReader;

    let reader = ImageReader::open(path).map_err(|e| {
        AnalysisError::image_decode(format!("Failed to open image file: {}", path.display()), e)
    })?;

    let image = reader
        .with_guessed_format()
        .map_err(|e| {
            AnalysisError::image_decode(format!("Failed to read image file: {}", path.display()), e)
        })?
        .decode()
        .map_err(|e| {
            AnalysisError::image_decode(format!("Failed to decode image: {}", path.display()), e)
        })?;
    ensure_not_empty(image)
}

/// Load HEIC/HEIF image using libheif
#[cfg(feature = "heic")]
fn load_heic(path: &Path) -> Result<DynamicImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();

    let ctx = HeifContext::read_from_file(path.to_str().ok_or_else(|| {
        AnalysisError::invalid_parameter("path", path.display())
    })?)
    .map_err(|e| {
        AnalysisError::image_decode(format!("Failed to read HEIC file: {}", path.display()), e)
    })?;

    let handle = ctx
        .primary_image_handle()
        .map_err(|e| AnalysisError::image_decode("Failed to get primary image handle", e))?;

    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| AnalysisError::image_decode("Failed to decode HEIC image", e))?;

    let planes = image.planes();
    let rgb_plane = planes.interleaved.ok_or_else(|| AnalysisError::ImageDecode {
        message: "HEIC image has no interleaved RGB data".to_string(),
        source: None,
    })?;

    let width = handle.width();
    let height = handle.height();
    let stride = rgb_plane.stride as usize;
    let row_bytes = width as usize * 3;

    // Copy row by row, skipping stride padding
    let mut rgb = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        rgb.extend_from_slice(&rgb_plane.data[start..start + row_bytes]);
    }

    let buffer = image::RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
        AnalysisError::ImageDecode {
            message: "HEIC plane size does not match image dimensions".to_string(),
            source: None,
        }
    })?;
    ensure_not_empty(DynamicImage::ImageRgb8(buffer))
}

#[cfg(not(feature = "heic"))]
fn load_heic(path: &Path) -> Result<DynamicImage> {
    Err(AnalysisError::ImageDecode {
        message: format!(
            "HEIC support not compiled in (enable the `heic` feature): {}",
            path.display()
        ),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ImageFormat::from_extension(Path::new("chart.jpg")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("chart.JPEG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("soil.HEIF")),
            Some(ImageFormat::Heic)
        );
        assert_eq!(ImageFormat::from_extension(Path::new("soil.xyz")), None);
    }

    #[test]
    fn test_decode_png_bytes() {
        let mut bytes = Vec::new();
        image::RgbImage::from_pixel(3, 2, image::Rgb([200, 100, 50]))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let image = decode_bytes(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.to_rgb8().get_pixel(2, 1).0, [200, 100, 50]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_bytes(b"\x00\x01garbage"),
            Err(AnalysisError::ImageDecode { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_image(Path::new("no_such_chart.png")),
            Err(AnalysisError::ImageDecode { .. })
        ));
        assert!(load_image(Path::new("notes.txt")).is_err());
    }

    #[test]
    fn test_load_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        image::RgbImage::from_pixel(5, 5, image::Rgb([1, 2, 3]))
            .save(&path)
            .unwrap();
        let image = load_image(&path).unwrap();
        assert_eq!(image.width(), 5);
    }
}
