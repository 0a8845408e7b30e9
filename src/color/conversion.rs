//! Color conversion utilities
//!
//! Provides the small set of conversions the pipeline needs:
//! - Normalized sRGB to 8-bit channels
//! - Hex color representation
//! - Clamping into the unit cube
//! - Euclidean distance in RGB space

use crate::color::Rgb;

/// Stateless helper for normalized sRGB conversions
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorConverter;

impl ColorConverter {
    /// Convert a normalized color to 8-bit RGB, clamping out-of-range channels
    pub fn to_rgb8(color: Rgb) -> [u8; 3] {
        let c = Self::clamp(color);
        [
            (c.red * 255.0).round() as u8,
            (c.green * 255.0).round() as u8,
            (c.blue * 255.0).round() as u8,
        ]
    }

    /// Clamp every channel into `[0, 1]`
    pub fn clamp(color: Rgb) -> Rgb {
        Rgb::new(
            color.red.clamp(0.0, 1.0),
            color.green.clamp(0.0, 1.0),
            color.blue.clamp(0.0, 1.0),
        )
    }

    /// Channels as an array in R, G, B order
    pub fn channels(color: Rgb) -> [f64; 3] {
        [color.red, color.green, color.blue]
    }

    /// Euclidean distance between two colors in RGB space
    pub fn distance(a: Rgb, b: Rgb) -> f64 {
        let dr = a.red - b.red;
        let dg = a.green - b.green;
        let db = a.blue - b.blue;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Convert a color to a hexadecimal string (e.g., "#FF0000")
    pub fn to_hex(color: Rgb) -> String {
        let [r, g, b] = Self::to_rgb8(color);
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }
}
