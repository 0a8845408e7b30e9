//! Chart patch localization
//!
//! The calibration photo is expected to be framed on the chart, so each
//! patch occupies one cell of a regular 6 x 4 grid spanning the image.
//! Sampling regions are shrunk by a margin on every side to keep patch
//! borders and chart printing gaps out of the measurement.
//!
//! Algorithm tag: `algo-grid-patch-localization`

use crate::constants::chart::{COLUMNS, PATCH_COUNT, ROWS};
use crate::detection::region::PixelBounds;
use crate::{AnalysisError, Result};

/// Rectangle in pixel units (floating point, not yet rasterized)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rasterize to whole-pixel bounds inside a `img_w` x `img_h` image
    pub fn to_pixel_bounds(&self, img_w: u32, img_h: u32) -> PixelBounds {
        PixelBounds::from_pixel_rect(self.x, self.y, self.width, self.height, img_w, img_h)
    }
}

/// Maps chart grid positions to pixel regions
#[derive(Debug, Clone, Copy)]
pub struct PatchLocator {
    margin_fraction: f64,
}

impl PatchLocator {
    /// Create a locator trimming `margin_fraction` of the smaller cell side from each edge
    pub fn new(margin_fraction: f64) -> Self {
        Self { margin_fraction }
    }

    /// Sampling rectangle for the patch at `position` (row-major, 0..24)
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidParameter` when `position` is not on the chart.
    pub fn locate(&self, width: u32, height: u32, position: usize) -> Result<Rect> {
        if position >= PATCH_COUNT {
            return Err(AnalysisError::invalid_parameter("position", position));
        }

        let patch_w = f64::from(width) / COLUMNS as f64;
        let patch_h = f64::from(height) / ROWS as f64;
        let row = position / COLUMNS;
        let col = position % COLUMNS;
        let margin = patch_w.min(patch_h) * self.margin_fraction;

        Ok(Rect {
            x: col as f64 * patch_w + margin,
            y: row as f64 * patch_h + margin,
            width: patch_w - 2.0 * margin,
            height: patch_h - 2.0 * margin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_patch_region() {
        let rect = PatchLocator::new(0.2).locate(600, 400, 0).unwrap();
        assert_eq!(rect, Rect { x: 20.0, y: 20.0, width: 60.0, height: 60.0 });
    }

    #[test]
    fn test_last_patch_region() {
        let rect = PatchLocator::new(0.2).locate(600, 400, 23).unwrap();
        assert_eq!(rect, Rect { x: 520.0, y: 320.0, width: 60.0, height: 60.0 });
    }

    #[test]
    fn test_margin_uses_smaller_side() {
        // Cells are 200 x 100, so the margin is 0.2 * 100 on both axes
        let rect = PatchLocator::new(0.2).locate(1200, 400, 7).unwrap();
        assert_eq!(rect.x, 200.0 + 20.0);
        assert_eq!(rect.y, 100.0 + 20.0);
        assert_eq!(rect.width, 160.0);
        assert_eq!(rect.height, 60.0);
    }

    #[test]
    fn test_every_region_inside_image_and_cell() {
        let locator = PatchLocator::new(0.49);
        for position in 0..PATCH_COUNT {
            let rect = locator.locate(637, 421, position).unwrap();
            let bounds = rect.to_pixel_bounds(637, 421);
            assert!(rect.x >= 0.0 && rect.y >= 0.0);
            assert!(rect.x + rect.width <= 637.0);
            assert!(rect.y + rect.height <= 421.0);
            assert!(bounds.x1 <= 637 && bounds.y1 <= 421);
        }
    }

    #[test]
    fn test_position_out_of_range() {
        assert!(PatchLocator::new(0.2).locate(600, 400, 24).is_err());
    }

    #[test]
    fn test_locate_is_deterministic() {
        let locator = PatchLocator::new(0.2);
        assert_eq!(locator.locate(999, 777, 13).unwrap(), locator.locate(999, 777, 13).unwrap());
    }
}
