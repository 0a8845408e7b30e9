//! Average color extraction from image regions
//!
//! Two sampling policies are provided:
//! - Unfiltered mean, used for calibration chart patches
//! - Filtered mean, used for live soil samples: near-black and near-white
//!   pixels are dropped as probable background or clipped highlights, and
//!   an optional polygon restricts the pixels considered
//!
//! A live sample whose region is too small, or which keeps no pixel after
//! filtering, falls back once to the unfiltered mean of the whole image.
//!
//! Algorithm tag: `algo-filtered-region-mean`

use image::Rgb32FImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::config::SamplingConfig;
use crate::detection::{NormalizedRect, PixelBounds, Point, Rect, Selection};

/// Result of sampling a live region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSample {
    /// Mean color of the eligible pixels
    pub color: Rgb,
    /// Number of pixels averaged
    pub pixel_count: usize,
    /// True when the full-image fallback produced this sample
    pub used_fallback: bool,
}

/// Region sampler holding the background exclusion thresholds
#[derive(Debug, Clone)]
pub struct ColorSampler {
    near_black: f64,
    near_white: f64,
    min_region_pixels: u32,
}

impl Default for ColorSampler {
    fn default() -> Self {
        Self::new(&SamplingConfig::default())
    }
}

#[derive(Default)]
struct Accumulator {
    sum: [f64; 3],
    count: usize,
}

impl Accumulator {
    fn add(&mut self, px: [f64; 3]) {
        self.sum[0] += px[0];
        self.sum[1] += px[1];
        self.sum[2] += px[2];
        self.count += 1;
    }

    fn mean(&self) -> Option<Rgb> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Rgb::new(
            (self.sum[0] / n).clamp(0.0, 1.0),
            (self.sum[1] / n).clamp(0.0, 1.0),
            (self.sum[2] / n).clamp(0.0, 1.0),
        ))
    }
}

fn pixel(image: &Rgb32FImage, x: u32, y: u32) -> [f64; 3] {
    let [r, g, b] = image.get_pixel(x, y).0;
    [f64::from(r), f64::from(g), f64::from(b)]
}

impl ColorSampler {
    /// Create a sampler from the sampling section of the configuration
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            near_black: config.near_black,
            near_white: config.near_white,
            min_region_pixels: config.min_region_pixels,
        }
    }

    /// Unfiltered mean over a chart patch rectangle.
    ///
    /// Returns black when the rectangle covers no pixel, which the
    /// calibration bands then reject.
    pub fn sample_patch(&self, image: &Rgb32FImage, rect: &Rect) -> Rgb {
        let bounds = rect.to_pixel_bounds(image.width(), image.height());
        Self::unfiltered_mean(image, bounds)
            .and_then(|acc| acc.mean())
            .unwrap_or(Rgb::new(0.0, 0.0, 0.0))
    }

    /// Filtered mean over a live sample selection
    pub fn sample_region(&self, image: &Rgb32FImage, selection: &Selection) -> RegionSample {
        let (width, height) = image.dimensions();
        let (bounds, polygon) = match selection {
            Selection::FullImage => (NormalizedRect::full().to_pixel_bounds(width, height), None),
            Selection::Rect(rect) => (rect.to_pixel_bounds(width, height), None),
            Selection::Polygon(polygon) => {
                let bounds = polygon
                    .bounding_rect()
                    .map(|r| r.to_pixel_bounds(width, height))
                    .unwrap_or(PixelBounds { x0: 0, y0: 0, x1: 0, y1: 0 });
                (bounds, Some(polygon))
            }
        };

        if bounds.width() < self.min_region_pixels || bounds.height() < self.min_region_pixels {
            warn!(
                "event=sample_fallback reason=region_too_small width={} height={}",
                bounds.width(),
                bounds.height()
            );
            return self.full_image_fallback(image);
        }

        let mut acc = Accumulator::default();
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                if let Some(polygon) = polygon {
                    let center = Point::new(
                        (f64::from(x) + 0.5) / f64::from(width),
                        (f64::from(y) + 0.5) / f64::from(height),
                    );
                    if !polygon.contains(center) {
                        continue;
                    }
                }
                let px = pixel(image, x, y);
                if self.is_background(px) {
                    continue;
                }
                acc.add(px);
            }
        }

        match acc.mean() {
            Some(color) => {
                debug!("event=sample_region pixels={} color={:?}", acc.count, color);
                RegionSample {
                    color,
                    pixel_count: acc.count,
                    used_fallback: false,
                }
            }
            None => {
                warn!("event=sample_fallback reason=no_eligible_pixels");
                self.full_image_fallback(image)
            }
        }
    }

    /// Near-black or near-white on every channel
    fn is_background(&self, px: [f64; 3]) -> bool {
        px.iter().all(|&c| c < self.near_black) || px.iter().all(|&c| c > self.near_white)
    }

    fn full_image_fallback(&self, image: &Rgb32FImage) -> RegionSample {
        let bounds = NormalizedRect::full().to_pixel_bounds(image.width(), image.height());
        let mean = Self::unfiltered_mean(image, bounds)
            .and_then(|acc| acc.mean().map(|color| (color, acc.count)));
        match mean {
            Some((color, pixel_count)) => RegionSample {
                color,
                pixel_count,
                used_fallback: true,
            },
            None => RegionSample {
                color: Rgb::new(0.0, 0.0, 0.0),
                pixel_count: 0,
                used_fallback: true,
            },
        }
    }

    fn unfiltered_mean(image: &Rgb32FImage, bounds: PixelBounds) -> Option<Accumulator> {
        if bounds.is_empty() {
            return None;
        }
        let mut acc = Accumulator::default();
        for y in bounds.y0..bounds.y1 {
            for x in bounds.x0..bounds.x1 {
                acc.add(pixel(image, x, y));
            }
        }
        Some(acc)
    }
}
