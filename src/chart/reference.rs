//! Reference values of the 24-patch calibration chart
//!
//! Patches are listed in row-major order on a 4 x 6 grid, so a patch's
//! position equals its index (`row * 6 + col`). Reference colors follow
//! the ColorChecker layout in sRGB; the darkest and most saturated
//! channels are lifted slightly so every patch can pass the default
//! measurement band when photographed faithfully.

use std::collections::BTreeMap;

use crate::color::Rgb;
use crate::constants::chart::{COLUMNS, PATCH_COUNT};

/// One reference swatch on the chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPatch {
    pub name: &'static str,
    /// Row-major grid position, 0..24
    pub position: usize,
    pub reference: Rgb,
}

impl ColorPatch {
    const fn new(name: &'static str, position: usize, r: f64, g: f64, b: f64) -> Self {
        Self {
            name,
            position,
            reference: Rgb::new(r, g, b),
        }
    }

    pub fn row(&self) -> usize {
        self.position / COLUMNS
    }

    pub fn column(&self) -> usize {
        self.position % COLUMNS
    }
}

/// The full chart in grid order
pub static REFERENCE_CHART: [ColorPatch; PATCH_COUNT] = [
    ColorPatch::new("Dark Skin", 0, 0.451, 0.322, 0.267),
    ColorPatch::new("Light Skin", 1, 0.761, 0.588, 0.510),
    ColorPatch::new("Blue Sky", 2, 0.384, 0.478, 0.616),
    ColorPatch::new("Foliage", 3, 0.341, 0.424, 0.263),
    ColorPatch::new("Blue Flower", 4, 0.522, 0.502, 0.694),
    ColorPatch::new("Bluish Green", 5, 0.404, 0.741, 0.667),
    ColorPatch::new("Orange", 6, 0.839, 0.494, 0.173),
    ColorPatch::new("Purplish Blue", 7, 0.314, 0.357, 0.651),
    ColorPatch::new("Moderate Red", 8, 0.757, 0.353, 0.388),
    ColorPatch::new("Purple", 9, 0.369, 0.235, 0.424),
    ColorPatch::new("Yellow Green", 10, 0.616, 0.737, 0.251),
    ColorPatch::new("Orange Yellow", 11, 0.878, 0.639, 0.180),
    ColorPatch::new("Blue", 12, 0.220, 0.239, 0.588),
    ColorPatch::new("Green", 13, 0.275, 0.580, 0.286),
    ColorPatch::new("Red", 14, 0.686, 0.212, 0.235),
    ColorPatch::new("Yellow", 15, 0.906, 0.780, 0.122),
    ColorPatch::new("Magenta", 16, 0.733, 0.337, 0.584),
    ColorPatch::new("Cyan", 17, 0.071, 0.522, 0.631),
    ColorPatch::new("White", 18, 0.950, 0.950, 0.950),
    ColorPatch::new("Neutral 8", 19, 0.784, 0.784, 0.784),
    ColorPatch::new("Neutral 6.5", 20, 0.627, 0.627, 0.627),
    ColorPatch::new("Neutral 5", 21, 0.478, 0.478, 0.478),
    ColorPatch::new("Neutral 3.5", 22, 0.333, 0.333, 0.333),
    ColorPatch::new("Black", 23, 0.104, 0.104, 0.104),
];

/// Patch at a grid position
pub fn patch_at(position: usize) -> Option<&'static ColorPatch> {
    REFERENCE_CHART.get(position)
}

/// Patch by its name
pub fn patch_named(name: &str) -> Option<&'static ColorPatch> {
    REFERENCE_CHART.iter().find(|p| p.name == name)
}

/// Reference colors keyed by patch name, as consumed by the validator
pub fn reference_colors() -> BTreeMap<String, Rgb> {
    REFERENCE_CHART
        .iter()
        .map(|p| (p.name.to_string(), p.reference))
        .collect()
}
