//! Chart patch localization and sampling region geometry
//!
//! This module maps chart grid positions to pixel regions and resolves
//! caller selections (rectangles and polygons) to pixels.

pub mod patch;
pub mod region;

pub use patch::{PatchLocator, Rect};
pub use region::{NormalizedRect, PixelBounds, Point, Polygon, Selection};
