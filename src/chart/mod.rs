//! Reference color chart model

pub mod reference;

pub use reference::{patch_at, patch_named, reference_colors, ColorPatch, REFERENCE_CHART};
