//! Color representation, conversion and region sampling
//!
//! All colors handled by this crate are non-linear sRGB triples with
//! channels normalized to `[0, 1]`.

pub mod conversion;
pub mod sampler;

pub use conversion::ColorConverter;
pub use sampler::{ColorSampler, RegionSample};

/// sRGB color with `f64` channels in `[0, 1]`
pub type Rgb = palette::Srgb<f64>;
