//! Soil color classification
//!
//! Maps calibrated colors to Munsell soil color notation and the soil
//! order the color most commonly indicates.

pub mod classifier;
pub mod munsell;

pub use classifier::{ColorClassifier, SoilClassification};
pub use munsell::{MunsellEntry, MUNSELL_CATALOG};
