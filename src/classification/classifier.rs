//! Nearest-neighbor Munsell classification
//!
//! A corrected color is matched to the catalog entry at the smallest
//! Euclidean distance in RGB space. The scan is linear over a small fixed
//! catalog; on equal distances the entry listed first wins.

use serde::{Deserialize, Serialize};

use crate::classification::munsell::{MunsellEntry, MUNSELL_CATALOG};
use crate::color::{ColorConverter, Rgb};

/// Classification handed to presentation and export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilClassification {
    pub munsell_notation: String,
    pub soil_classification: String,
    pub soil_description: String,
}

impl From<&MunsellEntry> for SoilClassification {
    fn from(entry: &MunsellEntry) -> Self {
        Self {
            munsell_notation: entry.notation.to_string(),
            soil_classification: entry.soil_classification.to_string(),
            soil_description: entry.soil_description.to_string(),
        }
    }
}

/// Classifier over a fixed reference catalog
#[derive(Debug, Clone, Copy)]
pub struct ColorClassifier {
    catalog: &'static [MunsellEntry],
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::with_catalog(&MUNSELL_CATALOG)
    }
}

impl ColorClassifier {
    /// Classifier over a custom catalog
    ///
    /// # Panics
    ///
    /// Panics if `catalog` is empty.
    pub fn with_catalog(catalog: &'static [MunsellEntry]) -> Self {
        assert!(!catalog.is_empty(), "classification catalog must not be empty");
        Self { catalog }
    }

    pub fn catalog(&self) -> &'static [MunsellEntry] {
        self.catalog
    }

    /// Closest catalog entry and its distance
    pub fn find_closest_with_distance(&self, color: Rgb) -> (&'static MunsellEntry, f64) {
        let mut best = &self.catalog[0];
        let mut best_distance = ColorConverter::distance(color, best.reference);
        for entry in &self.catalog[1..] {
            let distance = ColorConverter::distance(color, entry.reference);
            if distance < best_distance {
                best = entry;
                best_distance = distance;
            }
        }
        (best, best_distance)
    }

    /// Closest catalog entry
    pub fn find_closest(&self, color: Rgb) -> &'static MunsellEntry {
        self.find_closest_with_distance(color).0
    }

    pub fn classify(&self, color: Rgb) -> SoilClassification {
        SoilClassification::from(self.find_closest(color))
    }
}
