//! Munsell soil color reference catalog
//!
//! Each entry pairs a Munsell soil color chip with the soil order it most
//! commonly indicates. RGB values are sRGB approximations of the chips
//! under daylight.

use serde::Serialize;

use crate::color::Rgb;

/// One reference soil color
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MunsellEntry {
    /// Hue value/chroma notation, e.g. "10YR 3/3"
    pub notation: &'static str,
    pub common_name: &'static str,
    /// Soil order associated with the color
    pub soil_classification: &'static str,
    pub soil_description: &'static str,
    pub reference: Rgb,
}

const fn entry(
    notation: &'static str,
    common_name: &'static str,
    soil_classification: &'static str,
    soil_description: &'static str,
    rgb: [f64; 3],
) -> MunsellEntry {
    MunsellEntry {
        notation,
        common_name,
        soil_classification,
        soil_description,
        reference: Rgb::new(rgb[0], rgb[1], rgb[2]),
    }
}

/// Reference catalog in classification order; earlier entries win ties
pub static MUNSELL_CATALOG: [MunsellEntry; 20] = [
    entry(
        "10YR 2/1",
        "Black",
        "Histosoles",
        "Organic soil of decomposed plant material, saturated for most of the year",
        [0.169, 0.149, 0.125],
    ),
    entry(
        "10YR 2/2",
        "Very Dark Brown",
        "Mollisoles",
        "Thick humus-rich surface horizon with high base saturation; very fertile",
        [0.227, 0.180, 0.133],
    ),
    entry(
        "10YR 3/3",
        "Dark Brown",
        "Mollisoles",
        "Dark organic-rich mollic epipedon typical of grassland soils; good structure and fertility",
        [0.251, 0.200, 0.149],
    ),
    entry(
        "10YR 3/1",
        "Very Dark Gray",
        "Vertisoles",
        "Dark clay soil rich in smectite; swells when wet and cracks deeply when dry",
        [0.200, 0.192, 0.180],
    ),
    entry(
        "5YR 3/2",
        "Dark Reddish Brown",
        "Andisoles",
        "Soil formed on volcanic ash; light, porous and high in organic matter",
        [0.310, 0.224, 0.192],
    ),
    entry(
        "10YR 4/3",
        "Brown",
        "Inceptisoles",
        "Young soil with weak horizon development and moderate organic content",
        [0.384, 0.310, 0.239],
    ),
    entry(
        "7.5YR 4/4",
        "Brown",
        "Alfisoles",
        "Clay-enriched subsoil with moderate base saturation under forest cover",
        [0.447, 0.318, 0.216],
    ),
    entry(
        "10YR 5/3",
        "Brown",
        "Alfisoles",
        "Moderately weathered soil with a clay-enriched subsoil and good natural fertility",
        [0.490, 0.416, 0.337],
    ),
    entry(
        "10YR 5/4",
        "Yellowish Brown",
        "Alfisoles",
        "Well-drained soil with iron oxide coatings and a clay-enriched subsoil",
        [0.514, 0.408, 0.290],
    ),
    entry(
        "2.5Y 5/2",
        "Grayish Brown",
        "Inceptisoles",
        "Young, imperfectly drained soil showing early signs of reduction",
        [0.486, 0.447, 0.373],
    ),
    entry(
        "7.5YR 5/6",
        "Strong Brown",
        "Ultisoles",
        "Strongly weathered acid soil with low base saturation and a clay-rich subsoil",
        [0.584, 0.408, 0.243],
    ),
    entry(
        "5YR 4/6",
        "Yellowish Red",
        "Ultisoles",
        "Highly leached, acidic soil of warm humid climates colored by iron oxides",
        [0.537, 0.314, 0.196],
    ),
    entry(
        "2.5YR 4/6",
        "Red",
        "Oxisoles",
        "Deeply weathered tropical soil dominated by iron and aluminium oxides",
        [0.561, 0.271, 0.184],
    ),
    entry(
        "10R 3/6",
        "Dark Red",
        "Oxisoles",
        "Hematite-rich tropical soil with very low nutrient reserves",
        [0.451, 0.184, 0.149],
    ),
    entry(
        "10YR 6/4",
        "Light Yellowish Brown",
        "Entisoles",
        "Recently deposited mineral soil with little or no horizon development",
        [0.624, 0.522, 0.392],
    ),
    entry(
        "2.5Y 6/4",
        "Light Yellowish Brown",
        "Entisoles",
        "Sandy or alluvial parent material with minimal weathering",
        [0.631, 0.545, 0.392],
    ),
    entry(
        "GLEY1 5/10Y",
        "Greenish Gray",
        "Entisoles",
        "Waterlogged mineral soil whose iron has been chemically reduced",
        [0.455, 0.478, 0.447],
    ),
    entry(
        "10YR 6/1",
        "Gray",
        "Spodosoles",
        "Bleached eluvial horizon over an accumulation of humus, iron and aluminium",
        [0.588, 0.565, 0.537],
    ),
    entry(
        "10YR 7/2",
        "Light Gray",
        "Aridisoles",
        "Dry-climate soil low in organic matter, often with carbonate accumulation",
        [0.706, 0.671, 0.620],
    ),
    entry(
        "10YR 8/2",
        "Very Pale Brown",
        "Aridisoles",
        "Desert soil with calcic or gypsic horizons and sparse vegetation",
        [0.816, 0.776, 0.714],
    ),
];
