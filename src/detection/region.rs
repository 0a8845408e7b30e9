//! Sampling regions in normalized and pixel coordinates
//!
//! Selections arrive from the caller in normalized `[0, 1]²` image
//! coordinates, either as an axis-aligned rectangle or as a polygon.
//! They are resolved here to pixel bounds and, for polygons, to a
//! per-pixel containment test.
//!
//! Algorithm tag: `algo-ray-casting-containment`

use serde::{Deserialize, Serialize};

/// Point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering the whole image
    pub const fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Resolve to pixel bounds inside a `width` x `height` image
    pub fn to_pixel_bounds(&self, width: u32, height: u32) -> PixelBounds {
        PixelBounds::from_pixel_rect(
            self.x * f64::from(width),
            self.y * f64::from(height),
            self.width * f64::from(width),
            self.height * f64::from(height),
            width,
            height,
        )
    }
}

/// Simple polygon in normalized image coordinates.
///
/// Containment uses even-odd ray casting with a half-open edge rule: a
/// point on the minimum-x or minimum-y side of an edge counts as inside,
/// a point on the maximum side counts as outside. For an axis-aligned
/// square this puts the left and top edges (smallest x, smallest y)
/// inside and the right and bottom edges outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Even-odd ray casting test along +x
    pub fn contains(&self, p: Point) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y) {
                let x_cross = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Bounding rectangle of the vertices, or `None` for an empty polygon
    pub fn bounding_rect(&self) -> Option<NormalizedRect> {
        let first = self.vertices.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for v in &self.vertices[1..] {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }
        Some(NormalizedRect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Region of an image to sample a live color from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Selection {
    /// Whole image
    FullImage,
    /// Axis-aligned rectangle
    Rect(NormalizedRect),
    /// Pixels whose normalized center lies inside the polygon
    Polygon(Polygon),
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`, always inside its image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelBounds {
    /// Truncate a floating-point pixel rectangle and clip it to the image
    pub fn from_pixel_rect(x: f64, y: f64, width: f64, height: f64, img_w: u32, img_h: u32) -> Self {
        let clip = |v: f64, limit: u32| -> u32 {
            if v.is_nan() || v <= 0.0 {
                0
            } else {
                (v.floor() as u64).min(u64::from(limit)) as u32
            }
        };
        let x0 = clip(x, img_w);
        let y0 = clip(y, img_h);
        let x1 = clip(x + width, img_w).max(x0);
        let y1 = clip(y + height, img_h).max(y0);
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            Point::new(0.2, 0.2),
            Point::new(0.8, 0.2),
            Point::new(0.8, 0.8),
            Point::new(0.2, 0.8),
        ])
    }

    #[test]
    fn test_interior_and_exterior_points() {
        let square = unit_square();
        assert!(square.contains(Point::new(0.5, 0.5)));
        assert!(square.contains(Point::new(0.21, 0.79)));
        assert!(!square.contains(Point::new(0.1, 0.5)));
        assert!(!square.contains(Point::new(0.5, 0.9)));
        assert!(!square.contains(Point::new(0.9, 0.9)));
    }

    #[test]
    fn test_edge_parity_rule() {
        let square = unit_square();
        // Minimum edges are inside
        assert!(square.contains(Point::new(0.2, 0.5)));
        assert!(square.contains(Point::new(0.5, 0.2)));
        // Maximum edges are outside
        assert!(!square.contains(Point::new(0.8, 0.5)));
        assert!(!square.contains(Point::new(0.5, 0.8)));
    }

    #[test]
    fn test_vertex_parity_rule() {
        let square = unit_square();
        assert!(square.contains(Point::new(0.2, 0.2)));
        assert!(!square.contains(Point::new(0.8, 0.2)));
        assert!(!square.contains(Point::new(0.8, 0.8)));
        assert!(!square.contains(Point::new(0.2, 0.8)));
    }

    #[test]
    fn test_parity_is_independent_of_winding() {
        let mut reversed = unit_square();
        reversed.vertices.reverse();
        for p in [
            Point::new(0.2, 0.5),
            Point::new(0.8, 0.5),
            Point::new(0.5, 0.2),
            Point::new(0.5, 0.8),
            Point::new(0.5, 0.5),
        ] {
            assert_eq!(reversed.contains(p), unit_square().contains(p), "{:?}", p);
        }
    }

    #[test]
    fn test_triangle_containment() {
        let triangle = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ]);
        assert!(triangle.contains(Point::new(0.25, 0.25)));
        assert!(!triangle.contains(Point::new(0.75, 0.75)));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(!line.contains(Point::new(0.5, 0.5)));
        assert!(Polygon::new(vec![]).bounding_rect().is_none());
    }

    #[test]
    fn test_bounding_rect() {
        let rect = unit_square().bounding_rect().unwrap();
        assert!((rect.x - 0.2).abs() < 1e-12);
        assert!((rect.width - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_pixel_bounds_clip_to_image() {
        let bounds = NormalizedRect::new(-0.5, 0.5, 2.0, 1.0).to_pixel_bounds(100, 50);
        assert_eq!(bounds, PixelBounds { x0: 0, y0: 25, x1: 100, y1: 50 });

        let full = NormalizedRect::full().to_pixel_bounds(64, 48);
        assert_eq!((full.width(), full.height()), (64, 48));
    }

    #[test]
    fn test_selection_json_shape() {
        let json = r#"{"kind":"rect","x":0.1,"y":0.2,"width":0.3,"height":0.4}"#;
        let selection: Selection = serde_json::from_str(json).unwrap();
        assert_eq!(selection, Selection::Rect(NormalizedRect::new(0.1, 0.2, 0.3, 0.4)));
    }
}
