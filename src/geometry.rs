//! World-space geometry: points, contours and the pixel-to-world transform.

use serde::{Deserialize, Serialize};

/// Upper bound on the number of points any producer emits for one contour.
pub const MAX_CONTOUR_POINTS: usize = 200;

/// A point in the viewer's 3D world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &WorldPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Linear blend between `self` (t = 0) and `other` (t = 1).
    pub fn lerp(&self, other: &WorldPoint, t: f64) -> WorldPoint {
        WorldPoint {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

/// Closed polygon of world-space points; the last point connects to the first.
///
/// An empty contour means "no contour produced".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    points: Vec<WorldPoint>,
}

impl Contour {
    pub fn new(points: Vec<WorldPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Arithmetic mean of the vertices, or `None` for an empty contour.
    pub fn centroid(&self) -> Option<WorldPoint> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy, sz) = self
            .points
            .iter()
            .fold((0.0, 0.0, 0.0), |(sx, sy, sz), p| (sx + p.x, sy + p.y, sz + p.z));
        Some(WorldPoint::new(sx / n, sy / n, sz / n))
    }

    /// Length of the closed polygon including the closing edge.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.points[i].distance_to(&self.points[(i + 1) % n]))
            .sum()
    }
}

impl From<Vec<WorldPoint>> for Contour {
    fn from(points: Vec<WorldPoint>) -> Self {
        Self::new(points)
    }
}

/// Transform from pixel coordinates of the displayed slice to world space.
///
/// Returning `None` drops that pixel from any contour being built.
pub trait CoordinateMapper {
    fn pixel_to_world(&self, x: usize, y: usize) -> Option<WorldPoint>;
}

impl<F> CoordinateMapper for F
where
    F: Fn(usize, usize) -> Option<WorldPoint>,
{
    fn pixel_to_world(&self, x: usize, y: usize) -> Option<WorldPoint> {
        self(x, y)
    }
}

/// Maps pixel `(x, y)` to `(x, y, z)` on a fixed plane.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityMapper {
    pub z: f64,
}

impl CoordinateMapper for IdentityMapper {
    fn pixel_to_world(&self, x: usize, y: usize) -> Option<WorldPoint> {
        Some(WorldPoint::new(x as f64, y as f64, self.z))
    }
}

/// Image-plane geometry of a slice: patient-space origin of pixel (0, 0),
/// row / column direction cosines and pixel spacing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlaneMapper {
    pub origin: [f64; 3],
    /// Direction of increasing x (along a row).
    pub row_direction: [f64; 3],
    /// Direction of increasing y (down a column).
    pub column_direction: [f64; 3],
    /// `[x spacing, y spacing]` in world units per pixel.
    pub spacing: [f64; 2],
}

impl Default for ImagePlaneMapper {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            row_direction: [1.0, 0.0, 0.0],
            column_direction: [0.0, 1.0, 0.0],
            spacing: [1.0, 1.0],
        }
    }
}

impl ImagePlaneMapper {
    /// Axial plane at height `z` with isotropic in-plane spacing.
    pub fn axial(origin_x: f64, origin_y: f64, z: f64, spacing: f64) -> Self {
        Self {
            origin: [origin_x, origin_y, z],
            spacing: [spacing, spacing],
            ..Self::default()
        }
    }
}

impl CoordinateMapper for ImagePlaneMapper {
    fn pixel_to_world(&self, x: usize, y: usize) -> Option<WorldPoint> {
        let dx = x as f64 * self.spacing[0];
        let dy = y as f64 * self.spacing[1];
        let p = WorldPoint::new(
            self.origin[0] + self.row_direction[0] * dx + self.column_direction[0] * dy,
            self.origin[1] + self.row_direction[1] * dx + self.column_direction[1] * dy,
            self.origin[2] + self.row_direction[2] * dx + self.column_direction[2] * dy,
        );
        (p.x.is_finite() && p.y.is_finite() && p.z.is_finite()).then_some(p)
    }
}
