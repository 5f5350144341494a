//! Contour extraction from selection masks.
//!
//! Turns a binary mask into a closed world-space polygon:
//! 1. Collect boundary pixels (set, with at least one unset 4-neighbour)
//! 2. Order them, by default by angle around their centroid
//! 3. Map through the caller's [`CoordinateMapper`], dropping unmapped pixels
//! 4. Subsample by a uniform stride down to [`MAX_CONTOUR_POINTS`]
//!
//! Angular ordering is exact for convex and star-shaped regions only. Deeply
//! concave or hollow regions may come out self-intersecting; for those,
//! [`ContourOrdering::BoundaryTrace`] follows the outer boundary with
//! Moore-neighbour tracing instead.

use serde::{Deserialize, Serialize};

use crate::geometry::{Contour, CoordinateMapper, WorldPoint, MAX_CONTOUR_POINTS};
use crate::raster::Mask;

/// How boundary pixels are put in polygon order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContourOrdering {
    /// Sort every boundary pixel by `atan2` around the boundary centroid.
    #[default]
    Angular,
    /// Trace the outer boundary of the top-left component.
    BoundaryTrace,
}

/// Extract a contour using angular ordering.
pub fn extract_contour(mask: &Mask, mapper: &dyn CoordinateMapper) -> Contour {
    extract_contour_with(mask, mapper, ContourOrdering::Angular)
}

/// Extract a contour with an explicit ordering strategy.
pub fn extract_contour_with(
    mask: &Mask,
    mapper: &dyn CoordinateMapper,
    ordering: ContourOrdering,
) -> Contour {
    let ordered = match ordering {
        ContourOrdering::Angular => order_by_angle(boundary_pixels(mask)),
        ContourOrdering::BoundaryTrace => {
            let traced = trace_outer_boundary(mask);
            if traced.len() >= 3 {
                traced
            } else {
                // Specks and lines have no meaningful traced outline.
                order_by_angle(boundary_pixels(mask))
            }
        }
    };

    let points: Vec<WorldPoint> = ordered
        .into_iter()
        .filter_map(|(x, y)| mapper.pixel_to_world(x, y))
        .collect();

    Contour::new(subsample(points, MAX_CONTOUR_POINTS))
}

/// Keep every `ceil(len / max)`-th point when there are more than `max`.
pub fn subsample<P>(points: Vec<P>, max: usize) -> Vec<P> {
    if max == 0 {
        return Vec::new();
    }
    if points.len() <= max {
        return points;
    }
    let stride = points.len().div_ceil(max);
    points.into_iter().step_by(stride).collect()
}

/// Check if a pixel is on the boundary (selected with at least one unselected neighbor).
#[inline]
fn is_boundary(mask: &Mask, x: isize, y: isize) -> bool {
    if !mask.is_set_signed(x, y) {
        return false;
    }
    !mask.is_set_signed(x - 1, y)
        || !mask.is_set_signed(x + 1, y)
        || !mask.is_set_signed(x, y - 1)
        || !mask.is_set_signed(x, y + 1)
}

/// All boundary pixels in row-major order.
pub fn boundary_pixels(mask: &Mask) -> Vec<(usize, usize)> {
    mask.set_pixels()
        .filter(|&(x, y)| is_boundary(mask, x as isize, y as isize))
        .collect()
}

fn order_by_angle(mut pixels: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    if pixels.is_empty() {
        return pixels;
    }

    let n = pixels.len() as f64;
    let (sx, sy) = pixels
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
    let (cx, cy) = (sx / n, sy / n);

    let angle = |&(x, y): &(usize, usize)| (y as f64 - cy).atan2(x as f64 - cx);
    pixels.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
    pixels
}

/// Moore neighborhood directions (8-connected, clockwise from right)
const DIRECTIONS: [(isize, isize); 8] = [
    (1, 0),   // 0: right
    (1, 1),   // 1: down-right
    (0, 1),   // 2: down
    (-1, 1),  // 3: down-left
    (-1, 0),  // 4: left
    (-1, -1), // 5: up-left
    (0, -1),  // 6: up
    (1, -1),  // 7: up-right
];

const WEST: usize = 4;

fn direction_index(dx: isize, dy: isize) -> usize {
    DIRECTIONS
        .iter()
        .position(|&d| d == (dx, dy))
        .unwrap_or(WEST)
}

/// One Moore-neighbour step: scan clockwise from just after the backtrack
/// cell and return the first set neighbour with its new backtrack direction.
fn moore_step(
    mask: &Mask,
    (x, y): (isize, isize),
    backtrack: usize,
) -> Option<((isize, isize), usize)> {
    for k in 1..=8 {
        let dir = (backtrack + k) % 8;
        let (dx, dy) = DIRECTIONS[dir];
        let next = (x + dx, y + dy);
        if mask.is_set_signed(next.0, next.1) {
            let (px, py) = DIRECTIONS[(dir + 7) % 8];
            let prev = (x + px, y + py);
            return Some((next, direction_index(prev.0 - next.0, prev.1 - next.1)));
        }
    }
    None
}

/// Trace the outer boundary of the component holding the top-left set pixel.
fn trace_outer_boundary(mask: &Mask) -> Vec<(usize, usize)> {
    // Row-major order makes the first set pixel the topmost-leftmost one,
    // whose west neighbour is guaranteed to be background.
    let Some((sx, sy)) = mask.set_pixels().next() else {
        return Vec::new();
    };
    let start = (sx as isize, sy as isize);

    let mut contour = vec![(sx, sy)];
    let Some((first_next, mut backtrack)) = moore_step(mask, start, WEST) else {
        return contour;
    };

    let max_steps = mask.width() * mask.height() * 4;
    let mut current = first_next;

    for _ in 0..max_steps {
        let Some((next, next_backtrack)) = moore_step(mask, current, backtrack) else {
            break;
        };
        // Back at the start about to repeat the first move: outline closed.
        if current == start && next == first_next {
            break;
        }
        contour.push((current.0 as usize, current.1 as usize));
        current = next;
        backtrack = next_backtrack;
    }

    contour
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IdentityMapper;

    fn rect_mask(width: usize, height: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> Mask {
        let mut mask = Mask::new(width, height);
        for y in y0..y1 {
            for x in x0..x1 {
                mask.set(x, y);
            }
        }
        mask
    }

    /// 9x9 mask with a 7x7 ring whose 3x3 centre is hollow.
    fn donut_mask() -> Mask {
        let mut mask = rect_mask(9, 9, 1, 1, 8, 8);
        for y in 3..6 {
            for x in 3..6 {
                mask.unset(x, y);
            }
        }
        mask
    }

    #[test]
    fn test_empty_mask() {
        let mask = Mask::new(10, 10);
        assert!(extract_contour(&mask, &IdentityMapper::default()).is_empty());
    }

    #[test]
    fn test_full_mask() {
        let mask = rect_mask(10, 10, 0, 0, 10, 10);
        let contour = extract_contour(&mask, &IdentityMapper::default());
        // Frame of a 10x10 block
        assert_eq!(contour.len(), 36);
    }

    #[test]
    fn test_single_pixel() {
        let mut mask = Mask::new(5, 5);
        mask.set(2, 2);
        let contour = extract_contour(&mask, &IdentityMapper { z: 3.0 });
        assert_eq!(contour.points(), &[WorldPoint::new(2.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_angular_order_is_monotonic() {
        let mask = rect_mask(20, 20, 4, 4, 15, 12);
        let contour = extract_contour(&mask, &IdentityMapper::default());
        let c = contour.centroid().unwrap();
        let angles: Vec<f64> = contour
            .points()
            .iter()
            .map(|p| (p.y - c.y).atan2(p.x - c.x))
            .collect();
        assert!(angles.windows(2).all(|w| w[0] <= w[1] + 1e-9));
    }

    #[test]
    fn test_large_mask_is_capped() {
        let mask = rect_mask(300, 300, 0, 0, 300, 300);
        let contour = extract_contour(&mask, &IdentityMapper::default());
        assert!(contour.len() <= MAX_CONTOUR_POINTS);
        assert!(contour.len() > MAX_CONTOUR_POINTS / 2);
    }

    #[test]
    fn test_unmapped_pixels_are_dropped() {
        let mask = rect_mask(10, 10, 2, 2, 6, 6);
        let mapper = |x: usize, y: usize| (x != 2).then(|| WorldPoint::new(x as f64, y as f64, 0.0));
        let contour = extract_contour(&mask, &mapper);
        // 12 boundary pixels, 4 of them in column 2
        assert_eq!(contour.len(), 8);
        assert!(contour.points().iter().all(|p| p.x != 2.0));
    }

    #[test]
    fn test_trace_rectangle_visits_every_boundary_pixel() {
        let mask = rect_mask(10, 10, 3, 2, 7, 5);
        let contour =
            extract_contour_with(&mask, &IdentityMapper::default(), ContourOrdering::BoundaryTrace);
        assert_eq!(contour.len(), 10);
        assert_eq!(contour.points()[0], WorldPoint::new(3.0, 2.0, 0.0));
        // Clockwise: second point is to the right of the start
        assert_eq!(contour.points()[1], WorldPoint::new(4.0, 2.0, 0.0));
    }

    #[test]
    fn test_trace_skips_inner_hole() {
        let mask = donut_mask();
        let angular = extract_contour(&mask, &IdentityMapper::default());
        let traced =
            extract_contour_with(&mask, &IdentityMapper::default(), ContourOrdering::BoundaryTrace);
        assert_eq!(angular.len(), 36);
        assert_eq!(traced.len(), 24);
    }

    #[test]
    fn test_subsample_stride() {
        let v: Vec<usize> = (0..401).collect();
        let s = subsample(v, 200);
        assert_eq!(s.len(), 134);
        assert_eq!(s[1], 3);
        assert_eq!(subsample(vec![1, 2, 3], 200), vec![1, 2, 3]);
    }
}
