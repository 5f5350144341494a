//! Contour resampling and shape measures.
//!
//! Point-by-point blending only makes sense between contours with the same
//! number of points spread the same way along their outlines, so every
//! interpolation method first resamples both key frames by arc length.

use crate::geometry::WorldPoint;

/// Resample a closed polygon to exactly `target_count` points spaced evenly
/// along its perimeter, starting at the first vertex.
pub fn resample_contour(points: &[WorldPoint], target_count: usize) -> Vec<WorldPoint> {
    let n = points.len();
    if n == 0 || target_count == 0 {
        return Vec::new();
    }

    // cumulative[i] = perimeter distance from points[0] to points[i];
    // cumulative[n] closes the loop back to points[0].
    let mut cumulative = Vec::with_capacity(n + 1);
    cumulative.push(0.0);
    for i in 0..n {
        let seg = points[i].distance_to(&points[(i + 1) % n]);
        cumulative.push(cumulative[i] + seg);
    }
    let total = cumulative[n];

    if total <= f64::EPSILON {
        return vec![points[0]; target_count];
    }

    let step = total / target_count as f64;
    (0..target_count)
        .map(|k| {
            let distance = k as f64 * step;
            let seg = cumulative
                .partition_point(|&c| c <= distance)
                .saturating_sub(1)
                .min(n - 1);
            let seg_len = cumulative[seg + 1] - cumulative[seg];
            let t = if seg_len > 0.0 {
                (distance - cumulative[seg]) / seg_len
            } else {
                0.0
            };
            points[seg].lerp(&points[(seg + 1) % n], t)
        })
        .collect()
}

/// Vertex mean of a point set; origin for an empty set.
pub fn centroid(points: &[WorldPoint]) -> WorldPoint {
    if points.is_empty() {
        return WorldPoint::default();
    }
    let n = points.len() as f64;
    let sum = points.iter().fold(WorldPoint::default(), |acc, p| {
        WorldPoint::new(acc.x + p.x, acc.y + p.y, acc.z + p.z)
    });
    WorldPoint::new(sum.x / n, sum.y / n, sum.z / n)
}

/// Mean in-plane (x/y) distance of the points to `center`.
pub fn mean_radius(points: &[WorldPoint], center: &WorldPoint) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sum: f64 = points
        .iter()
        .map(|p| ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt())
        .sum();
    sum / points.len() as f64
}

/// Translate points so that `center` becomes the origin.
pub fn center_on(points: &[WorldPoint], center: &WorldPoint) -> Vec<WorldPoint> {
    points
        .iter()
        .map(|p| WorldPoint::new(p.x - center.x, p.y - center.y, p.z - center.z))
        .collect()
}

/// Circular weighted moving average with triangular weights.
///
/// Each point becomes the average of itself and `half_window` neighbours on
/// either side, weighted `half_window + 1 - |offset|`.
///
/// Morphological interpolation passes `max(1, floor(smoothing_factor * 5))`
/// here as the half-width, not the full window size: the default factor of
/// 0.5 gives `half_window = 2`, a 5-point window.
pub fn smooth_closed(points: &[WorldPoint], half_window: usize) -> Vec<WorldPoint> {
    let n = points.len();
    if n < 3 || half_window == 0 {
        return points.to_vec();
    }

    let w = half_window as isize;
    (0..n as isize)
        .map(|i| {
            let mut acc = WorldPoint::default();
            let mut weight_sum = 0.0;
            for k in -w..=w {
                let weight = (w + 1 - k.abs()) as f64;
                let p = points[(i + k).rem_euclid(n as isize) as usize];
                acc.x += p.x * weight;
                acc.y += p.y * weight;
                acc.z += p.z * weight;
                weight_sum += weight;
            }
            WorldPoint::new(acc.x / weight_sum, acc.y / weight_sum, acc.z / weight_sum)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn square(size: f64) -> Vec<WorldPoint> {
        vec![
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(size, 0.0, 0.0),
            WorldPoint::new(size, size, 0.0),
            WorldPoint::new(0.0, size, 0.0),
        ]
    }

    #[test]
    fn test_resample_exact_count_even_spacing() {
        let out = resample_contour(&square(10.0), 8);
        assert_eq!(out.len(), 8);
        assert_eq!(out[0], WorldPoint::new(0.0, 0.0, 0.0));
        assert_relative_eq!(out[1].x, 5.0);
        assert_relative_eq!(out[2].x, 10.0);
        assert_relative_eq!(out[3].y, 5.0);
        assert_relative_eq!(out[7].y, 5.0);
        assert_abs_diff_eq!(out[7].x, 0.0);
    }

    #[test]
    fn test_resample_ignores_input_density() {
        // Same square, one edge densely sampled.
        let mut dense = vec![WorldPoint::new(0.0, 0.0, 0.0)];
        for i in 1..10 {
            dense.push(WorldPoint::new(i as f64, 0.0, 0.0));
        }
        dense.extend_from_slice(&square(10.0)[1..]);

        let a = resample_contour(&square(10.0), 16);
        let b = resample_contour(&dense, 16);
        for (p, q) in a.iter().zip(&b) {
            assert_abs_diff_eq!(p.x, q.x, epsilon = 1e-9);
            assert_abs_diff_eq!(p.y, q.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_resample_degenerate_inputs() {
        assert!(resample_contour(&[], 10).is_empty());
        let p = WorldPoint::new(1.0, 2.0, 3.0);
        assert_eq!(resample_contour(&[p, p], 3), vec![p; 3]);
    }

    #[test]
    fn test_mean_radius_of_square() {
        let pts = square(2.0);
        let c = centroid(&pts);
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(mean_radius(&pts, &c), 2.0f64.sqrt());
    }

    #[test]
    fn test_smoothing_half_window_weights() {
        // One spike on a flat ring; half-window 2 spreads it with weights 1 2 3 2 1.
        let mut pts: Vec<WorldPoint> = (0..10).map(|i| WorldPoint::new(i as f64, 0.0, 0.0)).collect();
        pts[5].y = 9.0;
        let smoothed = smooth_closed(&pts, 2);
        assert_relative_eq!(smoothed[5].y, 3.0);
        assert_relative_eq!(smoothed[4].y, 2.0);
        assert_relative_eq!(smoothed[7].y, 1.0);
        assert_eq!(smoothed[8].y, 0.0);
        assert_eq!(smoothed[2].y, 0.0);
    }

    #[test]
    fn test_smoothing_preserves_centroid() {
        let pts = resample_contour(&square(10.0), 40);
        let smoothed = smooth_closed(&pts, 2);
        let a = centroid(&pts);
        let b = centroid(&smoothed);
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
        assert_eq!(smooth_closed(&pts, 0), pts);
    }
}
