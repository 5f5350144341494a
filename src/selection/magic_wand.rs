//! Magic wand selection using flood fill.
//!
//! Selects the connected region whose intensity stays within a fixed
//! tolerance of the clicked seed pixel. The seed value is the reference for
//! the whole run; it never drifts toward the region mean.

use log::debug;
use serde::Serialize;

use crate::config::MagicWandConfig;
use crate::filters::morphology::open_mask;
use crate::geometry::{Contour, CoordinateMapper};
use crate::raster::{Bounds, Mask, PixelBuffer, Sample};
use crate::selection::contour::extract_contour_with;

const NEIGHBOURS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const NEIGHBOURS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Magic wand selection result with metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicWandResult {
    /// Selection mask (1 = selected, 0 = not selected)
    pub mask: Mask,
    pub width: usize,
    pub height: usize,
    /// Bounds of the selected region; all zero when nothing is selected
    pub bounds: Bounds,
    /// Number of selected pixels
    pub pixel_count: usize,
    /// World-space outline, present when a coordinate mapper was supplied
    pub contour_points: Option<Contour>,
}

impl MagicWandResult {
    fn empty(width: usize, height: usize) -> Self {
        Self {
            mask: Mask::new(width, height),
            width,
            height,
            bounds: Bounds::default(),
            pixel_count: 0,
            contour_points: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count == 0
    }
}

/// Perform magic wand selection from `(seed_x, seed_y)`.
///
/// # Arguments
/// * `pixels` - Slice intensities
/// * `seed_x`, `seed_y` - Clicked pixel; out-of-range seeds yield an empty result
/// * `config` - Tolerance, connectivity, pixel cap and smoothing
/// * `mapper` - Optional pixel-to-world transform used to build `contour_points`
pub fn magic_wand_select<T: Sample>(
    pixels: &PixelBuffer<'_, T>,
    seed_x: i64,
    seed_y: i64,
    config: &MagicWandConfig,
    mapper: Option<&dyn CoordinateMapper>,
) -> MagicWandResult {
    let width = pixels.width();
    let height = pixels.height();

    let Some((sx, sy)) = pixels.checked_coord(seed_x, seed_y) else {
        debug!("magic wand seed ({seed_x}, {seed_y}) outside {width}x{height}");
        return MagicWandResult::empty(width, height);
    };

    let mut mask = flood_fill(pixels, sx, sy, config);

    if config.smooth_edges && !mask.is_empty() {
        let opened = open_mask(&mask);
        // Smoothing must never discard the clicked pixel.
        if opened.is_set(sx, sy) {
            mask = opened;
        }
    }

    let pixel_count = mask.count();
    let bounds = mask.bounds();
    let contour_points = mapper
        .filter(|_| pixel_count > 0)
        .map(|m| extract_contour_with(&mask, m, config.contour_ordering));

    debug!(
        "magic wand from ({sx}, {sy}): {pixel_count} pixels, contour {:?} points",
        contour_points.as_ref().map(Contour::len)
    );

    MagicWandResult {
        mask,
        width,
        height,
        bounds,
        pixel_count,
        contour_points,
    }
}

/// Explicit-stack depth-first fill admitting neighbours within tolerance of the seed.
fn flood_fill<T: Sample>(
    pixels: &PixelBuffer<'_, T>,
    sx: usize,
    sy: usize,
    config: &MagicWandConfig,
) -> Mask {
    let width = pixels.width();
    let height = pixels.height();
    let mut mask = Mask::new(width, height);
    let mut visited = vec![false; width * height];

    let reference = pixels.get(sx, sy);
    let tolerance = config.tolerance;
    let neighbours: &[(isize, isize)] = if config.eight_connected {
        &NEIGHBOURS_8
    } else {
        &NEIGHBOURS_4
    };

    let mut stack = vec![(sx, sy)];
    visited[sy * width + sx] = true;
    let mut pixel_count = 0usize;

    while let Some((x, y)) = stack.pop() {
        if pixel_count >= config.max_pixels {
            break;
        }

        if (pixels.get(x, y) - reference).abs() > tolerance {
            continue;
        }

        mask.set(x, y);
        pixel_count += 1;

        // Add unvisited neighbors
        for &(dx, dy) in neighbours {
            let nx = x as isize + dx;
            let ny = y as isize + dy;

            if nx >= 0 && nx < width as isize && ny >= 0 && ny < height as isize {
                let nx = nx as usize;
                let ny = ny as usize;
                let nidx = ny * width + nx;
                if !visited[nidx] {
                    visited[nidx] = true;
                    stack.push((nx, ny));
                }
            }
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{IdentityMapper, MAX_CONTOUR_POINTS};

    fn run(data: &[u8], w: usize, h: usize, x: i64, y: i64, config: &MagicWandConfig) -> MagicWandResult {
        let buf = PixelBuffer::new(data, w, h).unwrap();
        magic_wand_select(&buf, x, y, config, None)
    }

    #[test]
    fn test_single_value_fill() {
        let image = vec![100u8; 5 * 5];
        let result = run(&image, 5, 5, 2, 2, &MagicWandConfig { tolerance: 0.0, ..Default::default() });
        assert_eq!(result.pixel_count, 25);
        assert!(result.mask.as_array().iter().all(|&v| v == 1));
    }

    #[test]
    fn test_two_regions() {
        // 4x4 image: left half 10, right half 200
        let mut image = vec![0u8; 4 * 4];
        for y in 0..4 {
            for x in 0..4 {
                image[y * 4 + x] = if x < 2 { 10 } else { 200 };
            }
        }
        let result = run(&image, 4, 4, 0, 0, &MagicWandConfig::default());
        assert_eq!(result.pixel_count, 8);
        assert_eq!(
            result.bounds,
            Bounds {
                min_x: 0,
                min_y: 0,
                max_x: 1,
                max_y: 3
            }
        );
    }

    #[test]
    fn test_tolerance_is_relative_to_seed() {
        // A smooth ramp: a running mean would walk all the way along it.
        let image: Vec<u8> = (0..10).map(|i| i * 5).collect();
        let result = run(&image, 10, 1, 0, 0, &MagicWandConfig { tolerance: 10.0, ..Default::default() });
        assert_eq!(result.pixel_count, 3);
    }

    #[test]
    fn test_diagonal_connectivity() {
        // Checkerboard: only diagonal neighbours share the seed value.
        let mut image = vec![0u8; 5 * 5];
        for y in 0..5 {
            for x in 0..5 {
                image[y * 5 + x] = if (x + y) % 2 == 0 { 255 } else { 0 };
            }
        }
        let four = run(&image, 5, 5, 0, 0, &MagicWandConfig { tolerance: 0.0, ..Default::default() });
        assert_eq!(four.pixel_count, 1);

        let eight = run(
            &image,
            5,
            5,
            0,
            0,
            &MagicWandConfig {
                tolerance: 0.0,
                eight_connected: true,
                ..Default::default()
            },
        );
        assert_eq!(eight.pixel_count, 13);
    }

    #[test]
    fn test_max_pixels_cap() {
        let image = vec![7u8; 40 * 40];
        let result = run(&image, 40, 40, 20, 20, &MagicWandConfig { max_pixels: 100, ..Default::default() });
        assert_eq!(result.pixel_count, 100);
        assert!(result.mask.is_set(20, 20));
    }

    #[test]
    fn test_out_of_bounds_seed() {
        let image = vec![7u8; 16];
        for (x, y) in [(-1, 0), (0, -3), (4, 0), (0, 4)] {
            let result = run(&image, 4, 4, x, y, &MagicWandConfig::default());
            assert_eq!(result.pixel_count, 0);
            assert_eq!(result.bounds, Bounds::default());
            assert!(result.mask.is_empty());
        }
    }

    #[test]
    fn test_smoothing_removes_spur() {
        let mut image = vec![0u8; 12 * 12];
        for y in 2..8 {
            for x in 2..8 {
                image[y * 12 + x] = 100;
            }
        }
        // One-pixel spur sticking out of the block
        image[4 * 12 + 8] = 100;
        image[4 * 12 + 9] = 100;

        let raw = run(&image, 12, 12, 4, 4, &MagicWandConfig::default());
        assert_eq!(raw.pixel_count, 38);

        let smooth = run(&image, 12, 12, 4, 4, &MagicWandConfig { smooth_edges: true, ..Default::default() });
        assert_eq!(smooth.pixel_count, 36);
        assert_eq!(smooth.bounds.max_x, 7);
    }

    #[test]
    fn test_smoothing_keeps_thin_selection() {
        // A one-pixel-wide line would vanish entirely under opening.
        let mut image = vec![0u8; 10 * 10];
        for x in 0..10 {
            image[5 * 10 + x] = 90;
        }
        let result = run(&image, 10, 10, 3, 5, &MagicWandConfig { smooth_edges: true, ..Default::default() });
        assert_eq!(result.pixel_count, 10);
    }

    #[test]
    fn test_contour_with_mapper() {
        let image = vec![50u16; 64 * 64];
        let buf = PixelBuffer::new(&image, 64, 64).unwrap();
        let mapper = IdentityMapper { z: 2.0 };
        let result = magic_wand_select(&buf, 10, 10, &MagicWandConfig::default(), Some(&mapper));
        let contour = result.contour_points.unwrap();
        assert!(!contour.is_empty());
        assert!(contour.len() <= MAX_CONTOUR_POINTS);
        assert!(contour.points().iter().all(|p| p.z == 2.0));
    }
}
