//! Seeded region growing with adaptive thresholds and edge stopping.
//!
//! Unlike the magic wand, candidates are compared against the running mean
//! of the region grown so far, so the accepted intensity band follows smooth
//! shading. Growth is closest-first: candidates wait in a min-heap keyed by
//! their distance to the region mean. Because the mean drifts, the heap is
//! rebuilt against the current mean every [`RESORT_INTERVAL`] iterations.
//!
//! A candidate is rejected when
//! - its Sobel magnitude exceeds `gradient_threshold` (an edge), or
//! - it deviates from the region mean by more than the active threshold.
//!
//! With `use_adaptive_threshold` the threshold starts at
//! `max(tolerance, 2 × local σ around the seed)` and, once the region holds
//! more than [`ADAPTIVE_MIN_AREA`] pixels, tracks `max(tolerance, 2.5 × region σ)`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::RegionGrowingConfig;
use crate::filters::edge::{local_std_dev, sobel_magnitude, GradientMap};
use crate::geometry::{Contour, CoordinateMapper};
use crate::raster::{Mask, PixelBuffer, RegionStats, RunningStats, Sample};
use crate::selection::contour::extract_contour_with;

/// Iterations between heap rebuilds against the current region mean.
pub const RESORT_INTERVAL: usize = 100;
/// Window radius for the seed's local standard deviation.
pub const LOCAL_STD_RADIUS: usize = 10;
/// Region size after which the threshold follows the region's own spread.
pub const ADAPTIVE_MIN_AREA: usize = 10;

const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Region growing result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionGrowingResult {
    pub mask: Mask,
    pub width: usize,
    pub height: usize,
    /// Statistics of the grown region; zeroed when nothing was kept
    pub stats: RegionStats,
    pub contour_points: Option<Contour>,
    /// Candidates taken off the queue (largest single-seed run for multi-seed growth)
    pub iterations: usize,
}

impl RegionGrowingResult {
    fn empty(width: usize, height: usize, iterations: usize) -> Self {
        Self {
            mask: Mask::new(width, height),
            width,
            height,
            stats: RegionStats::default(),
            contour_points: None,
            iterations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats.area == 0
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    distance: f64,
    x: usize,
    y: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so BinaryHeap pops the closest candidate; ties in scan order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| (other.y, other.x).cmp(&(self.y, self.x)))
    }
}

/// Output of one single-seed growth before result packaging.
struct Growth {
    mask: Mask,
    stats: RunningStats,
    iterations: usize,
}

/// Grow a region from `(seed_x, seed_y)`.
///
/// Out-of-range seeds and regions smaller than `min_region_size` yield an
/// empty mask with zeroed stats.
pub fn region_grow<T: Sample>(
    pixels: &PixelBuffer<'_, T>,
    seed_x: i64,
    seed_y: i64,
    config: &RegionGrowingConfig,
    mapper: Option<&dyn CoordinateMapper>,
) -> RegionGrowingResult {
    let width = pixels.width();
    let height = pixels.height();

    let Some((sx, sy)) = pixels.checked_coord(seed_x, seed_y) else {
        debug!("region growing seed ({seed_x}, {seed_y}) outside {width}x{height}");
        return RegionGrowingResult::empty(width, height, 0);
    };

    let gradient = sobel_magnitude(pixels);
    let growth = grow(pixels, &gradient, sx, sy, config);

    debug!(
        "region growing from ({sx}, {sy}): {} pixels after {} iterations",
        growth.stats.count(),
        growth.iterations
    );

    if growth.stats.count() < config.min_region_size {
        debug!(
            "region of {} pixels below minimum {}, discarded",
            growth.stats.count(),
            config.min_region_size
        );
        return RegionGrowingResult::empty(width, height, growth.iterations);
    }

    let contour_points = mapper.map(|m| extract_contour_with(&growth.mask, m, config.contour_ordering));

    RegionGrowingResult {
        stats: growth.stats.finish(),
        mask: growth.mask,
        width,
        height,
        contour_points,
        iterations: growth.iterations,
    }
}

/// Grow from every seed and merge the regions.
///
/// Each seed runs the single-seed algorithm independently (in parallel);
/// the union keeps whichever seed claimed a pixel first, and statistics are
/// recomputed over the merged region.
pub fn multi_seed_region_grow<T: Sample>(
    pixels: &PixelBuffer<'_, T>,
    seeds: &[(i64, i64)],
    config: &RegionGrowingConfig,
    mapper: Option<&dyn CoordinateMapper>,
) -> RegionGrowingResult {
    let width = pixels.width();
    let height = pixels.height();

    let in_bounds: Vec<(usize, usize)> = seeds
        .iter()
        .filter_map(|&(x, y)| {
            let coord = pixels.checked_coord(x, y);
            if coord.is_none() {
                warn!("ignoring seed ({x}, {y}) outside {width}x{height}");
            }
            coord
        })
        .collect();

    if in_bounds.is_empty() {
        return RegionGrowingResult::empty(width, height, 0);
    }

    let gradient = sobel_magnitude(pixels);
    let runs: Vec<Growth> = in_bounds
        .par_iter()
        .map(|&(sx, sy)| grow(pixels, &gradient, sx, sy, config))
        .collect();

    let mut merged = Mask::new(width, height);
    let mut iterations = 0;
    for run in &runs {
        iterations = iterations.max(run.iterations);
        if run.stats.count() >= config.min_region_size {
            merged.union_with(&run.mask);
        }
    }

    let stats = RegionStats::from_mask(pixels, &merged);
    debug!(
        "multi-seed growth from {} seeds: {} pixels",
        in_bounds.len(),
        stats.area
    );
    if stats.area == 0 {
        return RegionGrowingResult::empty(width, height, iterations);
    }

    let contour_points = mapper.map(|m| extract_contour_with(&merged, m, config.contour_ordering));

    RegionGrowingResult {
        mask: merged,
        width,
        height,
        stats,
        contour_points,
        iterations,
    }
}

fn grow<T: Sample>(
    pixels: &PixelBuffer<'_, T>,
    gradient: &GradientMap,
    sx: usize,
    sy: usize,
    config: &RegionGrowingConfig,
) -> Growth {
    let width = pixels.width();
    let height = pixels.height();

    let mut mask = Mask::new(width, height);
    let mut queued = vec![false; width * height];
    let mut stats = RunningStats::default();
    let mut heap = BinaryHeap::new();

    mask.set(sx, sy);
    queued[sy * width + sx] = true;
    stats.push(pixels.get(sx, sy));

    let tolerance = config.intensity_tolerance;
    let mut threshold = if config.use_adaptive_threshold {
        tolerance.max(local_std_dev(pixels, sx, sy, LOCAL_STD_RADIUS) * 2.0)
    } else {
        tolerance
    };

    enqueue_neighbours(pixels, &mut queued, &mut heap, sx, sy, stats.mean());

    let mut iterations = 0;
    while iterations < config.max_iterations {
        if iterations > 0 && iterations % RESORT_INTERVAL == 0 {
            let mean = stats.mean();
            heap = heap
                .into_iter()
                .map(|c| Candidate {
                    distance: (pixels.get(c.x, c.y) - mean).abs(),
                    ..c
                })
                .collect();
        }

        let Some(candidate) = heap.pop() else {
            break;
        };
        iterations += 1;

        let (x, y) = (candidate.x, candidate.y);
        if gradient.get(x, y) > config.gradient_threshold {
            continue;
        }
        let value = pixels.get(x, y);
        if (value - stats.mean()).abs() > threshold {
            continue;
        }

        mask.set(x, y);
        stats.push(value);

        if config.use_adaptive_threshold && stats.count() > ADAPTIVE_MIN_AREA {
            threshold = tolerance.max(stats.std_dev() * 2.5);
        }

        enqueue_neighbours(pixels, &mut queued, &mut heap, x, y, stats.mean());
    }

    Growth {
        mask,
        stats,
        iterations,
    }
}

fn enqueue_neighbours<T: Sample>(
    pixels: &PixelBuffer<'_, T>,
    queued: &mut [bool],
    heap: &mut BinaryHeap<Candidate>,
    x: usize,
    y: usize,
    mean: f64,
) {
    let width = pixels.width();
    let height = pixels.height();

    for (dx, dy) in NEIGHBOURS {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        let idx = ny * width + nx;
        if !queued[idx] {
            queued[idx] = true;
            heap.push(Candidate {
                distance: (pixels.get(nx, ny) - mean).abs(),
                x: nx,
                y: ny,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IdentityMapper;
    use approx::assert_relative_eq;

    fn fixed(tolerance: f64, gradient_threshold: f64) -> RegionGrowingConfig {
        RegionGrowingConfig {
            intensity_tolerance: tolerance,
            gradient_threshold,
            max_iterations: 1_000_000,
            min_region_size: 1,
            use_adaptive_threshold: false,
            ..Default::default()
        }
    }

    /// `w`x`h` image: columns below `edge_x` at `low`, the rest at `high`.
    fn step_image(w: usize, h: usize, edge_x: usize, low: f32, high: f32) -> Vec<f32> {
        (0..w * h)
            .map(|i| if i % w < edge_x { low } else { high })
            .collect()
    }

    #[test]
    fn test_uniform_region_fills_image() {
        let image = vec![80u16; 30 * 30];
        let buf = PixelBuffer::new(&image, 30, 30).unwrap();
        let result = region_grow(&buf, 15, 15, &fixed(5.0, 10.0), None);
        assert_eq!(result.stats.area, 900);
        assert_relative_eq!(result.stats.mean_intensity, 80.0);
        assert_eq!(result.stats.std_intensity, 0.0);
        assert_eq!(result.mask.count(), 900);
    }

    #[test]
    fn test_gradient_stops_growth() {
        let image = step_image(20, 20, 10, 100.0, 150.0);
        let buf = PixelBuffer::new(&image, 20, 20).unwrap();
        // Intensity tolerance alone would admit the bright side.
        let result = region_grow(&buf, 3, 10, &fixed(100.0, 50.0), None);
        // Columns 0..=8; column 9 sits on the edge response.
        assert_eq!(result.stats.area, 9 * 20);
        assert!(!result.mask.is_set(9, 0));
        assert!(!result.mask.is_set(12, 10));
    }

    #[test]
    fn test_running_mean_follows_gentle_ramp() {
        // Ramp of 2 per column over 40 columns: total rise 78.
        let image: Vec<f32> = (0..40 * 5).map(|i| (i % 40) as f32 * 2.0).collect();
        let buf = PixelBuffer::new(&image, 40, 5).unwrap();
        let result = region_grow(&buf, 0, 2, &fixed(12.0, 100.0), None);
        // The drifting mean carries the region well beyond seed ± tolerance.
        let bounds = result.mask.bounds();
        assert!(bounds.max_x > 6, "grew to column {}", bounds.max_x);
    }

    #[test]
    fn test_out_of_bounds_seed() {
        let image = vec![1.0f64; 16];
        let buf = PixelBuffer::new(&image, 4, 4).unwrap();
        for (x, y) in [(-1, 1), (4, 1), (1, 4), (1, -9)] {
            let result = region_grow(&buf, x, y, &RegionGrowingConfig::default(), None);
            assert!(result.is_empty());
            assert_eq!(result.stats, RegionStats::default());
        }
    }

    #[test]
    fn test_min_region_size_discards_small_blob() {
        let mut image = vec![0u8; 20 * 20];
        for y in 5..8 {
            for x in 5..8 {
                image[y * 20 + x] = 200;
            }
        }
        let buf = PixelBuffer::new(&image, 20, 20).unwrap();
        let config = RegionGrowingConfig {
            min_region_size: 10,
            ..fixed(5.0, 1000.0)
        };
        let result = region_grow(&buf, 6, 6, &config, Some(&IdentityMapper::default()));
        assert!(result.mask.is_empty());
        assert_eq!(result.stats, RegionStats::default());
        assert!(result.contour_points.is_none());
    }

    #[test]
    fn test_max_iterations_bound() {
        let image = vec![10u8; 50 * 50];
        let buf = PixelBuffer::new(&image, 50, 50).unwrap();
        let config = RegionGrowingConfig {
            max_iterations: 250,
            ..fixed(5.0, 10.0)
        };
        let result = region_grow(&buf, 25, 25, &config, None);
        assert_eq!(result.iterations, 250);
        // Seed plus every dequeued (uniform, so accepted) candidate.
        assert_eq!(result.stats.area, 251);
    }

    #[test]
    fn test_closest_candidate_admitted_first() {
        // Seed 100; left 110, right 103, up 108, down 105.
        #[rustfmt::skip]
        let image: Vec<f32> = vec![
            100.0, 108.0, 100.0,
            110.0, 100.0, 103.0,
            100.0, 105.0, 100.0,
        ];
        let buf = PixelBuffer::new(&image, 3, 3).unwrap();
        let config = RegionGrowingConfig {
            max_iterations: 1,
            ..fixed(50.0, 1e9)
        };
        let result = region_grow(&buf, 1, 1, &config, None);
        assert_eq!(result.stats.area, 2);
        assert!(result.mask.is_set(2, 1));
        assert!(!result.mask.is_set(0, 1));
        assert!(!result.mask.is_set(1, 0));
        assert!(!result.mask.is_set(1, 2));
    }

    #[test]
    fn test_queue_rekeyed_against_drifting_mean() {
        // Single row: x = 0 holds 60, the seed at x = 1 holds 0, and x >= 2
        // ramps up by one per column. The ramp is always closer to the mean
        // than the stale key of 60, so the first 100 pops walk the ramp and
        // lift the mean to 50. After re-keying, x = 0 sits 10 away while the
        // next ramp pixel (101) sits 51 away.
        let mut image: Vec<f32> = (0..110).map(|x| x as f32 - 1.0).collect();
        image[0] = 60.0;
        image[1] = 0.0;
        let buf = PixelBuffer::new(&image, 110, 1).unwrap();

        let config = RegionGrowingConfig {
            max_iterations: 101,
            ..fixed(100.0, 1e9)
        };
        let result = region_grow(&buf, 1, 0, &config, None);
        assert_eq!(result.iterations, 101);
        assert_eq!(result.stats.area, 102);
        assert!(result.mask.is_set(0, 0));
        assert!(result.mask.is_set(101, 0));
        assert!(!result.mask.is_set(102, 0));

        // One iteration earlier the stale key still ranks x = 0 last.
        let before = region_grow(&buf, 1, 0, &RegionGrowingConfig { max_iterations: 100, ..config }, None);
        assert!(!before.mask.is_set(0, 0));
        assert!(before.mask.is_set(101, 0));
    }

    #[test]
    fn test_adaptive_threshold_widens_on_noisy_seed() {
        // Diagonal stripes of 100 / 110 / 120: every 4-neighbour of a pixel
        // differs from it by 10, and the local σ is about 8.2.
        let image: Vec<f32> = (0..30 * 30)
            .map(|i| 100.0 + 10.0 * (((i % 30) + (i / 30)) % 3) as f32)
            .collect();
        let buf = PixelBuffer::new(&image, 30, 30).unwrap();

        let mut config = fixed(5.0, 1000.0);
        let strict = region_grow(&buf, 10, 9, &config, None);
        assert_eq!(strict.stats.area, 1);

        config.use_adaptive_threshold = true;
        let adaptive = region_grow(&buf, 10, 9, &config, None);
        assert!(adaptive.stats.area >= 5, "area {}", adaptive.stats.area);
    }

    #[test]
    fn test_multi_seed_union() {
        // Two bright squares on a dark background.
        let mut image = vec![0u8; 30 * 30];
        for y in 2..8 {
            for x in 2..8 {
                image[y * 30 + x] = 200;
                image[(y + 18) * 30 + x + 18] = 180;
            }
        }
        let buf = PixelBuffer::new(&image, 30, 30).unwrap();
        let config = fixed(10.0, 10_000.0);

        let result = multi_seed_region_grow(&buf, &[(4, 4), (22, 22), (-5, 0)], &config, None);
        assert_eq!(result.stats.area, 72);
        assert_relative_eq!(result.stats.mean_intensity, 190.0);
        assert_relative_eq!(result.stats.min_intensity, 180.0);
        assert_relative_eq!(result.stats.max_intensity, 200.0);
        assert!(result.mask.is_set(4, 4) && result.mask.is_set(22, 22));
    }

    #[test]
    fn test_multi_seed_matches_sequential_union() {
        let image: Vec<u16> = (0..40 * 40)
            .map(|i| (((i % 40) / 8 + (i / 40) / 8) % 3) as u16 * 60)
            .collect();
        let buf = PixelBuffer::new(&image, 40, 40).unwrap();
        let config = fixed(10.0, 1e9);
        let seeds = [(1, 1), (20, 3), (35, 30), (9, 9)];

        let mut expected = Mask::new(40, 40);
        for &(x, y) in &seeds {
            expected.union_with(&region_grow(&buf, x, y, &config, None).mask);
        }

        for _ in 0..3 {
            let result = multi_seed_region_grow(&buf, &seeds, &config, None);
            assert_eq!(result.mask, expected);
            assert_eq!(result.stats, RegionStats::from_mask(&buf, &expected));
        }
    }

    #[test]
    fn test_multi_seed_overlapping_regions_count_once() {
        let image = vec![42u8; 10 * 10];
        let buf = PixelBuffer::new(&image, 10, 10).unwrap();
        let result = multi_seed_region_grow(&buf, &[(1, 1), (8, 8)], &fixed(1.0, 1.0), None);
        assert_eq!(result.stats.area, 100);
    }

    #[test]
    fn test_multi_seed_no_valid_seeds() {
        let image = vec![42u8; 10 * 10];
        let buf = PixelBuffer::new(&image, 10, 10).unwrap();
        let result = multi_seed_region_grow(&buf, &[], &RegionGrowingConfig::default(), None);
        assert!(result.is_empty());
    }
}
