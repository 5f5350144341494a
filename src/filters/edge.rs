//! Edge measures used for edge-stopping during region growth.
//!
//! - **Sobel magnitude**: `sqrt(gx² + gy²)` of the 3×3 Sobel kernels,
//!   computed in the slice's native intensity units.
//! - **Local standard deviation**: intensity spread in a square window,
//!   used to seed adaptive thresholds.
//!
//! Border pixels are handled by clamping to the nearest edge pixel, so a
//! flat image has zero gradient everywhere including its frame.

use rayon::prelude::*;

use crate::raster::{PixelBuffer, RunningStats, Sample};

// Sobel kernels
const KERNEL_H: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const KERNEL_V: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Per-pixel Sobel gradient magnitude of a slice.
#[derive(Clone, Debug)]
pub struct GradientMap {
    width: usize,
    data: Vec<f64>,
}

impl GradientMap {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }
}

/// Sobel gradient magnitude at a single pixel.
#[inline]
pub fn sobel_magnitude_at<T: Sample>(pixels: &PixelBuffer<'_, T>, x: usize, y: usize) -> f64 {
    let mut gx = 0.0;
    let mut gy = 0.0;

    for ky in 0..3 {
        for kx in 0..3 {
            let px = x as isize + kx as isize - 1;
            let py = y as isize + ky as isize - 1;
            let v = pixels.get_clamped(px, py);
            gx += v * KERNEL_H[ky][kx];
            gy += v * KERNEL_V[ky][kx];
        }
    }

    (gx * gx + gy * gy).sqrt()
}

/// Compute the Sobel gradient magnitude of every pixel.
///
/// Rows are processed in parallel with Rayon.
pub fn sobel_magnitude<T: Sample>(pixels: &PixelBuffer<'_, T>) -> GradientMap {
    let width = pixels.width();
    let height = pixels.height();

    let mut data = vec![0.0f64; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = sobel_magnitude_at(pixels, x, y);
            }
        });

    GradientMap { width, data }
}

/// Population standard deviation of the `(2r+1)²` window around `(x, y)`,
/// clipped to the image.
pub fn local_std_dev<T: Sample>(
    pixels: &PixelBuffer<'_, T>,
    x: usize,
    y: usize,
    radius: usize,
) -> f64 {
    let x_start = x.saturating_sub(radius);
    let y_start = y.saturating_sub(radius);
    let x_end = (x + radius + 1).min(pixels.width());
    let y_end = (y + radius + 1).min(pixels.height());

    let mut acc = RunningStats::default();
    for sy in y_start..y_end {
        for sx in x_start..x_end {
            acc.push(pixels.get(sx, sy));
        }
    }
    acc.std_dev()
}
