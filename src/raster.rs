//! Raster primitives shared by the selection tools.
//!
//! ## Pixel Formats
//! A [`PixelBuffer`] is a read-only, row-major view over one 2D slice of
//! intensities. Any numeric sample type implementing [`Sample`] is accepted:
//! - **8-bit**: `u8` / `i8`
//! - **16-bit**: `u16` / `i16` (typical CT and MR slices)
//! - **32-bit**: `u32` / `i32` / `f32`
//! - **64-bit float**: `f64`
//!
//! All arithmetic happens in `f64`, so tolerances are expressed in the
//! native intensity units of the slice (e.g. Hounsfield units for CT).

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// A numeric pixel sample.
pub trait Sample: Copy + Send + Sync {
    fn to_f64(self) -> f64;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_sample!(u8, i8, u16, i16, u32, i32, f32, f64);

/// Read-only view over a single slice's intensity buffer.
#[derive(Clone, Copy, Debug)]
pub struct PixelBuffer<'a, T: Sample> {
    view: ArrayView2<'a, T>,
}

impl<'a, T: Sample> PixelBuffer<'a, T> {
    /// Wrap a flat row-major buffer of `width * height` samples.
    pub fn new(data: &'a [T], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyRaster);
        }
        if width.checked_mul(height) != Some(data.len()) {
            return Err(Error::DimensionMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        let view = ArrayView2::from_shape((height, width), data)?;
        Ok(Self { view })
    }

    /// Wrap an existing `(height, width)` array view.
    pub fn from_view(view: ArrayView2<'a, T>) -> Result<Self> {
        let (height, width) = view.dim();
        if width == 0 || height == 0 {
            return Err(Error::EmptyRaster);
        }
        Ok(Self { view })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.view.dim().1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.view.dim().0
    }

    /// Intensity at `(x, y)`. Caller guarantees the coordinate is in bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.view[[y, x]].to_f64()
    }

    /// Intensity with coordinates clamped to the nearest edge pixel.
    #[inline]
    pub fn get_clamped(&self, x: isize, y: isize) -> f64 {
        let cx = x.clamp(0, self.width() as isize - 1) as usize;
        let cy = y.clamp(0, self.height() as isize - 1) as usize;
        self.get(cx, cy)
    }

    /// Convert a signed seed coordinate to an in-bounds pixel, if it is one.
    pub fn checked_coord(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.width() && y < self.height()).then_some((x, y))
    }
}

/// Axis-aligned bounding box of a mask, inclusive. All zero for an empty mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

/// Binary selection mask (1 = included, 0 = excluded).
///
/// Serializes as a flat row-major array of `width * height` values; the
/// owning result carries the dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    data: Array2<u8>,
}

impl Serialize for Mask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.iter())
    }
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: Array2::zeros((height, width)),
        }
    }

    /// Build a mask from a flat row-major buffer; any non-zero value counts as set.
    pub fn from_raw(data: &[u8], width: usize, height: usize) -> Result<Self> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(Error::DimensionMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        let binary: Vec<u8> = data.iter().map(|&v| u8::from(v != 0)).collect();
        Ok(Self {
            data: Array2::from_shape_vec((height, width), binary)?,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.data[[y, x]] != 0
    }

    /// Like [`Mask::is_set`], treating out-of-bounds as unset.
    #[inline]
    pub fn is_set_signed(&self, x: isize, y: isize) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) < self.width()
            && (y as usize) < self.height()
            && self.is_set(x as usize, y as usize)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize) {
        self.data[[y, x]] = 1;
    }

    #[inline]
    pub fn unset(&mut self, x: usize, y: usize) {
        self.data[[y, x]] = 0;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    pub fn bounds(&self) -> Bounds {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut any = false;

        for ((y, x), &v) in self.data.indexed_iter() {
            if v != 0 {
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        if any {
            Bounds {
                min_x,
                min_y,
                max_x,
                max_y,
            }
        } else {
            Bounds::default()
        }
    }

    /// Set every pixel that is set in `other`. Masks must share dimensions.
    pub fn union_with(&mut self, other: &Mask) {
        self.data.zip_mut_with(&other.data, |a, &b| {
            if b != 0 {
                *a = 1;
            }
        });
    }

    /// Iterate over `(x, y)` of every set pixel in row-major order.
    pub fn set_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.data
            .indexed_iter()
            .filter(|&(_, &v)| v != 0)
            .map(|((y, x), _)| (x, y))
    }

    pub fn as_array(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// Flat row-major copy of the mask.
    pub fn into_raw_vec(self) -> Vec<u8> {
        self.data.into_raw_vec_and_offset().0
    }

    pub fn into_array(self) -> Array2<u8> {
        self.data
    }
}

/// Statistics of a selected pixel population. `area == 0` means nothing was selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    pub mean_intensity: f64,
    pub std_intensity: f64,
    pub min_intensity: f64,
    pub max_intensity: f64,
    pub area: usize,
}

impl RegionStats {
    /// Compute statistics of the pixels selected by `mask`.
    pub fn from_mask<T: Sample>(pixels: &PixelBuffer<'_, T>, mask: &Mask) -> Self {
        let mut acc = RunningStats::default();
        for (x, y) in mask.set_pixels() {
            acc.push(pixels.get(x, y));
        }
        acc.finish()
    }
}

/// Incremental mean / variance / extrema accumulator.
#[derive(Clone, Copy, Debug)]
pub struct RunningStats {
    sum: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }
}

impl RunningStats {
    #[inline]
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.sum_sq += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.count += 1;
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Population standard deviation.
    #[inline]
    pub fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        // Rounding can push the variance slightly negative on flat regions.
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0).sqrt()
    }

    pub fn finish(&self) -> RegionStats {
        if self.count == 0 {
            return RegionStats::default();
        }
        RegionStats {
            mean_intensity: self.mean(),
            std_intensity: self.std_dev(),
            min_intensity: self.min,
            max_intensity: self.max,
            area: self.count,
        }
    }
}
