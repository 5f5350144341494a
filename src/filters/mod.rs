//! Low-level raster filters used by the selection tools.
//!
//! - **Edge**: Sobel gradient magnitude and local standard deviation over a
//!   [`PixelBuffer`](crate::raster::PixelBuffer)
//! - **Morphology**: 3×3 binary erode, dilate and open over a
//!   [`Mask`](crate::raster::Mask)

pub mod edge;
pub mod morphology;

pub use edge::{local_std_dev, sobel_magnitude, GradientMap};
pub use morphology::{dilate_mask, erode_mask, open_mask};
