//! Inter-slice annotation filling.
//!
//! - **Resample**: arc-length resampling and contour shape measures
//! - **Slices**: key-frame interpolation across a stack

pub mod resample;
pub mod slices;

pub use resample::resample_contour;
pub use slices::{interpolate_slices, InterpolationResult, SliceAnnotation, SliceRange};
