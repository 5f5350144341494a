//! Selection algorithms for slice annotation.
//!
//! This module provides the pixel-level selection tools:
//! - **Contour extraction**: ordered, bounded world-space outline of a mask
//! - **Magic wand**: flood fill within a fixed tolerance of the seed value
//! - **Region growing**: closest-first growth against the running region
//!   mean, with adaptive thresholds and Sobel edge stopping
//!
//! Every tool allocates its own mask and never mutates the pixel buffer, so
//! runs on different slices are independent.

pub mod contour;
pub mod magic_wand;
pub mod region_growing;

pub use contour::{extract_contour, extract_contour_with, ContourOrdering};
pub use magic_wand::{magic_wand_select, MagicWandResult};
pub use region_growing::{multi_seed_region_grow, region_grow, RegionGrowingResult};
