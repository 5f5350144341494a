//! WebAssembly exports for the slicewand tools.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Data Layout
//!
//! Slices cross the boundary as flat row-major `Float32Array`s of length
//! `width * height`. Masks come back as `Uint8Array`s of the same length
//! (1 = selected). Contours are flat `[x0, y0, x1, y1, ...]` pixel
//! coordinates. Interpolation takes and returns JSON, since key frames are
//! nested structures.

use std::collections::HashMap;

use wasm_bindgen::prelude::*;

use crate::config::{InterpolationConfig, MagicWandConfig, RegionGrowingConfig};
use crate::error::Error;
use crate::geometry::{Contour, IdentityMapper};
use crate::interpolation::{interpolate_slices, SliceAnnotation};
use crate::raster::{Mask, PixelBuffer};
use crate::selection::{extract_contour, magic_wand_select, region_grow};

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn flatten_xy(contour: &Contour) -> Vec<f64> {
    contour.points().iter().flat_map(|p| [p.x, p.y]).collect()
}

// ============================================================================
// Magic Wand
// ============================================================================

/// Flood-fill selection from `(seed_x, seed_y)`.
///
/// # Arguments
/// * `data` - Flat array of intensities (length = width * height)
/// * `width` - Slice width in pixels
/// * `height` - Slice height in pixels
/// * `tolerance` - Maximum absolute difference from the seed intensity
///
/// # Returns
/// Flat selection mask; all zero when the seed is outside the slice
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn magic_wand_select_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    seed_x: i32,
    seed_y: i32,
    tolerance: f64,
    eight_connected: bool,
    smooth_edges: bool,
) -> Result<Vec<u8>, JsValue> {
    let pixels = PixelBuffer::new(data, width, height).map_err(to_js)?;
    let config = MagicWandConfig {
        tolerance,
        eight_connected,
        smooth_edges,
        ..MagicWandConfig::default()
    };
    config.validate().map_err(to_js)?;

    let result = magic_wand_select(&pixels, seed_x.into(), seed_y.into(), &config, None);
    Ok(result.mask.into_raw_vec())
}

// ============================================================================
// Region Growing
// ============================================================================

/// Gradient-aware region growing from `(seed_x, seed_y)`.
///
/// # Returns
/// Flat region mask; all zero when the region is smaller than `min_region_size`
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn region_grow_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    seed_x: i32,
    seed_y: i32,
    intensity_tolerance: f64,
    gradient_threshold: f64,
    min_region_size: usize,
    use_adaptive_threshold: bool,
) -> Result<Vec<u8>, JsValue> {
    let pixels = PixelBuffer::new(data, width, height).map_err(to_js)?;
    let config = RegionGrowingConfig {
        intensity_tolerance,
        gradient_threshold,
        min_region_size,
        use_adaptive_threshold,
        ..RegionGrowingConfig::default()
    };
    config.validate().map_err(to_js)?;

    let result = region_grow(&pixels, seed_x.into(), seed_y.into(), &config, None);
    Ok(result.mask.into_raw_vec())
}

// ============================================================================
// Contour Extraction
// ============================================================================

/// Outline of a mask as flat `[x0, y0, x1, y1, ...]` pixel coordinates.
#[wasm_bindgen]
pub fn extract_contour_wasm(mask: &[u8], width: usize, height: usize) -> Result<Vec<f64>, JsValue> {
    let mask = Mask::from_raw(mask, width, height).map_err(to_js)?;
    Ok(flatten_xy(&extract_contour(&mask, &IdentityMapper::default())))
}

// ============================================================================
// Slice Interpolation
// ============================================================================

/// Interpolate between key frames.
///
/// # Arguments
/// * `annotations_json` - Array of `{sliceIndex, contourPoints, isKeyFrame}`
/// * `config_json` - Interpolation settings; missing fields take defaults
/// * `slice_to_z_json` - Object mapping slice index to world Z (may be `{}`)
///
/// # Returns
/// JSON `{sliceAnnotations, interpolatedCount, sliceRange}`
#[wasm_bindgen]
pub fn interpolate_slices_wasm(
    annotations_json: &str,
    config_json: &str,
    slice_to_z_json: &str,
) -> Result<String, JsValue> {
    let parse = |err: serde_json::Error| to_js(err.into());

    let annotations: Vec<SliceAnnotation> = serde_json::from_str(annotations_json).map_err(parse)?;
    let config: InterpolationConfig = serde_json::from_str(config_json).map_err(parse)?;
    config.validate().map_err(to_js)?;
    let slice_to_z: HashMap<i64, f64> = serde_json::from_str(slice_to_z_json).map_err(parse)?;

    let result = interpolate_slices(&annotations, &config, &slice_to_z);
    serde_json::to_string(&result).map_err(parse)
}
