//! Slicewand Smart Annotation Tools
//!
//! Semi-automatic contouring for slice-based medical images, implemented in
//! Rust with Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Tools
//! - **Magic wand**: tolerance flood fill from a clicked pixel
//! - **Region growing**: gradient-aware growth from one or more seeds
//! - **Contour extraction**: boundary outline of a mask in world coordinates
//! - **Slice interpolation**: fills slices between drawn key frames
//!
//! [`session::ToolSession`] holds the active tool and its settings and
//! dispatches user actions to the algorithms above.
//!
//! ## Image Format
//! Every tool works on one 2D slice at a time, stored row-major as
//! `(height, width)`. Any numeric sample type implementing [`raster::Sample`]
//! is accepted, so 8-bit, 16-bit and float slices share the same code.

pub mod config;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod interpolation;
pub mod raster;
pub mod selection;
pub mod session;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{
    InterpolationConfig, InterpolationMethod, MagicWandConfig, RegionGrowingConfig, ToolSettings,
};
pub use error::{Error, Result};
pub use geometry::{Contour, CoordinateMapper, IdentityMapper, ImagePlaneMapper, WorldPoint};
pub use interpolation::{interpolate_slices, InterpolationResult, SliceAnnotation, SliceRange};
pub use raster::{Bounds, Mask, PixelBuffer, RegionStats, Sample};
pub use selection::{
    extract_contour, extract_contour_with, magic_wand_select, multi_seed_region_grow,
    region_grow, ContourOrdering, MagicWandResult, RegionGrowingResult,
};
pub use session::{AnnotationSink, SmartTool, SmartToolResult, ToolSession};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use std::collections::HashMap;
    use std::str::FromStr;

    use numpy::{IntoPyArray, PyReadonlyArray2};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;
    use pyo3::types::PyDict;

    use crate::config::{
        InterpolationConfig, InterpolationMethod, MagicWandConfig, RegionGrowingConfig,
    };
    use crate::error::Error;
    use crate::geometry::{Contour, IdentityMapper, WorldPoint};
    use crate::interpolation::{self, SliceAnnotation};
    use crate::raster::{Mask, PixelBuffer, Sample};
    use crate::selection::{self, MagicWandResult, RegionGrowingResult};

    type PyPoint = (f64, f64, f64);

    impl From<Error> for PyErr {
        fn from(err: Error) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    fn contour_to_py(contour: &Contour) -> Vec<PyPoint> {
        contour.points().iter().map(|p| (p.x, p.y, p.z)).collect()
    }

    fn contour_from_py(points: Vec<PyPoint>) -> Contour {
        points
            .into_iter()
            .map(|(x, y, z)| WorldPoint::new(x, y, z))
            .collect::<Vec<_>>()
            .into()
    }

    fn wand_to_dict(py: Python<'_>, result: MagicWandResult) -> PyResult<Bound<'_, PyDict>> {
        let dict = PyDict::new(py);
        let b = result.bounds;
        dict.set_item("bounds", (b.min_x, b.min_y, b.max_x, b.max_y))?;
        dict.set_item("pixel_count", result.pixel_count)?;
        dict.set_item("contour_points", result.contour_points.as_ref().map(contour_to_py))?;
        dict.set_item("mask", result.mask.into_array().into_pyarray(py))?;
        Ok(dict)
    }

    fn grow_to_dict(py: Python<'_>, result: RegionGrowingResult) -> PyResult<Bound<'_, PyDict>> {
        let dict = PyDict::new(py);
        let s = result.stats;
        dict.set_item("mean_intensity", s.mean_intensity)?;
        dict.set_item("std_intensity", s.std_intensity)?;
        dict.set_item("min_intensity", s.min_intensity)?;
        dict.set_item("max_intensity", s.max_intensity)?;
        dict.set_item("area", s.area)?;
        dict.set_item("iterations", result.iterations)?;
        dict.set_item("contour_points", result.contour_points.as_ref().map(contour_to_py))?;
        dict.set_item("mask", result.mask.into_array().into_pyarray(py))?;
        Ok(dict)
    }

    fn wand<'py, T: Sample>(
        py: Python<'py>,
        pixels: PixelBuffer<'_, T>,
        seed: (i64, i64),
        config: MagicWandConfig,
    ) -> PyResult<Bound<'py, PyDict>> {
        config.validate()?;
        let mapper = IdentityMapper::default();
        let result = selection::magic_wand_select(&pixels, seed.0, seed.1, &config, Some(&mapper));
        wand_to_dict(py, result)
    }

    fn grow<'py, T: Sample>(
        py: Python<'py>,
        pixels: PixelBuffer<'_, T>,
        seeds: &[(i64, i64)],
        config: RegionGrowingConfig,
    ) -> PyResult<Bound<'py, PyDict>> {
        config.validate()?;
        let mapper = IdentityMapper::default();
        let result = match seeds {
            [(x, y)] => selection::region_grow(&pixels, *x, *y, &config, Some(&mapper)),
            _ => selection::multi_seed_region_grow(&pixels, seeds, &config, Some(&mapper)),
        };
        grow_to_dict(py, result)
    }

    // ========================================================================
    // Magic Wand
    // ========================================================================

    /// Flood-fill selection of a float slice from `(seed_x, seed_y)`.
    ///
    /// Returns a dict with `mask`, `bounds`, `pixel_count` and
    /// `contour_points` (pixel coordinates, z = 0).
    #[pyfunction]
    #[pyo3(signature = (image, seed_x, seed_y, tolerance=10.0, eight_connected=false, max_pixels=1_000_000, smooth_edges=false))]
    #[allow(clippy::too_many_arguments)]
    pub fn magic_wand_select<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f32>,
        seed_x: i64,
        seed_y: i64,
        tolerance: f64,
        eight_connected: bool,
        max_pixels: usize,
        smooth_edges: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let config = MagicWandConfig {
            tolerance,
            eight_connected,
            max_pixels,
            smooth_edges,
            ..MagicWandConfig::default()
        };
        wand(py, PixelBuffer::from_view(image.as_array())?, (seed_x, seed_y), config)
    }

    /// Magic wand on a 16-bit slice (raw CT / MR storage).
    #[pyfunction]
    #[pyo3(signature = (image, seed_x, seed_y, tolerance=10.0, eight_connected=false, max_pixels=1_000_000, smooth_edges=false))]
    #[allow(clippy::too_many_arguments)]
    pub fn magic_wand_select_u16<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, u16>,
        seed_x: i64,
        seed_y: i64,
        tolerance: f64,
        eight_connected: bool,
        max_pixels: usize,
        smooth_edges: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let config = MagicWandConfig {
            tolerance,
            eight_connected,
            max_pixels,
            smooth_edges,
            ..MagicWandConfig::default()
        };
        wand(py, PixelBuffer::from_view(image.as_array())?, (seed_x, seed_y), config)
    }

    // ========================================================================
    // Region Growing
    // ========================================================================

    /// Gradient-aware region growing of a float slice from one seed.
    ///
    /// Returns a dict with `mask`, region statistics, `iterations` and
    /// `contour_points`.
    #[pyfunction]
    #[pyo3(signature = (image, seed_x, seed_y, intensity_tolerance=20.0, gradient_threshold=50.0, max_iterations=100_000, min_region_size=10, use_adaptive_threshold=true))]
    #[allow(clippy::too_many_arguments)]
    pub fn region_grow<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f32>,
        seed_x: i64,
        seed_y: i64,
        intensity_tolerance: f64,
        gradient_threshold: f64,
        max_iterations: usize,
        min_region_size: usize,
        use_adaptive_threshold: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let config = RegionGrowingConfig {
            intensity_tolerance,
            gradient_threshold,
            max_iterations,
            min_region_size,
            use_adaptive_threshold,
            ..RegionGrowingConfig::default()
        };
        grow(py, PixelBuffer::from_view(image.as_array())?, &[(seed_x, seed_y)], config)
    }

    /// Region growing from several seeds; the result is the union of each seed's region.
    #[pyfunction]
    #[pyo3(signature = (image, seeds, intensity_tolerance=20.0, gradient_threshold=50.0, max_iterations=100_000, min_region_size=10, use_adaptive_threshold=true))]
    #[allow(clippy::too_many_arguments)]
    pub fn multi_seed_region_grow<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f32>,
        seeds: Vec<(i64, i64)>,
        intensity_tolerance: f64,
        gradient_threshold: f64,
        max_iterations: usize,
        min_region_size: usize,
        use_adaptive_threshold: bool,
    ) -> PyResult<Bound<'py, PyDict>> {
        let config = RegionGrowingConfig {
            intensity_tolerance,
            gradient_threshold,
            max_iterations,
            min_region_size,
            use_adaptive_threshold,
            ..RegionGrowingConfig::default()
        };
        grow(py, PixelBuffer::from_view(image.as_array())?, &seeds, config)
    }

    // ========================================================================
    // Contour Extraction
    // ========================================================================

    /// Outline of a binary mask as `(x, y, 0.0)` pixel coordinates.
    #[pyfunction]
    pub fn extract_contour(mask: PyReadonlyArray2<'_, u8>) -> PyResult<Vec<PyPoint>> {
        let view = mask.as_array();
        let (height, width) = view.dim();
        let flat: Vec<u8> = view.iter().copied().collect();
        let mask = Mask::from_raw(&flat, width, height)?;
        Ok(contour_to_py(&selection::extract_contour(
            &mask,
            &IdentityMapper::default(),
        )))
    }

    // ========================================================================
    // Slice Interpolation
    // ========================================================================

    /// Fill the slices between key frames.
    ///
    /// `key_frames` is a list of `(slice_index, points)`. Returns a list of
    /// `(slice_index, points, is_key_frame)` sorted by slice index.
    #[pyfunction]
    #[pyo3(signature = (key_frames, method="linear", max_gap_slices=10, smoothing_factor=0.5, slice_to_z=None))]
    pub fn interpolate_slices(
        key_frames: Vec<(i64, Vec<PyPoint>)>,
        method: &str,
        max_gap_slices: usize,
        smoothing_factor: f64,
        slice_to_z: Option<HashMap<i64, f64>>,
    ) -> PyResult<Vec<(i64, Vec<PyPoint>, bool)>> {
        let config = InterpolationConfig {
            method: InterpolationMethod::from_str(method)?,
            max_gap_slices,
            smoothing_factor,
            ..InterpolationConfig::default()
        };
        config.validate()?;

        let annotations: Vec<SliceAnnotation> = key_frames
            .into_iter()
            .map(|(index, points)| SliceAnnotation::key_frame(index, contour_from_py(points)))
            .collect();
        let result = interpolation::interpolate_slices(
            &annotations,
            &config,
            &slice_to_z.unwrap_or_default(),
        );

        Ok(result
            .slice_annotations
            .iter()
            .map(|a| (a.slice_index, contour_to_py(&a.contour_points), a.is_key_frame))
            .collect())
    }

    /// Slicewand Rust extension module
    #[pymodule]
    pub fn slicewand(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Selection tools
        m.add_function(wrap_pyfunction!(magic_wand_select, m)?)?;
        m.add_function(wrap_pyfunction!(magic_wand_select_u16, m)?)?;
        m.add_function(wrap_pyfunction!(region_grow, m)?)?;
        m.add_function(wrap_pyfunction!(multi_seed_region_grow, m)?)?;
        m.add_function(wrap_pyfunction!(extract_contour, m)?)?;

        // Interpolation
        m.add_function(wrap_pyfunction!(interpolate_slices, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::slicewand;
