//! Per-tool configuration.
//!
//! Configs are plain values: immutable for the duration of one tool run and
//! freely replaced between runs. They (de)serialize as camelCase JSON and
//! missing fields fall back to [`Default`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::selection::contour::ContourOrdering;

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be a finite non-negative number, got {value}"
        )))
    }
}

/// Magic wand flood-fill options.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MagicWandConfig {
    /// Maximum absolute intensity difference from the seed pixel.
    pub tolerance: f64,
    /// Include diagonal neighbours.
    pub eight_connected: bool,
    /// Hard cap on selected pixels.
    pub max_pixels: usize,
    /// Open the mask (erode then dilate) before extracting the contour.
    pub smooth_edges: bool,
    pub contour_ordering: ContourOrdering,
}

impl Default for MagicWandConfig {
    fn default() -> Self {
        Self {
            tolerance: 10.0,
            eight_connected: false,
            max_pixels: 1_000_000,
            smooth_edges: false,
            contour_ordering: ContourOrdering::Angular,
        }
    }
}

impl MagicWandConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("tolerance", self.tolerance)
    }
}

/// Adaptive region growing options.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionGrowingConfig {
    /// Minimum allowed deviation from the running region mean.
    pub intensity_tolerance: f64,
    /// Candidates with a Sobel magnitude above this are treated as edges.
    pub gradient_threshold: f64,
    /// Maximum number of candidates taken off the queue.
    pub max_iterations: usize,
    /// Regions smaller than this are discarded.
    pub min_region_size: usize,
    /// Widen the threshold from local and region statistics.
    pub use_adaptive_threshold: bool,
    pub contour_ordering: ContourOrdering,
}

impl Default for RegionGrowingConfig {
    fn default() -> Self {
        Self {
            intensity_tolerance: 20.0,
            gradient_threshold: 50.0,
            max_iterations: 100_000,
            min_region_size: 10,
            use_adaptive_threshold: true,
            contour_ordering: ContourOrdering::Angular,
        }
    }
}

impl RegionGrowingConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("intensityTolerance", self.intensity_tolerance)?;
        check_non_negative("gradientThreshold", self.gradient_threshold)
    }
}

/// How intermediate contours are blended from two key frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterpolationMethod {
    /// Point-wise blend of the resampled contours.
    #[default]
    Linear,
    /// Blend centroid and centred shape separately.
    ShapeBased,
    /// Shape-based plus radius blending and smoothing.
    Morphological,
}

impl InterpolationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpolationMethod::Linear => "linear",
            InterpolationMethod::ShapeBased => "shape-based",
            InterpolationMethod::Morphological => "morphological",
        }
    }
}

impl FromStr for InterpolationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(InterpolationMethod::Linear),
            "shape-based" | "shape_based" | "shape" => Ok(InterpolationMethod::ShapeBased),
            "morphological" | "morph" => Ok(InterpolationMethod::Morphological),
            other => Err(Error::InvalidConfig(format!(
                "unknown interpolation method '{other}'"
            ))),
        }
    }
}

/// Slice interpolation options.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpolationConfig {
    pub method: InterpolationMethod,
    /// Intervals with more empty slices than this are left unfilled.
    pub max_gap_slices: usize,
    /// Hand generated slices to the annotation sink right away.
    pub auto_apply: bool,
    /// Strength of morphological smoothing, in `[0, 1]`.
    pub smoothing_factor: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::Linear,
            max_gap_slices: 10,
            auto_apply: false,
            smoothing_factor: 0.5,
        }
    }
}

impl InterpolationConfig {
    pub fn validate(&self) -> Result<()> {
        if (0.0..=1.0).contains(&self.smoothing_factor) {
            Ok(())
        } else {
            Err(Error::InvalidConfig(format!(
                "smoothingFactor must be within [0, 1], got {}",
                self.smoothing_factor
            )))
        }
    }
}

/// Configuration of every smart tool, as persisted between sessions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolSettings {
    pub magic_wand: MagicWandConfig,
    pub region_growing: RegionGrowingConfig,
    pub interpolation: InterpolationConfig,
}

impl ToolSettings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: ToolSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.magic_wand.validate()?;
        self.region_growing.validate()?;
        self.interpolation.validate()
    }
}
