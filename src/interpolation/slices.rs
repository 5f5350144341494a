//! Key-frame slice interpolation.
//!
//! Given user-drawn key-frame contours on some slices of a stack, fills the
//! slices in between with synthetic contours:
//! - **Linear**: blend matched points of the two resampled key frames
//! - **Shape-based**: blend centroids and centred shapes separately
//! - **Morphological**: shape-based, rescaled to the blended mean radius
//!   and smoothed
//!
//! Intervals wider than `max_gap_slices + 1` are left empty. Generated
//! slices are emitted as non-key-frame annotations; key frames pass through
//! unchanged.

use std::collections::HashMap;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{InterpolationConfig, InterpolationMethod};
use crate::geometry::{Contour, WorldPoint, MAX_CONTOUR_POINTS};
use crate::interpolation::resample::{center_on, centroid, mean_radius, resample_contour, smooth_closed};

/// Lower bound on the resampled point count used for blending.
pub const MIN_BLEND_POINTS: usize = 64;

/// Contour on one slice of the stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceAnnotation {
    pub slice_index: i64,
    pub contour_points: Contour,
    /// User-drawn and authoritative; derived annotations may be overwritten.
    pub is_key_frame: bool,
}

impl SliceAnnotation {
    pub fn key_frame(slice_index: i64, contour_points: Contour) -> Self {
        Self {
            slice_index,
            contour_points,
            is_key_frame: true,
        }
    }

    pub fn interpolated(slice_index: i64, contour_points: Contour) -> Self {
        Self {
            slice_index,
            contour_points,
            is_key_frame: false,
        }
    }
}

/// First and last key-frame slice indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRange {
    pub first: i64,
    pub last: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationResult {
    /// Key frames and generated slices, ordered by slice index.
    pub slice_annotations: Vec<SliceAnnotation>,
    pub interpolated_count: usize,
    /// `None` when no usable key frame was supplied.
    pub slice_range: Option<SliceRange>,
}

impl InterpolationResult {
    /// Only the generated (non-key-frame) annotations.
    pub fn interpolated(&self) -> impl Iterator<Item = &SliceAnnotation> {
        self.slice_annotations.iter().filter(|a| !a.is_key_frame)
    }
}

/// Fill the gaps between key frames.
///
/// # Arguments
/// * `annotations` - Candidate key frames; entries that are not key frames
///   or have fewer than three points are ignored
/// * `config` - Blending method, gap limit and smoothing strength
/// * `slice_to_z` - World Z of each slice; missing entries fall back to the
///   Z of the interval's lower key frame
pub fn interpolate_slices(
    annotations: &[SliceAnnotation],
    config: &InterpolationConfig,
    slice_to_z: &HashMap<i64, f64>,
) -> InterpolationResult {
    let mut frames: Vec<&SliceAnnotation> = annotations
        .iter()
        .filter(|a| a.is_key_frame && a.contour_points.len() > 2)
        .collect();
    frames.sort_by_key(|a| a.slice_index);

    let before = frames.len();
    frames.dedup_by_key(|a| a.slice_index);
    if frames.len() < before {
        warn!(
            "dropped {} key frames sharing a slice index with an earlier one",
            before - frames.len()
        );
    }

    let slice_range = match (frames.first(), frames.last()) {
        (Some(first), Some(last)) => Some(SliceRange {
            first: first.slice_index,
            last: last.slice_index,
        }),
        _ => None,
    };

    if frames.len() < 2 {
        debug!("{} usable key frames, nothing to interpolate", frames.len());
        return InterpolationResult {
            slice_annotations: frames.into_iter().cloned().collect(),
            interpolated_count: 0,
            slice_range,
        };
    }

    let mut slice_annotations = vec![frames[0].clone()];
    let mut interpolated_count = 0;

    for pair in frames.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        let gap = upper.slice_index.abs_diff(lower.slice_index);

        // Frames are deduplicated, so gap >= 1.
        if gap - 1 > config.max_gap_slices as u64 {
            trace!(
                "skipping slices {}..{}: gap {} exceeds limit {}",
                lower.slice_index,
                upper.slice_index,
                gap,
                config.max_gap_slices
            );
        } else if gap > 1 {
            let plan = BlendPlan::new(lower.contour_points.points(), upper.contour_points.points(), config);
            let fallback_z = lower.contour_points.points()[0].z;

            for slice in (lower.slice_index + 1)..upper.slice_index {
                let t = slice.abs_diff(lower.slice_index) as f64 / gap as f64;
                let z = slice_to_z.get(&slice).copied().unwrap_or(fallback_z);
                slice_annotations.push(SliceAnnotation::interpolated(slice, plan.blend(t, z)));
                interpolated_count += 1;
            }
        }

        slice_annotations.push(upper.clone());
    }

    debug!(
        "interpolated {} slices between {} key frames ({:?})",
        interpolated_count,
        frames.len(),
        config.method
    );

    InterpolationResult {
        slice_annotations,
        interpolated_count,
        slice_range,
    }
}

/// Per-interval blending inputs, computed once and reused for every slice.
enum BlendPlan {
    Linear {
        lower: Vec<WorldPoint>,
        upper: Vec<WorldPoint>,
    },
    Shape {
        lower: Vec<WorldPoint>,
        upper: Vec<WorldPoint>,
        lower_center: WorldPoint,
        upper_center: WorldPoint,
        /// Mean radii and smoothing half-window, morphological only.
        morphology: Option<(f64, f64, usize)>,
    },
}

impl BlendPlan {
    fn new(lower: &[WorldPoint], upper: &[WorldPoint], config: &InterpolationConfig) -> Self {
        let count = lower
            .len()
            .max(upper.len())
            .max(MIN_BLEND_POINTS)
            .min(MAX_CONTOUR_POINTS);

        match config.method {
            InterpolationMethod::Linear => BlendPlan::Linear {
                lower: resample_contour(lower, count),
                upper: resample_contour(upper, count),
            },
            InterpolationMethod::ShapeBased | InterpolationMethod::Morphological => {
                let lower_center = centroid(lower);
                let upper_center = centroid(upper);
                let morphology = (config.method == InterpolationMethod::Morphological).then(|| {
                    // Half-width of the triangular window.
                    let half_window = ((config.smoothing_factor.clamp(0.0, 1.0) * 5.0).floor() as usize).max(1);
                    (
                        mean_radius(lower, &lower_center),
                        mean_radius(upper, &upper_center),
                        half_window,
                    )
                });
                BlendPlan::Shape {
                    lower: resample_contour(&center_on(lower, &lower_center), count),
                    upper: resample_contour(&center_on(upper, &upper_center), count),
                    lower_center,
                    upper_center,
                    morphology,
                }
            }
        }
    }

    fn blend(&self, t: f64, z: f64) -> Contour {
        let points = match self {
            BlendPlan::Linear { lower, upper } => lower
                .iter()
                .zip(upper)
                .map(|(a, b)| WorldPoint { z, ..a.lerp(b, t) })
                .collect(),
            BlendPlan::Shape {
                lower,
                upper,
                lower_center,
                upper_center,
                morphology,
            } => {
                let center = lower_center.lerp(upper_center, t);
                let shape: Vec<WorldPoint> = lower.iter().zip(upper).map(|(a, b)| a.lerp(b, t)).collect();

                let (scale, half_window) = match morphology {
                    Some((lower_radius, upper_radius, half_window)) => {
                        let target = lower_radius + (upper_radius - lower_radius) * t;
                        let current = mean_radius(&shape, &centroid(&shape));
                        let scale = if current > f64::EPSILON { target / current } else { 1.0 };
                        (scale, Some(*half_window))
                    }
                    None => (1.0, None),
                };

                let placed: Vec<WorldPoint> = shape
                    .iter()
                    .map(|p| WorldPoint::new(center.x + p.x * scale, center.y + p.y * scale, z))
                    .collect();

                match half_window {
                    Some(w) => smooth_closed(&placed, w),
                    None => placed,
                }
            }
        };
        Contour::new(points)
    }
}
