//! Tool orchestration for one viewport.
//!
//! A [`ToolSession`] holds the active smart tool and every tool's
//! configuration, and is passed explicitly by the viewer into each
//! invocation. The algorithms themselves stay pure: the session only picks
//! which one to run and forwards results to an [`AnnotationSink`].
//!
//! The session does not serialize concurrent clicks. Callers keep at most
//! one selection in flight per viewport.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{InterpolationConfig, MagicWandConfig, RegionGrowingConfig, ToolSettings};
use crate::error::{Error, Result};
use crate::geometry::{Contour, CoordinateMapper};
use crate::interpolation::{interpolate_slices, InterpolationResult, SliceAnnotation};
use crate::raster::{PixelBuffer, Sample};
use crate::selection::{magic_wand_select, multi_seed_region_grow, region_grow, MagicWandResult, RegionGrowingResult};

/// The smart tools a viewport can activate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmartTool {
    MagicWand,
    RegionGrowing,
    Interpolation,
}

/// Output of any smart tool, tagged by the tool that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SmartToolResult {
    MagicWand(MagicWandResult),
    RegionGrowing(RegionGrowingResult),
    Interpolation(InterpolationResult),
}

impl SmartToolResult {
    pub fn tool(&self) -> SmartTool {
        match self {
            SmartToolResult::MagicWand(_) => SmartTool::MagicWand,
            SmartToolResult::RegionGrowing(_) => SmartTool::RegionGrowing,
            SmartToolResult::Interpolation(_) => SmartTool::Interpolation,
        }
    }

    /// True when the tool produced nothing usable.
    pub fn is_empty(&self) -> bool {
        match self {
            SmartToolResult::MagicWand(r) => r.pixel_count == 0,
            SmartToolResult::RegionGrowing(r) => r.stats.area == 0,
            SmartToolResult::Interpolation(r) => r.interpolated_count == 0,
        }
    }

    /// Outline of a selection result, if one was extracted.
    pub fn contour(&self) -> Option<&Contour> {
        match self {
            SmartToolResult::MagicWand(r) => r.contour_points.as_ref(),
            SmartToolResult::RegionGrowing(r) => r.contour_points.as_ref(),
            SmartToolResult::Interpolation(_) => None,
        }
    }
}

/// Destination for finished annotations, owned by the annotation store.
pub trait AnnotationSink {
    fn store(&mut self, annotation: SliceAnnotation);
}

impl AnnotationSink for Vec<SliceAnnotation> {
    fn store(&mut self, annotation: SliceAnnotation) {
        self.push(annotation);
    }
}

/// Active tool plus per-tool configuration for one viewport.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolSession {
    active_tool: Option<SmartTool>,
    settings: ToolSettings,
}

impl ToolSession {
    pub fn new(settings: ToolSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            active_tool: None,
            settings,
        })
    }

    pub fn active_tool(&self) -> Option<SmartTool> {
        self.active_tool
    }

    pub fn select_tool(&mut self, tool: SmartTool) {
        debug!("smart tool {:?} -> {:?}", self.active_tool, tool);
        self.active_tool = Some(tool);
    }

    pub fn clear_tool(&mut self) {
        self.active_tool = None;
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn set_magic_wand_config(&mut self, config: MagicWandConfig) -> Result<()> {
        config.validate()?;
        self.settings.magic_wand = config;
        Ok(())
    }

    pub fn set_region_growing_config(&mut self, config: RegionGrowingConfig) -> Result<()> {
        config.validate()?;
        self.settings.region_growing = config;
        Ok(())
    }

    pub fn set_interpolation_config(&mut self, config: InterpolationConfig) -> Result<()> {
        config.validate()?;
        self.settings.interpolation = config;
        Ok(())
    }

    /// Run the active selection tool from a clicked pixel.
    pub fn apply_at<T: Sample>(
        &self,
        pixels: &PixelBuffer<'_, T>,
        seed_x: i64,
        seed_y: i64,
        mapper: Option<&dyn CoordinateMapper>,
    ) -> Result<SmartToolResult> {
        match self.active_tool.ok_or(Error::NoActiveTool)? {
            SmartTool::MagicWand => Ok(SmartToolResult::MagicWand(magic_wand_select(
                pixels,
                seed_x,
                seed_y,
                &self.settings.magic_wand,
                mapper,
            ))),
            SmartTool::RegionGrowing => Ok(SmartToolResult::RegionGrowing(region_grow(
                pixels,
                seed_x,
                seed_y,
                &self.settings.region_growing,
                mapper,
            ))),
            active @ SmartTool::Interpolation => Err(Error::ToolMismatch {
                active,
                operation: "pixel selection",
            }),
        }
    }

    /// Run multi-seed region growing; requires the region growing tool.
    pub fn apply_seeds<T: Sample>(
        &self,
        pixels: &PixelBuffer<'_, T>,
        seeds: &[(i64, i64)],
        mapper: Option<&dyn CoordinateMapper>,
    ) -> Result<SmartToolResult> {
        match self.active_tool.ok_or(Error::NoActiveTool)? {
            SmartTool::RegionGrowing => Ok(SmartToolResult::RegionGrowing(multi_seed_region_grow(
                pixels,
                seeds,
                &self.settings.region_growing,
                mapper,
            ))),
            active => Err(Error::ToolMismatch {
                active,
                operation: "multi-seed growth",
            }),
        }
    }

    /// Interpolate between key frames.
    ///
    /// Available whatever tool is active. With `auto_apply` set, generated
    /// slices are handed to `sink` immediately.
    pub fn interpolate(
        &self,
        key_frames: &[SliceAnnotation],
        slice_to_z: &HashMap<i64, f64>,
        sink: Option<&mut dyn AnnotationSink>,
    ) -> SmartToolResult {
        let result = interpolate_slices(key_frames, &self.settings.interpolation, slice_to_z);

        if self.settings.interpolation.auto_apply {
            if let Some(sink) = sink {
                for annotation in result.interpolated() {
                    sink.store(annotation.clone());
                }
            }
        }

        SmartToolResult::Interpolation(result)
    }

    /// Hand a result to the annotation store; returns how many annotations were stored.
    ///
    /// Selection outlines are stored as key frames on `slice_index`;
    /// interpolation results store only their generated slices. Empty
    /// contours are never stored.
    pub fn commit(result: &SmartToolResult, slice_index: i64, sink: &mut dyn AnnotationSink) -> usize {
        match result {
            SmartToolResult::Interpolation(r) => {
                let mut stored = 0;
                for annotation in r.interpolated().filter(|a| !a.contour_points.is_empty()) {
                    sink.store(annotation.clone());
                    stored += 1;
                }
                stored
            }
            selection => match selection.contour() {
                Some(contour) if !contour.is_empty() => {
                    sink.store(SliceAnnotation::key_frame(slice_index, contour.clone()));
                    1
                }
                _ => 0,
            },
        }
    }
}
