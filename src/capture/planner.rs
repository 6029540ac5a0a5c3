//! Capacity planning: effective raster scale and tiling decision
//!
//! This is the only place raster-size policy lives. Everything downstream
//! trusts the returned [`CapturePlan`] without re-deriving it.

use serde::Serialize;

use crate::config::CaptureConfig;
use crate::platform::{DeviceMetrics, ViewportClass};
use crate::rendering::device_span;
use crate::{Error, Result};

/// Device facts the planner needs, captured once per invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceProfile {
    pub viewport: ViewportClass,
    pub dpr: f64,
}

impl DeviceProfile {
    pub fn new(viewport: ViewportClass, dpr: f64) -> Self {
        DeviceProfile { viewport, dpr }
    }

    pub fn from_metrics(metrics: &DeviceMetrics, breakpoint: u32) -> Self {
        DeviceProfile {
            viewport: ViewportClass::classify(metrics, breakpoint),
            dpr: metrics.pixel_ratio(),
        }
    }
}

/// Vertical slice `[y, y + height)` of the content, in css px
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentWindow {
    pub index: usize,
    pub y: u32,
    pub height: u32,
}

impl SegmentWindow {
    pub fn end(&self) -> u32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturePlan {
    pub effective_scale: f64,
    pub needs_tiling: bool,
    pub segment_count: u32,
    /// Nominal tile height in css px; the last tile may be shorter
    pub segment_height_px: u32,
    pub content_width: u32,
    pub content_height: u32,
    pub viewport: ViewportClass,
}

impl CapturePlan {
    /// Segment windows in capture order. Heights sum to `content_height`.
    pub fn segments(&self) -> Vec<SegmentWindow> {
        let step = self.segment_height_px.max(1);
        (0..self.segment_count as usize)
            .map(|index| {
                let y = (index as u32).saturating_mul(step).min(self.content_height);
                let end = y.saturating_add(step).min(self.content_height);
                SegmentWindow { index, y, height: end - y }
            })
            .collect()
    }

    pub fn raster_width(&self) -> u32 {
        device_span(0, self.content_width, self.effective_scale)
    }

    pub fn raster_height(&self) -> u32 {
        device_span(0, self.content_height, self.effective_scale)
    }

    pub fn segment_raster_height(&self, window: &SegmentWindow) -> u32 {
        device_span(window.y, window.height, self.effective_scale)
    }
}

pub struct CapacityPlanner<'c> {
    config: &'c CaptureConfig,
}

impl<'c> CapacityPlanner<'c> {
    pub fn new(config: &'c CaptureConfig) -> Self {
        CapacityPlanner { config }
    }

    /// Plan a capture of `width x height` css px on `device`.
    ///
    /// Pure: identical inputs always produce an identical plan.
    pub fn plan(&self, device: DeviceProfile, width: u32, height: u32) -> Result<CapturePlan> {
        let cfg = self.config;
        if width == 0 || height == 0 {
            return Err(Error::ConfigError(format!(
                "cannot plan a capture of {}x{} css px",
                width, height
            )));
        }
        let max_dim = cfg.max_canvas_dimension as f64;

        let base_scale = match device.viewport {
            ViewportClass::Constrained => {
                let dpr = if device.dpr.is_finite() && device.dpr > 0.0 { device.dpr } else { 1.0 };
                dpr.min(cfg.constrained_scale_limit)
            }
            ViewportClass::Desktop => cfg.requested_scale,
        };
        let estimated_max = width.max(height) as f64 * base_scale;
        let scale_cap = if estimated_max > max_dim { max_dim / estimated_max } else { 1.0 };
        // The cap is a ceiling on quality, never a reason to go below native resolution.
        let effective_scale = (base_scale * scale_cap).max(1.0);

        // Tiling only splits rows, so content too wide for a single row of
        // device pixels can never be captured.
        let raster_width = device_span(0, width, effective_scale);
        if raster_width > cfg.max_canvas_dimension {
            return Err(Error::AllocationOverflow {
                width: raster_width,
                height: device_span(0, height, effective_scale),
                limit: cfg.max_canvas_dimension,
            });
        }

        // Constrained devices tile even when one pass would fit: they enforce
        // stricter limits than they report.
        let needs_tiling = device.viewport.is_constrained()
            || estimated_max > max_dim
            || width.max(height) as f64 * effective_scale > max_dim;

        let (segment_height_px, segment_count) = if needs_tiling {
            let tile = match device.viewport {
                ViewportClass::Constrained => cfg.constrained_tile_height,
                ViewportClass::Desktop => cfg.tile_height,
            };
            let mut limit = (max_dim / effective_scale).floor() as u32;
            if limit as f64 * effective_scale > max_dim {
                limit -= 1;
            }
            let segment = tile.min(limit).max(1);
            (segment, height.div_ceil(segment))
        } else {
            (height, 1)
        };

        let plan = CapturePlan {
            effective_scale,
            needs_tiling,
            segment_count,
            segment_height_px,
            content_width: width,
            content_height: height,
            viewport: device.viewport,
        };
        log::debug!(
            "capture plan: {:?} base {:.3} -> effective {:.3}, tiling={} ({} x {}px)",
            device.viewport,
            base_scale,
            effective_scale,
            needs_tiling,
            segment_count,
            segment_height_px
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> DeviceProfile {
        DeviceProfile::new(ViewportClass::Desktop, 1.0)
    }

    fn phone(dpr: f64) -> DeviceProfile {
        DeviceProfile::new(ViewportClass::Constrained, dpr)
    }

    #[test]
    fn small_desktop_capture_is_single_pass() {
        let cfg = CaptureConfig { requested_scale: 2.0, ..Default::default() };
        let plan = CapacityPlanner::new(&cfg).plan(desktop(), 850, 400).unwrap();
        assert!(!plan.needs_tiling);
        assert_eq!(plan.effective_scale, 2.0);
        assert_eq!(plan.segment_count, 1);
        assert_eq!(plan.raster_width(), 1700);
        assert_eq!(plan.segments(), vec![SegmentWindow { index: 0, y: 0, height: 400 }]);
    }

    #[test]
    fn tall_desktop_capture_is_capped_and_tiled() {
        let cfg = CaptureConfig { requested_scale: 3.0, ..Default::default() };
        let plan = CapacityPlanner::new(&cfg).plan(desktop(), 850, 3000).unwrap();
        assert!(plan.needs_tiling);
        assert!(plan.effective_scale < 3.0);
        assert!(plan.raster_height() <= 4096);
        assert_eq!(plan.segment_height_px, 2000);
        assert_eq!(plan.segment_count, 2);
    }

    #[test]
    fn constrained_viewport_caps_scale_and_always_tiles() {
        let cfg = CaptureConfig::default();
        let plan = CapacityPlanner::new(&cfg).plan(phone(3.0), 850, 500).unwrap();
        assert_eq!(plan.effective_scale, 2.0);
        assert!(plan.needs_tiling);
        assert_eq!(plan.segment_height_px, 1000);
        assert_eq!(plan.segment_count, 1);
    }

    #[test]
    fn scale_never_drops_below_native() {
        let cfg = CaptureConfig::default();
        let plan = CapacityPlanner::new(&cfg).plan(phone(3.0), 850, 20000).unwrap();
        assert_eq!(plan.effective_scale, 1.0);
        assert_eq!(plan.segment_count, 20);

        let low_dpr = CapacityPlanner::new(&cfg).plan(phone(0.5), 850, 100).unwrap();
        assert_eq!(low_dpr.effective_scale, 1.0);
    }

    #[test]
    fn oversized_tile_config_is_clamped_to_the_cap() {
        let cfg = CaptureConfig { constrained_tile_height: 4000, ..Default::default() };
        let plan = CapacityPlanner::new(&cfg).plan(phone(2.0), 850, 1500).unwrap();
        assert_eq!(plan.effective_scale, 2.0);
        assert_eq!(plan.segment_height_px, 2048);
        for seg in plan.segments() {
            assert!(plan.segment_raster_height(&seg) <= 4096);
        }
    }

    #[test]
    fn segments_cover_content_exactly() {
        let cfg = CaptureConfig::default();
        let plan = CapacityPlanner::new(&cfg).plan(phone(2.0), 850, 2345).unwrap();
        let segs = plan.segments();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs.iter().map(|s| s.height).sum::<u32>(), 2345);
        assert_eq!(segs[2], SegmentWindow { index: 2, y: 2000, height: 345 });
    }

    #[test]
    fn content_wider_than_the_cap_is_an_overflow() {
        let cfg = CaptureConfig::default();
        let err = CapacityPlanner::new(&cfg).plan(desktop(), 5000, 300).unwrap_err();
        assert!(matches!(err, Error::AllocationOverflow { width: 5000, height: 300, limit: 4096 }));

        // Native width at the cap still plans
        let edge = CapacityPlanner::new(&cfg).plan(phone(1.0), 4096, 300).unwrap();
        assert_eq!(edge.raster_width(), 4096);
    }

    #[test]
    fn zero_sized_content_is_rejected() {
        let cfg = CaptureConfig::default();
        assert!(CapacityPlanner::new(&cfg).plan(desktop(), 0, 10).is_err());
    }
}
