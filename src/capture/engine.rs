//! Capture engine: drives the rasterizer over the planned segments

use tiny_skia::Pixmap;

use crate::capture::planner::{CapturePlan, SegmentWindow};
use crate::config::CaptureConfig;
use crate::rendering::raster::{CropWindow, RasterRequest, Rasterizer};
use crate::rendering::ReportLayout;
use crate::{Error, Result};

/// Extra window height handed to the rasterizer beyond the content
const WINDOW_HEIGHT_SLACK: u32 = 50;

/// One rasterized vertical slice of the report
pub struct RasterSegment {
    pub window: SegmentWindow,
    pub canvas: Pixmap,
}

impl std::fmt::Debug for RasterSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSegment")
            .field("window", &self.window)
            .field("width", &self.canvas.width())
            .field("height", &self.canvas.height())
            .finish()
    }
}

fn normalize_clone(layout: &mut ReportLayout) {
    layout.normalize_for_capture();
}

pub struct CaptureEngine<'a> {
    rasterizer: &'a dyn Rasterizer,
    config: &'a CaptureConfig,
}

impl<'a> CaptureEngine<'a> {
    pub fn new(rasterizer: &'a dyn Rasterizer, config: &'a CaptureConfig) -> Self {
        CaptureEngine { rasterizer, config }
    }

    /// Run every pass the plan calls for, in index order.
    pub async fn capture(&self, layout: &ReportLayout, plan: &CapturePlan) -> Result<Vec<RasterSegment>> {
        if plan.needs_tiling {
            self.capture_tiled(layout, plan).await
        } else {
            Ok(vec![self.capture_once(layout, plan).await?])
        }
    }

    /// Rasterize the whole content in a single pass.
    pub async fn capture_once(&self, layout: &ReportLayout, plan: &CapturePlan) -> Result<RasterSegment> {
        let pinned = layout.pinned(plan.content_width, plan.content_height);
        let window = SegmentWindow { index: 0, y: 0, height: plan.content_height };
        self.pass(&pinned, plan, window, None).await
    }

    /// Rasterize each planned window on its own, strictly one after another.
    pub async fn capture_tiled(&self, layout: &ReportLayout, plan: &CapturePlan) -> Result<Vec<RasterSegment>> {
        let pinned = layout.pinned(plan.content_width, plan.content_height);
        let windows = plan.segments();
        let mut segments = Vec::with_capacity(windows.len());
        for window in windows {
            let crop = CropWindow {
                x: 0,
                y: window.y,
                width: plan.content_width,
                height: window.height,
            };
            let segment = self.pass(&pinned, plan, window, Some(crop)).await?;
            log::debug!(
                "captured segment {}/{} ({}px at y={})",
                window.index + 1,
                plan.segment_count,
                window.height,
                window.y
            );
            segments.push(segment);
            tokio::task::yield_now().await;
        }
        Ok(segments)
    }

    async fn pass(
        &self,
        pinned: &ReportLayout,
        plan: &CapturePlan,
        window: SegmentWindow,
        crop: Option<CropWindow>,
    ) -> Result<RasterSegment> {
        let limit = self.config.max_canvas_dimension;
        let expected_w = plan.raster_width();
        let expected_h = plan.segment_raster_height(&window);
        if expected_w > limit || expected_h > limit {
            return Err(Error::AllocationOverflow { width: expected_w, height: expected_h, limit });
        }

        let request = RasterRequest {
            target: pinned,
            background: self.config.background,
            scale: plan.effective_scale,
            width: plan.content_width,
            height: plan.content_height,
            window_width: plan.content_width,
            window_height: plan.content_height + WINDOW_HEIGHT_SLACK,
            crop,
            on_clone: Some(&normalize_clone),
        };
        let canvas = self.rasterizer.rasterize(request).await?;

        let (w, h) = (canvas.width(), canvas.height());
        if w > limit || h > limit {
            return Err(Error::AllocationOverflow { width: w, height: h, limit });
        }
        if (w, h) != (expected_w, expected_h) {
            return Err(Error::RasterizerError(format!(
                "segment {} came back {}x{}, expected {}x{}",
                window.index, w, h, expected_w, expected_h
            )));
        }
        Ok(RasterSegment { window, canvas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::planner::{CapacityPlanner, DeviceProfile};
    use crate::platform::ViewportClass;
    use crate::rendering::{LayoutBuilder, SoftwareRasterizer};
    use crate::report::{ReportDocument, ReportRow};
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn layout(cfg: &CaptureConfig, rows: usize) -> ReportLayout {
        let rows = (0..rows)
            .map(|i| ReportRow::new("2 Feb", "1:00 PM", format!("ENG{}", i), "2", "R1"))
            .collect();
        LayoutBuilder::new(cfg).build(&ReportDocument::new("T", rows)).unwrap()
    }

    struct CountingRasterizer {
        inner: SoftwareRasterizer,
        in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Rasterizer for CountingRasterizer {
        fn rasterize<'a>(&'a self, request: RasterRequest<'a>) -> BoxFuture<'a, Result<Pixmap>> {
            async move {
                assert_eq!(self.in_flight.fetch_add(1, Ordering::SeqCst), 0, "reentrant rasterize");
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                let out = self.inner.render(&request);
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                out
            }
            .boxed()
        }
    }

    struct WrongSizeRasterizer;

    impl Rasterizer for WrongSizeRasterizer {
        fn rasterize<'a>(&'a self, _request: RasterRequest<'a>) -> BoxFuture<'a, Result<Pixmap>> {
            async move { Pixmap::new(5000, 10).ok_or(Error::RasterizerError("alloc".into())) }.boxed()
        }
    }

    #[tokio::test]
    async fn tiled_capture_is_sequential_and_ordered() {
        let cfg = CaptureConfig::default();
        let l = layout(&cfg, 40);
        let (w, h) = l.measured_size();
        let plan = CapacityPlanner::new(&cfg)
            .plan(DeviceProfile::new(ViewportClass::Constrained, 2.0), w, h)
            .unwrap();
        let r = CountingRasterizer {
            inner: SoftwareRasterizer::new(),
            in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        };
        let segs = CaptureEngine::new(&r, &cfg).capture(&l, &plan).await.unwrap();
        assert_eq!(segs.len(), plan.segment_count as usize);
        assert_eq!(r.calls.load(Ordering::SeqCst), segs.len());
        for (i, s) in segs.iter().enumerate() {
            assert_eq!(s.window.index, i);
        }
        let total: u32 = segs.iter().map(|s| s.canvas.height()).sum();
        assert_eq!(total, plan.raster_height());
    }

    #[tokio::test]
    async fn oversized_canvas_fails_closed() {
        let cfg = CaptureConfig::default();
        let l = layout(&cfg, 1);
        let (w, h) = l.measured_size();
        let plan = CapacityPlanner::new(&cfg)
            .plan(DeviceProfile::new(ViewportClass::Desktop, 1.0), w, h)
            .unwrap();
        let err = CaptureEngine::new(&WrongSizeRasterizer, &cfg)
            .capture_once(&l, &plan)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AllocationOverflow { width: 5000, .. }));
    }

    #[tokio::test]
    async fn plan_violating_the_cap_is_refused_before_rasterizing() {
        let cfg = CaptureConfig::default();
        let l = layout(&cfg, 1);
        let (w, h) = l.measured_size();
        let plan = CapturePlan {
            effective_scale: 10.0,
            needs_tiling: false,
            segment_count: 1,
            segment_height_px: h,
            content_width: w,
            content_height: h,
            viewport: ViewportClass::Desktop,
        };
        let r = CountingRasterizer {
            inner: SoftwareRasterizer::new(),
            in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        };
        let err = CaptureEngine::new(&r, &cfg).capture(&l, &plan).await.unwrap_err();
        assert!(matches!(err, Error::AllocationOverflow { .. }));
        assert_eq!(r.calls.load(Ordering::SeqCst), 0);
    }
}
