//! Capture pipeline
//!
//! One invocation walks `Idle → Validating → Building → Planning →
//! Capturing → Stitching → Encoding → Downloading → Idle`. Any failure moves
//! to `Failed`; temporary nodes are detached on every path because they are
//! held by [`AttachedNode`] guards.
//!
//! The pipeline owns its temporary nodes exclusively while it runs. Callers
//! must not start a second capture on the same host before the first one
//! returns.

pub mod engine;
pub mod planner;
pub mod stitch;

use std::sync::Mutex;

use crate::config::CaptureConfig;
use crate::platform::document::{AttachedNode, NodeKind};
use crate::platform::download::DownloadLink;
use crate::platform::notify::{NoticeLevel, MSG_SAVED, MSG_STARTED};
use crate::platform::Host;
use crate::rendering::layout::OFFSCREEN_LEFT;
use crate::rendering::{LayoutBuilder, Rasterizer};
use crate::report::ReportDocument;
use crate::{Error, Result};

pub use engine::{CaptureEngine, RasterSegment};
pub use planner::{CapacityPlanner, CapturePlan, DeviceProfile, SegmentWindow};
pub use stitch::{encode_png, FinalImage, Stitched, Stitcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Validating,
    Building,
    Planning,
    Capturing { passes: u32 },
    Stitching,
    Encoding,
    Downloading,
    Failed,
}

/// Result of a successful capture
#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub image: FinalImage,
    pub plan: CapturePlan,
    pub passes: usize,
    pub file_name: String,
}

pub struct CapturePipeline<'a> {
    config: CaptureConfig,
    host: &'a dyn Host,
    rasterizer: Option<&'a dyn Rasterizer>,
    transitions: Mutex<Vec<CaptureState>>,
}

impl<'a> CapturePipeline<'a> {
    pub fn new(config: CaptureConfig, host: &'a dyn Host) -> Result<Self> {
        config.validate()?;
        Ok(CapturePipeline {
            config,
            host,
            rasterizer: None,
            transitions: Mutex::new(vec![CaptureState::Idle]),
        })
    }

    pub fn with_rasterizer(mut self, rasterizer: &'a dyn Rasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// States visited by the most recent invocation
    pub fn transitions(&self) -> Vec<CaptureState> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn state(&self) -> CaptureState {
        self.transitions
            .lock()
            .unwrap()
            .last()
            .copied()
            .unwrap_or(CaptureState::Idle)
    }

    fn enter(&self, state: CaptureState) {
        log::debug!("capture state -> {:?}", state);
        self.transitions.lock().unwrap().push(state);
    }

    /// Capture `document` and hand the PNG to the host's download sink.
    ///
    /// Exactly one user-facing notice is emitted on failure; nothing is
    /// downloaded unless every stage succeeded.
    pub async fn capture(&self, document: &ReportDocument) -> Result<CaptureOutput> {
        *self.transitions.lock().unwrap() = vec![CaptureState::Idle];
        match self.run(document).await {
            Ok(output) => {
                self.enter(CaptureState::Idle);
                log::info!(
                    "captured {} rows into {}x{} png ({} passes, sha256 {})",
                    document.rows.len(),
                    output.image.width,
                    output.image.height,
                    output.passes,
                    output.image.fingerprint()
                );
                self.host.notifier().notify(NoticeLevel::Success, MSG_SAVED);
                Ok(output)
            }
            Err(err) => {
                self.enter(CaptureState::Failed);
                log::error!("screenshot error: {}", err);
                self.host.notifier().notify(NoticeLevel::Error, err.user_message());
                Err(err)
            }
        }
    }

    async fn run(&self, document: &ReportDocument) -> Result<CaptureOutput> {
        self.enter(CaptureState::Validating);
        if document.is_empty() {
            return Err(Error::EmptyReport);
        }
        self.host.notifier().notify(NoticeLevel::Info, MSG_STARTED);

        self.enter(CaptureState::Building);
        let layout = LayoutBuilder::new(&self.config).build(document)?;
        let _container = AttachedNode::attach(
            self.host.document(),
            NodeKind::ReportContainer { width: layout.width, left: OFFSCREEN_LEFT },
        );
        let rasterizer = self.rasterizer.ok_or(Error::MissingRasterizer)?;

        self.enter(CaptureState::Planning);
        let device = DeviceProfile::from_metrics(
            &self.host.device_metrics(),
            self.config.viewport_breakpoint,
        );
        let (width, height) = layout.measured_size();
        let plan = CapacityPlanner::new(&self.config).plan(device, width, height)?;

        tokio::time::sleep(self.config.settle_delay()).await;

        self.enter(CaptureState::Capturing { passes: plan.segment_count });
        let segments = CaptureEngine::new(rasterizer, &self.config)
            .capture(&layout, &plan)
            .await?;
        let passes = segments.len();

        self.enter(CaptureState::Stitching);
        let stitched = Stitcher::new(self.config.stitch_cap).stitch(segments)?;

        self.enter(CaptureState::Encoding);
        let image = FinalImage::encode(&stitched.canvas, plan.effective_scale, stitched.stitch_scale)?;
        drop(stitched);

        self.enter(CaptureState::Downloading);
        let link = DownloadLink::new(self.config.file_name.clone(), image.png_data.clone());
        {
            let _anchor = AttachedNode::attach(
                self.host.document(),
                NodeKind::Anchor { download: link.download.clone() },
            );
            self.host.downloads().click(&link)?;
        }

        Ok(CaptureOutput {
            image,
            plan,
            passes,
            file_name: link.download,
        })
    }
}
