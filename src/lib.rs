//! Schedule Capture
//!
//! Renders an exam schedule (a title plus rows of date, time, course,
//! section and classroom) into a single PNG that looks the same on every
//! device. The report is laid out in a fixed-width virtual viewport, the
//! raster scale is planned against a hard canvas-size cap, oversized
//! content is captured in vertical tiles and stitched back together, and
//! the result is handed to a download sink.
//!
//! # Pipeline
//!
//! - **Layout** ([`rendering::layout`]): off-screen container with title and table
//! - **Planning** ([`capture::planner`]): effective scale and tiling decision
//! - **Capture** ([`capture::engine`]): one or many rasterizer passes
//! - **Stitch** ([`capture::stitch`]): composite, encode, download
//!
//! # Example
//!
//! ```no_run
//! use schedule_capture::platform::{DeviceMetrics, MemoryHost};
//! use schedule_capture::rendering::SoftwareRasterizer;
//! use schedule_capture::{CaptureConfig, CapturePipeline, ReportDocument, ReportRow};
//!
//! # async fn run() -> schedule_capture::Result<()> {
//! let host = MemoryHost::new(DeviceMetrics::desktop());
//! let rasterizer = SoftwareRasterizer::new();
//! let pipeline = CapturePipeline::new(CaptureConfig::default(), &host)?
//!     .with_rasterizer(&rasterizer);
//!
//! let doc = ReportDocument::new(
//!     "SUMMER-2025 FINAL SCHEDULE",
//!     vec![ReportRow::new("12 Aug", "9:00 AM - 11:00 AM", "CSE110", "3", "UB20601")],
//! );
//! let output = pipeline.capture(&doc).await?;
//! println!("{}x{} png", output.image.width, output.image.height);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{CaptureConfig, CellPadding, FontSettings};

pub mod report;
pub use report::{ReportDocument, ReportRow};

// Host environment seams (document, notifications, downloads, device)
pub mod platform;

// Layout, display list and rasterization
pub mod rendering;

// Planner, capture engine, stitcher and the pipeline that drives them
pub mod capture;
pub use capture::{CaptureOutput, CapturePipeline, CapturePlan, CaptureState, FinalImage};
