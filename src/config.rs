//! Capture configuration
//!
//! `CaptureConfig` is derived once per capture and is read-only while the
//! pipeline runs. Every field has a conservative default so a partially
//! specified JSON document is enough to override a single knob.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Padding applied inside a table cell, in css px
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellPadding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl CellPadding {
    pub const fn uniform(px: u32) -> Self {
        Self { top: px, right: px, bottom: px, left: px }
    }
}

impl Default for CellPadding {
    fn default() -> Self {
        Self::uniform(5)
    }
}

/// Where text faces come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    /// Scan the platform font directories
    pub load_system_fonts: bool,
    /// Extra directories scanned for font files
    pub font_dirs: Vec<PathBuf>,
    /// Family used for all report text; the sans-serif family when unset
    pub family: Option<String>,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            font_dirs: Vec::new(),
            family: None,
        }
    }
}

/// Configuration for one capture invocation
///
/// # Examples
///
/// ```
/// let cfg = schedule_capture::CaptureConfig::default();
/// assert_eq!(cfg.virtual_width, 850);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Width of the off-screen virtual viewport in css px
    pub virtual_width: u32,
    /// Quality multiplier used on desktop viewports
    pub requested_scale: f64,
    /// Upper bound for the base scale on constrained viewports
    pub constrained_scale_limit: f64,
    /// Hard limit for either side of a single canvas allocation, in device px
    pub max_canvas_dimension: u32,
    /// Tile height in css px on desktop viewports
    pub tile_height: u32,
    /// Tile height in css px on constrained viewports
    pub constrained_tile_height: u32,
    /// Safety cap for the stitched composite, in device px.
    ///
    /// Looser than `max_canvas_dimension`: tiling already keeps
    /// every single allocation under that limit, and a tall capture stitched
    /// at `max_canvas_dimension` would always be shrunk below its effective
    /// scale. This cap only stops pathological composites.
    pub stitch_cap: u32,
    /// Screen widths below this value are treated as constrained
    pub viewport_breakpoint: u32,
    /// Delay before the first pass so layout can settle
    pub settle_delay_ms: u64,
    /// Name of the downloaded file
    pub file_name: String,
    /// Padding inside header cells
    pub header_padding: CellPadding,
    /// Padding inside body cells
    pub cell_padding: CellPadding,
    /// Background handed to the rasterizer, RGBA
    pub background: [u8; 4],
    pub fonts: FontSettings,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            virtual_width: 850,
            requested_scale: 3.0,
            constrained_scale_limit: 2.0,
            max_canvas_dimension: 4096,
            tile_height: 2000,
            constrained_tile_height: 1000,
            stitch_cap: 16384,
            viewport_breakpoint: 768,
            settle_delay_ms: 100,
            file_name: "Spring25-Exam-Schedule.png".to_string(),
            header_padding: CellPadding::default(),
            cell_padding: CellPadding::default(),
            background: [0, 0, 0, 230],
            fonts: FontSettings::default(),
        }
    }
}

impl CaptureConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let cfg: CaptureConfig = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reject configurations under which the planner could not keep a
    /// single canvas below `max_canvas_dimension`.
    pub fn validate(&self) -> Result<()> {
        if self.virtual_width == 0 {
            return Err(Error::ConfigError("virtual_width must be positive".into()));
        }
        if self.max_canvas_dimension == 0 {
            return Err(Error::ConfigError("max_canvas_dimension must be positive".into()));
        }
        if self.virtual_width > self.max_canvas_dimension {
            return Err(Error::ConfigError(format!(
                "virtual_width {} exceeds max_canvas_dimension {}",
                self.virtual_width, self.max_canvas_dimension
            )));
        }
        if self.tile_height == 0 || self.constrained_tile_height == 0 {
            return Err(Error::ConfigError("tile heights must be positive".into()));
        }
        if !(self.requested_scale.is_finite() && self.requested_scale > 0.0) {
            return Err(Error::ConfigError(format!(
                "requested_scale must be a positive number, got {}",
                self.requested_scale
            )));
        }
        if !(self.constrained_scale_limit.is_finite() && self.constrained_scale_limit > 0.0) {
            return Err(Error::ConfigError("constrained_scale_limit must be positive".into()));
        }
        if self.stitch_cap < self.virtual_width {
            return Err(Error::ConfigError(format!(
                "stitch_cap {} is narrower than virtual_width {}",
                self.stitch_cap, self.virtual_width
            )));
        }
        if self.file_name.trim().is_empty() {
            return Err(Error::ConfigError("file_name must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CaptureConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_canvas_dimension, 4096);
        assert_eq!(cfg.settle_delay(), Duration::from_millis(100));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: CaptureConfig =
            serde_json::from_str(r#"{"requested_scale": 2, "cell_padding": {"top": 8}}"#).unwrap();
        assert_eq!(cfg.requested_scale, 2.0);
        assert_eq!(cfg.cell_padding.top, 8);
        assert_eq!(cfg.cell_padding.left, 5);
        assert_eq!(cfg.virtual_width, 850);
    }

    #[test]
    fn font_settings_default_to_system_fonts() {
        let cfg: CaptureConfig =
            serde_json::from_str(r#"{"fonts": {"family": "DejaVu Sans"}}"#).unwrap();
        assert!(cfg.fonts.load_system_fonts);
        assert!(cfg.fonts.font_dirs.is_empty());
        assert_eq!(cfg.fonts.family.as_deref(), Some("DejaVu Sans"));
    }

    #[test]
    fn rejects_width_beyond_raster_cap() {
        let cfg = CaptureConfig { virtual_width: 5000, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let cfg = CaptureConfig { requested_scale: 0.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
