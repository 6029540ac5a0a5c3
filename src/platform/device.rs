/// Device metrics and viewport classification

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    pub dpr: f64,
    pub touch: bool,
}

impl DeviceMetrics {
    pub fn desktop() -> Self {
        DeviceMetrics { width: 1280, height: 720, dpr: 1.0, touch: false }
    }

    pub fn phone() -> Self {
        DeviceMetrics { width: 390, height: 844, dpr: 3.0, touch: true }
    }

    /// Device pixel ratio, treating nonsensical values as 1
    pub fn pixel_ratio(&self) -> f64 {
        if self.dpr.is_finite() && self.dpr > 0.0 {
            self.dpr
        } else {
            1.0
        }
    }
}

impl Default for DeviceMetrics {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Raster policy bucket for the viewing device.
///
/// Computed once at the planning boundary; nothing downstream looks at the
/// raw screen width again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewportClass {
    Desktop,
    Constrained,
}

impl ViewportClass {
    pub fn classify(metrics: &DeviceMetrics, breakpoint: u32) -> Self {
        if metrics.width < breakpoint {
            ViewportClass::Constrained
        } else {
            ViewportClass::Desktop
        }
    }

    pub fn is_constrained(self) -> bool {
        self == ViewportClass::Constrained
    }
}
