//! Rendering: off-screen layout, display list, and rasterization

pub mod layout;
pub mod paint;
pub mod raster;
pub mod text;

pub use layout::{LayoutBuilder, ReportLayout};
pub use raster::{CropWindow, RasterRequest, Rasterizer, SoftwareRasterizer};
pub use text::{FontBook, TextStyle};

/// Device px covered by the css span `[start, start + len)` at `scale`.
///
/// Both edges are rounded independently, so adjacent spans tile the
/// device axis without gaps or overlaps and their lengths always sum to
/// the rounded length of the whole.
pub fn device_span(start: u32, len: u32, scale: f64) -> u32 {
    let begin = (start as f64 * scale).round();
    let end = ((start as u64 + len as u64) as f64 * scale).round();
    (end - begin).max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_sum_to_rounded_total() {
        let scale = 1.37;
        let total = 1001u32;
        let mut sum = 0;
        let mut y = 0;
        while y < total {
            let h = 97.min(total - y);
            sum += device_span(y, h, scale);
            y += h;
        }
        assert_eq!(sum, device_span(0, total, scale));
        assert_eq!(device_span(0, 850, 2.0), 1700);
    }
}
