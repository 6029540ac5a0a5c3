//! Stitching tiled segments into one canvas, and PNG encoding

use sha2::{Digest, Sha256};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::capture::engine::RasterSegment;
use crate::platform::download::png_data_url;
use crate::{Error, Result};

/// Output of the stitcher: the composite and the uniform scale applied to it
pub struct Stitched {
    pub canvas: Pixmap,
    pub stitch_scale: f64,
}

pub struct Stitcher {
    final_cap: u32,
}

impl Stitcher {
    pub fn new(final_cap: u32) -> Self {
        Stitcher { final_cap }
    }

    /// Composite `segments` top to bottom.
    ///
    /// A single segment is returned untouched. Otherwise the composite is
    /// scaled down uniformly when its longest side would exceed the cap.
    pub fn stitch(&self, mut segments: Vec<RasterSegment>) -> Result<Stitched> {
        if segments.is_empty() {
            return Err(Error::RasterizerError("no segments were captured".into()));
        }
        if segments.len() == 1 {
            let only = segments.remove(0);
            return Ok(Stitched { canvas: only.canvas, stitch_scale: 1.0 });
        }
        if segments.windows(2).any(|w| w[0].window.index >= w[1].window.index) {
            return Err(Error::RasterizerError("segments arrived out of order".into()));
        }

        let width = segments.iter().map(|s| s.canvas.width()).max().unwrap_or(0);
        let height: u64 = segments.iter().map(|s| s.canvas.height() as u64).sum();
        let longest = (width as u64).max(height);
        let stitch_scale = if longest > self.final_cap as u64 {
            self.final_cap as f64 / longest as f64
        } else {
            1.0
        };

        let out_w = ((width as f64 * stitch_scale).round() as u32).clamp(1, self.final_cap);
        // Destination heights come from rounding the scaled cumulative edges, so the
        // cursor advances by what was actually drawn and rounding never accumulates.
        let mut source_edge = 0u64;
        let mut drawn = Vec::with_capacity(segments.len());
        for seg in &segments {
            let begin = (source_edge as f64 * stitch_scale).round() as u32;
            source_edge += seg.canvas.height() as u64;
            let end = (source_edge as f64 * stitch_scale).round() as u32;
            drawn.push(end - begin);
        }
        let out_h: u32 = drawn.iter().sum();
        if out_w > self.final_cap || out_h > self.final_cap || out_h == 0 {
            return Err(Error::AllocationOverflow { width: out_w, height: out_h, limit: self.final_cap });
        }

        let mut canvas = Pixmap::new(out_w, out_h).ok_or(Error::AllocationOverflow {
            width: out_w,
            height: out_h,
            limit: self.final_cap,
        })?;
        let paint = PixmapPaint {
            quality: if stitch_scale < 1.0 { FilterQuality::Bilinear } else { FilterQuality::Nearest },
            ..PixmapPaint::default()
        };

        let mut cursor = 0u32;
        for (seg, dh) in segments.iter().zip(drawn) {
            if dh == 0 {
                continue;
            }
            let sx = out_w as f32 / seg.canvas.width() as f32;
            let sy = dh as f32 / seg.canvas.height() as f32;
            let transform = Transform::from_translate(0.0, cursor as f32).pre_scale(sx, sy);
            canvas.draw_pixmap(0, 0, seg.canvas.as_ref(), &paint, transform, None);
            cursor += dh;
        }
        log::debug!(
            "stitched {} segments into {}x{} (stitch scale {:.4})",
            segments.len(),
            out_w,
            out_h,
            stitch_scale
        );
        Ok(Stitched { canvas, stitch_scale })
    }
}

/// The encoded capture, returned to the caller instead of kept in global state
#[derive(Debug, Clone, PartialEq)]
pub struct FinalImage {
    pub width: u32,
    pub height: u32,
    pub effective_scale: f64,
    pub stitch_scale: f64,
    pub png_data: Vec<u8>,
}

impl FinalImage {
    pub fn encode(canvas: &Pixmap, effective_scale: f64, stitch_scale: f64) -> Result<Self> {
        let ppi = 96.0 * effective_scale * stitch_scale;
        Ok(FinalImage {
            width: canvas.width(),
            height: canvas.height(),
            effective_scale,
            stitch_scale,
            png_data: encode_png(canvas, ppi)?,
        })
    }

    pub fn data_url(&self) -> String {
        png_data_url(&self.png_data)
    }

    /// Hex SHA-256 of the PNG bytes
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }
}

/// Encode a premultiplied canvas as straight-alpha RGBA8 PNG.
pub fn encode_png(canvas: &Pixmap, ppi: f64) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(canvas.data().len());
    for p in canvas.pixels() {
        let c = p.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, canvas.width(), canvas.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = (ppi.max(0.0) / 0.0254).round() as u32;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&data)?;
    }
    Ok(buf)
}
