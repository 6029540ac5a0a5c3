/// Rasterizer collaborator and the built-in tiny-skia implementation

use futures::future::{BoxFuture, FutureExt};
use tiny_skia::{Color, Paint, Pixmap, Rect as SkRect, Transform};

use crate::rendering::device_span;
use crate::rendering::layout::ReportLayout;
use crate::rendering::paint::{display_list, PaintCommand};
use crate::rendering::text::Typesetter;
use crate::{Error, Result};

/// Region of the target to rasterize, in css px
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Hook run on the rasterizer's private clone before painting
pub type CloneHook<'a> = &'a (dyn Fn(&mut ReportLayout) + Send + Sync);

/// Everything a rasterizer needs for one pass
#[derive(Clone, Copy)]
pub struct RasterRequest<'a> {
    pub target: &'a ReportLayout,
    pub background: [u8; 4],
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub crop: Option<CropWindow>,
    pub on_clone: Option<CloneHook<'a>>,
}

impl RasterRequest<'_> {
    pub fn window(&self) -> CropWindow {
        self.crop.unwrap_or(CropWindow { x: 0, y: 0, width: self.width, height: self.height })
    }

    /// Canvas size in device px for this request
    pub fn canvas_size(&self) -> (u32, u32) {
        let w = self.window();
        (device_span(w.x, w.width, self.scale), device_span(w.y, w.height, self.scale))
    }
}

/// A DOM-to-bitmap capability.
///
/// Implementations must not assume they can run concurrently with
/// themselves; the capture engine awaits each pass before starting the next.
pub trait Rasterizer: Send + Sync {
    fn rasterize<'a>(&'a self, request: RasterRequest<'a>) -> BoxFuture<'a, Result<Pixmap>>;
}

/// Paints the report display list with tiny-skia
pub struct SoftwareRasterizer {
    max_dimension: u32,
}

impl SoftwareRasterizer {
    pub fn new() -> Self {
        SoftwareRasterizer { max_dimension: 16384 }
    }

    /// Refuse canvases with a side longer than `max_dimension`
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        SoftwareRasterizer { max_dimension }
    }

    pub fn render(&self, request: &RasterRequest<'_>) -> Result<Pixmap> {
        let mut target = request.target.clone();
        if let Some(hook) = request.on_clone {
            hook(&mut target);
        }

        let window = request.window();
        let (pw, ph) = request.canvas_size();
        if pw == 0 || ph == 0 || pw > self.max_dimension || ph > self.max_dimension {
            return Err(Error::RasterizerError(format!(
                "cannot allocate a {}x{} canvas",
                pw, ph
            )));
        }
        let mut pixmap = Pixmap::new(pw, ph).ok_or_else(|| {
            Error::RasterizerError(format!("canvas allocation of {}x{} failed", pw, ph))
        })?;
        let [r, g, b, a] = request.background;
        pixmap.fill(Color::from_rgba8(r, g, b, a));

        let scale = request.scale as f32;
        let ox = (window.x as f64 * request.scale).round() as f32;
        let oy = (window.y as f64 * request.scale).round() as f32;
        let transform = Transform::from_translate(-ox, -oy).pre_scale(scale, scale);

        let top = window.y as i32;
        let bottom = (window.y + window.height) as i32;
        let mut typesetter = Typesetter::new(&target.fonts);
        let mut painted = 0usize;
        for cmd in display_list(&target) {
            let (t, b) = cmd.vertical_span();
            if b <= top || t >= bottom {
                continue;
            }
            painted += 1;
            match cmd {
                PaintCommand::SolidRect { x, y, width, height, rgba } => {
                    fill(&mut pixmap, x as f32, y as f32, width as f32, height as f32, rgba, transform);
                }
                PaintCommand::Text { x, y, text, style, rgba } => {
                    typesetter.fill_line(&mut pixmap, &text, style, x, y as f32, rgba, transform);
                }
            }
        }
        log::trace!(
            "rasterized window y={} h={} at {:.3}x: {} commands into {}x{}",
            window.y,
            window.height,
            request.scale,
            painted,
            pw,
            ph
        );
        Ok(pixmap)
    }
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn rasterize<'a>(&'a self, request: RasterRequest<'a>) -> BoxFuture<'a, Result<Pixmap>> {
        async move { self.render(&request) }.boxed()
    }
}

fn fill(
    pixmap: &mut Pixmap,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    rgba: (u8, u8, u8, u8),
    transform: Transform,
) {
    let Some(rect) = SkRect::from_xywh(x, y, w, h) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.0, rgba.1, rgba.2, rgba.3);
    paint.anti_alias = false;
    pixmap.fill_rect(rect, &paint, transform, None);
}
