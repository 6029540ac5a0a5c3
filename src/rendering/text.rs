//! Text shaping, wrapping and glyph painting with cosmic-text.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use cosmic_text::{
    Attrs, Buffer, CacheKeyFlags, Command, Family, FontSystem, Metrics, Shaping, SwashCache,
    Weight, Wrap,
};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::config::FontSettings;

/// Concrete families tried, in order, for the generic sans-serif family
const SANS_SERIF_PREFERENCE: [&str; 4] = ["Arial", "Helvetica", "Liberation Sans", "DejaVu Sans"];

static SYSTEM_FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

/// Font size, line box and weight of one kind of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size_px: f32,
    pub line_height: u32,
    pub bold: bool,
}

pub const TITLE_STYLE: TextStyle = TextStyle { size_px: 24.0, line_height: 32, bold: true };
pub const HEADER_STYLE: TextStyle = TextStyle { size_px: 16.0, line_height: 20, bold: true };
pub const BODY_STYLE: TextStyle = TextStyle { size_px: 16.0, line_height: 20, bold: false };

/// One wrapped line and its shaped advance width in css px
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedLine {
    pub text: String,
    pub width: f32,
}

/// Resolved font database shared by layout and rasterization.
///
/// Cloning is cheap; the database itself is behind an `Arc`.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
    family: Option<String>,
}

impl FontBook {
    /// Resolve `settings` into a database. The system-only database is scanned
    /// once per process and shared.
    pub fn from_settings(settings: &FontSettings) -> Self {
        let db = if settings.load_system_fonts && settings.font_dirs.is_empty() {
            SYSTEM_FONTS
                .get_or_init(|| Arc::new(load_database(true, &[])))
                .clone()
        } else {
            Arc::new(load_database(settings.load_system_fonts, &settings.font_dirs))
        };
        FontBook { db, family: settings.family.clone() }
    }

    /// A book with no faces: text is laid out but never painted
    pub fn empty() -> Self {
        FontBook { db: Arc::new(fontdb::Database::new()), family: None }
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.len() == 0
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::from_settings(&FontSettings::default())
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .field("family", &self.family)
            .finish()
    }
}

impl PartialEq for FontBook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.db, &other.db) && self.family == other.family
    }
}

fn load_database(system: bool, dirs: &[PathBuf]) -> fontdb::Database {
    let mut db = fontdb::Database::new();
    if system {
        db.load_system_fonts();
    }
    for dir in dirs {
        db.load_fonts_dir(dir);
    }

    let available: HashSet<String> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect();
    if let Some(family) = SANS_SERIF_PREFERENCE.iter().find(|f| available.contains(**f)) {
        db.set_sans_serif_family(*family);
    }
    if db.len() == 0 {
        log::warn!("no font faces found; report text will not be painted");
    } else {
        log::debug!("font database: {} faces", db.len());
    }
    db
}

/// Per-task shaping state: a font system over the book's database plus the
/// outline cache used for painting.
pub struct Typesetter {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
    has_fonts: bool,
}

impl Typesetter {
    pub fn new(book: &FontBook) -> Self {
        Typesetter {
            font_system: FontSystem::new_with_locale_and_db("en".to_string(), (*book.db).clone()),
            swash_cache: SwashCache::new(),
            family: book.family.clone(),
            has_fonts: !book.is_empty(),
        }
    }

    fn shape(&mut self, text: &str, style: TextStyle, width: Option<f32>) -> Buffer {
        let metrics = Metrics::new(style.size_px, style.line_height as f32);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        let wrap = if width.is_some() { Wrap::WordOrGlyph } else { Wrap::None };
        buffer.set_wrap(&mut self.font_system, wrap);
        buffer.set_size(&mut self.font_system, width, None);

        let family = self.family.as_deref().map(Family::Name).unwrap_or(Family::SansSerif);
        let weight = if style.bold { Weight::BOLD } else { Weight::NORMAL };
        let attrs = Attrs::new()
            .family(family)
            .weight(weight)
            .cache_key_flags(CacheKeyFlags::DISABLE_HINTING);
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Advance width of `text` on a single line
    pub fn measure(&mut self, text: &str, style: TextStyle) -> f32 {
        if !self.has_fonts || text.is_empty() {
            return 0.0;
        }
        let buffer = self.shape(text, style, None);
        buffer.layout_runs().fold(0.0f32, |w, run| w.max(run.line_w))
    }

    /// Word-wrap `text` into lines no wider than `max_width`; words that do
    /// not fit on a line of their own are broken between glyphs.
    pub fn wrap(&mut self, text: &str, style: TextStyle, max_width: f32) -> Vec<ShapedLine> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if !self.has_fonts {
            return vec![ShapedLine { text: text.to_string(), width: 0.0 }];
        }

        let buffer = self.shape(text, style, Some(max_width.max(1.0)));
        let mut lines = Vec::new();
        for run in buffer.layout_runs() {
            let start = run.glyphs.iter().map(|g| g.start).min();
            let end = run.glyphs.iter().map(|g| g.end).max();
            let (Some(start), Some(end)) = (start, end) else {
                continue;
            };
            let piece = run.text[start..end].trim();
            if !piece.is_empty() {
                lines.push(ShapedLine { text: piece.to_string(), width: run.line_w });
            }
        }
        if lines.is_empty() {
            lines.push(ShapedLine { text: text.to_string(), width: 0.0 });
        }
        lines
    }

    /// Fill one line of text whose line box starts at `(x, top)` css px.
    ///
    /// Glyphs are drawn as vector outlines through `transform`, so the result
    /// is sharp at any raster scale. Returns the number of glyphs painted.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_line(
        &mut self,
        pixmap: &mut Pixmap,
        text: &str,
        style: TextStyle,
        x: f32,
        top: f32,
        rgba: (u8, u8, u8, u8),
        transform: Transform,
    ) -> usize {
        if !self.has_fonts || text.is_empty() {
            return 0;
        }
        let buffer = self.shape(text, style, None);

        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba.0, rgba.1, rgba.2, rgba.3);
        paint.anti_alias = true;

        let mut painted = 0;
        for run in buffer.layout_runs() {
            let baseline = top + run.line_y;
            for glyph in run.glyphs.iter() {
                let physical = glyph.physical((0.0, 0.0), 1.0);
                let Some(commands) = self
                    .swash_cache
                    .get_outline_commands(&mut self.font_system, physical.cache_key)
                else {
                    continue;
                };

                // Font outlines are y-up
                let mut pb = PathBuilder::new();
                for cmd in commands {
                    match cmd {
                        Command::MoveTo(p) => pb.move_to(p.x, -p.y),
                        Command::LineTo(p) => pb.line_to(p.x, -p.y),
                        Command::QuadTo(c, p) => pb.quad_to(c.x, -c.y, p.x, -p.y),
                        Command::CurveTo(c1, c2, p) => pb.cubic_to(c1.x, -c1.y, c2.x, -c2.y, p.x, -p.y),
                        Command::Close => pb.close(),
                    }
                }
                let Some(path) = pb.finish() else {
                    continue;
                };

                let gx = x + glyph.x + glyph.font_size * glyph.x_offset;
                let gy = baseline + glyph.y - glyph.font_size * glyph.y_offset;
                let glyph_transform = Transform::from_translate(gx, gy).post_concat(transform);
                pixmap.fill_path(&path, &paint, FillRule::Winding, glyph_transform, None);
                painted += 1;
            }
        }
        painted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typesetter() -> Option<Typesetter> {
        let book = FontBook::default();
        if book.is_empty() {
            println!("No system fonts available. Skipping.");
            return None;
        }
        Some(Typesetter::new(&book))
    }

    #[test]
    fn empty_book_keeps_text_unwrapped() {
        let mut ts = Typesetter::new(&FontBook::empty());
        assert_eq!(
            ts.wrap("  Multipurpose Hall ", BODY_STYLE, 10.0),
            vec![ShapedLine { text: "Multipurpose Hall".into(), width: 0.0 }]
        );
        assert!(ts.wrap("   ", BODY_STYLE, 10.0).is_empty());
        assert_eq!(ts.measure("abc", BODY_STYLE), 0.0);
    }

    #[test]
    fn wrapped_lines_fit_and_keep_every_word() {
        let Some(mut ts) = typesetter() else { return };
        let text = "08:00 AM - 10:00 AM";
        let lines = ts.wrap(text, BODY_STYLE, 100.0);
        assert!(lines.len() > 1);
        // A hanging trailing space may count towards the advance
        for line in &lines {
            assert!(line.width <= 100.0 + BODY_STYLE.size_px / 2.0, "{:?} overflows", line);
        }
        let joined: Vec<&str> = lines.iter().flat_map(|l| l.text.split_whitespace()).collect();
        assert_eq!(joined, text.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn case_changes_shaped_width() {
        let Some(mut ts) = typesetter() else { return };
        let lower = ts.measure("multipurpose hall", BODY_STYLE);
        let upper = ts.measure("MULTIPURPOSE HALL", BODY_STYLE);
        assert!(lower > 0.0);
        assert_ne!(lower, upper);
        assert!(ts.measure("Title", TITLE_STYLE) > ts.measure("Title", BODY_STYLE));
    }

    #[test]
    fn fill_line_paints_glyphs() {
        let Some(mut ts) = typesetter() else { return };
        let mut pixmap = Pixmap::new(200, 40).unwrap();
        let n = ts.fill_line(&mut pixmap, "CSE110", BODY_STYLE, 4.0, 4.0, (255, 255, 255, 255), Transform::identity());
        assert_eq!(n, 6);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0));
    }
}
