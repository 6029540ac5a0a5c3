/// Layout of the off-screen report container
///
/// The container lives in a fixed-width virtual viewport, so the boxes
/// computed here never depend on the real screen the report is viewed on.

use crate::config::{CaptureConfig, CellPadding};
use crate::rendering::text::{
    FontBook, ShapedLine, TextStyle, Typesetter, BODY_STYLE, HEADER_STYLE, TITLE_STYLE,
};
use crate::report::{ReportDocument, COLUMN_LABELS};
use crate::{Error, Result};

pub const CONTAINER_PADDING: u32 = 24;
pub const TITLE_MARGIN: u32 = 24;
pub const CELL_PADDING_X: u32 = 12;
pub const CELL_PADDING_Y: u32 = 12;
pub const CELL_MIN_CONTENT: u32 = 30;
pub const BORDER: u32 = 1;
/// Extra space kept below the table so the last row is never clipped
pub const TAIL_PADDING: u32 = 20;
/// Horizontal position of the live container; keeps it out of view
pub const OFFSCREEN_LEFT: i32 = -9999;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub border: u32,
    pub padding: CellPadding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let p = &self.box_model.padding;
        self.rect
            .width
            .saturating_sub(self.box_model.border + p.left + p.right + 2 * CELL_PADDING_X)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Title,
    HeaderCell,
    BodyCell,
}

impl ElementType {
    pub fn text_style(self) -> TextStyle {
        match self {
            ElementType::Title => TITLE_STYLE,
            ElementType::HeaderCell => HEADER_STYLE,
            ElementType::BodyCell => BODY_STYLE,
        }
    }
}

/// A positioned box with its wrapped, shaped text lines
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub lines: Vec<ShapedLine>,
    pub elem_type: ElementType,
    pub style: TextStyle,
}

impl LayoutNode {
    pub fn line_height(&self) -> u32 {
        self.style.line_height
    }
}

/// The report container: a title block above a bordered table
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub width: u32,
    /// Height of the laid-out content, excluding the tail padding
    pub scroll_height: u32,
    /// Horizontal offset of the container in the page
    pub left: i32,
    /// Bottom padding actually painted; set on capture clones
    pub tail_padding: u32,
    /// Absolute size pinned on capture clones
    pub fixed_size: Option<(u32, u32)>,
    pub table: Rect,
    pub nodes: Vec<LayoutNode>,
    /// Faces the text was shaped with; painting must use the same ones
    pub fonts: FontBook,
}

impl ReportLayout {
    /// Size used for planning: content plus the tail padding
    pub fn measured_size(&self) -> (u32, u32) {
        self.fixed_size
            .unwrap_or((self.width, self.scroll_height + TAIL_PADDING))
    }

    /// Painted height of the container background
    pub fn painted_height(&self) -> u32 {
        match self.fixed_size {
            Some((_, h)) => h,
            None => self.scroll_height + self.tail_padding,
        }
    }

    /// Clone with explicit absolute sizing so a capture cannot observe reflow
    pub fn pinned(&self, width: u32, height: u32) -> ReportLayout {
        let mut clone = self.clone();
        clone.fixed_size = Some((width, height));
        clone
    }

    /// Pre-capture normalisation applied to the rasterizer's clone
    pub fn normalize_for_capture(&mut self) {
        self.left = 0;
        self.tail_padding = TAIL_PADDING;
    }

    pub fn rows(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.elem_type == ElementType::BodyCell)
            .count()
            / COLUMN_LABELS.len()
    }
}

/// Split the table's inner width across the five columns; the last column
/// absorbs the remainder.
fn column_widths(inner: u32) -> [u32; 5] {
    let n = COLUMN_LABELS.len() as u32;
    let base = (inner / n).max(1);
    let mut widths = [base; 5];
    widths[4] = inner.saturating_sub(base * (n - 1)).max(1);
    widths
}

pub struct LayoutBuilder<'c> {
    config: &'c CaptureConfig,
    fonts: FontBook,
}

impl<'c> LayoutBuilder<'c> {
    /// Builder using the faces named by `config.fonts`
    pub fn new(config: &'c CaptureConfig) -> Self {
        LayoutBuilder { config, fonts: FontBook::from_settings(&config.fonts) }
    }

    pub fn with_fonts(config: &'c CaptureConfig, fonts: FontBook) -> Self {
        LayoutBuilder { config, fonts }
    }

    /// Lay out `document` in the virtual viewport.
    pub fn build(&self, document: &ReportDocument) -> Result<ReportLayout> {
        if document.is_empty() {
            return Err(Error::EmptyReport);
        }

        let width = self.config.virtual_width;
        let inner = width
            .saturating_sub(2 * CONTAINER_PADDING)
            .max(COLUMN_LABELS.len() as u32 + BORDER);
        let mut nodes = Vec::with_capacity((document.rows.len() + 1) * COLUMN_LABELS.len() + 1);
        let mut y = CONTAINER_PADDING;
        let mut typesetter = Typesetter::new(&self.fonts);

        let title_lines = typesetter.wrap(&document.title, TITLE_STYLE, inner as f32);
        let title_h = title_lines.len().max(1) as u32 * TITLE_STYLE.line_height;
        nodes.push(LayoutNode {
            lb: LayoutBox {
                rect: Rect {
                    x: CONTAINER_PADDING as i32,
                    y: y as i32,
                    width: inner,
                    height: title_h,
                },
                box_model: BoxModel { border: 0, padding: CellPadding::uniform(0) },
            },
            lines: title_lines,
            elem_type: ElementType::Title,
            style: TITLE_STYLE,
        });
        y += title_h + TITLE_MARGIN;

        let columns = column_widths(inner - BORDER);
        let table_top = y;
        y = self.push_row(
            &mut typesetter,
            &mut nodes,
            y,
            &columns,
            COLUMN_LABELS,
            ElementType::HeaderCell,
            self.config.header_padding,
        );
        for row in &document.rows {
            y = self.push_row(
                &mut typesetter,
                &mut nodes,
                y,
                &columns,
                row.cells(),
                ElementType::BodyCell,
                self.config.cell_padding,
            );
        }
        let table = Rect {
            x: CONTAINER_PADDING as i32,
            y: table_top as i32,
            width: inner,
            height: y - table_top + BORDER,
        };
        let scroll_height = y + BORDER + CONTAINER_PADDING;

        log::debug!(
            "laid out report: {} rows, {}x{} css px",
            document.rows.len(),
            width,
            scroll_height
        );

        Ok(ReportLayout {
            width,
            scroll_height,
            left: OFFSCREEN_LEFT,
            tail_padding: 0,
            fixed_size: None,
            table,
            nodes,
            fonts: self.fonts.clone(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn push_row(
        &self,
        typesetter: &mut Typesetter,
        nodes: &mut Vec<LayoutNode>,
        y: u32,
        columns: &[u32; 5],
        texts: [&str; 5],
        elem_type: ElementType,
        padding: CellPadding,
    ) -> u32 {
        let style = elem_type.text_style();
        let mut cells = Vec::with_capacity(texts.len());
        let mut content_h = CELL_MIN_CONTENT;
        for (col, text) in texts.iter().enumerate() {
            let available = columns[col]
                .saturating_sub(BORDER + 2 * CELL_PADDING_X + padding.left + padding.right);
            let lines = typesetter.wrap(text, style, available as f32);
            content_h = content_h.max(lines.len() as u32 * style.line_height);
            cells.push(lines);
        }
        let row_h = BORDER + 2 * CELL_PADDING_Y + padding.top + padding.bottom + content_h;

        let mut x = CONTAINER_PADDING as i32;
        for (col, lines) in cells.into_iter().enumerate() {
            nodes.push(LayoutNode {
                lb: LayoutBox {
                    rect: Rect { x, y: y as i32, width: columns[col], height: row_h },
                    box_model: BoxModel { border: BORDER, padding },
                },
                lines,
                elem_type,
                style,
            });
            x += columns[col] as i32;
        }
        y + row_h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportRow;

    fn doc(rows: usize) -> ReportDocument {
        let rows = (0..rows)
            .map(|i| ReportRow::new("12 Jun", "9:00 AM", format!("CSE{}", 100 + i), "1", "UB20601"))
            .collect();
        ReportDocument::new("SUMMER-2025 FINAL SCHEDULE", rows)
    }

    #[test]
    fn empty_document_is_rejected() {
        let cfg = CaptureConfig::default();
        let err = LayoutBuilder::new(&cfg).build(&doc(0)).unwrap_err();
        assert!(matches!(err, Error::EmptyReport));
    }

    #[test]
    fn layout_places_title_header_and_rows() {
        let cfg = CaptureConfig::default();
        let layout = LayoutBuilder::new(&cfg).build(&doc(3)).unwrap();
        assert_eq!(layout.width, 850);
        assert_eq!(layout.left, OFFSCREEN_LEFT);
        assert_eq!(layout.nodes[0].elem_type, ElementType::Title);
        assert_eq!(layout.nodes.len(), 1 + 4 * 5);
        assert_eq!(layout.rows(), 3);

        // Every row is laid out below the previous one, cells share a row top.
        let cells: Vec<_> = layout.nodes[1..].chunks(5).collect();
        for pair in cells.windows(2) {
            assert_eq!(pair[0][0].lb.rect.bottom(), pair[1][0].lb.rect.y);
        }
        for row in &cells {
            assert!(row.iter().all(|c| c.lb.rect.y == row[0].lb.rect.y));
            let w: u32 = row.iter().map(|c| c.lb.rect.width).sum();
            assert_eq!(w + BORDER, layout.table.width);
        }
        let (mw, mh) = layout.measured_size();
        assert_eq!(mw, 850);
        assert_eq!(mh, layout.scroll_height + TAIL_PADDING);
    }

    #[test]
    fn long_cell_text_grows_its_row() {
        let cfg = CaptureConfig::default();
        let builder = LayoutBuilder::new(&cfg);
        if builder.fonts.is_empty() {
            println!("No system fonts available. Skipping.");
            return;
        }
        let mut d = doc(1);
        d.rows[0].time = "08:00 AM - 10:00 AM".into();
        d.rows[0].classroom = "Multipurpose Hall, Second Floor, Annex Building".into();
        let layout = builder.build(&d).unwrap();
        let header_h = layout.nodes[1].lb.rect.height;
        let room_cell = &layout.nodes[10];
        assert!(room_cell.lines.len() > 1);
        assert!(room_cell.lb.rect.height > header_h);
        let available = room_cell.lb.content_width() as f32;
        for line in &room_cell.lines {
            assert!(line.width <= available + BODY_STYLE.size_px / 2.0, "{:?}", line);
        }
    }

    #[test]
    fn without_fonts_every_cell_is_one_line() {
        let cfg = CaptureConfig::default();
        let layout = LayoutBuilder::with_fonts(&cfg, FontBook::empty()).build(&doc(2)).unwrap();
        assert!(layout.nodes.iter().all(|n| n.lines.len() == 1));
        assert_eq!(layout.nodes[3].lines[0].text, "Course");
        assert!(layout.fonts.is_empty());
        // Header row: min content plus paddings and border
        assert_eq!(layout.nodes[1].lb.rect.height, BORDER + 2 * CELL_PADDING_Y + 10 + CELL_MIN_CONTENT);
    }

    #[test]
    fn pinned_clone_reports_fixed_size() {
        let cfg = CaptureConfig::default();
        let layout = LayoutBuilder::new(&cfg).build(&doc(2)).unwrap();
        let mut pinned = layout.pinned(850, 999);
        assert_eq!(pinned.measured_size(), (850, 999));
        pinned.normalize_for_capture();
        assert_eq!(pinned.left, 0);
        assert_eq!(pinned.painted_height(), 999);
        assert_eq!(layout.left, OFFSCREEN_LEFT);
    }
}
