/// Display list lowered from a `ReportLayout`

use crate::rendering::layout::{ElementType, LayoutNode, ReportLayout, BORDER};
use crate::rendering::text::TextStyle;

pub const BACKGROUND: (u8, u8, u8, u8) = (0, 0, 0, 255);
pub const FOREGROUND: (u8, u8, u8, u8) = (255, 255, 255, 255);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    /// A single shaped line; `(x, y)` is the top-left corner of its line box
    Text {
        x: f32,
        y: i32,
        text: String,
        style: TextStyle,
        rgba: (u8, u8, u8, u8),
    },
}

impl PaintCommand {
    /// Vertical extent `[top, bottom)` in css px
    pub fn vertical_span(&self) -> (i32, i32) {
        match self {
            PaintCommand::SolidRect { y, height, .. } => (*y, *y + *height as i32),
            PaintCommand::Text { y, style, .. } => (*y, *y + style.line_height as i32),
        }
    }
}

/// Lower the layout to paint commands in back-to-front order.
///
/// Cells are solid: the table is filled with the border colour and each
/// cell interior is painted over it, leaving 1px grid lines.
pub fn display_list(layout: &ReportLayout) -> Vec<PaintCommand> {
    let ox = layout.left;
    let mut cmds = Vec::with_capacity(layout.nodes.len() * 3 + 2);
    cmds.push(PaintCommand::SolidRect {
        x: ox,
        y: 0,
        width: layout.width,
        height: layout.painted_height(),
        rgba: BACKGROUND,
    });
    cmds.push(PaintCommand::SolidRect {
        x: ox + layout.table.x,
        y: layout.table.y,
        width: layout.table.width,
        height: layout.table.height,
        rgba: FOREGROUND,
    });

    for node in &layout.nodes {
        let r = &node.lb.rect;
        if node.elem_type != ElementType::Title {
            cmds.push(PaintCommand::SolidRect {
                x: ox + r.x + BORDER as i32,
                y: r.y + BORDER as i32,
                width: r.width.saturating_sub(BORDER),
                height: r.height.saturating_sub(BORDER),
                rgba: BACKGROUND,
            });
        }
        push_text(&mut cmds, node, ox);
    }
    cmds
}

fn push_text(cmds: &mut Vec<PaintCommand>, node: &LayoutNode, ox: i32) {
    let r = &node.lb.rect;
    let line_h = node.line_height() as i32;
    let block_h = line_h * node.lines.len() as i32;
    let inset = if node.elem_type == ElementType::Title { 0 } else { BORDER as i32 };
    let top = r.y + inset + (r.height as i32 - inset - block_h) / 2;
    let left = (ox + r.x + inset) as f32;
    let span = (r.width as i32 - inset) as f32;

    for (i, line) in node.lines.iter().enumerate() {
        cmds.push(PaintCommand::Text {
            x: left + ((span - line.width) / 2.0).max(0.0),
            y: top + i as i32 * line_h,
            text: line.text.clone(),
            style: node.style,
            rgba: FOREGROUND,
        });
    }
}
