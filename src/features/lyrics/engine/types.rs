//! Engine output types
//!
//! A frame is a display list: one [`RowPrimitive`] per visible wrapped row,
//! each holding per-word paint instructions. Hosts map these onto their own
//! text drawing (canvas, GPU glyph atlas, terminal cells).
//!
//! Coordinates:
//! - Row `x`/`y` are screen-space; `y` is the vertical middle of the row.
//! - Word `x`, `width` and `fill_edge` are relative to the row's `x`, in
//!   unscaled layout pixels. The row `scale` is applied around
//!   (`origin_x`, `y`).

use super::physics::ScrollMode;
use crate::features::lyrics::parser::VocalType;
use crate::utils::Color;

/// Glow drawn behind the moving fill edge of a word in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bloom {
    /// 1.0 until the fade threshold, then down to 0.0 at completion
    pub alpha: f32,
    /// Blur radius in pixels
    pub radius: f32,
}

/// How a single word is painted
#[derive(Debug, Clone, PartialEq)]
pub enum WordPaint {
    /// Inactive text in the dim tone
    Dim { color: Color },
    /// Whole word in a flat color
    Solid { color: Color },
    /// Karaoke sweep: dim base, hard fill up to `fill_edge` fading out over
    /// `edge_width`, optional bloom copy of the same edge
    Karaoke {
        base: Color,
        color: Color,
        progress: f32,
        fill_edge: f32,
        edge_width: f32,
        bloom: Option<Bloom>,
    },
}

/// One word placed on a row
#[derive(Debug, Clone, PartialEq)]
pub struct WordPrimitive {
    /// Index of the word within its lyric line
    pub word_index: usize,
    pub text: String,
    /// Offset from the row start
    pub x: f32,
    pub width: f32,
    pub paint: WordPaint,
}

/// Glyph treatment for background vocal rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundTreatment {
    /// Horizontal glyph stretch factor
    pub stretch_x: f32,
    /// Blur radius in pixels
    pub blur_radius: f32,
}

/// One visible wrapped row
#[derive(Debug, Clone, PartialEq)]
pub struct RowPrimitive {
    /// Index into the engine's line list
    pub line_index: usize,
    /// Index into the layout's row list
    pub row_index: usize,
    pub x: f32,
    pub y: f32,
    /// Horizontal scale origin
    pub origin_x: f32,
    pub scale: f32,
    /// Row-wide opacity multiplier
    pub opacity: f32,
    pub focus_ratio: f32,
    pub vocal_type: VocalType,
    pub background: Option<BackgroundTreatment>,
    pub words: Vec<WordPrimitive>,
}

/// Everything a host needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Content-space y of the viewport top
    pub scroll_y: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Playback position used for this frame
    pub time_ms: i64,
    /// Last line whose start is at or before `time_ms`
    pub focused_line: Option<usize>,
    pub scroll_mode: ScrollMode,
    pub rows: Vec<RowPrimitive>,
    /// Whether another frame should be scheduled right away
    pub needs_redraw: bool,
}

impl RenderFrame {
    pub fn empty(viewport_width: f32, viewport_height: f32, scroll_mode: ScrollMode) -> Self {
        Self {
            scroll_y: 0.0,
            viewport_width,
            viewport_height,
            time_ms: 0,
            focused_line: None,
            scroll_mode,
            rows: Vec::new(),
            needs_redraw: false,
        }
    }

    /// Rows belonging to one lyric line
    pub fn rows_for_line(&self, line_index: usize) -> impl Iterator<Item = &RowPrimitive> {
        self.rows.iter().filter(move |r| r.line_index == line_index)
    }
}
