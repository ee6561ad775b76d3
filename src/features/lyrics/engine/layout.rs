//! Row layout for synced lyrics
//!
//! Words are measured once at the layout font size, which is larger than
//! the inactive render scale, so the zoom animation never needs to measure
//! text again. Layout then greedily packs no-break clusters into rows.

use std::ops::Range;

use super::LyricsEngineConfig;
use super::text_shaper::TextMeasure;
use super::word_splitter::{clusters, range_width};
use crate::features::lyrics::parser::LyricLine;

/// Layout parameters derived from configuration, font metrics and width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Font size used for measurement
    pub font_size: f32,
    /// Row height of a normal line
    pub line_height: f32,
    /// Row height of a background vocal line
    pub background_line_height: f32,
    /// Gap between rows of the same lyric line
    pub wrapped_line_gap: f32,
    /// Gap between rows of different lyric lines
    pub lyric_gap: f32,
    /// Horizontal padding on both sides
    pub padding: f32,
    pub viewport_width: f32,
}

impl LayoutMetrics {
    pub fn new(config: &LyricsEngineConfig, measure: &dyn TextMeasure, viewport_width: f32) -> Self {
        let font_size = config.layout_font_size();
        let line_height = measure.line_height(font_size);
        Self {
            font_size,
            line_height,
            background_line_height: line_height * config.background_line_height_factor,
            wrapped_line_gap: config.wrapped_line_gap,
            lyric_gap: config.lyric_gap,
            padding: config.padding,
            viewport_width,
        }
    }

    /// Widest row allowed
    pub fn max_row_width(&self) -> f32 {
        self.viewport_width - self.padding * 2.0
    }

    pub fn row_height(&self, is_background: bool) -> f32 {
        if is_background {
            self.background_line_height
        } else {
            self.line_height
        }
    }

    /// Offset from `padding` that centers a background row
    fn x_offset(&self, is_background: bool, row_width: f32) -> f32 {
        if is_background {
            (self.viewport_width - row_width) / 2.0 - self.padding
        } else {
            0.0
        }
    }
}

/// One visual row of a lyric line
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    /// Index of the parent line
    pub line_index: usize,
    /// Sub-range of the parent line's words placed on this row
    pub words: Range<usize>,
    /// Summed word widths
    pub width: f32,
    /// Content-space y of the row's vertical middle
    pub y: f32,
    pub height: f32,
    /// Horizontal offset from the padding; nonzero only for background rows
    pub x_offset: f32,
    /// Start time of the next lyric line
    pub next_start_time: Option<i64>,
}

impl WrappedLine {
    /// Whether the row overlaps the viewport plus an overscan buffer
    pub fn is_in_sight(&self, scroll_y: f32, viewport_height: f32, overscan_px: f32) -> bool {
        let top = self.y - self.height / 2.0 - scroll_y;
        let bottom = top + self.height;
        !(top > viewport_height + overscan_px || bottom < -overscan_px)
    }
}

/// Result of laying out a line list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsLayout {
    /// All rows, ordered top to bottom
    pub rows: Vec<WrappedLine>,
    /// Rows of each line, index-aligned with the line list
    pub line_rows: Vec<Range<usize>>,
    /// Geometric center of each line's rows; `None` for lines with no rows
    pub center_y: Vec<Option<f32>>,
    pub total_height: f32,
}

impl LyricsLayout {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_for_line(&self, line_index: usize) -> &[WrappedLine] {
        match self.line_rows.get(line_index) {
            Some(range) => &self.rows[range.clone()],
            None => &[],
        }
    }

    /// Start of the line after `line_index`, as recorded on its rows
    pub fn next_start_time(&self, line_index: usize) -> Option<i64> {
        self.rows_for_line(line_index)
            .first()
            .and_then(|row| row.next_start_time)
    }

    /// First row whose padded vertical extent contains `content_y`
    pub fn row_at(&self, content_y: f32, vertical_padding: f32) -> Option<&WrappedLine> {
        self.rows
            .iter()
            .find(|row| (content_y - row.y).abs() <= row.height / 2.0 + vertical_padding)
    }

    /// Index range of rows that may be visible
    pub fn visible_rows(&self, scroll_y: f32, viewport_height: f32, overscan_px: f32) -> Range<usize> {
        let start = self.rows.partition_point(|row| {
            row.y + row.height / 2.0 - scroll_y < -overscan_px
        });
        let end = self.rows.partition_point(|row| {
            row.y - row.height / 2.0 - scroll_y <= viewport_height + overscan_px
        });
        start..end.max(start)
    }
}

/// Fill the width cache of every word that has not been measured yet
pub fn measure_words(lines: &mut [LyricLine], measure: &dyn TextMeasure, font_size: f32) {
    for word in lines.iter_mut().flat_map(|line| line.words.iter_mut()) {
        if word.display_width.is_none() {
            word.display_width = Some(measure.measure(&word.text, font_size));
        }
    }
}

/// Running vertical cursor while emitting rows
struct RowCursor<'a> {
    lines: &'a [LyricLine],
    metrics: &'a LayoutMetrics,
    y: f32,
    /// Line that produced the previous row
    previous_line: Option<usize>,
    rows: Vec<WrappedLine>,
}

impl RowCursor<'_> {
    fn gap_before(&self, line_index: usize) -> f32 {
        match self.previous_line {
            None => 0.0,
            Some(prev) if prev == line_index => self.metrics.wrapped_line_gap,
            Some(prev) => {
                if self.lines[prev].is_background || self.lines[line_index].is_background {
                    0.0
                } else {
                    self.metrics.lyric_gap
                }
            }
        }
    }

    /// Close a row and return its center y
    fn push_row(&mut self, line_index: usize, words: Range<usize>, width: f32) -> f32 {
        let line = &self.lines[line_index];
        let height = self.metrics.row_height(line.is_background);

        self.y += self.gap_before(line_index);
        let center = self.y + height / 2.0;
        self.rows.push(WrappedLine {
            line_index,
            words,
            width,
            y: center,
            height,
            x_offset: self.metrics.x_offset(line.is_background, width),
            next_start_time: self.lines.get(line_index + 1).map(|next| next.start_time),
        });
        self.y += height;
        self.previous_line = Some(line_index);
        center
    }
}

/// Lay out every line into rows
///
/// Words must already carry a measured width (see [`measure_words`]).
pub fn layout_lines(lines: &[LyricLine], metrics: &LayoutMetrics) -> LyricsLayout {
    let max_width = metrics.max_row_width();
    if max_width <= 0.0 || lines.is_empty() {
        return LyricsLayout {
            line_rows: vec![0..0; lines.len()],
            center_y: vec![None; lines.len()],
            ..Default::default()
        };
    }

    let mut cursor = RowCursor {
        lines,
        metrics,
        y: 0.0,
        previous_line: None,
        rows: Vec::new(),
    };
    let mut line_rows = Vec::with_capacity(lines.len());
    let mut center_y = Vec::with_capacity(lines.len());

    for (line_index, line) in lines.iter().enumerate() {
        let first_row = cursor.rows.len();
        let mut first_y = None;
        let mut last_y = None;

        let mut row_start = 0;
        let mut row_end = 0;
        let mut row_width = 0.0;

        for cluster in clusters(&line.words) {
            let cluster_width = range_width(&line.words, cluster.clone());
            if row_end > row_start && row_width + cluster_width > max_width {
                let y = cursor.push_row(line_index, row_start..row_end, row_width);
                first_y.get_or_insert(y);
                last_y = Some(y);
                row_start = cluster.start;
                row_width = 0.0;
            }
            row_end = cluster.end;
            row_width += cluster_width;
        }
        if row_end > row_start {
            let y = cursor.push_row(line_index, row_start..row_end, row_width);
            first_y.get_or_insert(y);
            last_y = Some(y);
        }

        line_rows.push(first_row..cursor.rows.len());
        center_y.push(first_y.zip(last_y).map(|(first, last)| (first + last) / 2.0));
    }

    tracing::debug!(
        "Laid out {} lines into {} rows, content height {:.1}",
        lines.len(),
        cursor.rows.len(),
        cursor.y
    );

    LyricsLayout {
        rows: cursor.rows,
        line_rows,
        center_y,
        total_height: cursor.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lyrics::engine::text_shaper::MonospaceMeasure;
    use crate::features::lyrics::parser::{LyricWord, parse_lyrics};

    /// 10px per character, 14px rows, 10px padding
    fn metrics(viewport_width: f32) -> LayoutMetrics {
        LayoutMetrics {
            font_size: 10.0,
            line_height: 14.0,
            background_line_height: 7.0,
            wrapped_line_gap: 2.0,
            lyric_gap: 20.0,
            padding: 10.0,
            viewport_width,
        }
    }

    fn measured(src: &str) -> Vec<LyricLine> {
        let mut lines = parse_lyrics(src);
        measure_words(&mut lines, &MonospaceMeasure::new(1.0), 10.0);
        lines
    }

    #[test]
    fn test_two_short_lines() {
        let lines = measured("[00:00.00]Hello\n[00:05.00]World");
        let layout = layout_lines(&lines, &metrics(400.0));

        assert_eq!(layout.rows.len(), 2);
        let c0 = layout.center_y[0].unwrap();
        let c1 = layout.center_y[1].unwrap();
        assert!(c0 < c1);
        // First row starts flush at the top
        assert_eq!(layout.rows[0].y - layout.rows[0].height / 2.0, 0.0);
        assert_eq!(layout.total_height, 14.0 + 20.0 + 14.0);
    }

    #[test]
    fn test_wrapping_preserves_words_and_width() {
        // 6 words of 5 chars incl. space -> 50px each, 100px available
        let lines = measured("[00:01.00]aaaa bbbb cccc dddd eeee ffff");
        let layout = layout_lines(&lines, &metrics(120.0));

        assert_eq!(layout.rows.len(), 3);
        let flat: Vec<usize> = layout.rows.iter().flat_map(|r| r.words.clone()).collect();
        assert_eq!(flat, (0..lines[0].words.len()).collect::<Vec<_>>());
        for row in &layout.rows {
            assert!(row.width <= 100.0);
        }
        // Wrapped gap between rows of one line
        let gap = (layout.rows[1].y - layout.rows[0].y) - 14.0;
        assert_eq!(gap, 2.0);
        assert_eq!(layout.line_rows[0], 0..3);
    }

    #[test]
    fn test_clusters_not_split() {
        let mut lines = vec![LyricLine {
            start_time: 0,
            end_time: 1000,
            is_word_synced: true,
            words: vec![
                LyricWord::new(0, "ab "),
                LyricWord::new(100, "cd"),
                LyricWord::new(200, "ef "),
            ],
            ..Default::default()
        }];
        measure_words(&mut lines, &MonospaceMeasure::new(1.0), 10.0);
        // "ab " fits, "cdef " (50px) would overflow 60px next to it
        let layout = layout_lines(&lines, &metrics(80.0));
        assert_eq!(layout.rows.len(), 2);
        assert_eq!(layout.rows[0].words, 0..1);
        assert_eq!(layout.rows[1].words, 1..3);
    }

    #[test]
    fn test_oversized_word_gets_own_row() {
        let lines = measured("[00:01.00]a supercalifragilistic b");
        let layout = layout_lines(&lines, &metrics(100.0));
        let widths: Vec<f32> = layout.rows.iter().map(|r| r.width).collect();
        assert_eq!(widths.len(), 3);
        assert!(widths[1] > 80.0);
        assert!(widths[0] <= 80.0 && widths[2] <= 80.0);
    }

    #[test]
    fn test_background_rows_centered_and_flush() {
        let lines = measured(
            "[00:01.00]<00:01.00>lead<00:02.00>\n\
             [bg: <00:01.20>ooh<00:01.80>]\n\
             [00:03.00]next",
        );
        assert!(lines[1].is_background);
        let layout = layout_lines(&lines, &metrics(200.0));

        let lead = &layout.rows[0];
        let bg = &layout.rows[1];
        let next = &layout.rows[2];
        assert_eq!(lead.x_offset, 0.0);
        // 30px row centered in 200px: x = 85 = padding + offset
        assert_eq!(bg.x_offset, 75.0);
        assert_eq!(bg.height, 7.0);
        // No gap on either side of the background row
        assert_eq!(bg.y - bg.height / 2.0, lead.y + lead.height / 2.0);
        assert_eq!(next.y - next.height / 2.0, bg.y + bg.height / 2.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let lines = measured("[00:00.00]Hello");
        let layout = layout_lines(&lines, &metrics(20.0));
        assert!(layout.is_empty());
        assert_eq!(layout.center_y, vec![None]);
        assert_eq!(layout.total_height, 0.0);

        let layout = layout_lines(&[], &metrics(400.0));
        assert!(layout.is_empty());
    }

    #[test]
    fn test_relayout_is_idempotent() {
        let lines = measured("[00:00.00]one two three four\n[00:02.00]five six");
        let a = layout_lines(&lines, &metrics(90.0));
        let b = layout_lines(&lines, &metrics(90.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_row_hit_testing() {
        let lines = measured("[00:00.00]Hello\n[00:05.00]World");
        let layout = layout_lines(&lines, &metrics(400.0));
        assert_eq!(layout.row_at(7.0, 0.0).map(|r| r.line_index), Some(0));
        assert_eq!(layout.row_at(41.0, 0.0).map(|r| r.line_index), Some(1));
        assert!(layout.row_at(24.0, 0.0).is_none());
        // Padding widens the hit area, first match wins
        assert_eq!(layout.row_at(24.0, 10.0).map(|r| r.line_index), Some(0));
    }

    #[test]
    fn test_visible_rows_culling() {
        let src: String = (0..50)
            .map(|i| format!("[00:{:02}.00]line {}\n", i, i))
            .collect();
        let lines = measured(&src);
        let layout = layout_lines(&lines, &metrics(400.0));
        // Rows are 14px plus 20px gap -> 34px pitch
        let visible = layout.visible_rows(340.0, 100.0, 0.0);
        assert!(!visible.is_empty());
        for row in &layout.rows[visible.clone()] {
            assert!(row.is_in_sight(340.0, 100.0, 0.0));
        }
        assert!(!layout.rows[visible.start - 1].is_in_sight(340.0, 100.0, 0.0));
        assert!(!layout.rows[visible.end].is_in_sight(340.0, 100.0, 0.0));
    }
}
