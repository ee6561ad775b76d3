//! Display list construction
//!
//! Turns the layout, the per-line animation state and the playback clock
//! into [`RowPrimitive`]s for the rows near the viewport.

use super::LyricsEngineConfig;
use super::layout::{LyricsLayout, WrappedLine};
use super::line_animation::{LineAnimationManager, bloom_alpha, past_alpha, word_progress};
use super::types::{BackgroundTreatment, Bloom, RowPrimitive, WordPaint, WordPrimitive};
use crate::features::lyrics::parser::{LyricLine, VocalType};
use crate::utils::Color;

/// Inputs for building one frame's rows
pub struct RenderContext<'a> {
    pub lines: &'a [LyricLine],
    pub layout: &'a LyricsLayout,
    pub animations: &'a LineAnimationManager,
    pub config: &'a LyricsEngineConfig,
    pub time_ms: i64,
    /// Content-space y of the viewport top
    pub scroll_y: f32,
    pub viewport_height: f32,
}

/// Rows to draw plus whether any of them is still changing
pub fn render_rows(ctx: &RenderContext<'_>) -> (Vec<RowPrimitive>, bool) {
    let visible = ctx
        .layout
        .visible_rows(ctx.scroll_y, ctx.viewport_height, ctx.config.overscan_px);

    let mut animating = false;
    let mut rows = Vec::with_capacity(visible.len());
    for row_index in visible {
        let row = &ctx.layout.rows[row_index];
        let Some(line) = ctx.lines.get(row.line_index) else {
            continue;
        };
        let (primitive, row_animating) = render_row(ctx, row_index, row, line);
        animating |= row_animating;
        rows.push(primitive);
    }
    (rows, animating)
}

fn voice_color(config: &LyricsEngineConfig, vocal_type: VocalType) -> Color {
    match vocal_type {
        VocalType::Primary => config.primary_color,
        VocalType::Secondary => config.secondary_color,
    }
}

fn render_row(
    ctx: &RenderContext<'_>,
    row_index: usize,
    row: &WrappedLine,
    line: &LyricLine,
) -> (RowPrimitive, bool) {
    let config = ctx.config;
    let style = ctx.animations.style(row.line_index);
    let color = voice_color(config, line.vocal_type);
    let dim = color.scale_alpha(config.dim_alpha);

    let x = config.padding + row.x_offset;
    let mut animating = style.focus_ratio > 0.0 && style.focus_ratio < 1.0;

    let mut words = Vec::with_capacity(row.words.len());
    let mut word_x = 0.0;
    for word_index in row.words.clone() {
        let Some(word) = line.words.get(word_index) else {
            continue;
        };
        let width = word.width();
        let paint = word_paint(ctx, line, word_index, width, color, dim, style.focus_ratio);
        if let WordPaint::Karaoke { progress, .. } = paint {
            animating |= progress < 1.0;
        }
        words.push(WordPrimitive {
            word_index,
            text: word.text.clone(),
            x: word_x,
            width,
            paint,
        });
        word_x += width;
    }

    let background = line.is_background.then_some(BackgroundTreatment {
        stretch_x: config.background_stretch_x,
        blur_radius: config.background_blur_radius,
    });
    if line.is_background && style.opacity > 0.0 && style.opacity < config.background_opacity {
        animating = true;
    }

    // Background rows are centered, so they scale around their middle
    let origin_x = if line.is_background { x + row.width / 2.0 } else { x };

    let primitive = RowPrimitive {
        line_index: row.line_index,
        row_index,
        x,
        y: row.y - ctx.scroll_y,
        origin_x,
        scale: style.scale,
        opacity: style.opacity,
        focus_ratio: style.focus_ratio,
        vocal_type: line.vocal_type,
        background,
        words,
    };
    (primitive, animating)
}

fn word_paint(
    ctx: &RenderContext<'_>,
    line: &LyricLine,
    word_index: usize,
    width: f32,
    color: Color,
    dim: Color,
    focus_ratio: f32,
) -> WordPaint {
    let config = ctx.config;
    let t = ctx.time_ms;

    if line.is_untimed() {
        return WordPaint::Solid { color };
    }

    if line.is_active_at(t) {
        if !line.is_word_synced {
            return WordPaint::Solid { color };
        }
        return match word_progress(line, word_index, t) {
            None => WordPaint::Dim { color: dim },
            Some(progress) => WordPaint::Karaoke {
                base: dim,
                color,
                progress,
                fill_edge: progress * (width + config.edge_width),
                edge_width: config.edge_width,
                bloom: bloom_alpha(progress, config.bloom_fade_start).map(|alpha| Bloom {
                    alpha,
                    radius: config.bloom_radius,
                }),
            },
        };
    }

    if line.is_past_at(t) {
        let alpha = past_alpha(focus_ratio, config.dim_alpha);
        return if alpha <= config.dim_alpha {
            WordPaint::Dim { color: dim }
        } else {
            WordPaint::Solid {
                color: color.scale_alpha(alpha),
            }
        };
    }

    WordPaint::Dim { color: dim }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lyrics::engine::layout::{LayoutMetrics, layout_lines, measure_words};
    use crate::features::lyrics::engine::text_shaper::MonospaceMeasure;
    use crate::features::lyrics::parser::parse_lyrics;

    struct Fixture {
        lines: Vec<LyricLine>,
        layout: LyricsLayout,
        animations: LineAnimationManager,
        config: LyricsEngineConfig,
    }

    impl Fixture {
        fn new(src: &str) -> Self {
            let config = LyricsEngineConfig::default();
            let measure = MonospaceMeasure::new(0.5);
            let mut lines = parse_lyrics(src);
            measure_words(&mut lines, &measure, config.layout_font_size());
            let metrics = LayoutMetrics::new(&config, &measure, 800.0);
            let layout = layout_lines(&lines, &metrics);
            Self {
                lines,
                layout,
                animations: LineAnimationManager::new(),
                config,
            }
        }

        fn render(&mut self, time_ms: i64, scroll_y: f32) -> (Vec<RowPrimitive>, bool) {
            self.animations
                .update(&self.lines, &self.layout, time_ms, &self.config);
            let ctx = RenderContext {
                lines: &self.lines,
                layout: &self.layout,
                animations: &self.animations,
                config: &self.config,
                time_ms,
                scroll_y,
                viewport_height: 600.0,
            };
            render_rows(&ctx)
        }
    }

    const KARAOKE: &str = "[00:01.00]<00:01.00>one <00:02.00>two <00:03.00>three<00:04.00>\n\
                           [00:05.00]plain line";

    #[test]
    fn test_karaoke_word_paint() {
        let mut fx = Fixture::new(KARAOKE);
        let (rows, animating) = fx.render(1500, -300.0);
        assert!(animating);
        let words = &rows[0].words;

        match &words[0].paint {
            WordPaint::Karaoke {
                progress,
                fill_edge,
                bloom,
                ..
            } => {
                assert!((progress - 0.5).abs() < 1e-6);
                assert!((fill_edge - 0.5 * (words[0].width + 120.0)).abs() < 1e-3);
                assert_eq!(bloom.map(|b| b.alpha), Some(1.0));
            }
            other => panic!("expected karaoke, got {:?}", other),
        }
        assert!(matches!(words[1].paint, WordPaint::Dim { .. }));
        // Words are laid out left to right
        assert_eq!(words[1].x, words[0].width);
    }

    #[test]
    fn test_completed_word_has_no_bloom() {
        let mut fx = Fixture::new(KARAOKE);
        let (rows, _) = fx.render(2500, -300.0);
        match &rows[0].words[0].paint {
            WordPaint::Karaoke { progress, bloom, .. } => {
                assert_eq!(*progress, 1.0);
                assert!(bloom.is_none());
            }
            other => panic!("expected karaoke, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_line_flips_when_active() {
        let mut fx = Fixture::new(KARAOKE);
        let (rows, _) = fx.render(4000, -300.0);
        let plain = rows.iter().find(|r| r.line_index == 1).unwrap();
        assert!(plain.words.iter().all(|w| matches!(w.paint, WordPaint::Dim { .. })));

        let (rows, _) = fx.render(5500, -300.0);
        let plain = rows.iter().find(|r| r.line_index == 1).unwrap();
        assert!(
            plain
                .words
                .iter()
                .all(|w| w.paint == WordPaint::Solid { color: Color::WHITE })
        );
    }

    #[test]
    fn test_past_line_fades_to_dim() {
        let mut fx = Fixture::new(KARAOKE);
        // Line 0 ended at 4000, next starts at 5000: 600ms anticipation window
        let (rows, _) = fx.render(4700, -300.0);
        match rows[0].words[0].paint {
            WordPaint::Solid { color } => assert!(color.a > 0.4 && color.a < 1.0),
            ref other => panic!("expected fading solid, got {:?}", other),
        }
        let (rows, _) = fx.render(9000, -300.0);
        assert_eq!(
            rows[0].words[0].paint,
            WordPaint::Dim {
                color: Color::WHITE.scale_alpha(0.4)
            }
        );
    }

    #[test]
    fn test_secondary_voice_uses_accent() {
        let mut fx = Fixture::new("[00:01.00]v2:duet");
        let (rows, _) = fx.render(1500, -300.0);
        assert_eq!(rows[0].vocal_type, VocalType::Secondary);
        assert_eq!(
            rows[0].words[0].paint,
            WordPaint::Solid {
                color: fx.config.secondary_color
            }
        );
    }

    #[test]
    fn test_background_row_treatment() {
        let mut fx = Fixture::new("[00:01.00]lead\n[bg: <00:01.00>ooh<00:02.00>]");
        let (rows, _) = fx.render(1500, -300.0);
        let bg = rows.iter().find(|r| r.background.is_some()).unwrap();
        assert_eq!(bg.scale, fx.config.background_scale);
        assert_eq!(bg.opacity, fx.config.background_opacity);
        assert!(bg.x > fx.config.padding);
    }

    #[test]
    fn test_offscreen_rows_culled() {
        let src: String = (0..200).map(|i| format!("[{:02}:{:02}.00]row {}\n", i / 60, i % 60, i)).collect();
        let mut fx = Fixture::new(&src);
        let (rows, _) = fx.render(0, -300.0);
        assert!(!rows.is_empty());
        assert!(rows.len() < 200);
        for row in &rows {
            assert!(row.y > -fx.config.overscan_px - 100.0);
            assert!(row.y < 600.0 + fx.config.overscan_px + 100.0);
        }
    }

    #[test]
    fn test_untimed_lines_solid() {
        let mut fx = Fixture::new("just some\nplain text");
        let (rows, animating) = fx.render(0, -300.0);
        assert_eq!(rows.len(), 2);
        assert!(!animating);
        for row in &rows {
            assert_eq!(row.scale, 1.0);
            assert!(row.words.iter().all(|w| matches!(w.paint, WordPaint::Solid { .. })));
        }
    }
}
