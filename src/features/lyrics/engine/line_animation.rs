//! Per-line animation state for lyrics
//!
//! Every line carries a focus ratio in [0, 1] derived from the playback
//! clock. The ratio drives the row scale and the past-line fade, so focus
//! changes never pop.
//!
//! ## Focus ratio
//!
//! - 1.0 while the clock is inside `[start, end]`
//! - Ramps up over the anticipation window before `start`
//! - After `end`, the max of a decay ramp and the next line's anticipation
//!
//! ## Performance
//!
//! `LineAnimationManager` keeps one pre-sized buffer per property and
//! updates it in place, avoiding per-frame allocations in the render path.

use super::LyricsEngineConfig;
use super::layout::LyricsLayout;
use crate::features::lyrics::parser::LyricLine;
use crate::utils::clamp01;

/// Ratios below this count as unfocused when fading past lines
const FOCUS_EPSILON: f32 = 0.01;

// ============================================================================
// Pure timing functions
// ============================================================================

/// Focus ratio of `line` at `time_ms`
///
/// `next_start` is the start of the following line, if any.
pub fn focus_ratio(
    line: &LyricLine,
    next_start: Option<i64>,
    time_ms: i64,
    anticipation_ms: i64,
    decay_ms: i64,
) -> f32 {
    if line.is_untimed() || line.is_active_at(time_ms) {
        return 1.0;
    }

    if time_ms < line.start_time {
        let until = line.start_time.saturating_sub(time_ms);
        if anticipation_ms > 0 && until < anticipation_ms {
            return clamp01(1.0 - until as f32 / anticipation_ms as f32);
        }
        return 0.0;
    }

    let since_end = time_ms.saturating_sub(line.end_time);
    let decay = if decay_ms > 0 && since_end < decay_ms {
        clamp01(1.0 - since_end as f32 / decay_ms as f32)
    } else {
        0.0
    };

    // Stay lit through an instrumental gap until the next line approaches
    let anticipation = match next_start {
        None => 0.0,
        Some(next) => {
            let until_next = next.saturating_sub(time_ms);
            if until_next > anticipation_ms {
                1.0
            } else if until_next > 0 && anticipation_ms > 0 {
                clamp01(until_next as f32 / anticipation_ms as f32)
            } else {
                0.0
            }
        }
    };

    decay.max(anticipation)
}

/// Row scale for a focus ratio
///
/// Text is measured at `layout_scale`, so a fully focused row draws at 1.0
/// and an idle one at `inactive_scale / layout_scale`.
pub fn line_scale(ratio: f32, inactive_scale: f32, layout_scale: f32) -> f32 {
    if layout_scale <= 0.0 {
        return 1.0;
    }
    let rest = inactive_scale / layout_scale;
    rest + (1.0 - rest) * clamp01(ratio)
}

/// Brightness of a completed line while its focus decays
pub fn past_alpha(ratio: f32, dim_alpha: f32) -> f32 {
    let ratio = clamp01(ratio);
    if ratio > FOCUS_EPSILON {
        (dim_alpha + (1.0 - dim_alpha) * ratio).clamp(dim_alpha, 1.0)
    } else {
        dim_alpha
    }
}

/// Sweep progress of word `index`, `None` before the word starts
pub fn word_progress(line: &LyricLine, index: usize, time_ms: i64) -> Option<f32> {
    let word = line.words.get(index)?;
    if time_ms < word.timestamp {
        return None;
    }
    let duration = match line.word_end(index).saturating_sub(word.timestamp) {
        d if d <= 0 => 1,
        d => d,
    };
    Some(clamp01(time_ms.saturating_sub(word.timestamp) as f32 / duration as f32))
}

/// Opacity of the bloom copy, `None` once the word is complete
pub fn bloom_alpha(progress: f32, fade_start: f32) -> Option<f32> {
    let progress = clamp01(progress);
    if progress >= 1.0 {
        return None;
    }
    if progress < fade_start || fade_start >= 1.0 {
        return Some(1.0);
    }
    Some(clamp01((1.0 - progress) / (1.0 - fade_start)))
}

/// Opacity multiplier that fades a background line over the final
/// `fraction` of its duration
pub fn background_fade(line: &LyricLine, time_ms: i64, fraction: f32) -> f32 {
    let duration = line.duration();
    if line.is_untimed() || duration <= 0 || fraction <= 0.0 {
        return 1.0;
    }
    let window = duration as f32 * fraction.min(1.0);
    let remaining = line.end_time.saturating_sub(time_ms) as f32;
    if remaining >= window {
        1.0
    } else {
        clamp01(remaining / window)
    }
}

// ============================================================================
// LineStyle - resolved per-line look for one frame
// ============================================================================

/// Scale and opacity of a line for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub focus_ratio: f32,
    pub scale: f32,
    /// Row-wide opacity multiplier
    pub opacity: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            focus_ratio: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

// ============================================================================
// LineAnimationManager
// ============================================================================

/// Pre-allocated per-line animation state
#[derive(Debug, Clone, Default)]
pub struct LineAnimationManager {
    styles: Vec<LineStyle>,
}

impl LineAnimationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize buffers only when the line count changed
    pub fn ensure_capacity(&mut self, line_count: usize) {
        if self.styles.len() != line_count {
            self.styles.resize(line_count, LineStyle::default());
        }
    }

    pub fn clear(&mut self) {
        self.styles.clear();
    }

    /// Recompute every line's style at `time_ms`
    ///
    /// The next line's start comes from the rows in `layout`. Returns true
    /// while any line is mid-transition.
    pub fn update(
        &mut self,
        lines: &[LyricLine],
        layout: &LyricsLayout,
        time_ms: i64,
        config: &LyricsEngineConfig,
    ) -> bool {
        self.ensure_capacity(lines.len());

        let mut animating = false;
        for (i, line) in lines.iter().enumerate() {
            let next_start = layout.next_start_time(i);
            let ratio = focus_ratio(
                line,
                next_start,
                time_ms,
                config.anticipation_ms,
                config.decay_ms,
            );

            let style = if line.is_background {
                // Fixed look regardless of focus
                LineStyle {
                    focus_ratio: ratio,
                    scale: config.background_scale,
                    opacity: config.background_opacity
                        * background_fade(line, time_ms, config.background_fade_fraction),
                }
            } else {
                LineStyle {
                    focus_ratio: ratio,
                    scale: line_scale(ratio, config.inactive_scale, config.layout_scale),
                    opacity: 1.0,
                }
            };

            animating |= ratio > 0.0 && ratio < 1.0;
            self.styles[i] = style;
        }
        animating
    }

    pub fn style(&self, index: usize) -> LineStyle {
        self.styles.get(index).copied().unwrap_or_default()
    }

    pub fn focus_ratio(&self, index: usize) -> f32 {
        self.style(index).focus_ratio
    }

    #[inline]
    pub fn styles(&self) -> &[LineStyle] {
        &self.styles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
