//! Scroll focus targets
//!
//! Each line gets one content-space y the viewport centers on while the
//! line is current. Duet lyrics often have two or three lines active at
//! once; their targets are merged so the view settles between them instead
//! of jumping from one to the next.

use crate::features::lyrics::parser::LyricLine;
use crate::utils::{clamp01, lerp};

/// Pre-compute the scroll target of every line
///
/// - Untimed lines target their own center.
/// - A line starting before line `i-2` ends targets the center of `i-1`.
/// - A line starting before line `i-1` ends targets the midpoint of both.
/// - Otherwise a line targets its own center.
///
/// Lines without rows count as centered at 0.
pub fn scroll_targets(lines: &[LyricLine], center_y: &[Option<f32>]) -> Vec<f32> {
    let center = |i: usize| center_y.get(i).copied().flatten().unwrap_or(0.0);

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if line.is_untimed() {
                return center(i);
            }
            let overlaps = |back: usize| {
                i >= back && line.start_time < lines[i - back].end_time
            };
            if overlaps(2) {
                center(i - 1)
            } else if overlaps(1) {
                (center(i - 1) + center(i)) / 2.0
            } else {
                center(i)
            }
        })
        .collect()
}

/// Index of the last line whose start is at or before `time_ms`
///
/// Falls back to the first line before any line has started. Lines must be
/// sorted by start time.
pub fn current_line_index(lines: &[LyricLine], time_ms: i64) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }
    let started = lines.partition_point(|line| line.start_time <= time_ms);
    Some(started.saturating_sub(1))
}

/// Content-space y the viewport should center on at `time_ms`
///
/// Blends toward the next line's target while it is less than
/// `anticipation_ms` away.
pub fn follow_target(
    lines: &[LyricLine],
    targets: &[f32],
    time_ms: i64,
    anticipation_ms: i64,
) -> Option<f32> {
    let index = current_line_index(lines, time_ms)?;
    let target = *targets.get(index)?;

    let (Some(next), Some(next_target)) = (lines.get(index + 1), targets.get(index + 1)) else {
        return Some(target);
    };
    let until_next = next.start_time.saturating_sub(time_ms);
    if anticipation_ms > 0 && until_next > 0 && until_next < anticipation_ms {
        let ratio = clamp01(1.0 - until_next as f32 / anticipation_ms as f32);
        return Some(lerp(target, *next_target, ratio));
    }
    Some(target)
}
