//! Lyrics data types
//!
//! Times are integer milliseconds. A line whose start is
//! [`LyricLine::UNTIMED`] carries no timing and is always shown as active.

use serde::{Deserialize, Serialize};

/// Which singer a line belongs to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VocalType {
    /// Lead voice (`v1:` or no prefix)
    #[default]
    Primary,
    /// Second voice in a duet (`v2:`)
    Secondary,
}

/// A single timed fragment of a lyric line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricWord {
    /// Highlight start in milliseconds
    pub timestamp: i64,
    /// Fragment text, trailing whitespace included
    pub text: String,
    /// Measured width at the layout font size
    #[serde(skip)]
    pub display_width: Option<f32>,
}

impl LyricWord {
    pub fn new(timestamp: i64, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
            display_width: None,
        }
    }

    /// Check if the word is empty (whitespace only)
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Width cache, 0.0 when not yet measured
    pub fn width(&self) -> f32 {
        self.display_width.unwrap_or(0.0)
    }

    pub fn clear_width(&mut self) {
        self.display_width = None;
    }
}

/// A single line of lyrics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    /// Start time in milliseconds, or [`LyricLine::UNTIMED`]
    pub start_time: i64,
    /// End time in milliseconds
    pub end_time: i64,
    #[serde(default)]
    pub vocal_type: VocalType,
    /// Background (ad-lib) vocal line
    #[serde(default, rename = "isBG")]
    pub is_background: bool,
    /// Whether the words carry their own timestamps
    #[serde(default)]
    pub is_word_synced: bool,
    pub words: Vec<LyricWord>,
}

impl LyricLine {
    /// Start time of a plain-text line
    pub const UNTIMED: i64 = -1;

    /// Fallback duration for the last line
    pub const DEFAULT_DURATION: i64 = 3000;

    pub fn new(start_time: i64) -> Self {
        Self {
            start_time,
            ..Default::default()
        }
    }

    pub fn is_untimed(&self) -> bool {
        self.start_time == Self::UNTIMED
    }

    /// Get the full line text by joining all words
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }

    /// Check if the line is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() || self.words.iter().all(|w| w.is_empty())
    }

    /// `start <= t <= end`
    pub fn is_active_at(&self, time_ms: i64) -> bool {
        time_ms >= self.start_time && time_ms <= self.end_time
    }

    pub fn is_past_at(&self, time_ms: i64) -> bool {
        time_ms > self.end_time
    }

    pub fn duration(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// End of the highlight window of word `index`: the next word's
    /// timestamp, or the line end for the last word
    pub fn word_end(&self, index: usize) -> i64 {
        self.words
            .get(index + 1)
            .map(|w| w.timestamp)
            .unwrap_or(self.end_time)
    }

    /// Drop every cached word width
    pub fn clear_widths(&mut self) {
        for word in &mut self.words {
            word.clear_width();
        }
    }
}

/// Sort lines by `(start_time, vocal_type)` and back-fill missing end times
///
/// Untimed lines sort first. A line whose `end_time` is unset (`<= start`)
/// takes the start of the next line with a strictly later start, or
/// `start + DEFAULT_DURATION` when it is the last one.
pub fn process_lyrics(lines: &mut [LyricLine]) {
    lines.sort_by_key(|line| (line.start_time, line.vocal_type));

    let len = lines.len();
    for i in 0..len {
        let current = &lines[i];
        if current.is_untimed() || current.end_time > current.start_time {
            continue;
        }
        let start = current.start_time;
        let next_start = lines[i + 1..]
            .iter()
            .map(|line| line.start_time)
            .find(|&s| s > start);
        lines[i].end_time =
            next_start.unwrap_or(start.saturating_add(LyricLine::DEFAULT_DURATION));
    }
}
