//! Text measurement using cosmic-text
//!
//! Layout only needs advance widths and a line height, so the engine talks
//! to a [`TextMeasure`] implementation instead of a concrete shaper.
//!
//! ## Caching
//!
//! Shaping is expensive, so widths are cached by:
//! - Text content
//! - Font size (rounded to avoid cache misses from floating point differences)
//!
//! The cache is dropped whenever the font changes.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared font system type
pub type SharedFontSystem = Arc<Mutex<FontSystem>>;

/// Line height relative to font size
const LINE_HEIGHT_RATIO: f32 = 1.4;

/// Cache size limit before the width cache is flushed
const MAX_CACHE_ENTRIES: usize = 1000;

/// Font family selectable by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontChoice {
    #[default]
    Default,
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
}

impl FontChoice {
    /// Get all font options in cycling order
    pub fn all() -> &'static [FontChoice] {
        &[
            Self::Default,
            Self::Serif,
            Self::SansSerif,
            Self::Monospace,
            Self::Cursive,
            Self::Fantasy,
        ]
    }

    /// Next font in cycling order, wrapping around
    pub fn next(self) -> Self {
        let all = Self::all();
        let index = all.iter().position(|f| *f == self).unwrap_or(0);
        all[(index + 1) % all.len()]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Serif => "Serif",
            Self::SansSerif => "Sans Serif",
            Self::Monospace => "Monospace",
            Self::Cursive => "Cursive",
            Self::Fantasy => "Casual",
        }
    }

    fn family(&self) -> Family<'static> {
        match self {
            Self::Default | Self::SansSerif => Family::SansSerif,
            Self::Serif => Family::Serif,
            Self::Monospace => Family::Monospace,
            Self::Cursive => Family::Cursive,
            Self::Fantasy => Family::Fantasy,
        }
    }
}

impl std::fmt::Display for FontChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Width and height source for layout
pub trait TextMeasure: Send {
    /// Advance width of `text` at `font_size` pixels
    fn measure(&self, text: &str, font_size: f32) -> f32;

    /// Height of one row of text at `font_size` pixels
    fn line_height(&self, font_size: f32) -> f32 {
        font_size * LINE_HEIGHT_RATIO
    }

    fn font(&self) -> FontChoice;

    /// Switch font family; cached widths become invalid
    fn set_font(&mut self, font: FontChoice);
}

/// Cache key for measured text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MeasureCacheKey {
    text: String,
    /// Font size multiplied by 100 and rounded
    font_size_x100: u32,
}

impl MeasureCacheKey {
    fn new(text: &str, font_size: f32) -> Self {
        Self {
            text: text.to_string(),
            font_size_x100: (font_size * 100.0).round() as u32,
        }
    }
}

/// Text shaper using cosmic-text
pub struct TextShaper {
    /// Shared font system
    font_system: SharedFontSystem,
    font: FontChoice,
    /// Cache for measured widths (text + font_size -> width)
    width_cache: Mutex<HashMap<MeasureCacheKey, f32>>,
}

impl TextShaper {
    /// Create a new text shaper sharing an existing font system
    ///
    /// The font system should be created once at startup and shared
    /// to avoid the expensive `FontSystem::new()` call.
    pub fn new(font_system: SharedFontSystem) -> Self {
        Self::with_font(font_system, FontChoice::default())
    }

    pub fn with_font(font_system: SharedFontSystem, font: FontChoice) -> Self {
        tracing::debug!("[TextShaper] Using font family: {}", font);
        Self {
            font_system,
            font,
            width_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Create a text shaper with its own font system (loads system fonts)
    pub fn with_system_fonts() -> Self {
        Self::new(Arc::new(Mutex::new(FontSystem::new())))
    }

    fn measure_uncached(&self, text: &str, font_size: f32) -> f32 {
        let mut font_system = self.font_system.lock();

        let metrics = Metrics::new(font_size, font_size * LINE_HEIGHT_RATIO);
        let mut buffer = Buffer::new(&mut font_system, metrics);
        buffer.set_size(&mut font_system, None, None);

        let attrs = Attrs::new().family(self.font.family()).weight(Weight::BOLD);
        buffer.set_text(&mut font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut font_system, false);

        buffer
            .layout_runs()
            .flat_map(|run| run.glyphs.iter())
            .map(|glyph| glyph.x + glyph.w)
            .fold(0.0f32, f32::max)
    }
}

impl TextMeasure for TextShaper {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }

        let key = MeasureCacheKey::new(text, font_size);
        if let Some(width) = self.width_cache.lock().get(&key) {
            return *width;
        }

        let width = self.measure_uncached(text, font_size);

        let mut cache = self.width_cache.lock();
        // Limit cache size to prevent memory bloat
        if cache.len() > MAX_CACHE_ENTRIES {
            cache.clear();
        }
        cache.insert(key, width);
        width
    }

    fn font(&self) -> FontChoice {
        self.font
    }

    fn set_font(&mut self, font: FontChoice) {
        if self.font != font {
            tracing::debug!("[TextShaper] Switching font family: {} -> {}", self.font, font);
            self.font = font;
            self.width_cache.lock().clear();
        }
    }
}

/// Fixed-advance measurement
///
/// Every character advances `advance_em * font_size`; wide (CJK) characters
/// count double. Used for terminal hosts and deterministic tests.
#[derive(Debug, Clone)]
pub struct MonospaceMeasure {
    advance_em: f32,
    font: FontChoice,
}

impl MonospaceMeasure {
    pub fn new(advance_em: f32) -> Self {
        Self {
            advance_em,
            font: FontChoice::Monospace,
        }
    }
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let cells: usize = text
            .chars()
            .map(|c| if is_cjk_char(c) || c == '\u{3000}' { 2 } else { 1 })
            .sum();
        cells as f32 * self.advance_em * font_size
    }

    fn font(&self) -> FontChoice {
        self.font
    }

    fn set_font(&mut self, font: FontChoice) {
        self.font = font;
    }
}

/// Check if a character is CJK
pub fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |  // CJK Unified Ideographs
        '\u{3400}'..='\u{4DBF}' |  // CJK Extension A
        '\u{20000}'..='\u{2A6DF}' | // CJK Extension B
        '\u{3040}'..='\u{309F}' |  // Hiragana
        '\u{30A0}'..='\u{30FF}' |  // Katakana
        '\u{AC00}'..='\u{D7AF}'    // Hangul Syllables
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_cycling_wraps() {
        let mut font = FontChoice::Default;
        for _ in 0..FontChoice::all().len() {
            font = font.next();
        }
        assert_eq!(font, FontChoice::Default);
        assert_eq!(FontChoice::Serif.next(), FontChoice::SansSerif);
        assert_eq!(FontChoice::Fantasy.display_name(), "Casual");
    }

    #[test]
    fn test_monospace_measure() {
        let measure = MonospaceMeasure::new(1.0);
        assert_eq!(measure.measure("abc ", 10.0), 40.0);
        assert_eq!(measure.measure("歌词", 10.0), 40.0);
        assert_eq!(measure.measure("", 10.0), 0.0);
        assert_eq!(measure.line_height(10.0), 14.0);
    }

    /// Shaping with whatever system fonts exist must not panic and must be
    /// stable across calls (second call served from cache)
    #[test]
    fn test_text_shaper_cache_is_stable() {
        let shaper = TextShaper::with_system_fonts();
        let first = shaper.measure("Hello world", 35.2);
        let second = shaper.measure("Hello world", 35.2);
        assert_eq!(first, second);
        assert!(first >= 0.0);
        assert_eq!(shaper.measure("", 35.2), 0.0);
    }

    #[test]
    fn test_text_shaper_font_switch_clears_cache() {
        let mut shaper = TextShaper::with_system_fonts();
        shaper.measure("Lyrics", 20.0);
        assert!(!shaper.width_cache.lock().is_empty());
        shaper.set_font(FontChoice::Serif);
        assert!(shaper.width_cache.lock().is_empty());
        assert_eq!(shaper.font(), FontChoice::Serif);
    }
}
