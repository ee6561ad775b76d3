//! Synced lyrics engine
//!
//! Drives time-synchronized lyrics display: parsed lines are laid out once
//! per size/font change, and every frame the engine advances scrolling and
//! builds a display list from the external playback clock.
//!
//! ## Key Components
//!
//! - `LyricsEngine`: Main engine owning lines, layout, scroll and clock state
//! - `layout`: Greedy row wrapping and center/total height computation
//! - `focus`: Scroll targets with duet overlap merging
//! - `ScrollPhysics`: Auto-follow, drag, fling and cooldown state machine
//! - `LineAnimationManager`: Focus ratios, scale and fade per line
//! - `render`: Display list of rows and karaoke word paints
//! - `TextShaper`: cosmic-text based text measurement

// Core modules
pub mod clock;
pub mod focus;
pub mod gesture;
pub mod layout;
pub mod line_animation;
pub mod physics;
pub mod render;
pub mod text_shaper;
pub mod types;
pub mod word_splitter;

// Re-exports for convenience
pub use clock::PlaybackClock;
pub use gesture::{TouchGesture, TouchRelease, VelocityTracker};
pub use layout::{LayoutMetrics, LyricsLayout, WrappedLine};
pub use line_animation::{LineAnimationManager, LineStyle};
pub use physics::{ScrollMode, ScrollPhysics};
pub use text_shaper::{FontChoice, MonospaceMeasure, SharedFontSystem, TextMeasure, TextShaper};
pub use types::{
    BackgroundTreatment, Bloom, RenderFrame, RowPrimitive, WordPaint, WordPrimitive,
};

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::features::lyrics::parser::{LyricLine, parse_lyrics};
use crate::utils::Color;

/// Frame delta used for the first frame and capped for long stalls
const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;
const MAX_FRAME_DT: f32 = 0.1;

/// Configuration for the lyrics engine
///
/// Times are in milliseconds, distances in logical pixels. Every field has a
/// default, so partial settings files deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsEngineConfig {
    // === Font Size ===
    /// Font size of an inactive line before scaling
    pub base_font_size: f32,
    /// Scale of the focused line; text is measured at `base * layout_scale`
    pub layout_scale: f32,
    /// Scale of an unfocused line
    pub inactive_scale: f32,

    // === Layout ===
    /// Horizontal padding on both sides
    pub padding: f32,
    /// Gap between rows of one wrapped line
    pub wrapped_line_gap: f32,
    /// Gap between different lyric lines
    pub lyric_gap: f32,
    /// Row height factor of background vocal lines
    pub background_line_height_factor: f32,

    // === Timing ===
    /// Window before a line starts in which it ramps up and pre-scrolls
    pub anticipation_ms: i64,
    /// Window after a line ends in which it ramps down
    pub decay_ms: i64,
    /// Final share of a background line's duration over which it fades out
    pub background_fade_fraction: f32,
    /// How far the clock may run ahead of the last reported position
    pub max_extrapolation_ms: i64,
    /// Added to every reported position
    pub time_offset_ms: i64,

    // === Scrolling ===
    /// Auto-follow interpolation factor per 60 fps tick
    pub scroll_damping: f32,
    /// Distance under which auto-follow snaps to its target
    pub snap_epsilon: f32,
    /// Delay before auto-follow resumes after user scrolling
    pub resume_delay_ms: u64,
    /// Release velocity (px/s) above which a fling starts
    pub min_fling_velocity: f32,
    pub max_fling_velocity: f32,
    /// Velocity factor per 60 fps tick while flinging
    pub fling_friction: f32,
    /// Velocity (px/s) under which a fling settles
    pub fling_stop_velocity: f32,

    // === Gestures ===
    /// Travel under which a touch still counts as a tap
    pub touch_slop: f32,
    pub tap_timeout_ms: u64,
    /// Extra vertical hit area around rows for taps
    pub tap_padding: f32,

    // === Rendering ===
    /// Rows further than this outside the viewport are culled
    pub overscan_px: f32,
    /// Width of the soft karaoke fill edge
    pub edge_width: f32,
    /// Word progress at which the bloom starts fading
    pub bloom_fade_start: f32,
    pub bloom_radius: f32,
    /// Alpha of unfocused text
    pub dim_alpha: f32,
    pub background_scale: f32,
    pub background_opacity: f32,
    pub background_stretch_x: f32,
    pub background_blur_radius: f32,
    /// Color of the lead voice
    pub primary_color: Color,
    /// Color of the second voice in duets
    pub secondary_color: Color,
}

impl Default for LyricsEngineConfig {
    fn default() -> Self {
        Self {
            // Font Size
            base_font_size: 32.0,
            layout_scale: 1.1,
            inactive_scale: 0.9,

            // Layout
            padding: 48.0,
            wrapped_line_gap: 10.0,
            lyric_gap: 60.0,
            background_line_height_factor: 0.75,

            // Timing
            anticipation_ms: 600,
            decay_ms: 400,
            background_fade_fraction: 0.1,
            max_extrapolation_ms: 250,
            time_offset_ms: 0,

            // Scrolling
            scroll_damping: 0.08,
            snap_epsilon: 0.5,
            resume_delay_ms: 2500,
            min_fling_velocity: 50.0,
            max_fling_velocity: 8000.0,
            fling_friction: 0.95,
            fling_stop_velocity: 20.0,

            // Gestures
            touch_slop: 8.0,
            tap_timeout_ms: 300,
            tap_padding: 30.0,

            // Rendering
            overscan_px: 300.0,
            edge_width: 120.0,
            bloom_fade_start: 0.8,
            bloom_radius: 25.0,
            dim_alpha: 0.4,
            background_scale: 0.75,
            background_opacity: 0.4,
            background_stretch_x: 1.1,
            background_blur_radius: 4.0,
            primary_color: Color::WHITE,
            secondary_color: Color::from_rgb8(0x00, 0xE5, 0xFF),
        }
    }
}

impl LyricsEngineConfig {
    /// Font size used for measurement and layout
    pub fn layout_font_size(&self) -> f32 {
        self.base_font_size * self.layout_scale
    }
}

/// Receives seek requests in milliseconds
pub type SeekListener = Box<dyn FnMut(i64) + Send>;

/// Main lyrics engine - manages lyrics, layout, scrolling and rendering
pub struct LyricsEngine {
    /// Configuration
    config: LyricsEngineConfig,
    /// Width and line height source
    measure: Box<dyn TextMeasure>,
    /// Parsed lines, sorted by start time
    lines: Vec<LyricLine>,
    /// Rows and per-line centers for the current width
    layout: LyricsLayout,
    /// Per-line scroll targets (content-space y to center on)
    scroll_targets: Vec<f32>,
    /// Per-line focus, scale and fade
    animations: LineAnimationManager,
    physics: ScrollPhysics,
    clock: PlaybackClock,
    /// Touch in progress
    gesture: Option<TouchGesture>,
    seek_listener: Option<SeekListener>,
    viewport_width: f32,
    viewport_height: f32,
    /// Jump to the focus target once a layout exists
    pending_scroll_reset: bool,
    last_frame: Option<Instant>,
}

impl LyricsEngine {
    /// Create a new engine measuring text with `measure`
    pub fn new(config: LyricsEngineConfig, measure: Box<dyn TextMeasure>) -> Self {
        Self {
            physics: ScrollPhysics::new(&config),
            clock: PlaybackClock::new(config.max_extrapolation_ms, config.time_offset_ms),
            config,
            measure,
            lines: Vec::new(),
            layout: LyricsLayout::default(),
            scroll_targets: Vec::new(),
            animations: LineAnimationManager::new(),
            gesture: None,
            seek_listener: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
            pending_scroll_reset: false,
            last_frame: None,
        }
    }

    /// Create an engine measuring with cosmic-text and the system fonts
    ///
    /// Loading system fonts is slow; hosts that already own a `FontSystem`
    /// should pass a [`TextShaper`] built from it to [`LyricsEngine::new`].
    pub fn with_system_fonts(config: LyricsEngineConfig) -> Self {
        Self::new(config, Box::new(TextShaper::with_system_fonts()))
    }

    /// Register the callback receiving seek requests
    pub fn set_seek_listener(&mut self, listener: impl FnMut(i64) + Send + 'static) {
        self.seek_listener = Some(Box::new(listener));
    }

    // ------------------------------------------------------------------
    // Lyrics & layout
    // ------------------------------------------------------------------

    /// Replace the lyrics; `None` or blank text clears the display
    pub fn set_lyrics(&mut self, raw: Option<&str>) {
        match raw {
            Some(text) if !text.trim().is_empty() => self.set_lines(parse_lyrics(text)),
            _ => self.clear(),
        }
    }

    /// Replace the lyrics with already parsed lines
    pub fn set_lines(&mut self, lines: Vec<LyricLine>) {
        tracing::info!("Loaded {} lyric lines", lines.len());
        self.lines = lines;
        self.animations.clear();
        self.gesture = None;
        self.pending_scroll_reset = true;
        self.relayout();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.animations.clear();
        self.gesture = None;
        self.pending_scroll_reset = false;
        self.relayout();
        self.physics.reset(0.0);
    }

    /// Set the drawing surface size; unchanged sizes are a no-op
    pub fn resize(&mut self, width: f32, height: f32) {
        if width == self.viewport_width && height == self.viewport_height {
            return;
        }
        tracing::debug!("Lyrics viewport resized to {}x{}", width, height);
        self.viewport_width = width;
        self.viewport_height = height;
        self.relayout();
    }

    /// Rebuild layout, scroll targets and scroll bounds
    fn relayout(&mut self) {
        let font_size = self.config.layout_font_size();
        layout::measure_words(&mut self.lines, self.measure.as_ref(), font_size);

        let metrics = LayoutMetrics::new(&self.config, self.measure.as_ref(), self.viewport_width);
        self.layout = layout::layout_lines(&self.lines, &metrics);
        self.scroll_targets = focus::scroll_targets(&self.lines, &self.layout.center_y);

        let half = self.viewport_height / 2.0;
        self.physics
            .set_bounds(-half, self.layout.total_height - half);

        if self.pending_scroll_reset && !self.layout.is_empty() {
            self.pending_scroll_reset = false;
            let center = self
                .current_scroll_target()
                .or_else(|| self.scroll_targets.first().copied())
                .unwrap_or(0.0);
            self.physics.reset(center - half);
        }
    }

    // ------------------------------------------------------------------
    // Time & font
    // ------------------------------------------------------------------

    /// Report the playback position
    pub fn update_time(&mut self, position_ms: i64) {
        self.update_time_at(position_ms, Instant::now());
    }

    pub fn update_time_at(&mut self, position_ms: i64, now: Instant) {
        self.clock.report(position_ms, now);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.clock.set_playing(playing, Instant::now());
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    /// Switch font family and relayout with fresh measurements
    pub fn set_font(&mut self, font: FontChoice) {
        tracing::debug!("Lyrics font set to {}", font);
        self.measure.set_font(font);
        for line in &mut self.lines {
            line.clear_widths();
        }
        self.relayout();
    }

    /// Advance to the next font family and return it
    pub fn cycle_font(&mut self) -> FontChoice {
        let font = self.measure.font().next();
        self.set_font(font);
        font
    }

    pub fn font(&self) -> FontChoice {
        self.measure.font()
    }

    // ------------------------------------------------------------------
    // Touch input
    // ------------------------------------------------------------------

    pub fn touch_down(&mut self, y: f32, now: Instant) {
        self.gesture = Some(TouchGesture::begin(y, now));
        self.physics.touch_down();
    }

    pub fn touch_move(&mut self, y: f32, now: Instant) {
        if let Some(gesture) = self.gesture.as_mut() {
            let delta = gesture.move_to(y, now);
            self.physics.drag_by(delta);
        }
    }

    /// Finger up; returns the seek position when the gesture was a tap on a
    /// timed line
    pub fn touch_up(&mut self, y: f32, now: Instant) -> Option<i64> {
        let gesture = self.gesture.take()?;
        let touch_slop = self.config.touch_slop;
        let tap_timeout = Duration::from_millis(self.config.tap_timeout_ms);
        match gesture.release(y, now, touch_slop, tap_timeout) {
            TouchRelease::Tap { y } => self.tap(y, now),
            TouchRelease::Drag { delta, velocity } => {
                self.physics.drag_by(delta);
                self.physics.release(velocity, now);
                None
            }
        }
    }

    /// Gesture aborted by the host
    pub fn touch_cancel(&mut self, now: Instant) {
        if self.gesture.take().is_some() {
            self.physics.release(0.0, now);
        }
    }

    /// Tap at screen-space `y`
    ///
    /// A tap on a timed line seeks to its start and returns to auto-follow
    /// right away. Any other tap behaves like a release without velocity.
    pub fn tap(&mut self, y: f32, now: Instant) -> Option<i64> {
        let content_y = self.physics.position() + y;
        let start_time = self
            .layout
            .row_at(content_y, self.config.tap_padding)
            .and_then(|row| self.lines.get(row.line_index))
            .filter(|line| !line.is_untimed())
            .map(|line| line.start_time);

        let Some(start_time) = start_time else {
            self.physics.release(0.0, now);
            return None;
        };

        tracing::info!("Seek requested to {} ms", start_time);
        self.physics.tap();
        if let Some(listener) = self.seek_listener.as_mut() {
            listener(start_time);
        }
        Some(start_time)
    }

    /// Fling detected by the host with a finger velocity in px/s
    pub fn fling(&mut self, velocity: f32, now: Instant) {
        self.gesture = None;
        self.physics.release(velocity, now);
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Advance animation state to `now` and build the display list
    pub fn frame(&mut self, now: Instant) -> RenderFrame {
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(DEFAULT_FRAME_DT)
            .min(MAX_FRAME_DT);
        self.last_frame = Some(now);

        if self.layout.is_empty() {
            return RenderFrame::empty(
                self.viewport_width,
                self.viewport_height,
                self.physics.mode(),
            );
        }

        let time_ms = self.clock.position_at(now);
        let lines_animating =
            self.animations
                .update(&self.lines, &self.layout, time_ms, &self.config);

        let half = self.viewport_height / 2.0;
        let follow = self.scroll_target_at(time_ms).map(|center| center - half);
        let scroll_animating = self.physics.update(dt, now, follow);

        let ctx = render::RenderContext {
            lines: &self.lines,
            layout: &self.layout,
            animations: &self.animations,
            config: &self.config,
            time_ms,
            scroll_y: self.physics.position(),
            viewport_height: self.viewport_height,
        };
        let (rows, rows_animating) = render::render_rows(&ctx);

        let mode = self.physics.mode();
        let user_scrolling = matches!(
            mode,
            ScrollMode::Flinging | ScrollMode::CooldownPendingAutoFollow
        );

        RenderFrame {
            scroll_y: self.physics.position(),
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            time_ms,
            focused_line: self.focused_line_at(time_ms),
            scroll_mode: mode,
            rows,
            needs_redraw: lines_animating
                || scroll_animating
                || rows_animating
                || user_scrolling
                || self.clock.is_playing(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Plain-text lyrics have no timing to follow
    fn is_untimed(&self) -> bool {
        self.lines.iter().all(LyricLine::is_untimed)
    }

    fn focused_line_at(&self, time_ms: i64) -> Option<usize> {
        if self.is_untimed() {
            return None;
        }
        focus::current_line_index(&self.lines, time_ms)
    }

    fn scroll_target_at(&self, time_ms: i64) -> Option<f32> {
        if self.is_untimed() {
            return None;
        }
        focus::follow_target(
            &self.lines,
            &self.scroll_targets,
            time_ms,
            self.config.anticipation_ms,
        )
    }

    /// Last line started at the last reported position
    pub fn focused_line(&self) -> Option<usize> {
        self.focused_line_at(self.clock.reported_position())
    }

    /// Content-space y auto-follow centers on at the last reported position
    pub fn current_scroll_target(&self) -> Option<f32> {
        self.scroll_target_at(self.clock.reported_position())
    }

    /// Focus ratio of line `index` at the last reported position
    pub fn focus_ratio(&self, index: usize) -> f32 {
        let Some(line) = self.lines.get(index) else {
            return 0.0;
        };
        let next_start = self.lines.get(index + 1).map(|next| next.start_time);
        line_animation::focus_ratio(
            line,
            next_start,
            self.clock.reported_position(),
            self.config.anticipation_ms,
            self.config.decay_ms,
        )
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn layout(&self) -> &LyricsLayout {
        &self.layout
    }

    pub fn scroll_targets(&self) -> &[f32] {
        &self.scroll_targets
    }

    pub fn scroll_mode(&self) -> ScrollMode {
        self.physics.mode()
    }

    /// Content-space y of the viewport top
    pub fn scroll_y(&self) -> f32 {
        self.physics.position()
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.viewport_width, self.viewport_height)
    }

    /// Get the current configuration
    pub fn config(&self) -> &LyricsEngineConfig {
        &self.config
    }

    /// Update configuration at runtime
    pub fn set_config(&mut self, config: LyricsEngineConfig) {
        let remeasure = config.layout_font_size() != self.config.layout_font_size();
        self.physics.apply_config(&config);
        self.clock.set_offset(config.time_offset_ms);
        self.clock.set_max_extrapolation(config.max_extrapolation_ms);
        self.config = config;
        if remeasure {
            for line in &mut self.lines {
                line.clear_widths();
            }
        }
        self.relayout();
    }
}
