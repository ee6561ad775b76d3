//! Synced lyrics engine
//!
//! Parses line and word timed lyrics, wraps them into rows and produces a
//! per-frame display list with karaoke highlighting, auto-follow scrolling
//! and touch physics. Hosts feed it text, a viewport size, the playback
//! position and touch events, and receive seek requests back.

pub mod features;
pub mod utils;

pub use features::lyrics::engine::{
    LyricsEngine, LyricsEngineConfig, RenderFrame, RowPrimitive, ScrollMode, WordPaint,
};
pub use features::lyrics::parser::{LyricLine, LyricWord, VocalType, parse_lyrics};
pub use features::settings::Settings;
