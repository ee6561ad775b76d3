//! Feature modules
//!
//! Each feature module contains the core logic for a specific functionality.

pub mod lyrics;
pub mod settings;

pub use lyrics::engine::{FontChoice, LyricsEngine, LyricsEngineConfig};
pub use settings::{DisplaySettings, Settings, SettingsError};
