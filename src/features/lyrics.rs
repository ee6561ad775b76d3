//! Lyrics module - parsing and rendering
//!
//! - `parser`: LRC / karaoke-tagged lyrics parsing
//! - `engine`: layout, scroll focus and per-frame karaoke animation

pub mod engine;
pub mod parser;

// Re-export commonly used items
pub use parser::*;
