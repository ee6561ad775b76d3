//! Lyrics parsing module
//!
//! Turns LRC / karaoke-tagged text into an ordered list of [`LyricLine`]s.
//! Parsing never fails: malformed lines and word tags are skipped.

mod lrc;
mod types;

pub use lrc::{parse_lrc, stringify_lrc, write_timestamp};
pub use types::*;

use std::path::Path;

/// Parse lyrics from string content
pub fn parse_lyrics(content: &str) -> Vec<LyricLine> {
    let lines = lrc::parse_lrc(content);
    tracing::debug!(
        "Parsed {} lyric lines ({} word-synced, {} background)",
        lines.len(),
        lines.iter().filter(|l| l.is_word_synced).count(),
        lines.iter().filter(|l| l.is_background).count()
    );
    lines
}

/// Parse lyrics from file
pub fn parse_lyrics_file(path: &Path) -> Option<Vec<LyricLine>> {
    let content = std::fs::read_to_string(path).ok()?;
    let lines = parse_lyrics(&content);
    if lines.is_empty() { None } else { Some(lines) }
}

/// Convert parsed lyrics back to tagged text
pub fn stringify_lyrics(lines: &[LyricLine]) -> String {
    lrc::stringify_lrc(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lrc() {
        let content = "[00:01.12]First line\n[00:05.00]Second line";
        let lines = parse_lyrics(content);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].start_time, 1120);
        assert_eq!(lines[0].end_time, 5000);
    }

    #[test]
    fn test_empty_content() {
        assert!(parse_lyrics("").is_empty());
        assert!(parse_lyrics("  \n\n ").is_empty());
    }

    #[test]
    fn test_parse_missing_file() {
        let path = std::env::temp_dir().join("synced-lyrics-does-not-exist.lrc");
        assert!(parse_lyrics_file(&path).is_none());
    }
}
