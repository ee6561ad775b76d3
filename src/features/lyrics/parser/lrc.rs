//! LRC / karaoke-tagged lyrics parser
//!
//! Supports the common `[mm:ss.xx]text` format plus:
//! - `v1:` / `v2:` voice prefixes after the line tag
//! - `<mm:ss.xxx>word` per-word tags, with a trailing empty tag as the line end
//! - `[bg: <mm:ss.xxx>word...]` background vocal lines
//! - `[offset:N]` global offset, other metadata tags are skipped

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{LyricLine, LyricWord, VocalType, process_lyrics};

static WORD_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(\d+):(\d{1,2})[.:](\d{1,3})>([^<]*)").unwrap());

static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Za-z#]+):([^\]]*)\]\s*$").unwrap());

static BACKGROUND_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[bg:\s*(.*?)\]?\s*$").unwrap());

static VOICE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[^\s<:\[\]]+:").unwrap());

/// Convert minute/second/fraction digits to milliseconds
///
/// One fractional digit is tenths, two are hundredths, three are milliseconds.
fn timestamp_ms(min: &str, sec: &str, frac: &str) -> Option<i64> {
    let min: i64 = min.parse().ok()?;
    let sec: i64 = sec.parse().ok()?;
    let mut ms: i64 = frac.parse().ok()?;
    match frac.len() {
        1 => ms *= 100,
        2 => ms *= 10,
        3 => {}
        _ => return None,
    }
    compose_ms(min, sec, ms)
}

/// `min * 60_000 + sec * 1000 + ms`, `None` on overflow
fn compose_ms(min: i64, sec: i64, ms: i64) -> Option<i64> {
    min.checked_mul(60_000)?
        .checked_add(sec.checked_mul(1000)?)?
        .checked_add(ms)
}

/// Parse timestamp from LRC format: [mm:ss.xx] or [mm:ss:xx]
///
/// Returns the number of bytes consumed and the time in milliseconds.
fn parse_time(src: &str) -> Option<(usize, i64)> {
    if !src.starts_with('[') {
        return None;
    }

    let end_bracket = src.find(']')?;
    let time_str = &src[1..end_bracket];

    // Skip metadata tags like [ar:Artist], [bg: ...]
    if time_str.chars().next().is_some_and(|c| c.is_alphabetic()) {
        return None;
    }

    let parts: Vec<&str> = time_str.split([':', '.']).collect();
    let time_ms = match parts.as_slice() {
        [min, sec] => {
            let min: i64 = min.parse().ok()?;
            let sec: i64 = sec.parse().ok()?;
            compose_ms(min, sec, 0)?
        }
        [min, sec, frac] => timestamp_ms(min, sec, frac)?,
        _ => return None,
    };

    Some((end_bracket + 1, time_ms))
}

/// Split an optional voice prefix off the line content
fn split_voice(content: &str) -> (VocalType, &str) {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix("v2:") {
        return (VocalType::Secondary, rest);
    }
    if let Some(rest) = trimmed.strip_prefix("v1:") {
        return (VocalType::Primary, rest);
    }
    match VOICE_PREFIX.find(content) {
        Some(m) => (VocalType::Primary, &content[m.end()..]),
        None => (VocalType::Primary, content),
    }
}

/// Collect `<ts>text` pairs; a trailing empty pair becomes the line end
fn parse_word_tags(line: &mut LyricLine, body: &str) {
    line.words = WORD_TAG
        .captures_iter(body)
        .filter_map(|caps| {
            let ts = timestamp_ms(&caps[1], &caps[2], &caps[3])?;
            Some(LyricWord::new(ts, &caps[4]))
        })
        .collect();

    if line.words.is_empty() {
        return;
    }
    line.is_word_synced = true;

    if line.words.last().is_some_and(LyricWord::is_empty) {
        if let Some(marker) = line.words.pop() {
            line.end_time = marker.timestamp;
        }
    }
}

/// Split untimed content on spaces, each piece keeps a trailing space
fn split_plain_words(body: &str, timestamp: i64) -> Vec<LyricWord> {
    let mut words: Vec<LyricWord> = body
        .split(' ')
        .filter(|piece| !piece.trim().is_empty())
        .map(|piece| LyricWord::new(timestamp, format!("{} ", piece.trim())))
        .collect();

    // Keep a single unbroken run when there was nothing to split on
    if words.is_empty() && !body.trim().is_empty() {
        words.push(LyricWord::new(timestamp, body.trim()));
    }
    words
}

/// Build a line from the text that follows the line tag
fn parse_content(start_time: i64, content: &str) -> Option<LyricLine> {
    let (vocal_type, body) = split_voice(content);

    let mut line = LyricLine::new(start_time);
    line.vocal_type = vocal_type;

    parse_word_tags(&mut line, body);
    if !line.is_word_synced {
        line.words = split_plain_words(body, start_time);
    }

    (!line.words.is_empty()).then_some(line)
}

/// Parse a single LRC line, which may have multiple timestamps
///
/// `saw_timed` is set once any line tag parses, even when the line is
/// later dropped for having no words.
fn parse_line(line: &str, saw_timed: &mut bool) -> Vec<LyricLine> {
    let mut timestamps = Vec::new();
    let mut pos = 0;

    // Extract all timestamps at the beginning
    while pos < line.len() {
        match parse_time(&line[pos..]) {
            Some((consumed, time)) => {
                timestamps.push(time);
                pos += consumed;
            }
            None => break,
        }
    }

    if timestamps.is_empty() {
        return Vec::new();
    }
    *saw_timed = true;

    let Some(template) = parse_content(timestamps[0], &line[pos..]) else {
        return Vec::new();
    };

    timestamps
        .into_iter()
        .map(|start_time| {
            let mut parsed = template.clone();
            if !parsed.is_word_synced {
                for word in &mut parsed.words {
                    word.timestamp = start_time;
                }
            }
            parsed.start_time = start_time;
            parsed
        })
        .collect()
}

/// Parse a `[bg: ...]` background vocal line
///
/// The voice is inherited from the line it accompanies.
fn parse_background_line(line: &str, previous: Option<&LyricLine>) -> Option<LyricLine> {
    let caps = BACKGROUND_LINE.captures(line)?;
    let mut parsed = LyricLine::new(0);
    parse_word_tags(&mut parsed, &caps[1]);

    let first = parsed.words.first()?.timestamp;
    parsed.start_time = first;
    parsed.is_background = true;
    parsed.vocal_type = previous.map(|p| p.vocal_type).unwrap_or_default();
    Some(parsed)
}

/// `[offset:+N]` in milliseconds
fn parse_offset(line: &str) -> Option<i64> {
    let caps = META_TAG.captures(line)?;
    if !caps[1].eq_ignore_ascii_case("offset") {
        return None;
    }
    caps[2].trim().trim_start_matches('+').parse().ok()
}

fn is_metadata(line: &str) -> bool {
    META_TAG.is_match(line)
}

/// Shift every timestamp earlier by `offset` milliseconds, clamped at zero
fn apply_offset(lines: &mut [LyricLine], offset: i64) {
    let shift = |t: i64| t.saturating_sub(offset).max(0);
    for line in lines.iter_mut() {
        line.start_time = shift(line.start_time);
        if line.end_time > 0 {
            line.end_time = shift(line.end_time);
        }
        for word in &mut line.words {
            word.timestamp = shift(word.timestamp);
        }
    }
}

/// Treat every non-blank line as an untimed line
fn parse_plain(src: &str) -> Vec<LyricLine> {
    src.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_metadata(line))
        .filter_map(|text| {
            let mut line = LyricLine::new(LyricLine::UNTIMED);
            line.words = split_plain_words(text, LyricLine::UNTIMED);
            (!line.words.is_empty()).then_some(line)
        })
        .collect()
}

/// Parse LRC content into lyric lines
pub fn parse_lrc(src: &str) -> Vec<LyricLine> {
    let lines = src.lines();
    let mut result: Vec<LyricLine> =
        Vec::with_capacity(lines.size_hint().1.unwrap_or(128).min(1024));
    let mut offset = 0;
    let mut saw_timed = false;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if BACKGROUND_LINE.is_match(line) {
            saw_timed = true;
            if let Some(bg) = parse_background_line(line, result.last()) {
                result.push(bg);
            }
            continue;
        }
        if let Some(ms) = parse_offset(line) {
            offset = ms;
            continue;
        }
        result.extend(parse_line(line, &mut saw_timed));
    }

    if !saw_timed {
        return parse_plain(src);
    }

    if offset != 0 {
        apply_offset(&mut result, offset);
    }
    process_lyrics(&mut result);

    result
}

/// Write timestamp in LRC format
pub fn write_timestamp(result: &mut String, time: i64, open: char, close: char) {
    let time = time.max(0);
    let ms = time % 1000;
    let sec = (time / 1000) % 60;
    let min = time / 60_000;
    result.push(open);
    result.push_str(&format!("{:02}:{:02}.{:03}", min, sec, ms));
    result.push(close);
}

fn write_word_tags(result: &mut String, line: &LyricLine) {
    for word in &line.words {
        write_timestamp(result, word.timestamp, '<', '>');
        result.push_str(&word.text);
    }
    write_timestamp(result, line.end_time, '<', '>');
}

/// Convert lyrics back to tagged LRC text
pub fn stringify_lrc(lines: &[LyricLine]) -> String {
    let capacity: usize = lines
        .iter()
        .map(|x| x.words.iter().map(|y| y.text.len() + 11).sum::<usize>() + 16)
        .sum();
    let mut result = String::with_capacity(capacity);

    for line in lines {
        if line.words.is_empty() {
            continue;
        }
        if line.is_untimed() {
            result.push_str(line.text().trim_end());
        } else if line.is_background && line.is_word_synced {
            result.push_str("[bg: ");
            write_word_tags(&mut result, line);
            result.push(']');
        } else {
            write_timestamp(&mut result, line.start_time, '[', ']');
            if line.vocal_type == VocalType::Secondary {
                result.push_str("v2:");
            }
            if line.is_word_synced {
                write_word_tags(&mut result, line);
            } else {
                result.push_str(line.text().trim_end());
            }
        }
        result.push('\n');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_precisions() {
        assert_eq!(parse_time("[00:01.5]"), Some((9, 1500)));
        assert_eq!(parse_time("[00:01.50]"), Some((10, 1500)));
        assert_eq!(parse_time("[00:01.500]"), Some((11, 1500)));
        assert_eq!(parse_time("[01:02]"), Some((7, 62_000)));
        assert_eq!(parse_time("[ar:Someone]"), None);
        assert_eq!(parse_time("[00:01.5000]"), None);
    }

    #[test]
    fn test_end_marker_consumed() {
        let lines = parse_lrc("[00:01.00]<00:01.00>Hello <00:02.00>");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].words.len(), 1);
        assert_eq!(lines[0].words[0].text, "Hello ");
        assert_eq!(lines[0].words[0].timestamp, 1000);
        assert_eq!(lines[0].end_time, 2000);
        assert!(lines[0].is_word_synced);
    }

    #[test]
    fn test_voice_prefixes() {
        let lines = parse_lrc(
            "[00:01.00]v2:<00:01.00>Hi<00:01.50>\n\
             [00:01.00]v1:<00:01.00>Yo<00:01.50>\n\
             [00:03.00]Chorus:<00:03.00>La<00:03.50>",
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].vocal_type, VocalType::Primary);
        assert_eq!(lines[0].words[0].text, "Yo");
        assert_eq!(lines[1].vocal_type, VocalType::Secondary);
        assert_eq!(lines[1].words[0].text, "Hi");
        assert_eq!(lines[2].vocal_type, VocalType::Primary);
        assert_eq!(lines[2].words[0].text, "La");
    }

    #[test]
    fn test_plain_lines_split_on_spaces() {
        let lines = parse_lrc("[00:10.00]one two  three\n[00:12.00]next");
        assert_eq!(lines.len(), 2);
        let first = &lines[0];
        assert!(!first.is_word_synced);
        let texts: Vec<&str> = first.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["one ", "two ", "three "]);
        assert!(first.words.iter().all(|w| w.timestamp == 10_000));
        assert_eq!(first.end_time, 12_000);
        assert_eq!(lines[1].end_time, 15_000);
    }

    #[test]
    fn test_untagged_and_empty_lines_discarded() {
        let lines = parse_lrc("[ti:Song]\nnot timed\n[00:01.00]\n[00:02.00]kept");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].start_time, 2000);
    }

    #[test]
    fn test_plain_text_fallback() {
        let lines = parse_lrc("first line\n\nsecond");
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(LyricLine::is_untimed));
        assert_eq!(lines[1].text(), "second ");
    }

    #[test]
    fn test_multiple_line_tags() {
        let lines = parse_lrc("[00:01.00][00:20.00]again\n[00:05.00]middle");
        let starts: Vec<i64> = lines.iter().map(|l| l.start_time).collect();
        assert_eq!(starts, vec![1000, 5000, 20_000]);
        assert_eq!(lines[2].words[0].timestamp, 20_000);
        assert_eq!(lines[2].text(), "again ");
    }

    #[test]
    fn test_background_line() {
        let lines = parse_lrc(
            "[00:10.00]v2:<00:10.00>Lead <00:11.00>line<00:12.00>\n\
             [bg: <00:10.50>ooh <00:11.20>ahh<00:11.90>]",
        );
        assert_eq!(lines.len(), 2);
        let bg = &lines[1];
        assert!(bg.is_background);
        assert_eq!(bg.start_time, 10_500);
        assert_eq!(bg.end_time, 11_900);
        assert_eq!(bg.vocal_type, VocalType::Secondary);
        assert_eq!(bg.text(), "ooh ahh");
    }

    #[test]
    fn test_offset_tag() {
        let lines = parse_lrc("[offset:+500]\n[00:02.00]<00:02.00>a<00:03.00>\n[00:00.20]b");
        assert_eq!(lines[0].start_time, 0);
        assert_eq!(lines[1].start_time, 1500);
        assert_eq!(lines[1].words[0].timestamp, 1500);
        assert_eq!(lines[1].end_time, 2500);
    }

    #[test]
    fn test_start_times_non_decreasing() {
        let lines = parse_lrc("[00:09.00]c\n[00:01.00]a\n[00:05.00]b\n[00:03.00]ab");
        assert!(lines.windows(2).all(|w| w[0].start_time <= w[1].start_time));
    }

    #[test]
    fn test_malformed_word_tags_skipped() {
        let lines = parse_lrc("[00:01.00]<00:01.00>ok <xx:yy>bad <00:02.00>fine<00:03.00>");
        assert_eq!(lines.len(), 1);
        let texts: Vec<&str> = lines[0].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["ok ", "fine"]);
    }

    #[test]
    fn test_wordless_timed_lines_do_not_fall_back_to_plain() {
        assert!(parse_lrc("[00:01.00]\n[00:02.00]<00:02.00>").is_empty());
        assert!(parse_lrc("[00:01.00]\n[bg: ]").is_empty());
    }

    #[test]
    fn test_overflowing_timestamps_skipped() {
        assert_eq!(parse_time("[99999999999999999:00]"), None);
        assert_eq!(parse_time("[99999999999999999:00.00]"), None);

        let lines = parse_lrc(
            "[00:01.00]<00:01.00>ok <99999999999999999:00.00>boom <00:02.00>fine<00:03.00>",
        );
        assert_eq!(lines.len(), 1);
        let texts: Vec<&str> = lines[0].words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["ok ", "fine"]);
    }

    #[test]
    fn test_extreme_offsets_saturate() {
        let late = parse_lrc("[offset:-9223372036854775807]\n[00:01.00]hi");
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].start_time, i64::MAX);
        assert_eq!(late[0].end_time, i64::MAX);

        let early = parse_lrc("[offset:-9223372036854775808]\n[00:01.00]<00:01.00>hi<00:02.00>");
        assert_eq!(early[0].words[0].timestamp, i64::MAX);

        let clamped = parse_lrc("[offset:9223372036854775807]\n[00:01.00]hi");
        assert_eq!(clamped[0].start_time, 0);
    }

    #[test]
    fn test_stringify_reparses_to_same_timing() {
        let src = "[00:01.000]<00:01.000>Hel<00:01.400>lo <00:02.000>world<00:03.000>\n\
                   [bg: <00:01.500>ooh<00:02.500>]\n\
                   [00:04.000]v2:plain words\n";
        let lines = parse_lrc(src);
        let again = parse_lrc(&stringify_lrc(&lines));
        assert_eq!(lines.len(), again.len());
        for (a, b) in lines.iter().zip(&again) {
            assert_eq!(a.start_time, b.start_time);
            assert_eq!(a.end_time, b.end_time);
            assert_eq!(a.vocal_type, b.vocal_type);
            assert_eq!(a.is_background, b.is_background);
            assert_eq!(a.text(), b.text());
        }
    }
}
