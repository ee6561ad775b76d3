//! Word chunking for line wrapping
//!
//! Karaoke lyrics often time syllables separately (`"su"`, `"gar "`). A row
//! break may only happen after a fragment that ends in a break character,
//! so consecutive fragments without one are grouped into a cluster that
//! is placed as a unit.
//!
//! ## Example
//!
//! Input: `["Life ", "is ", "su", "gar ", "so", "-", "sweet"]`
//! Clusters: `["Life "] ["is "] ["su", "gar "] ["so", "-"] ["sweet"]`

use std::ops::Range;

use crate::features::lyrics::parser::LyricWord;

/// Characters after which a row may break
const BREAK_CHARS: [char; 3] = [' ', '\u{3000}', '-'];

/// Whether a row may break right after this fragment
pub fn allows_break_after(text: &str) -> bool {
    text.ends_with(BREAK_CHARS)
}

/// Group words into no-break clusters
///
/// Returns contiguous, non-overlapping index ranges covering every word in
/// order. Every cluster holds at least one word.
pub fn clusters(words: &[LyricWord]) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut start = 0;

    for (i, word) in words.iter().enumerate() {
        if allows_break_after(&word.text) {
            result.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < words.len() {
        result.push(start..words.len());
    }

    result
}

/// Sum of cached widths for a word range
pub fn range_width(words: &[LyricWord], range: Range<usize>) -> f32 {
    words[range].iter().map(LyricWord::width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(texts: &[&str]) -> Vec<LyricWord> {
        texts.iter().map(|t| LyricWord::new(0, *t)).collect()
    }

    #[test]
    fn test_syllables_grouped_until_space() {
        let w = words(&["Life ", "is ", "su", "gar ", "so", "-", "sweet"]);
        assert_eq!(clusters(&w), vec![0..1, 1..2, 2..4, 4..6, 6..7]);
    }

    #[test]
    fn test_ideographic_space_breaks() {
        let w = words(&["夜", "空\u{3000}", "星"]);
        assert_eq!(clusters(&w), vec![0..2, 2..3]);
    }

    #[test]
    fn test_no_break_characters_single_cluster() {
        let w = words(&["a", "b", "c"]);
        assert_eq!(clusters(&w), vec![0..3]);
    }

    #[test]
    fn test_empty_input() {
        assert!(clusters(&[]).is_empty());
    }

    #[test]
    fn test_clusters_cover_all_words_in_order() {
        let w = words(&["x", "y ", "z", "-", "w "]);
        let flat: Vec<usize> = clusters(&w).into_iter().flatten().collect();
        assert_eq!(flat, (0..w.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_range_width() {
        let mut w = words(&["ab", "cd "]);
        w[0].display_width = Some(12.0);
        w[1].display_width = Some(8.5);
        assert_eq!(range_width(&w, 0..2), 20.5);
    }
}
