//! Grapheme segmentation for glyph strings.
//!
//! A greedy forward scan that groups one base code point with its trailing
//! variation selectors, skin-tone modifiers and zero-width-joiner
//! continuations. This is narrower than the full UAX #29 cluster
//! rules: it covers the emoji sequences found in the candidate pools (flags,
//! keycaps and tag sequences are filtered out upstream) and nothing more.

use std::iter::FusedIterator;
use std::ops::RangeInclusive;

/// Text and emoji presentation selectors (U+FE0E, U+FE0F).
pub const VARIATION_SELECTORS: [char; 2] = ['\u{FE0E}', '\u{FE0F}'];

/// Fitzpatrick skin-tone modifiers.
pub const SKIN_TONE_MODIFIERS: RangeInclusive<char> = '\u{1F3FB}'..='\u{1F3FF}';

/// Zero-width joiner.
pub const ZWJ: char = '\u{200D}';

/// Iterator over the glyph clusters of a string, yielding borrowed slices.
#[derive(Debug, Clone)]
pub struct Clusters<'a> {
    rest: &'a str,
}

/// Split `text` into glyph clusters.
pub fn segment(text: &str) -> Clusters<'_> {
    Clusters { rest: text }
}

/// Number of visible glyphs in `text`.
pub fn cluster_count(text: &str) -> usize {
    segment(text).count()
}

/// Whether `c` attaches to the code point before it.
pub fn is_continuation(c: char) -> bool {
    VARIATION_SELECTORS.contains(&c) || SKIN_TONE_MODIFIERS.contains(&c) || c == ZWJ
}

/// Whether `glyph` is one cluster that keeps its boundaries when placed
/// between arbitrary other glyphs: it must not open with a continuation
/// code point or end on a joiner.
pub fn is_standalone(glyph: &str) -> bool {
    let (Some(first), Some(last)) = (glyph.chars().next(), glyph.chars().next_back()) else {
        return false;
    };
    !is_continuation(first) && last != ZWJ && cluster_count(glyph) == 1
}

fn char_at(s: &str, at: usize) -> Option<char> {
    s.get(at..).and_then(|tail| tail.chars().next())
}

impl<'a> Iterator for Clusters<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let base = self.rest.chars().next()?;
        let mut end = base.len_utf8();

        while let Some(c) = char_at(self.rest, end).filter(|c| VARIATION_SELECTORS.contains(c)) {
            end += c.len_utf8();
        }
        while let Some(c) = char_at(self.rest, end).filter(|c| SKIN_TONE_MODIFIERS.contains(c)) {
            end += c.len_utf8();
        }
        while let Some(joiner) = char_at(self.rest, end).filter(|&c| c == ZWJ) {
            end += joiner.len_utf8();
            if let Some(next) = char_at(self.rest, end) {
                end += next.len_utf8();
            }
        }

        let (cluster, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(cluster)
    }
}

impl FusedIterator for Clusters<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters(s: &str) -> Vec<&str> {
        segment(s).collect()
    }

    #[test]
    fn empty_input_has_no_clusters() {
        assert!(clusters("").is_empty());
    }

    #[test]
    fn single_codepoint_glyphs() {
        assert_eq!(clusters("🐱🐶🍕"), vec!["🐱", "🐶", "🍕"]);
    }

    #[test]
    fn variation_selector_stays_attached() {
        assert_eq!(clusters("❤️☀️⭐"), vec!["❤\u{FE0F}", "☀\u{FE0F}", "⭐"]);
    }

    #[test]
    fn skin_tone_modifier_stays_attached() {
        let thumbs = "👍\u{1F3FD}";
        assert_eq!(clusters(&format!("{thumbs}🔥")), vec![thumbs, "🔥"]);
    }

    #[test]
    fn zwj_sequence_is_one_cluster() {
        let family = "👨\u{200D}👩\u{200D}👧";
        let shrug = "🤷\u{1F3FD}\u{200D}♂\u{FE0F}";
        // Only one code point follows each joiner, so the selector after ♂
        // becomes a cluster of its own.
        assert_eq!(clusters(family), vec![family]);
        assert_eq!(
            clusters(shrug),
            vec!["🤷\u{1F3FD}\u{200D}♂", "\u{FE0F}"]
        );
    }

    #[test]
    fn trailing_joiner_is_kept() {
        assert_eq!(clusters("🐱\u{200D}"), vec!["🐱\u{200D}"]);
    }

    #[test]
    fn ascii_is_one_cluster_per_char() {
        assert_eq!(cluster_count("abc"), 3);
    }

    #[test]
    fn standalone_glyphs() {
        assert!(is_standalone("🐱"));
        assert!(is_standalone("❤\u{FE0F}"));
        assert!(is_standalone("👍\u{1F3FD}"));
        assert!(is_standalone("👨\u{200D}👩\u{200D}👧"));
        assert!(!is_standalone(""));
        assert!(!is_standalone("🐱🐶"));
        assert!(!is_standalone("\u{1F3FB}"));
        assert!(!is_standalone("\u{FE0F}"));
        assert!(!is_standalone("\u{200D}🐱"));
        assert!(!is_standalone("🐱\u{200D}"));
    }

    #[test]
    fn segmentation_is_idempotent() {
        let inputs = [
            "❤️🥰😂👍🏽👨‍👩‍👧",
            "☀️\u{FE0E}\u{FE0F}🎉",
            "\u{200D}\u{200D}x",
            "\u{1F3FB}🏻a",
        ];
        for s in inputs {
            let first: Vec<&str> = clusters(s);
            let joined: String = first.concat();
            assert_eq!(joined, s);
            let second: Vec<&str> = clusters(&joined);
            assert_eq!(first, second);
        }
    }
}
