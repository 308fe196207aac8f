//! Glyph extraction from free text.
//!
//! Picks the emoji code points out of a message (in order) so that an address
//! hidden among ordinary words can be decoded. The default extractor is a
//! regex over the common emoji blocks; callers with a different glyph pool
//! can plug in their own [`GlyphExtractor`].

use std::sync::LazyLock;

use regex::Regex;

// ── Regex patterns ──────────────────────────────────────────────────────

static RE_EMOJI_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F300}-\x{1FAFF}", // pictographs, emoticons, transport, supplemental
        r"\x{1F000}-\x{1F02F}", // mahjong, dominoes
        r"\x{1F0A0}-\x{1F0FF}", // playing cards
        r"\x{2600}-\x{27BF}",   // misc symbols, dingbats
        r"\x{2B50}",            // star
        r"\x{231A}-\x{231B}",   // watch, hourglass
        r"\x{23E9}-\x{23F3}",   // media controls
        r"\x{23F8}-\x{23FA}",   // pause, stop, record
        r"\x{FE0E}\x{FE0F}",    // variation selectors
        r"\x{200D}",            // zero-width joiner
        "]+",
    ))
    .unwrap()
});

/// Filters free text down to the code points that may belong to glyphs.
pub trait GlyphExtractor: Send + Sync {
    /// Concatenation, in order, of every glyph run found in `text`.
    /// Empty when the text holds no glyphs.
    fn extract(&self, text: &str) -> String;
}

/// Default extractor over the Unicode emoji blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmojiRangeExtractor;

impl GlyphExtractor for EmojiRangeExtractor {
    fn extract(&self, text: &str) -> String {
        RE_EMOJI_RUN.find_iter(text).map(|m| m.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order_across_words() {
        let text = "Hey! 😂❤️🥰 check this out 😊🎉😭";
        assert_eq!(EmojiRangeExtractor.extract(text), "😂❤️🥰😊🎉😭");
    }

    #[test]
    fn plain_text_yields_nothing() {
        assert_eq!(EmojiRangeExtractor.extract("no glyphs here, 123"), "");
    }

    #[test]
    fn keeps_modifiers_and_joiners() {
        let text = "a👍🏽b👨‍👩‍👧c";
        assert_eq!(EmojiRangeExtractor.extract(text), "👍🏽👨‍👩‍👧");
    }

    #[test]
    fn trait_object_works() {
        let ex: Box<dyn GlyphExtractor> = Box::new(EmojiRangeExtractor);
        assert_eq!(ex.extract("x⭐y"), "⭐");
    }
}
