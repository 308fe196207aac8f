//! Glyph handling: segmentation, extraction and the bundled catalog.
//!
//! ## Components
//!
//! - [`segment`]: grapheme clusters (base + selectors + modifiers + ZWJ runs)
//! - [`extract`]: emoji-range filter for free text
//! - [`catalog`]: common glyphs with usage tiers, symbol priority orders

pub mod catalog;
pub mod extract;
pub mod segment;

pub use catalog::CommonGlyph;
pub use extract::{EmojiRangeExtractor, GlyphExtractor};
pub use segment::{Clusters, segment};

/// Placeholder emitted by the codec for a symbol with no glyph.
pub const PLACEHOLDER_GLYPH: &str = "\u{2753}";

/// Placeholder emitted by the codec for a glyph with no symbol.
pub const PLACEHOLDER_SYMBOL: char = '?';
