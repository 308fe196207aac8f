//! Bundled glyph catalog: commonly used emoji with usage tiers, plus the
//! symbol priority orders used when assigning glyphs to Base58 symbols.
//!
//! Tiers run from 1 (ultra-common, billions of uses) to 6 (regular use).
//! The steganographic mapping draws from this list so that an encoded
//! address reads like an ordinary emoji-heavy message.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::numeral::NumeralAlphabet;

/// A commonly used glyph with its usage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonGlyph {
    /// The glyph as a single grapheme cluster.
    pub glyph: &'static str,
    /// CLDR short name.
    pub name: &'static str,
    /// Usage tier, 1 = most common.
    pub tier: u8,
}

/// Tier given to glyphs borrowed from a secondary pool.
pub const BACKFILL_TIER: u8 = 7;

static COMMON: OnceLock<Vec<CommonGlyph>> = OnceLock::new();

fn build_common() -> Vec<CommonGlyph> {
    vec![
        // -- Tier 1: ultra-common --
        CommonGlyph {
            glyph: "\u{1F602}",
            name: "face with tears of joy",
            tier: 1,
        },
        CommonGlyph {
            glyph: "\u{2764}\u{FE0F}",
            name: "red heart",
            tier: 1,
        },
        CommonGlyph {
            glyph: "\u{1F970}",
            name: "smiling face with hearts",
            tier: 1,
        },
        CommonGlyph {
            glyph: "\u{1F60D}",
            name: "smiling face with heart-eyes",
            tier: 1,
        },
        CommonGlyph {
            glyph: "\u{1F60A}",
            name: "smiling face with smiling eyes",
            tier: 1,
        },
        // -- Tier 2: very common --
        CommonGlyph {
            glyph: "\u{1F389}",
            name: "party popper",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F62D}",
            name: "loudly crying face",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F618}",
            name: "face blowing a kiss",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F97A}",
            name: "pleading face",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F923}",
            name: "rolling on the floor laughing",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F495}",
            name: "two hearts",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{2728}",
            name: "sparkles",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F64F}",
            name: "folded hands",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F601}",
            name: "beaming face with smiling eyes",
            tier: 2,
        },
        CommonGlyph {
            glyph: "\u{1F496}",
            name: "sparkling heart",
            tier: 2,
        },
        // -- Tier 3: common --
        CommonGlyph {
            glyph: "\u{1F44D}",
            name: "thumbs up",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F525}",
            name: "fire",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F4AA}",
            name: "flexed biceps",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F31F}",
            name: "glowing star",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F609}",
            name: "winking face",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F917}",
            name: "hugging face",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F60E}",
            name: "smiling face with sunglasses",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F4AF}",
            name: "hundred points",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F64C}",
            name: "raising hands",
            tier: 3,
        },
        CommonGlyph {
            glyph: "\u{1F499}",
            name: "blue heart",
            tier: 3,
        },
        // -- Tier 4: moderately common --
        CommonGlyph {
            glyph: "\u{1F914}",
            name: "thinking face",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F60C}",
            name: "relieved face",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F38A}",
            name: "confetti ball",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F49C}",
            name: "purple heart",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F604}",
            name: "grinning face with smiling eyes",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F937}",
            name: "person shrugging",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F49A}",
            name: "green heart",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F388}",
            name: "balloon",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F973}",
            name: "partying face",
            tier: 4,
        },
        CommonGlyph {
            glyph: "\u{1F607}",
            name: "smiling face with halo",
            tier: 4,
        },
        // -- Tier 5: regular use --
        CommonGlyph {
            glyph: "\u{1F929}",
            name: "star-struck",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F603}",
            name: "grinning face with big eyes",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F643}",
            name: "upside-down face",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F49B}",
            name: "yellow heart",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F62C}",
            name: "grimacing face",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F91E}",
            name: "crossed fingers",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F44F}",
            name: "clapping hands",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F979}",
            name: "face holding back tears",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F605}",
            name: "grinning face with sweat",
            tier: 5,
        },
        CommonGlyph {
            glyph: "\u{1F44B}",
            name: "waving hand",
            tier: 5,
        },
        // -- Tier 6: distinct everyday objects --
        CommonGlyph {
            glyph: "\u{1F381}",
            name: "wrapped gift",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F340}",
            name: "four leaf clover",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F308}",
            name: "rainbow",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{2B50}",
            name: "star",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F33A}",
            name: "hibiscus",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F338}",
            name: "cherry blossom",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F355}",
            name: "pizza",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F354}",
            name: "hamburger",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{2615}",
            name: "hot beverage",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F3AE}",
            name: "video game",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{26A1}",
            name: "high voltage",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F319}",
            name: "crescent moon",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{2600}\u{FE0F}",
            name: "sun",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F3B5}",
            name: "musical note",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F3B6}",
            name: "musical notes",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F33B}",
            name: "sunflower",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F436}",
            name: "dog face",
            tier: 6,
        },
        CommonGlyph {
            glyph: "\u{1F431}",
            name: "cat face",
            tier: 6,
        },
    ]
}

/// All bundled common glyphs, most common first.
pub fn common_glyphs() -> &'static [CommonGlyph] {
    COMMON.get_or_init(build_common)
}

/// Symbol order for the steganographic mapping: address prefixes first,
/// then the extended-key prefixes (`xpub`, `ypub`, `zpub`), then by observed
/// frequency.
pub const STEGO_PRIORITY: &str = "13xpubyzefiFXYHJZrLn9PADmacMvE4QSNoWqK5tBG2TRk8sg6jCwdVhU7";

/// Leading symbols of legacy addresses: P2PKH (`1`) and P2SH (`3`).
pub const ADDRESS_PREFIXES: [char; 2] = ['1', '3'];

/// Well-known legacy addresses used to estimate symbol frequency.
pub const SAMPLE_ADDRESSES: [&str; 16] = [
    "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
    "12cbQLTFMXRnSzktFkuoG3eHoMeFtpTu3S",
    "1HLoD9E4SDFFPDiYfNYnkBLQ85Y51J3Zb1",
    "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2",
    "1FeexV6bAHb8ybZjqQMjJrcCrHGW9sb6uF",
    "1CK6KHY6MHgYvmRQ4PAafKYDrg1ejbH1cE",
    "1JfbZRwdDHKZmuiZgYArJZhcuuzuw2HuMu",
    "1GdK9UzpHBzqzX2A9JFP3Di4weBwqgmoQA",
    "3J98t1WpEZ73CNmYviecrnyiWrnqRhWNLy",
    "3QJmV3qfvL9SuYo34YihAf3sRCW3qSinyC",
    "3Nxwenay9Z8Lc9JBiywExpnEFiLp6Afp8v",
    "3LYJfcfHPXYJreMsASk2jkn69LWEYKzexb",
    "1CounterpartyXXXXXXXXXXXXXXXUWLpVr",
    "1dice8EMZmqKvrGE4Qc9bUFf9PX3xaYDp",
    "1FfmbHfnpaZjKFvyi1okTjJJusN455paPH",
    "1Dorian4RsruUgmdXpdPayZbZpcBhZxd9P",
];

/// Priority order for the distinct mapping, derived from sample addresses.
///
/// Address prefixes come first, then every other symbol by descending
/// frequency in `samples` (ties in alphabet order), then the symbols that
/// never occurred, in alphabet order. Always returns each alphabet symbol
/// exactly once.
pub fn priority_from_samples<'a>(
    alphabet: &NumeralAlphabet,
    samples: impl IntoIterator<Item = &'a str>,
) -> Vec<char> {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for address in samples {
        for ch in address.chars().filter(|&c| alphabet.contains(c)) {
            *counts.entry(ch).or_default() += 1;
        }
    }

    let mut order: Vec<char> = ADDRESS_PREFIXES
        .iter()
        .copied()
        .filter(|&c| alphabet.contains(c))
        .collect();

    let mut rest: Vec<char> = alphabet
        .symbols()
        .filter(|c| !order.contains(c))
        .collect();
    // Stable sort keeps alphabet order among equal counts and for zero counts.
    rest.sort_by_key(|c| std::cmp::Reverse(counts.get(c).copied().unwrap_or(0)));
    order.extend(rest);
    order
}

/// The steganographic priority order as symbols.
pub fn stego_priority() -> Vec<char> {
    STEGO_PRIORITY.chars().collect()
}
