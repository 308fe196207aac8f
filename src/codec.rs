//! Address ↔ glyph substitution codec.
//!
//! A [`SubstitutionCodec`] owns one immutable [`Bijection`] and is shared
//! read-only between callers. Encoding and decoding never fail: a unit with
//! no counterpart becomes a placeholder and the result is flagged as
//! degraded. Only [`SubstitutionCodec::validate`] returns a hard error, and
//! its verdict depends on the numeral alphabet alone, never on which glyphs
//! are loaded.

use std::path::Path;

use serde::Serialize;

use crate::error::NumeralError;
use crate::glyph::segment::is_continuation;
use crate::glyph::{GlyphExtractor, PLACEHOLDER_GLYPH, PLACEHOLDER_SYMBOL, segment};
use crate::mapping::{Bijection, MappingResult, MappingStrategy};
use crate::numeral::{NumeralAlphabet, NumeralResult, verify_checksum};

/// Result of [`SubstitutionCodec::encode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoded {
    pub glyphs: String,
    /// Symbols that had no glyph, in input order.
    pub unmapped: Vec<char>,
}

impl Encoded {
    pub fn all_mapped(&self) -> bool {
        self.unmapped.is_empty()
    }
}

/// Result of [`SubstitutionCodec::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub address: String,
    /// Clusters that had no symbol, in input order.
    pub unmapped: Vec<String>,
}

impl Decoded {
    pub fn all_mapped(&self) -> bool {
        self.unmapped.is_empty()
    }
}

/// Terminal state of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Some cluster had no symbol; checksum validation was skipped.
    Undecodable,
    /// Fully decoded and the Base58Check checksum holds.
    Valid,
    /// Fully decoded but validation failed.
    Invalid(NumeralError),
}

/// Structured report of [`SubstitutionCodec::scan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub glyphs: String,
    pub address: String,
    pub decode_succeeded: bool,
    pub checksum_valid: bool,
    pub messages: Vec<String>,
    #[serde(skip)]
    pub outcome: ScanOutcome,
}

/// Result of [`SubstitutionCodec::extract_and_scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The text holds no glyph code points.
    NothingFound,
    /// Extracted glyphs and their scan.
    Scanned(ScanReport),
}

impl ExtractOutcome {
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            ExtractOutcome::NothingFound => None,
            ExtractOutcome::Scanned(report) => Some(report),
        }
    }
}

/// Glyph codec over one loaded bijection.
#[derive(Debug, Clone)]
pub struct SubstitutionCodec {
    bijection: Bijection,
}

impl SubstitutionCodec {
    pub fn new(bijection: Bijection) -> Self {
        tracing::debug!(
            strategy = %bijection.strategy(),
            glyphs = bijection.len(),
            "substitution codec ready"
        );
        Self { bijection }
    }

    /// Load a mapping file and build a codec over it.
    pub fn load(path: &Path) -> MappingResult<Self> {
        Ok(Self::new(Bijection::load(path)?))
    }

    pub fn bijection(&self) -> &Bijection {
        &self.bijection
    }

    pub fn alphabet(&self) -> &NumeralAlphabet {
        self.bijection.alphabet()
    }

    pub fn strategy(&self) -> MappingStrategy {
        self.bijection.strategy()
    }

    /// Substitute each address symbol with its glyph. One output glyph per
    /// input symbol; unknown symbols become the placeholder glyph.
    pub fn encode(&self, address: &str) -> Encoded {
        let mut glyphs = String::with_capacity(address.len() * 4);
        let mut unmapped = Vec::new();
        for symbol in address.chars() {
            match self.bijection.glyph_for(symbol) {
                Some(glyph) => glyphs.push_str(glyph),
                None => {
                    glyphs.push_str(PLACEHOLDER_GLYPH);
                    unmapped.push(symbol);
                }
            }
        }
        if !unmapped.is_empty() {
            tracing::warn!(?unmapped, "address contains unmapped symbols");
        }
        Encoded { glyphs, unmapped }
    }

    /// Segment `glyphs` into clusters and substitute each with its symbol.
    /// Unknown clusters become the placeholder symbol.
    pub fn decode(&self, glyphs: &str) -> Decoded {
        let mut address = String::new();
        let mut unmapped = Vec::new();
        for cluster in segment(glyphs) {
            match self.bijection.symbol_for(cluster) {
                Some(symbol) => address.push(symbol),
                None => {
                    address.push(PLACEHOLDER_SYMBOL);
                    unmapped.push(cluster.to_string());
                }
            }
        }
        if !unmapped.is_empty() {
            tracing::warn!(?unmapped, "glyph sequence contains unmapped glyphs");
        }
        Decoded { address, unmapped }
    }

    /// Base58Check validation of `address`, returning the decoded bytes
    /// (checksum included) on success.
    ///
    /// # Errors
    /// - `InvalidSymbol`, `TooShort` or `ChecksumMismatch`.
    pub fn validate(&self, address: &str) -> NumeralResult<Vec<u8>> {
        let bytes = self.alphabet().decode(address)?;
        verify_checksum(&bytes)?;
        Ok(bytes)
    }

    /// Decode, then validate when decoding fully succeeded.
    pub fn scan(&self, glyphs: &str) -> ScanReport {
        let decoded = self.decode(glyphs);
        let mut messages = Vec::new();

        let outcome = if !decoded.all_mapped() {
            messages.push(format!(
                "failed to decode glyph sequence: {} unmapped glyph(s)",
                decoded.unmapped.len()
            ));
            ScanOutcome::Undecodable
        } else {
            match self.validate(&decoded.address) {
                Ok(_) => {
                    messages.push("checksum valid".to_string());
                    ScanOutcome::Valid
                }
                Err(e) => {
                    messages.push(format!("checksum validation failed: {e}"));
                    ScanOutcome::Invalid(e)
                }
            }
        };

        tracing::debug!(
            address = %decoded.address,
            outcome = ?outcome,
            "scanned glyph sequence"
        );

        ScanReport {
            glyphs: glyphs.to_string(),
            address: decoded.address,
            decode_succeeded: !matches!(outcome, ScanOutcome::Undecodable),
            checksum_valid: matches!(outcome, ScanOutcome::Valid),
            messages,
            outcome,
        }
    }

    /// Pull the glyphs out of free text and scan them. Stray selectors,
    /// modifiers and joiners on their own count as no glyphs.
    pub fn extract_and_scan(&self, text: &str, extractor: &dyn GlyphExtractor) -> ExtractOutcome {
        let glyphs = extractor.extract(text);
        if glyphs.chars().all(is_continuation) {
            tracing::debug!("no glyphs found in text");
            return ExtractOutcome::NothingFound;
        }
        ExtractOutcome::Scanned(self.scan(&glyphs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::EmojiRangeExtractor;
    use crate::mapping::tests::animal_document;

    const SATOSHI: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

    fn codec() -> SubstitutionCodec {
        SubstitutionCodec::new(Bijection::from_document(animal_document()).unwrap())
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let c = codec();
        let enc = c.encode(SATOSHI);
        assert!(enc.all_mapped());
        assert_eq!(enc.glyphs.chars().count(), SATOSHI.len());
        let dec = c.decode(&enc.glyphs);
        assert!(dec.all_mapped());
        assert_eq!(dec.address, SATOSHI);
    }

    #[test]
    fn unknown_symbol_becomes_placeholder() {
        let c = codec();
        let enc = c.encode("1O2");
        assert_eq!(enc.unmapped, vec!['O']);
        assert!(!enc.all_mapped());
        let clusters: Vec<&str> = segment(&enc.glyphs).collect();
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[1], PLACEHOLDER_GLYPH);
    }

    #[test]
    fn unknown_glyph_becomes_placeholder_symbol() {
        let c = codec();
        let dec = c.decode("\u{1F400}🍕\u{1F401}");
        assert_eq!(dec.address, "1?2");
        assert_eq!(dec.unmapped, vec!["🍕".to_string()]);
    }

    #[test]
    fn validate_reports_each_failure() {
        let c = codec();
        assert!(c.validate(SATOSHI).is_ok());
        assert!(matches!(
            c.validate("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb"),
            Err(NumeralError::ChecksumMismatch { .. })
        ));
        for bad in ['0', 'O', 'I', 'l'] {
            let addr = format!("1A1zP1eP5QGefi2DMPT{bad}TL5SLmv7DivfNa");
            assert!(matches!(
                c.validate(&addr),
                Err(NumeralError::InvalidSymbol { symbol, position: 19 }) if symbol == bad
            ));
        }
        assert!(matches!(c.validate("2g"), Err(NumeralError::TooShort { len: 1 })));
    }

    #[test]
    fn scan_valid_sequence() {
        let c = codec();
        let report = c.scan(&c.encode(SATOSHI).glyphs);
        assert!(report.decode_succeeded);
        assert!(report.checksum_valid);
        assert_eq!(report.outcome, ScanOutcome::Valid);
        assert_eq!(report.address, SATOSHI);
    }

    #[test]
    fn scan_with_placeholder_skips_validation() {
        let c = codec();
        let mut glyphs = c.encode(SATOSHI).glyphs;
        glyphs.push_str(PLACEHOLDER_GLYPH);
        let report = c.scan(&glyphs);
        assert!(!report.decode_succeeded);
        assert!(!report.checksum_valid);
        assert_eq!(report.outcome, ScanOutcome::Undecodable);
        assert!(!report.messages.iter().any(|m| m.contains("checksum")));
    }

    #[test]
    fn scan_bad_checksum() {
        let c = codec();
        let report = c.scan(&c.encode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb").glyphs);
        assert!(report.decode_succeeded);
        assert!(!report.checksum_valid);
        assert!(matches!(
            report.outcome,
            ScanOutcome::Invalid(NumeralError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn extract_from_message() {
        let c = codec();
        let glyphs = c.encode(SATOSHI).glyphs;
        let text = format!("gm! {glyphs} see you later");
        let outcome = c.extract_and_scan(&text, &EmojiRangeExtractor);
        let report = outcome.report().unwrap();
        assert!(report.checksum_valid);
        assert_eq!(report.address, SATOSHI);
    }

    #[test]
    fn extract_from_plain_text_finds_nothing() {
        let c = codec();
        assert_eq!(
            c.extract_and_scan("just words", &EmojiRangeExtractor),
            ExtractOutcome::NothingFound
        );
    }

    #[test]
    fn stray_joiners_and_selectors_are_not_glyphs() {
        let c = codec();
        for text in ["a\u{200D}b", "plain\u{FE0F} text", "x\u{200D}\u{FE0F}y"] {
            assert_eq!(
                c.extract_and_scan(text, &EmojiRangeExtractor),
                ExtractOutcome::NothingFound,
                "{text:?}"
            );
        }
    }

    #[test]
    fn codec_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SubstitutionCodec>();
    }
}
