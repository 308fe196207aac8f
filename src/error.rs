//! Rich diagnostic error types for glyph58.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong
//! and how to fix it. The numeral codec errors live here because every other
//! subsystem reports them; the rest live next to the code that raises them.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::mapping::MappingError;
use crate::vision::{HashError, SimilarityError};

/// Top-level error type for glyph58.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum Glyph58Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Numeral(#[from] NumeralError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Similarity(#[from] SimilarityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Numeral (Base58 / Base58Check) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum NumeralError {
    #[error("invalid character '{symbol}' at position {position} (not in Base58 alphabet)")]
    #[diagnostic(
        code(glyph58::numeral::invalid_symbol),
        help(
            "Base58 excludes 0, O, I and l to avoid look-alike digits. \
             Check the address for typos or stray whitespace."
        )
    )]
    InvalidSymbol { symbol: char, position: usize },

    #[error("address too short: {len} bytes (need at least 5)")]
    #[diagnostic(
        code(glyph58::numeral::too_short),
        help(
            "A Base58Check address carries at least one version byte plus a \
             4-byte checksum. The input is probably truncated."
        )
    )]
    TooShort { len: usize },

    #[error("checksum mismatch (expected {}, got {})", hex(.expected), hex(.actual))]
    #[diagnostic(
        code(glyph58::numeral::checksum),
        help(
            "The double-SHA-256 checksum does not match the payload. \
             At least one symbol of the address is wrong."
        )
    )]
    ChecksumMismatch { expected: [u8; 4], actual: [u8; 4] },

    #[error("invalid numeral alphabet: {message}")]
    #[diagnostic(
        code(glyph58::numeral::alphabet),
        help("A numeral alphabet must contain exactly 58 distinct ASCII symbols.")
    )]
    InvalidAlphabet { message: String },
}

/// Lowercase hex rendering of a short byte string.
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Convenience alias for functions returning glyph58 results.
pub type Glyph58Result<T> = std::result::Result<T, Glyph58Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeral_error_converts_to_top_level() {
        let err = NumeralError::TooShort { len: 3 };
        let top: Glyph58Error = err.into();
        assert!(matches!(
            top,
            Glyph58Error::Numeral(NumeralError::TooShort { len: 3 })
        ));
    }

    #[test]
    fn mapping_error_converts_to_top_level() {
        let err = MappingError::DuplicateGlyph {
            glyph: "🐱".into(),
            first: '1',
            second: '2',
        };
        let top: Glyph58Error = err.into();
        assert!(matches!(top, Glyph58Error::Mapping(_)));
    }

    #[test]
    fn checksum_message_shows_hex() {
        let err = NumeralError::ChecksumMismatch {
            expected: [0xde, 0xad, 0xbe, 0xef],
            actual: [0x00, 0x01, 0x02, 0x03],
        };
        let msg = format!("{err}");
        assert!(msg.contains("deadbeef"), "{msg}");
        assert!(msg.contains("00010203"), "{msg}");
    }

    #[test]
    fn invalid_symbol_message_names_character() {
        let err = NumeralError::InvalidSymbol {
            symbol: '0',
            position: 4,
        };
        let msg = format!("{err}");
        assert!(msg.contains("'0'"));
        assert!(msg.contains("position 4"));
    }
}
