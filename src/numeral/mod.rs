//! Base58 numeral codec.
//!
//! Radix-58 big-integer conversion over a 58-symbol alphabet, with the
//! Base58Check double-SHA-256 checksum used by Bitcoin addresses. Leading
//! zero bytes are carried as leading copies of the alphabet's zero symbol
//! (`'1'` in the Bitcoin alphabet), since the radix conversion cannot
//! represent them numerically.

mod decode;
mod encode;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NumeralError;

pub use decode::{checksum, verify_checksum};

/// The canonical Bitcoin Base58 alphabet.
pub const BITCOIN_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Number of symbols in a numeral alphabet.
pub const RADIX: usize = 58;

/// Checksum length appended by Base58Check.
pub const CHECKSUM_LEN: usize = 4;

/// Smallest decoded Base58Check length: one version byte plus the checksum.
pub const MIN_CHECKED_LEN: usize = CHECKSUM_LEN + 1;

/// Result type for numeral operations.
pub type NumeralResult<T> = std::result::Result<T, NumeralError>;

const INVALID: u8 = 255;

/// An ordered set of 58 distinct ASCII symbols. Index = numeral value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumeralAlphabet {
    symbols: [u8; RADIX],
    lookup: [u8; 128],
}

impl NumeralAlphabet {
    /// The Bitcoin alphabet.
    pub const BITCOIN: Self = Self::from_ascii_unchecked(BITCOIN_ALPHABET.as_bytes());

    /// Build an alphabet, rejecting anything other than 58 distinct ASCII symbols.
    pub fn new(symbols: &str) -> NumeralResult<Self> {
        let bytes = symbols.as_bytes();
        if !symbols.is_ascii() {
            return Err(NumeralError::InvalidAlphabet {
                message: "alphabet contains non-ASCII symbols".into(),
            });
        }
        if bytes.len() != RADIX {
            return Err(NumeralError::InvalidAlphabet {
                message: format!("expected {RADIX} symbols, got {}", bytes.len()),
            });
        }
        let mut seen = [false; 128];
        for &b in bytes {
            if seen[b as usize] {
                return Err(NumeralError::InvalidAlphabet {
                    message: format!("duplicate symbol '{}'", b as char),
                });
            }
            seen[b as usize] = true;
        }
        Ok(Self::from_ascii_unchecked(bytes))
    }

    const fn from_ascii_unchecked(bytes: &[u8]) -> Self {
        let mut symbols = [0u8; RADIX];
        let mut lookup = [INVALID; 128];
        let mut i = 0usize;
        while i < RADIX {
            symbols[i] = bytes[i];
            lookup[bytes[i] as usize] = i as u8;
            i += 1;
        }
        Self { symbols, lookup }
    }

    /// Numeral value of `symbol`, if it belongs to the alphabet.
    #[inline]
    pub fn value_of(&self, symbol: char) -> Option<u8> {
        let code = symbol as u32;
        if code >= 128 {
            return None;
        }
        match self.lookup[code as usize] {
            INVALID => None,
            v => Some(v),
        }
    }

    /// Whether `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: char) -> bool {
        self.value_of(symbol).is_some()
    }

    /// Symbol for numeral value `value` (must be < 58).
    #[inline]
    pub fn symbol(&self, value: u8) -> char {
        self.symbols[value as usize] as char
    }

    /// The symbol representing a leading zero byte.
    pub fn zero(&self) -> char {
        self.symbol(0)
    }

    /// Symbols in numeral order.
    pub fn symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.symbols.iter().map(|&b| b as char)
    }

    /// The alphabet as a string.
    pub fn as_str(&self) -> &str {
        // Constructors only accept ASCII.
        std::str::from_utf8(&self.symbols).unwrap_or_default()
    }

    /// Encode raw bytes (no checksum).
    pub fn encode(&self, input: &[u8]) -> String {
        encode::encode_with(self, input)
    }

    /// Encode a payload with its Base58Check checksum appended.
    pub fn encode_check(&self, payload: &[u8]) -> String {
        let mut bytes = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&checksum(payload));
        self.encode(&bytes)
    }

    /// Decode to raw bytes, checksum included and unverified.
    ///
    /// # Errors
    /// - `InvalidSymbol` for the first character outside the alphabet.
    pub fn decode(&self, input: &str) -> NumeralResult<Vec<u8>> {
        decode::decode_with(self, input)
    }

    /// Decode and verify a Base58Check string, returning the payload without
    /// its checksum.
    ///
    /// # Errors
    /// - `InvalidSymbol`: non-alphabet character.
    /// - `TooShort`: fewer than 5 decoded bytes.
    /// - `ChecksumMismatch`: double-SHA-256 of the payload disagrees.
    pub fn decode_check(&self, input: &str) -> NumeralResult<Vec<u8>> {
        let mut bytes = self.decode(input)?;
        verify_checksum(&bytes)?;
        bytes.truncate(bytes.len() - CHECKSUM_LEN);
        Ok(bytes)
    }
}

impl Default for NumeralAlphabet {
    fn default() -> Self {
        Self::BITCOIN
    }
}

impl fmt::Debug for NumeralAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NumeralAlphabet").field(&self.as_str()).finish()
    }
}

impl fmt::Display for NumeralAlphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NumeralAlphabet {
    type Error = NumeralError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<NumeralAlphabet> for String {
    fn from(value: NumeralAlphabet) -> Self {
        value.as_str().to_owned()
    }
}

/// Encode with the Bitcoin alphabet.
pub fn encode(input: &[u8]) -> String {
    NumeralAlphabet::BITCOIN.encode(input)
}

/// Encode with checksum using the Bitcoin alphabet.
pub fn encode_check(payload: &[u8]) -> String {
    NumeralAlphabet::BITCOIN.encode_check(payload)
}

/// Decode with the Bitcoin alphabet (no checksum verification).
pub fn decode(input: &str) -> NumeralResult<Vec<u8>> {
    NumeralAlphabet::BITCOIN.decode(input)
}

/// Decode and verify a Bitcoin Base58Check string.
pub fn decode_check(input: &str) -> NumeralResult<Vec<u8>> {
    NumeralAlphabet::BITCOIN.decode_check(input)
}
