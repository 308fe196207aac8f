//! Base58 decoding and Base58Check verification.
//! MSB-first Horner accumulation (`acc = acc * 58 + value`) into little-endian
//! bytes, then one zero byte re-prepended per leading zero symbol.

use sha2::{Digest, Sha256};

use super::{CHECKSUM_LEN, MIN_CHECKED_LEN, NumeralAlphabet, NumeralResult};
use crate::error::NumeralError;

/// Decodes `input` to raw bytes, checksum included.
///
/// # Errors
/// - `InvalidSymbol`: first character outside the alphabet, with its char position.
pub(crate) fn decode_with(alphabet: &NumeralAlphabet, input: &str) -> NumeralResult<Vec<u8>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let zero = alphabet.zero();
    let zeros = input.chars().take_while(|&c| c == zero).count();

    // log(58) / log(256) ~= 0.733
    let mut output: Vec<u8> = Vec::with_capacity(input.len() * 733 / 1000 + 1);
    for (position, symbol) in input.chars().enumerate() {
        let value = alphabet
            .value_of(symbol)
            .ok_or(NumeralError::InvalidSymbol { symbol, position })?;
        let mut carry = u32::from(value);
        for byte in &mut output {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            output.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    output.extend(std::iter::repeat_n(0u8, zeros));
    output.reverse();
    Ok(output)
}

/// First four bytes of `SHA256(SHA256(payload))`.
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash1 = Sha256::digest(payload);
    let hash2 = Sha256::digest(hash1);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hash2[..CHECKSUM_LEN]);
    out
}

/// Verifies the trailing Base58Check checksum of fully decoded bytes.
///
/// # Errors
/// - `TooShort`: fewer than 5 bytes.
/// - `ChecksumMismatch`: checksum of `decoded[..len-4]` != `decoded[len-4..]`.
pub fn verify_checksum(decoded: &[u8]) -> NumeralResult<()> {
    if decoded.len() < MIN_CHECKED_LEN {
        return Err(NumeralError::TooShort { len: decoded.len() });
    }
    let (payload, tail) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    let expected = checksum(payload);
    let mut actual = [0u8; CHECKSUM_LEN];
    actual.copy_from_slice(tail);
    if expected != actual {
        return Err(NumeralError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn decode(input: &str) -> NumeralResult<Vec<u8>> {
        decode_with(&NumeralAlphabet::BITCOIN, input)
    }

    #[test]
    fn decode_known_no_checksum() {
        assert_eq!(decode(""), Ok(vec![]));
        assert_eq!(decode("1"), Ok(vec![0u8]));
        assert_eq!(decode("Cn8eVZg"), Ok(b"hello".to_vec()));
        let genesis = hex!("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f");
        assert_eq!(
            decode("111114VYJtj3yEDffZem7N3PkK563wkLZZ8RjKzcfY"),
            Ok(genesis.to_vec())
        );
    }

    #[test]
    fn invalid_symbol_reports_position() {
        assert_eq!(
            decode("invalid!"),
            Err(NumeralError::InvalidSymbol {
                symbol: 'l',
                position: 4
            })
        );
        assert_eq!(
            decode("1O"),
            Err(NumeralError::InvalidSymbol {
                symbol: 'O',
                position: 1
            })
        );
    }

    #[test]
    fn leading_zero_symbols_become_zero_bytes() {
        assert_eq!(decode("111"), Ok(vec![0, 0, 0]));
        assert_eq!(decode("112"), Ok(vec![0, 0, 1]));
    }

    #[test]
    fn satoshi_address_checksum() {
        let bytes = decode("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap();
        assert_eq!(
            bytes,
            hex!("0062e907b15cbf27d5425399ebf6f0fb50ebb88f18c29b7d93").to_vec()
        );
        assert_eq!(verify_checksum(&bytes), Ok(()));
    }

    #[test]
    fn eater_address_checksum() {
        let bytes = decode("1BitcoinEaterAddressDontSendf59kuE").unwrap();
        assert_eq!(verify_checksum(&bytes), Ok(()));
        let bad = decode("1BitcoinEaterAddressDontSendf59kuF").unwrap();
        assert!(matches!(
            verify_checksum(&bad),
            Err(NumeralError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn short_input_is_too_short() {
        assert_eq!(
            verify_checksum(&[0, 1, 2, 3]),
            Err(NumeralError::TooShort { len: 4 })
        );
        assert_eq!(verify_checksum(&[]), Err(NumeralError::TooShort { len: 0 }));
    }

    #[test]
    fn checksum_of_empty_payload() {
        // SHA256d("") = 5df6e0e2...
        assert_eq!(checksum(b""), hex!("5df6e0e2"));
    }
}
