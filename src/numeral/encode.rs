//! Base58 encoding: bytes to numeral string.
//! Leading zero bytes become leading zero symbols; the rest is a repeated
//! multiply-and-carry into little-endian base-58 digits.

use super::NumeralAlphabet;

#[must_use]
pub(crate) fn encode_with(alphabet: &NumeralAlphabet, input: &[u8]) -> String {
    if input.is_empty() {
        return String::new();
    }
    let zeros = input.iter().take_while(|&&b| b == 0).count();
    let non_zero = &input[zeros..];

    // log(256) / log(58) ~= 1.37
    let mut digits: Vec<u8> = Vec::with_capacity(non_zero.len() * 138 / 100 + 1);
    for &byte in non_zero {
        let mut carry = u32::from(byte);
        for digit in &mut digits {
            carry += u32::from(*digit) << 8;
            #[allow(clippy::cast_possible_truncation)]
            let rem = (carry % 58) as u8;
            *digit = rem;
            carry /= 58;
        }
        while carry > 0 {
            #[allow(clippy::cast_possible_truncation)]
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut result = String::with_capacity(zeros + digits.len());
    result.extend(std::iter::repeat_n(alphabet.zero(), zeros));
    result.extend(digits.iter().rev().map(|&d| alphabet.symbol(d)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn encode(input: &[u8]) -> String {
        encode_with(&NumeralAlphabet::BITCOIN, input)
    }

    #[test]
    fn encode_known_no_zeros() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"hello"), "Cn8eVZg");
        assert_eq!(encode(&hex!("61")), "2g");
        assert_eq!(encode(&hex!("626262")), "a3gV");
    }

    #[test]
    fn encode_with_zeros() {
        assert_eq!(encode(&hex!("00")), "1");
        assert_eq!(
            encode(&hex!(
                "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
            )),
            "111114VYJtj3yEDffZem7N3PkK563wkLZZ8RjKzcfY"
        );
    }

    #[test]
    fn all_zero_input() {
        assert_eq!(encode(&[0u8; 20]), "1".repeat(20));
    }

    #[test]
    fn satoshi_address_bytes() {
        let bytes = hex!("0062e907b15cbf27d5425399ebf6f0fb50ebb88f18c29b7d93");
        assert_eq!(encode(&bytes), "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
    }
}
