// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arbitrary-precision unsigned integers for numeric compaction.
//!
//! Numeric compaction packs up to 44 decimal digits into base-900 codewords; the intermediate
//! value does not fit any machine word. Only the operations the compactors need exist here:
//! decimal parsing and formatting, multiply-add by a small factor, and division by a small
//! divisor.

use symbology_core::errors::{format_error, invalid_argument_error, Result};

const LIMB_BASE: u64 = 1_000_000_000;
const LIMB_DIGITS: usize = 9;

/// An unsigned big integer stored as base-10^9 limbs, least significant first. Zero is the
/// empty limb vector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BigInteger {
    limbs: Vec<u32>,
}

impl BigInteger {
    pub fn zero() -> BigInteger {
        BigInteger { limbs: Vec::new() }
    }

    pub fn from_u64(value: u64) -> BigInteger {
        let mut result = BigInteger::zero();
        let mut value = value;
        while value > 0 {
            result.limbs.push((value % LIMB_BASE) as u32);
            value /= LIMB_BASE;
        }
        result
    }

    /// Parses a string of decimal digits.
    pub fn parse_decimal(digits: &str) -> Result<BigInteger> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return invalid_argument_error("not a decimal digit string");
        }
        let mut result = BigInteger::zero();
        for b in digits.bytes() {
            result.mul_add(10, u32::from(b - b'0'));
        }
        Ok(result)
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// `self = self * factor + addend`.
    pub fn mul_add(&mut self, factor: u32, addend: u32) {
        let mut carry = u64::from(addend);
        for limb in self.limbs.iter_mut() {
            let value = u64::from(*limb) * u64::from(factor) + carry;
            *limb = (value % LIMB_BASE) as u32;
            carry = value / LIMB_BASE;
        }
        while carry > 0 {
            self.limbs.push((carry % LIMB_BASE) as u32);
            carry /= LIMB_BASE;
        }
    }

    /// `self = self / divisor`, returning the remainder.
    pub fn div_rem(&mut self, divisor: u32) -> u32 {
        let mut remainder = 0u64;
        for limb in self.limbs.iter_mut().rev() {
            let value = remainder * LIMB_BASE + u64::from(*limb);
            *limb = (value / u64::from(divisor)) as u32;
            remainder = value % u64::from(divisor);
        }
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
        remainder as u32
    }

    /// The decimal representation; zero renders as `"0"`.
    pub fn to_decimal(&self) -> String {
        match self.limbs.split_last() {
            None => "0".to_string(),
            Some((last, rest)) => {
                let mut out = last.to_string();
                for limb in rest.iter().rev() {
                    out.push_str(&format!("{:0width$}", limb, width = LIMB_DIGITS));
                }
                out
            }
        }
    }
}

/// Accumulates base-900 codewords, most significant first, into an integer.
pub fn from_base900(codewords: &[u16]) -> BigInteger {
    let mut value = BigInteger::zero();
    for &cw in codewords {
        value.mul_add(900, u32::from(cw));
    }
    value
}

/// Converts the `"1"`-prefixed digit group of numeric compaction into base-900 codewords,
/// most significant first.
pub fn to_base900(digits: &str) -> Result<Vec<u16>> {
    let mut value = BigInteger::parse_decimal(digits)?;
    let mut codewords = Vec::new();
    while !value.is_zero() {
        codewords.push(value.div_rem(900) as u16);
    }
    codewords.reverse();
    Ok(codewords)
}

/// Decodes a base-900 codeword group back into the digits it carried, checking and removing
/// the `"1"` guard prefix.
pub fn decode_base900_to_base10(codewords: &[u16]) -> Result<String> {
    let decimal = from_base900(codewords).to_decimal();
    match decimal.strip_prefix('1') {
        Some(digits) => Ok(digits.to_string()),
        None => format_error("numeric compaction group lacks its guard digit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_decimal_round_trip() {
        for s in ["0", "7", "900", "999999999", "1000000000", "123456789012345678901234567890"] {
            assert_eq!(BigInteger::parse_decimal(s).unwrap().to_decimal(), s);
        }
        assert!(BigInteger::parse_decimal("12a").is_err());
        assert!(BigInteger::parse_decimal("").is_err());
    }

    #[test]
    fn verify_reference_numeric_example() {
        // The worked example from ISO/IEC 15438 5.4.4: 000213298174000 with the guard prefix
        // becomes the codewords 1, 624, 434, 632, 282, 200.
        let codewords = to_base900("1000213298174000").unwrap();
        assert_eq!(codewords, [1, 624, 434, 632, 282, 200]);
        assert_eq!(decode_base900_to_base10(&codewords).unwrap(), "000213298174000");
    }

    #[test]
    fn verify_base900_round_trip_44_digits() {
        let digits: String = std::iter::once('1')
            .chain((0..44).map(|i| char::from(b'0' + (i * 7 % 10) as u8)))
            .collect();
        let codewords = to_base900(&digits).unwrap();
        assert!(codewords.len() <= 16);
        assert_eq!(decode_base900_to_base10(&codewords).unwrap(), &digits[1..]);
    }

    #[test]
    fn verify_div_rem() {
        let mut value = BigInteger::parse_decimal("1000000007").unwrap();
        assert_eq!(value.div_rem(900), 1000000007u64.rem_euclid(900) as u32);
        assert_eq!(value.to_decimal(), (1000000007u64 / 900).to_string());
    }
}
