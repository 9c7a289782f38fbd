// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codec modes and their per-version bit-field widths.

use symbology_core::errors::{format_error, Result};

use crate::version::Version;

/// A segment mode, with the discriminant equal to the full-size symbol's 4-bit mode indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecMode {
    Terminator = 0x00,
    Numeric = 0x01,
    Alphanumeric = 0x02,
    StructuredAppend = 0x03,
    Byte = 0x04,
    Fnc1FirstPosition = 0x05,
    Eci = 0x07,
    Kanji = 0x08,
    Fnc1SecondPosition = 0x09,
    Hanzi = 0x0d,
}

impl CodecMode {
    /// Decodes a mode indicator. Micro symbols use a compressed 0 to 3 bit indicator.
    pub fn for_bits(bits: u32, is_micro: bool) -> Result<CodecMode> {
        if !is_micro {
            let mode = match bits {
                0x00 => CodecMode::Terminator,
                0x01 => CodecMode::Numeric,
                0x02 => CodecMode::Alphanumeric,
                0x03 => CodecMode::StructuredAppend,
                0x04 => CodecMode::Byte,
                0x05 => CodecMode::Fnc1FirstPosition,
                0x07 => CodecMode::Eci,
                0x08 => CodecMode::Kanji,
                0x09 => CodecMode::Fnc1SecondPosition,
                0x0d => CodecMode::Hanzi,
                _ => return format_error("invalid codec mode"),
            };
            Ok(mode)
        }
        else {
            match bits {
                0 => Ok(CodecMode::Numeric),
                1 => Ok(CodecMode::Alphanumeric),
                2 => Ok(CodecMode::Byte),
                3 => Ok(CodecMode::Kanji),
                _ => format_error("invalid codec mode"),
            }
        }
    }

    /// The Micro QR mode indicator for this mode.
    pub fn micro_bits(&self) -> Result<u32> {
        match *self {
            CodecMode::Numeric => Ok(0),
            CodecMode::Alphanumeric => Ok(1),
            CodecMode::Byte => Ok(2),
            CodecMode::Kanji => Ok(3),
            _ => format_error("mode not available in a micro symbol"),
        }
    }

    /// The width of the character count field for this mode in the given version.
    pub fn character_count_bits(&self, version: &Version) -> usize {
        let number = version.number() as usize;
        if version.is_micro() {
            return match *self {
                CodecMode::Numeric => [3, 4, 5, 6][number - 1],
                CodecMode::Alphanumeric => [3, 4, 5][number - 2],
                CodecMode::Byte => [4, 5][number - 3],
                CodecMode::Kanji | CodecMode::Hanzi => [3, 4][number - 3],
                _ => 0,
            };
        }

        let class = if number <= 9 {
            0
        }
        else if number <= 26 {
            1
        }
        else {
            2
        };

        match *self {
            CodecMode::Numeric => [10, 12, 14][class],
            CodecMode::Alphanumeric => [9, 11, 13][class],
            CodecMode::Byte => [8, 16, 16][class],
            CodecMode::Kanji | CodecMode::Hanzi => [8, 10, 12][class],
            _ => 0,
        }
    }
}

/// The width of the mode indicator: 4 bits for QR, version - 1 for Micro.
pub fn codec_mode_bits_length(version: &Version) -> usize {
    if version.is_micro() {
        version.number() as usize - 1
    }
    else {
        4
    }
}

/// The width of the terminator: 4 bits for QR, 2 * version + 1 for Micro.
pub fn terminator_bits_length(version: &Version) -> usize {
    if version.is_micro() {
        version.number() as usize * 2 + 1
    }
    else {
        4
    }
}

/// The 45-character alphanumeric alphabet of ISO/IEC 18004:2006 Table 5.
pub const ALPHANUMERIC_CHARS: [u8; 45] = [
    b'0', b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9', b'A', b'B', b'C', b'D', b'E',
    b'F', b'G', b'H', b'I', b'J', b'K', b'L', b'M', b'N', b'O', b'P', b'Q', b'R', b'S', b'T',
    b'U', b'V', b'W', b'X', b'Y', b'Z', b' ', b'$', b'%', b'*', b'+', b'-', b'.', b'/', b':',
];

/// The index of `c` in the alphanumeric alphabet, or `None`.
pub fn alphanumeric_code(c: char) -> Option<u32> {
    u32::try_from(c)
        .ok()
        .and_then(|c| u8::try_from(c).ok())
        .and_then(|c| ALPHANUMERIC_CHARS.iter().position(|&a| a == c))
        .map(|i| i as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_mode_round_trip() {
        for bits in [0x00u32, 0x01, 0x02, 0x03, 0x04, 0x05, 0x07, 0x08, 0x09, 0x0d] {
            let mode = CodecMode::for_bits(bits, false).unwrap();
            assert_eq!(mode as u32, bits);
        }
        assert!(CodecMode::for_bits(0x06, false).is_err());
        assert!(CodecMode::for_bits(0x0a, false).is_err());
    }

    #[test]
    fn verify_character_count_bits() {
        let v1 = Version::from_number(1, false).unwrap();
        let v10 = Version::from_number(10, false).unwrap();
        let v27 = Version::from_number(27, false).unwrap();
        assert_eq!(CodecMode::Numeric.character_count_bits(v1), 10);
        assert_eq!(CodecMode::Numeric.character_count_bits(v10), 12);
        assert_eq!(CodecMode::Numeric.character_count_bits(v27), 14);
        assert_eq!(CodecMode::Byte.character_count_bits(v1), 8);
        assert_eq!(CodecMode::Byte.character_count_bits(v27), 16);
        assert_eq!(CodecMode::Kanji.character_count_bits(v10), 10);

        let m3 = Version::from_number(3, true).unwrap();
        assert_eq!(CodecMode::Numeric.character_count_bits(m3), 5);
        assert_eq!(CodecMode::Byte.character_count_bits(m3), 4);
        assert_eq!(codec_mode_bits_length(m3), 2);
        assert_eq!(terminator_bits_length(m3), 7);
        assert_eq!(terminator_bits_length(v1), 4);
    }

    #[test]
    fn verify_alphanumeric_table() {
        assert_eq!(alphanumeric_code('0'), Some(0));
        assert_eq!(alphanumeric_code('A'), Some(10));
        assert_eq!(alphanumeric_code('Z'), Some(35));
        assert_eq!(alphanumeric_code(' '), Some(36));
        assert_eq!(alphanumeric_code(':'), Some(44));
        assert_eq!(alphanumeric_code('a'), None);
        assert_eq!(alphanumeric_code('#'), None);
    }
}
