// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Aztec low-level decoder: corrected data bits back to text.

use symbology_core::charset::CharacterSet;
use symbology_core::content::{AiFlag, Content, SymbologyIdentifier};
use symbology_core::errors::{format_error, Result};
use symbology_core::io::BitBuffer;

use crate::high_level::Mode;

/// Control codes shared by the character tables. Values do not overlap the printable entries.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Entry {
    Char(u8),
    /// Two-character pair (CR LF, ". ", ", ", ": ").
    Pair(&'static [u8; 2]),
    CtrlPs,
    CtrlPl,
    CtrlUs,
    CtrlUl,
    CtrlLl,
    CtrlMl,
    CtrlDl,
    CtrlBs,
    /// FLG(n): FNC1 or an ECI designator.
    Flag,
}

use Entry::*;

const UPPER_TABLE: [Entry; 32] = [
    CtrlPs, Char(b' '), Char(b'A'), Char(b'B'), Char(b'C'), Char(b'D'), Char(b'E'), Char(b'F'),
    Char(b'G'), Char(b'H'), Char(b'I'), Char(b'J'), Char(b'K'), Char(b'L'), Char(b'M'),
    Char(b'N'), Char(b'O'), Char(b'P'), Char(b'Q'), Char(b'R'), Char(b'S'), Char(b'T'),
    Char(b'U'), Char(b'V'), Char(b'W'), Char(b'X'), Char(b'Y'), Char(b'Z'), CtrlLl, CtrlMl,
    CtrlDl, CtrlBs,
];

const LOWER_TABLE: [Entry; 32] = [
    CtrlPs, Char(b' '), Char(b'a'), Char(b'b'), Char(b'c'), Char(b'd'), Char(b'e'), Char(b'f'),
    Char(b'g'), Char(b'h'), Char(b'i'), Char(b'j'), Char(b'k'), Char(b'l'), Char(b'm'),
    Char(b'n'), Char(b'o'), Char(b'p'), Char(b'q'), Char(b'r'), Char(b's'), Char(b't'),
    Char(b'u'), Char(b'v'), Char(b'w'), Char(b'x'), Char(b'y'), Char(b'z'), CtrlUs, CtrlMl,
    CtrlDl, CtrlBs,
];

const MIXED_TABLE: [Entry; 32] = [
    CtrlPs, Char(b' '), Char(0x01), Char(0x02), Char(0x03), Char(0x04), Char(0x05), Char(0x06),
    Char(0x07), Char(0x08), Char(0x09), Char(0x0a), Char(0x0b), Char(0x0c), Char(0x0d),
    Char(0x1b), Char(0x1c), Char(0x1d), Char(0x1e), Char(0x1f), Char(b'@'), Char(b'\\'),
    Char(b'^'), Char(b'_'), Char(b'`'), Char(b'|'), Char(b'~'), Char(0x7f), CtrlLl, CtrlUl,
    CtrlPl, CtrlBs,
];

const PUNCT_TABLE: [Entry; 32] = [
    Flag, Char(b'\r'), Pair(b"\r\n"), Pair(b". "), Pair(b", "), Pair(b": "), Char(b'!'),
    Char(b'"'), Char(b'#'), Char(b'$'), Char(b'%'), Char(b'&'), Char(b'\''), Char(b'('),
    Char(b')'), Char(b'*'), Char(b'+'), Char(b','), Char(b'-'), Char(b'.'), Char(b'/'),
    Char(b':'), Char(b';'), Char(b'<'), Char(b'='), Char(b'>'), Char(b'?'), Char(b'['),
    Char(b']'), Char(b'{'), Char(b'}'), CtrlUl,
];

const DIGIT_TABLE: [Entry; 16] = [
    CtrlPs, Char(b' '), Char(b'0'), Char(b'1'), Char(b'2'), Char(b'3'), Char(b'4'), Char(b'5'),
    Char(b'6'), Char(b'7'), Char(b'8'), Char(b'9'), Char(b','), Char(b'.'), CtrlUl, CtrlUs,
];

fn table_entry(mode: Mode, code: u32) -> Entry {
    match mode {
        Mode::Upper => UPPER_TABLE[code as usize],
        Mode::Lower => LOWER_TABLE[code as usize],
        Mode::Mixed => MIXED_TABLE[code as usize],
        Mode::Punct => PUNCT_TABLE[code as usize],
        Mode::Digit => DIGIT_TABLE[code as usize],
    }
}

fn code_width(mode: Mode) -> usize {
    if mode == Mode::Digit {
        4
    }
    else {
        5
    }
}

/// Decodes the unstuffed, error-corrected high-level bit stream.
///
/// Trailing pad bits at the end of the final codeword read as a truncated code; every read in
/// here therefore treats exhaustion as end of data rather than an error.
pub fn decode_corrected_bits(
    bits: &BitBuffer,
    default_charset: Option<CharacterSet>,
) -> Result<Content> {
    let default_charset = default_charset.unwrap_or(CharacterSet::ISO8859_1);
    let mut reader = bits.reader();
    let mut content = Content::new();
    content.symbology = SymbologyIdentifier { code: 'z', modifier: '0', eci_modifier_offset: 3 };
    content.switch_charset(default_charset);

    let mut latch_mode = Mode::Upper;
    let mut shift_mode: Option<Mode> = None;
    // Tracks whether an FNC1 appears at the very start or right after an application
    // indicator prefix, per the AIM transport rules.
    let mut chars_read = 0usize;

    loop {
        let mode = shift_mode.take().unwrap_or(latch_mode);
        let code = match reader.read_bits(code_width(mode)) {
            Ok(code) => code,
            Err(_) => break,
        };

        match table_entry(mode, code) {
            Char(c) => {
                content.push_byte(c);
                chars_read += 1;
            }
            Pair(pair) => {
                content.push_bytes(pair);
                chars_read += 2;
            }
            CtrlPs => shift_mode = Some(Mode::Punct),
            CtrlUs => shift_mode = Some(Mode::Upper),
            CtrlUl => latch_mode = Mode::Upper,
            CtrlLl => latch_mode = Mode::Lower,
            CtrlMl => latch_mode = Mode::Mixed,
            CtrlDl => latch_mode = Mode::Digit,
            CtrlPl => latch_mode = Mode::Punct,
            CtrlBs => {
                // Binary shift: a 5-bit length, or 0 followed by an 11-bit extended length
                // biased by 31.
                let length = match reader.read_bits(5) {
                    Ok(0) => match reader.read_bits(11) {
                        Ok(extended) => extended as usize + 31,
                        Err(_) => break,
                    },
                    Ok(length) => length as usize,
                    Err(_) => break,
                };
                for _ in 0..length {
                    content.push_byte(reader.read_bits(8)? as u8);
                    chars_read += 1;
                }
            }
            Flag => {
                // FLG(n): n = 0 is FNC1, 1 to 6 give the digit count of an ECI designator.
                let n = match reader.read_bits(3) {
                    Ok(n) => n,
                    Err(_) => break,
                };
                match n {
                    0 => {
                        if chars_read == 0 {
                            // FNC1 in first position: GS1 data.
                            content.ai_flag = AiFlag::Gs1;
                            content.symbology.modifier = '1';
                        }
                        else if chars_read <= 2 && content.structured_append.is_none() {
                            // FNC1 after an initial letter or two digits: AIM application
                            // indicator.
                            content.ai_flag = AiFlag::Aim;
                            content.symbology.modifier = '2';
                        }
                        else {
                            content.push_byte(0x1d);
                        }
                    }
                    1..=6 => {
                        let mut value = 0u32;
                        for _ in 0..n {
                            let digit = reader.read_bits(4)?;
                            if !(2..=11).contains(&digit) {
                                return format_error("eci designator digit out of range");
                            }
                            value = value * 10 + (digit - 2);
                        }
                        content.apply_eci(value)?;
                    }
                    _ => return format_error("invalid flg(n) value"),
                }
            }
        }
    }

    Ok(content)
}

/// Removes the bit stuffing from the corrected data words, recovering the high-level stream.
pub fn unstuff_bits(words: &[u16], word_size: usize) -> Result<BitBuffer> {
    let mask = (1u16 << word_size) - 2;
    let all_ones = (1u16 << word_size) - 1;
    let mut bits = BitBuffer::new();
    for &word in words {
        if word == 0 || word == all_ones {
            return format_error("data codeword matches a reference pattern");
        }
        if word == mask {
            // A stuffed zero: the low bit is synthetic.
            bits.append_bits(u32::from(word >> 1), word_size - 1);
        }
        else if word == 1 {
            // A stuffed one.
            bits.append_bits(0, word_size - 1);
        }
        else {
            bits.append_bits(u32::from(word), word_size);
        }
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::high_level;

    fn round_trip(text: &[u8]) {
        let bits = high_level::encode(text);
        let content = decode_corrected_bits(&bits, None).unwrap();
        assert_eq!(content.bytes(), text, "round trip failed for {:?}", text);
    }

    #[test]
    fn verify_high_level_round_trips() {
        round_trip(b"A");
        round_trip(b"ABC DEF");
        round_trip(b"hello world");
        round_trip(b"0123456789");
        round_trip(b"Mixed Case 42, and .punct!");
        round_trip(b"a\rb\r\nc. d, e: f");
        round_trip(b"symbols @[]^_`{|}~");
        round_trip(&[0x80, 0xff, 0x00, b'A', 0x90]);
        round_trip(b"A:B;C<D=E>F?");
    }

    #[test]
    fn verify_long_binary_round_trip() {
        let long: Vec<u8> = (0..200u32).map(|i| (i % 251) as u8 | 0x80).collect();
        round_trip(&long);
    }

    #[test]
    fn verify_unstuffing() {
        // The inverse of the stuffing rule for 6-bit words.
        let bits = unstuff_bits(&[0b111110, 0b000001, 0b101010], 6).unwrap();
        assert_eq!(bits.len(), 5 + 5 + 6);
        let mut reader = bits.reader();
        assert_eq!(reader.read_bits(5).unwrap(), 0b11111);
        assert_eq!(reader.read_bits(5).unwrap(), 0b00000);
        assert_eq!(reader.read_bits(6).unwrap(), 0b101010);

        assert!(unstuff_bits(&[0], 6).is_err());
        assert!(unstuff_bits(&[0b111111], 6).is_err());
    }

    #[test]
    fn verify_fnc1_first_position() {
        // FLG(0) at the very start: PUNCT shift from UPPER, code 0, n = 0.
        let mut bits = BitBuffer::new();
        bits.append_bits(0, 5); // CTRL_PS
        bits.append_bits(0, 5); // FLG(n)
        bits.append_bits(0, 3); // n = 0 -> FNC1
        bits.append_bits(2, 5); // 'A'
        let content = decode_corrected_bits(&bits, None).unwrap();
        assert_eq!(content.ai_flag, AiFlag::Gs1);
        assert_eq!(content.bytes(), b"A");
        assert_eq!(content.symbology_identifier(), "]z1");
    }

    #[test]
    fn verify_eci_flag() {
        // FLG(2) with digits 2 6 = ECI 26 (UTF-8), then binary data.
        let mut bits = BitBuffer::new();
        bits.append_bits(0, 5); // CTRL_PS
        bits.append_bits(0, 5); // FLG(n)
        bits.append_bits(2, 3); // two digits
        bits.append_bits(2 + 2, 4);
        bits.append_bits(6 + 2, 4);
        bits.append_bits(31, 5); // B/S
        bits.append_bits(2, 5); // two bytes
        for &b in "é".as_bytes() {
            bits.append_bits(u32::from(b), 8);
        }
        let content = decode_corrected_bits(&bits, None).unwrap();
        assert!(content.has_eci());
        assert_eq!(content.text(), "é");
        assert_eq!(content.symbology_identifier(), "]z3");
    }
}
