// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The general-purpose data decoder of GS1 DataBar Expanded: a bit stream switching between
//! numeric, alphanumeric, and ISO/IEC 646 blocks, with FNC1 as field separator.
//! See ISO/IEC 24724 7.2.5.

use symbology_core::errors::{format_error, Result};
use symbology_core::io::BitBuffer;

/// FNC1 stand-in inside decoded field text; not a member of any of the three character sets.
pub const FNC1_CHAR: u8 = b'$';

#[derive(Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Numeric,
    Alpha,
    IsoIec646,
}

pub struct ParsingState {
    pub position: usize,
    encoding: Encoding,
}

impl ParsingState {
    pub fn new(position: usize) -> ParsingState {
        ParsingState { position, encoding: Encoding::Numeric }
    }
}

/// The decoded text of one general-purpose field, plus the pending digit of a numeric pair
/// that was cut in half by an FNC1.
pub struct DecodedInformation {
    pub new_position: usize,
    pub new_string: String,
    pub remaining_value: Option<u32>,
}

pub fn extract_numeric(bits: &BitBuffer, pos: usize, count: usize) -> u32 {
    let mut value = 0;
    for i in 0..count {
        value = (value << 1) | u32::from(bits.bit(pos + i));
    }
    value
}

fn is_still_numeric(bits: &BitBuffer, pos: usize) -> bool {
    // Numeric continues while 7 positions remain and one of the first 4 bits is set, or at
    // the very tail where a 4-bit terminator may sit.
    if pos + 7 > bits.len() {
        return pos + 4 <= bits.len();
    }
    (pos..pos + 4).any(|i| bits.bit(i))
}

fn is_still_alpha(bits: &BitBuffer, pos: usize) -> bool {
    if pos + 5 > bits.len() {
        return false;
    }
    let five_bit_value = extract_numeric(bits, pos, 5);
    if (5..16).contains(&five_bit_value) {
        return true;
    }
    if pos + 6 > bits.len() {
        return false;
    }
    let six_bit_value = extract_numeric(bits, pos, 6);
    (16..63).contains(&six_bit_value)
}

fn is_still_iso_iec_646(bits: &BitBuffer, pos: usize) -> bool {
    if pos + 5 > bits.len() {
        return false;
    }
    let five_bit_value = extract_numeric(bits, pos, 5);
    if (5..16).contains(&five_bit_value) {
        return true;
    }
    if pos + 7 > bits.len() {
        return false;
    }
    let seven_bit_value = extract_numeric(bits, pos, 7);
    if (64..116).contains(&seven_bit_value) {
        return true;
    }
    if pos + 8 > bits.len() {
        return false;
    }
    let eight_bit_value = extract_numeric(bits, pos, 8);
    (232..253).contains(&eight_bit_value)
}

fn is_alpha_or_646_to_numeric_latch(bits: &BitBuffer, pos: usize) -> bool {
    // Three zero bits latch back to numeric.
    if pos + 3 > bits.len() {
        return false;
    }
    (pos..pos + 3).all(|i| !bits.bit(i))
}

fn is_alpha_to_646_to_alpha_latch(bits: &BitBuffer, pos: usize) -> bool {
    // The 00100 latch toggles between alphanumeric and ISO 646, possibly truncated at the
    // symbol end.
    if pos + 1 > bits.len() {
        return false;
    }
    for i in 0..5.min(bits.len() - pos) {
        if i == 2 {
            if !bits.bit(pos + 2) {
                return false;
            }
        }
        else if bits.bit(pos + i) {
            return false;
        }
    }
    true
}

fn is_numeric_to_alpha_numeric_latch(bits: &BitBuffer, pos: usize) -> bool {
    // Four zero bits, possibly truncated at the symbol end.
    if pos + 1 > bits.len() {
        return false;
    }
    for i in 0..4.min(bits.len() - pos) {
        if bits.bit(pos + i) {
            return false;
        }
    }
    true
}

/// A decoded alphanumeric character, or FNC1.
fn decode_alphanumeric(bits: &BitBuffer, pos: usize) -> Result<(usize, u8)> {
    let five_bit_value = extract_numeric(bits, pos, 5);
    if five_bit_value == 15 {
        return Ok((pos + 5, FNC1_CHAR));
    }
    if (5..15).contains(&five_bit_value) {
        return Ok((pos + 5, b'0' + (five_bit_value - 5) as u8));
    }
    let six_bit_value = extract_numeric(bits, pos, 6);
    if (32..58).contains(&six_bit_value) {
        return Ok((pos + 6, (six_bit_value + 33) as u8));
    }
    const LUT_58_TO_62: &[u8; 5] = b"*,-./";
    match six_bit_value {
        58..=62 => Ok((pos + 6, LUT_58_TO_62[(six_bit_value - 58) as usize])),
        _ => format_error("invalid alphanumeric value"),
    }
}

fn decode_iso_iec_646(bits: &BitBuffer, pos: usize) -> Result<(usize, u8)> {
    let five_bit_value = extract_numeric(bits, pos, 5);
    if five_bit_value == 15 {
        return Ok((pos + 5, FNC1_CHAR));
    }
    if (5..15).contains(&five_bit_value) {
        return Ok((pos + 5, b'0' + (five_bit_value - 5) as u8));
    }
    let seven_bit_value = extract_numeric(bits, pos, 7);
    if (64..90).contains(&seven_bit_value) {
        return Ok((pos + 7, (seven_bit_value + 1) as u8));
    }
    if (90..116).contains(&seven_bit_value) {
        return Ok((pos + 7, (seven_bit_value + 7) as u8));
    }
    const LUT_232_TO_252: &[u8; 21] = b"!\"%&'()*+,-./:;<=>?_ ";
    let eight_bit_value = extract_numeric(bits, pos, 8);
    match eight_bit_value {
        232..=252 => Ok((pos + 8, LUT_232_TO_252[(eight_bit_value - 232) as usize])),
        _ => format_error("invalid iso/iec 646 value"),
    }
}

/// A numeric pair; the value 10 in either slot stands for FNC1.
fn decode_numeric(bits: &BitBuffer, pos: usize) -> Result<(usize, u32, u32)> {
    if pos + 7 > bits.len() {
        let numeric = extract_numeric(bits, pos, 4.min(bits.len() - pos));
        if numeric == 0 {
            return Ok((bits.len(), 10, 10));
        }
        return Ok((bits.len(), numeric - 1, 10));
    }
    let numeric = extract_numeric(bits, pos, 7);
    if numeric < 8 {
        return format_error("invalid numeric pair");
    }
    let digit1 = (numeric - 8) / 11;
    let digit2 = (numeric - 8) % 11;
    Ok((pos + 7, digit1, digit2))
}

fn parse_numeric_block(
    bits: &BitBuffer,
    state: &mut ParsingState,
    buffer: &mut String,
) -> Result<Option<DecodedInformation>> {
    while is_still_numeric(bits, state.position) {
        let (new_position, digit1, digit2) = decode_numeric(bits, state.position)?;
        state.position = new_position;

        if digit1 == 10 {
            // FNC1 in the first slot ends the field; a real digit may follow in the second.
            let remaining = if digit2 == 10 { None } else { Some(digit2) };
            return Ok(Some(DecodedInformation {
                new_position: state.position,
                new_string: buffer.clone(),
                remaining_value: remaining,
            }));
        }
        buffer.push(char::from(b'0' + digit1 as u8));
        if digit2 == 10 {
            return Ok(Some(DecodedInformation {
                new_position: state.position,
                new_string: buffer.clone(),
                remaining_value: None,
            }));
        }
        buffer.push(char::from(b'0' + digit2 as u8));
    }

    if is_numeric_to_alpha_numeric_latch(bits, state.position) {
        state.encoding = Encoding::Alpha;
        state.position += 4;
    }
    Ok(None)
}

fn parse_alpha_block(
    bits: &BitBuffer,
    state: &mut ParsingState,
    buffer: &mut String,
) -> Result<Option<DecodedInformation>> {
    while is_still_alpha(bits, state.position) {
        let (new_position, ch) = decode_alphanumeric(bits, state.position)?;
        state.position = new_position;
        if ch == FNC1_CHAR {
            return Ok(Some(DecodedInformation {
                new_position: state.position,
                new_string: buffer.clone(),
                remaining_value: None,
            }));
        }
        buffer.push(char::from(ch));
    }

    if is_alpha_or_646_to_numeric_latch(bits, state.position) {
        state.position += 3;
        state.encoding = Encoding::Numeric;
    }
    else if is_alpha_to_646_to_alpha_latch(bits, state.position) {
        state.position = (state.position + 5).min(bits.len());
        state.encoding = Encoding::IsoIec646;
    }
    Ok(None)
}

fn parse_iso_iec_646_block(
    bits: &BitBuffer,
    state: &mut ParsingState,
    buffer: &mut String,
) -> Result<Option<DecodedInformation>> {
    while is_still_iso_iec_646(bits, state.position) {
        let (new_position, ch) = decode_iso_iec_646(bits, state.position)?;
        state.position = new_position;
        if ch == FNC1_CHAR {
            return Ok(Some(DecodedInformation {
                new_position: state.position,
                new_string: buffer.clone(),
                remaining_value: None,
            }));
        }
        buffer.push(char::from(ch));
    }

    if is_alpha_or_646_to_numeric_latch(bits, state.position) {
        state.position += 3;
        state.encoding = Encoding::Numeric;
    }
    else if is_alpha_to_646_to_alpha_latch(bits, state.position) {
        state.position = (state.position + 5).min(bits.len());
        state.encoding = Encoding::Alpha;
    }
    Ok(None)
}

fn parse_blocks(
    bits: &BitBuffer,
    state: &mut ParsingState,
    buffer: &mut String,
) -> Result<Option<DecodedInformation>> {
    loop {
        let initial_position = state.position;
        let result = match state.encoding {
            Encoding::Alpha => parse_alpha_block(bits, state, buffer)?,
            Encoding::IsoIec646 => parse_iso_iec_646_block(bits, state, buffer)?,
            Encoding::Numeric => parse_numeric_block(bits, state, buffer)?,
        };
        if result.is_some() || initial_position == state.position {
            return Ok(result);
        }
    }
}

/// Decodes one general-purpose field starting at `pos`, prefixed with `prefix` (the carry-over
/// digit of a split numeric pair, if any).
pub fn decode_general_purpose_field(
    bits: &BitBuffer,
    state: &mut ParsingState,
    prefix: &str,
) -> Result<DecodedInformation> {
    let mut buffer = String::from(prefix);
    let last_decoded = parse_blocks(bits, state, &mut buffer)?;
    match last_decoded {
        Some(info) if info.remaining_value.is_some() => Ok(DecodedInformation {
            new_position: state.position,
            new_string: buffer,
            remaining_value: info.remaining_value,
        }),
        _ => Ok(DecodedInformation {
            new_position: state.position,
            new_string: buffer,
            remaining_value: None,
        }),
    }
}

/// Decodes fields back to back until the stream stops advancing, running each through the AI
/// field parser.
pub fn decode_all_codes(bits: &BitBuffer, mut pos: usize) -> Result<String> {
    let mut result = String::new();
    let mut remaining = String::new();
    loop {
        let mut state = ParsingState::new(pos);
        let info = decode_general_purpose_field(bits, &mut state, &remaining)?;
        if !info.new_string.is_empty() {
            result.push_str(&crate::rss::field_parser::parse_fields_in_general_purpose(
                &info.new_string,
            )?);
        }
        remaining = match info.remaining_value {
            Some(value) => value.to_string(),
            None => String::new(),
        };
        if pos == info.new_position {
            break;
        }
        pos = info.new_position;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(s: &str) -> BitBuffer {
        let mut bits = BitBuffer::new();
        for c in s.chars().filter(|&c| c == '0' || c == '1') {
            bits.append_bit(c == '1');
        }
        bits
    }

    #[test]
    fn verify_numeric_pairs() {
        // Value 8 encodes digits (0, 0); 8 + 11 * d1 + d2.
        let bits = bits_of("0001000"); // 8
        let (_, d1, d2) = decode_numeric(&bits, 0).unwrap();
        assert_eq!((d1, d2), (0, 0));

        // digits (2, 5) -> 8 + 22 + 5 = 35.
        let bits = bits_of("0100011");
        let (_, d1, d2) = decode_numeric(&bits, 0).unwrap();
        assert_eq!((d1, d2), (2, 5));
    }

    #[test]
    fn verify_numeric_field_decode() {
        // Digits "2015" as two numeric pairs: (2,0) = 8+22+0 = 30, (1,5) = 8+11+5 = 24.
        let bits = bits_of("0011110 0011000");
        let mut state = ParsingState::new(0);
        let info = decode_general_purpose_field(&bits, &mut state, "").unwrap();
        assert_eq!(info.new_string, "2015");
    }

    #[test]
    fn verify_alpha_switch_and_chars() {
        // Numeric latch to alpha (0000), then 'A' = six-bit 32, 'B' = 33, then FNC1 (5-bit 15).
        let bits = bits_of("0000 100000 100001 01111");
        let mut state = ParsingState::new(0);
        let info = decode_general_purpose_field(&bits, &mut state, "").unwrap();
        assert_eq!(info.new_string, "AB");
    }

    #[test]
    fn verify_iso646_chars() {
        // Latch alpha (0000), latch 646 (00100), 'a' = seven-bit 90 + 7 = 0x61 -> value 90.
        let bits = bits_of("0000 00100 1011010 1011011");
        let mut state = ParsingState::new(0);
        let info = decode_general_purpose_field(&bits, &mut state, "").unwrap();
        assert_eq!(info.new_string, "ab");
    }
}
