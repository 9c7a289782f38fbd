// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The decoded-bit-stream parser: corrected data codewords back to text.
//!
//! See ISO/IEC 18004:2006 6.4.3 through 6.4.7, and GB/T 18284-2000 for the Hanzi extension.

use symbology_core::charset::CharacterSet;
use symbology_core::content::{AiFlag, Content, StructuredAppendInfo, SymbologyIdentifier};
use symbology_core::errors::{format_error, Result};
use symbology_core::io::BitReader;

use crate::mode::{self, CodecMode, ALPHANUMERIC_CHARS};
use crate::version::Version;

const GB2312_SUBSET: u32 = 1;

fn decode_numeric_segment(bits: &mut BitReader<'_>, mut count: usize, content: &mut Content) -> Result<()> {
    while count >= 3 {
        let three_digits = bits.read_bits(10)?;
        if three_digits >= 1000 {
            return format_error("numeric group out of range");
        }
        content.push_byte(b'0' + (three_digits / 100) as u8);
        content.push_byte(b'0' + (three_digits / 10 % 10) as u8);
        content.push_byte(b'0' + (three_digits % 10) as u8);
        count -= 3;
    }
    if count == 2 {
        let two_digits = bits.read_bits(7)?;
        if two_digits >= 100 {
            return format_error("numeric group out of range");
        }
        content.push_byte(b'0' + (two_digits / 10) as u8);
        content.push_byte(b'0' + (two_digits % 10) as u8);
    }
    else if count == 1 {
        let digit = bits.read_bits(4)?;
        if digit >= 10 {
            return format_error("numeric group out of range");
        }
        content.push_byte(b'0' + digit as u8);
    }
    Ok(())
}

fn to_alphanumeric_char(value: u32) -> Result<u8> {
    match ALPHANUMERIC_CHARS.get(value as usize) {
        Some(&c) => Ok(c),
        None => format_error("alphanumeric value out of range"),
    }
}

fn decode_alphanumeric_segment(
    bits: &mut BitReader<'_>,
    mut count: usize,
    gs1: bool,
    content: &mut Content,
) -> Result<()> {
    let mut buffer = Vec::with_capacity(count);
    while count > 1 {
        let two_chars = bits.read_bits(11)?;
        buffer.push(to_alphanumeric_char(two_chars / 45)?);
        buffer.push(to_alphanumeric_char(two_chars % 45)?);
        count -= 2;
    }
    if count == 1 {
        buffer.push(to_alphanumeric_char(bits.read_bits(6)?)?);
    }
    if gs1 {
        // In a GS1 stream, %% renders as a literal percent and a lone % is the FNC1
        // separator (GS). See ISO/IEC 18004:2006 6.4.8.1.
        let mut escaped = Vec::with_capacity(buffer.len());
        let mut i = 0;
        while i < buffer.len() {
            if buffer[i] == b'%' {
                if i + 1 < buffer.len() && buffer[i + 1] == b'%' {
                    escaped.push(b'%');
                    i += 2;
                    continue;
                }
                escaped.push(0x1d);
                i += 1;
                continue;
            }
            escaped.push(buffer[i]);
            i += 1;
        }
        buffer = escaped;
    }
    content.push_bytes(&buffer);
    Ok(())
}

fn decode_byte_segment(
    bits: &mut BitReader<'_>,
    count: usize,
    charset: CharacterSet,
    content: &mut Content,
) -> Result<()> {
    content.switch_charset(charset);
    for _ in 0..count {
        content.push_byte(bits.read_bits(8)? as u8);
    }
    Ok(())
}

fn decode_kanji_segment(bits: &mut BitReader<'_>, count: usize, content: &mut Content) -> Result<()> {
    content.switch_charset(CharacterSet::ShiftJIS);
    for _ in 0..count {
        // Each 13-bit value unshifts into a two-byte Shift_JIS character.
        let two_bytes = bits.read_bits(13)?;
        let mut assembled = ((two_bytes / 0x0c0) << 8) | (two_bytes % 0x0c0);
        if assembled < 0x01f00 {
            // In the 0x8140 to 0x9ffc range.
            assembled += 0x08140;
        }
        else {
            // In the 0xe040 to 0xebbf range.
            assembled += 0x0c140;
        }
        content.push_byte((assembled >> 8) as u8);
        content.push_byte(assembled as u8);
    }
    Ok(())
}

fn decode_hanzi_segment(bits: &mut BitReader<'_>, count: usize, content: &mut Content) -> Result<()> {
    content.switch_charset(CharacterSet::GB2312);
    for _ in 0..count {
        // Each 13-bit value unshifts into a two-byte GB2312 character.
        let two_bytes = bits.read_bits(13)?;
        let mut assembled = ((two_bytes / 0x060) << 8) | (two_bytes % 0x060);
        if assembled < 0x003bf {
            // In the 0xa1a1 to 0xaafe range.
            assembled += 0x0a1a1;
        }
        else {
            // In the 0xb0a1 to 0xfafe range.
            assembled += 0x0a6a1;
        }
        content.push_byte((assembled >> 8) as u8);
        content.push_byte(assembled as u8);
    }
    Ok(())
}

/// The variable-width in-stream ECI value: 1, 2, or 3 bytes selected by the leading bits.
fn parse_eci_value(bits: &mut BitReader<'_>) -> Result<u32> {
    let first_byte = bits.read_bits(8)?;
    if first_byte & 0x80 == 0 {
        return Ok(first_byte & 0x7f);
    }
    if first_byte & 0xc0 == 0x80 {
        let second_byte = bits.read_bits(8)?;
        return Ok(((first_byte & 0x3f) << 8) | second_byte);
    }
    if first_byte & 0xe0 == 0xc0 {
        let second_third_bytes = bits.read_bits(16)?;
        return Ok(((first_byte & 0x1f) << 16) | second_third_bytes);
    }
    format_error("invalid eci designator")
}

/// Decodes the corrected data codeword stream of one symbol into a `Content`.
pub fn decode_bit_stream(
    bytes: &[u8],
    version: &Version,
    default_charset: Option<CharacterSet>,
) -> Result<Content> {
    let is_micro = version.is_micro();
    let mode_bits_length = mode::codec_mode_bits_length(version);
    let terminator_length = mode::terminator_bits_length(version);
    let default_charset = default_charset.unwrap_or(CharacterSet::ISO8859_1);

    let mut bits = BitReader::new(bytes);
    let mut content = Content::new();
    content.symbology = SymbologyIdentifier { code: 'Q', modifier: '1', eci_modifier_offset: 1 };
    content.version_number = Some(version.number());

    // The character set selected by an ECI, applying to subsequent byte segments only.
    let mut eci_charset: Option<CharacterSet> = None;
    let mut first_segment = true;

    loop {
        let available = bits.available();
        if available < mode_bits_length || available == 0 {
            // The terminator may be omitted when the data fills the symbol exactly.
            break;
        }
        if is_micro {
            // A micro terminator is a run of zeros longer than the mode indicator.
            let probe = available.min(terminator_length);
            if bits.peek_bits(probe)? == 0 {
                break;
            }
        }

        let mode = if is_micro && mode_bits_length == 0 {
            CodecMode::Numeric
        }
        else {
            CodecMode::for_bits(bits.read_bits(mode_bits_length)?, is_micro)?
        };

        match mode {
            CodecMode::Terminator => break,
            CodecMode::Fnc1FirstPosition => {
                if !first_segment {
                    return format_error("fnc1 must precede the data segments");
                }
                content.ai_flag = AiFlag::Gs1;
                content.symbology.modifier = '3';
            }
            CodecMode::Fnc1SecondPosition => {
                if !first_segment {
                    return format_error("fnc1 must precede the data segments");
                }
                content.ai_flag = AiFlag::Aim;
                content.symbology.modifier = '5';
                // The application indicator: two digits or a letter (offset by 100).
                let indicator = bits.read_bits(8)?;
                match indicator {
                    0..=99 => {
                        content.push_byte(b'0' + (indicator / 10) as u8);
                        content.push_byte(b'0' + (indicator % 10) as u8);
                    }
                    165..=190 | 197..=222 => content.push_byte((indicator - 100) as u8),
                    _ => return format_error("invalid fnc1 application indicator"),
                }
            }
            CodecMode::StructuredAppend => {
                if !first_segment {
                    return format_error("structured append must precede the data segments");
                }
                let index = bits.read_bits(4)? as u16;
                let count = bits.read_bits(4)? as u16 + 1;
                let parity = bits.read_bits(8)?;
                content.structured_append =
                    Some(StructuredAppendInfo { index, count, id: parity.to_string() });
            }
            CodecMode::Eci => {
                let value = parse_eci_value(&mut bits)?;
                content.apply_eci(value)?;
                eci_charset = CharacterSet::from_eci(value);
            }
            CodecMode::Hanzi => {
                // The Hanzi subset indicator precedes the character count.
                let subset = bits.read_bits(4)?;
                if subset != GB2312_SUBSET {
                    return format_error("unknown hanzi subset");
                }
                let count = bits.read_bits(CodecMode::Hanzi.character_count_bits(version))?;
                decode_hanzi_segment(&mut bits, count as usize, &mut content)?;
            }
            _ => {
                let count = bits.read_bits(mode.character_count_bits(version))? as usize;
                match mode {
                    CodecMode::Numeric => decode_numeric_segment(&mut bits, count, &mut content)?,
                    CodecMode::Alphanumeric => decode_alphanumeric_segment(
                        &mut bits,
                        count,
                        content.ai_flag == AiFlag::Gs1,
                        &mut content,
                    )?,
                    CodecMode::Byte => {
                        let charset = eci_charset.unwrap_or(default_charset);
                        decode_byte_segment(&mut bits, count, charset, &mut content)?;
                    }
                    CodecMode::Kanji => decode_kanji_segment(&mut bits, count, &mut content)?,
                    _ => return format_error("invalid codec mode"),
                }
            }
        }
        first_segment = false;
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(number: u32) -> &'static Version {
        Version::from_number(number, false).unwrap()
    }

    #[test]
    fn verify_scenario_codeword_stream() {
        // 0x20 0x09 0x40: alphanumeric, count 1, value 10 = 'A', then terminator.
        let content = decode_bit_stream(&[0x20, 0x09, 0x40], v(1), None).unwrap();
        assert_eq!(content.text(), "A");
        assert_eq!(content.symbology_identifier(), "]Q1");
    }

    #[test]
    fn verify_numeric_stream() {
        // Mode 0001, count 8 (10 bits), 012 345 67.
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x1, 4);
        stream.append_bits(8, 10);
        stream.append_bits(12, 10);
        stream.append_bits(345, 10);
        stream.append_bits(67, 7);
        stream.append_bits(0, 4);
        let content = decode_bit_stream(stream.as_bytes(), v(1), None).unwrap();
        assert_eq!(content.text(), "01234567");
    }

    #[test]
    fn verify_byte_stream_with_eci() {
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x7, 4); // ECI
        stream.append_bits(26, 8); // UTF-8
        stream.append_bits(0x4, 4); // byte mode
        let bytes = "héllo".as_bytes();
        stream.append_bits(bytes.len() as u32, 8);
        for &b in bytes {
            stream.append_bits(u32::from(b), 8);
        }
        stream.append_bits(0, 4);
        let content = decode_bit_stream(stream.as_bytes(), v(1), None).unwrap();
        assert_eq!(content.text(), "héllo");
        assert!(content.has_eci());
        assert_eq!(content.symbology_identifier(), "]Q2");
    }

    #[test]
    fn verify_kanji_stream() {
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x8, 4);
        stream.append_bits(2, 8);
        stream.append_bits(0xe3a, 13); // 日 = 0x93fa -> 0x12ba -> 0x12 * 0xc0 + 0xba
        stream.append_bits(0xffb, 13); // 本 = 0x967b -> 0x153b -> 0x15 * 0xc0 + 0x3b
        stream.append_bits(0, 4);
        let content = decode_bit_stream(stream.as_bytes(), v(1), None).unwrap();
        assert_eq!(content.text(), "日本");
    }

    #[test]
    fn verify_gs1_percent_conversion() {
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x5, 4); // FNC1 first position
        stream.append_bits(0x2, 4); // alphanumeric
        stream.append_bits(5, 9);
        // "A%%B%" -> A%B<GS>
        let codes = [10u32, 38, 38, 11, 38];
        stream.append_bits(codes[0] * 45 + codes[1], 11);
        stream.append_bits(codes[2] * 45 + codes[3], 11);
        stream.append_bits(codes[4], 6);
        stream.append_bits(0, 4);
        let content = decode_bit_stream(stream.as_bytes(), v(1), None).unwrap();
        assert_eq!(content.bytes(), b"A%B\x1d");
        assert_eq!(content.ai_flag, AiFlag::Gs1);
        assert_eq!(content.symbology_identifier(), "]Q3");
    }

    #[test]
    fn verify_structured_append_header() {
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x3, 4); // structured append
        stream.append_bits(2, 4); // index
        stream.append_bits(3, 4); // count - 1
        stream.append_bits(0xa7, 8); // parity
        stream.append_bits(0x1, 4); // numeric
        stream.append_bits(1, 10);
        stream.append_bits(7, 4);
        stream.append_bits(0, 4);
        let content = decode_bit_stream(stream.as_bytes(), v(1), None).unwrap();
        let sa = content.structured_append.clone().unwrap();
        assert_eq!(sa.index, 2);
        assert_eq!(sa.count, 4);
        assert_eq!(sa.id, "167");
        assert_eq!(content.text(), "7");
    }

    #[test]
    fn verify_fnc1_second_position() {
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x9, 4);
        stream.append_bits(165, 8); // 'A'
        stream.append_bits(0x1, 4);
        stream.append_bits(2, 10);
        stream.append_bits(42, 7);
        stream.append_bits(0, 4);
        let content = decode_bit_stream(stream.as_bytes(), v(1), None).unwrap();
        assert_eq!(content.text(), "A42");
        assert_eq!(content.ai_flag, AiFlag::Aim);
        assert_eq!(content.symbology_identifier(), "]Q5");
    }

    #[test]
    fn verify_malformed_streams_rejected() {
        // Unknown mode indicator.
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x6, 4);
        stream.append_bits(0, 12);
        assert!(decode_bit_stream(stream.as_bytes(), v(1), None).is_err());

        // Character count runs past the stream.
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x4, 4);
        stream.append_bits(200, 8);
        stream.append_bits(0xff, 8);
        assert!(decode_bit_stream(stream.as_bytes(), v(1), None).is_err());

        // Structured append after a data segment.
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0x1, 4);
        stream.append_bits(1, 10);
        stream.append_bits(7, 4);
        stream.append_bits(0x3, 4);
        stream.append_bits(0, 16);
        assert!(decode_bit_stream(stream.as_bytes(), v(1), None).is_err());
    }

    #[test]
    fn verify_micro_stream() {
        // M2: 1-bit mode, numeric count 4 bits.
        let version = Version::from_number(2, true).unwrap();
        let mut stream = symbology_core::io::BitBuffer::new();
        stream.append_bits(0, 1); // numeric
        stream.append_bits(3, 4);
        stream.append_bits(123, 10);
        stream.append_bits(0, 5); // terminator
        let content = decode_bit_stream(stream.as_bytes(), version, None).unwrap();
        assert_eq!(content.text(), "123");
    }
}
