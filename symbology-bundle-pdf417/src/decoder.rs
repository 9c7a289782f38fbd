// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The PDF417 decoded-bit-stream parser: corrected codewords back to content.
//!
//! Codeword 0 is the symbol length descriptor bounding the data region; codewords 900 and up
//! are mode latches, shifts, and the macro structure. See ISO/IEC 15438 5.4.

use symbology_core::charset::CharacterSet;
use symbology_core::content::{Content, StructuredAppendInfo, SymbologyIdentifier};
use symbology_core::errors::{format_error, unsupported_error, Result};

use crate::big_integer;
use crate::high_level::{
    BEGIN_MACRO_BLOCK, BEGIN_MACRO_OPTIONAL_FIELD, BYTE_COMPACTION_MODE_LATCH,
    BYTE_COMPACTION_MODE_LATCH_6, ECI_CHARSET, MACRO_TERMINATOR, MIXED_CHARS,
    MODE_SHIFT_TO_BYTE, NUMERIC_COMPACTION_MODE_LATCH, PUNCT_CHARS, TEXT_COMPACTION_MODE_LATCH,
};

const ECI_USER_DEFINED: u16 = 925;
const ECI_GENERAL_PURPOSE: u16 = 926;
const MAX_NUMERIC_CODEWORDS: usize = 15;

// Sub-mode switch codes within text compaction.
const PL: u16 = 25;
const LL: u16 = 27;
const AS: u16 = 27;
const ML: u16 = 28;
const AL: u16 = 28;
const PS: u16 = 29;
const PAL: u16 = 29;

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubMode {
    Alpha,
    Lower,
    Mixed,
    Punct,
    AlphaShift,
    PunctShift,
}

/// Macro PDF417 optional field designators.
const FIELD_FILE_NAME: u16 = 0;
const FIELD_SEGMENT_COUNT: u16 = 1;
const FIELD_TIME_STAMP: u16 = 2;
const FIELD_SENDER: u16 = 3;
const FIELD_ADDRESSEE: u16 = 4;
const FIELD_FILE_SIZE: u16 = 5;
const FIELD_CHECKSUM: u16 = 6;

/// The macro segmentation metadata of one symbol.
#[derive(Clone, Debug, Default)]
pub struct MacroMetadata {
    pub segment_index: u32,
    pub file_id: String,
    pub segment_count: Option<u32>,
    pub file_name: Option<String>,
    pub sender: Option<String>,
    pub addressee: Option<String>,
    pub time_stamp: Option<u64>,
    pub file_size: Option<u64>,
    pub checksum: Option<u32>,
    pub is_last_segment: bool,
}

fn terminates_compaction(code: u16) -> bool {
    matches!(
        code,
        TEXT_COMPACTION_MODE_LATCH
            | BYTE_COMPACTION_MODE_LATCH
            | NUMERIC_COMPACTION_MODE_LATCH
            | BYTE_COMPACTION_MODE_LATCH_6
            | BEGIN_MACRO_BLOCK
            | BEGIN_MACRO_OPTIONAL_FIELD
            | MACRO_TERMINATOR
    )
}

/// Expands text-compaction codewords into interim sub-mode codes and walks the sub-mode state
/// machine. Returns the index of the codeword that ended the run.
fn text_compaction(codewords: &[u16], mut code_index: usize, output: &mut Vec<u8>) -> usize {
    let boundary = codewords[0] as usize;
    let mut interim: Vec<(u16, u16)> = Vec::new();

    while code_index < boundary {
        let code = codewords[code_index];
        code_index += 1;
        if code < TEXT_COMPACTION_MODE_LATCH {
            interim.push((code / 30, 0));
            interim.push((code % 30, 0));
        }
        else if code == TEXT_COMPACTION_MODE_LATCH {
            // Re-initializes to the Alpha sub-mode.
            interim.push((TEXT_COMPACTION_MODE_LATCH, 0));
        }
        else if code == MODE_SHIFT_TO_BYTE {
            // A single raw byte interleaved into the text stream.
            if code_index < boundary {
                interim.push((MODE_SHIFT_TO_BYTE, codewords[code_index]));
                code_index += 1;
            }
        }
        else if terminates_compaction(code) {
            code_index -= 1;
            break;
        }
    }

    decode_text_interim(&interim, output);
    code_index
}

fn decode_text_interim(interim: &[(u16, u16)], output: &mut Vec<u8>) {
    let mut sub_mode = SubMode::Alpha;
    let mut prior_to_shift = SubMode::Alpha;

    for &(code, byte) in interim {
        let mut ch: u8 = 0;
        match sub_mode {
            SubMode::Alpha => {
                if code < 26 {
                    ch = b'A' + code as u8;
                }
                else if code == 26 {
                    ch = b' ';
                }
                else if code == LL {
                    sub_mode = SubMode::Lower;
                }
                else if code == ML {
                    sub_mode = SubMode::Mixed;
                }
                else if code == PS {
                    prior_to_shift = sub_mode;
                    sub_mode = SubMode::PunctShift;
                }
                else if code == MODE_SHIFT_TO_BYTE {
                    output.push(byte as u8);
                }
            }
            SubMode::Lower => {
                if code < 26 {
                    ch = b'a' + code as u8;
                }
                else if code == 26 {
                    ch = b' ';
                }
                else if code == AS {
                    prior_to_shift = sub_mode;
                    sub_mode = SubMode::AlphaShift;
                }
                else if code == ML {
                    sub_mode = SubMode::Mixed;
                }
                else if code == PS {
                    prior_to_shift = sub_mode;
                    sub_mode = SubMode::PunctShift;
                }
                else if code == MODE_SHIFT_TO_BYTE {
                    output.push(byte as u8);
                }
                else if code == TEXT_COMPACTION_MODE_LATCH {
                    sub_mode = SubMode::Alpha;
                }
            }
            SubMode::Mixed => {
                if code < PL {
                    ch = MIXED_CHARS[code as usize];
                }
                else if code == PL {
                    sub_mode = SubMode::Punct;
                }
                else if code == 26 {
                    ch = b' ';
                }
                else if code == LL {
                    sub_mode = SubMode::Lower;
                }
                else if code == AL {
                    sub_mode = SubMode::Alpha;
                }
                else if code == PS {
                    prior_to_shift = sub_mode;
                    sub_mode = SubMode::PunctShift;
                }
                else if code == MODE_SHIFT_TO_BYTE {
                    output.push(byte as u8);
                }
                else if code == TEXT_COMPACTION_MODE_LATCH {
                    sub_mode = SubMode::Alpha;
                }
            }
            SubMode::Punct => {
                if code < PAL {
                    ch = PUNCT_CHARS[code as usize];
                }
                else if code == PAL {
                    sub_mode = SubMode::Alpha;
                }
                else if code == MODE_SHIFT_TO_BYTE {
                    output.push(byte as u8);
                }
                else if code == TEXT_COMPACTION_MODE_LATCH {
                    sub_mode = SubMode::Alpha;
                }
            }
            SubMode::AlphaShift => {
                sub_mode = prior_to_shift;
                if code < 26 {
                    ch = b'A' + code as u8;
                }
                else if code == 26 {
                    ch = b' ';
                }
                else if code == TEXT_COMPACTION_MODE_LATCH {
                    sub_mode = SubMode::Alpha;
                }
            }
            SubMode::PunctShift => {
                sub_mode = prior_to_shift;
                if code < PAL {
                    ch = PUNCT_CHARS[code as usize];
                }
                else if code == PAL {
                    sub_mode = SubMode::Alpha;
                }
                else if code == MODE_SHIFT_TO_BYTE {
                    // PS ahead of a byte shift acts as padding.
                    output.push(byte as u8);
                }
                else if code == TEXT_COMPACTION_MODE_LATCH {
                    sub_mode = SubMode::Alpha;
                }
            }
        }
        if ch != 0 {
            output.push(ch);
        }
    }
}

/// Byte compaction: groups of five codewords unpack to six bytes; a trailing short group under
/// the 901 latch is one byte per codeword.
fn byte_compaction(
    mode: u16,
    codewords: &[u16],
    mut code_index: usize,
    output: &mut Vec<u8>,
) -> usize {
    let boundary = codewords[0] as usize;
    let mut batch: Vec<u16> = Vec::with_capacity(5);

    while code_index < boundary {
        let code = codewords[code_index];
        if terminates_compaction(code) {
            break;
        }
        code_index += 1;
        batch.push(code);
        if batch.len() == 5 {
            let mut value = 0u64;
            for &cw in &batch {
                value = value * 900 + u64::from(cw);
            }
            for j in (0..6).rev() {
                output.push((value >> (8 * j)) as u8);
            }
            batch.clear();
        }
    }

    // Under the 901 latch the final short group is one byte per codeword; under 924 the
    // count is a multiple of six and nothing remains.
    if mode == BYTE_COMPACTION_MODE_LATCH {
        for &cw in &batch {
            output.push(cw as u8);
        }
    }
    code_index
}

/// Numeric compaction: up to 15 codewords per group, decoded from base 900 with the guard
/// digit stripped.
fn numeric_compaction(
    codewords: &[u16],
    mut code_index: usize,
    output: &mut Vec<u8>,
) -> Result<usize> {
    let boundary = codewords[0] as usize;
    let mut group: Vec<u16> = Vec::with_capacity(MAX_NUMERIC_CODEWORDS);

    while code_index < boundary {
        let code = codewords[code_index];
        code_index += 1;
        let mut end = code_index == boundary;
        let mut flush = false;

        if code < TEXT_COMPACTION_MODE_LATCH {
            group.push(code);
        }
        else if code == NUMERIC_COMPACTION_MODE_LATCH {
            // Re-invoking 902 terminates the current grouping and starts a new one.
            flush = true;
        }
        else if terminates_compaction(code) {
            code_index -= 1;
            end = true;
        }

        if group.len() == MAX_NUMERIC_CODEWORDS || flush || end {
            if !group.is_empty() {
                output.extend(big_integer::decode_base900_to_base10(&group)?.into_bytes());
                group.clear();
            }
        }
        if end {
            break;
        }
    }
    Ok(code_index)
}

fn macro_numeric_field(codewords: &[u16], code_index: usize) -> Result<(String, usize)> {
    let mut digits = Vec::new();
    let next = numeric_compaction(codewords, code_index, &mut digits)?;
    match String::from_utf8(digits) {
        Ok(s) if !s.is_empty() => Ok((s, next)),
        _ => format_error("empty macro numeric field"),
    }
}

/// Parses the Macro PDF417 control block, which runs from the 928 codeword to the end of the
/// data region.
fn decode_macro_block(
    codewords: &[u16],
    mut code_index: usize,
    metadata: &mut MacroMetadata,
) -> Result<usize> {
    let boundary = codewords[0] as usize;
    if code_index + 2 > boundary {
        // At least two codewords of segment index must remain.
        return format_error("truncated macro control block");
    }
    let segment_index_digits =
        big_integer::decode_base900_to_base10(&codewords[code_index..code_index + 2])?;
    metadata.segment_index = segment_index_digits
        .parse()
        .map_err(|_| symbology_core::errors::Error::FormatError("bad macro segment index"))?;
    code_index += 2;

    let mut file_id = Vec::new();
    code_index = text_compaction(codewords, code_index, &mut file_id);
    metadata.file_id = String::from_utf8_lossy(&file_id).into_owned();

    while code_index < boundary {
        match codewords[code_index] {
            BEGIN_MACRO_OPTIONAL_FIELD => {
                code_index += 1;
                if code_index >= boundary {
                    return format_error("truncated macro optional field");
                }
                let designator = codewords[code_index];
                code_index += 1;
                match designator {
                    FIELD_FILE_NAME => {
                        let mut name = Vec::new();
                        code_index = text_compaction(codewords, code_index, &mut name);
                        metadata.file_name = Some(String::from_utf8_lossy(&name).into_owned());
                    }
                    FIELD_SENDER => {
                        let mut sender = Vec::new();
                        code_index = text_compaction(codewords, code_index, &mut sender);
                        metadata.sender = Some(String::from_utf8_lossy(&sender).into_owned());
                    }
                    FIELD_ADDRESSEE => {
                        let mut addressee = Vec::new();
                        code_index = text_compaction(codewords, code_index, &mut addressee);
                        metadata.addressee =
                            Some(String::from_utf8_lossy(&addressee).into_owned());
                    }
                    FIELD_SEGMENT_COUNT => {
                        let (digits, next) = macro_numeric_field(codewords, code_index)?;
                        metadata.segment_count = digits.parse().ok();
                        code_index = next;
                    }
                    FIELD_TIME_STAMP => {
                        let (digits, next) = macro_numeric_field(codewords, code_index)?;
                        metadata.time_stamp = digits.parse().ok();
                        code_index = next;
                    }
                    FIELD_FILE_SIZE => {
                        let (digits, next) = macro_numeric_field(codewords, code_index)?;
                        metadata.file_size = digits.parse().ok();
                        code_index = next;
                    }
                    FIELD_CHECKSUM => {
                        let (digits, next) = macro_numeric_field(codewords, code_index)?;
                        metadata.checksum = digits.parse().ok();
                        code_index = next;
                    }
                    _ => return format_error("unknown macro optional field"),
                }
            }
            MACRO_TERMINATOR => {
                code_index += 1;
                metadata.is_last_segment = true;
            }
            _ => return format_error("unexpected codeword in macro control block"),
        }
    }

    Ok(code_index)
}

/// Decodes the corrected codeword stream of one symbol.
///
/// `codewords[0]` is the symbol length descriptor; `ec_level` is reported in the content
/// metadata.
pub fn decode(codewords: &[u16], ec_level: u8) -> Result<Content> {
    if codewords.len() < 2 {
        return format_error("codeword stream too short");
    }
    let boundary = codewords[0] as usize;
    if boundary < 2 || boundary > codewords.len() {
        return format_error("symbol length descriptor out of range");
    }
    if codewords.iter().any(|&c| c >= 929) {
        return format_error("codeword value out of range");
    }

    let mut content = Content::new();
    content.symbology = SymbologyIdentifier { code: 'L', modifier: '2', eci_modifier_offset: 0 };
    content.ec_level = Some(ec_level.to_string());

    let mut macro_metadata: Option<MacroMetadata> = None;
    let mut code_index = 1usize;

    while code_index < boundary {
        let code = codewords[code_index];
        code_index += 1;
        match code {
            TEXT_COMPACTION_MODE_LATCH => {
                let mut text = Vec::new();
                code_index = text_compaction(codewords, code_index, &mut text);
                content.push_bytes(&text);
            }
            BYTE_COMPACTION_MODE_LATCH | BYTE_COMPACTION_MODE_LATCH_6 => {
                let mut bytes = Vec::new();
                code_index = byte_compaction(code, codewords, code_index, &mut bytes);
                content.push_bytes(&bytes);
            }
            MODE_SHIFT_TO_BYTE => {
                if code_index >= boundary {
                    return format_error("truncated byte shift");
                }
                content.push_byte(codewords[code_index] as u8);
                code_index += 1;
            }
            NUMERIC_COMPACTION_MODE_LATCH => {
                let mut digits = Vec::new();
                code_index = numeric_compaction(codewords, code_index, &mut digits)?;
                content.push_bytes(&digits);
            }
            ECI_CHARSET => {
                if code_index >= boundary {
                    return format_error("truncated eci designator");
                }
                content.apply_eci(u32::from(codewords[code_index]))?;
                code_index += 1;
            }
            ECI_GENERAL_PURPOSE => {
                // Nothing useful can be done with a general-purpose ECI; skip its payload.
                code_index += 2;
            }
            ECI_USER_DEFINED => {
                code_index += 1;
            }
            BEGIN_MACRO_BLOCK => {
                let mut metadata = MacroMetadata::default();
                code_index = decode_macro_block(codewords, code_index, &mut metadata)?;
                macro_metadata = Some(metadata);
            }
            BEGIN_MACRO_OPTIONAL_FIELD | MACRO_TERMINATOR => {
                return format_error("macro codeword outside a control block");
            }
            903..=912 | 914..=921 => {
                // Valid per the standard, but with no assigned meaning here.
                return unsupported_error("reserved codeword");
            }
            _ => {
                // Symbols in the wild sometimes omit the leading text latch; default to text
                // compaction.
                code_index -= 1;
                let mut text = Vec::new();
                code_index = text_compaction(codewords, code_index, &mut text);
                content.push_bytes(&text);
            }
        }
    }

    if let Some(metadata) = macro_metadata {
        content.structured_append = Some(StructuredAppendInfo {
            index: metadata.segment_index as u16,
            count: metadata.segment_count.unwrap_or(0) as u16,
            id: metadata.file_id.clone(),
        });
        content.symbology.modifier = '5';
    }

    if content.is_empty() && content.structured_append.is_none() {
        return format_error("symbol carries no data");
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, Pdf417Options};

    fn data_region(symbol: &crate::encoder::Pdf417Symbol) -> Vec<u16> {
        symbol.codewords[..symbol.codewords[0] as usize].to_vec()
    }

    fn round_trip(text: &str) {
        let symbol = encode(text, &Pdf417Options::default()).unwrap();
        let content = decode(&data_region(&symbol), symbol.ec_level).unwrap();
        assert_eq!(content.text(), text, "round trip failed for {:?}", text);
    }

    #[test]
    fn verify_text_round_trips() {
        round_trip("PDF417");
        round_trip("Pdf417 mixed Case");
        round_trip("punct: [test], (nested). done!");
        round_trip("alpha UPPER lower 12 mixed #+=^ $9.99");
        round_trip("tabs\tand\nnewlines\rtoo");
    }

    #[test]
    fn verify_numeric_round_trips() {
        round_trip("0123456789012");
        round_trip("000213298174000");
        // Two full 44-digit groups plus a remainder.
        let long: String = (0..100).map(|i| char::from(b'0' + (i % 10) as u8)).collect();
        round_trip(&long);
    }

    #[test]
    fn verify_byte_round_trips() {
        let symbol = encode("héllo wörld", &Pdf417Options {
            charset: Some(symbology_core::charset::CharacterSet::UTF8),
            ..Default::default()
        })
        .unwrap();
        let content = decode(&data_region(&symbol), symbol.ec_level).unwrap();
        assert_eq!(content.text(), "héllo wörld");
        assert!(content.has_eci());
    }

    #[test]
    fn verify_mixed_content_round_trip() {
        round_trip("INV-20250731 count 00021329817400055 qty 17");
    }

    #[test]
    fn verify_macro_round_trip() {
        let options = Pdf417Options {
            macro_segment: Some((1, 3, "AB12".to_string())),
            ..Default::default()
        };
        let symbol = encode("segment two of three", &options).unwrap();
        let content = decode(&data_region(&symbol), symbol.ec_level).unwrap();
        assert_eq!(content.text(), "segment two of three");
        let sa = content.structured_append.clone().unwrap();
        assert_eq!(sa.index, 1);
        assert_eq!(sa.count, 3);
        assert_eq!(sa.id, "AB12");
        assert_eq!(content.symbology_identifier(), "]L5");
    }

    #[test]
    fn verify_malformed_streams_rejected() {
        // Length descriptor pointing past the stream.
        assert!(decode(&[10, 900], 2).is_err());
        // Codeword out of the field range.
        assert!(decode(&[3, 900, 930], 2).is_err());
        // Macro optional field outside a macro block.
        assert!(decode(&[3, 900, 923], 2).is_err());
        // Stray terminator.
        assert!(decode(&[2, 922], 2).is_err());
    }

    #[test]
    fn verify_shift_byte_top_level() {
        // 913 at the top level carries exactly one raw byte.
        let content = decode(&[4, 913, 0x41, 900], 2).unwrap();
        assert_eq!(content.text(), "A");
    }
}
