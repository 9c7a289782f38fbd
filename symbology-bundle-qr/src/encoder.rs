// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The high-level encoder: text to mode-segmented bit stream to masked module matrix.

use log::debug;

use symbology_core::charset::CharacterSet;
use symbology_core::ecc::{ReedSolomonEncoder, QR_CODE_FIELD_256};
use symbology_core::errors::{invalid_argument_error, Result};
use symbology_core::io::BitBuffer;
use symbology_core::matrix::BitMatrix;

use crate::mask;
use crate::matrix_util;
use crate::mode::{self, CodecMode};
use crate::version::{ErrorCorrectionLevel, Version};

/// Byte segments with no ECI in effect are encoded as ISO 8859-1.
pub const DEFAULT_BYTE_MODE_ENCODING: CharacterSet = CharacterSet::ISO8859_1;

/// The outcome of an encode: the matrix plus the choices the encoder made.
pub struct EncodeResult {
    pub matrix: BitMatrix,
    pub version: &'static Version,
    pub ec_level: ErrorCorrectionLevel,
    pub mode: CodecMode,
    pub mask_pattern: u8,
}

/// Everything the encoder needs to know besides the text itself.
pub struct EncodeParams {
    pub ec_level: ErrorCorrectionLevel,
    pub charset: CharacterSet,
    /// Force a specific version, or 0 to pick the smallest that fits.
    pub version: u32,
    /// Force a specific data mask.
    pub mask: Option<u8>,
    pub micro: bool,
    pub gs1: bool,
}

fn is_only_double_byte_kanji(content: &str) -> bool {
    let bytes = match CharacterSet::ShiftJIS.encode(content) {
        Some(bytes) => bytes,
        None => return false,
    };
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return false;
    }
    bytes.chunks(2).all(|pair| {
        let b1 = pair[0];
        (0x81..=0x9f).contains(&b1) || (0xe0..=0xeb).contains(&b1)
    })
}

/// Chooses the densest single mode that covers the whole content. The character set acts as a
/// hint: Kanji mode applies only when the caller asked for Shift_JIS and every character is a
/// double-byte JIS X 0208 character.
pub fn choose_mode(content: &str, charset: CharacterSet) -> CodecMode {
    if charset == CharacterSet::ShiftJIS && is_only_double_byte_kanji(content) {
        return CodecMode::Kanji;
    }
    let mut has_numeric = false;
    let mut has_alphanumeric = false;
    for c in content.chars() {
        if c.is_ascii_digit() {
            has_numeric = true;
        }
        else if mode::alphanumeric_code(c).is_some() {
            has_alphanumeric = true;
        }
        else {
            return CodecMode::Byte;
        }
    }
    if has_alphanumeric {
        CodecMode::Alphanumeric
    }
    else if has_numeric {
        CodecMode::Numeric
    }
    else {
        CodecMode::Byte
    }
}

fn append_numeric_bytes(content: &str, bits: &mut BitBuffer) {
    let digits: Vec<u32> = content.bytes().map(|b| u32::from(b - b'0')).collect();
    let mut chunks = digits.chunks_exact(3);
    for chunk in &mut chunks {
        bits.append_bits(chunk[0] * 100 + chunk[1] * 10 + chunk[2], 10);
    }
    match chunks.remainder() {
        [a, b] => bits.append_bits(a * 10 + b, 7),
        [a] => bits.append_bits(*a, 4),
        _ => {}
    }
}

fn append_alphanumeric_bytes(content: &str, bits: &mut BitBuffer) -> Result<()> {
    let mut codes = Vec::with_capacity(content.len());
    for c in content.chars() {
        match mode::alphanumeric_code(c) {
            Some(code) => codes.push(code),
            None => return invalid_argument_error("content is not representable in alphanumeric mode"),
        }
    }
    let mut chunks = codes.chunks_exact(2);
    for chunk in &mut chunks {
        bits.append_bits(chunk[0] * 45 + chunk[1], 11);
    }
    if let [a] = chunks.remainder() {
        bits.append_bits(*a, 6);
    }
    Ok(())
}

fn append_byte_segment(bytes: &[u8], bits: &mut BitBuffer) {
    for &b in bytes {
        bits.append_bits(u32::from(b), 8);
    }
}

fn append_kanji_bytes(content: &str, bits: &mut BitBuffer) -> Result<()> {
    let bytes = match CharacterSet::ShiftJIS.encode(content) {
        Some(bytes) => bytes,
        None => return invalid_argument_error("content is not representable in Shift_JIS"),
    };
    for pair in bytes.chunks(2) {
        if pair.len() != 2 {
            return invalid_argument_error("content is not representable in kanji mode");
        }
        let code = (u32::from(pair[0]) << 8) | u32::from(pair[1]);
        let subtracted = if (0x8140..=0x9ffc).contains(&code) {
            code - 0x8140
        }
        else if (0xe040..=0xebbf).contains(&code) {
            code - 0xc140
        }
        else {
            return invalid_argument_error("content is not representable in kanji mode");
        };
        bits.append_bits((subtracted >> 8) * 0xc0 + (subtracted & 0xff), 13);
    }
    Ok(())
}

/// The in-stream ECI designator: 1, 2, or 3 bytes depending on the value range.
fn append_eci(value: u32, bits: &mut BitBuffer) {
    bits.append_bits(CodecMode::Eci as u32, 4);
    if value < (1 << 7) {
        bits.append_bits(value, 8);
    }
    else if value < (1 << 14) {
        bits.append_bits(0b10, 2);
        bits.append_bits(value, 14);
    }
    else {
        bits.append_bits(0b110, 3);
        bits.append_bits(value, 21);
    }
}

/// The bit capacity of the data region: full data codewords, minus the trailing half codeword
/// of versions M1 and M3.
fn data_bit_capacity(version: &Version, num_data_codewords: u32) -> usize {
    let mut capacity = num_data_codewords as usize * 8;
    if version.is_micro() && version.number() % 2 == 1 {
        capacity -= 4;
    }
    capacity
}

/// Picks the smallest version whose data capacity holds `bits_needed` bits.
fn choose_version(
    bits_needed: usize,
    ec_level: ErrorCorrectionLevel,
    micro: bool,
    mode: CodecMode,
) -> Result<&'static Version> {
    let max = if micro { 4 } else { 40 };
    for number in 1..=max {
        let version = Version::from_number(number, micro)?;
        if micro && !micro_version_supports_mode(version, mode) {
            continue;
        }
        let ec_blocks = match version.ec_blocks_for_level(ec_level) {
            Ok(blocks) => blocks,
            Err(_) => continue,
        };
        let num_data = version.total_codewords() - ec_blocks.total_codewords();
        if data_bit_capacity(version, num_data) >= bits_needed {
            return Ok(version);
        }
    }
    invalid_argument_error("data too big for any version")
}

fn micro_version_supports_mode(version: &Version, mode: CodecMode) -> bool {
    match mode {
        CodecMode::Numeric => true,
        CodecMode::Alphanumeric => version.number() >= 2,
        CodecMode::Byte | CodecMode::Kanji => version.number() >= 3,
        _ => false,
    }
}

/// Appends the terminator, pads to the codeword grid, and fills leftover capacity with the
/// alternating pad codewords. See ISO/IEC 18004:2006 6.4.10.
fn terminate_bits(version: &Version, capacity_bits: usize, bits: &mut BitBuffer) -> Result<()> {
    if bits.len() > capacity_bits {
        return invalid_argument_error("data bits overflow the symbol capacity");
    }
    let terminator_len = mode::terminator_bits_length(version);
    for _ in 0..terminator_len {
        if bits.len() >= capacity_bits {
            break;
        }
        bits.append_bit(false);
    }
    // Pad to the next codeword boundary.
    while bits.len() % 8 != 0 && bits.len() < capacity_bits {
        bits.append_bit(false);
    }
    // Alternating pad codewords fill whole bytes; a trailing half codeword stays all-zero.
    let mut pad_index = 0;
    while capacity_bits - bits.len() >= 8 {
        bits.append_bits(if pad_index % 2 == 0 { 0xec } else { 0x11 }, 8);
        pad_index += 1;
    }
    while bits.len() < capacity_bits {
        bits.append_bit(false);
    }
    Ok(())
}

/// Splits the data bit stream into codewords, computes per-block error correction, and
/// interleaves data then EC codewords across blocks. See ISO/IEC 18004:2006 6.6.
fn interleave_with_ec_bytes(
    data_bits: &BitBuffer,
    version: &Version,
    ec_level: ErrorCorrectionLevel,
) -> Result<BitBuffer> {
    let ec_blocks = version.ec_blocks_for_level(ec_level)?;
    let ec_per_block = ec_blocks.codewords_per_block as usize;

    // Chop the bit stream into data codewords; the half codeword of M1/M3 reads as a 4-bit
    // value.
    let mut reader = data_bits.reader();
    let mut blocks: Vec<(Vec<u16>, usize)> = Vec::new();
    let mut encoder = ReedSolomonEncoder::new(&QR_CODE_FIELD_256);

    for ec_block in ec_blocks.block_array() {
        for _ in 0..ec_block.count {
            let num_data = ec_block.data_codewords as usize;
            let mut message: Vec<u16> = Vec::with_capacity(num_data + ec_per_block);
            for i in 0..num_data {
                let width = if reader.available() == 4 && i == num_data - 1 { 4 } else { 8 };
                message.push(reader.read_bits(width)? as u16);
            }
            message.resize(num_data + ec_per_block, 0);
            encoder.encode(&mut message, ec_per_block)?;
            blocks.push((message, num_data));
        }
    }
    debug_assert_eq!(reader.available(), 0);

    let short_tail = version.is_micro() && version.number() % 2 == 1;
    let max_data = blocks.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let mut output = BitBuffer::new();
    for i in 0..max_data {
        for (block, num_data) in &blocks {
            if i < *num_data {
                // The half codeword of M1/M3 is the final data codeword.
                let width = if short_tail && i == *num_data - 1 { 4 } else { 8 };
                output.append_bits(u32::from(block[i]), width);
            }
        }
    }
    for i in 0..ec_per_block {
        for (block, num_data) in &blocks {
            output.append_bits(u32::from(block[num_data + i]), 8);
        }
    }
    Ok(output)
}

/// Encodes `content` into a finished symbol.
pub fn encode(content: &str, params: &EncodeParams) -> Result<EncodeResult> {
    let mode = choose_mode(content, params.charset);
    let micro = params.micro;

    if micro && (params.gs1 || params.charset != DEFAULT_BYTE_MODE_ENCODING && mode == CodecMode::Byte) {
        return invalid_argument_error("micro symbols cannot carry eci or gs1 designators");
    }

    // Header segments: ECI, then FNC1, ahead of the data segment's mode indicator. Their size
    // is version-independent, unlike the character count field.
    let mut header_bits = BitBuffer::new();
    if !micro {
        if mode == CodecMode::Byte && params.charset != DEFAULT_BYTE_MODE_ENCODING {
            append_eci(params.charset.eci(), &mut header_bits);
        }
        if params.gs1 {
            header_bits.append_bits(CodecMode::Fnc1FirstPosition as u32, 4);
        }
    }

    // The data segment body, collected separately so its bit count can drive version choice.
    let mut data_bits = BitBuffer::new();
    let num_letters;
    match mode {
        CodecMode::Numeric => {
            append_numeric_bytes(content, &mut data_bits);
            num_letters = content.chars().count();
        }
        CodecMode::Alphanumeric => {
            append_alphanumeric_bytes(content, &mut data_bits)?;
            num_letters = content.chars().count();
        }
        CodecMode::Kanji => {
            append_kanji_bytes(content, &mut data_bits)?;
            num_letters = data_bits.len() / 13;
        }
        _ => {
            let bytes = match params.charset.encode(content) {
                Some(bytes) => bytes,
                None => {
                    return invalid_argument_error(
                        "content is not representable in the requested character set",
                    )
                }
            };
            append_byte_segment(&bytes, &mut data_bits);
            num_letters = bytes.len();
        }
    }

    // The character count width depends on the version, which depends on the total bit count.
    // Guess with the smallest version, then recompute.
    let version = if params.version != 0 {
        Version::from_number(params.version, micro)?
    }
    else {
        let smallest = choose_version(0, params.ec_level, micro, mode)?;
        let provisional_bits = header_bits.len()
            + mode::codec_mode_bits_length(smallest)
            + mode.character_count_bits(smallest)
            + data_bits.len();
        let provisional = choose_version(provisional_bits, params.ec_level, micro, mode)?;
        let bits_needed = header_bits.len()
            + mode::codec_mode_bits_length(provisional)
            + mode.character_count_bits(provisional)
            + data_bits.len();
        choose_version(bits_needed, params.ec_level, micro, mode)?
    };

    if micro && !micro_version_supports_mode(version, mode) {
        return invalid_argument_error("mode not available in the requested micro version");
    }

    let mut bits = header_bits;
    if micro {
        let mode_len = mode::codec_mode_bits_length(version);
        if mode_len > 0 {
            bits.append_bits(mode.micro_bits()?, mode_len);
        }
    }
    else {
        bits.append_bits(mode as u32, 4);
    }
    let count_bits = mode.character_count_bits(version);
    if num_letters >= 1 << count_bits {
        return invalid_argument_error("character count overflows the count field");
    }
    bits.append_bits(num_letters as u32, count_bits);
    // Splice the data segment body after the reconstructed header.
    for i in 0..data_bits.len() {
        bits.append_bit(data_bits.bit(i));
    }

    let ec_blocks = version.ec_blocks_for_level(params.ec_level)?;
    let num_data_codewords = version.total_codewords() - ec_blocks.total_codewords();
    terminate_bits(version, data_bit_capacity(version, num_data_codewords), &mut bits)?;

    let final_bits = interleave_with_ec_bytes(&bits, version, params.ec_level)?;

    let mask_pattern = match params.mask {
        Some(mask) => mask,
        None => choose_mask_pattern(&final_bits, params.ec_level, version)?,
    };
    debug!(
        "qr encode: version {}{}, level {}, mode {:?}, mask {}",
        if micro { "M" } else { "" },
        version.number(),
        params.ec_level.name(),
        mode,
        mask_pattern
    );

    let matrix = if micro {
        matrix_util::build_micro_matrix(&final_bits, params.ec_level, version, mask_pattern)?
    }
    else {
        matrix_util::build_matrix(&final_bits, params.ec_level, version, mask_pattern)?
    };

    Ok(EncodeResult { matrix, version, ec_level: params.ec_level, mode, mask_pattern })
}

/// Scores every candidate mask and keeps the winner: lowest penalty for full-size symbols,
/// highest edge score for micro symbols. Ties keep the smaller mask index.
fn choose_mask_pattern(
    bits: &BitBuffer,
    ec_level: ErrorCorrectionLevel,
    version: &Version,
) -> Result<u8> {
    if version.is_micro() {
        let mut best_score = i32::MIN;
        let mut best_mask = 0;
        for mask_pattern in 0..4 {
            let matrix = matrix_util::build_micro_matrix(bits, ec_level, version, mask_pattern)?;
            let score = mask::calculate_micro_mask_score(&matrix);
            if score > best_score {
                best_score = score;
                best_mask = mask_pattern;
            }
        }
        return Ok(best_mask);
    }

    let mut min_penalty = i32::MAX;
    let mut best_mask = 0;
    for mask_pattern in 0..8 {
        let matrix = matrix_util::build_matrix(bits, ec_level, version, mask_pattern)?;
        let penalty = mask::calculate_mask_penalty(&matrix);
        if penalty < min_penalty {
            min_penalty = penalty;
            best_mask = mask_pattern;
        }
    }
    Ok(best_mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(ec_level: ErrorCorrectionLevel) -> EncodeParams {
        EncodeParams {
            ec_level,
            charset: DEFAULT_BYTE_MODE_ENCODING,
            version: 0,
            mask: None,
            micro: false,
            gs1: false,
        }
    }

    #[test]
    fn verify_mode_choice() {
        assert_eq!(choose_mode("0123456789", DEFAULT_BYTE_MODE_ENCODING), CodecMode::Numeric);
        assert_eq!(choose_mode("ABC $%*+-./:", DEFAULT_BYTE_MODE_ENCODING), CodecMode::Alphanumeric);
        assert_eq!(choose_mode("AB12", DEFAULT_BYTE_MODE_ENCODING), CodecMode::Alphanumeric);
        assert_eq!(choose_mode("abc", DEFAULT_BYTE_MODE_ENCODING), CodecMode::Byte);
        // Digits stay numeric even under a Shift_JIS hint.
        assert_eq!(choose_mode("0123", CharacterSet::ShiftJIS), CodecMode::Numeric);
        // Whole-string double-byte content under a Shift_JIS hint selects kanji.
        assert_eq!(choose_mode("日本", CharacterSet::ShiftJIS), CodecMode::Kanji);
        // A mixed string cannot use kanji mode.
        assert_eq!(choose_mode("日本abc", CharacterSet::ShiftJIS), CodecMode::Byte);
    }

    #[test]
    fn verify_numeric_packing() {
        let mut bits = BitBuffer::new();
        append_numeric_bytes("01234567", &mut bits);
        // 012 345 67 -> 0000001100 0101011001 1000011
        assert_eq!(bits.len(), 27);
        let mut reader = bits.reader();
        assert_eq!(reader.read_bits(10).unwrap(), 12);
        assert_eq!(reader.read_bits(10).unwrap(), 345);
        assert_eq!(reader.read_bits(7).unwrap(), 67);
    }

    #[test]
    fn verify_alphanumeric_packing() {
        let mut bits = BitBuffer::new();
        append_alphanumeric_bytes("AC-42", &mut bits).unwrap();
        // (A,C) = 10*45+12 = 462; (-,4) = 41*45+4 = 1849; 2 = 2.
        let mut reader = bits.reader();
        assert_eq!(reader.read_bits(11).unwrap(), 462);
        assert_eq!(reader.read_bits(11).unwrap(), 1849);
        assert_eq!(reader.read_bits(6).unwrap(), 2);
    }

    #[test]
    fn verify_kanji_packing() {
        let mut bits = BitBuffer::new();
        // 日 = 0x93fa in Shift_JIS: 0x93fa - 0x8140 = 0x12ba -> 0x12 * 0xc0 + 0xba = 0xe3a.
        append_kanji_bytes("日", &mut bits).unwrap();
        assert_eq!(bits.len(), 13);
        assert_eq!(bits.reader().read_bits(13).unwrap(), 0xe3a);
    }

    #[test]
    fn verify_eci_designator_widths() {
        let mut bits = BitBuffer::new();
        append_eci(26, &mut bits);
        assert_eq!(bits.len(), 4 + 8);

        let mut bits = BitBuffer::new();
        append_eci(899, &mut bits);
        assert_eq!(bits.len(), 4 + 16);
        let mut reader = bits.reader();
        assert_eq!(reader.read_bits(4).unwrap(), 0x7);
        assert_eq!(reader.read_bits(2).unwrap(), 0b10);
        assert_eq!(reader.read_bits(14).unwrap(), 899);

        let mut bits = BitBuffer::new();
        append_eci(20000, &mut bits);
        assert_eq!(bits.len(), 4 + 24);
    }

    #[test]
    fn verify_version_choice() {
        // 17 bytes fit version 1-H (9 data codewords would not, 1-L has 19).
        let version = choose_version(17 * 8, ErrorCorrectionLevel::Low, false, CodecMode::Byte)
            .unwrap();
        assert_eq!(version.number(), 1);
        let version = choose_version(20 * 8, ErrorCorrectionLevel::Low, false, CodecMode::Byte)
            .unwrap();
        assert_eq!(version.number(), 2);
        assert!(choose_version(3000 * 8, ErrorCorrectionLevel::High, false, CodecMode::Byte)
            .is_err());
    }

    #[test]
    fn verify_terminate_bits_padding() {
        let version = Version::from_number(1, false).unwrap();
        let mut bits = BitBuffer::new();
        bits.append_bits(0b0100, 4);
        bits.append_bits(0x03, 8);
        bits.append_bits(0xa5, 8);
        terminate_bits(version, 16 * 8, &mut bits).unwrap();
        assert_eq!(bits.len(), 16 * 8);
        let bytes = bits.as_bytes();
        // Terminator plus alignment zeroes out the partial byte, then pads alternate.
        assert_eq!(bytes[3], 0xec);
        assert_eq!(bytes[4], 0x11);
        assert_eq!(bytes[15], 0x11);
    }

    #[test]
    fn verify_scenario_abcdef() {
        // "ABCDEF" at level H selects version 1, alphanumeric mode, mask 4.
        let result = encode("ABCDEF", &params(ErrorCorrectionLevel::High)).unwrap();
        assert_eq!(result.version.number(), 1);
        assert_eq!(result.mode, CodecMode::Alphanumeric);
        assert_eq!(result.mask_pattern, 4);
        assert_eq!(result.matrix.width(), 21);
    }

    #[test]
    fn verify_scenario_numeric_sjis_hint() {
        // "0123" with a Shift_JIS hint must stay numeric, version 1, mask 2.
        let mut p = params(ErrorCorrectionLevel::Medium);
        p.charset = CharacterSet::ShiftJIS;
        let result = encode("0123", &p).unwrap();
        assert_eq!(result.mode, CodecMode::Numeric);
        assert_eq!(result.version.number(), 1);
        assert_eq!(result.mask_pattern, 2);
    }

    #[test]
    fn verify_scenario_kanji() {
        let mut p = params(ErrorCorrectionLevel::Medium);
        p.charset = CharacterSet::ShiftJIS;
        let result = encode("日本", &p).unwrap();
        assert_eq!(result.mode, CodecMode::Kanji);
        assert_eq!(result.version.number(), 1);
        assert_eq!(result.mask_pattern, 0);
    }

    #[test]
    fn verify_micro_encode() {
        let mut p = params(ErrorCorrectionLevel::Low);
        p.micro = true;
        let result = encode("12345", &p).unwrap();
        assert!(result.version.is_micro());
        assert_eq!(result.mode, CodecMode::Numeric);
        assert!(result.matrix.width() <= 17);
    }
}
