// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The UPC/EAN family row decoder: EAN-13, EAN-8, UPC-A, UPC-E, plus the 2- and 5-digit
//! add-on extensions. See ISO/IEC 15420.

use log::debug;

use symbology_core::barcode::{BarcodeFormat, DecodeOptions, Reader, ReaderDescriptor};
use symbology_core::content::{Content, SymbologyIdentifier};
use symbology_core::errors::{checksum_error, format_error, Result};
use symbology_core::matrix::BitMatrix;
use symbology_core::support_reader;

use crate::gtin;
use crate::row::{self, find_guard_pattern, is_range, next_set, next_unset, record_pattern};

const MAX_AVG_VARIANCE: f32 = 0.48;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;

pub const START_END_PATTERN: [u32; 3] = [1, 1, 1];
pub const MIDDLE_PATTERN: [u32; 5] = [1, 1, 1, 1, 1];
pub const UPCE_END_PATTERN: [u32; 6] = [1, 1, 1, 1, 1, 1];
const EXTENSION_START_PATTERN: [u32; 3] = [1, 1, 2];

/// The "odd" (L) bar-space patterns for the digits 0 through 9.
pub const L_PATTERNS: [[u32; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// L patterns followed by their reversed "even" (G) counterparts; an index of 10 or more
/// signals even parity.
pub const L_AND_G_PATTERNS: [[u32; 4]; 20] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
    [1, 1, 2, 3],
    [1, 2, 2, 2],
    [2, 2, 1, 2],
    [1, 1, 4, 1],
    [2, 3, 1, 1],
    [1, 3, 2, 1],
    [4, 1, 1, 1],
    [2, 1, 3, 1],
    [3, 1, 2, 1],
    [2, 1, 1, 3],
];

/// Parity pattern (odd = 0, even = 1, assembled MSB-first) encoding the implicit first digit
/// of an EAN-13 symbol.
const FIRST_DIGIT_ENCODINGS: [u32; 10] =
    [0x00, 0x0b, 0x0d, 0x0e, 0x13, 0x19, 0x1c, 0x15, 0x16, 0x1a];

/// Parity patterns carrying the number system and check digit of a UPC-E symbol.
const NUMSYS_AND_CHECK_DIGIT_PATTERNS: [u32; 20] = [
    0x38, 0x34, 0x32, 0x31, 0x2c, 0x26, 0x23, 0x2a, 0x29, 0x25,
    0x07, 0x0b, 0x0d, 0x0e, 0x13, 0x19, 0x1c, 0x15, 0x16, 0x1a,
];

/// Check-digit parity patterns of the 5-digit add-on.
const EXTENSION5_CHECK_DIGIT_ENCODINGS: [u32; 10] =
    [0x18, 0x14, 0x12, 0x11, 0x0c, 0x06, 0x03, 0x0a, 0x09, 0x05];

/// What a decoded add-on extension carried.
#[derive(Debug, PartialEq, Eq)]
pub enum Extension {
    /// A 2-digit add-on: a periodical issue number.
    IssueNumber(u32),
    /// A 5-digit add-on: a price with an optional currency, per the prefix table.
    Price { currency: Option<&'static str>, cents: u32 },
    /// A 5-digit add-on with reserved semantics (no retail price, complimentary copies...).
    Raw,
}

fn decode_digit(row: &[bool], offset: usize, patterns: &[[u32; 4]]) -> Result<(usize, usize)> {
    let mut counters = [0u32; 4];
    if !record_pattern(row, offset, &mut counters) {
        return format_error("digit pattern runs off the row");
    }
    let mut best_variance = MAX_AVG_VARIANCE;
    let mut best_match = None;
    for (i, pattern) in patterns.iter().enumerate() {
        let variance = row::pattern_match_variance(&counters, pattern, MAX_INDIVIDUAL_VARIANCE);
        if variance < best_variance {
            best_variance = variance;
            best_match = Some(i);
        }
    }
    match best_match {
        Some(digit) => Ok((digit, offset + counters.iter().sum::<u32>() as usize)),
        None => format_error("unrecognized digit pattern"),
    }
}

fn find_start_guard(row: &[bool]) -> Result<(usize, usize)> {
    let mut next_start = 0;
    loop {
        let (begin, end) =
            match find_guard_pattern(row, next_start, false, &START_END_PATTERN,
                                     MAX_INDIVIDUAL_VARIANCE, MAX_AVG_VARIANCE) {
                Some(range) => range,
                None => return format_error("no start guard pattern"),
            };
        // Require a quiet zone at least as wide as the guard ahead of it.
        let quiet_width = end - begin;
        if begin >= quiet_width && is_range(row, begin - quiet_width, begin, false) {
            return Ok((begin, end));
        }
        next_start = end;
    }
}

struct MiddleResult {
    digits: String,
    /// Offset just past the last decoded digit.
    end: usize,
    lg_pattern: u32,
}

/// Decodes `count` digits with the given pattern set, collecting the parity bits MSB-first.
fn decode_digit_run(
    row: &[bool],
    mut offset: usize,
    count: usize,
    patterns: &[[u32; 4]],
    digits: &mut String,
) -> Result<(usize, u32)> {
    let mut lg_pattern = 0;
    for i in 0..count {
        let (value, next) = decode_digit(row, offset, patterns)?;
        digits.push(char::from(b'0' + (value % 10) as u8));
        if value >= 10 {
            lg_pattern |= 1 << (count - 1 - i);
        }
        offset = next;
    }
    Ok((offset, lg_pattern))
}

fn decode_ean13_middle(row: &[bool], start_guard_end: usize) -> Result<MiddleResult> {
    let mut digits = String::with_capacity(13);
    let (offset, lg_pattern) =
        decode_digit_run(row, start_guard_end, 6, &L_AND_G_PATTERNS, &mut digits)?;

    // The parity pattern of the left half encodes the implicit first digit.
    let first_digit = FIRST_DIGIT_ENCODINGS
        .iter()
        .position(|&p| p == lg_pattern)
        .ok_or(symbology_core::errors::Error::FormatError("invalid parity pattern"))?;
    digits.insert(0, char::from(b'0' + first_digit as u8));

    let (_, middle_end) =
        match find_guard_pattern(row, offset, true, &MIDDLE_PATTERN,
                                 MAX_INDIVIDUAL_VARIANCE, MAX_AVG_VARIANCE) {
            Some(range) => range,
            None => return format_error("no middle guard pattern"),
        };

    let (end, _) = decode_digit_run(row, middle_end, 6, &L_PATTERNS, &mut digits)?;
    Ok(MiddleResult { digits, end, lg_pattern })
}

fn decode_ean8_middle(row: &[bool], start_guard_end: usize) -> Result<MiddleResult> {
    let mut digits = String::with_capacity(8);
    let (offset, _) = decode_digit_run(row, start_guard_end, 4, &L_PATTERNS, &mut digits)?;
    let (_, middle_end) =
        match find_guard_pattern(row, offset, true, &MIDDLE_PATTERN,
                                 MAX_INDIVIDUAL_VARIANCE, MAX_AVG_VARIANCE) {
            Some(range) => range,
            None => return format_error("no middle guard pattern"),
        };
    let (end, _) = decode_digit_run(row, middle_end, 4, &L_PATTERNS, &mut digits)?;
    Ok(MiddleResult { digits, end, lg_pattern: 0 })
}

fn decode_upce_middle(row: &[bool], start_guard_end: usize) -> Result<MiddleResult> {
    let mut digits = String::with_capacity(8);
    let (end, lg_pattern) =
        decode_digit_run(row, start_guard_end, 6, &L_AND_G_PATTERNS, &mut digits)?;

    // The parity pattern implies the number system and the check digit.
    let index = NUMSYS_AND_CHECK_DIGIT_PATTERNS
        .iter()
        .position(|&p| p == lg_pattern)
        .ok_or(symbology_core::errors::Error::FormatError("invalid parity pattern"))?;
    let number_system = index / 10;
    let check_digit = index % 10;
    digits.insert(0, char::from(b'0' + number_system as u8));
    digits.push(char::from(b'0' + check_digit as u8));

    Ok(MiddleResult { digits, end, lg_pattern })
}

/// Expands a UPC-E value into its equivalent UPC-A digit string.
pub fn convert_upce_to_upca(upce: &str) -> String {
    if upce.len() < 7 {
        return upce.to_string();
    }
    let chars: Vec<char> = upce.chars().collect();
    let body = &chars[1..7];
    let mut result = String::with_capacity(12);
    result.push(chars[0]);
    match body[5] {
        '0' | '1' | '2' => {
            result.extend(&body[0..2]);
            result.push(body[5]);
            result.push_str("0000");
            result.extend(&body[2..5]);
        }
        '3' => {
            result.extend(&body[0..3]);
            result.push_str("00000");
            result.extend(&body[3..5]);
        }
        '4' => {
            result.extend(&body[0..4]);
            result.push_str("00000");
            result.push(body[4]);
        }
        _ => {
            result.extend(&body[0..5]);
            result.push_str("0000");
            result.push(body[5]);
        }
    }
    if upce.len() >= 8 {
        result.push(chars[7]);
    }
    result
}

/// Decodes an optional 2- or 5-digit add-on following the end guard.
fn decode_extension(row: &[bool], offset: usize) -> Option<(String, Extension)> {
    let (_, ext_start) = find_guard_pattern(row, offset, false, &EXTENSION_START_PATTERN,
                                            MAX_INDIVIDUAL_VARIANCE, MAX_AVG_VARIANCE)?;
    decode_extension_digits(row, ext_start, 5)
        .or_else(|| decode_extension_digits(row, ext_start, 2))
}

fn decode_extension_digits(row: &[bool], mut offset: usize, count: usize) -> Option<(String, Extension)> {
    let mut digits = String::with_capacity(count);
    let mut lg_pattern = 0u32;
    for x in 0..count {
        let (value, next) = decode_digit(row, offset, &L_AND_G_PATTERNS).ok()?;
        digits.push(char::from(b'0' + (value % 10) as u8));
        if value >= 10 {
            lg_pattern |= 1 << (count - 1 - x);
        }
        offset = next;
        if x != count - 1 {
            // Skip the 01 separator between add-on digits.
            offset = next_set(row, offset);
            offset = next_unset(row, offset);
        }
    }

    if count == 2 {
        // The issue number's parity is its value mod 4.
        let value: u32 = digits.parse().ok()?;
        if value % 4 != lg_pattern {
            return None;
        }
        Some((digits, Extension::IssueNumber(value)))
    }
    else {
        let check_digit =
            EXTENSION5_CHECK_DIGIT_ENCODINGS.iter().position(|&p| p == lg_pattern)?;
        if extension5_checksum(&digits) != check_digit as u32 {
            return None;
        }
        let parsed = parse_extension5(&digits);
        Some((digits, parsed))
    }
}

fn extension5_checksum(digits: &str) -> u32 {
    let bytes = digits.as_bytes();
    let mut sum = 0u32;
    for i in (0..bytes.len()).rev().skip(1).step_by(2) {
        sum += u32::from(bytes[i] - b'0');
    }
    sum *= 3;
    for i in (0..bytes.len()).rev().step_by(2) {
        sum += u32::from(bytes[i] - b'0');
    }
    sum *= 3;
    sum % 10
}

/// The currency implied by a 5-digit add-on's leading digit.
fn parse_extension5(digits: &str) -> Extension {
    let currency = match digits.as_bytes()[0] {
        b'0' | b'1' => Some("GBP"),
        b'3' => Some("AUD"),
        b'4' => Some("NZD"),
        b'5' => Some("USD"),
        b'6' => Some("CAD"),
        b'9' => {
            return match digits {
                // No suggested retail price, complimentary copies, used goods.
                "90000" | "99991" | "99990" => Extension::Raw,
                _ => Extension::Price { currency: None, cents: digits[1..].parse().unwrap_or(0) },
            };
        }
        _ => None,
    };
    Extension::Price { currency, cents: digits[1..].parse().unwrap_or(0) }
}

/// UPC/EAN family decoder. One reader instance handles one concrete format.
pub struct UpcEanReader {
    format: BarcodeFormat,
}

impl UpcEanReader {
    fn decode_row(&self, row: &[bool]) -> Result<Content> {
        let (_, start_end) = find_start_guard(row)?;

        let middle = match self.format {
            BarcodeFormat::Ean13 | BarcodeFormat::UpcA => decode_ean13_middle(row, start_end)?,
            BarcodeFormat::Ean8 => decode_ean8_middle(row, start_end)?,
            BarcodeFormat::UpcE => decode_upce_middle(row, start_end)?,
            _ => return format_error("format not supported by the upc/ean reader"),
        };

        // The UPC-E end guard begins with a space, the normal end guard with a bar.
        let is_upce = self.format == BarcodeFormat::UpcE;
        let end_pattern: &[u32] = if is_upce { &UPCE_END_PATTERN } else { &START_END_PATTERN };
        let (end_begin, end_end) =
            match find_guard_pattern(row, middle.end, is_upce, end_pattern,
                                     MAX_INDIVIDUAL_VARIANCE, MAX_AVG_VARIANCE) {
                Some(range) => range,
                None => return format_error("no end guard pattern"),
            };

        // A quiet zone at least as wide as the end guard must follow.
        let quiet_end = end_end + (end_end - end_begin);
        if quiet_end > row.len() || !is_range(row, end_end, quiet_end, false) {
            return format_error("missing trailing quiet zone");
        }

        let mut digits = middle.digits.clone();
        match self.format {
            BarcodeFormat::UpcA => {
                // UPC-A is the EAN-13 grammar with a leading zero.
                match digits.strip_prefix('0') {
                    Some(rest) => digits = rest.to_string(),
                    None => return format_error("not a number system 0 symbol"),
                }
                if !gtin::is_check_digit_valid(&digits) {
                    return checksum_error("check digit mismatch");
                }
            }
            BarcodeFormat::UpcE => {
                if !gtin::is_check_digit_valid(&convert_upce_to_upca(&digits)) {
                    return checksum_error("check digit mismatch");
                }
            }
            _ => {
                if !gtin::is_check_digit_valid(&digits) {
                    return checksum_error("check digit mismatch");
                }
            }
        }

        let mut content = Content::new();
        content.symbology = SymbologyIdentifier {
            code: 'E',
            modifier: if self.format == BarcodeFormat::Ean8 { '4' } else { '0' },
            eci_modifier_offset: 0,
        };

        if self.format == BarcodeFormat::Ean13 || self.format == BarcodeFormat::UpcA {
            if let Some(country) = gtin::lookup_country_identifier(&middle.digits) {
                debug!("upc/ean decode: registration group {}", country);
            }
        }

        content.push_str(&digits);
        if let Some((extension_digits, extension)) = decode_extension(row, end_end) {
            debug!("upc/ean decode: add-on {:?}", extension);
            content.push_str(" ");
            content.push_str(&extension_digits);
        }
        Ok(content)
    }
}

impl Reader for UpcEanReader {
    fn try_new(format: BarcodeFormat, _options: &DecodeOptions) -> Result<UpcEanReader> {
        match format {
            BarcodeFormat::Ean13 | BarcodeFormat::Ean8 | BarcodeFormat::UpcA
            | BarcodeFormat::UpcE => Ok(UpcEanReader { format }),
            _ => symbology_core::errors::invalid_argument_error(
                "format not supported by the upc/ean reader",
            ),
        }
    }

    fn supported_formats() -> &'static [ReaderDescriptor] {
        &[
            support_reader!(BarcodeFormat::Ean13, "ean13", "EAN-13"),
            support_reader!(BarcodeFormat::Ean8, "ean8", "EAN-8"),
            support_reader!(BarcodeFormat::UpcA, "upca", "UPC-A"),
            support_reader!(BarcodeFormat::UpcE, "upce", "UPC-E"),
        ]
    }

    fn decode(&self, matrix: &BitMatrix) -> Result<Content> {
        let mut last_error = symbology_core::errors::Error::FormatError("no decodable row");
        for y in 0..matrix.height() {
            match self.decode_row(&row::scan_line(matrix, y)) {
                Ok(content) => return Ok(content),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders an EAN-13 scan row from 13 digits, optionally with an add-on.
    fn encode_ean13_row(digits: &str, addon: Option<&str>) -> Vec<bool> {
        assert_eq!(digits.len(), 13);
        let d: Vec<usize> = digits.bytes().map(|b| usize::from(b - b'0')).collect();
        let mut row = vec![false; 10]; // leading quiet zone
        let mut push = |row: &mut Vec<bool>, widths: &[u32], mut bar: bool| {
            for &w in widths {
                for _ in 0..w {
                    row.push(bar);
                }
                bar = !bar;
            }
        };
        push(&mut row, &START_END_PATTERN, true);
        let parity = FIRST_DIGIT_ENCODINGS[d[0]];
        for (i, &digit) in d[1..7].iter().enumerate() {
            // L digits start with a space; G digits are reversed L.
            let even = parity >> (5 - i) & 1 != 0;
            let index = if even { digit + 10 } else { digit };
            push(&mut row, &L_AND_G_PATTERNS[index], false);
        }
        push(&mut row, &MIDDLE_PATTERN, false);
        for &digit in &d[7..13] {
            // Right-half digits use the R patterns: L widths starting with a bar.
            push(&mut row, &L_PATTERNS[digit], true);
        }
        push(&mut row, &START_END_PATTERN, true);

        if let Some(addon) = addon {
            // Add-ons sit past a short gap: start pattern 1-1-2 then digits split by 01.
            for _ in 0..7 {
                row.push(false);
            }
            push(&mut row, &EXTENSION_START_PATTERN, true);
            let addon_digits: Vec<usize> = addon.bytes().map(|b| usize::from(b - b'0')).collect();
            let parity: u32 = if addon.len() == 2 {
                addon.parse::<u32>().unwrap() % 4
            }
            else {
                let check = extension5_checksum(addon);
                EXTENSION5_CHECK_DIGIT_ENCODINGS[check as usize]
            };
            let count = addon_digits.len();
            for (i, &digit) in addon_digits.iter().enumerate() {
                let even = parity >> (count - 1 - i) & 1 != 0;
                let index = if even { digit + 10 } else { digit };
                push(&mut row, &L_AND_G_PATTERNS[index], false);
                if i != count - 1 {
                    row.push(false);
                    row.push(true);
                }
            }
        }

        for _ in 0..10 {
            row.push(false); // trailing quiet zone
        }
        row
    }

    fn matrix_from_row(row: &[bool]) -> BitMatrix {
        let mut matrix = BitMatrix::new(row.len() as u32, 1).unwrap();
        for (x, &bar) in row.iter().enumerate() {
            matrix.set(x as u32, 0, bar);
        }
        matrix
    }

    fn reader(format: BarcodeFormat) -> UpcEanReader {
        UpcEanReader::try_new(format, &DecodeOptions::default()).unwrap()
    }

    #[test]
    fn verify_ean13_decode() {
        let row = encode_ean13_row("5901234123457", None);
        let content = reader(BarcodeFormat::Ean13).decode(&matrix_from_row(&row)).unwrap();
        assert_eq!(content.text(), "5901234123457");
        assert_eq!(content.symbology_identifier(), "]E0");
        assert_eq!(gtin::lookup_country_identifier("5901234123457"), Some("PL"));
    }

    #[test]
    fn verify_ean13_with_two_digit_addon() {
        let row = encode_ean13_row("5901234123457", Some("12"));
        let content = reader(BarcodeFormat::Ean13).decode(&matrix_from_row(&row)).unwrap();
        assert_eq!(content.text(), "5901234123457 12");
    }

    #[test]
    fn verify_ean13_with_five_digit_addon() {
        let row = encode_ean13_row("9780201379624", Some("52250"));
        let content = reader(BarcodeFormat::Ean13).decode(&matrix_from_row(&row)).unwrap();
        assert_eq!(content.text(), "9780201379624 52250");
        assert_eq!(
            parse_extension5("52250"),
            Extension::Price { currency: Some("USD"), cents: 2250 }
        );
    }

    #[test]
    fn verify_bad_checksum_rejected() {
        // Same digits with a wrong check digit: parity still matches first digit 5.
        let row = encode_ean13_row("5901234123451", None);
        assert!(reader(BarcodeFormat::Ean13).decode(&matrix_from_row(&row)).is_err());
    }

    #[test]
    fn verify_upca_pass_through() {
        // A UPC-A symbol is an EAN-13 with the implicit leading zero.
        let row = encode_ean13_row("0036000291452", None);
        let content = reader(BarcodeFormat::UpcA).decode(&matrix_from_row(&row)).unwrap();
        assert_eq!(content.text(), "036000291452");
        // The same row read as EAN-13 keeps its 13 digits.
        let content = reader(BarcodeFormat::Ean13).decode(&matrix_from_row(&row)).unwrap();
        assert_eq!(content.text(), "0036000291452");
    }

    #[test]
    fn verify_upce_conversion() {
        assert_eq!(convert_upce_to_upca("01234565"), "012345000065");
        assert_eq!(convert_upce_to_upca("0123413"), "01230000041");
        // The conversion feeds the checksum test.
        assert!(gtin::is_check_digit_valid(&convert_upce_to_upca("01234565")));
    }

    #[test]
    fn verify_issue_number_parity() {
        // "12" must carry parity 12 % 4 = 0 (both digits odd). Encode it with the wrong
        // parity pattern and the add-on decoder has to reject it.
        let mut row = vec![false; 4];
        let mut push = |row: &mut Vec<bool>, widths: &[u32], mut bar: bool| {
            for &w in widths {
                for _ in 0..w {
                    row.push(bar);
                }
                bar = !bar;
            }
        };
        push(&mut row, &EXTENSION_START_PATTERN, true);
        let wrong_parity = 1u32;
        for (i, digit) in [1usize, 2].into_iter().enumerate() {
            let even = wrong_parity >> (1 - i) & 1 != 0;
            let index = if even { digit + 10 } else { digit };
            push(&mut row, &L_AND_G_PATTERNS[index], false);
            if i == 0 {
                row.push(false);
                row.push(true);
            }
        }
        row.extend(std::iter::repeat(false).take(6));
        assert_eq!(decode_extension(&row, 0), None);
    }
}
