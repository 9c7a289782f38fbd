// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The DataBar Expanded bit-field decoder: encodation methods to the parenthesized-AI
//! element string. See ISO/IEC 24724 7.2.

use symbology_core::errors::{format_error, Result};
use symbology_core::io::BitBuffer;

use crate::rss::general_app_id::{self, extract_numeric, ParsingState};

const GTIN_SIZE: usize = 40;

fn append_check_digit(buffer: &mut String, start: usize) {
    let mut check_digit = 0u32;
    for (i, b) in buffer.as_bytes()[start..start + 13].iter().enumerate() {
        let digit = u32::from(b - b'0');
        check_digit += if i % 2 == 0 { 3 * digit } else { digit };
    }
    check_digit = (10 - check_digit % 10) % 10;
    buffer.push(char::from(b'0' + check_digit as u8));
}

/// Four 10-bit blocks of three digits each, then the check digit over the 13 collected
/// digits.
fn encode_compressed_gtin_without_ai(buffer: &mut String, bits: &BitBuffer, pos: usize, start: usize) {
    for i in 0..4 {
        let block = extract_numeric(bits, pos + 10 * i, 10);
        buffer.push_str(&format!("{:03}", block));
    }
    append_check_digit(buffer, start);
}

fn encode_compressed_gtin(buffer: &mut String, bits: &BitBuffer, pos: usize) {
    buffer.push_str("(01)");
    let start = buffer.len();
    buffer.push('9');
    encode_compressed_gtin_without_ai(buffer, bits, pos, start);
}

fn encode_compressed_weight(
    buffer: &mut String,
    bits: &BitBuffer,
    pos: usize,
    weight_size: usize,
    add_weight_code: impl Fn(&mut String, u32),
    check_weight: impl Fn(u32) -> u32,
) {
    let original_weight = extract_numeric(bits, pos, weight_size);
    add_weight_code(buffer, original_weight);
    buffer.push_str(&format!("{:06}", check_weight(original_weight)));
}

/// Method `1`: a compressed GTIN followed by arbitrary AI elements.
fn decode_ai01_and_other_ais(bits: &BitBuffer) -> Result<String> {
    // Linkage flag, encodation method bit, and the two variable-length bits.
    const HEADER_SIZE: usize = 1 + 1 + 2;
    if bits.len() < HEADER_SIZE + 44 {
        return format_error("bit field too short for a compressed gtin");
    }
    let mut buffer = String::from("(01)");
    let start = buffer.len();
    let first_gtin_digit = extract_numeric(bits, HEADER_SIZE, 4);
    buffer.push_str(&first_gtin_digit.to_string());
    encode_compressed_gtin_without_ai(&mut buffer, bits, HEADER_SIZE + 4, start);
    buffer.push_str(&general_app_id::decode_all_codes(bits, HEADER_SIZE + 44)?);
    Ok(buffer)
}

/// Method `00`: nothing but general-purpose AI elements.
fn decode_any_ai(bits: &BitBuffer) -> Result<String> {
    const HEADER_SIZE: usize = 2 + 1 + 2;
    general_app_id::decode_all_codes(bits, HEADER_SIZE)
}

/// Method `0100`: GTIN plus a six-digit net weight in hundredths of kilograms.
fn decode_ai01_3103(bits: &BitBuffer) -> Result<String> {
    const HEADER_SIZE: usize = 4 + 1;
    const WEIGHT_SIZE: usize = 15;
    if bits.len() != HEADER_SIZE + GTIN_SIZE + WEIGHT_SIZE {
        return format_error("bit field length does not match encodation method 0100");
    }
    let mut buffer = String::new();
    encode_compressed_gtin(&mut buffer, bits, HEADER_SIZE);
    encode_compressed_weight(
        &mut buffer,
        bits,
        HEADER_SIZE + GTIN_SIZE,
        WEIGHT_SIZE,
        |buf, _| buf.push_str("(3103)"),
        |weight| weight,
    );
    Ok(buffer)
}

/// Method `0101`: GTIN plus a six-digit weight in pounds, with two decimal scalings.
fn decode_ai01_320x(bits: &BitBuffer) -> Result<String> {
    const HEADER_SIZE: usize = 4 + 1;
    const WEIGHT_SIZE: usize = 15;
    if bits.len() != HEADER_SIZE + GTIN_SIZE + WEIGHT_SIZE {
        return format_error("bit field length does not match encodation method 0101");
    }
    let mut buffer = String::new();
    encode_compressed_gtin(&mut buffer, bits, HEADER_SIZE);
    encode_compressed_weight(
        &mut buffer,
        bits,
        HEADER_SIZE + GTIN_SIZE,
        WEIGHT_SIZE,
        |buf, weight| buf.push_str(if weight < 10000 { "(3202)" } else { "(3203)" }),
        |weight| if weight < 10000 { weight } else { weight - 10000 },
    );
    Ok(buffer)
}

/// Methods `01100` and `01101`: GTIN plus an amount-payable AI with an embedded final digit.
fn decode_ai01_39x(bits: &BitBuffer, base_ai: &str, with_currency: bool) -> Result<String> {
    const HEADER_SIZE: usize = 5 + 1 + 2;
    const LAST_DIGIT_SIZE: usize = 2;
    const FIRST_THREE_DIGITS_SIZE: usize = 10;
    if bits.len() < HEADER_SIZE + GTIN_SIZE {
        return format_error("bit field too short for encodation method 0110x");
    }
    let mut buffer = String::new();
    encode_compressed_gtin(&mut buffer, bits, HEADER_SIZE);

    let last_ai_digit = extract_numeric(bits, HEADER_SIZE + GTIN_SIZE, LAST_DIGIT_SIZE);
    buffer.push('(');
    buffer.push_str(base_ai);
    buffer.push_str(&last_ai_digit.to_string());
    buffer.push(')');

    let mut pos = HEADER_SIZE + GTIN_SIZE + LAST_DIGIT_SIZE;
    if with_currency {
        let currency = extract_numeric(bits, pos, FIRST_THREE_DIGITS_SIZE);
        buffer.push_str(&format!("{:03}", currency));
        pos += FIRST_THREE_DIGITS_SIZE;
    }

    let mut state = ParsingState::new(pos);
    let info = general_app_id::decode_general_purpose_field(bits, &mut state, "")?;
    buffer.push_str(&info.new_string);
    Ok(buffer)
}

/// Methods `0111000x` through `0111111x`: GTIN, a twenty-bit weight, and an optional
/// sixteen-bit packaging/expiry date.
fn decode_ai01_3x0x_1x(bits: &BitBuffer, first_ai_digits: &str, date_code: &str) -> Result<String> {
    const HEADER_SIZE: usize = 7 + 1;
    const WEIGHT_SIZE: usize = 20;
    const DATE_SIZE: usize = 16;
    if bits.len() != HEADER_SIZE + GTIN_SIZE + WEIGHT_SIZE + DATE_SIZE {
        return format_error("bit field length does not match encodation method 0111xxx");
    }
    let mut buffer = String::new();
    encode_compressed_gtin(&mut buffer, bits, HEADER_SIZE);
    encode_compressed_weight(
        &mut buffer,
        bits,
        HEADER_SIZE + GTIN_SIZE,
        WEIGHT_SIZE,
        |buf, weight| {
            buf.push('(');
            buf.push_str(first_ai_digits);
            buf.push_str(&(weight / 100_000).to_string());
            buf.push(')');
        },
        |weight| weight % 100_000,
    );

    // The all-ones date value means no date attribute is present.
    let numeric_date = extract_numeric(bits, HEADER_SIZE + GTIN_SIZE + WEIGHT_SIZE, DATE_SIZE);
    if numeric_date != 38400 {
        buffer.push('(');
        buffer.push_str(date_code);
        buffer.push(')');
        let day = numeric_date % 32;
        let month = numeric_date / 32 % 12 + 1;
        let year = numeric_date / 32 / 12;
        buffer.push_str(&format!("{:02}{:02}{:02}", year, month, day));
    }
    Ok(buffer)
}

/// Dispatches on the encodation method bits at the head of the field.
pub fn decode_expanded_bits(bits: &BitBuffer) -> Result<String> {
    if bits.len() < 3 {
        return format_error("bit field too short");
    }
    if bits.bit(1) {
        return decode_ai01_and_other_ais(bits);
    }
    if !bits.bit(2) {
        return decode_any_ai(bits);
    }

    let four_bit_method = extract_numeric(bits, 1, 4);
    match four_bit_method {
        4 => return decode_ai01_3103(bits),
        5 => return decode_ai01_320x(bits),
        _ => {}
    }

    let five_bit_method = extract_numeric(bits, 1, 5);
    match five_bit_method {
        12 => return decode_ai01_39x(bits, "392", false),
        13 => return decode_ai01_39x(bits, "393", true),
        _ => {}
    }

    let seven_bit_method = extract_numeric(bits, 1, 7);
    match seven_bit_method {
        56 => decode_ai01_3x0x_1x(bits, "310", "11"),
        57 => decode_ai01_3x0x_1x(bits, "320", "11"),
        58 => decode_ai01_3x0x_1x(bits, "310", "13"),
        59 => decode_ai01_3x0x_1x(bits, "320", "13"),
        60 => decode_ai01_3x0x_1x(bits, "310", "15"),
        61 => decode_ai01_3x0x_1x(bits, "320", "15"),
        62 => decode_ai01_3x0x_1x(bits, "310", "17"),
        63 => decode_ai01_3x0x_1x(bits, "320", "17"),
        _ => format_error("unknown encodation method"),
    }
}
