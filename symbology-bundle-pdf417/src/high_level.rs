// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The PDF417 high-level encoder: text into a minimal mix of Text, Byte, and Numeric
//! compaction codewords. See ISO/IEC 15438 5.4.

use symbology_core::errors::{invalid_argument_error, Result};

use crate::big_integer;

pub const TEXT_COMPACTION_MODE_LATCH: u16 = 900;
pub const BYTE_COMPACTION_MODE_LATCH: u16 = 901;
pub const NUMERIC_COMPACTION_MODE_LATCH: u16 = 902;
pub const MODE_SHIFT_TO_BYTE: u16 = 913;
pub const BYTE_COMPACTION_MODE_LATCH_6: u16 = 924;
pub const ECI_CHARSET: u16 = 927;
pub const BEGIN_MACRO_BLOCK: u16 = 928;
pub const BEGIN_MACRO_OPTIONAL_FIELD: u16 = 923;
pub const MACRO_TERMINATOR: u16 = 922;

/// Sub-mode switch codes within text compaction.
const LATCH_TO_PUNCT: u16 = 25; // PL
const LATCH_TO_LOWER: u16 = 27; // LL
const SHIFT_TO_ALPHA: u16 = 27; // AS (from lower)
const LATCH_TO_MIXED: u16 = 28; // ML
const LATCH_TO_ALPHA: u16 = 28; // AL (from mixed)
const SHIFT_TO_PUNCT: u16 = 29; // PS
const LATCH_TO_ALPHA_FROM_PUNCT: u16 = 29; // PAL

pub const PUNCT_CHARS: &[u8] = b";<>@[\\]_`~!\r\t,:\n-.$/\"|*()?{}'";
pub const MIXED_CHARS: &[u8] = b"0123456789&\r\t,:#-.$/+%*=^";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SubMode {
    Alpha,
    Lower,
    Mixed,
    Punct,
}

fn is_alpha_upper(ch: u8) -> bool {
    ch == b' ' || ch.is_ascii_uppercase()
}

fn is_alpha_lower(ch: u8) -> bool {
    ch == b' ' || ch.is_ascii_lowercase()
}

fn mixed_code(ch: u8) -> Option<u16> {
    MIXED_CHARS.iter().position(|&c| c == ch).map(|i| i as u16)
}

fn punct_code(ch: u8) -> Option<u16> {
    PUNCT_CHARS.iter().position(|&c| c == ch).map(|i| i as u16)
}

fn is_text(ch: u8) -> bool {
    ch == b'\t' || ch == b'\n' || ch == b'\r' || (32..=126).contains(&ch)
}

/// The number of consecutive digits starting at `start`.
fn consecutive_digit_count(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// The number of consecutive text-compactable characters starting at `start`; a run of 13 or
/// more digits inside it terminates the count (numeric compaction wins there).
fn consecutive_text_count(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() {
        let digits = consecutive_digit_count(bytes, idx);
        if digits >= 13 {
            break;
        }
        if digits > 0 {
            idx += digits;
            continue;
        }
        if !is_text(bytes[idx]) {
            break;
        }
        idx += 1;
    }
    idx - start
}

/// The number of bytes that must be encoded in byte compaction starting at `start`.
fn consecutive_binary_count(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() {
        let digits = consecutive_digit_count(bytes, idx);
        if digits >= 13 {
            break;
        }
        let text = consecutive_text_count(bytes, idx);
        if text >= 5 {
            break;
        }
        idx += 1;
    }
    idx - start
}

/// Encodes a run of text characters into interim sub-mode codes, then pairs them into
/// codewords; an odd count pads with a trailing punct shift.
///
/// Returns the sub-mode in effect afterwards.
fn encode_text(
    bytes: &[u8],
    start: usize,
    count: usize,
    initial_submode: SubMode,
    output: &mut Vec<u16>,
) -> SubMode {
    let mut tmp: Vec<u16> = Vec::with_capacity(count);
    let mut submode = initial_submode;
    let mut idx = 0;
    while idx < count {
        let ch = bytes[start + idx];
        match submode {
            SubMode::Alpha => {
                if is_alpha_upper(ch) {
                    tmp.push(if ch == b' ' { 26 } else { u16::from(ch - b'A') });
                }
                else if is_alpha_lower(ch) {
                    submode = SubMode::Lower;
                    tmp.push(LATCH_TO_LOWER);
                    continue;
                }
                else if mixed_code(ch).is_some() {
                    submode = SubMode::Mixed;
                    tmp.push(LATCH_TO_MIXED);
                    continue;
                }
                else {
                    tmp.push(SHIFT_TO_PUNCT);
                    tmp.push(punct_code(ch).unwrap_or(0));
                }
            }
            SubMode::Lower => {
                if is_alpha_lower(ch) {
                    tmp.push(if ch == b' ' { 26 } else { u16::from(ch - b'a') });
                }
                else if is_alpha_upper(ch) {
                    // Space was handled by the lower table, so this is always a capital.
                    tmp.push(SHIFT_TO_ALPHA);
                    tmp.push(u16::from(ch - b'A'));
                }
                else if mixed_code(ch).is_some() {
                    submode = SubMode::Mixed;
                    tmp.push(LATCH_TO_MIXED);
                    continue;
                }
                else {
                    tmp.push(SHIFT_TO_PUNCT);
                    tmp.push(punct_code(ch).unwrap_or(0));
                }
            }
            SubMode::Mixed => {
                if let Some(code) = mixed_code(ch) {
                    tmp.push(code);
                }
                else if is_alpha_upper(ch) {
                    submode = SubMode::Alpha;
                    tmp.push(LATCH_TO_ALPHA);
                    continue;
                }
                else if is_alpha_lower(ch) {
                    submode = SubMode::Lower;
                    tmp.push(LATCH_TO_LOWER);
                    continue;
                }
                else if idx + 1 < count && punct_code(bytes[start + idx + 1]).is_some() {
                    // Two punctuation characters in a row justify a latch.
                    submode = SubMode::Punct;
                    tmp.push(LATCH_TO_PUNCT);
                    continue;
                }
                else {
                    tmp.push(SHIFT_TO_PUNCT);
                    tmp.push(punct_code(ch).unwrap_or(0));
                }
            }
            SubMode::Punct => {
                if let Some(code) = punct_code(ch) {
                    tmp.push(code);
                }
                else {
                    submode = SubMode::Alpha;
                    tmp.push(LATCH_TO_ALPHA_FROM_PUNCT);
                    continue;
                }
            }
        }
        idx += 1;
    }

    // Pair interim codes into codewords, high value first.
    let mut high = 0u16;
    for (i, &code) in tmp.iter().enumerate() {
        if i % 2 == 1 {
            output.push(high * 30 + code);
        }
        else {
            high = code;
        }
    }
    if tmp.len() % 2 == 1 {
        output.push(high * 30 + SHIFT_TO_PUNCT);
    }
    submode
}

/// Encodes a run of bytes: full groups of 6 become 5 base-900 codewords, the remainder one
/// codeword per byte. A single byte inside a text run shifts with 913 instead of latching.
fn encode_binary(bytes: &[u8], start: usize, count: usize, in_text: bool, output: &mut Vec<u16>) {
    if count == 1 && in_text {
        output.push(MODE_SHIFT_TO_BYTE);
        output.push(u16::from(bytes[start]));
        return;
    }
    output.push(if count % 6 == 0 { BYTE_COMPACTION_MODE_LATCH_6 } else { BYTE_COMPACTION_MODE_LATCH });

    let mut idx = start;
    while idx + 6 <= start + count {
        let mut value = 0u64;
        for &b in &bytes[idx..idx + 6] {
            value = (value << 8) | u64::from(b);
        }
        let mut group = [0u16; 5];
        for slot in group.iter_mut().rev() {
            *slot = (value % 900) as u16;
            value /= 900;
        }
        output.extend_from_slice(&group);
        idx += 6;
    }
    for &b in &bytes[idx..start + count] {
        output.push(u16::from(b));
    }
}

/// Encodes a digit run: groups of up to 44 digits, each prefixed with a guard `1` and written
/// out in base 900.
fn encode_numeric(bytes: &[u8], start: usize, count: usize, output: &mut Vec<u16>) -> Result<()> {
    let mut idx = 0;
    while idx < count {
        let group_len = (count - idx).min(44);
        let mut digits = String::with_capacity(group_len + 1);
        digits.push('1');
        digits.push_str(std::str::from_utf8(&bytes[start + idx..start + idx + group_len]).unwrap());
        output.extend(big_integer::to_base900(&digits)?);
        idx += group_len;
    }
    Ok(())
}

/// Encodes a short label (such as a macro file id) as standalone text-compaction codewords,
/// starting from the Alpha sub-mode.
pub(crate) fn encode_text_codewords(bytes: &[u8]) -> Vec<u16> {
    let mut output = Vec::new();
    encode_text(bytes, 0, bytes.len(), SubMode::Alpha, &mut output);
    output
}

/// Compacts `bytes` into data codewords (without the symbol length descriptor).
///
/// The symbol starts out in Text compaction Alpha sub-mode, so a leading text run needs no
/// latch codeword.
pub fn encode_high_level(bytes: &[u8], eci: Option<u32>) -> Result<Vec<u16>> {
    if bytes.is_empty() {
        return invalid_argument_error("cannot encode empty contents");
    }
    let mut output: Vec<u16> = Vec::new();

    if let Some(eci) = eci {
        if eci >= 900 {
            return invalid_argument_error("eci value out of range for pdf417");
        }
        output.push(ECI_CHARSET);
        output.push(eci as u16);
    }

    let mut in_text = true;
    let mut submode = SubMode::Alpha;
    let mut p = 0usize;
    while p < bytes.len() {
        let digits = consecutive_digit_count(bytes, p);
        if digits >= 13 {
            output.push(NUMERIC_COMPACTION_MODE_LATCH);
            encode_numeric(bytes, p, digits, &mut output)?;
            p += digits;
            in_text = false;
            submode = SubMode::Alpha;
            continue;
        }
        let text = consecutive_text_count(bytes, p);
        if text >= 5 || digits == bytes.len() - p {
            if !in_text {
                output.push(TEXT_COMPACTION_MODE_LATCH);
                submode = SubMode::Alpha;
                in_text = true;
            }
            submode = encode_text(bytes, p, text, submode, &mut output);
            p += text;
            continue;
        }
        let binary = consecutive_binary_count(bytes, p).max(1);
        encode_binary(bytes, p, binary, in_text, &mut output);
        if !(binary == 1 && in_text) {
            in_text = false;
            submode = SubMode::Alpha;
        }
        p += binary;
    }

    Ok(output)
}
