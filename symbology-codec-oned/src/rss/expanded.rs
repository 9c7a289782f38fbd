// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The GS1 DataBar Expanded decoder.
//!
//! An expanded symbol is a sequence of pairs: a 17-module data character, a five-element
//! finder pattern, and usually a second data character. The finder values must follow one of
//! the published sequences, the first character is a 211-weighted checksum over all others,
//! and the remaining characters concatenate into the bit field handled by the binary
//! decoder. Stacked symbols accumulate rows until some combination of stored rows forms a
//! valid sequence. See ISO/IEC 24724 7.
//!
//! Walking a scan line here leans on the rows being module-aligned; the tolerance-driven
//! search over raw pixel widths belongs to the detector collaborator.

use log::debug;

use symbology_core::barcode::{BarcodeFormat, DecodeOptions, Reader, ReaderDescriptor};
use symbology_core::content::{AiFlag, Content, SymbologyIdentifier};
use symbology_core::errors::{format_error, Result};
use symbology_core::io::BitBuffer;
use symbology_core::matrix::BitMatrix;
use symbology_core::support_reader;

use crate::row::scan_line;
use crate::rss::binary_decoder;
use crate::rss::databar::runs_of;
use crate::rss::helper;

const SYMBOL_WIDEST: [u32; 5] = [7, 5, 4, 3, 1];
const EVEN_TOTAL_SUBSET: [u32; 5] = [4, 20, 52, 104, 204];
const GSUM: [u32; 5] = [0, 348, 1388, 2948, 3988];

pub(crate) const FINDER_PATTERNS: [[u32; 4]; 6] = [
    [1, 8, 4, 1], // A
    [3, 6, 4, 1], // B
    [3, 4, 6, 1], // C
    [3, 2, 8, 1], // D
    [2, 6, 5, 1], // E
    [2, 2, 9, 1], // F
];

/// The valid finder-value sequences by pair count. See ISO/IEC 24724 Table 15.
const FINDER_PATTERN_SEQUENCES: [&[usize]; 10] = [
    &[0, 0],
    &[0, 1, 1],
    &[0, 2, 1, 3],
    &[0, 4, 1, 3, 2],
    &[0, 4, 1, 3, 3, 5],
    &[0, 4, 1, 3, 4, 5, 5],
    &[0, 0, 1, 1, 2, 2, 3, 3],
    &[0, 0, 1, 1, 2, 2, 3, 4, 4],
    &[0, 0, 1, 1, 2, 2, 3, 4, 5, 5],
    &[0, 0, 1, 1, 2, 3, 3, 4, 4, 5, 5],
];

/// The 211-weight of checksum position `index` is 3^index modulo 211; the published table is
/// exactly these powers laid out eight to a finder orientation.
fn weight(row_number: usize, element: usize) -> u32 {
    let exponent = row_number * 8 + element;
    let mut value = 1u32;
    for _ in 0..exponent {
        value = value * 3 % 211;
    }
    value
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DataCharacter {
    pub value: u32,
    pub checksum_portion: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExpandedPair {
    pub left: DataCharacter,
    pub right: Option<DataCharacter>,
    pub finder_value: usize,
}

/// Decodes a 17-module data character from its eight element widths.
///
/// `weight_row` selects the checksum weights: `4 * finderValue + (odd ? 0 : 2) + (left ? 0
/// : 1) - 1`, with the A1-left check character carrying no checksum portion of its own.
pub(crate) fn decode_data_character(elements: &[u32; 8], weight_row: Option<usize>) -> Option<DataCharacter> {
    let (odd, even) = helper::split_odd_even(elements);
    let odd_sum: u32 = odd.iter().sum();
    let even_sum: u32 = even.iter().sum();
    if odd_sum + even_sum != 17 {
        return None;
    }
    if odd_sum % 2 != 0 || odd_sum > 13 || odd_sum < 4 {
        return None;
    }

    let mut checksum_portion = 0;
    if let Some(row_number) = weight_row {
        for i in 0..4 {
            checksum_portion += odd[i] * weight(row_number, 2 * i);
            checksum_portion += even[i] * weight(row_number, 2 * i + 1);
        }
    }

    let group = ((13 - odd_sum) / 2) as usize;
    let odd_widest = SYMBOL_WIDEST[group];
    let even_widest = 9 - odd_widest;
    let v_odd = helper::rss_value(&odd, odd_widest, true);
    let v_even = helper::rss_value(&even, even_widest, false);
    let value = v_odd * EVEN_TOTAL_SUBSET[group] + v_even + GSUM[group];
    Some(DataCharacter { value, checksum_portion })
}

fn weight_row_for(finder_value: usize, odd_pattern: bool, left: bool) -> Option<usize> {
    if finder_value == 0 && odd_pattern && left {
        // The A1-left position holds the check character itself.
        return None;
    }
    Some(4 * finder_value + if odd_pattern { 0 } else { 2 } + if left { 0 } else { 1 } - 1)
}

/// Parses the five finder runs starting at `start`, in the orientation expected for this
/// pair index.
fn parse_finder(widths: &[u32], start: usize, odd_pattern: bool) -> Option<usize> {
    if start + 5 > widths.len() {
        return None;
    }
    let counters = if odd_pattern {
        [widths[start], widths[start + 1], widths[start + 2], widths[start + 3]]
    }
    else {
        [widths[start + 4], widths[start + 3], widths[start + 2], widths[start + 1]]
    };
    helper::parse_finder_value(&counters, &FINDER_PATTERNS)
}

/// Decodes as many pairs as the row holds, walking left character, finder, right character.
/// Finder-looking windows inside character data are ruled out by attempting a full walk from
/// each candidate.
fn retrieve_pairs(row: &[bool]) -> Option<Vec<ExpandedPair>> {
    let widths = runs_of(row);
    let widths = widths.as_slice();
    let n = widths.len();

    let mut best: Option<Vec<ExpandedPair>> = None;
    for s in 9..n.saturating_sub(4) {
        if parse_finder(widths, s, true).is_none() {
            continue;
        }
        if let Some(pairs) = retrieve_pairs_from(widths, s - 8) {
            if best.as_ref().map_or(true, |b| pairs.len() > b.len()) {
                best = Some(pairs);
            }
        }
    }
    best
}

fn retrieve_pairs_from(widths: &[u32], start: usize) -> Option<Vec<ExpandedPair>> {
    let n = widths.len();
    let mut char_start = start;
    let mut pairs: Vec<ExpandedPair> = Vec::new();
    loop {
        let odd_pattern = pairs.len() % 2 == 0;
        let finder_start = char_start + 8;
        let finder_value = match parse_finder(widths, finder_start, odd_pattern) {
            Some(value) => value,
            None => break,
        };

        let mut left_elements = [0u32; 8];
        left_elements.copy_from_slice(&widths[char_start..char_start + 8]);
        let left = match decode_data_character(
            &left_elements,
            weight_row_for(finder_value, odd_pattern, true),
        ) {
            Some(c) => c,
            None => break,
        };

        // The right character reads mirrored; it may be absent in the final pair.
        let right_start = finder_start + 5;
        let right = if right_start + 8 <= n {
            let mut right_elements = [0u32; 8];
            for (i, &w) in widths[right_start..right_start + 8].iter().rev().enumerate() {
                right_elements[i] = w;
            }
            decode_data_character(
                &right_elements,
                weight_row_for(finder_value, odd_pattern, false),
            )
        }
        else {
            None
        };

        let had_right = right.is_some();
        pairs.push(ExpandedPair { left, right, finder_value });
        if !had_right {
            break;
        }
        char_start = right_start + 8;
        if char_start + 13 > n {
            break;
        }
    }

    if pairs.is_empty() {
        None
    }
    else {
        Some(pairs)
    }
}

fn is_complete_sequence(pairs: &[ExpandedPair]) -> bool {
    FINDER_PATTERN_SEQUENCES.iter().any(|sequence| {
        sequence.len() == pairs.len()
            && pairs.iter().zip(sequence.iter()).all(|(p, &s)| p.finder_value == s)
    })
}

/// The first character checks the 211-weighted sum of every other character.
fn check_checksum(pairs: &[ExpandedPair]) -> bool {
    let first = &pairs[0];
    let first_right = match first.right {
        Some(c) => c,
        None => return false,
    };

    let mut checksum = first_right.checksum_portion;
    let mut s = 2u32;
    for pair in &pairs[1..] {
        checksum += pair.left.checksum_portion;
        s += 1;
        if let Some(right) = pair.right {
            checksum += right.checksum_portion;
            s += 1;
        }
    }
    checksum %= 211;
    211 * (s - 4) + checksum == first.left.value
}

/// Concatenates every character after the check character into the binary decoder's bit
/// field, 12 bits per character.
fn build_bit_array(pairs: &[ExpandedPair]) -> BitBuffer {
    let mut bits = BitBuffer::new();
    if let Some(right) = pairs[0].right {
        bits.append_bits(right.value, 12);
    }
    for pair in &pairs[1..] {
        bits.append_bits(pair.left.value, 12);
        if let Some(right) = pair.right {
            bits.append_bits(right.value, 12);
        }
    }
    bits
}

fn decode_pairs(pairs: &[ExpandedPair]) -> Result<Content> {
    if !is_complete_sequence(pairs) {
        return format_error("finder values do not form a published sequence");
    }
    if !check_checksum(pairs) {
        return format_error("expanded checksum mismatch");
    }
    let bits = build_bit_array(pairs);
    let text = binary_decoder::decode_expanded_bits(&bits)?;

    debug!("databar expanded decode: {} pairs", pairs.len());
    let mut content = Content::new();
    content.symbology = SymbologyIdentifier { code: 'e', modifier: '0', eci_modifier_offset: 0 };
    content.ai_flag = AiFlag::Gs1;
    content.push_str(&text);
    Ok(content)
}

/// Tries every in-order combination of stored row observations.
fn check_row_combinations(rows: &[Vec<ExpandedPair>]) -> Option<Content> {
    fn recurse(rows: &[Vec<ExpandedPair>], acc: &mut Vec<ExpandedPair>) -> Option<Content> {
        if !acc.is_empty() {
            if let Ok(content) = decode_pairs(acc) {
                return Some(content);
            }
        }
        let (first, rest) = rows.split_first()?;
        // Either skip this row or append its pairs.
        if let Some(content) = recurse(rest, acc) {
            return Some(content);
        }
        let len = acc.len();
        acc.extend(first.iter().cloned());
        let result = recurse(rest, acc);
        acc.truncate(len);
        result
    }
    recurse(rows, &mut Vec::new())
}

/// GS1 DataBar Expanded decoder, including stacked symbols split across scan lines.
pub struct DataBarExpandedReader {}

impl Reader for DataBarExpandedReader {
    fn try_new(_format: BarcodeFormat, _options: &DecodeOptions) -> Result<DataBarExpandedReader> {
        Ok(DataBarExpandedReader {})
    }

    fn supported_formats() -> &'static [ReaderDescriptor] {
        &[support_reader!(
            BarcodeFormat::DataBarExpanded,
            "databar-exp",
            "GS1 DataBar Expanded"
        )]
    }

    fn decode(&self, matrix: &BitMatrix) -> Result<Content> {
        let mut stored_rows: Vec<Vec<ExpandedPair>> = Vec::new();
        for y in 0..matrix.height() {
            let line = scan_line(matrix, y);
            let pairs = match retrieve_pairs(&line) {
                Some(pairs) => pairs,
                None => continue,
            };

            // A complete row decodes on its own.
            if let Ok(content) = decode_pairs(&pairs) {
                return Ok(content);
            }

            // Otherwise remember it and try combining with earlier partial rows.
            if stored_rows.last() != Some(&pairs) {
                stored_rows.push(pairs);
            }
            if let Some(content) = check_row_combinations(&stored_rows) {
                return Ok(content);
            }
        }
        format_error("no decodable pair sequence")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Finds the eight element widths of a 17-module character with the given value.
    pub fn unrank_data_character(value: u32) -> Option<[u32; 8]> {
        for odd_sum in (4..=12u32).step_by(2) {
            let even_sum = 17 - odd_sum;
            for odd in enumerate_widths(odd_sum) {
                for even in enumerate_widths(even_sum) {
                    let mut elements = [0u32; 8];
                    for i in 0..4 {
                        elements[2 * i] = odd[i];
                        elements[2 * i + 1] = even[i];
                    }
                    if let Some(c) = decode_data_character(&elements, None) {
                        if c.value == value {
                            return Some(elements);
                        }
                    }
                }
            }
        }
        None
    }

    fn enumerate_widths(sum: u32) -> Vec<[u32; 4]> {
        let mut out = Vec::new();
        for a in 1..=8u32 {
            for b in 1..=8u32 {
                for c in 1..=8u32 {
                    if a + b + c < sum && sum - (a + b + c) <= 8 {
                        out.push([a, b, c, sum - (a + b + c)]);
                    }
                }
            }
        }
        out
    }

    /// Encodes a bit field into one complete scan line.
    pub fn encode_row(payload: &BitBuffer) -> Option<Vec<bool>> {
        assert_eq!(payload.len() % 12, 0, "payload must fill whole characters");
        let data_values: Vec<u32> = (0..payload.len() / 12)
            .map(|i| {
                let mut v = 0;
                for b in 0..12 {
                    v = (v << 1) | u32::from(payload.bit(12 * i + b));
                }
                v
            })
            .collect();

        let char_count = data_values.len() + 1;
        let pair_count = (char_count + 1) / 2;
        let sequence = FINDER_PATTERN_SEQUENCES
            .iter()
            .find(|s| s.len() == pair_count)?;

        // Characters in transmission order; slot 0 is the check character, filled last.
        let mut widths_per_char: Vec<[u32; 8]> = Vec::with_capacity(char_count);
        widths_per_char.push([0; 8]);
        for &value in &data_values {
            widths_per_char.push(unrank_data_character(value)?);
        }

        // Sum the checksum portions of every character except the check character.
        let mut checksum = 0u32;
        let mut s = 0u32;
        for (index, widths) in widths_per_char.iter().enumerate().skip(1) {
            let pair_index = index / 2;
            let left = index % 2 == 0;
            let odd_pattern = pair_index % 2 == 0;
            let row_number =
                weight_row_for(sequence[pair_index], odd_pattern, left).expect("not check char");
            let c = decode_data_character(widths, Some(row_number))?;
            checksum += c.checksum_portion;
            s += 1;
        }
        // Include the check character itself in the character count.
        s += 1;
        let check_value = 211 * (s - 4) + checksum % 211;
        widths_per_char[0] = unrank_data_character(check_value)?;

        // Assemble runs: characters and finders in pair order; right characters and
        // even-orientation finders mirror.
        let mut widths: Vec<u32> = vec![1, 1];
        for (pair_index, &finder_value) in sequence.iter().enumerate() {
            let odd_pattern = pair_index % 2 == 0;
            let left_index = pair_index * 2;
            let right_index = left_index + 1;

            widths.extend_from_slice(&widths_per_char[left_index]);
            let f = FINDER_PATTERNS[finder_value];
            if odd_pattern {
                widths.extend_from_slice(&[f[0], f[1], f[2], f[3], 1]);
            }
            else {
                widths.extend_from_slice(&[1, f[3], f[2], f[1], f[0]]);
            }
            if right_index < char_count {
                let mut mirrored = widths_per_char[right_index];
                mirrored.reverse();
                widths.extend_from_slice(&mirrored);
            }
        }
        widths.extend_from_slice(&[1, 1]);

        let mut row = vec![false; 6];
        let mut bar = true;
        for &w in &widths {
            for _ in 0..w {
                row.push(bar);
            }
            bar = !bar;
        }
        row.extend(std::iter::repeat(false).take(6));
        Some(row)
    }
}
