// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The GS1 DataBar (RSS-14) decoder.
//!
//! Each half of the symbol is a pair: an outside data character, a five-element finder
//! pattern, and an inside data character. Observations are tallied across scan lines; a
//! left/right combination is accepted once both halves have been seen twice and the
//! finder-value checksum agrees. See ISO/IEC 24724 6.

use log::debug;

use symbology_core::barcode::{BarcodeFormat, DecodeOptions, Reader, ReaderDescriptor};
use symbology_core::content::{AiFlag, Content, SymbologyIdentifier};
use symbology_core::errors::{format_error, Result};
use symbology_core::matrix::BitMatrix;
use symbology_core::support_reader;

use crate::row::scan_line;
use crate::rss::helper;

const OUTSIDE_EVEN_TOTAL_SUBSET: [u32; 5] = [1, 10, 34, 70, 126];
const INSIDE_ODD_TOTAL_SUBSET: [u32; 4] = [4, 20, 48, 81];
const OUTSIDE_GSUM: [u32; 5] = [0, 161, 961, 2015, 2715];
const INSIDE_GSUM: [u32; 4] = [0, 336, 1036, 1516];
const OUTSIDE_ODD_WIDEST: [u32; 5] = [8, 6, 4, 3, 1];
const INSIDE_ODD_WIDEST: [u32; 4] = [2, 4, 6, 8];

pub(crate) const FINDER_PATTERNS: [[u32; 4]; 9] = [
    [3, 8, 2, 1],
    [3, 5, 5, 1],
    [3, 3, 7, 1],
    [3, 1, 9, 1],
    [2, 7, 4, 1],
    [2, 5, 6, 1],
    [2, 3, 8, 1],
    [1, 5, 7, 1],
    [1, 3, 9, 1],
];

/// One decoded data character: its characteristic value and checksum contribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DataCharacter {
    pub value: u32,
    pub checksum_portion: u32,
}

/// One decoded half-symbol, with its tally of concurring scan lines.
#[derive(Clone, Debug)]
struct Pair {
    value: u32,
    checksum_portion: u32,
    finder_value: u32,
    count: u32,
}

/// The run widths of a scan line; colors strictly alternate, so widths alone carry the
/// pattern information the character and finder arithmetic needs.
pub(crate) fn runs_of(row: &[bool]) -> Vec<u32> {
    let mut widths = Vec::new();
    let mut i = 0;
    while i < row.len() {
        let color = row[i];
        let start = i;
        while i < row.len() && row[i] == color {
            i += 1;
        }
        widths.push((i - start) as u32);
    }
    widths
}

/// Decodes the outside (16 modules) or inside (15 modules) data character from the eight
/// element runs adjacent to the finder.
pub(crate) fn decode_data_character(elements: &[u32], outside: bool) -> Option<DataCharacter> {
    let mut counters = [0u32; 8];
    counters.copy_from_slice(elements);

    let (odd, even) = helper::split_odd_even(&counters);
    let odd_sum: u32 = odd.iter().sum();
    let even_sum: u32 = even.iter().sum();

    let mut odd_checksum_portion = 0;
    for &count in odd.iter().rev() {
        odd_checksum_portion = odd_checksum_portion * 9 + count;
    }
    let mut even_checksum_portion = 0;
    for &count in even.iter().rev() {
        even_checksum_portion = even_checksum_portion * 9 + count;
    }
    let checksum_portion = odd_checksum_portion + 3 * even_checksum_portion;

    if outside {
        if odd_sum + even_sum != 16 || odd_sum % 2 != 0 || odd_sum > 12 || odd_sum < 4 {
            return None;
        }
        let group = ((12 - odd_sum) / 2) as usize;
        let odd_widest = OUTSIDE_ODD_WIDEST[group];
        let even_widest = 9 - odd_widest;
        let v_odd = helper::rss_value(&odd, odd_widest, false);
        let v_even = helper::rss_value(&even, even_widest, true);
        let t_even = OUTSIDE_EVEN_TOTAL_SUBSET[group];
        let g_sum = OUTSIDE_GSUM[group];
        Some(DataCharacter { value: v_odd * t_even + v_even + g_sum, checksum_portion })
    }
    else {
        if odd_sum + even_sum != 15 || even_sum % 2 != 0 || even_sum > 10 || even_sum < 4 {
            return None;
        }
        let group = ((10 - even_sum) / 2) as usize;
        let odd_widest = INSIDE_ODD_WIDEST[group];
        let even_widest = 9 - odd_widest;
        let v_odd = helper::rss_value(&odd, odd_widest, true);
        let v_even = helper::rss_value(&even, even_widest, false);
        let t_odd = INSIDE_ODD_TOTAL_SUBSET[group];
        let g_sum = INSIDE_GSUM[group];
        Some(DataCharacter { value: v_even * t_odd + v_odd + g_sum, checksum_portion })
    }
}

/// Finds a finder pattern in the run sequence and decodes the half-symbol around it.
fn decode_pair(row: &[bool]) -> Option<Pair> {
    let runs = runs_of(row);
    let n = runs.len();

    for w in 1..n.saturating_sub(4) {
        // The window holds finder elements 2 through 5; element 1 sits just before it.
        let window = [runs[w], runs[w + 1], runs[w + 2], runs[w + 3]];
        if !helper::is_finder_pattern(&window) {
            continue;
        }
        let full = [runs[w - 1], runs[w], runs[w + 1], runs[w + 2]];
        let finder_value = match helper::parse_finder_value(&full, &FINDER_PATTERNS) {
            Some(value) => value as u32,
            None => continue,
        };

        // Outside character: the eight runs before the finder. Inside: the eight after.
        if w < 9 || w + 12 > n {
            continue;
        }
        let outside = match decode_data_character(&runs[w - 9..w - 1], true) {
            Some(c) => c,
            None => continue,
        };
        let inside = match decode_data_character(&runs[w + 4..w + 12], false) {
            Some(c) => c,
            None => continue,
        };

        return Some(Pair {
            value: 1597 * outside.value + inside.value,
            checksum_portion: outside.checksum_portion + 4 * inside.checksum_portion,
            finder_value,
            count: 1,
        });
    }
    None
}

fn add_or_tally(pairs: &mut Vec<Pair>, pair: Option<Pair>) {
    let pair = match pair {
        Some(pair) => pair,
        None => return,
    };
    match pairs.iter_mut().find(|other| other.value == pair.value) {
        Some(other) => other.count += 1,
        None => pairs.push(pair),
    }
}

/// The finder-value checksum: 9 * leftFV + rightFV, with the two reserved codes skipped.
fn check_checksum(left: &Pair, right: &Pair) -> bool {
    let check_value = (left.checksum_portion + 16 * right.checksum_portion) % 79;
    let mut target = 9 * left.finder_value + right.finder_value;
    if target > 72 {
        target -= 1;
    }
    if target > 8 {
        target -= 1;
    }
    check_value == target
}

fn construct_result(left: &Pair, right: &Pair) -> Content {
    let symbol_value = 4_537_077u64 * u64::from(left.value) + u64::from(right.value);
    let mut digits = format!("{:013}", symbol_value);
    let check = crate::gtin::compute_check_digit(&digits).unwrap();
    digits.push(check);

    let mut content = Content::new();
    content.symbology = SymbologyIdentifier { code: 'e', modifier: '0', eci_modifier_offset: 0 };
    content.ai_flag = AiFlag::Gs1;
    content.push_str(&digits);
    content
}

/// GS1 DataBar (RSS-14) decoder. Pairs accumulate across the scan lines of one matrix.
pub struct DataBarReader {}

impl Reader for DataBarReader {
    fn try_new(_format: BarcodeFormat, _options: &DecodeOptions) -> Result<DataBarReader> {
        Ok(DataBarReader {})
    }

    fn supported_formats() -> &'static [ReaderDescriptor] {
        &[support_reader!(BarcodeFormat::DataBar, "databar", "GS1 DataBar")]
    }

    fn decode(&self, matrix: &BitMatrix) -> Result<Content> {
        let mut possible_left_pairs: Vec<Pair> = Vec::new();
        let mut possible_right_pairs: Vec<Pair> = Vec::new();

        for y in 0..matrix.height() {
            let line = scan_line(matrix, y);
            add_or_tally(&mut possible_left_pairs, decode_pair(&line));
            let reversed: Vec<bool> = line.iter().rev().copied().collect();
            add_or_tally(&mut possible_right_pairs, decode_pair(&reversed));

            for left in &possible_left_pairs {
                if left.count > 1 {
                    for right in &possible_right_pairs {
                        if right.count > 1 && check_checksum(left, right) {
                            debug!(
                                "databar decode: pair values {} / {}",
                                left.value, right.value
                            );
                            return Ok(construct_result(left, right));
                        }
                    }
                }
            }
        }
        format_error("no concurring pair observations")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builds reference rows by inverting the characteristic-value arithmetic through
    //! exhaustive enumeration; symbol values stay small enough for that to be instant.

    use super::*;

    /// Finds the eight element widths of a data character with the given value.
    pub fn unrank_data_character(value: u32, outside: bool) -> Option<[u32; 8]> {
        let (total, odd_parity_even) = if outside { (16, true) } else { (15, false) };
        let _ = odd_parity_even;
        for odd_sum in (4..=12u32).step_by(2) {
            let even_sum = total - odd_sum;
            if even_sum < 4 {
                continue;
            }
            for odd in enumerate_widths(odd_sum) {
                for even in enumerate_widths(even_sum) {
                    let mut elements = [0u32; 8];
                    for i in 0..4 {
                        elements[2 * i] = odd[i];
                        elements[2 * i + 1] = even[i];
                    }
                    if let Some(c) = decode_data_character(&elements, outside) {
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

    /// Renders one complete RSS-14 row for a 13-digit value, choosing finder values that
    /// satisfy the checksum.
    pub fn encode_row(value13: u64) -> Option<Vec<bool>> {
        let left_value = (value13 / 4_537_077) as u32;
        let right_value = (value13 % 4_537_077) as u32;

        let halves = [left_value, right_value].map(|value| {
            let outside = unrank_data_character(value / 1597, true)?;
            let inside = unrank_data_character(value % 1597, false)?;
            let oc = decode_data_character(&outside, true)?;
            let ic = decode_data_character(&inside, false)?;
            Some((outside, inside, oc.checksum_portion + 4 * ic.checksum_portion))
        });
        let (left_out, left_in, left_checksum) = halves[0]?;
        let (right_out, right_in, right_checksum) = halves[1]?;

        let check_value = (left_checksum + 16 * right_checksum) % 79;
        let mut finder = None;
        'outer: for lf in 0..9u32 {
            for rf in 0..9u32 {
                let mut target = 9 * lf + rf;
                if target > 72 {
                    target -= 1;
                }
                if target > 8 {
                    target -= 1;
                }
                if target == check_value {
                    finder = Some((lf, rf));
                    break 'outer;
                }
            }
        }
        let (lf, rf) = finder?;

        // Run layout, strictly alternating colors: a single guard element on each edge, the
        // left half read forward, the right half mirrored in place. Only the run widths
        // matter to the decoder; it never consults absolute colors.
        let mut widths: Vec<u32> = Vec::with_capacity(44);
        widths.push(1); // left guard
        widths.extend_from_slice(&left_out);
        let f = FINDER_PATTERNS[lf as usize];
        widths.extend_from_slice(&[f[0], f[1], f[2], f[3], 1]);
        widths.extend_from_slice(&left_in);

        let mut right: Vec<u32> = Vec::with_capacity(22);
        right.extend_from_slice(&right_out);
        let f = FINDER_PATTERNS[rf as usize];
        right.extend_from_slice(&[f[0], f[1], f[2], f[3], 1]);
        right.extend_from_slice(&right_in);
        right.reverse();
        widths.extend_from_slice(&right);
        widths.push(1); // right guard

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
