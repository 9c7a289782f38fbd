// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared scan-line primitives: run recording and proportional pattern matching.

use symbology_core::matrix::BitMatrix;

/// Extracts one matrix row as a scan line; `true` is a bar.
pub fn scan_line(matrix: &BitMatrix, y: u32) -> Vec<bool> {
    (0..matrix.width()).map(|x| matrix.get(x, y)).collect()
}

/// The first index at or after `from` whose value equals `value`, or the row end.
pub fn next_with_value(row: &[bool], from: usize, value: bool) -> usize {
    row.iter().skip(from).position(|&b| b == value).map_or(row.len(), |i| from + i)
}

pub fn next_set(row: &[bool], from: usize) -> usize {
    next_with_value(row, from, true)
}

pub fn next_unset(row: &[bool], from: usize) -> usize {
    next_with_value(row, from, false)
}

/// True when every module in `[from, to)` equals `value`.
pub fn is_range(row: &[bool], from: usize, to: usize, value: bool) -> bool {
    row[from..to.min(row.len())].iter().all(|&b| b == value)
}

/// Records the widths of consecutive runs starting at `offset` into `counters`. The module at
/// `offset` begins the first run. Returns false if the row ends before all counters fill,
/// except that the final run may end at the row boundary.
pub fn record_pattern(row: &[bool], offset: usize, counters: &mut [u32]) -> bool {
    counters.iter_mut().for_each(|c| *c = 0);
    if offset >= row.len() {
        return false;
    }
    let mut color = row[offset];
    let mut position = 0;
    for i in offset..row.len() {
        if row[i] == color {
            counters[position] += 1;
        }
        else {
            position += 1;
            if position == counters.len() {
                return true;
            }
            color = row[i];
            counters[position] = 1;
        }
    }
    position == counters.len() - 1
}

/// Backs up over `counters.len()` runs ending just before `end`, then records them in
/// forward reading order.
pub fn record_pattern_in_reverse(row: &[bool], end: usize, counters: &mut [u32]) -> bool {
    if end == 0 {
        return false;
    }
    let mut transitions_left = counters.len();
    let mut last = row[end - 1];
    let mut start = end;
    while start > 0 {
        if row[start - 1] != last {
            if transitions_left == 1 {
                break;
            }
            transitions_left -= 1;
            last = !last;
        }
        start -= 1;
    }
    if start == 0 && transitions_left > 1 {
        return false;
    }
    record_pattern(row, start, counters) && counters.iter().map(|&c| c as usize).sum::<usize>() == end - start
}

/// Proportional distance between observed run widths and a reference pattern, in units of a
/// full module; `f32::MAX` when any single run deviates beyond `max_individual_variance`.
pub fn pattern_match_variance(counters: &[u32], pattern: &[u32], max_individual_variance: f32) -> f32 {
    let total: u32 = counters.iter().sum();
    let pattern_length: u32 = pattern.iter().sum();
    if total < pattern_length {
        // Not even one module per pattern unit observed.
        return f32::MAX;
    }
    let unit_bar_width = total as f32 / pattern_length as f32;
    let max_individual_variance = max_individual_variance * unit_bar_width;

    let mut total_variance = 0.0f32;
    for (&counter, &scaled) in counters.iter().zip(pattern) {
        let scaled = scaled as f32 * unit_bar_width;
        let variance = (counter as f32 - scaled).abs();
        if variance > max_individual_variance {
            return f32::MAX;
        }
        total_variance += variance;
    }
    total_variance / total as f32
}

/// Searches for a run pattern from `offset`, returning its `(begin, end)` offsets.
pub fn find_guard_pattern(
    row: &[bool],
    offset: usize,
    white_first: bool,
    pattern: &[u32],
    max_individual_variance: f32,
    max_avg_variance: f32,
) -> Option<(usize, usize)> {
    let mut counters = vec![0u32; pattern.len()];
    let mut is_white = white_first;
    let mut row_offset = if white_first { next_unset(row, offset) } else { next_set(row, offset) };
    let mut counter_position = 0;
    let mut pattern_start = row_offset;

    for i in row_offset..row.len() {
        if row[i] != is_white {
            counters[counter_position] += 1;
        }
        else {
            if counter_position == pattern.len() - 1 {
                if pattern_match_variance(&counters, pattern, max_individual_variance)
                    < max_avg_variance
                {
                    return Some((pattern_start, i));
                }
                pattern_start += (counters[0] + counters[1]) as usize;
                counters.rotate_left(2);
                counters[pattern.len() - 2] = 0;
                counters[pattern.len() - 1] = 0;
                counter_position -= 1;
            }
            else {
                counter_position += 1;
            }
            counters[counter_position] = 1;
            is_white = !is_white;
        }
    }
    let _ = row_offset;
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_from(bits: &str) -> Vec<bool> {
        bits.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn verify_record_pattern() {
        let row = row_from("0011101000");
        let mut counters = [0u32; 4];
        assert!(record_pattern(&row, 2, &mut counters));
        assert_eq!(counters, [3, 1, 1, 3]);

        // Backing up four runs from offset 7 lands at the row start; the runs then read
        // forward.
        assert!(record_pattern_in_reverse(&row, 7, &mut counters));
        assert_eq!(counters, [2, 3, 1, 1]);
    }

    #[test]
    fn verify_variance() {
        // An exact match has zero variance.
        assert_eq!(pattern_match_variance(&[3, 1, 1], &[3, 1, 1], 0.7), 0.0);
        // Doubled widths still match proportionally.
        assert_eq!(pattern_match_variance(&[6, 2, 2], &[3, 1, 1], 0.7), 0.0);
        // A badly deviating run fails outright.
        assert_eq!(pattern_match_variance(&[8, 1, 1], &[3, 1, 1], 0.45), f32::MAX);
    }

    #[test]
    fn verify_find_guard() {
        //                  quiet  1 1 1
        let row = row_from("0000001010000");
        let found = find_guard_pattern(&row, 0, false, &[1, 1, 1], 0.7, 0.48);
        assert_eq!(found, Some((6, 9)));
    }
}
