// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared DataBar arithmetic: the characteristic value of a width sequence and finder-pattern
//! matching.

use crate::row::pattern_match_variance;

const MAX_AVG_VARIANCE: f32 = 0.2;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.45;

fn combins(n: u32, r: u32) -> u32 {
    let (min_denom, max_denom) = if n - r > r { (r, n - r) } else { (n - r, r) };
    let mut value: u64 = 1;
    let mut j = 1;
    for i in ((max_denom + 1)..=n).rev() {
        value *= u64::from(i);
        if j <= min_denom {
            value /= u64::from(j);
            j += 1;
        }
    }
    while j <= min_denom {
        value /= u64::from(j);
        j += 1;
    }
    value as u32
}

/// Ranks a width sequence within the set of sequences sharing its module total, widest
/// element bound, and (for `no_narrow`) the all-narrow exclusion. The characteristic-value
/// arithmetic of ISO/IEC 24724 Annex B.
pub fn rss_value(widths: &[u32; 4], max_width: u32, no_narrow: bool) -> u32 {
    let elements = widths.len() as u32;
    let mut n: u32 = widths.iter().sum();
    let mut value = 0;
    let mut narrow_mask = 0u32;
    for bar in 0..elements - 1 {
        let mut elm_width = 1;
        narrow_mask |= 1 << bar;
        while elm_width < widths[bar as usize] {
            let mut sub_val = combins(n - elm_width - 1, elements - bar - 2);
            if no_narrow
                && narrow_mask == 0
                && n - elm_width - (elements - bar - 1) >= elements - bar - 1
            {
                sub_val -= combins(n - elm_width - (elements - bar), elements - bar - 2);
            }
            if elements - bar - 1 > 1 {
                let mut less_val = 0;
                let mut mxw_element = n - elm_width - (elements - bar - 2);
                while mxw_element > max_width {
                    less_val += combins(n - elm_width - mxw_element - 1, elements - bar - 3);
                    mxw_element -= 1;
                }
                sub_val -= less_val * (elements - 1 - bar);
            }
            else if n - elm_width > max_width {
                sub_val -= 1;
            }
            value += sub_val;

            elm_width += 1;
            narrow_mask &= !(1 << bar);
        }
        n -= elm_width;
    }
    value
}

/// A quick plausibility test on the four counters after the first finder element: the leading
/// pair is 8 to 14 times as wide as either trailing element.
pub fn is_finder_pattern(counters: &[u32; 4]) -> bool {
    let a = counters[0] + counters[1];
    let b = counters[2];
    let c = counters[3];
    b > 0 && c > 0 && a > 8 * b && a < 14 * b && a > 8 * c && a < 14 * c
}

/// Matches four finder counters (elements 1 through 4) against a pattern table.
pub fn parse_finder_value(counters: &[u32; 4], patterns: &[[u32; 4]]) -> Option<usize> {
    patterns.iter().position(|pattern| {
        pattern_match_variance(counters, pattern, MAX_INDIVIDUAL_VARIANCE) < MAX_AVG_VARIANCE
    })
}

/// Splits eight element widths into the odd and even width vectors, normalized to module
/// counts. Widths are exact for module-aligned rows, so no rounding adjustment applies here.
pub fn split_odd_even(counters: &[u32; 8]) -> ([u32; 4], [u32; 4]) {
    let mut odd = [0u32; 4];
    let mut even = [0u32; 4];
    for i in 0..8 {
        if i % 2 == 0 {
            odd[i / 2] = counters[i];
        }
        else {
            even[i / 2] = counters[i];
        }
    }
    (odd, even)
}
