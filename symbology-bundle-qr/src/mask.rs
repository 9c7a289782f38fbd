// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data mask predicates and mask evaluation.
//!
//! See ISO/IEC 18004:2006 6.8.1 for the eight mask conditions and 6.8.2.1 for the penalty
//! rules applied when selecting a mask.

use symbology_core::matrix::BitMatrix;

// Penalty weights from ISO/IEC 18004:2006 6.8.2.1.
const N1: i32 = 3;
const N2: i32 = 3;
const N3: i32 = 40;
const N4: i32 = 10;

/// A Micro QR mask reference selects one of four of the eight full-size masks.
const MICRO_MASKS: [u8; 4] = [1, 4, 6, 7];

/// Whether the mask flips the module at row `y`, column `x`.
pub fn get_data_mask_bit(mask: u8, x: u32, y: u32, is_micro: bool) -> bool {
    let mask = if is_micro { MICRO_MASKS[usize::from(mask)] } else { mask };
    let (x, y) = (x as i32, y as i32);
    match mask {
        0 => (x + y) % 2 == 0,
        1 => y % 2 == 0,
        2 => x % 3 == 0,
        3 => (x + y) % 3 == 0,
        4 => ((y / 2) + (x / 3)) % 2 == 0,
        5 => (x * y) % 6 == 0,
        6 => (x * y) % 6 < 3,
        7 => (x + y + (x * y) % 3) % 2 == 0,
        _ => panic!("invalid data mask reference"),
    }
}

/// Flips every data module selected by the mask; applying the same mask twice restores the
/// original matrix.
pub fn apply_mask(matrix: &mut BitMatrix, mask: u8, is_micro: bool, function_pattern: &BitMatrix) {
    for y in 0..matrix.height() {
        for x in 0..matrix.width() {
            if !function_pattern.get(x, y) && get_data_mask_bit(mask, x, y, is_micro) {
                matrix.flip(x, y);
            }
        }
    }
}

/// The full-size penalty score: the sum of the four rules. Lower is better.
pub fn calculate_mask_penalty(matrix: &BitMatrix) -> i32 {
    apply_mask_penalty_rule1(matrix)
        + apply_mask_penalty_rule2(matrix)
        + apply_mask_penalty_rule3(matrix)
        + apply_mask_penalty_rule4(matrix)
}

/// Rule 1: adjacent modules of the same colour in a row or column, runs of 5 or longer.
fn apply_mask_penalty_rule1(matrix: &BitMatrix) -> i32 {
    apply_mask_penalty_rule1_internal(matrix, true) + apply_mask_penalty_rule1_internal(matrix, false)
}

fn apply_mask_penalty_rule1_internal(matrix: &BitMatrix, horizontal: bool) -> i32 {
    let mut penalty = 0;
    let (i_limit, j_limit) = if horizontal {
        (matrix.height(), matrix.width())
    }
    else {
        (matrix.width(), matrix.height())
    };
    for i in 0..i_limit {
        let mut run = 0i32;
        let mut prev = None;
        for j in 0..j_limit {
            let bit = if horizontal { matrix.get(j, i) } else { matrix.get(i, j) };
            if Some(bit) == prev {
                run += 1;
            }
            else {
                if run >= 5 {
                    penalty += N1 + (run - 5);
                }
                run = 1;
                prev = Some(bit);
            }
        }
        if run >= 5 {
            penalty += N1 + (run - 5);
        }
    }
    penalty
}

/// Rule 2: 2x2 blocks of a single colour. Counting every 2x2 block inside a larger monochrome
/// block is equivalent to the standard's (M-1)x(N-1) weighting.
fn apply_mask_penalty_rule2(matrix: &BitMatrix) -> i32 {
    let mut count = 0;
    for y in 0..matrix.height() - 1 {
        for x in 0..matrix.width() - 1 {
            let value = matrix.get(x, y);
            if value == matrix.get(x + 1, y)
                && value == matrix.get(x, y + 1)
                && value == matrix.get(x + 1, y + 1)
            {
                count += 1;
            }
        }
    }
    N2 * count
}

/// Rule 3: a 1:1:3:1:1 dark/light run flanked by at least 4 light modules on either side, in
/// either orientation.
fn apply_mask_penalty_rule3(matrix: &BitMatrix) -> i32 {
    let width = matrix.width();
    let height = matrix.height();
    let is_white_h = |y: u32, from: u32, to: u32| (from..to).all(|x| !matrix.get(x, y));
    let is_white_v = |x: u32, from: u32, to: u32| (from..to).all(|y| !matrix.get(x, y));
    let mut count = 0;
    for y in 0..height {
        for x in 0..width {
            if x + 6 < width
                && matrix.get(x, y)
                && !matrix.get(x + 1, y)
                && matrix.get(x + 2, y)
                && matrix.get(x + 3, y)
                && matrix.get(x + 4, y)
                && !matrix.get(x + 5, y)
                && matrix.get(x + 6, y)
                && (is_white_h(y, x.saturating_sub(4), x) || is_white_h(y, x + 7, (x + 11).min(width)))
            {
                count += 1;
            }
            if y + 6 < height
                && matrix.get(x, y)
                && !matrix.get(x, y + 1)
                && matrix.get(x, y + 2)
                && matrix.get(x, y + 3)
                && matrix.get(x, y + 4)
                && !matrix.get(x, y + 5)
                && matrix.get(x, y + 6)
                && (is_white_v(x, y.saturating_sub(4), y) || is_white_v(x, y + 7, (y + 11).min(height)))
            {
                count += 1;
            }
        }
    }
    count * N3
}

/// Rule 4: deviation of the dark-module ratio from 50%, in steps of 5%.
fn apply_mask_penalty_rule4(matrix: &BitMatrix) -> i32 {
    let mut dark = 0i32;
    for y in 0..matrix.height() {
        for x in 0..matrix.width() {
            if matrix.get(x, y) {
                dark += 1;
            }
        }
    }
    let total = (matrix.width() * matrix.height()) as i32;
    let five_percent_variances = (dark * 2 - total).abs() * 10 / total;
    five_percent_variances * N4
}

/// The Micro QR evaluation favours dark modules along the right and bottom edges; unlike the
/// penalty score, a higher value is better.
///
/// See ISO/IEC 18004:2006 6.8.2.2.
pub fn calculate_micro_mask_score(matrix: &BitMatrix) -> i32 {
    let dimension = matrix.height();
    let mut sum1 = 0i32; // bottom edge
    let mut sum2 = 0i32; // right edge
    for i in 1..dimension {
        if matrix.get(i, dimension - 1) {
            sum1 += 1;
        }
        if matrix.get(dimension - 1, i) {
            sum2 += 1;
        }
    }
    if sum1 <= sum2 {
        sum1 * 16 + sum2
    }
    else {
        sum2 * 16 + sum1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_mask_predicates() {
        // Condition 000: checkerboard.
        assert!(get_data_mask_bit(0, 0, 0, false));
        assert!(!get_data_mask_bit(0, 1, 0, false));
        assert!(get_data_mask_bit(0, 1, 1, false));
        // Condition 001: every other row.
        assert!(get_data_mask_bit(1, 5, 0, false));
        assert!(!get_data_mask_bit(1, 5, 1, false));
        // Condition 111 reference pattern, first row alternates in pairs of three.
        assert!(get_data_mask_bit(7, 0, 0, false));
        assert!(!get_data_mask_bit(7, 1, 0, false));
        // Micro mask 0 selects full-size condition 001.
        assert_eq!(get_data_mask_bit(0, 3, 2, true), get_data_mask_bit(1, 3, 2, false));
    }

    #[test]
    fn verify_mask_is_involutive() {
        let function_pattern = BitMatrix::square(21).unwrap();
        let mut matrix = BitMatrix::square(21).unwrap();
        matrix.set_region(3, 5, 7, 4).unwrap();
        let pristine = matrix.clone();
        for mask in 0..8 {
            apply_mask(&mut matrix, mask, false, &function_pattern);
            assert_ne!(matrix, pristine);
            apply_mask(&mut matrix, mask, false, &function_pattern);
            assert_eq!(matrix, pristine);
        }
    }

    #[test]
    fn verify_rule1_runs() {
        let mut matrix = BitMatrix::new(8, 1).unwrap();
        // A single run of 6 dark modules: N1 + (6 - 5) = 4, plus nothing for the light pair.
        matrix.set_region(0, 0, 6, 1).unwrap();
        assert_eq!(apply_mask_penalty_rule1(&matrix), 4);
    }

    #[test]
    fn verify_rule2_blocks() {
        let mut matrix = BitMatrix::new(3, 3).unwrap();
        // All-light 3x3 contains four 2x2 light blocks.
        assert_eq!(apply_mask_penalty_rule2(&matrix), 4 * N2);
        matrix.set(1, 1, true);
        assert_eq!(apply_mask_penalty_rule2(&matrix), 0);
    }

    #[test]
    fn verify_rule3_finder_pattern() {
        let mut matrix = BitMatrix::new(11, 1).unwrap();
        // 1011101 followed by 4 light modules.
        for x in [0u32, 2, 3, 4, 6] {
            matrix.set(x, 0, true);
        }
        assert_eq!(apply_mask_penalty_rule3(&matrix), N3);
    }

    #[test]
    fn verify_rule4_ratio() {
        let matrix = BitMatrix::new(10, 1).unwrap();
        // All light: |0 - 10| * 10 / 10 = 10 variances.
        assert_eq!(apply_mask_penalty_rule4(&matrix), 10 * N4);
    }
}
