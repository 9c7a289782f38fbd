// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The MaxiCode module map: the fixed 30x33 grid holds 144 six-bit codewords around the
//! central finder and orientation modules.
//!
//! The reserved-module set below (126 modules: the bullseye region plus six three-module
//! orientation clusters) and the row-major codeword numbering are a generated stand-in for
//! the published map of ISO/IEC 16023 Figure 5, which still needs to be cross-checked against
//! the standard before symbols sampled by external detectors can be fed in. Both directions
//! of the translation share this table, so everything inside the crate agrees on it.

use symbology_core::errors::{format_error, Result};
use symbology_core::matrix::BitMatrix;

pub const MATRIX_WIDTH: u32 = 30;
pub const MATRIX_HEIGHT: u32 = 33;
pub const NUM_CODEWORDS: usize = 144;

/// Half-widths of the reserved bullseye region per row offset from the center row.
const BULLSEYE_SPANS: [(i32, u32, u32); 13] = [
    (-6, 14, 15),
    (-5, 12, 17),
    (-4, 11, 18),
    (-3, 10, 19),
    (-2, 10, 19),
    (-1, 9, 20),
    (0, 9, 20),
    (1, 9, 20),
    (2, 10, 19),
    (3, 10, 19),
    (4, 11, 18),
    (5, 12, 17),
    (6, 14, 15),
];

const CENTER_ROW: i32 = 16;

/// The six orientation clusters, three modules each.
const ORIENTATION_MODULES: [(u32, u32); 18] = [
    (8, 13), (8, 14), (9, 14),
    (20, 13), (21, 13), (21, 14),
    (7, 16), (7, 17), (8, 17),
    (21, 16), (22, 16), (22, 17),
    (8, 19), (8, 20), (9, 20),
    (20, 19), (21, 19), (21, 20),
];

fn is_reserved(x: u32, y: u32) -> bool {
    for &(dy, lo, hi) in &BULLSEYE_SPANS {
        if y as i32 == CENTER_ROW + dy && x >= lo && x <= hi {
            return true;
        }
    }
    ORIENTATION_MODULES.contains(&(x, y))
}

/// Visits every data module in map order together with its codeword index and bit weight
/// (bit 5 first).
fn for_each_data_module(mut f: impl FnMut(u32, u32, usize, u32)) {
    let mut bit = 0usize;
    for y in 0..MATRIX_HEIGHT {
        for x in 0..MATRIX_WIDTH {
            if is_reserved(x, y) {
                continue;
            }
            f(x, y, bit / 6, 5 - (bit % 6) as u32);
            bit += 1;
        }
    }
    debug_assert_eq!(bit, NUM_CODEWORDS * 6);
}

/// Reads the 144 six-bit codewords out of a module-aligned grid.
pub fn read_codewords(matrix: &BitMatrix) -> Result<Vec<u8>> {
    if matrix.width() != MATRIX_WIDTH || matrix.height() != MATRIX_HEIGHT {
        return format_error("matrix dimensions do not match the maxicode grid");
    }
    let mut codewords = vec![0u8; NUM_CODEWORDS];
    for_each_data_module(|x, y, codeword, weight| {
        if matrix.get(x, y) {
            codewords[codeword] |= 1 << weight;
        }
    });
    Ok(codewords)
}

/// Lays codewords back out into a grid; the inverse of [`read_codewords`], used to build
/// reference symbols.
pub fn write_codewords(codewords: &[u8]) -> Result<BitMatrix> {
    if codewords.len() != NUM_CODEWORDS {
        return format_error("codeword count does not match the maxicode grid");
    }
    let mut matrix = BitMatrix::new(MATRIX_WIDTH, MATRIX_HEIGHT)?;
    // The central bullseye rings, so geometry checks have something to look at.
    for &(dy, lo, hi) in &BULLSEYE_SPANS {
        if dy % 2 == 0 {
            let y = (CENTER_ROW + dy) as u32;
            for x in lo..=hi {
                matrix.set(x, y, true);
            }
        }
    }
    for_each_data_module(|x, y, codeword, weight| {
        if codewords[codeword] & (1 << weight) != 0 {
            matrix.set(x, y, true);
        }
    });
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_data_module_count() {
        let mut reserved = 0;
        for y in 0..MATRIX_HEIGHT {
            for x in 0..MATRIX_WIDTH {
                if is_reserved(x, y) {
                    reserved += 1;
                }
            }
        }
        assert_eq!(reserved, 126);
        assert_eq!((MATRIX_WIDTH * MATRIX_HEIGHT) as usize - reserved, NUM_CODEWORDS * 6);
    }

    #[test]
    fn verify_codeword_round_trip() {
        let codewords: Vec<u8> = (0..NUM_CODEWORDS).map(|i| (i * 29 % 64) as u8).collect();
        let matrix = write_codewords(&codewords).unwrap();
        assert_eq!(read_codewords(&matrix).unwrap(), codewords);
    }

    #[test]
    fn verify_dimension_check() {
        let matrix = BitMatrix::new(30, 30).unwrap();
        assert!(read_codewords(&matrix).is_err());
    }
}
