// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module layout for encoded QR and Micro QR symbols: function patterns, format and version
//! information, and the zig-zag data placement.

use symbology_core::errors::{invalid_argument_error, Result};
use symbology_core::io::BitBuffer;
use symbology_core::matrix::BitMatrix;

use crate::format_info::FormatInformation;
use crate::mask::get_data_mask_bit;
use crate::version::{ErrorCorrectionLevel, Version};

/// Generator polynomial for the 18-bit version information field, Annex D.
const VERSION_INFO_POLY: u32 = 0x1f25;

/// Generator polynomial for the 15-bit format information field, Annex C.
const TYPE_INFO_POLY: u32 = 0x537;

/// Placement of the 15 format bits around the top-left finder, LSB first.
const TYPE_INFO_COORDINATES: [(u32, u32); 15] = [
    (8, 0), (8, 1), (8, 2), (8, 3), (8, 4), (8, 5), (8, 7), (8, 8),
    (7, 8), (5, 8), (4, 8), (3, 8), (2, 8), (1, 8), (0, 8),
];

fn find_msb_set(value: u32) -> u32 {
    32 - value.leading_zeros()
}

/// Remainder of `value` * x^(deg(poly)) divided by `poly` over GF(2); the BCH code protecting
/// the format and version fields.
pub fn calculate_bch_code(value: u32, poly: u32) -> u32 {
    let msb_set_in_poly = find_msb_set(poly);
    let mut value = value << (msb_set_in_poly - 1);
    while find_msb_set(value) >= msb_set_in_poly {
        value ^= poly << (find_msb_set(value) - msb_set_in_poly);
    }
    value
}

/// The full 15-bit masked format word for a full-size symbol.
fn make_type_info_bits(ec_level: ErrorCorrectionLevel, mask_pattern: u8) -> u32 {
    let type_info = (ec_level.bits() << 3) | u32::from(mask_pattern);
    let code = (type_info << 10) | calculate_bch_code(type_info, TYPE_INFO_POLY);
    code ^ crate::format_info::FORMAT_INFO_MASK_QR
}

/// The full 15-bit masked format word for a Micro QR symbol.
fn make_micro_type_info_bits(symbol_number: u32, mask_pattern: u8) -> u32 {
    let type_info = (symbol_number << 2) | u32::from(mask_pattern);
    let code = (type_info << 10) | calculate_bch_code(type_info, TYPE_INFO_POLY);
    code ^ crate::format_info::FORMAT_INFO_MASK_MICRO
}

fn embed_position_detection_pattern(matrix: &mut BitMatrix, x_start: u32, y_start: u32) {
    // The 7x7 pattern: dark except for the ring at distance 2 from the centre.
    for y in 0..7i32 {
        for x in 0..7i32 {
            let dark = (x - 3).abs().max((y - 3).abs()) != 2;
            matrix.set(x_start + x as u32, y_start + y as u32, dark);
        }
    }
}

fn embed_alignment_pattern(matrix: &mut BitMatrix, x_start: u32, y_start: u32) {
    // The 5x5 pattern: dark except for the ring at distance 1 from the centre.
    for y in 0..5i32 {
        for x in 0..5i32 {
            let dark = (x - 2).abs().max((y - 2).abs()) != 1;
            matrix.set(x_start + x as u32, y_start + y as u32, dark);
        }
    }
}

fn embed_function_patterns(matrix: &mut BitMatrix, version: &Version) {
    let dimension = matrix.height();

    embed_position_detection_pattern(matrix, 0, 0);
    if !version.is_micro() {
        embed_position_detection_pattern(matrix, dimension - 7, 0);
        embed_position_detection_pattern(matrix, 0, dimension - 7);

        // Dark module above the bottom-left format area.
        matrix.set(8, dimension - 8, true);

        // Alignment patterns, skipping the three finder corners.
        let centers = version.alignment_pattern_centers();
        let max = centers.len();
        for (yi, &cy) in centers.iter().enumerate() {
            for (xi, &cx) in centers.iter().enumerate() {
                if (xi == 0 && (yi == 0 || yi == max - 1)) || (xi == max - 1 && yi == 0) {
                    continue;
                }
                embed_alignment_pattern(matrix, cx - 2, cy - 2);
            }
        }

        // Timing patterns; separators are already light.
        for i in 8..dimension - 8 {
            let dark = i % 2 == 0;
            matrix.set(i, 6, dark);
            matrix.set(6, i, dark);
        }
    }
    else {
        // Micro symbols run timing patterns along the top and left edges.
        for i in 8..dimension {
            let dark = i % 2 == 0;
            matrix.set(i, 0, dark);
            matrix.set(0, i, dark);
        }
    }
}

fn embed_type_info(matrix: &mut BitMatrix, type_info_bits: u32) {
    let dimension = matrix.height();
    for (i, &(x, y)) in TYPE_INFO_COORDINATES.iter().enumerate() {
        let bit = (type_info_bits >> i) & 1 != 0;

        // Type info bits at the top-left corner.
        matrix.set(x, y, bit);

        if i < 8 {
            // Second copy, top-right.
            matrix.set(dimension - 1 - i as u32, 8, bit);
        }
        else {
            // Second copy, bottom-left.
            matrix.set(8, dimension - 7 + (i as u32 - 8), bit);
        }
    }
}

fn embed_micro_type_info(matrix: &mut BitMatrix, type_info_bits: u32) {
    // Bit 14 sits at (1, 8), running right along the row then up the column to (8, 1).
    let mut i = 14i32;
    for x in 1..9 {
        matrix.set(x, 8, (type_info_bits >> i) & 1 != 0);
        i -= 1;
    }
    for y in (1..8).rev() {
        matrix.set(8, y, (type_info_bits >> i) & 1 != 0);
        i -= 1;
    }
}

fn embed_version_info(matrix: &mut BitMatrix, version: &Version) {
    if version.number() < 7 {
        return;
    }
    let dimension = matrix.height();
    let version_info_bits =
        (version.number() << 12) | calculate_bch_code(version.number(), VERSION_INFO_POLY);

    let mut bit_index = 0;
    for i in 0..6 {
        for j in 0..3 {
            let bit = (version_info_bits >> bit_index) & 1 != 0;
            bit_index += 1;
            // Bottom-left copy and its transpose at the top-right.
            matrix.set(i, dimension - 11 + j, bit);
            matrix.set(dimension - 11 + j, i, bit);
        }
    }
}

/// Writes the data bit stream into the unreserved modules in the canonical zig-zag order,
/// applying the data mask as each bit lands. Bits past the end of the stream pad with light
/// modules.
fn embed_data_bits(
    matrix: &mut BitMatrix,
    function_pattern: &BitMatrix,
    data_bits: &BitBuffer,
    mask_pattern: u8,
    is_micro: bool,
) -> Result<()> {
    let dimension = matrix.height() as i32;
    let mut bit_index = 0usize;
    let mut direction = -1i32;
    let mut x = dimension - 1;
    let mut y = dimension - 1;

    while x > 0 {
        // Skip the vertical timing pattern column.
        if !is_micro && x == 6 {
            x -= 1;
        }
        while y >= 0 && y < dimension {
            for xx in [x, x - 1] {
                let (ux, uy) = (xx as u32, y as u32);
                if function_pattern.get(ux, uy) {
                    continue;
                }
                let mut bit = if bit_index < data_bits.len() {
                    data_bits.bit(bit_index)
                }
                else {
                    false
                };
                bit_index += 1;
                if get_data_mask_bit(mask_pattern, ux, uy, is_micro) {
                    bit = !bit;
                }
                matrix.set(ux, uy, bit);
            }
            y += direction;
        }
        direction = -direction;
        y += direction;
        x -= 2;
    }

    if bit_index < data_bits.len() {
        return invalid_argument_error("data bits do not fit in the symbol");
    }
    Ok(())
}

/// Builds the complete module matrix for a full-size symbol.
pub fn build_matrix(
    data_bits: &BitBuffer,
    ec_level: ErrorCorrectionLevel,
    version: &Version,
    mask_pattern: u8,
) -> Result<BitMatrix> {
    let mut matrix = BitMatrix::square(version.dimension())?;
    let function_pattern = version.build_function_pattern();

    embed_function_patterns(&mut matrix, version);
    embed_type_info(&mut matrix, make_type_info_bits(ec_level, mask_pattern));
    embed_version_info(&mut matrix, version);
    embed_data_bits(&mut matrix, &function_pattern, data_bits, mask_pattern, false)?;
    Ok(matrix)
}

/// Builds the complete module matrix for a Micro QR symbol.
pub fn build_micro_matrix(
    data_bits: &BitBuffer,
    ec_level: ErrorCorrectionLevel,
    version: &Version,
    mask_pattern: u8,
) -> Result<BitMatrix> {
    let symbol_number = match ec_level.micro_bits(version.number()) {
        Some(bits) => bits,
        None => {
            return invalid_argument_error("error correction level not available for this version")
        }
    };
    let mut matrix = BitMatrix::square(version.dimension())?;
    let function_pattern = version.build_function_pattern();

    embed_function_patterns(&mut matrix, version);
    embed_micro_type_info(&mut matrix, make_micro_type_info_bits(symbol_number, mask_pattern));
    embed_data_bits(&mut matrix, &function_pattern, data_bits, mask_pattern, true)?;
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_bch_code() {
        // The worked example from JIS X 0510: version 7 yields 0xc94.
        assert_eq!(calculate_bch_code(7, VERSION_INFO_POLY), 0xc94);
        // Format info example: 00101 with the type info poly yields 0011011100.
        assert_eq!(calculate_bch_code(0x05, TYPE_INFO_POLY), 0b0011011100);
    }

    #[test]
    fn verify_type_info_bits_match_codebook() {
        // The computed BCH word, once masked, must reproduce the Annex C codebook used by the
        // decoder.
        assert_eq!(
            make_type_info_bits(ErrorCorrectionLevel::Medium, 5),
            FormatInformation::encode_qr(ErrorCorrectionLevel::Medium, 5)
        );
        assert_eq!(
            make_type_info_bits(ErrorCorrectionLevel::High, 7),
            FormatInformation::encode_qr(ErrorCorrectionLevel::High, 7)
        );
        assert_eq!(make_micro_type_info_bits(0, 0), FormatInformation::encode_micro(0, 0));
        assert_eq!(make_micro_type_info_bits(7, 3), FormatInformation::encode_micro(7, 3));
    }

    #[test]
    fn verify_data_region_capacity() {
        // Every non-function module must be written exactly once by the zig-zag walk.
        for &(number, is_micro) in &[(1u32, false), (7, false), (2, true)] {
            let version = Version::from_number(number, is_micro).unwrap();
            let function_pattern = version.build_function_pattern();
            let mut free = 0;
            for y in 0..function_pattern.height() {
                for x in 0..function_pattern.width() {
                    if !function_pattern.get(x, y) {
                        free += 1;
                    }
                }
            }
            let mut bits = BitBuffer::new();
            for i in 0..free {
                bits.append_bit(i % 2 == 0);
            }
            let matrix = if is_micro {
                build_micro_matrix(&bits, ErrorCorrectionLevel::Low, version, 0).unwrap()
            }
            else {
                build_matrix(&bits, ErrorCorrectionLevel::Low, version, 0).unwrap()
            };
            assert_eq!(matrix.height(), version.dimension());

            // One extra bit must overflow.
            bits.append_bit(true);
            let overflow = if is_micro {
                build_micro_matrix(&bits, ErrorCorrectionLevel::Low, version, 0)
            }
            else {
                build_matrix(&bits, ErrorCorrectionLevel::Low, version, 0)
            };
            assert!(overflow.is_err());
        }
    }
}
