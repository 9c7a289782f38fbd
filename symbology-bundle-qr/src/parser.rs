// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading format information, version information, and raw codewords out of a sampled module
//! matrix.

use symbology_core::errors::{format_error, Result};
use symbology_core::matrix::BitMatrix;

use crate::format_info::FormatInformation;
use crate::mask::get_data_mask_bit;
use crate::version::{ErrorCorrectionLevel, Version};

fn get_bit(matrix: &BitMatrix, x: u32, y: u32, mirrored: bool) -> bool {
    if mirrored {
        matrix.get(y, x)
    }
    else {
        matrix.get(x, y)
    }
}

fn append_bit(bits: &mut u32, bit: bool) {
    *bits = (*bits << 1) | u32::from(bit);
}

pub fn has_valid_dimension(matrix: &BitMatrix, is_micro: bool) -> bool {
    if matrix.width() != matrix.height() {
        return false;
    }
    let dimension = matrix.height();
    if is_micro {
        dimension >= 11 && dimension <= 17 && dimension % 2 == 1
    }
    else {
        dimension >= 21 && dimension <= 177 && dimension % 4 == 1
    }
}

/// Determines the version from the dimension, corroborated for versions 7 and up by the 18-bit
/// version information field read in both orientations.
pub fn read_version(matrix: &BitMatrix) -> Result<&'static Version> {
    let dimension = matrix.height();
    let version = Version::from_dimension(dimension)?;

    if version.is_micro() || version.number() < 7 {
        return Ok(version);
    }

    for mirror in [false, true] {
        // Read the top-right version info: 3 wide by 6 tall.
        let mut version_bits = 0;
        for y in (0..6).rev() {
            for x in ((dimension - 11)..(dimension - 8)).rev() {
                append_bit(&mut version_bits, get_bit(matrix, x, y, mirror));
            }
        }

        if let Ok(version) = Version::decode_version_information(version_bits, 0) {
            if version.dimension() == dimension {
                return Ok(version);
            }
        }
    }

    format_error("version information does not match the matrix dimension")
}

/// Reads the format information of a full-size or micro symbol, trying the mirrored
/// interpretation as well.
pub fn read_format_information(matrix: &BitMatrix, is_micro: bool) -> Result<FormatInformation> {
    if !has_valid_dimension(matrix, is_micro) {
        return format_error("matrix dimension is not a valid symbol size");
    }

    if is_micro {
        let mut format_info_bits = 0;
        for x in 1..9 {
            append_bit(&mut format_info_bits, get_bit(matrix, x, 8, false));
        }
        for y in (1..8).rev() {
            append_bit(&mut format_info_bits, get_bit(matrix, 8, y, false));
        }
        let fi = FormatInformation::decode_micro(format_info_bits);
        return if fi.is_valid() { Ok(fi) } else { format_error("format information is unrecoverable") };
    }

    // Top-left copy, skipping the two timing-pattern modules.
    let mut format_info_bits1 = 0;
    for x in 0..6 {
        append_bit(&mut format_info_bits1, get_bit(matrix, x, 8, false));
    }
    append_bit(&mut format_info_bits1, get_bit(matrix, 7, 8, false));
    append_bit(&mut format_info_bits1, get_bit(matrix, 8, 8, false));
    append_bit(&mut format_info_bits1, get_bit(matrix, 8, 7, false));
    for y in (0..6).rev() {
        append_bit(&mut format_info_bits1, get_bit(matrix, 8, y, false));
    }

    // Top-right/bottom-left copy, including the dark module, which the decode step strips for
    // the normal and mirrored interpretations separately.
    let dimension = matrix.height();
    let mut format_info_bits2 = 0;
    for y in ((dimension - 8)..dimension).rev() {
        append_bit(&mut format_info_bits2, get_bit(matrix, 8, y, false));
    }
    for x in (dimension - 8)..dimension {
        append_bit(&mut format_info_bits2, get_bit(matrix, x, 8, false));
    }

    let fi = FormatInformation::decode_qr(format_info_bits1, format_info_bits2);
    if fi.is_valid() {
        Ok(fi)
    }
    else {
        format_error("format information is unrecoverable")
    }
}

/// Walks the data modules in the canonical zig-zag, unmasking each bit, and regroups them into
/// codewords.
///
/// For Micro QR, the final data codeword of versions M1 and M3 is only four bits wide and is
/// returned as a 4-bit value.
pub fn read_codewords(
    matrix: &BitMatrix,
    version: &Version,
    format_info: &FormatInformation,
) -> Result<Vec<u8>> {
    if !has_valid_dimension(matrix, version.is_micro()) {
        return format_error("matrix dimension is not a valid symbol size");
    }
    let function_pattern = version.build_function_pattern();
    let is_micro = version.is_micro();
    let mirrored = format_info.is_mirrored;

    // M1 and M3 symbols have a short 4-bit data codeword directly before the error correction
    // codewords (ISO/IEC 18004:2006 6.7.3).
    let has_short_codeword = is_micro && version.number() % 2 == 1;
    let short_codeword_index = if version.number() == 1 {
        3
    }
    else if format_info.ec_level == ErrorCorrectionLevel::Low {
        11
    }
    else {
        9
    };

    let dimension = matrix.height() as i32;
    let mut result: Vec<u8> = Vec::with_capacity(version.total_codewords() as usize);
    let mut current_byte = 0u32;
    let mut bits_read = 0;
    let mut reading_up = true;

    let mut x = dimension - 1;
    while x > 0 {
        if !is_micro && x == 6 {
            x -= 1;
        }
        for row in 0..dimension {
            let y = if reading_up { dimension - 1 - row } else { row };
            for xx in [x, x - 1] {
                let (ux, uy) = (xx as u32, y as u32);
                if function_pattern.get(ux, uy) {
                    continue;
                }
                let bit = get_data_mask_bit(format_info.data_mask, ux, uy, is_micro)
                    != get_bit(matrix, ux, uy, mirrored);
                current_byte = (current_byte << 1) | u32::from(bit);
                bits_read += 1;
                if bits_read == 8
                    || (bits_read == 4
                        && has_short_codeword
                        && result.len() == short_codeword_index - 1)
                {
                    result.push(current_byte as u8);
                    current_byte = 0;
                    bits_read = 0;
                }
            }
        }
        reading_up = !reading_up;
        x -= 2;
    }

    if result.len() != version.total_codewords() as usize {
        return format_error("codeword count does not match the version descriptor");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use symbology_core::io::BitBuffer;

    use super::*;
    use crate::matrix_util;

    #[test]
    fn verify_codeword_round_trip() {
        // Write a known bit stream through the layout engine and read it back through the
        // parser, for a full-size and a micro symbol.
        for &(number, is_micro, level) in &[
            (1u32, false, ErrorCorrectionLevel::Medium),
            (7, false, ErrorCorrectionLevel::Quality),
            (2, true, ErrorCorrectionLevel::Low),
            (3, true, ErrorCorrectionLevel::Medium),
        ] {
            let version = Version::from_number(number, is_micro).unwrap();
            let total = version.total_codewords() as usize;
            // M1 and M3 carry a 4-bit codeword directly before the error correction codewords.
            let short_index = match (is_micro, number, level) {
                (true, 1, _) => Some(2),
                (true, 3, ErrorCorrectionLevel::Low) => Some(10),
                (true, 3, _) => Some(8),
                _ => None,
            };
            let codewords: Vec<u8> = (0..total)
                .map(|i| {
                    let value = (i * 37 + 11) as u8;
                    if short_index == Some(i) { value & 0x0f } else { value }
                })
                .collect();

            let mut bits = BitBuffer::new();
            for (i, &cw) in codewords.iter().enumerate() {
                let width = if short_index == Some(i) { 4 } else { 8 };
                bits.append_bits(u32::from(cw), width);
            }

            for mask in 0..if is_micro { 4u8 } else { 8u8 } {
                let matrix = if is_micro {
                    matrix_util::build_micro_matrix(&bits, level, version, mask).unwrap()
                }
                else {
                    matrix_util::build_matrix(&bits, level, version, mask).unwrap()
                };

                let fi = read_format_information(&matrix, is_micro).unwrap();
                assert_eq!(fi.data_mask, mask);
                assert_eq!(fi.ec_level, level);
                assert!(!fi.is_mirrored);
                if is_micro {
                    assert_eq!(fi.micro_version, number);
                }

                let version_read = if is_micro {
                    Version::from_dimension(matrix.height()).unwrap()
                }
                else {
                    read_version(&matrix).unwrap()
                };
                assert_eq!(version_read.number(), number);

                let read = read_codewords(&matrix, version_read, &fi).unwrap();
                assert_eq!(read, codewords);
            }
        }
    }

    #[test]
    fn verify_mirrored_format_detected() {
        let version = Version::from_number(1, false).unwrap();
        let total = version.total_codewords() as usize;
        let mut bits = BitBuffer::new();
        for i in 0..total {
            bits.append_bits((i * 7) as u32 & 0xff, 8);
        }
        let mut matrix =
            matrix_util::build_matrix(&bits, ErrorCorrectionLevel::Low, version, 3).unwrap();
        matrix.mirror();

        let fi = read_format_information(&matrix, false).unwrap();
        assert!(fi.is_mirrored);
        assert_eq!(fi.data_mask, 3);
        assert_eq!(fi.ec_level, ErrorCorrectionLevel::Low);
    }

    #[test]
    fn verify_version_read() {
        let version = Version::from_number(7, false).unwrap();
        let mut bits = BitBuffer::new();
        for _ in 0..version.total_codewords() {
            bits.append_bits(0xa5, 8);
        }
        let matrix =
            matrix_util::build_matrix(&bits, ErrorCorrectionLevel::Low, version, 0).unwrap();
        assert_eq!(read_version(&matrix).unwrap().number(), 7);
    }
}
