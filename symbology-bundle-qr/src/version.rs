// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Version descriptors for QR Code (Model 2) and Micro QR Code.
//!
//! See ISO/IEC 18004:2006 6.5.1 Table 9 for the error-correction characteristics and Annex D
//! for the version information codewords.

use symbology_core::errors::{format_error, invalid_argument_error, Result};
use symbology_core::matrix::BitMatrix;

/// The four error correction levels of ISO/IEC 18004, ordered by recovery capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorCorrectionLevel {
    /// L: recovers up to 7% of codewords.
    Low,
    /// M: recovers up to 15% of codewords.
    Medium,
    /// Q: recovers up to 25% of codewords.
    Quality,
    /// H: recovers up to 30% of codewords.
    High,
}

impl ErrorCorrectionLevel {
    /// Decodes the two format-information bits of a full-size symbol.
    pub fn from_bits(bits: u32) -> ErrorCorrectionLevel {
        match bits & 0x03 {
            0 => ErrorCorrectionLevel::Medium,
            1 => ErrorCorrectionLevel::Low,
            2 => ErrorCorrectionLevel::High,
            _ => ErrorCorrectionLevel::Quality,
        }
    }

    /// The two bits carried in a full-size symbol's format information.
    pub fn bits(&self) -> u32 {
        match *self {
            ErrorCorrectionLevel::Low => 1,
            ErrorCorrectionLevel::Medium => 0,
            ErrorCorrectionLevel::Quality => 3,
            ErrorCorrectionLevel::High => 2,
        }
    }

    /// Decodes the three Micro QR symbol-number bits into (level, version number).
    pub fn from_micro_bits(bits: u32) -> (ErrorCorrectionLevel, u32) {
        const BITS_TO_VERSION: [u32; 8] = [1, 2, 2, 3, 3, 4, 4, 4];
        let level = match bits & 0x07 {
            0 | 1 | 3 | 5 => ErrorCorrectionLevel::Low,
            2 | 4 | 6 => ErrorCorrectionLevel::Medium,
            _ => ErrorCorrectionLevel::Quality,
        };
        (level, BITS_TO_VERSION[(bits & 0x07) as usize])
    }

    /// The Micro QR symbol number for (version, level), or `None` for an unsupported pairing.
    pub fn micro_bits(&self, version_number: u32) -> Option<u32> {
        use ErrorCorrectionLevel::*;
        let bits = match (version_number, *self) {
            (1, Low) => 0,
            (2, Low) => 1,
            (2, Medium) => 2,
            (3, Low) => 3,
            (3, Medium) => 4,
            (4, Low) => 5,
            (4, Medium) => 6,
            (4, Quality) => 7,
            _ => return None,
        };
        Some(bits)
    }

    pub fn name(&self) -> &'static str {
        match *self {
            ErrorCorrectionLevel::Low => "L",
            ErrorCorrectionLevel::Medium => "M",
            ErrorCorrectionLevel::Quality => "Q",
            ErrorCorrectionLevel::High => "H",
        }
    }
}

/// One run of identically sized error-correction blocks.
#[derive(Clone, Copy, Debug)]
pub struct EcBlock {
    pub count: u32,
    pub data_codewords: u32,
}

/// The error-correction block layout for one (version, level): up to two runs of blocks sharing
/// a common number of error-correction codewords per block.
#[derive(Clone, Copy, Debug)]
pub struct EcBlocks {
    pub codewords_per_block: u32,
    pub blocks: [EcBlock; 2],
}

impl EcBlocks {
    pub fn num_blocks(&self) -> u32 {
        self.blocks[0].count + self.blocks[1].count
    }

    /// Total error-correction codewords across all blocks.
    pub fn total_codewords(&self) -> u32 {
        self.codewords_per_block * self.num_blocks()
    }

    pub fn total_data_codewords(&self) -> u32 {
        self.blocks[0].count * self.blocks[0].data_codewords
            + self.blocks[1].count * self.blocks[1].data_codewords
    }

    /// The non-empty block runs.
    pub fn block_array(&self) -> impl Iterator<Item = EcBlock> + '_ {
        self.blocks.iter().copied().filter(|b| b.count > 0)
    }
}

const fn ecb(codewords_per_block: u32, c1: u32, d1: u32, c2: u32, d2: u32) -> EcBlocks {
    EcBlocks {
        codewords_per_block,
        blocks: [EcBlock { count: c1, data_codewords: d1 }, EcBlock { count: c2, data_codewords: d2 }],
    }
}

/// A version descriptor: module dimension, alignment pattern centers, and the per-level
/// error-correction block layouts.
#[derive(Debug)]
pub struct Version {
    number: u32,
    is_micro: bool,
    alignment_pattern_centers: &'static [u32],
    ec_blocks: &'static [EcBlocks],
}

/// Element i holds the raw 18-bit version information codeword for version i + 7.
/// See ISO/IEC 18004:2006 Annex D.
const VERSION_DECODE_INFO: [u32; 34] = [
    0x07c94, 0x085bc, 0x09a99, 0x0a4d3, 0x0bbf6,
    0x0c762, 0x0d847, 0x0e60d, 0x0f928, 0x10b78,
    0x1145d, 0x12a17, 0x13532, 0x149a6, 0x15683,
    0x168c9, 0x177ec, 0x18ec4, 0x191e1, 0x1afab,
    0x1b08e, 0x1cc1a, 0x1d33f, 0x1ed75, 0x1f250,
    0x209d5, 0x216f0, 0x228ba, 0x2379f, 0x24b0b,
    0x2542e, 0x26a64, 0x27541, 0x28c69,
];

macro_rules! version {
    ($n:expr, [$($c:expr),*], $l:expr, $m:expr, $q:expr, $h:expr) => {
        Version {
            number: $n,
            is_micro: false,
            alignment_pattern_centers: &[$($c),*],
            ec_blocks: &[$l, $m, $q, $h],
        }
    };
}

static VERSIONS: [Version; 40] = [
    version!(1, [], ecb(7, 1, 19, 0, 0), ecb(10, 1, 16, 0, 0), ecb(13, 1, 13, 0, 0), ecb(17, 1, 9, 0, 0)),
    version!(2, [6, 18], ecb(10, 1, 34, 0, 0), ecb(16, 1, 28, 0, 0), ecb(22, 1, 22, 0, 0), ecb(28, 1, 16, 0, 0)),
    version!(3, [6, 22], ecb(15, 1, 55, 0, 0), ecb(26, 1, 44, 0, 0), ecb(18, 2, 17, 0, 0), ecb(22, 2, 13, 0, 0)),
    version!(4, [6, 26], ecb(20, 1, 80, 0, 0), ecb(18, 2, 32, 0, 0), ecb(26, 2, 24, 0, 0), ecb(16, 4, 9, 0, 0)),
    version!(5, [6, 30], ecb(26, 1, 108, 0, 0), ecb(24, 2, 43, 0, 0), ecb(18, 2, 15, 2, 16), ecb(22, 2, 11, 2, 12)),
    version!(6, [6, 34], ecb(18, 2, 68, 0, 0), ecb(16, 4, 27, 0, 0), ecb(24, 4, 19, 0, 0), ecb(28, 4, 15, 0, 0)),
    version!(7, [6, 22, 38], ecb(20, 2, 78, 0, 0), ecb(18, 4, 31, 0, 0), ecb(18, 2, 14, 4, 15), ecb(26, 4, 13, 1, 14)),
    version!(8, [6, 24, 42], ecb(24, 2, 97, 0, 0), ecb(22, 2, 38, 2, 39), ecb(22, 4, 18, 2, 19), ecb(26, 4, 14, 2, 15)),
    version!(9, [6, 26, 46], ecb(30, 2, 116, 0, 0), ecb(22, 3, 36, 2, 37), ecb(20, 4, 16, 4, 17), ecb(24, 4, 12, 4, 13)),
    version!(10, [6, 28, 50], ecb(18, 2, 68, 2, 69), ecb(26, 4, 43, 1, 44), ecb(24, 6, 19, 2, 20), ecb(28, 6, 15, 2, 16)),
    version!(11, [6, 30, 54], ecb(20, 4, 81, 0, 0), ecb(30, 1, 50, 4, 51), ecb(28, 4, 22, 4, 23), ecb(24, 3, 12, 8, 13)),
    version!(12, [6, 32, 58], ecb(24, 2, 92, 2, 93), ecb(22, 6, 36, 2, 37), ecb(26, 4, 20, 6, 21), ecb(28, 7, 14, 4, 15)),
    version!(13, [6, 34, 62], ecb(26, 4, 107, 0, 0), ecb(22, 8, 37, 1, 38), ecb(24, 8, 20, 4, 21), ecb(22, 12, 11, 4, 12)),
    version!(14, [6, 26, 46, 66], ecb(30, 3, 115, 1, 116), ecb(24, 4, 40, 5, 41), ecb(20, 11, 16, 5, 17), ecb(24, 11, 12, 5, 13)),
    version!(15, [6, 26, 48, 70], ecb(22, 5, 87, 1, 88), ecb(24, 5, 41, 5, 42), ecb(30, 5, 24, 7, 25), ecb(24, 11, 12, 7, 13)),
    version!(16, [6, 26, 50, 74], ecb(24, 5, 98, 1, 99), ecb(28, 7, 45, 3, 46), ecb(24, 15, 19, 2, 20), ecb(30, 3, 15, 13, 16)),
    version!(17, [6, 30, 54, 78], ecb(28, 1, 107, 5, 108), ecb(28, 10, 46, 1, 47), ecb(28, 1, 22, 15, 23), ecb(28, 2, 14, 17, 15)),
    version!(18, [6, 30, 56, 82], ecb(30, 5, 120, 1, 121), ecb(26, 9, 43, 4, 44), ecb(28, 17, 22, 1, 23), ecb(28, 2, 14, 19, 15)),
    version!(19, [6, 30, 58, 86], ecb(28, 3, 113, 4, 114), ecb(26, 3, 44, 11, 45), ecb(26, 17, 21, 4, 22), ecb(26, 9, 13, 16, 14)),
    version!(20, [6, 34, 62, 90], ecb(28, 3, 107, 5, 108), ecb(26, 3, 41, 13, 42), ecb(30, 15, 24, 5, 25), ecb(28, 15, 15, 10, 16)),
    version!(21, [6, 28, 50, 72, 94], ecb(28, 4, 116, 4, 117), ecb(26, 17, 42, 0, 0), ecb(28, 17, 22, 6, 23), ecb(30, 19, 16, 6, 17)),
    version!(22, [6, 26, 50, 74, 98], ecb(28, 2, 111, 7, 112), ecb(28, 17, 46, 0, 0), ecb(30, 7, 24, 16, 25), ecb(24, 34, 13, 0, 0)),
    version!(23, [6, 30, 54, 78, 102], ecb(30, 4, 121, 5, 122), ecb(28, 4, 47, 14, 48), ecb(30, 11, 24, 14, 25), ecb(30, 16, 15, 14, 16)),
    version!(24, [6, 28, 54, 80, 106], ecb(30, 6, 117, 4, 118), ecb(28, 6, 45, 14, 46), ecb(30, 11, 24, 16, 25), ecb(30, 30, 16, 2, 17)),
    version!(25, [6, 32, 58, 84, 110], ecb(26, 8, 106, 4, 107), ecb(28, 8, 47, 13, 48), ecb(30, 7, 24, 22, 25), ecb(30, 22, 15, 13, 16)),
    version!(26, [6, 30, 58, 86, 114], ecb(28, 10, 114, 2, 115), ecb(28, 19, 46, 4, 47), ecb(28, 28, 22, 6, 23), ecb(30, 33, 16, 4, 17)),
    version!(27, [6, 34, 62, 90, 118], ecb(30, 8, 122, 4, 123), ecb(28, 22, 45, 3, 46), ecb(30, 8, 23, 26, 24), ecb(30, 12, 15, 28, 16)),
    version!(28, [6, 26, 50, 74, 98, 122], ecb(30, 3, 117, 10, 118), ecb(28, 3, 45, 23, 46), ecb(30, 4, 24, 31, 25), ecb(30, 11, 15, 31, 16)),
    version!(29, [6, 30, 54, 78, 102, 126], ecb(30, 7, 116, 7, 117), ecb(28, 21, 45, 7, 46), ecb(30, 1, 23, 37, 24), ecb(30, 19, 15, 26, 16)),
    version!(30, [6, 26, 52, 78, 104, 130], ecb(30, 5, 115, 10, 116), ecb(28, 19, 47, 10, 48), ecb(30, 15, 24, 25, 25), ecb(30, 23, 15, 25, 16)),
    version!(31, [6, 30, 56, 82, 108, 134], ecb(30, 13, 115, 3, 116), ecb(28, 2, 46, 29, 47), ecb(30, 42, 24, 1, 25), ecb(30, 23, 15, 28, 16)),
    version!(32, [6, 34, 60, 86, 112, 138], ecb(30, 17, 115, 0, 0), ecb(28, 10, 46, 23, 47), ecb(30, 10, 24, 35, 25), ecb(30, 19, 15, 35, 16)),
    version!(33, [6, 30, 58, 86, 114, 142], ecb(30, 17, 115, 1, 116), ecb(28, 14, 46, 21, 47), ecb(30, 29, 24, 19, 25), ecb(30, 11, 15, 46, 16)),
    version!(34, [6, 34, 62, 90, 118, 146], ecb(30, 13, 115, 6, 116), ecb(28, 14, 46, 23, 47), ecb(30, 44, 24, 7, 25), ecb(30, 59, 16, 1, 17)),
    version!(35, [6, 30, 54, 78, 102, 126, 150], ecb(30, 12, 121, 7, 122), ecb(28, 12, 47, 26, 48), ecb(30, 39, 24, 14, 25), ecb(30, 22, 15, 41, 16)),
    version!(36, [6, 24, 50, 76, 102, 128, 154], ecb(30, 6, 121, 14, 122), ecb(28, 6, 47, 34, 48), ecb(30, 46, 24, 10, 25), ecb(30, 2, 15, 64, 16)),
    version!(37, [6, 28, 54, 80, 106, 132, 158], ecb(30, 17, 122, 4, 123), ecb(28, 29, 46, 14, 47), ecb(30, 49, 24, 10, 25), ecb(30, 24, 15, 46, 16)),
    version!(38, [6, 32, 58, 84, 110, 136, 162], ecb(30, 4, 122, 18, 123), ecb(28, 13, 46, 32, 47), ecb(30, 48, 24, 14, 25), ecb(30, 42, 15, 32, 16)),
    version!(39, [6, 26, 54, 82, 110, 138, 166], ecb(30, 20, 117, 4, 118), ecb(28, 40, 47, 7, 48), ecb(30, 43, 24, 22, 25), ecb(30, 10, 15, 67, 16)),
    version!(40, [6, 30, 58, 86, 114, 142, 170], ecb(30, 19, 118, 6, 119), ecb(28, 18, 47, 31, 48), ecb(30, 34, 24, 34, 25), ecb(30, 20, 15, 61, 16)),
];

macro_rules! micro_version {
    ($n:expr, $($level:expr),+) => {
        Version {
            number: $n,
            is_micro: true,
            alignment_pattern_centers: &[],
            ec_blocks: &[$($level),+],
        }
    };
}

static MICRO_VERSIONS: [Version; 4] = [
    micro_version!(1, ecb(2, 1, 3, 0, 0)),
    micro_version!(2, ecb(5, 1, 5, 0, 0), ecb(6, 1, 4, 0, 0)),
    micro_version!(3, ecb(6, 1, 11, 0, 0), ecb(8, 1, 9, 0, 0)),
    micro_version!(4, ecb(8, 1, 16, 0, 0), ecb(10, 1, 14, 0, 0), ecb(14, 1, 10, 0, 0)),
];

impl Version {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn is_micro(&self) -> bool {
        self.is_micro
    }

    pub fn alignment_pattern_centers(&self) -> &'static [u32] {
        self.alignment_pattern_centers
    }

    pub fn dimension(&self) -> u32 {
        if self.is_micro {
            9 + 2 * self.number
        }
        else {
            17 + 4 * self.number
        }
    }

    pub fn total_codewords(&self) -> u32 {
        self.ec_blocks[0].total_data_codewords() + self.ec_blocks[0].total_codewords()
    }

    /// The block layout for an error correction level, if this version supports it.
    pub fn ec_blocks_for_level(&self, level: ErrorCorrectionLevel) -> Result<&EcBlocks> {
        match self.ec_blocks.get(level as usize) {
            Some(blocks) => Ok(blocks),
            None => invalid_argument_error("error correction level not available for this version"),
        }
    }

    pub fn from_number(number: u32, is_micro: bool) -> Result<&'static Version> {
        let table: &[Version] = if is_micro { &MICRO_VERSIONS } else { &VERSIONS };
        match table.get(number.wrapping_sub(1) as usize) {
            Some(version) => Ok(version),
            None => invalid_argument_error("version number out of range"),
        }
    }

    /// Deduces the version purely from the symbol dimension.
    pub fn from_dimension(dimension: u32) -> Result<&'static Version> {
        if dimension >= 11 && dimension <= 17 && dimension % 2 == 1 {
            Version::from_number((dimension - 9) / 2, true)
        }
        else if dimension >= 21 && dimension <= 177 && dimension % 4 == 1 {
            Version::from_number((dimension - 17) / 4, false)
        }
        else {
            format_error("matrix dimension is not a valid symbol size")
        }
    }

    /// Decodes an 18-bit version information codeword, tolerating up to 3 bit errors. Both
    /// read orientations of the codeword may be passed at once.
    pub fn decode_version_information(bits_a: u32, bits_b: u32) -> Result<&'static Version> {
        let mut best_difference = u32::MAX;
        let mut best_version = 0;
        for (i, &target) in VERSION_DECODE_INFO.iter().enumerate() {
            for bits in [bits_a, bits_b] {
                let difference = (bits ^ target).count_ones();
                if difference < best_difference {
                    best_version = i as u32 + 7;
                    best_difference = difference;
                }
            }
            if best_difference == 0 {
                break;
            }
        }
        // No two version info codewords differ in fewer than 8 bits.
        if best_difference <= 3 {
            return Version::from_number(best_version, false);
        }
        format_error("version information codeword is unrecoverable")
    }

    /// The mask of modules reserved for function patterns and format/version information.
    ///
    /// See ISO/IEC 18004:2006 Annex E.
    pub fn build_function_pattern(&self) -> BitMatrix {
        let dimension = self.dimension();
        let mut bits = BitMatrix::square(dimension).unwrap();

        // Top left finder pattern + separator + format
        bits.set_region(0, 0, 9, 9).unwrap();

        if !self.is_micro {
            // Top right and bottom left finder patterns + separators + format
            bits.set_region(dimension - 8, 0, 8, 9).unwrap();
            bits.set_region(0, dimension - 8, 9, 8).unwrap();

            // Alignment patterns
            let centers = self.alignment_pattern_centers;
            let max = centers.len();
            for (x, &cx) in centers.iter().enumerate() {
                for (y, &cy) in centers.iter().enumerate() {
                    // No alignment patterns near the three finder patterns.
                    if (x == 0 && (y == 0 || y == max - 1)) || (x == max - 1 && y == 0) {
                        continue;
                    }
                    bits.set_region(cy - 2, cx - 2, 5, 5).unwrap();
                }
            }

            // Vertical and horizontal timing patterns
            bits.set_region(6, 9, 1, dimension - 17).unwrap();
            bits.set_region(9, 6, dimension - 17, 1).unwrap();

            if self.number > 6 {
                // Version info, top right and bottom left
                bits.set_region(dimension - 11, 0, 3, 6).unwrap();
                bits.set_region(0, dimension - 11, 6, 3).unwrap();
            }
        }
        else {
            // Micro symbols carry timing patterns along the top and left edges only.
            bits.set_region(9, 0, dimension - 9, 1).unwrap();
            bits.set_region(0, 9, 1, dimension - 9).unwrap();
        }

        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_total_codewords() {
        // ISO/IEC 18004:2006 Table 1.
        let expect = [26u32, 44, 70, 100, 134, 172, 196, 242, 292, 346];
        for (i, &total) in expect.iter().enumerate() {
            let version = Version::from_number(i as u32 + 1, false).unwrap();
            assert_eq!(version.total_codewords(), total);
        }
        assert_eq!(Version::from_number(40, false).unwrap().total_codewords(), 3706);

        // Every level of every version must agree on the symbol's total codeword count.
        for number in 1..=40 {
            let version = Version::from_number(number, false).unwrap();
            for level in [
                ErrorCorrectionLevel::Low,
                ErrorCorrectionLevel::Medium,
                ErrorCorrectionLevel::Quality,
                ErrorCorrectionLevel::High,
            ] {
                let blocks = version.ec_blocks_for_level(level).unwrap();
                assert_eq!(
                    blocks.total_data_codewords() + blocks.total_codewords(),
                    version.total_codewords(),
                    "version {} level {:?}",
                    number,
                    level
                );
            }
        }
    }

    #[test]
    fn verify_dimension_mapping() {
        assert_eq!(Version::from_number(1, false).unwrap().dimension(), 21);
        assert_eq!(Version::from_number(40, false).unwrap().dimension(), 177);
        assert_eq!(Version::from_number(1, true).unwrap().dimension(), 11);
        assert_eq!(Version::from_number(4, true).unwrap().dimension(), 17);

        assert_eq!(Version::from_dimension(25).unwrap().number(), 2);
        assert_eq!(Version::from_dimension(15).unwrap().number(), 3);
        assert!(Version::from_dimension(15).unwrap().is_micro());
        assert!(Version::from_dimension(19).is_err());
        assert!(Version::from_dimension(24).is_err());
    }

    #[test]
    fn verify_version_information_decode() {
        assert_eq!(Version::decode_version_information(0x07c94, 0).unwrap().number(), 7);
        // Two bit errors are recovered.
        assert_eq!(Version::decode_version_information(0x07c94 ^ 0x41, 0).unwrap().number(), 7);
        // Four bit errors are not.
        assert!(Version::decode_version_information(0x07c94 ^ 0x40f, 0x3ffff).is_err());
        assert_eq!(Version::decode_version_information(0, 0x28c69).unwrap().number(), 40);
    }

    #[test]
    fn verify_function_pattern_counts() {
        // Version 1: 21x21 symbol with 208 function modules leaves 26 codewords of data.
        let version = Version::from_number(1, false).unwrap();
        let pattern = version.build_function_pattern();
        let mut data_modules = 0;
        for y in 0..pattern.height() {
            for x in 0..pattern.width() {
                if !pattern.get(x, y) {
                    data_modules += 1;
                }
            }
        }
        assert_eq!(data_modules, version.total_codewords() * 8);
    }

    #[test]
    fn verify_micro_levels() {
        let m1 = Version::from_number(1, true).unwrap();
        assert!(m1.ec_blocks_for_level(ErrorCorrectionLevel::Low).is_ok());
        assert!(m1.ec_blocks_for_level(ErrorCorrectionLevel::Medium).is_err());
        let m4 = Version::from_number(4, true).unwrap();
        assert!(m4.ec_blocks_for_level(ErrorCorrectionLevel::Quality).is_ok());
        assert!(m4.ec_blocks_for_level(ErrorCorrectionLevel::High).is_err());
    }
}
