// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! De-interleaving of the raw codeword stream into per-block (data + error correction)
//! sequences.

use symbology_core::errors::{format_error, Result};

use crate::version::{ErrorCorrectionLevel, Version};

/// One error-correction block: its data codewords followed by its error-correction codewords.
pub struct DataBlock {
    num_data_codewords: usize,
    codewords: Vec<u8>,
}

impl DataBlock {
    pub fn num_data_codewords(&self) -> usize {
        self.num_data_codewords
    }

    pub fn codewords(&self) -> &[u8] {
        &self.codewords
    }

    pub fn codewords_mut(&mut self) -> &mut Vec<u8> {
        &mut self.codewords
    }

    /// Splits the interleaved codeword stream back into blocks.
    ///
    /// When a version mixes block sizes, every block holds the same codeword count except the
    /// last few, which hold one more data codeword; the interleave order places the i-th
    /// codeword of every block together. See ISO/IEC 18004:2006 6.6.
    pub fn get_data_blocks(
        raw_codewords: &[u8],
        version: &Version,
        ec_level: ErrorCorrectionLevel,
    ) -> Result<Vec<DataBlock>> {
        if raw_codewords.len() != version.total_codewords() as usize {
            return format_error("codeword count does not match the version descriptor");
        }

        let ec_blocks = version.ec_blocks_for_level(ec_level)?;
        let codewords_per_block = ec_blocks.codewords_per_block as usize;

        let mut result: Vec<DataBlock> = Vec::with_capacity(ec_blocks.num_blocks() as usize);
        for ec_block in ec_blocks.block_array() {
            for _ in 0..ec_block.count {
                let num_data = ec_block.data_codewords as usize;
                result.push(DataBlock {
                    num_data_codewords: num_data,
                    codewords: vec![0; codewords_per_block + num_data],
                });
            }
        }
        if result.is_empty() {
            return format_error("version descriptor has no blocks at this level");
        }

        // The blocks with one extra data codeword sit at the end.
        let shorter_total = result[0].codewords.len();
        let longer_start = result.iter().position(|b| b.codewords.len() != shorter_total).unwrap_or(result.len());
        let shorter_data = shorter_total - codewords_per_block;

        let mut offset = 0;
        // Data codewords every block has...
        for i in 0..shorter_data {
            for block in result.iter_mut() {
                block.codewords[i] = raw_codewords[offset];
                offset += 1;
            }
        }
        // ...then the extra data codeword of the longer blocks...
        for block in result.iter_mut().skip(longer_start) {
            block.codewords[shorter_data] = raw_codewords[offset];
            offset += 1;
        }
        // ...then the error correction codewords.
        for i in shorter_data..shorter_total {
            for (j, block) in result.iter_mut().enumerate() {
                let slot = if j < longer_start { i } else { i + 1 };
                block.codewords[slot] = raw_codewords[offset];
                offset += 1;
            }
        }
        debug_assert_eq!(offset, raw_codewords.len());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_single_block() {
        let version = Version::from_number(1, false).unwrap();
        let raw: Vec<u8> = (0..26).collect();
        let blocks =
            DataBlock::get_data_blocks(&raw, version, ErrorCorrectionLevel::Medium).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].num_data_codewords(), 16);
        assert_eq!(blocks[0].codewords(), raw.as_slice());
    }

    #[test]
    fn verify_uneven_blocks() {
        // Version 5-Q: 2 blocks of 15 data + 2 blocks of 16 data, 18 EC each.
        let version = Version::from_number(5, false).unwrap();
        let total = version.total_codewords() as usize;
        assert_eq!(total, 134);

        // Lay out four known blocks, interleave them by hand, and check recovery.
        let blocks_ref: Vec<Vec<u8>> = (0..4)
            .map(|b| {
                let data_len = if b < 2 { 15 } else { 16 };
                (0..data_len + 18).map(|i| (b * 50 + i) as u8).collect()
            })
            .collect();

        let mut interleaved = Vec::with_capacity(total);
        for i in 0..16 {
            for (b, block) in blocks_ref.iter().enumerate() {
                let data_len = if b < 2 { 15 } else { 16 };
                if i < data_len {
                    interleaved.push(block[i]);
                }
            }
        }
        for i in 0..18 {
            for (b, block) in blocks_ref.iter().enumerate() {
                let data_len = if b < 2 { 15 } else { 16 };
                interleaved.push(block[data_len + i]);
            }
        }
        assert_eq!(interleaved.len(), total);

        let blocks =
            DataBlock::get_data_blocks(&interleaved, version, ErrorCorrectionLevel::Quality)
                .unwrap();
        assert_eq!(blocks.len(), 4);
        for (block, reference) in blocks.iter().zip(&blocks_ref) {
            assert_eq!(block.codewords(), reference.as_slice());
        }
    }

    #[test]
    fn verify_wrong_length_rejected() {
        let version = Version::from_number(1, false).unwrap();
        let raw = vec![0u8; 25];
        assert!(DataBlock::get_data_blocks(&raw, version, ErrorCorrectionLevel::Low).is_err());
    }
}
