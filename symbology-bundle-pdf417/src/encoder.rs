// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PDF417 symbol assembly: the symbol length descriptor, padding, error correction, macro
//! headers, and row/column dimensioning.

use log::debug;

use symbology_core::charset::CharacterSet;
use symbology_core::errors::{invalid_argument_error, Result};

use crate::big_integer;
use crate::ec;
use crate::high_level::{self, BEGIN_MACRO_BLOCK, MACRO_TERMINATOR, TEXT_COMPACTION_MODE_LATCH};

const MAX_CODEWORDS: usize = 928;
const MIN_ROWS: usize = 3;
const MAX_ROWS: usize = 90;
const MIN_COLUMNS: usize = 1;
const MAX_COLUMNS: usize = 30;

/// The preferred width-to-height ratio of the data region, counting a codeword as 17 modules
/// wide and a row as 4 modules tall.
const PREFERRED_RATIO: f32 = 3.0;

/// Options for PDF417 assembly. `ec_level` 0 through 8 selects 2^(level+1) error correction
/// codewords; `None` scales the level with the data size.
#[derive(Clone, Debug, Default)]
pub struct Pdf417Options {
    pub ec_level: Option<u8>,
    /// Force a data-region column count (codewords per row).
    pub columns: Option<usize>,
    /// Character set for byte compaction payloads; emitted as an in-stream ECI.
    pub charset: Option<CharacterSet>,
    /// Macro PDF417 segmentation: (segment index, total segment count, file id digits).
    pub macro_segment: Option<(u32, u32, String)>,
}

/// The codeword-level rendition of one symbol.
pub struct Pdf417Symbol {
    /// All codewords: length descriptor, data, padding, then error correction.
    pub codewords: Vec<u16>,
    pub rows: usize,
    pub columns: usize,
    pub ec_level: u8,
}

/// The recommended minimum error correction level for a data codeword count,
/// per ISO/IEC 15438 Annex E.
fn recommended_ec_level(data_codewords: usize) -> u8 {
    match data_codewords {
        0..=40 => 2,
        41..=160 => 3,
        161..=320 => 4,
        _ => 5,
    }
}

/// Picks the data-region dimensions closest to the preferred aspect ratio.
fn determine_dimensions(total_codewords: usize, forced_columns: Option<usize>) -> Result<(usize, usize)> {
    if let Some(columns) = forced_columns {
        if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&columns) {
            return invalid_argument_error("column count out of range");
        }
        let rows = (total_codewords + columns - 1) / columns;
        if rows > MAX_ROWS {
            return invalid_argument_error("data too large for the requested column count");
        }
        return Ok((rows.max(MIN_ROWS), columns));
    }

    let mut best: Option<(usize, usize, f32)> = None;
    for columns in MIN_COLUMNS..=MAX_COLUMNS {
        let rows = ((total_codewords + columns - 1) / columns).max(MIN_ROWS);
        if rows > MAX_ROWS {
            continue;
        }
        let ratio = (17 * columns + 69) as f32 / (rows * 4) as f32;
        let distance = (ratio - PREFERRED_RATIO).abs();
        if best.map_or(true, |(_, _, d)| distance < d) {
            best = Some((rows, columns, distance));
        }
    }
    match best {
        Some((rows, columns, _)) => Ok((rows, columns)),
        None => invalid_argument_error("data too large for a pdf417 symbol"),
    }
}

/// Encodes `contents` into the codeword stream of one symbol.
pub fn encode(contents: &str, options: &Pdf417Options) -> Result<Pdf417Symbol> {
    let (bytes, eci) = match options.charset {
        None => match CharacterSet::ISO8859_1.encode(contents) {
            Some(bytes) => (bytes, None),
            None => {
                return invalid_argument_error(
                    "content needs an explicit character set to be representable",
                )
            }
        },
        Some(cs) => {
            let bytes = match cs.encode(contents) {
                Some(bytes) => bytes,
                None => {
                    return invalid_argument_error(
                        "content is not representable in the requested character set",
                    )
                }
            };
            let eci = if cs == CharacterSet::ISO8859_1 { None } else { Some(cs.eci()) };
            (bytes, eci)
        }
    };

    let data = high_level::encode_high_level(&bytes, eci)?;

    // The Macro PDF417 control block trails the data, after any padding, so the decoder's
    // data walk stops at the 928 and the macro walk runs to the end of the data region.
    let mut macro_block = Vec::new();
    if let Some((index, count, ref file_id)) = options.macro_segment {
        if index >= count || count > 99_999 {
            return invalid_argument_error("macro segment index out of range");
        }
        macro_block.push(BEGIN_MACRO_BLOCK);
        // The segment index travels as a guarded 5-digit base-900 group.
        macro_block.extend(big_integer::to_base900(&format!("1{:05}", index))?);
        macro_block.extend(high_level::encode_text_codewords(file_id.as_bytes()));
        // Optional segment count field; numeric compaction follows the designator directly.
        macro_block.push(high_level::BEGIN_MACRO_OPTIONAL_FIELD);
        macro_block.push(1);
        macro_block.extend(big_integer::to_base900(&format!("1{:05}", count))?);
        if index + 1 == count {
            macro_block.push(MACRO_TERMINATOR);
        }
    }

    let ec_level = match options.ec_level {
        Some(level) if level <= 8 => level,
        Some(_) => return invalid_argument_error("error correction level out of range"),
        None => recommended_ec_level(data.len()),
    };
    let ec_count = 1usize << (ec_level + 1);

    // One slot for the length descriptor itself.
    let data_region_min = 1 + data.len() + macro_block.len();
    if data_region_min + ec_count > MAX_CODEWORDS {
        return invalid_argument_error("data too large for a pdf417 symbol");
    }

    let (rows, columns) = determine_dimensions(data_region_min + ec_count, options.columns)?;
    let total = rows * columns;
    if total > MAX_CODEWORDS + 1 {
        return invalid_argument_error("data too large for a pdf417 symbol");
    }
    let data_region = total - ec_count;

    // Length descriptor, data, padding with text latches, then the macro control block.
    let mut codewords = Vec::with_capacity(total);
    codewords.push(data_region as u16);
    codewords.extend_from_slice(&data);
    codewords.resize(data_region - macro_block.len(), TEXT_COMPACTION_MODE_LATCH);
    codewords.extend_from_slice(&macro_block);

    debug!(
        "pdf417 encode: {} data codewords, level {} ({} ec), {} rows x {} columns",
        data.len(),
        ec_level,
        ec_count,
        rows,
        columns
    );

    codewords.extend(ec::generate_ec_codewords(&codewords, ec_count)?);
    debug_assert_eq!(codewords.len(), total);

    Ok(Pdf417Symbol { codewords, rows, columns, ec_level })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_length_descriptor_and_padding() {
        let symbol = encode("PDF417", &Pdf417Options::default()).unwrap();
        let data_region = symbol.codewords[0] as usize;
        let ec_count = 1usize << (symbol.ec_level + 1);
        assert_eq!(symbol.codewords.len(), data_region + ec_count);
        assert_eq!(symbol.rows * symbol.columns, symbol.codewords.len());
        // Padding, if any, is the text compaction latch.
        for &cw in &symbol.codewords[3..data_region] {
            assert!(cw <= 928);
        }
    }

    #[test]
    fn verify_ec_level_scaling() {
        let small = encode("HI", &Pdf417Options::default()).unwrap();
        assert_eq!(small.ec_level, 2);
        let large = encode(&"A".repeat(500), &Pdf417Options::default()).unwrap();
        assert!(large.ec_level >= 3);
    }

    #[test]
    fn verify_forced_columns() {
        let options = Pdf417Options { columns: Some(4), ..Default::default() };
        let symbol = encode("FORCED COLUMNS", &options).unwrap();
        assert_eq!(symbol.columns, 4);
        assert!(symbol.rows >= MIN_ROWS);

        let options = Pdf417Options { columns: Some(31), ..Default::default() };
        assert!(encode("X", &options).is_err());
    }

    #[test]
    fn verify_dimension_limits() {
        // 929 codewords cannot fit.
        let options = Pdf417Options { ec_level: Some(8), ..Default::default() };
        assert!(encode(&"8".repeat(2000), &options).is_err());
    }
}
