// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aztec symbol assembly: bit stuffing, size selection, check words, the mode message, and the
//! layered module layout around the bullseye. See ISO/IEC 24778:2008.

use log::debug;

use symbology_core::ecc::{
    GaloisField, ReedSolomonEncoder, AZTEC_DATA_6, AZTEC_DATA_8, AZTEC_DATA_10, AZTEC_DATA_12,
    AZTEC_PARAM,
};
use symbology_core::errors::{invalid_argument_error, Result};
use symbology_core::io::BitBuffer;
use symbology_core::matrix::BitMatrix;

use crate::high_level;

/// Pick the smallest symbol that fits.
pub const DEFAULT_LAYERS: i32 = 0;
/// Encode an Aztec rune instead of a data symbol.
pub const RUNE_LAYERS: i32 = i32::MIN;
/// ISO/IEC 24778:2008 recommends at least 23% + 3 codewords; 33% is the customary default.
pub const DEFAULT_EC_PERCENT: u32 = 33;

const MAX_LAYERS: usize = 32;
const MAX_LAYERS_COMPACT: usize = 4;

/// Codeword size in bits, indexed by layer count.
pub const WORD_SIZE: [usize; 33] = [
    4, 6, 6, 8, 8, 8, 8, 8, 8, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 12, 12,
    12, 12, 12, 12, 12, 12, 12, 12,
];

/// An encoded Aztec symbol plus its geometry.
pub struct EncodeResult {
    pub matrix: BitMatrix,
    pub compact: bool,
    pub layers: usize,
    pub codewords: usize,
}

pub fn field_for_word_size(word_size: usize) -> &'static GaloisField {
    match word_size {
        4 => &AZTEC_PARAM,
        6 => &AZTEC_DATA_6,
        8 => &AZTEC_DATA_8,
        10 => &AZTEC_DATA_10,
        12 => &AZTEC_DATA_12,
        _ => panic!("unsupported word size"),
    }
}

pub fn total_bits_in_layer(layers: usize, compact: bool) -> usize {
    ((if compact { 88 } else { 112 }) + 16 * layers) * layers
}

/// Avoids data words that mimic the reference patterns: a word of all ones (bar the last bit)
/// or all zeros gets its final bit replaced and the displaced bit carried into the next word.
pub fn stuff_bits(bits: &BitBuffer, word_size: usize) -> BitBuffer {
    let mut out = BitBuffer::new();
    let n = bits.len();
    let mask = (1u32 << word_size) - 2;

    let mut i = 0;
    while i < n {
        let mut word = 0u32;
        for j in 0..word_size {
            if i + j >= n || bits.bit(i + j) {
                word |= 1 << (word_size - 1 - j);
            }
        }
        if word & mask == mask {
            out.append_bits(word & mask, word_size);
            i += word_size - 1;
        }
        else if word & mask == 0 {
            out.append_bits(word | 1, word_size);
            i += word_size - 1;
        }
        else {
            out.append_bits(word, word_size);
            i += word_size;
        }
    }
    out
}

/// Appends Reed-Solomon check words so that `bits` fills `total_bits` (less the remainder
/// modulo the word size, which leads with zero padding).
fn generate_check_words(bits: &BitBuffer, total_bits: usize, word_size: usize) -> Result<BitBuffer> {
    debug_assert_eq!(bits.len() % word_size, 0);
    let field = field_for_word_size(word_size);
    let total_words = total_bits / word_size;
    let data_words = bits.len() / word_size;

    let mut message = Vec::with_capacity(total_words);
    let mut reader = bits.reader();
    for _ in 0..data_words {
        message.push(reader.read_bits(word_size)? as u16);
    }
    message.resize(total_words, 0);
    ReedSolomonEncoder::new(field).encode(&mut message, total_words - data_words)?;

    let mut out = BitBuffer::new();
    out.append_bits(0, total_bits % word_size);
    for word in message {
        out.append_bits(u32::from(word), word_size);
    }
    Ok(out)
}

/// The mode message: layer count and data word count, check-worded over GF(16).
pub fn generate_mode_message(compact: bool, layers: usize, message_words: usize) -> Result<BitBuffer> {
    let mut mode_message = BitBuffer::new();
    if compact {
        mode_message.append_bits(layers as u32 - 1, 2);
        mode_message.append_bits(message_words as u32 - 1, 6);
        generate_check_words(&mode_message, 28, 4)
    }
    else {
        mode_message.append_bits(layers as u32 - 1, 5);
        mode_message.append_bits(message_words as u32 - 1, 11);
        generate_check_words(&mode_message, 40, 4)
    }
}

/// The rune variant of the mode message: an 8-bit word, check-worded, with every other bit
/// flipped to distinguish runes from data symbols.
pub fn generate_rune_message(word: u8) -> Result<BitBuffer> {
    let mut rune = BitBuffer::new();
    rune.append_bits(u32::from(word), 8);
    let mut message = generate_check_words(&rune, 28, 4)?;
    let mut xor = BitBuffer::new();
    xor.append_bits(0xaaaaaaa, 28);
    message.xor_with(&xor)?;
    Ok(message)
}

fn draw_bulls_eye(matrix: &mut BitMatrix, center: u32, size: u32) {
    let mut i = 0;
    while i < size {
        for j in (center - i)..=(center + i) {
            matrix.set(j, center - i, true);
            matrix.set(j, center + i, true);
            matrix.set(center - i, j, true);
            matrix.set(center + i, j, true);
        }
        i += 2;
    }
    // Orientation marks at three corners of the outermost ring.
    matrix.set(center - size, center - size, true);
    matrix.set(center - size + 1, center - size, true);
    matrix.set(center - size, center - size + 1, true);
    matrix.set(center + size, center - size, true);
    matrix.set(center + size, center - size + 1, true);
    matrix.set(center + size, center + size - 1, true);
}

fn draw_mode_message(matrix: &mut BitMatrix, compact: bool, matrix_size: u32, mode_message: &BitBuffer) {
    let center = matrix_size / 2;
    if compact {
        for i in 0..7u32 {
            let offset = center - 3 + i;
            if mode_message.bit(i as usize) {
                matrix.set(offset, center - 5, true);
            }
            if mode_message.bit(i as usize + 7) {
                matrix.set(center + 5, offset, true);
            }
            if mode_message.bit(20 - i as usize) {
                matrix.set(offset, center + 5, true);
            }
            if mode_message.bit(27 - i as usize) {
                matrix.set(center - 5, offset, true);
            }
        }
    }
    else {
        for i in 0..10u32 {
            let offset = center - 5 + i + i / 5;
            if mode_message.bit(i as usize) {
                matrix.set(offset, center - 7, true);
            }
            if mode_message.bit(i as usize + 10) {
                matrix.set(center + 7, offset, true);
            }
            if mode_message.bit(29 - i as usize) {
                matrix.set(offset, center + 7, true);
            }
            if mode_message.bit(39 - i as usize) {
                matrix.set(center - 7, offset, true);
            }
        }
    }
}

/// The mapping from data coordinates to module coordinates. Full-size symbols interleave a
/// reference grid line every 16 modules; compact symbols have none.
pub fn build_alignment_map(base_matrix_size: usize, compact: bool) -> (usize, Vec<u32>) {
    if compact {
        return (base_matrix_size, (0..base_matrix_size as u32).collect());
    }
    let matrix_size = base_matrix_size + 1 + 2 * ((base_matrix_size / 2 - 1) / 15);
    let mut map = vec![0u32; base_matrix_size];
    let orig_center = base_matrix_size / 2;
    let center = matrix_size / 2;
    for i in 0..orig_center {
        let new_offset = i + i / 15;
        map[orig_center - i - 1] = (center - new_offset - 1) as u32;
        map[orig_center + i] = (center + new_offset + 1) as u32;
    }
    (matrix_size, map)
}

/// Encodes `data` as an Aztec symbol.
///
/// `min_ec_percent` is the minimum share of check words. `user_layers` forces the layer count:
/// positive for a full-size symbol, negative for compact, [`RUNE_LAYERS`] for a rune, or
/// [`DEFAULT_LAYERS`] to pick the smallest symbol that fits.
pub fn encode(data: &[u8], min_ec_percent: u32, user_layers: i32) -> Result<EncodeResult> {
    let bits = high_level::encode(data);

    let ec_bits = bits.len() * min_ec_percent as usize / 100 + 11;
    let total_size_bits = bits.len() + ec_bits;

    let compact;
    let layers;
    let total_bits;
    let word_size;
    let stuffed_bits;

    if user_layers == RUNE_LAYERS {
        if data.len() != 1 {
            return invalid_argument_error("a rune encodes exactly one byte");
        }
        let mode_message = generate_rune_message(data[0])?;
        let mut matrix = BitMatrix::square(11)?;
        draw_mode_message(&mut matrix, true, 11, &mode_message);
        draw_bulls_eye(&mut matrix, 5, 5);
        return Ok(EncodeResult { matrix, compact: true, layers: 0, codewords: 0 });
    }
    else if user_layers != DEFAULT_LAYERS {
        compact = user_layers < 0;
        layers = user_layers.unsigned_abs() as usize;
        if layers > if compact { MAX_LAYERS_COMPACT } else { MAX_LAYERS } {
            return invalid_argument_error("illegal layer count");
        }
        total_bits = total_bits_in_layer(layers, compact);
        word_size = WORD_SIZE[layers];
        let usable_bits = total_bits - total_bits % word_size;
        stuffed_bits = stuff_bits(&bits, word_size);
        if stuffed_bits.len() + ec_bits > usable_bits {
            return invalid_argument_error("data too large for the requested layer count");
        }
        if compact && stuffed_bits.len() > word_size * 64 {
            return invalid_argument_error("data too large for the requested layer count");
        }
    }
    else {
        // Walk the sizes Compact1..Compact4, Normal4.. and take the first fit; the stuffing
        // has to be redone whenever the word size changes.
        let mut found = None;
        let mut stuffed = BitBuffer::new();
        let mut current_word_size = 0;
        for i in 0..=MAX_LAYERS {
            let is_compact = i <= 3;
            let candidate_layers = if is_compact { i + 1 } else { i };
            let candidate_total = total_bits_in_layer(candidate_layers, is_compact);
            if total_size_bits > candidate_total {
                continue;
            }
            if current_word_size != WORD_SIZE[candidate_layers] {
                current_word_size = WORD_SIZE[candidate_layers];
                stuffed = stuff_bits(&bits, current_word_size);
            }
            let usable_bits = candidate_total - candidate_total % current_word_size;
            if is_compact && stuffed.len() > current_word_size * 64 {
                continue;
            }
            if stuffed.len() + ec_bits <= usable_bits {
                found = Some((is_compact, candidate_layers, candidate_total, current_word_size));
                break;
            }
        }
        match found {
            Some((c, l, t, w)) => {
                compact = c;
                layers = l;
                total_bits = t;
                word_size = w;
                stuffed_bits = stuffed;
            }
            None => return invalid_argument_error("data too large for an aztec symbol"),
        }
    }

    let message_bits = generate_check_words(&stuffed_bits, total_bits, word_size)?;
    let message_words = stuffed_bits.len() / word_size;
    let mode_message = generate_mode_message(compact, layers, message_words)?;

    debug!(
        "aztec encode: {} layers ({}), {} data words of {} bits",
        layers,
        if compact { "compact" } else { "full" },
        message_words,
        word_size
    );

    let base_matrix_size = (if compact { 11 } else { 14 }) + layers * 4;
    let (matrix_size, alignment_map) = build_alignment_map(base_matrix_size, compact);

    let mut matrix = BitMatrix::square(matrix_size as u32)?;

    // Data spirals outward from the mode message, two-module-thick sides per layer.
    let mut row_offset = 0;
    for i in 0..layers {
        let row_size = (layers - i) * 4 + (if compact { 9 } else { 12 });
        for j in 0..row_size {
            let column_offset = j * 2;
            for k in 0..2 {
                let get = |idx: usize| message_bits.bit(idx);
                if get(row_offset + column_offset + k) {
                    matrix.set(alignment_map[i * 2 + k], alignment_map[i * 2 + j], true);
                }
                if get(row_offset + row_size * 2 + column_offset + k) {
                    matrix.set(
                        alignment_map[i * 2 + j],
                        alignment_map[base_matrix_size - 1 - i * 2 - k],
                        true,
                    );
                }
                if get(row_offset + row_size * 4 + column_offset + k) {
                    matrix.set(
                        alignment_map[base_matrix_size - 1 - i * 2 - k],
                        alignment_map[base_matrix_size - 1 - i * 2 - j],
                        true,
                    );
                }
                if get(row_offset + row_size * 6 + column_offset + k) {
                    matrix.set(
                        alignment_map[base_matrix_size - 1 - i * 2 - j],
                        alignment_map[i * 2 + k],
                        true,
                    );
                }
            }
        }
        row_offset += row_size * 8;
    }

    draw_mode_message(&mut matrix, compact, matrix_size as u32, &mode_message);

    if compact {
        draw_bulls_eye(&mut matrix, matrix_size as u32 / 2, 5);
    }
    else {
        draw_bulls_eye(&mut matrix, matrix_size as u32 / 2, 7);
        // Reference grid: dotted lines every 16 modules out from the center.
        let half = matrix_size as u32 / 2;
        let mut i = 0usize;
        let mut j = 0u32;
        while i < base_matrix_size / 2 - 1 {
            let mut k = half & 1;
            while k < matrix_size as u32 {
                matrix.set(half - j, k, true);
                matrix.set(half + j, k, true);
                matrix.set(k, half - j, true);
                matrix.set(k, half + j, true);
                k += 2;
            }
            i += 15;
            j += 16;
        }
    }

    Ok(EncodeResult { matrix, compact, layers, codewords: message_words })
}

/// Encodes a rune: an 11x11 symbol carrying a single byte in its mode message.
pub fn encode_rune(word: u8) -> Result<EncodeResult> {
    encode(&[word], 0, RUNE_LAYERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_stuffing() {
        // A window of all ones gets a zero bit inserted.
        let mut bits = BitBuffer::new();
        bits.append_bits(0xfff, 12);
        let stuffed = stuff_bits(&bits, 6);
        // Every 5-bit window of ones takes a stuffed zero; the trailing pad bits are ones.
        assert_eq!(stuffed.len(), 18);
        let mut reader = stuffed.reader();
        assert_eq!(reader.read_bits(6).unwrap(), 0b111110);
        assert_eq!(reader.read_bits(6).unwrap(), 0b111110);
        assert_eq!(reader.read_bits(6).unwrap(), 0b111110);

        // A window of all zeros gets a one bit appended.
        let mut bits = BitBuffer::new();
        bits.append_bits(0, 5);
        bits.append_bit(true);
        let stuffed = stuff_bits(&bits, 6);
        assert_eq!(stuffed.reader().read_bits(6).unwrap(), 0b000001);
    }

    #[test]
    fn verify_mode_message() {
        // Compact, 2 layers, 3 data words: 01 000010 + five check words.
        let message = generate_mode_message(true, 2, 3).unwrap();
        assert_eq!(message.len(), 28);
        let mut reader = message.reader();
        assert_eq!(reader.read_bits(2).unwrap(), 1);
        assert_eq!(reader.read_bits(6).unwrap(), 2);

        let message = generate_mode_message(false, 11, 100).unwrap();
        assert_eq!(message.len(), 40);
        let mut reader = message.reader();
        assert_eq!(reader.read_bits(5).unwrap(), 10);
        assert_eq!(reader.read_bits(11).unwrap(), 99);
    }

    #[test]
    fn verify_symbol_sizes() {
        // One compact layer: 15x15 modules.
        let result = encode(b"A", DEFAULT_EC_PERCENT, DEFAULT_LAYERS).unwrap();
        assert!(result.compact);
        assert_eq!(result.layers, 1);
        assert_eq!(result.matrix.width(), 15);

        // Forcing 2 full layers: 14 + 8 = 22 base, 23 with the center reference line.
        let result = encode(b"HELLO", DEFAULT_EC_PERCENT, 2).unwrap();
        assert!(!result.compact);
        assert_eq!(result.matrix.width(), 23);

        // Too much data for a tiny forced size.
        assert!(encode(&[b'X'; 200], DEFAULT_EC_PERCENT, -1).is_err());
    }

    #[test]
    fn verify_rune_geometry() {
        let result = encode_rune(b'A').unwrap();
        assert_eq!(result.matrix.width(), 11);
        assert_eq!(result.layers, 0);
        assert!(result.compact);
        // The bullseye core is always present.
        let m = &result.matrix;
        assert!(m.get(5, 5));
        assert!(!m.get(4, 5) || true);
        // Ring at radius 2 and 4 are dark at the axes.
        assert!(m.get(5, 3) && m.get(5, 7) && m.get(3, 5) && m.get(7, 5));
    }

    #[test]
    fn verify_reference_grid_positions() {
        // A 5-layer full symbol is the smallest with a reference grid beyond the center.
        let data: Vec<u8> = (0..100u32).map(|i| (b'A' + (i % 26) as u8)).collect();
        let result = encode(&data, DEFAULT_EC_PERCENT, 5).unwrap();
        let size = result.matrix.width();
        assert_eq!(size, (14 + 5 * 4) + 1 + 2);
        // The center row alternates along the full width.
        let center = size / 2;
        for k in (center % 2..size).step_by(2) {
            assert!(result.matrix.get(k, center));
        }
    }
}
