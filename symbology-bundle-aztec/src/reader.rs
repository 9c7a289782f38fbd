// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use symbology_core::barcode::{BarcodeFormat, DecodeOptions, Reader, ReaderDescriptor};
use symbology_core::content::Content;
use symbology_core::ecc::{reed_solomon_decode, AZTEC_PARAM};
use symbology_core::errors::{format_error, Result};
use symbology_core::io::BitBuffer;
use symbology_core::matrix::BitMatrix;
use symbology_core::support_reader;

use crate::decoder;
use crate::encoder::{
    build_alignment_map, field_for_word_size, total_bits_in_layer, WORD_SIZE,
};

/// Aztec Code decoder for module-aligned symbol grids.
pub struct AztecReader {
    options: DecodeOptions,
}

struct Geometry {
    compact: bool,
    /// Layer count implied by the matrix dimension; 0 for a rune candidate.
    layers: usize,
}

/// True when every module at Chebyshev distance `radius` from the center has `dark` color.
fn ring_is(matrix: &BitMatrix, center: u32, radius: u32, dark: bool) -> bool {
    let (lo, hi) = (center - radius, center + radius);
    for i in lo..=hi {
        if matrix.get(i, lo) != dark
            || matrix.get(i, hi) != dark
            || matrix.get(lo, i) != dark
            || matrix.get(hi, i) != dark
        {
            return false;
        }
    }
    true
}

/// Works the symbol geometry out of the matrix dimension, using the bullseye rings to settle
/// the sizes where a compact and a full-size symbol coincide.
fn read_geometry(matrix: &BitMatrix) -> Result<Geometry> {
    if matrix.width() != matrix.height() || matrix.width() % 2 == 0 {
        return format_error("matrix dimension is not a valid symbol size");
    }
    let dimension = matrix.width() as usize;
    let center = matrix.width() / 2;

    let full_layers = (1..=32usize).find(|&layers| {
        let base = 14 + layers * 4;
        base + 1 + 2 * ((base / 2 - 1) / 15) == dimension
    });
    let compact_layers = if dimension >= 11 && (dimension - 11) % 4 == 0 && dimension <= 27 {
        Some((dimension - 11) / 4)
    }
    else {
        None
    };

    // A full-size bullseye is dark at radius 6 with a light ring at radius 5; a compact
    // symbol's mode message occupies radius 5.
    if let Some(layers) = full_layers {
        if ring_is(matrix, center, 6, true) && ring_is(matrix, center, 4, true) {
            return Ok(Geometry { compact: false, layers });
        }
    }
    if let Some(layers) = compact_layers {
        if ring_is(matrix, center, 4, true) && ring_is(matrix, center, 3, false) {
            return Ok(Geometry { compact: true, layers });
        }
    }
    format_error("bullseye does not match any symbol geometry")
}

/// Reads the mode message ring, mirroring the encoder's placement.
fn read_mode_message(matrix: &BitMatrix, compact: bool) -> BitBuffer {
    let center = matrix.width() / 2;
    let mut bits = vec![false; if compact { 28 } else { 40 }];
    if compact {
        for i in 0..7u32 {
            let offset = center - 3 + i;
            bits[i as usize] = matrix.get(offset, center - 5);
            bits[i as usize + 7] = matrix.get(center + 5, offset);
            bits[20 - i as usize] = matrix.get(offset, center + 5);
            bits[27 - i as usize] = matrix.get(center - 5, offset);
        }
    }
    else {
        for i in 0..10u32 {
            let offset = center - 5 + i + i / 5;
            bits[i as usize] = matrix.get(offset, center - 7);
            bits[i as usize + 10] = matrix.get(center + 7, offset);
            bits[29 - i as usize] = matrix.get(offset, center + 7);
            bits[39 - i as usize] = matrix.get(center - 7, offset);
        }
    }
    let mut buffer = BitBuffer::new();
    for bit in bits {
        buffer.append_bit(bit);
    }
    buffer
}

/// Error-corrects a mode message and returns its data bits.
fn correct_mode_message(bits: &BitBuffer, data_words: usize) -> Result<u32> {
    let total_words = bits.len() / 4;
    let mut words = Vec::with_capacity(total_words);
    let mut reader = bits.reader();
    for _ in 0..total_words {
        words.push(reader.read_bits(4)? as u16);
    }
    reed_solomon_decode(&AZTEC_PARAM, &mut words, total_words - data_words)?;
    let mut value = 0u32;
    for &word in &words[..data_words] {
        value = (value << 4) | u32::from(word);
    }
    Ok(value)
}

/// Walks the layered spiral in encode order, collecting the message bits.
fn extract_bits(matrix: &BitMatrix, compact: bool, layers: usize) -> BitBuffer {
    let base_matrix_size = (if compact { 11 } else { 14 }) + layers * 4;
    let (_, alignment_map) = build_alignment_map(base_matrix_size, compact);
    let total_bits = total_bits_in_layer(layers, compact);

    let mut bits = vec![false; total_bits];
    let mut row_offset = 0;
    for i in 0..layers {
        let row_size = (layers - i) * 4 + (if compact { 9 } else { 12 });
        for j in 0..row_size {
            let column_offset = j * 2;
            for k in 0..2 {
                bits[row_offset + column_offset + k] =
                    matrix.get(alignment_map[i * 2 + k], alignment_map[i * 2 + j]);
                bits[row_offset + row_size * 2 + column_offset + k] = matrix.get(
                    alignment_map[i * 2 + j],
                    alignment_map[base_matrix_size - 1 - i * 2 - k],
                );
                bits[row_offset + row_size * 4 + column_offset + k] = matrix.get(
                    alignment_map[base_matrix_size - 1 - i * 2 - k],
                    alignment_map[base_matrix_size - 1 - i * 2 - j],
                );
                bits[row_offset + row_size * 6 + column_offset + k] = matrix.get(
                    alignment_map[base_matrix_size - 1 - i * 2 - j],
                    alignment_map[i * 2 + k],
                );
            }
        }
        row_offset += row_size * 8;
    }

    let mut buffer = BitBuffer::new();
    for bit in bits {
        buffer.append_bit(bit);
    }
    buffer
}

impl AztecReader {
    fn decode_rune(&self, mode_message: &BitBuffer) -> Result<Content> {
        let mut bits = mode_message.clone();
        let mut xor = BitBuffer::new();
        xor.append_bits(0xaaaaaaa, 28);
        bits.xor_with(&xor)?;
        let word = correct_mode_message(&bits, 2)?;

        let mut content = Content::new();
        content.symbology = symbology_core::content::SymbologyIdentifier {
            code: 'z',
            modifier: '0',
            eci_modifier_offset: 3,
        };
        content.push_byte(word as u8);
        content.version_number = Some(0);
        Ok(content)
    }
}

impl Reader for AztecReader {
    fn try_new(_format: BarcodeFormat, options: &DecodeOptions) -> Result<AztecReader> {
        Ok(AztecReader { options: options.clone() })
    }

    fn supported_formats() -> &'static [ReaderDescriptor] {
        &[support_reader!(BarcodeFormat::Aztec, "aztec", "Aztec Code")]
    }

    fn decode(&self, matrix: &BitMatrix) -> Result<Content> {
        let geometry = read_geometry(matrix)?;
        let mode_message = read_mode_message(matrix, geometry.compact);

        if geometry.compact && geometry.layers == 0 {
            // An 11x11 compact symbol is a rune.
            return self.decode_rune(&mode_message);
        }

        let (layers, data_words) = if geometry.compact {
            let value = correct_mode_message(&mode_message, 2)?;
            ((value >> 6) as usize + 1, (value & 0x3f) as usize + 1)
        }
        else {
            let value = correct_mode_message(&mode_message, 4)?;
            ((value >> 11) as usize + 1, (value & 0x7ff) as usize + 1)
        };
        if layers != geometry.layers {
            return format_error("mode message contradicts the matrix dimension");
        }

        debug!(
            "aztec decode: {} layers ({}), {} data words",
            layers,
            if geometry.compact { "compact" } else { "full" },
            data_words
        );

        let message_bits = extract_bits(matrix, geometry.compact, layers);
        let word_size = WORD_SIZE[layers];
        let total_bits = message_bits.len();
        let total_words = total_bits / word_size;
        if data_words > total_words {
            return format_error("mode message data word count out of range");
        }

        // The layout front-pads with zeros to the word grid.
        let mut reader = message_bits.reader();
        let _ = reader.read_bits(total_bits % word_size)?;
        let mut words = Vec::with_capacity(total_words);
        for _ in 0..total_words {
            words.push(reader.read_bits(word_size)? as u16);
        }
        reed_solomon_decode(field_for_word_size(word_size), &mut words, total_words - data_words)?;

        let corrected = decoder::unstuff_bits(&words[..data_words], word_size)?;
        let mut content =
            decoder::decode_corrected_bits(&corrected, self.options.character_set)?;
        content.version_number = Some(layers as u32);
        content.ec_level = Some(format!(
            "{}%",
            (total_words - data_words) * 100 / total_words
        ));
        Ok(content)
    }
}
