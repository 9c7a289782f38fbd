// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use symbology_core::barcode::{BarcodeFormat, DecodeOptions, Reader, ReaderDescriptor};
use symbology_core::content::Content;
use symbology_core::ecc::{reed_solomon_decode, QR_CODE_FIELD_256};
use symbology_core::errors::{format_error, Result};
use symbology_core::matrix::BitMatrix;
use symbology_core::support_reader;

use crate::data_block::DataBlock;
use crate::decoder;
use crate::parser;
use crate::version::Version;

/// QR Code and Micro QR Code decoder.
pub struct QrReader {
    options: DecodeOptions,
}

impl Reader for QrReader {
    fn try_new(_format: BarcodeFormat, options: &DecodeOptions) -> Result<QrReader> {
        Ok(QrReader { options: options.clone() })
    }

    fn supported_formats() -> &'static [ReaderDescriptor] {
        &[
            support_reader!(BarcodeFormat::QrCode, "qr", "QR Code"),
            support_reader!(BarcodeFormat::MicroQrCode, "mqr", "Micro QR Code"),
        ]
    }

    fn decode(&self, matrix: &BitMatrix) -> Result<Content> {
        let is_micro = parser::has_valid_dimension(matrix, true);
        if !is_micro && !parser::has_valid_dimension(matrix, false) {
            return format_error("matrix dimension is not a valid symbol size");
        }

        // The format information is matched in normal and mirrored orientation at once; the
        // winning interpretation drives everything downstream.
        let format_info = parser::read_format_information(matrix, is_micro)?;
        if format_info.is_mirrored && !self.options.try_mirror {
            return format_error("symbol appears mirrored");
        }

        let version = if is_micro {
            let version = Version::from_dimension(matrix.height())?;
            if version.number() != format_info.micro_version {
                return format_error("format information contradicts the matrix dimension");
            }
            version
        }
        else {
            parser::read_version(matrix)?
        };

        if format_info.is_mirrored {
            debug!("qr decode: mirrored symbol, reading transposed");
        }

        let codewords = parser::read_codewords(matrix, version, &format_info)?;
        let blocks = DataBlock::get_data_blocks(&codewords, version, format_info.ec_level)?;

        // Error-correct each block independently and concatenate the data codewords.
        let mut data_codewords =
            Vec::with_capacity(blocks.iter().map(DataBlock::num_data_codewords).sum());
        for block in &blocks {
            let ec_count = block.codewords().len() - block.num_data_codewords();
            let mut message: Vec<u16> =
                block.codewords().iter().map(|&b| u16::from(b)).collect();
            reed_solomon_decode(&QR_CODE_FIELD_256, &mut message, ec_count)?;
            data_codewords
                .extend(message[..block.num_data_codewords()].iter().map(|&w| w as u8));
        }

        // Re-pack the codewords into the data bit stream; the final data codeword of an M1
        // or M3 symbol spans only four bits.
        let short_tail = version.is_micro() && version.number() % 2 == 1;
        let mut stream = symbology_core::io::BitBuffer::new();
        for (i, &codeword) in data_codewords.iter().enumerate() {
            let width = if short_tail && i == data_codewords.len() - 1 { 4 } else { 8 };
            stream.append_bits(u32::from(codeword), width);
        }

        let mut content =
            decoder::decode_bit_stream(stream.as_bytes(), version, self.options.character_set)?;
        content.ec_level = Some(format_info.ec_level.name().to_string());
        content.data_mask = Some(format_info.data_mask);
        content.is_mirrored = format_info.is_mirrored;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use symbology_core::barcode::{EncodeOptions, Writer};
    use symbology_core::charset::CharacterSet;

    use super::*;
    use crate::writer::QrWriter;

    fn decode(matrix: &BitMatrix) -> Result<Content> {
        let reader = QrReader::try_new(BarcodeFormat::QrCode, &DecodeOptions::default()).unwrap();
        reader.decode(matrix)
    }

    fn encode(contents: &str, options: &EncodeOptions, format: BarcodeFormat) -> BitMatrix {
        QrWriter::try_new(format, options).unwrap().encode(contents).unwrap()
    }

    #[test]
    fn verify_round_trip_alphanumeric() {
        let options = EncodeOptions { ec_level: Some(3), ..Default::default() };
        let matrix = encode("ABCDEF", &options, BarcodeFormat::QrCode);
        let content = decode(&matrix).unwrap();
        assert_eq!(content.text(), "ABCDEF");
        assert_eq!(content.ec_level.as_deref(), Some("H"));
        assert_eq!(content.version_number, Some(1));
        assert!(!content.is_mirrored);
    }

    #[test]
    fn verify_round_trip_modes_and_versions() {
        let cases: &[(&str, Option<u8>)] = &[
            ("012345678901234567890123456789", None),
            ("HELLO WORLD 123 :/", Some(1)),
            ("mixed Case bytes åäö", Some(2)),
            (&"long text ".repeat(40), Some(0)),
        ];
        for &(text, ec) in cases {
            let options = EncodeOptions { ec_level: ec, ..Default::default() };
            let matrix = encode(text, &options, BarcodeFormat::QrCode);
            let content = decode(&matrix).unwrap();
            assert_eq!(content.text(), text);
        }
    }

    #[test]
    fn verify_round_trip_kanji() {
        let options = EncodeOptions {
            ec_level: Some(1),
            charset: Some(CharacterSet::ShiftJIS),
            ..Default::default()
        };
        let matrix = encode("日本", &options, BarcodeFormat::QrCode);
        let content = decode(&matrix).unwrap();
        assert_eq!(content.text(), "日本");
    }

    #[test]
    fn verify_round_trip_eci_utf8() {
        let options = EncodeOptions {
            ec_level: Some(1),
            charset: Some(CharacterSet::UTF8),
            ..Default::default()
        };
        let matrix = encode("Φωτιά 🔥", &options, BarcodeFormat::QrCode);
        let content = decode(&matrix).unwrap();
        assert_eq!(content.text(), "Φωτιά 🔥");
        assert!(content.has_eci());
        assert_eq!(content.symbology_identifier(), "]Q2");
    }

    #[test]
    fn verify_round_trip_gs1() {
        let options = EncodeOptions { gs1: true, ..Default::default() };
        let matrix = encode("0104912345123459151725010810ABC123", &options, BarcodeFormat::QrCode);
        let content = decode(&matrix).unwrap();
        assert_eq!(content.text(), "0104912345123459151725010810ABC123");
        assert_eq!(content.symbology_identifier(), "]Q3");
    }

    #[test]
    fn verify_round_trip_micro() {
        let options = EncodeOptions::default();
        let matrix = encode("12345", &options, BarcodeFormat::MicroQrCode);
        let content = decode(&matrix).unwrap();
        assert_eq!(content.text(), "12345");
    }

    #[test]
    fn verify_mirrored_round_trip() {
        let options = EncodeOptions::default();
        let mut matrix = encode("MIRROR ME", &options, BarcodeFormat::QrCode);
        matrix.mirror();
        let content = decode(&matrix).unwrap();
        assert_eq!(content.text(), "MIRROR ME");
        assert!(content.is_mirrored);

        let no_mirror = DecodeOptions { try_mirror: false, ..Default::default() };
        let reader = QrReader::try_new(BarcodeFormat::QrCode, &no_mirror).unwrap();
        assert!(reader.decode(&matrix).is_err());
    }

    #[test]
    fn verify_flipped_modules_corrected() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let options = EncodeOptions { ec_level: Some(3), ..Default::default() };
        let mut matrix = encode("DAMAGE TEST", &options, BarcodeFormat::QrCode);

        // Version 1-H corrects up to 8 codeword errors; flip a handful of scattered data
        // modules, sparing the function patterns.
        let version = Version::from_number(1, false).unwrap();
        let function_pattern = version.build_function_pattern();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut flipped = 0;
        while flipped < 6 {
            let x = rng.gen_range(0..21);
            let y = rng.gen_range(0..21);
            if !function_pattern.get(x, y) {
                matrix.flip(x, y);
                flipped += 1;
            }
        }
        let content = decode(&matrix).unwrap();
        assert_eq!(content.text(), "DAMAGE TEST");
    }

    #[test]
    fn verify_checksum_failure_surfaces() {
        let options = EncodeOptions { ec_level: Some(0), ..Default::default() };
        let mut matrix = encode("TOO MUCH DAMAGE", &options, BarcodeFormat::QrCode);
        let version = Version::from_number(1, false).unwrap();
        let function_pattern = version.build_function_pattern();
        // Invert the entire data region; level L cannot recover that.
        for y in 0..21 {
            for x in 0..21 {
                if !function_pattern.get(x, y) {
                    matrix.flip(x, y);
                }
            }
        }
        assert!(decode(&matrix).is_err());
    }
}
