// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symbology_core::barcode::{BarcodeFormat, EncodeOptions, Writer, WriterDescriptor};
use symbology_core::errors::{invalid_argument_error, Result};
use symbology_core::matrix::BitMatrix;
use symbology_core::support_writer;

use crate::encoder::{self, DEFAULT_EC_PERCENT, DEFAULT_LAYERS};

/// Aztec Code encoder.
///
/// `EncodeOptions::ec_level` is interpreted as the minimum error-correction percentage;
/// `EncodeOptions::version` forces a full-size layer count.
pub struct AztecWriter {
    min_ec_percent: u32,
    layers: i32,
}

impl Writer for AztecWriter {
    fn try_new(format: BarcodeFormat, options: &EncodeOptions) -> Result<AztecWriter> {
        if format != BarcodeFormat::Aztec {
            return invalid_argument_error("format not supported by the aztec writer");
        }
        let layers = match options.version {
            None | Some(0) => DEFAULT_LAYERS,
            Some(layers) if layers <= 32 => layers as i32,
            Some(_) => return invalid_argument_error("layer count out of range"),
        };
        Ok(AztecWriter {
            min_ec_percent: options.ec_level.map(u32::from).unwrap_or(DEFAULT_EC_PERCENT),
            layers,
        })
    }

    fn supported_formats() -> &'static [WriterDescriptor] {
        &[support_writer!(BarcodeFormat::Aztec, "aztec", "Aztec Code")]
    }

    fn encode(&self, contents: &str) -> Result<BitMatrix> {
        if contents.is_empty() {
            return invalid_argument_error("cannot encode empty contents");
        }
        Ok(encoder::encode(contents.as_bytes(), self.min_ec_percent, self.layers)?.matrix)
    }
}

#[cfg(test)]
mod tests {
    use symbology_core::barcode::{DecodeOptions, Reader};

    use super::*;
    use crate::reader::AztecReader;

    #[test]
    fn verify_writer_reader_round_trip() {
        let writer = AztecWriter::try_new(BarcodeFormat::Aztec, &EncodeOptions::default()).unwrap();
        let matrix = writer.encode("Writer round trip, 42.").unwrap();
        let reader = AztecReader::try_new(BarcodeFormat::Aztec, &DecodeOptions::default()).unwrap();
        let content = reader.decode(&matrix).unwrap();
        assert_eq!(content.text(), "Writer round trip, 42.");
        assert_eq!(content.symbology_identifier(), "]z0");
    }

    #[test]
    fn verify_bad_options_rejected() {
        let options = EncodeOptions { version: Some(33), ..Default::default() };
        assert!(AztecWriter::try_new(BarcodeFormat::Aztec, &options).is_err());
        assert!(AztecWriter::try_new(BarcodeFormat::QrCode, &EncodeOptions::default()).is_err());
    }
}
