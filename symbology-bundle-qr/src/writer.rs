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

use crate::encoder::{self, EncodeParams, DEFAULT_BYTE_MODE_ENCODING};
use crate::version::ErrorCorrectionLevel;

/// QR Code and Micro QR Code encoder.
pub struct QrWriter {
    params: EncodeParams,
}

impl Writer for QrWriter {
    fn try_new(format: BarcodeFormat, options: &EncodeOptions) -> Result<QrWriter> {
        let micro = match format {
            BarcodeFormat::QrCode => false,
            BarcodeFormat::MicroQrCode => true,
            _ => return invalid_argument_error("format not supported by the qr writer"),
        };

        let ec_level = match options.ec_level {
            None | Some(0) => ErrorCorrectionLevel::Low,
            Some(1) => ErrorCorrectionLevel::Medium,
            Some(2) => ErrorCorrectionLevel::Quality,
            Some(3) => ErrorCorrectionLevel::High,
            Some(_) => return invalid_argument_error("error correction level out of range"),
        };

        let max_version = if micro { 4 } else { 40 };
        let version = options.version.unwrap_or(0);
        if version > max_version {
            return invalid_argument_error("version number out of range");
        }

        let mask_limit = if micro { 4 } else { 8 };
        if let Some(mask) = options.mask {
            if u32::from(mask) >= mask_limit {
                return invalid_argument_error("data mask reference out of range");
            }
        }

        Ok(QrWriter {
            params: EncodeParams {
                ec_level,
                charset: options.charset.unwrap_or(DEFAULT_BYTE_MODE_ENCODING),
                version,
                mask: options.mask,
                micro,
                gs1: options.gs1,
            },
        })
    }

    fn supported_formats() -> &'static [WriterDescriptor] {
        &[
            support_writer!(BarcodeFormat::QrCode, "qr", "QR Code"),
            support_writer!(BarcodeFormat::MicroQrCode, "mqr", "Micro QR Code"),
        ]
    }

    fn encode(&self, contents: &str) -> Result<BitMatrix> {
        if contents.is_empty() {
            return invalid_argument_error("cannot encode empty contents");
        }
        Ok(encoder::encode(contents, &self.params)?.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_option_validation() {
        let bad_level = EncodeOptions { ec_level: Some(4), ..Default::default() };
        assert!(QrWriter::try_new(BarcodeFormat::QrCode, &bad_level).is_err());

        let bad_mask = EncodeOptions { mask: Some(8), ..Default::default() };
        assert!(QrWriter::try_new(BarcodeFormat::QrCode, &bad_mask).is_err());

        let bad_version = EncodeOptions { version: Some(41), ..Default::default() };
        assert!(QrWriter::try_new(BarcodeFormat::QrCode, &bad_version).is_err());

        let bad_format = EncodeOptions::default();
        assert!(QrWriter::try_new(BarcodeFormat::Aztec, &bad_format).is_err());
    }

    #[test]
    fn verify_empty_contents_rejected() {
        let writer = QrWriter::try_new(BarcodeFormat::QrCode, &EncodeOptions::default()).unwrap();
        assert!(writer.encode("").is_err());
    }

    #[test]
    fn verify_forced_version_and_mask() {
        let options = EncodeOptions { version: Some(3), mask: Some(5), ..Default::default() };
        let writer = QrWriter::try_new(BarcodeFormat::QrCode, &options).unwrap();
        let matrix = writer.encode("FIXED").unwrap();
        assert_eq!(matrix.width(), 29);
    }
}
