// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Symbology
//!
//! Symbology is a pure Rust barcode encoding and decoding library. It covers the symbology
//! engine only: the transformation between text and module matrices. Image sampling,
//! symbol location, and rendering belong to external collaborators, which hand the core a
//! module-aligned [`BitMatrix`][core::matrix::BitMatrix] for decoding and receive one from
//! encoding.
//!
//! # Support
//!
//! | Symbology          | Feature Flag | Decode | Encode |
//! |--------------------|--------------|--------|--------|
//! | QR Code            | `qr`         | Yes    | Yes    |
//! | Micro QR Code      | `qr`         | Yes    | Yes    |
//! | Aztec Code         | `aztec`      | Yes    | Yes    |
//! | PDF417 (codewords) | `pdf417`     | Yes    | Yes    |
//! | MaxiCode           | `maxicode`   | Yes    | No     |
//! | EAN-13 / EAN-8     | `oned`       | Yes    | No     |
//! | UPC-A / UPC-E      | `oned`       | Yes    | No     |
//! | GS1 DataBar        | `oned`       | Yes    | No     |
//! | DataBar Expanded   | `oned`       | Yes    | No     |
//!
//! PDF417 works at the codeword layer (see `symbology-bundle-pdf417`): translating bar
//! clusters to codewords is the scanning detector's job, so the crate is not registered in
//! the matrix-based registries.
//!
//! # Usage
//!
//! 1. Get the default registries with [`default::get_readers`] and [`default::get_writers`],
//!    or build your own and register the readers and writers of interest.
//! 2. Instantiate a [`Writer`][core::barcode::Writer] through
//!    [`WriterRegistry::make`][core::barcode::WriterRegistry::make] with a format and
//!    [`EncodeOptions`][core::barcode::EncodeOptions], then call `encode` to obtain a
//!    [`BitMatrix`][core::matrix::BitMatrix].
//! 3. Instantiate a [`Reader`][core::barcode::Reader] the same way and call `decode` on a
//!    module-aligned matrix to obtain a [`Content`][core::content::Content] with the payload
//!    bytes, text rendering, and transport metadata.

pub mod default {
    //! The `default` module provides pre-populated reader and writer registries covering
    //! every enabled symbology.

    pub mod readers {
        //! The `readers` module re-exports all enabled Symbology decoders.

        #[cfg(feature = "aztec")]
        pub use symbology_bundle_aztec::AztecReader;
        #[cfg(feature = "qr")]
        pub use symbology_bundle_qr::QrReader;
        #[cfg(feature = "maxicode")]
        pub use symbology_codec_maxicode::MaxiCodeReader;
        #[cfg(feature = "oned")]
        pub use symbology_codec_oned::{DataBarExpandedReader, DataBarReader, UpcEanReader};
    }

    pub mod writers {
        //! The `writers` module re-exports all enabled Symbology encoders.

        #[cfg(feature = "aztec")]
        pub use symbology_bundle_aztec::AztecWriter;
        #[cfg(feature = "qr")]
        pub use symbology_bundle_qr::QrWriter;
    }

    use lazy_static::lazy_static;

    use symbology_core::barcode::{ReaderRegistry, WriterRegistry};

    lazy_static! {
        static ref READER_REGISTRY: ReaderRegistry = {
            let mut registry = ReaderRegistry::new();
            register_enabled_readers(&mut registry);
            registry
        };
        static ref WRITER_REGISTRY: WriterRegistry = {
            let mut registry = WriterRegistry::new();
            register_enabled_writers(&mut registry);
            registry
        };
    }

    /// Gets the default `ReaderRegistry` with every enabled decoder pre-registered.
    pub fn get_readers() -> &'static ReaderRegistry {
        &READER_REGISTRY
    }

    /// Gets the default `WriterRegistry` with every enabled encoder pre-registered.
    pub fn get_writers() -> &'static WriterRegistry {
        &WRITER_REGISTRY
    }

    /// Registers all enabled decoders with the provided registry.
    pub fn register_enabled_readers(registry: &mut ReaderRegistry) {
        #[cfg(feature = "qr")]
        registry.register_all::<readers::QrReader>();
        #[cfg(feature = "aztec")]
        registry.register_all::<readers::AztecReader>();
        #[cfg(feature = "maxicode")]
        registry.register_all::<readers::MaxiCodeReader>();
        #[cfg(feature = "oned")]
        {
            registry.register_all::<readers::UpcEanReader>();
            registry.register_all::<readers::DataBarReader>();
            registry.register_all::<readers::DataBarExpandedReader>();
        }
    }

    /// Registers all enabled encoders with the provided registry.
    pub fn register_enabled_writers(registry: &mut WriterRegistry) {
        #[cfg(feature = "qr")]
        registry.register_all::<writers::QrWriter>();
        #[cfg(feature = "aztec")]
        registry.register_all::<writers::AztecWriter>();
    }
}

pub use symbology_core as core;

#[cfg(feature = "pdf417")]
pub use symbology_bundle_pdf417 as pdf417;

#[cfg(test)]
mod tests {
    use super::core::barcode::{BarcodeFormat, DecodeOptions, EncodeOptions};

    #[test]
    fn verify_default_registries() {
        let readers = super::default::get_readers();
        let writers = super::default::get_writers();

        for format in [
            BarcodeFormat::QrCode,
            BarcodeFormat::MicroQrCode,
            BarcodeFormat::Aztec,
            BarcodeFormat::MaxiCode,
            BarcodeFormat::Ean13,
            BarcodeFormat::Ean8,
            BarcodeFormat::UpcA,
            BarcodeFormat::UpcE,
            BarcodeFormat::DataBar,
            BarcodeFormat::DataBarExpanded,
        ] {
            assert!(readers.get(format).is_some(), "no reader for {}", format);
        }
        for format in [BarcodeFormat::QrCode, BarcodeFormat::MicroQrCode, BarcodeFormat::Aztec] {
            assert!(writers.get(format).is_some(), "no writer for {}", format);
        }
        assert!(readers.get(BarcodeFormat::Pdf417).is_none());
    }

    #[test]
    fn verify_end_to_end_qr() {
        let writers = super::default::get_writers();
        let readers = super::default::get_readers();

        let writer = writers.make(BarcodeFormat::QrCode, &EncodeOptions::default()).unwrap();
        let matrix = writer.encode("end to end through the registries").unwrap();

        let reader = readers.make(BarcodeFormat::QrCode, &DecodeOptions::default()).unwrap();
        let content = reader.decode(&matrix).unwrap();
        assert_eq!(content.text(), "end to end through the registries");
    }

    #[test]
    fn verify_end_to_end_aztec() {
        let writers = super::default::get_writers();
        let readers = super::default::get_readers();

        let writer = writers.make(BarcodeFormat::Aztec, &EncodeOptions::default()).unwrap();
        let matrix = writer.encode("registry round trip").unwrap();
        let reader = readers.make(BarcodeFormat::Aztec, &DecodeOptions::default()).unwrap();
        assert_eq!(reader.decode(&matrix).unwrap().text(), "registry round trip");
    }
}
