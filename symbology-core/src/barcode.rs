// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `barcode` module provides the traits and support structures necessary to implement
//! symbology encoders and decoders.

use std::collections::HashMap;
use std::fmt;

use crate::charset::CharacterSet;
use crate::content::Content;
use crate::errors::{unsupported_error, Result};
use crate::matrix::BitMatrix;

/// A `BarcodeFormat` identifies one symbology.
///
/// Readers and writers advertise the formats they support; registries dispatch on the format
/// tag instead of downcasting per-symbology types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataBar,
    DataBarExpanded,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    MaxiCode,
    MicroQrCode,
    Pdf417,
    QrCode,
    RMQrCode,
    UpcA,
    UpcE,
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            BarcodeFormat::Aztec => "Aztec",
            BarcodeFormat::Codabar => "Codabar",
            BarcodeFormat::Code39 => "Code39",
            BarcodeFormat::Code93 => "Code93",
            BarcodeFormat::Code128 => "Code128",
            BarcodeFormat::DataBar => "DataBar",
            BarcodeFormat::DataBarExpanded => "DataBarExpanded",
            BarcodeFormat::DataMatrix => "DataMatrix",
            BarcodeFormat::Ean8 => "EAN-8",
            BarcodeFormat::Ean13 => "EAN-13",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::MaxiCode => "MaxiCode",
            BarcodeFormat::MicroQrCode => "MicroQRCode",
            BarcodeFormat::Pdf417 => "PDF417",
            BarcodeFormat::QrCode => "QRCode",
            BarcodeFormat::RMQrCode => "rMQRCode",
            BarcodeFormat::UpcA => "UPC-A",
            BarcodeFormat::UpcE => "UPC-E",
        };
        f.write_str(name)
    }
}

/// `DecodeOptions` is a common set of options that all readers use.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Also try the mirrored interpretation of the symbol.
    pub try_mirror: bool,
    /// The matrix is a pristine, unrotated rendition of the symbol (no quiet-zone damage).
    pub is_pure: bool,
    /// Overrides the default character set assumed for byte segments with no ECI in effect.
    pub character_set: Option<CharacterSet>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { try_mirror: true, is_pure: false, character_set: None }
    }
}

/// `EncodeOptions` is a common set of options that all writers use.
///
/// The meaning of `ec_level` is per-format: for QR it indexes L/M/Q/H, for Aztec it is a
/// minimum error-correction percentage, for PDF417 a level 0 through 8.
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    pub ec_level: Option<u8>,
    /// A fixed version / size, or `None` to pick the smallest that fits.
    pub version: Option<u32>,
    /// A fixed data mask, or `None` to score all candidates.
    pub mask: Option<u8>,
    /// The character set used for byte segments; an ECI designator is emitted when it is not
    /// the format's default.
    pub charset: Option<CharacterSet>,
    /// Flag the payload as GS1 formatted (FNC1 in first position).
    pub gs1: bool,
}

/// A `Reader` implements a symbology's decode algorithm. It consumes module-aligned
/// `BitMatrix` grids and produces `Content`.
pub trait Reader: Send {
    /// Attempts to instantiate a `Reader` for one of its supported formats using the provided
    /// `DecodeOptions`.
    fn try_new(format: BarcodeFormat, options: &DecodeOptions) -> Result<Self>
    where
        Self: Sized;

    /// Gets a list of descriptors for the formats supported by this `Reader`.
    fn supported_formats() -> &'static [ReaderDescriptor]
    where
        Self: Sized;

    /// Decodes one symbol from a module-aligned matrix.
    fn decode(&self, matrix: &BitMatrix) -> Result<Content>;
}

/// A `Writer` implements a symbology's encode algorithm. It consumes text and produces a
/// module-aligned `BitMatrix`.
pub trait Writer: Send {
    /// Attempts to instantiate a `Writer` for one of its supported formats using the provided
    /// `EncodeOptions`.
    fn try_new(format: BarcodeFormat, options: &EncodeOptions) -> Result<Self>
    where
        Self: Sized;

    /// Gets a list of descriptors for the formats supported by this `Writer`.
    fn supported_formats() -> &'static [WriterDescriptor]
    where
        Self: Sized;

    /// Encodes `contents` into a module matrix.
    fn encode(&self, contents: &str) -> Result<BitMatrix>;
}

/// A `ReaderDescriptor` stores a description of one format a `Reader` supports, plus an
/// instantiation function for the reader.
#[derive(Copy, Clone)]
pub struct ReaderDescriptor {
    pub format: BarcodeFormat,
    /// A short ASCII-only string identifying the format.
    pub short_name: &'static str,
    /// A longer, more descriptive, string identifying the format.
    pub long_name: &'static str,
    pub inst_func: fn(BarcodeFormat, &DecodeOptions) -> Result<Box<dyn Reader>>,
}

/// A `WriterDescriptor` stores a description of one format a `Writer` supports, plus an
/// instantiation function for the writer.
#[derive(Copy, Clone)]
pub struct WriterDescriptor {
    pub format: BarcodeFormat,
    pub short_name: &'static str,
    pub long_name: &'static str,
    pub inst_func: fn(BarcodeFormat, &EncodeOptions) -> Result<Box<dyn Writer>>,
}

/// A `ReaderRegistry` allows the registration of readers, and provides a method to instantiate
/// a `Reader` for a given format.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: HashMap<BarcodeFormat, ReaderDescriptor>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        ReaderRegistry { readers: HashMap::new() }
    }

    pub fn get(&self, format: BarcodeFormat) -> Option<&ReaderDescriptor> {
        self.readers.get(&format)
    }

    /// Registers all formats supported by `R`. A format previously registered by another reader
    /// is replaced.
    pub fn register_all<R: Reader>(&mut self) {
        for descriptor in R::supported_formats() {
            self.register(descriptor);
        }
    }

    pub fn register(&mut self, descriptor: &ReaderDescriptor) {
        self.readers.insert(descriptor.format, *descriptor);
    }

    /// The formats currently registered.
    pub fn formats(&self) -> impl Iterator<Item = BarcodeFormat> + '_ {
        self.readers.keys().copied()
    }

    /// Instantiates a `Reader` for the format, if one is registered.
    pub fn make(&self, format: BarcodeFormat, options: &DecodeOptions) -> Result<Box<dyn Reader>> {
        match self.readers.get(&format) {
            Some(descriptor) => (descriptor.inst_func)(format, options),
            None => unsupported_error("core (barcode): no reader registered for format"),
        }
    }
}

/// A `WriterRegistry` allows the registration of writers, and provides a method to instantiate
/// a `Writer` for a given format.
#[derive(Default)]
pub struct WriterRegistry {
    writers: HashMap<BarcodeFormat, WriterDescriptor>,
}

impl WriterRegistry {
    pub fn new() -> Self {
        WriterRegistry { writers: HashMap::new() }
    }

    pub fn get(&self, format: BarcodeFormat) -> Option<&WriterDescriptor> {
        self.writers.get(&format)
    }

    pub fn register_all<W: Writer>(&mut self) {
        for descriptor in W::supported_formats() {
            self.register(descriptor);
        }
    }

    pub fn register(&mut self, descriptor: &WriterDescriptor) {
        self.writers.insert(descriptor.format, *descriptor);
    }

    pub fn formats(&self) -> impl Iterator<Item = BarcodeFormat> + '_ {
        self.writers.keys().copied()
    }

    pub fn make(&self, format: BarcodeFormat, options: &EncodeOptions) -> Result<Box<dyn Writer>> {
        match self.writers.get(&format) {
            Some(descriptor) => (descriptor.inst_func)(format, options),
            None => unsupported_error("core (barcode): no writer registered for format"),
        }
    }
}

/// Convenience macro for declaring a `ReaderDescriptor`.
#[macro_export]
macro_rules! support_reader {
    ($format:expr, $short_name:expr, $long_name:expr) => {
        symbology_core::barcode::ReaderDescriptor {
            format: $format,
            short_name: $short_name,
            long_name: $long_name,
            inst_func: |format, options| Ok(Box::new(Self::try_new(format, options)?)),
        }
    };
}

/// Convenience macro for declaring a `WriterDescriptor`.
#[macro_export]
macro_rules! support_writer {
    ($format:expr, $short_name:expr, $long_name:expr) => {
        symbology_core::barcode::WriterDescriptor {
            format: $format,
            short_name: $short_name,
            long_name: $long_name,
            inst_func: |format, options| Ok(Box::new(Self::try_new(format, options)?)),
        }
    };
}
